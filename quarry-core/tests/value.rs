#[cfg(test)]
mod tests {
    use quarry_core::{AsValue, Value};
    use rust_decimal::Decimal;
    use std::collections::HashSet;
    use time::macros::{date, datetime, time};
    use uuid::Uuid;

    #[test]
    fn value_null() {
        assert_eq!(Value::Null, Value::Null);
        assert!(Value::Int32(None).is_null());
        assert_ne!(Value::Float32(Some(1.0)), Value::Null);
        assert_eq!(Value::Varchar(Some("x".into())).as_null(), Value::Varchar(None));
        assert!(Option::<i32>::try_from_value(Value::Null).expect("Null").is_none());
        assert!(i32::try_from_value(Value::Null).is_err());
        assert!(String::try_from_value(Value::Varchar(None)).is_err());
    }

    #[test]
    fn value_integers() {
        assert_eq!(42i16.as_value(), Value::Int16(Some(42)));
        assert_eq!(i64::try_from_value(Value::Int16(Some(-3))).expect("Widening"), -3);
        assert_eq!(u8::try_from_value(Value::Int64(Some(255))).expect("Fits"), 255);
        assert!(u8::try_from_value(Value::Int64(Some(256))).is_err());
        assert!(u32::try_from_value(Value::Int32(Some(-1))).is_err());
        assert_eq!(i32::try_from_value(Value::Varchar(Some(" 77 ".into()))).expect("Text"), 77);
        assert_eq!(
            i32::try_from_value(Value::Decimal(Some(Decimal::new(1200, 2)), 0, 0)).expect("Integral"),
            12
        );
        assert!(i32::try_from_value(Value::Decimal(Some(Decimal::new(1250, 2)), 0, 0)).is_err());
    }

    #[test]
    fn value_bool() {
        assert_eq!(true.as_value(), Value::Boolean(Some(true)));
        assert!(bool::try_from_value(Value::Int64(Some(1))).expect("Integer"));
        assert!(!bool::try_from_value(Value::Varchar(Some("F".into()))).expect("Text"));
        assert!(bool::try_from_value(Value::Varchar(Some("maybe".into()))).is_err());
    }

    #[test]
    fn value_text() {
        assert_eq!(char::try_from_value(Value::Varchar(Some("S".into()))).expect("Char"), 'S');
        assert!(char::try_from_value(Value::Varchar(Some("SP".into()))).is_err());
        assert_eq!(String::try_from_value(Value::Char(Some('P'))).expect("String"), "P");
        let decimal = Decimal::try_from_value(Value::Varchar(Some("1431.50".into())));
        assert_eq!(decimal.expect("Decimal"), Decimal::new(143150, 2));
    }

    #[test]
    fn value_temporal() {
        let stored = Value::Varchar(Some("2011-05-31".into()));
        assert_eq!(time::Date::try_from_value(stored).expect("Date"), date!(2011 - 05 - 31));
        let stored = Value::Varchar(Some("13:45:30.5".into()));
        assert_eq!(time::Time::try_from_value(stored).expect("Time"), time!(13:45:30.5));
        let stored = Value::Varchar(Some("2011-05-31T00:00:00".into()));
        assert_eq!(
            time::PrimitiveDateTime::try_from_value(stored).expect("Timestamp"),
            datetime!(2011-05-31 00:00:00)
        );
        let stored = Value::Timestamp(Some(datetime!(2011-05-31 10:00:00)));
        assert_eq!(
            time::OffsetDateTime::try_from_value(stored).expect("Assumed UTC"),
            datetime!(2011-05-31 10:00:00 UTC)
        );
        assert!(time::Date::try_from_value(Value::Varchar(Some("yesterday".into()))).is_err());
    }

    #[test]
    fn value_uuid_and_blob() {
        let id = Uuid::parse_str("f01251e5-96a3-448d-981e-0f99d789110d").expect("Valid uuid");
        let text = Value::Varchar(Some(id.hyphenated().to_string()));
        assert_eq!(Uuid::try_from_value(text).expect("Uuid"), id);
        let bytes = Value::Blob(Some(id.as_bytes().to_vec().into_boxed_slice()));
        assert_eq!(Uuid::try_from_value(bytes).expect("Uuid"), id);
        let photo = vec![0x47u8, 0x49, 0x46];
        assert_eq!(
            Vec::<u8>::try_from_value(photo.clone().as_value()).expect("Blob"),
            photo
        );
    }

    #[test]
    fn value_hash() {
        let values: HashSet<Value> = [
            Value::Float64(Some(0.5)),
            Value::Float64(Some(0.5)),
            Value::Float32(Some(0.5)),
            Value::Varchar(Some("0.5".into())),
            Value::Unknown(Some("0.5".into())),
        ]
        .into_iter()
        .collect();
        assert_eq!(values.len(), 4);
    }
}
