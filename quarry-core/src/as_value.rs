use crate::{Error, Result, Value, truncate_long};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use std::{any, borrow::Cow, str::FromStr, sync::Arc};
use time::{
    Date, OffsetDateTime, PrimitiveDateTime, Time, format_description::well_known::Rfc3339,
    macros::format_description,
};
use uuid::Uuid;

/// Conversion between native Rust types and the dynamically typed [`Value`].
///
/// This is the conversion layer used by the binder when assigning provider values to entity
/// fields and by the query builder when turning literals into parameters.
///
/// # Conversion contract
/// - The canonical variant for the type is always accepted (`Value::Int32` for `i32`).
/// - Other numeric widths are accepted when the value fits, the range check happens before
///   returning and the error names both the value and the target type.
/// - Textual variants (`Varchar`, `Unknown`) are parsed, providers without native temporal or
///   uuid types store them as text.
/// - `NULL` converts only into `Option` (and `Value` itself).
///
/// # Examples
/// ```rust
/// use quarry_core::{AsValue, Value};
/// let v = 42i32.as_value();
/// assert!(matches!(v, Value::Int32(Some(42))));
/// let n: i64 = AsValue::try_from_value(v).unwrap();
/// assert_eq!(n, 42);
/// ```
pub trait AsValue {
    /// The `NULL` prototype of the value, describes the data type of the column.
    fn as_empty_value() -> Value;
    /// Convert into the owned [`Value`] representation.
    fn as_value(self) -> Value;
    /// Attempt to convert a dynamic [`Value`] into `Self`.
    fn try_from_value(value: Value) -> Result<Self>
    where
        Self: Sized;
}

fn conversion_error<T>(value: &Value) -> Error {
    Error::msg(format!(
        "Cannot convert {value:?} to {}",
        any::type_name::<T>()
    ))
}

fn parse_text<T: FromStr>(value: &str) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value.trim().parse::<T>().map_err(|e| {
        Error::new(e).context(format!(
            "Cannot parse `{}` as {}",
            truncate_long!(value),
            any::type_name::<T>()
        ))
    })
}

macro_rules! impl_as_value_integer {
    ($source:ty, $destination:path $(, $pat_rest:pat => $expr_rest:expr)* $(,)?) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $destination(None)
            }
            fn as_value(self) -> Value {
                $destination(Some(self))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                macro_rules! narrow {
                    ($v:expr) => {
                        <$source>::try_from($v).map_err(|_| {
                            Error::msg(format!(
                                "Value {} is out of range for {}",
                                $v,
                                any::type_name::<Self>(),
                            ))
                        })
                    };
                }
                match value {
                    $destination(Some(v), ..) => Ok(v),
                    $($pat_rest => $expr_rest,)*
                    #[allow(unreachable_patterns)]
                    Value::Int8(Some(v)) => narrow!(v),
                    #[allow(unreachable_patterns)]
                    Value::Int16(Some(v)) => narrow!(v),
                    #[allow(unreachable_patterns)]
                    Value::Int32(Some(v)) => narrow!(v),
                    #[allow(unreachable_patterns)]
                    Value::Int64(Some(v)) => narrow!(v),
                    #[allow(unreachable_patterns)]
                    Value::UInt8(Some(v)) => narrow!(v),
                    #[allow(unreachable_patterns)]
                    Value::UInt16(Some(v)) => narrow!(v),
                    #[allow(unreachable_patterns)]
                    Value::UInt32(Some(v)) => narrow!(v),
                    #[allow(unreachable_patterns)]
                    Value::UInt64(Some(v)) => narrow!(v),
                    Value::Boolean(Some(v)) => Ok(v as _),
                    Value::Decimal(Some(v), ..) => {
                        let error = Error::msg(format!(
                            "Value {v}: Decimal does not fit into {}",
                            any::type_name::<Self>()
                        ));
                        if !v.is_integer() {
                            return Err(error.context("The value is not a integer"));
                        }
                        v.to_i128().and_then(|v| <$source>::try_from(v).ok()).ok_or(error)
                    }
                    Value::Varchar(Some(ref v)) | Value::Unknown(Some(ref v)) => parse_text(v),
                    _ => Err(conversion_error::<Self>(&value)),
                }
            }
        }
    };
}
impl_as_value_integer!(i8, Value::Int8);
impl_as_value_integer!(i16, Value::Int16);
impl_as_value_integer!(i32, Value::Int32);
impl_as_value_integer!(i64, Value::Int64);
impl_as_value_integer!(u8, Value::UInt8);
impl_as_value_integer!(u16, Value::UInt16);
impl_as_value_integer!(u32, Value::UInt32);
impl_as_value_integer!(u64, Value::UInt64);

impl AsValue for bool {
    fn as_empty_value() -> Value {
        Value::Boolean(None)
    }
    fn as_value(self) -> Value {
        Value::Boolean(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Boolean(Some(v)) => Ok(v),
            Value::Int8(Some(v)) => Ok(v != 0),
            Value::Int16(Some(v)) => Ok(v != 0),
            Value::Int32(Some(v)) => Ok(v != 0),
            Value::Int64(Some(v)) => Ok(v != 0),
            Value::UInt8(Some(v)) => Ok(v != 0),
            Value::UInt16(Some(v)) => Ok(v != 0),
            Value::UInt32(Some(v)) => Ok(v != 0),
            Value::UInt64(Some(v)) => Ok(v != 0),
            Value::Varchar(Some(ref v)) | Value::Unknown(Some(ref v)) => match v.trim() {
                x if x.eq_ignore_ascii_case("true") || x.eq_ignore_ascii_case("t") || x == "1" => {
                    Ok(true)
                }
                x if x.eq_ignore_ascii_case("false") || x.eq_ignore_ascii_case("f") || x == "0" => {
                    Ok(false)
                }
                _ => Err(conversion_error::<Self>(&value)),
            },
            _ => Err(conversion_error::<Self>(&value)),
        }
    }
}

macro_rules! impl_as_value_float {
    ($source:ty, $destination:path, $other:path) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $destination(None)
            }
            fn as_value(self) -> Value {
                $destination(Some(self))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                match value {
                    $destination(Some(v)) => Ok(v),
                    $other(Some(v)) => Ok(v as _),
                    Value::Int32(Some(v)) => Ok(v as _),
                    Value::Int64(Some(v)) => Ok(v as _),
                    Value::Decimal(Some(v), ..) => Ok(v.try_into()?),
                    Value::Varchar(Some(ref v)) | Value::Unknown(Some(ref v)) => parse_text(v),
                    _ => Err(conversion_error::<Self>(&value)),
                }
            }
        }
    };
}
impl_as_value_float!(f32, Value::Float32, Value::Float64);
impl_as_value_float!(f64, Value::Float64, Value::Float32);

impl AsValue for Decimal {
    fn as_empty_value() -> Value {
        Value::Decimal(None, 0, 0)
    }
    fn as_value(self) -> Value {
        Value::Decimal(Some(self), 0, 0)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Decimal(Some(v), ..) => Ok(v),
            Value::Int8(Some(v)) => Ok(v.into()),
            Value::Int16(Some(v)) => Ok(v.into()),
            Value::Int32(Some(v)) => Ok(v.into()),
            Value::Int64(Some(v)) => Ok(v.into()),
            Value::UInt8(Some(v)) => Ok(v.into()),
            Value::UInt16(Some(v)) => Ok(v.into()),
            Value::UInt32(Some(v)) => Ok(v.into()),
            Value::UInt64(Some(v)) => Ok(v.into()),
            Value::Float32(Some(v)) => Ok(Decimal::try_from(v)?),
            Value::Float64(Some(v)) => Ok(Decimal::try_from(v)?),
            Value::Varchar(Some(ref v)) | Value::Unknown(Some(ref v)) => parse_text(v),
            _ => Err(conversion_error::<Self>(&value)),
        }
    }
}

impl AsValue for char {
    fn as_empty_value() -> Value {
        Value::Char(None)
    }
    fn as_value(self) -> Value {
        Value::Char(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Char(Some(v)) => Ok(v),
            Value::Varchar(Some(ref v)) | Value::Unknown(Some(ref v)) => {
                let mut chars = v.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(c),
                    _ => Err(conversion_error::<Self>(&value)),
                }
            }
            _ => Err(conversion_error::<Self>(&value)),
        }
    }
}

impl AsValue for String {
    fn as_empty_value() -> Value {
        Value::Varchar(None)
    }
    fn as_value(self) -> Value {
        Value::Varchar(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Varchar(Some(v)) | Value::Unknown(Some(v)) => Ok(v),
            Value::Char(Some(v)) => Ok(v.into()),
            _ => Err(conversion_error::<Self>(&value)),
        }
    }
}

impl AsValue for Cow<'static, str> {
    fn as_empty_value() -> Value {
        Value::Varchar(None)
    }
    fn as_value(self) -> Value {
        Value::Varchar(Some(self.into_owned()))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        String::try_from_value(value).map(Into::into)
    }
}

impl AsValue for Box<[u8]> {
    fn as_empty_value() -> Value {
        Value::Blob(None)
    }
    fn as_value(self) -> Value {
        Value::Blob(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Blob(Some(v)) => Ok(v),
            _ => Err(conversion_error::<Self>(&value)),
        }
    }
}

impl AsValue for Vec<u8> {
    fn as_empty_value() -> Value {
        Value::Blob(None)
    }
    fn as_value(self) -> Value {
        Value::Blob(Some(self.into_boxed_slice()))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        Box::<[u8]>::try_from_value(value).map(Into::into)
    }
}

impl AsValue for Uuid {
    fn as_empty_value() -> Value {
        Value::Uuid(None)
    }
    fn as_value(self) -> Value {
        Value::Uuid(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Uuid(Some(v)) => Ok(v),
            Value::Varchar(Some(ref v)) | Value::Unknown(Some(ref v)) => parse_text(v),
            Value::Blob(Some(ref v)) => Ok(Uuid::from_slice(v)?),
            _ => Err(conversion_error::<Self>(&value)),
        }
    }
}

macro_rules! parse_temporal {
    ($ty:ty, $input:expr, $($format:expr),+ $(,)?) => {{
        let input = $input.trim();
        $(
            if let Ok(v) = <$ty>::parse(input, $format) {
                return Ok(v);
            }
        )+
        Err(Error::msg(format!(
            "Cannot parse `{}` as {}",
            truncate_long!(input),
            any::type_name::<$ty>()
        )))
    }};
}

impl AsValue for Date {
    fn as_empty_value() -> Value {
        Value::Date(None)
    }
    fn as_value(self) -> Value {
        Value::Date(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Date(Some(v)) => Ok(v),
            Value::Timestamp(Some(v)) => Ok(v.date()),
            Value::Varchar(Some(ref v)) | Value::Unknown(Some(ref v)) => {
                parse_temporal!(Date, v, format_description!("[year]-[month]-[day]"))
            }
            _ => Err(conversion_error::<Self>(&value)),
        }
    }
}

impl AsValue for Time {
    fn as_empty_value() -> Value {
        Value::Time(None)
    }
    fn as_value(self) -> Value {
        Value::Time(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Time(Some(v)) => Ok(v),
            Value::Varchar(Some(ref v)) | Value::Unknown(Some(ref v)) => parse_temporal!(
                Time,
                v,
                format_description!("[hour]:[minute]:[second].[subsecond]"),
                format_description!("[hour]:[minute]:[second]"),
                format_description!("[hour]:[minute]"),
            ),
            _ => Err(conversion_error::<Self>(&value)),
        }
    }
}

impl AsValue for PrimitiveDateTime {
    fn as_empty_value() -> Value {
        Value::Timestamp(None)
    }
    fn as_value(self) -> Value {
        Value::Timestamp(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Timestamp(Some(v)) => Ok(v),
            Value::TimestampWithTimezone(Some(v)) => {
                let v = v.to_utc();
                Ok(PrimitiveDateTime::new(v.date(), v.time()))
            }
            Value::Varchar(Some(ref v)) | Value::Unknown(Some(ref v)) => parse_temporal!(
                PrimitiveDateTime,
                v,
                format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]"),
                format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
                format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
                format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
            ),
            _ => Err(conversion_error::<Self>(&value)),
        }
    }
}

impl AsValue for OffsetDateTime {
    fn as_empty_value() -> Value {
        Value::TimestampWithTimezone(None)
    }
    fn as_value(self) -> Value {
        Value::TimestampWithTimezone(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::TimestampWithTimezone(Some(v)) => Ok(v),
            Value::Timestamp(Some(v)) => Ok(v.assume_utc()),
            Value::Varchar(Some(ref v)) | Value::Unknown(Some(ref v)) => {
                parse_temporal!(OffsetDateTime, v, &Rfc3339)
            }
            _ => Err(conversion_error::<Self>(&value)),
        }
    }
}

impl<T: AsValue> AsValue for Option<T> {
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        match self {
            Some(v) => v.as_value(),
            None => T::as_empty_value(),
        }
    }
    fn try_from_value(value: Value) -> Result<Self> {
        if value.is_null() {
            Ok(None)
        } else {
            T::try_from_value(value).map(Some)
        }
    }
}

impl<T: AsValue> AsValue for Box<T> {
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        (*self).as_value()
    }
    fn try_from_value(value: Value) -> Result<Self> {
        T::try_from_value(value).map(Box::new)
    }
}

impl<T: AsValue + Clone> AsValue for Arc<T> {
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        Arc::unwrap_or_clone(self).as_value()
    }
    fn try_from_value(value: Value) -> Result<Self> {
        T::try_from_value(value).map(Arc::new)
    }
}

/// Types the mapping does not recognize keep the provider value as it is.
impl AsValue for Value {
    fn as_empty_value() -> Value {
        Value::Null
    }
    fn as_value(self) -> Value {
        self
    }
    fn try_from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Varchar(Some(value.into()))
    }
}

macro_rules! impl_from_for_value {
    ($($source:ty),+ $(,)?) => {
        $(
            impl From<$source> for Value {
                fn from(value: $source) -> Self {
                    value.as_value()
                }
            }
        )+
    };
}
impl_from_for_value!(
    bool,
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    u64,
    f32,
    f64,
    Decimal,
    char,
    String,
    Uuid,
    Date,
    Time,
    PrimitiveDateTime,
    OffsetDateTime,
);
