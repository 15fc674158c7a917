use quarry_core::Value;
use rusqlite::{
    Error,
    types::{ToSql, ToSqlOutput, Value as SqlValue, ValueRef},
};
use time::{
    format_description::{BorrowedFormatItem, well_known::Rfc3339},
    macros::format_description,
};

pub(crate) const DATE_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]");
pub(crate) const TIME_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[hour]:[minute]:[second].[subsecond]");
pub(crate) const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]");

/// Binds a [`Value`] as a statement parameter.
///
/// SQLite stores integers, reals, text and blobs: booleans become `0`/`1`, decimals and the
/// temporal types are stored as text in the same formats `AsValue` parses them back from.
pub(crate) struct SqliteValue<'a>(pub &'a Value);

fn conversion_failure(error: impl std::error::Error + Send + Sync + 'static) -> Error {
    Error::ToSqlConversionFailure(Box::new(error))
}

fn integer(v: impl Into<i64>) -> rusqlite::Result<ToSqlOutput<'static>> {
    Ok(ToSqlOutput::Owned(SqlValue::Integer(v.into())))
}

fn text(v: String) -> rusqlite::Result<ToSqlOutput<'static>> {
    Ok(ToSqlOutput::Owned(SqlValue::Text(v)))
}

impl ToSql for SqliteValue<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self.0 {
            Value::Boolean(Some(v)) => integer(*v),
            Value::Int8(Some(v)) => integer(*v),
            Value::Int16(Some(v)) => integer(*v),
            Value::Int32(Some(v)) => integer(*v),
            Value::Int64(Some(v)) => integer(*v),
            Value::UInt8(Some(v)) => integer(*v),
            Value::UInt16(Some(v)) => integer(*v),
            Value::UInt32(Some(v)) => integer(*v),
            Value::UInt64(Some(v)) => integer(i64::try_from(*v).map_err(conversion_failure)?),
            Value::Float32(Some(v)) => Ok(ToSqlOutput::Owned(SqlValue::Real(*v as f64))),
            Value::Float64(Some(v)) => Ok(ToSqlOutput::Owned(SqlValue::Real(*v))),
            Value::Decimal(Some(v), ..) => text(v.to_string()),
            Value::Char(Some(v)) => text(v.to_string()),
            Value::Varchar(Some(v)) | Value::Unknown(Some(v)) => {
                Ok(ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes())))
            }
            Value::Blob(Some(v)) => Ok(ToSqlOutput::Borrowed(ValueRef::Blob(&v[..]))),
            Value::Date(Some(v)) => text(v.format(DATE_FORMAT).map_err(conversion_failure)?),
            Value::Time(Some(v)) => text(v.format(TIME_FORMAT).map_err(conversion_failure)?),
            Value::Timestamp(Some(v)) => {
                text(v.format(TIMESTAMP_FORMAT).map_err(conversion_failure)?)
            }
            Value::TimestampWithTimezone(Some(v)) => {
                text(v.format(&Rfc3339).map_err(conversion_failure)?)
            }
            Value::Uuid(Some(v)) => text(v.hyphenated().to_string()),
            _ => Ok(ToSqlOutput::Owned(SqlValue::Null)),
        }
    }
}

/// Reads one column of a result row, the declared column type is not consulted: entity
/// materialization converts through `AsValue`.
pub(crate) fn extract_value(value: ValueRef<'_>) -> rusqlite::Result<Value> {
    Ok(match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) => Value::Int64(Some(v)),
        ValueRef::Real(v) => Value::Float64(Some(v)),
        ValueRef::Text(v) => Value::Varchar(Some(
            String::from_utf8(v.to_vec()).map_err(|e| Error::Utf8Error(e.utf8_error()))?,
        )),
        ValueRef::Blob(v) => Value::Blob(Some(v.into())),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use time::macros::{date, datetime, time};

    fn bound(value: &Value) -> SqlValue {
        match SqliteValue(value).to_sql().expect("Convertible value") {
            ToSqlOutput::Owned(v) => v,
            ToSqlOutput::Borrowed(v) => v.into(),
            _ => panic!("Unexpected output"),
        }
    }

    #[test]
    fn storage_classes() {
        assert_eq!(bound(&Value::Boolean(Some(true))), SqlValue::Integer(1));
        assert_eq!(bound(&Value::UInt32(Some(7))), SqlValue::Integer(7));
        assert_eq!(bound(&Value::Float32(Some(0.5))), SqlValue::Real(0.5));
        assert_eq!(bound(&Value::Varchar(None)), SqlValue::Null);
        assert_eq!(
            bound(&Value::Decimal(Decimal::from_str("12.50").ok(), 10, 2)),
            SqlValue::Text("12.50".into())
        );
        assert_eq!(
            bound(&Value::Blob(Some([1u8, 2].into()))),
            SqlValue::Blob(vec![1, 2])
        );
        assert!(SqliteValue(&Value::UInt64(Some(u64::MAX))).to_sql().is_err());
    }

    #[test]
    fn temporal_text() {
        assert_eq!(
            bound(&Value::Date(Some(date!(2024 - 02 - 29)))),
            SqlValue::Text("2024-02-29".into())
        );
        assert_eq!(
            bound(&Value::Time(Some(time!(08:30:05.25)))),
            SqlValue::Text("08:30:05.25".into())
        );
        assert_eq!(
            bound(&Value::Timestamp(Some(datetime!(2024-02-29 08:30:05)))),
            SqlValue::Text("2024-02-29 08:30:05.0".into())
        );
    }

    #[test]
    fn extracted_values() {
        assert_eq!(
            extract_value(ValueRef::Integer(3)).expect("Integer"),
            Value::Int64(Some(3))
        );
        assert_eq!(
            extract_value(ValueRef::Text(b"Bolt")).expect("Text"),
            Value::Varchar(Some("Bolt".into()))
        );
        assert_eq!(extract_value(ValueRef::Null).expect("Null"), Value::Null);
    }
}
