use proc_macro2::TokenStream;
use quote::{ToTokens, quote};
use rust_decimal::Decimal;
use std::{
    fmt::{self, Display, Formatter},
    hash::{Hash, Hasher},
    mem,
};
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};
use uuid::Uuid;

/// Dynamically typed value exchanged with the storage provider.
///
/// Every variant wraps an `Option`, `None` being the typed SQL `NULL`. Column descriptors
/// use the `None` form as the prototype describing the column data type.
#[derive(Default, Debug, Clone)]
pub enum Value {
    /// Untyped `NULL`.
    #[default]
    Null,
    Boolean(Option<bool>),
    Int8(Option<i8>),
    Int16(Option<i16>),
    Int32(Option<i32>),
    Int64(Option<i64>),
    UInt8(Option<u8>),
    UInt16(Option<u16>),
    UInt32(Option<u32>),
    UInt64(Option<u64>),
    Float32(Option<f32>),
    Float64(Option<f64>),
    Decimal(Option<Decimal>, /* precision: */ u8, /* scale: */ u8),
    Char(Option<char>),
    Varchar(Option<String>),
    Blob(Option<Box<[u8]>>),
    Date(Option<Date>),
    Time(Option<Time>),
    Timestamp(Option<PrimitiveDateTime>),
    TimestampWithTimezone(Option<OffsetDateTime>),
    Uuid(Option<Uuid>),
    /// Value the provider could not classify, kept as text.
    Unknown(Option<String>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Boolean(v) => v.is_none(),
            Value::Int8(v) => v.is_none(),
            Value::Int16(v) => v.is_none(),
            Value::Int32(v) => v.is_none(),
            Value::Int64(v) => v.is_none(),
            Value::UInt8(v) => v.is_none(),
            Value::UInt16(v) => v.is_none(),
            Value::UInt32(v) => v.is_none(),
            Value::UInt64(v) => v.is_none(),
            Value::Float32(v) => v.is_none(),
            Value::Float64(v) => v.is_none(),
            Value::Decimal(v, ..) => v.is_none(),
            Value::Char(v) => v.is_none(),
            Value::Varchar(v) => v.is_none(),
            Value::Blob(v) => v.is_none(),
            Value::Date(v) => v.is_none(),
            Value::Time(v) => v.is_none(),
            Value::Timestamp(v) => v.is_none(),
            Value::TimestampWithTimezone(v) => v.is_none(),
            Value::Uuid(v) => v.is_none(),
            Value::Unknown(v) => v.is_none(),
        }
    }

    pub fn same_type(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Decimal(.., l_prec, l_scale), Self::Decimal(.., r_prec, r_scale)) => {
                l_prec == r_prec && l_scale == r_scale
            }
            _ => mem::discriminant(self) == mem::discriminant(other),
        }
    }

    /// The `NULL` prototype of the same type.
    pub fn as_null(&self) -> Value {
        match self {
            Value::Null => Value::Null,
            Value::Boolean(..) => Value::Boolean(None),
            Value::Int8(..) => Value::Int8(None),
            Value::Int16(..) => Value::Int16(None),
            Value::Int32(..) => Value::Int32(None),
            Value::Int64(..) => Value::Int64(None),
            Value::UInt8(..) => Value::UInt8(None),
            Value::UInt16(..) => Value::UInt16(None),
            Value::UInt32(..) => Value::UInt32(None),
            Value::UInt64(..) => Value::UInt64(None),
            Value::Float32(..) => Value::Float32(None),
            Value::Float64(..) => Value::Float64(None),
            Value::Decimal(.., precision, scale) => Value::Decimal(None, *precision, *scale),
            Value::Char(..) => Value::Char(None),
            Value::Varchar(..) => Value::Varchar(None),
            Value::Blob(..) => Value::Blob(None),
            Value::Date(..) => Value::Date(None),
            Value::Time(..) => Value::Time(None),
            Value::Timestamp(..) => Value::Timestamp(None),
            Value::TimestampWithTimezone(..) => Value::TimestampWithTimezone(None),
            Value::Uuid(..) => Value::Uuid(None),
            Value::Unknown(..) => Value::Unknown(None),
        }
    }

    /// Short type name used in messages and as checksum tag.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Boolean(..) => "BOOLEAN",
            Value::Int8(..) => "INT8",
            Value::Int16(..) => "INT16",
            Value::Int32(..) => "INT32",
            Value::Int64(..) => "INT64",
            Value::UInt8(..) => "UINT8",
            Value::UInt16(..) => "UINT16",
            Value::UInt32(..) => "UINT32",
            Value::UInt64(..) => "UINT64",
            Value::Float32(..) => "FLOAT32",
            Value::Float64(..) => "FLOAT64",
            Value::Decimal(..) => "DECIMAL",
            Value::Char(..) => "CHAR",
            Value::Varchar(..) => "VARCHAR",
            Value::Blob(..) => "BLOB",
            Value::Date(..) => "DATE",
            Value::Time(..) => "TIME",
            Value::Timestamp(..) => "TIMESTAMP",
            Value::TimestampWithTimezone(..) => "TIMESTAMPTZ",
            Value::Uuid(..) => "UUID",
            Value::Unknown(..) => "UNKNOWN",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Boolean(l), Self::Boolean(r)) => l == r,
            (Self::Int8(l), Self::Int8(r)) => l == r,
            (Self::Int16(l), Self::Int16(r)) => l == r,
            (Self::Int32(l), Self::Int32(r)) => l == r,
            (Self::Int64(l), Self::Int64(r)) => l == r,
            (Self::UInt8(l), Self::UInt8(r)) => l == r,
            (Self::UInt16(l), Self::UInt16(r)) => l == r,
            (Self::UInt32(l), Self::UInt32(r)) => l == r,
            (Self::UInt64(l), Self::UInt64(r)) => l == r,
            // Bitwise so that equality agrees with the hash
            (Self::Float32(l), Self::Float32(r)) => l.map(f32::to_bits) == r.map(f32::to_bits),
            (Self::Float64(l), Self::Float64(r)) => l.map(f64::to_bits) == r.map(f64::to_bits),
            (Self::Decimal(l, ..), Self::Decimal(r, ..)) => l == r && self.same_type(other),
            (Self::Char(l), Self::Char(r)) => l == r,
            (Self::Varchar(l), Self::Varchar(r)) => l == r,
            (Self::Blob(l), Self::Blob(r)) => l == r,
            (Self::Date(l), Self::Date(r)) => l == r,
            (Self::Time(l), Self::Time(r)) => l == r,
            (Self::Timestamp(l), Self::Timestamp(r)) => l == r,
            (Self::TimestampWithTimezone(l), Self::TimestampWithTimezone(r)) => l == r,
            (Self::Uuid(l), Self::Uuid(r)) => l == r,
            (Self::Unknown(l), Self::Unknown(r)) => l == r,
            _ => mem::discriminant(self) == mem::discriminant(other),
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Boolean(v) => v.hash(state),
            Value::Int8(v) => v.hash(state),
            Value::Int16(v) => v.hash(state),
            Value::Int32(v) => v.hash(state),
            Value::Int64(v) => v.hash(state),
            Value::UInt8(v) => v.hash(state),
            Value::UInt16(v) => v.hash(state),
            Value::UInt32(v) => v.hash(state),
            Value::UInt64(v) => v.hash(state),
            Value::Float32(v) => v.map(f32::to_bits).hash(state),
            Value::Float64(v) => v.map(f64::to_bits).hash(state),
            Value::Decimal(v, precision, scale) => {
                v.hash(state);
                precision.hash(state);
                scale.hash(state);
            }
            Value::Char(v) => v.hash(state),
            Value::Varchar(v) => v.hash(state),
            Value::Blob(v) => v.hash(state),
            Value::Date(v) => v.hash(state),
            Value::Time(v) => v.hash(state),
            Value::Timestamp(v) => v.hash(state),
            Value::TimestampWithTimezone(v) => v.hash(state),
            Value::Uuid(v) => v.hash(state),
            Value::Unknown(v) => v.hash(state),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        macro_rules! show {
            ($v:expr) => {
                match $v {
                    Some(v) => write!(f, "{}", v),
                    None => f.write_str("NULL"),
                }
            };
        }
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Boolean(v) => show!(v),
            Value::Int8(v) => show!(v),
            Value::Int16(v) => show!(v),
            Value::Int32(v) => show!(v),
            Value::Int64(v) => show!(v),
            Value::UInt8(v) => show!(v),
            Value::UInt16(v) => show!(v),
            Value::UInt32(v) => show!(v),
            Value::UInt64(v) => show!(v),
            Value::Float32(v) => show!(v),
            Value::Float64(v) => show!(v),
            Value::Decimal(v, ..) => show!(v),
            Value::Char(v) => show!(v),
            Value::Varchar(v) => show!(v),
            Value::Blob(v) => match v {
                Some(v) => write!(f, "<{} bytes>", v.len()),
                None => f.write_str("NULL"),
            },
            Value::Date(v) => show!(v),
            Value::Time(v) => show!(v),
            Value::Timestamp(v) => show!(v),
            Value::TimestampWithTimezone(v) => show!(v),
            Value::Uuid(v) => show!(v),
            Value::Unknown(v) => show!(v),
        }
    }
}

impl ToTokens for Value {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let ts = match self {
            Value::Null => quote! { ::quarry::Value::Null },
            Value::Boolean(..) => quote! { ::quarry::Value::Boolean(None) },
            Value::Int8(..) => quote! { ::quarry::Value::Int8(None) },
            Value::Int16(..) => quote! { ::quarry::Value::Int16(None) },
            Value::Int32(..) => quote! { ::quarry::Value::Int32(None) },
            Value::Int64(..) => quote! { ::quarry::Value::Int64(None) },
            Value::UInt8(..) => quote! { ::quarry::Value::UInt8(None) },
            Value::UInt16(..) => quote! { ::quarry::Value::UInt16(None) },
            Value::UInt32(..) => quote! { ::quarry::Value::UInt32(None) },
            Value::UInt64(..) => quote! { ::quarry::Value::UInt64(None) },
            Value::Float32(..) => quote! { ::quarry::Value::Float32(None) },
            Value::Float64(..) => quote! { ::quarry::Value::Float64(None) },
            Value::Decimal(.., precision, scale) => {
                quote! { ::quarry::Value::Decimal(None, #precision, #scale) }
            }
            Value::Char(..) => quote! { ::quarry::Value::Char(None) },
            Value::Varchar(..) => quote! { ::quarry::Value::Varchar(None) },
            Value::Blob(..) => quote! { ::quarry::Value::Blob(None) },
            Value::Date(..) => quote! { ::quarry::Value::Date(None) },
            Value::Time(..) => quote! { ::quarry::Value::Time(None) },
            Value::Timestamp(..) => quote! { ::quarry::Value::Timestamp(None) },
            Value::TimestampWithTimezone(..) => {
                quote! { ::quarry::Value::TimestampWithTimezone(None) }
            }
            Value::Uuid(..) => quote! { ::quarry::Value::Uuid(None) },
            Value::Unknown(..) => quote! { ::quarry::Value::Unknown(None) },
        };
        tokens.extend(ts);
    }
}
