use crate::RowLabeled;
use std::{
    error,
    fmt::{self, Display, Formatter},
};

/// Typed failures raised by the library.
///
/// They travel inside [`crate::Error`] (an `anyhow::Error`), callers recover them with
/// `error.downcast_ref::<ErrorKind>()`.
#[derive(Debug)]
pub enum ErrorKind {
    /// The type does not carry a table declaration.
    MissingTableDescriptor { type_name: &'static str },
    /// The type does not map the requested member to a column.
    MissingColumnDescriptor {
        type_name: &'static str,
        member: String,
    },
    /// The expression cannot be rendered in the position it was used.
    InvalidPropertyExpression(String),
    /// A builder call violated the query construction rules.
    InvalidOperation(String),
    /// Neither the dialect nor the default table know the function.
    UnsupportedFunction {
        function: &'static str,
        dialect: &'static str,
    },
    /// Pagination was requested on a dialect that cannot express it.
    PaginationNotSupported { dialect: &'static str },
    /// The operation is not available for this dialect or table.
    UnsupportedOperation {
        operation: String,
        dialect: &'static str,
    },
    /// The driver failed while executing a command.
    StorageProvider {
        command: String,
        dialect: &'static str,
        source: anyhow::Error,
    },
    /// The stored row changed since the object was loaded.
    Concurrency {
        type_name: &'static str,
        stale: RowLabeled,
    },
    /// The object failed the validation that precedes persistence.
    Validation {
        type_name: &'static str,
        message: String,
    },
}

impl ErrorKind {
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        ErrorKind::InvalidOperation(message.into())
    }
    pub fn unsupported_operation(operation: impl Into<String>, dialect: &'static str) -> Self {
        ErrorKind::UnsupportedOperation {
            operation: operation.into(),
            dialect,
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::MissingTableDescriptor { type_name } => {
                write!(f, "Type `{type_name}` does not declare a table")
            }
            ErrorKind::MissingColumnDescriptor { type_name, member } => {
                write!(f, "Member `{member}` of `{type_name}` is not mapped to a column")
            }
            ErrorKind::InvalidPropertyExpression(message) => {
                write!(f, "Invalid property expression: {message}")
            }
            ErrorKind::InvalidOperation(message) => write!(f, "Invalid operation: {message}"),
            ErrorKind::UnsupportedFunction { function, dialect } => {
                write!(f, "Function {function} is not supported by the {dialect} dialect")
            }
            ErrorKind::PaginationNotSupported { dialect } => {
                write!(f, "The {dialect} dialect does not support pagination")
            }
            ErrorKind::UnsupportedOperation { operation, dialect } => {
                write!(f, "{operation} is not supported by the {dialect} dialect")
            }
            ErrorKind::StorageProvider {
                command,
                dialect,
                source,
            } => write!(
                f,
                "The {dialect} storage provider failed: {source:#}\nCommand: {}",
                crate::truncate_long!(command)
            ),
            ErrorKind::Concurrency { type_name, .. } => write!(
                f,
                "The stored `{type_name}` row changed after it was loaded, refusing to overwrite it"
            ),
            ErrorKind::Validation { type_name, message } => {
                write!(f, "Validation of `{type_name}` failed: {message}")
            }
        }
    }
}

impl error::Error for ErrorKind {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            ErrorKind::StorageProvider { source, .. } => Some(&**source),
            _ => None,
        }
    }
}

/// Returns the typed failure carried by the error, if any.
pub fn error_kind(error: &crate::Error) -> Option<&ErrorKind> {
    error.downcast_ref::<ErrorKind>()
}
