use quarry_core::{
    ColumnDescriptor, IsolationLevel, Result, SqlWriter, Value, writer::Context,
};
use std::fmt::Write;

/// SQLite printer.
///
/// Types collapse to the storage classes, transactions ignore the isolation level (SQLite is
/// always serializable) and truncation becomes an unconditional `DELETE`.
#[derive(Default, Debug, Clone, Copy)]
pub struct SqliteSqlWriter {}

impl SqliteSqlWriter {
    pub const fn new() -> Self {
        Self {}
    }
}

impl SqlWriter for SqliteSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }

    fn dialect(&self) -> &'static str {
        "sqlite"
    }

    fn supports_truncate(&self) -> bool {
        false
    }

    fn write_column_type(
        &self,
        _context: &mut Context,
        out: &mut String,
        value: &Value,
        _size: Option<u32>,
    ) {
        match value {
            Value::Boolean(..)
            | Value::Int8(..)
            | Value::Int16(..)
            | Value::Int32(..)
            | Value::Int64(..)
            | Value::UInt8(..)
            | Value::UInt16(..)
            | Value::UInt32(..)
            | Value::UInt64(..) => out.push_str("INTEGER"),
            Value::Float32(..) | Value::Float64(..) => out.push_str("REAL"),
            Value::Decimal(..)
            | Value::Char(..)
            | Value::Varchar(..)
            | Value::Date(..)
            | Value::Time(..)
            | Value::Timestamp(..)
            | Value::TimestampWithTimezone(..)
            | Value::Uuid(..) => out.push_str("TEXT"),
            Value::Blob(..) => out.push_str("BLOB"),
            Value::Null | Value::Unknown(..) => {
                log::error!("Cannot derive a column type from {:?}", value);
            }
        }
    }

    fn write_column_auto_increment(&self, _context: &mut Context, out: &mut String) {
        out.push_str(" AUTOINCREMENT");
    }

    fn write_create_table_column_fragment(
        &self,
        context: &mut Context,
        out: &mut String,
        column: &ColumnDescriptor,
        primary_key: bool,
    ) -> Result<()> {
        self.write_identifier_quoted(context, out, column.name());
        out.push(' ');
        if !column.column_type.is_empty() {
            out.push_str(column.column_type);
        } else {
            self.write_column_type(context, out, &column.value, column.size);
        }
        if primary_key {
            out.push_str(" PRIMARY KEY");
        } else if !column.nullable {
            out.push_str(" NOT NULL");
        }
        if column.auto_increment {
            self.write_column_auto_increment(context, out);
        }
        // Expressions in DEFAULT must be parenthesized
        if let Some(expression) = column.expression {
            if column.computed {
                let _ = write!(out, " GENERATED ALWAYS AS ({expression})");
            } else {
                let _ = write!(out, " DEFAULT ({expression})");
            }
        }
        Ok(())
    }

    fn write_transaction_begin(&self, out: &mut String, _isolation: IsolationLevel) {
        out.push_str("BEGIN;");
    }
}
