use crate::{
    FunctionType, IsolationLevel, Join, JoinType, Result, SqlWriter, TableRef, Value,
    writer::{Context, write_identifier_bracketed},
};
use std::fmt::Write;

/// Microsoft Jet (Access) printer.
///
/// Joins are nested in parentheses, parameters are positional `?` placeholders bound in the
/// order they appear. Jet has no row numbering, pagination is rejected.
#[derive(Default, Debug, Clone, Copy)]
pub struct JetSqlWriter {}

impl JetSqlWriter {
    pub const fn new() -> Self {
        Self {}
    }
}

impl SqlWriter for JetSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }

    fn dialect(&self) -> &'static str {
        "jet"
    }

    fn supports_pagination(&self) -> bool {
        false
    }

    fn supports_multi_row_insert(&self) -> bool {
        false
    }

    fn supports_truncate(&self) -> bool {
        false
    }

    fn supports_join(&self, join_type: JoinType) -> bool {
        join_type != JoinType::Full
    }

    fn uses_top(&self) -> bool {
        true
    }

    fn dialect_function_name(&self, function: FunctionType) -> Option<&'static str> {
        match function {
            FunctionType::Upper => Some("UCASE"),
            FunctionType::Lower => Some("LCASE"),
            FunctionType::Substr => Some("MID"),
            FunctionType::Length => Some("LEN"),
            FunctionType::Now => Some("NOW"),
            _ => None,
        }
    }

    fn write_identifier_quoted(&self, context: &mut Context, out: &mut String, value: &str) {
        write_identifier_bracketed(self, context, out, value);
    }

    fn write_parameter_placeholder(&self, _context: &mut Context, out: &mut String, _name: &str) {
        out.push('?');
    }

    fn write_column_type(
        &self,
        _context: &mut Context,
        out: &mut String,
        value: &Value,
        size: Option<u32>,
    ) {
        match value {
            Value::Boolean(..) => out.push_str("BIT"),
            Value::UInt8(..) => out.push_str("BYTE"),
            Value::Int8(..) | Value::Int16(..) => out.push_str("SHORT"),
            Value::Int32(..) | Value::UInt16(..) => out.push_str("LONG"),
            Value::Int64(..) | Value::UInt32(..) | Value::UInt64(..) => {
                out.push_str("DECIMAL(20,0)")
            }
            Value::Float32(..) => out.push_str("SINGLE"),
            Value::Float64(..) => out.push_str("DOUBLE"),
            Value::Decimal(.., precision, scale) => {
                out.push_str("DECIMAL");
                if (precision, scale) != (&0, &0) {
                    let _ = write!(out, "({precision},{scale})");
                }
            }
            Value::Char(..) => out.push_str("TEXT(1)"),
            Value::Varchar(..) => match size {
                Some(size) if size <= 255 => {
                    let _ = write!(out, "TEXT({size})");
                }
                _ => out.push_str("MEMO"),
            },
            Value::Blob(..) => out.push_str("LONGBINARY"),
            Value::Date(..)
            | Value::Time(..)
            | Value::Timestamp(..)
            | Value::TimestampWithTimezone(..) => out.push_str("DATETIME"),
            Value::Uuid(..) => out.push_str("GUID"),
            Value::Null | Value::Unknown(..) => {
                log::error!("Cannot derive a column type from {:?}", value);
            }
        }
    }

    fn write_column_auto_increment(&self, _context: &mut Context, out: &mut String) {
        out.push_str(" IDENTITY(1,1)");
    }

    /// `FROM ((A INNER JOIN B ON ..) INNER JOIN C ON ..) LEFT JOIN D ON ..`
    fn write_from(
        &self,
        context: &mut Context,
        out: &mut String,
        source: &TableRef,
        joins: &[Join],
    ) -> Result<()> {
        for _ in 1..joins.len() {
            out.push('(');
        }
        self.write_table_ref(context, out, source);
        for (i, join) in joins.iter().enumerate() {
            out.push(' ');
            self.write_join(context, out, join)?;
            if i + 1 < joins.len() {
                out.push(')');
            }
        }
        Ok(())
    }

    fn write_transaction_begin(&self, out: &mut String, _isolation: IsolationLevel) {
        out.push_str("BEGIN TRANSACTION;");
    }

    fn write_transaction_commit(&self, out: &mut String) {
        out.push_str("COMMIT TRANSACTION;");
    }

    fn write_transaction_rollback(&self, out: &mut String) {
        out.push_str("ROLLBACK TRANSACTION;");
    }
}
