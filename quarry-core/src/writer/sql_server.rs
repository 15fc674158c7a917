use crate::{FunctionType, IsolationLevel, SqlWriter, Value, writer::Context};
use std::fmt::Write;

/// Microsoft SQL Server printer: bracket quoting, `TOP`, `ROW_NUMBER()` pagination.
#[derive(Default, Debug, Clone, Copy)]
pub struct SqlServerSqlWriter {}

impl SqlServerSqlWriter {
    pub const fn new() -> Self {
        Self {}
    }
}

/// Function names shared by SQL Server and SQL Server Compact.
pub(crate) fn sql_server_function_name(function: FunctionType) -> Option<&'static str> {
    match function {
        FunctionType::Substr => Some("SUBSTRING"),
        FunctionType::Length => Some("LEN"),
        FunctionType::Now => Some("GETDATE"),
        FunctionType::NewId => Some("NEWID"),
        _ => None,
    }
}

/// Bracket quoting, the closing bracket is escaped by doubling it.
pub(crate) fn write_identifier_bracketed(
    writer: &dyn SqlWriter,
    context: &mut Context,
    out: &mut String,
    value: &str,
) {
    out.push('[');
    writer.write_escaped(context, out, value, ']', "]]");
    out.push(']');
}

pub(crate) fn write_sql_server_column_type(out: &mut String, value: &Value, size: Option<u32>) {
    match value {
        Value::Boolean(..) => out.push_str("BIT"),
        Value::Int8(..) | Value::Int16(..) | Value::UInt8(..) => out.push_str("SMALLINT"),
        Value::Int32(..) | Value::UInt16(..) => out.push_str("INT"),
        Value::Int64(..) | Value::UInt32(..) => out.push_str("BIGINT"),
        Value::UInt64(..) => out.push_str("DECIMAL(20,0)"),
        Value::Float32(..) => out.push_str("REAL"),
        Value::Float64(..) => out.push_str("FLOAT"),
        Value::Decimal(.., precision, scale) => {
            out.push_str("DECIMAL");
            if (precision, scale) != (&0, &0) {
                let _ = write!(out, "({precision},{scale})");
            }
        }
        Value::Char(..) => out.push_str("NCHAR(1)"),
        Value::Varchar(..) => match size {
            Some(size) => {
                let _ = write!(out, "NVARCHAR({size})");
            }
            None => out.push_str("NVARCHAR(MAX)"),
        },
        Value::Blob(..) => out.push_str("VARBINARY(MAX)"),
        Value::Date(..) => out.push_str("DATE"),
        Value::Time(..) => out.push_str("TIME"),
        Value::Timestamp(..) => out.push_str("DATETIME2"),
        Value::TimestampWithTimezone(..) => out.push_str("DATETIMEOFFSET"),
        Value::Uuid(..) => out.push_str("UNIQUEIDENTIFIER"),
        Value::Null | Value::Unknown(..) => {
            log::error!("Cannot derive a column type from {:?}", value);
        }
    }
}

impl SqlWriter for SqlServerSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }

    fn dialect(&self) -> &'static str {
        "sqlserver"
    }

    fn uses_top(&self) -> bool {
        true
    }

    fn dialect_function_name(&self, function: FunctionType) -> Option<&'static str> {
        sql_server_function_name(function)
    }

    fn write_identifier_quoted(&self, context: &mut Context, out: &mut String, value: &str) {
        write_identifier_bracketed(self, context, out, value);
    }

    fn write_column_type(
        &self,
        _context: &mut Context,
        out: &mut String,
        value: &Value,
        size: Option<u32>,
    ) {
        write_sql_server_column_type(out, value, size);
    }

    fn write_column_auto_increment(&self, _context: &mut Context, out: &mut String) {
        out.push_str(" IDENTITY(1,1)");
    }

    fn write_transaction_begin(&self, out: &mut String, isolation: IsolationLevel) {
        out.push_str("SET TRANSACTION ISOLATION LEVEL ");
        out.push_str(isolation.sql());
        out.push_str(";\nBEGIN TRANSACTION;");
    }

    fn write_transaction_commit(&self, out: &mut String) {
        out.push_str("COMMIT TRANSACTION;");
    }

    fn write_transaction_rollback(&self, out: &mut String) {
        out.push_str("ROLLBACK TRANSACTION;");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ColumnDescriptor, ColumnRef, Property, PropertyExpression, QueryExpression,
        TableDescriptor,
    };
    use indoc::indoc;
    use std::sync::Arc;

    const ID: ColumnRef = ColumnRef::new("ProductID", "Product", "Production");
    const NAME: ColumnRef = ColumnRef::new("Name", "Product", "Production");

    fn product() -> Arc<TableDescriptor> {
        Arc::new(TableDescriptor {
            type_name: "Product",
            name: "Product",
            schema: "Production",
            columns: vec![
                ColumnDescriptor {
                    column_ref: ID,
                    value: Value::Int32(None),
                    identifier: true,
                    ..Default::default()
                },
                ColumnDescriptor {
                    column_ref: NAME,
                    value: Value::Varchar(None),
                    ordinal: 1,
                    ..Default::default()
                },
            ],
            ..Default::default()
        })
    }

    #[test]
    fn top_and_functions() {
        let command = QueryExpression::new()
            .select([
                PropertyExpression::from(ID),
                NAME.substr(1, 3).alias("Prefix"),
                NAME.length().alias("Length"),
            ])
            .distinct()
            .limit(10)
            .from_table(product())
            .filter(NAME.like("A%"))
            .to_command(&SqlServerSqlWriter::new())
            .expect("Valid query");
        assert_eq!(
            command.text,
            indoc! {r#"
                SELECT DISTINCT TOP 10 [ProductID], SUBSTRING([Name], @p1, @p2) AS [Prefix], LEN([Name]) AS [Length]
                FROM [Production].[Product]
                WHERE [Name] LIKE @p3;
            "#}
            .trim()
        );
    }

    #[test]
    fn paged_with_top() {
        let command = QueryExpression::new()
            .select([NAME])
            .limit(5)
            .from_table(product())
            .page(0, 10, [ID.asc()])
            .to_command(&SqlServerSqlWriter::new())
            .expect("Valid query");
        assert_eq!(
            command.text,
            indoc! {r#"
                SELECT TOP 5 [__column0] AS [Name]
                FROM (SELECT [Name] AS [__column0], ROW_NUMBER() OVER (ORDER BY [ProductID] ASC) AS [__row_number]
                FROM [Production].[Product]) AS [__paged]
                WHERE [__row_number] > 0 AND [__row_number] <= 10
                ORDER BY [__row_number];
            "#}
            .trim()
        );
    }

    #[test]
    fn brackets_are_escaped() {
        let mut out = String::new();
        SqlServerSqlWriter::new().write_identifier_quoted(
            &mut Context::default(),
            &mut out,
            "odd]name",
        );
        assert_eq!(out, "[odd]]name]");
    }

    #[test]
    fn transaction_statements() {
        let mut out = String::new();
        SqlServerSqlWriter::new().write_transaction_begin(&mut out, IsolationLevel::Snapshot);
        assert_eq!(out, "SET TRANSACTION ISOLATION LEVEL SNAPSHOT;\nBEGIN TRANSACTION;");
    }
}
