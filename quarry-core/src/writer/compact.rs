use crate::{
    FunctionType, IsolationLevel, SqlWriter, Value,
    writer::{
        Context, sql_server_function_name, write_identifier_bracketed,
        write_sql_server_column_type,
    },
};

/// Microsoft SQL Server Compact printer.
///
/// Same syntax as SQL Server without row numbering nor `UNION`.
#[derive(Default, Debug, Clone, Copy)]
pub struct CompactSqlWriter {}

impl CompactSqlWriter {
    pub const fn new() -> Self {
        Self {}
    }
}

impl SqlWriter for CompactSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }

    fn dialect(&self) -> &'static str {
        "compact"
    }

    fn supports_pagination(&self) -> bool {
        false
    }

    fn supports_union(&self) -> bool {
        false
    }

    fn supports_multi_row_insert(&self) -> bool {
        false
    }

    fn supports_truncate(&self) -> bool {
        false
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
        ColumnDescriptor, ColumnRef, ErrorKind, Property, QueryExpression, TableDescriptor,
    };
    use std::sync::Arc;

    const ID: ColumnRef = ColumnRef::new("ProductID", "Product", "");

    fn product() -> Arc<TableDescriptor> {
        Arc::new(TableDescriptor {
            type_name: "Product",
            name: "Product",
            columns: vec![ColumnDescriptor {
                column_ref: ID,
                value: Value::Int32(None),
                identifier: true,
                ..Default::default()
            }],
            ..Default::default()
        })
    }

    #[test]
    fn union_is_rejected() {
        let error = QueryExpression::new()
            .from_table(product())
            .filter(ID.less(10))
            .union(
                QueryExpression::new()
                    .from_table(product())
                    .filter(ID.greater(100)),
            )
            .to_command(&CompactSqlWriter::new())
            .expect_err("Compact has no UNION");
        assert!(matches!(
            error.downcast_ref::<ErrorKind>(),
            Some(ErrorKind::UnsupportedOperation {
                dialect: "compact",
                ..
            })
        ));
    }

    #[test]
    fn new_id_uses_sql_server_name() {
        let writer = CompactSqlWriter::new();
        assert_eq!(writer.function_name(FunctionType::NewId).ok(), Some("NEWID"));
        assert_eq!(writer.function_name(FunctionType::Max).ok(), Some("MAX"));
    }
}
