use crate::SqlWriter;

/// ANSI flavored printer: double quoted identifiers, trailing `LIMIT`, pagination through
/// `ROW_NUMBER()`.
#[derive(Default, Debug, Clone, Copy)]
pub struct GenericSqlWriter {}

impl GenericSqlWriter {
    pub const fn new() -> Self {
        Self {}
    }
}

impl SqlWriter for GenericSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }

    fn dialect(&self) -> &'static str {
        "generic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ColumnDescriptor, ColumnRef, ErrorKind, FunctionType, Property, PropertyExpression,
        QueryExpression, TableDescriptor, TransactionType, Value,
    };
    use indoc::indoc;
    use std::sync::Arc;

    const ID: ColumnRef = ColumnRef::new("ProductID", "Product", "");
    const NAME: ColumnRef = ColumnRef::new("Name", "Product", "");
    const MODIFIED: ColumnRef = ColumnRef::new("ModifiedDate", "Product", "");

    fn product() -> Arc<TableDescriptor> {
        Arc::new(TableDescriptor {
            type_name: "Product",
            name: "Product",
            columns: vec![
                ColumnDescriptor {
                    column_ref: ID,
                    value: Value::Int32(None),
                    identifier: true,
                    auto_increment: true,
                    ..Default::default()
                },
                ColumnDescriptor {
                    column_ref: NAME,
                    value: Value::Varchar(None),
                    ordinal: 1,
                    size: Some(50),
                    ..Default::default()
                },
                ColumnDescriptor {
                    column_ref: MODIFIED,
                    value: Value::Timestamp(None),
                    ordinal: 2,
                    nullable: true,
                    ..Default::default()
                },
            ],
            ..Default::default()
        })
    }

    #[test]
    fn select_by_identifier() {
        let command = QueryExpression::new()
            .from_table(product())
            .filter(ID.equal(355))
            .to_command(&GenericSqlWriter::new())
            .expect("Valid query");
        assert_eq!(
            command.text,
            indoc! {r#"
                SELECT "ProductID", "Name", "ModifiedDate"
                FROM "Product"
                WHERE "ProductID" = @p1;
            "#}
            .trim()
        );
        assert_eq!(command.parameters.len(), 1);
        assert_eq!(command.parameters.get("@p1"), Some(&Value::Int32(Some(355))));
    }

    #[test]
    fn compilation_is_deterministic() {
        let query = QueryExpression::new()
            .select([NAME])
            .from_table(product())
            .filter(ID.greater(10) & NAME.like("%Bolt%"))
            .build()
            .expect("Valid query");
        let writer = GenericSqlWriter::new();
        let a = writer.compile(&query).expect("First compilation");
        let b = writer.compile(&query).expect("Second compilation");
        assert_eq!(a, b);
        assert_eq!(a.parameters.len(), 2);
    }

    #[test]
    fn paged_select() {
        let command = QueryExpression::new()
            .select([ID, NAME])
            .from_table(product())
            .filter(NAME.is_not_null())
            .page(20, 30, [NAME.asc()])
            .to_command(&GenericSqlWriter::new())
            .expect("Valid query");
        assert_eq!(
            command.text,
            indoc! {r#"
                SELECT "__column0" AS "ProductID", "__column1" AS "Name"
                FROM (SELECT "ProductID" AS "__column0", "Name" AS "__column1", ROW_NUMBER() OVER (ORDER BY "Name" ASC) AS "__row_number"
                FROM "Product"
                WHERE "Name" IS NOT NULL) AS "__paged"
                WHERE "__row_number" > 20 AND "__row_number" <= 30
                ORDER BY "__row_number";
            "#}
            .trim()
        );
        assert_eq!(command.text.matches("ROW_NUMBER()").count(), 1);
    }

    #[test]
    fn aggregates_and_grouping() {
        let command = QueryExpression::new()
            .select([
                PropertyExpression::from(NAME),
                PropertyExpression::count_all().alias("total"),
            ])
            .from_table(product())
            .group_by([NAME])
            .having(PropertyExpression::count_all().greater(1))
            .order_by([NAME.desc()])
            .limit(5)
            .to_command(&GenericSqlWriter::new())
            .expect("Valid query");
        assert_eq!(
            command.text,
            indoc! {r#"
                SELECT "Name", COUNT(*) AS "total"
                FROM "Product"
                GROUP BY "Name"
                HAVING COUNT(*) > @p1
                ORDER BY "Name" DESC
                LIMIT 5;
            "#}
            .trim()
        );
    }

    #[test]
    fn insert_update_delete() {
        let writer = GenericSqlWriter::new();
        let command = QueryExpression::statement_on(TransactionType::Insert, product())
            .values([
                (NAME, PropertyExpression::from("Bolt")),
                (MODIFIED, PropertyExpression::now()),
            ])
            .to_command(&writer)
            .expect("Valid insert");
        let name = command.parameters.iter().next().map(|(k, _)| k.to_string());
        let name = name.expect("One parameter");
        assert!(name.starts_with("@h"));
        assert_eq!(
            command.text,
            format!(
                "INSERT INTO \"Product\" (\"Name\", \"ModifiedDate\")\nVALUES\n({name}, CURRENT_TIMESTAMP);"
            )
        );

        let command = QueryExpression::statement_on(TransactionType::Update, product())
            .set(NAME, "Nut")
            .filter(ID.equal(1))
            .to_command(&writer)
            .expect("Valid update");
        assert!(command.text.starts_with("UPDATE \"Product\" SET\n\"Name\" = @h"));
        assert!(command.text.contains("\nWHERE \"ProductID\" = @h"));
        assert_eq!(command.parameters.len(), 2);

        let command = QueryExpression::statement_on(TransactionType::Delete, product())
            .filter(ID.is_in([1, 2, 3]))
            .to_command(&writer)
            .expect("Valid delete");
        assert!(command.text.starts_with("DELETE FROM \"Product\"\nWHERE \"ProductID\" IN ("));
        assert_eq!(command.parameters.len(), 3);
    }

    #[test]
    fn empty_in_list() {
        let command = QueryExpression::new()
            .from_table(product())
            .filter(ID.is_in(Vec::<i32>::new()))
            .to_command(&GenericSqlWriter::new())
            .expect("Valid query");
        assert!(command.text.ends_with("WHERE \"ProductID\" IN (NULL);"));
    }

    #[test]
    fn new_id_is_not_supported() {
        let error = QueryExpression::new()
            .select([PropertyExpression::new_id().alias("id")])
            .from_table(product())
            .to_command(&GenericSqlWriter::new())
            .expect_err("NEWID has no generic name");
        assert!(matches!(
            error.downcast_ref::<ErrorKind>(),
            Some(ErrorKind::UnsupportedFunction {
                function: "NewId",
                dialect: "generic"
            })
        ));
        assert_eq!(
            GenericSqlWriter::new().function_name(FunctionType::Upper).ok(),
            Some("UPPER")
        );
    }

    #[test]
    fn create_table() {
        let mut out = String::new();
        GenericSqlWriter::new()
            .write_create_table(&mut out, &product(), true)
            .expect("Valid table");
        assert_eq!(
            out,
            indoc! {r#"
                CREATE TABLE IF NOT EXISTS "Product" (
                "ProductID" INTEGER PRIMARY KEY GENERATED BY DEFAULT AS IDENTITY,
                "Name" VARCHAR(50) NOT NULL,
                "ModifiedDate" TIMESTAMP);
            "#}
            .trim()
        );
    }
}
