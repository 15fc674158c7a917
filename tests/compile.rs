#[cfg(test)]
mod tests {
    use indoc::indoc;
    use quarry::{
        CompactSqlWriter, Entity, ErrorKind, GenericSqlWriter, JetSqlWriter, Property,
        PropertyExpression, QueryExpression, SqlServerSqlWriter, SqlWriter, Value,
    };
    use rust_decimal::Decimal;
    use time::PrimitiveDateTime;

    #[derive(Entity)]
    #[quarry(name = "Product")]
    struct Product {
        #[quarry(name = "ProductID", identifier)]
        id: i32,
        #[quarry(name = "Name", size = 50)]
        name: String,
        #[quarry(name = "ModifiedDate")]
        modified: Option<PrimitiveDateTime>,
    }

    #[derive(Entity)]
    #[quarry(name = "ProductInventory", schema = "Production")]
    struct Inventory {
        #[quarry(name = "ProductID", identifier)]
        product: i32,
        #[quarry(name = "Shelf", size = 10)]
        shelf: String,
        #[quarry(name = "Quantity")]
        quantity: i16,
        #[quarry(name = "StandardCost")]
        cost: Decimal,
    }

    fn by_identifier() -> QueryExpression {
        QueryExpression::new()
            .from::<Product>()
            .filter(Product::id.equal(355))
    }

    #[test]
    fn select_by_identifier() {
        let command = by_identifier()
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

        let command = by_identifier()
            .to_command(&SqlServerSqlWriter::new())
            .expect("Valid query");
        assert_eq!(
            command.text,
            indoc! {"
                SELECT [ProductID], [Name], [ModifiedDate]
                FROM [Product]
                WHERE [ProductID] = @p1;
            "}
            .trim()
        );

        let command = by_identifier()
            .to_command(&JetSqlWriter::new())
            .expect("Valid query");
        assert!(command.text.ends_with("WHERE [ProductID] = ?;"));
        assert_eq!(command.parameters.len(), 1);
    }

    #[test]
    fn same_query_every_dialect() {
        let writers: [&dyn SqlWriter; 4] = [
            &GenericSqlWriter::new(),
            &SqlServerSqlWriter::new(),
            &JetSqlWriter::new(),
            &CompactSqlWriter::new(),
        ];
        for writer in writers {
            let query = by_identifier().build().expect("Valid query");
            let first = writer.compile(&query).expect("Compiles");
            let second = writer.compile(&query).expect("Compiles again");
            assert_eq!(first, second, "{} is not deterministic", writer.dialect());
            assert!(first.text.starts_with("SELECT "));
        }
    }

    #[test]
    fn join_and_aggregate() {
        let command = QueryExpression::new()
            .select([
                PropertyExpression::from(Product::name),
                Inventory::quantity.sum().alias("Stock"),
            ])
            .from::<Product>()
            .inner_join::<Inventory>(Product::id.equal(Inventory::product))
            .filter(Inventory::shelf.not_equal("N/A"))
            .group_by([Product::name])
            .having(Inventory::quantity.sum().greater(100))
            .order_by([Product::name.asc()])
            .to_command(&GenericSqlWriter::new())
            .expect("Valid query");
        assert_eq!(
            command.text,
            indoc! {r#"
                SELECT "Product"."Name", SUM("Production"."ProductInventory"."Quantity") AS "Stock"
                FROM "Product"
                INNER JOIN "Production"."ProductInventory" ON "Product"."ProductID" = "Production"."ProductInventory"."ProductID"
                WHERE "Production"."ProductInventory"."Shelf" <> @p1
                GROUP BY "Product"."Name"
                HAVING SUM("Production"."ProductInventory"."Quantity") > @p2
                ORDER BY "Product"."Name" ASC;
            "#}
            .trim()
        );
        assert_eq!(command.parameters.get("@p1"), Some(&Value::Varchar(Some("N/A".into()))));
    }

    #[test]
    fn paged_join_keeps_shared_names_apart() {
        let command = QueryExpression::new()
            .select([
                PropertyExpression::from(Product::id),
                PropertyExpression::from(Inventory::product),
                Inventory::quantity.sum().alias("Stock"),
            ])
            .from::<Product>()
            .inner_join::<Inventory>(Product::id.equal(Inventory::product))
            .group_by([Product::id, Inventory::product])
            .page(0, 10, [Product::id.asc()])
            .to_command(&GenericSqlWriter::new())
            .expect("Valid query");
        assert_eq!(
            command.text,
            indoc! {r#"
                SELECT "__column0" AS "ProductID", "__column1" AS "ProductID", "__column2" AS "Stock"
                FROM (SELECT "Product"."ProductID" AS "__column0", "Production"."ProductInventory"."ProductID" AS "__column1", SUM("Production"."ProductInventory"."Quantity") AS "__column2", ROW_NUMBER() OVER (ORDER BY "Product"."ProductID" ASC) AS "__row_number"
                FROM "Product"
                INNER JOIN "Production"."ProductInventory" ON "Product"."ProductID" = "Production"."ProductInventory"."ProductID"
                GROUP BY "Product"."ProductID", "Production"."ProductInventory"."ProductID") AS "__paged"
                WHERE "__row_number" > 0 AND "__row_number" <= 10
                ORDER BY "__row_number";
            "#}
            .trim()
        );
    }

    #[test]
    fn pagination_support() {
        let paged = || {
            QueryExpression::new()
                .from::<Product>()
                .page(10, 20, [Product::name.asc()])
        };
        let command = paged()
            .to_command(&SqlServerSqlWriter::new())
            .expect("SQL Server numbers rows");
        assert_eq!(command.text.matches("ROW_NUMBER() OVER (ORDER BY [Name] ASC)").count(), 1);
        assert!(command.text.contains("WHERE [__row_number] > 10 AND [__row_number] <= 20"));

        for writer in [&CompactSqlWriter::new() as &dyn SqlWriter, &JetSqlWriter::new()] {
            let error = paged().to_command(writer).expect_err("No row numbering");
            assert!(
                matches!(
                    error.downcast_ref::<ErrorKind>(),
                    Some(ErrorKind::PaginationNotSupported { .. })
                ),
                "Unexpected error from {}: {error:#}",
                writer.dialect()
            );
        }
    }

    #[test]
    fn builder_order_is_enforced() {
        let mut query = QueryExpression::new()
            .from::<Product>()
            .order_by([Product::name.asc()])
            .filter(Product::id.greater(1));
        let error = query.build().expect_err("WHERE after ORDER BY");
        assert!(matches!(
            error.downcast_ref::<ErrorKind>(),
            Some(ErrorKind::InvalidOperation(..))
        ));

        let mut query = QueryExpression::new().select([Product::name]);
        assert!(query.build().is_err(), "A query needs a source");
    }

    #[test]
    fn create_inventory() {
        let mut out = String::new();
        SqlServerSqlWriter::new()
            .write_create_table(&mut out, &Inventory::describe().expect("Described"), false)
            .expect("Valid table");
        assert!(out.starts_with("CREATE TABLE [Production].[ProductInventory] ("));
        assert!(out.contains("[Shelf] NVARCHAR(10) NOT NULL"));
    }
}
