use futures::TryStreamExt;
use quarry::{
    Entity, ErrorKind, Executor, Property, PropertyExpression, QueryExpression, Session,
    error_kind,
};
use rust_decimal::Decimal;
use time::PrimitiveDateTime;

#[derive(Entity, Debug, Clone, PartialEq)]
#[quarry(name = "Product")]
pub struct Product {
    #[quarry(name = "ProductID", identifier, auto_increment)]
    pub id: i64,
    #[quarry(name = "Name", size = 50)]
    pub name: String,
    #[quarry(name = "Color", size = 15)]
    pub color: Option<String>,
    #[quarry(name = "ListPrice")]
    pub list_price: Decimal,
    #[quarry(name = "SafetyStockLevel")]
    pub safety_stock: i16,
    #[quarry(name = "ModifiedDate", default = "CURRENT_TIMESTAMP")]
    pub modified: Option<PrimitiveDateTime>,
    #[quarry(checksum)]
    pub checksum: Option<u64>,
}

impl Product {
    pub fn new(name: &str, color: Option<&str>, list_price: Decimal, safety_stock: i16) -> Self {
        Self {
            id: 0,
            name: name.into(),
            color: color.map(Into::into),
            list_price,
            safety_stock,
            modified: None,
            checksum: None,
        }
    }
}

/// Same table, mapped read only.
#[derive(Entity, Debug)]
#[quarry(name = "Product", read_only)]
struct ProductName {
    #[quarry(name = "ProductID", identifier)]
    id: i64,
    #[quarry(name = "Name")]
    name: String,
}

pub async fn recreate_products<X: Executor>(session: &mut Session<X>) {
    session
        .drop_table::<Product>(true)
        .await
        .expect("Failed to drop the Product table");
    session
        .create_table::<Product>(false)
        .await
        .expect("Failed to create the Product table");
}

pub async fn products<X: Executor>(session: &mut Session<X>) {
    recreate_products(session).await;

    // Insert merges the generated key and the storage default
    let mut bolt = Product::new("Bolt", Some("Silver"), Decimal::new(1250, 2), 500);
    let result = session.insert(&mut bolt).await.expect("Failed to insert the bolt");
    assert_eq!(result.rows_affected, 1);
    assert!(bolt.id > 0);
    assert!(bolt.modified.is_some());
    assert!(bolt.checksum.is_some());
    let mut nut = Product::new("Nut", None, Decimal::new(75, 2), 1000);
    session.insert(&mut nut).await.expect("Failed to insert the nut");
    assert_ne!(bolt.id, nut.id);

    // Find and reload
    let found = session
        .find::<Product>(bolt.id)
        .await
        .expect("Failed to find the bolt")
        .expect("The bolt is not stored");
    assert_eq!(found, bolt);
    assert_eq!(found.list_price, Decimal::new(1250, 2));
    assert!(session.find::<Product>(-1).await.expect("Find failed").is_none());
    assert!(session.exists(&nut).await.expect("Exists failed"));

    // Update
    bolt.color = Some("Black".into());
    bolt.safety_stock = 450;
    let result = session.update(&mut bolt).await.expect("Failed to update the bolt");
    assert_eq!(result.rows_affected, 1);
    let reloaded = session
        .reload(&bolt)
        .await
        .expect("Failed to reload the bolt")
        .expect("The bolt is not stored");
    assert_eq!(reloaded.color.as_deref(), Some("Black"));
    assert_eq!(reloaded.safety_stock, 450);
    assert_eq!(reloaded.checksum, bolt.checksum);

    // Read only mapping
    let mut names = session
        .select::<ProductName>(
            &QueryExpression::new()
                .from::<ProductName>()
                .order_by([ProductName::name.asc()])
                .build()
                .expect("Valid query"),
        )
        .await
        .expect("Failed to select the product names");
    assert_eq!(names.len(), 2);
    assert_eq!(names[0].name, "Bolt");
    assert_eq!(names[1].id, nut.id);
    let error = session
        .insert(&mut names[0])
        .await
        .expect_err("Read only mappings cannot insert");
    assert!(matches!(
        error_kind(&error),
        Some(ErrorKind::InvalidOperation(..))
    ));

    // Delete
    let result = session.delete(&nut).await.expect("Failed to delete the nut");
    assert_eq!(result.rows_affected, 1);
    assert!(!session.exists(&nut).await.expect("Exists failed"));
    assert_eq!(
        session
            .count::<Product>(PropertyExpression::Empty)
            .await
            .expect("Count failed"),
        1
    );
}

pub async fn product_queries<X: Executor>(session: &mut Session<X>) {
    recreate_products(session).await;
    let colors = [Some("Red"), Some("Blue"), None];
    for i in 0..30 {
        let mut product = Product::new(
            &format!("Washer {i:02}"),
            colors[i % colors.len()],
            Decimal::new(10 + i as i64, 1),
            (i * 10) as i16,
        );
        session.insert(&mut product).await.expect("Failed to insert a washer");
    }

    // Filter, order, limit
    let query = QueryExpression::new()
        .from::<Product>()
        .filter(Product::color.equal("Red") & Product::safety_stock.greater(50))
        .order_by([Product::safety_stock.desc()])
        .limit(3)
        .build()
        .expect("Valid query");
    let products = session.select::<Product>(&query).await.expect("Select failed");
    let names: Vec<_> = products.iter().map(|v| v.name.as_str()).collect();
    assert_eq!(names, ["Washer 27", "Washer 24", "Washer 21"]);

    // Null tests and IN lists
    let query = QueryExpression::new()
        .from::<Product>()
        .filter(Product::color.is_null().and(Product::safety_stock.is_in([20, 50, 80, 90])))
        .build()
        .expect("Valid query");
    let products = session.select::<Product>(&query).await.expect("Select failed");
    assert_eq!(products.len(), 3);
    assert!(products.iter().all(|v| v.color.is_none()));

    // Pagination through row numbers
    let query = QueryExpression::new()
        .from::<Product>()
        .page(10, 15, [Product::name.asc()])
        .build()
        .expect("Valid query");
    let page = session.select::<Product>(&query).await.expect("Page failed");
    let names: Vec<_> = page.iter().map(|v| v.name.as_str()).collect();
    assert_eq!(
        names,
        ["Washer 10", "Washer 11", "Washer 12", "Washer 13", "Washer 14"]
    );

    // Grouping
    let query = QueryExpression::new()
        .select([
            PropertyExpression::from(Product::color),
            PropertyExpression::count_all().alias("total"),
        ])
        .from::<Product>()
        .filter(Product::color.is_not_null())
        .group_by([Product::color])
        .order_by([Product::color.asc()])
        .build()
        .expect("Valid query");
    let command = session.compile(&query).expect("Valid command");
    let rows = session.fetch(command).await.expect("Fetch failed");
    assert_eq!(rows.len(), 2);
    let totals: Vec<_> = rows
        .iter()
        .map(|row| {
            (
                row.get_column("Color").cloned(),
                row.get_column("total").cloned(),
            )
        })
        .collect();
    assert_eq!(
        totals,
        [
            (
                Some(quarry::Value::Varchar(Some("Blue".into()))),
                Some(quarry::Value::Int64(Some(10)))
            ),
            (
                Some(quarry::Value::Varchar(Some("Red".into()))),
                Some(quarry::Value::Int64(Some(10)))
            ),
        ]
    );

    // Functions
    let query = QueryExpression::new()
        .from::<Product>()
        .filter(Product::name.upper().equal("WASHER 07"))
        .build()
        .expect("Valid query");
    let washer = session
        .first::<Product>(&query)
        .await
        .expect("First failed")
        .expect("Washer 07 is stored");
    assert_eq!(washer.safety_stock, 70);

    // Streaming
    let query = QueryExpression::new()
        .from::<Product>()
        .filter(Product::list_price.greater_equal(Decimal::new(35, 1)))
        .build()
        .expect("Valid query");
    let streamed: Vec<Product> = session
        .stream::<Product>(&query)
        .try_collect()
        .await
        .expect("Stream failed");
    assert!(!streamed.is_empty());

    // Builder misuse
    let mut builder = QueryExpression::new().from::<Product>().limit(1);
    builder.build().expect("First build");
    let error = builder.build().expect_err("A builder compiles once");
    assert!(matches!(
        error_kind(&error),
        Some(ErrorKind::InvalidOperation(..))
    ));
}
