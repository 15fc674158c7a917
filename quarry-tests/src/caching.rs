use quarry::{
    Entity, Executor, JoinType, Property, PropertyExpression, QueryExpression, Session,
    StorageCommand, Value,
};

#[derive(Entity, Debug, Clone, PartialEq)]
#[quarry(name = "UnitMeasure", cache = 60)]
struct UnitMeasure {
    #[quarry(name = "UnitMeasureCode", identifier, size = 3)]
    code: String,
    #[quarry(name = "Name", size = 50)]
    name: String,
}

#[derive(Entity, Debug, Clone, PartialEq)]
#[quarry(name = "UnitConversion")]
struct UnitConversion {
    #[quarry(name = "ConversionID", identifier)]
    id: i32,
    #[quarry(name = "UnitMeasureCode", size = 3)]
    unit: String,
    #[quarry(name = "Name", size = 50)]
    name: String,
}

pub async fn caching<X: Executor>(session: &mut Session<X>) {
    session
        .drop_table::<UnitMeasure>(true)
        .await
        .expect("Failed to drop the UnitMeasure table");
    session
        .create_table::<UnitMeasure>(false)
        .await
        .expect("Failed to create the UnitMeasure table");
    session.clear_cache();
    let mut unit = UnitMeasure {
        code: "CM".into(),
        name: "Centimeter".into(),
    };
    session.insert(&mut unit).await.expect("Failed to insert");

    let query = QueryExpression::new()
        .from::<UnitMeasure>()
        .build()
        .expect("Valid query");
    let units = session.select::<UnitMeasure>(&query).await.expect("Select failed");
    assert_eq!(units, [unit.clone()]);
    assert_eq!(session.cached_results(), 1);

    // A row written behind the session is not seen until the cache entry goes away
    let mut command = StorageCommand::new(
        "INSERT INTO \"UnitMeasure\" (\"UnitMeasureCode\", \"Name\") VALUES (@h1, @h2);",
    );
    command
        .add_parameter("@h1", Value::Varchar(Some("KG".into())))
        .add_parameter("@h2", Value::Varchar(Some("Kilogram".into())));
    session
        .executor()
        .execute(command)
        .await
        .expect("Failed to insert behind the session");
    let units = session.select::<UnitMeasure>(&query).await.expect("Select failed");
    assert_eq!(units.len(), 1);

    // Writes through the session drop the entries of the table
    let mut unit = UnitMeasure {
        code: "M".into(),
        name: "Meter".into(),
    };
    session.insert(&mut unit).await.expect("Failed to insert");
    assert_eq!(session.cached_results(), 0);
    let units = session.select::<UnitMeasure>(&query).await.expect("Select failed");
    assert_eq!(units.len(), 3);
    assert_eq!(session.cached_results(), 1);

    session.clear_cache();
    assert_eq!(session.cached_results(), 0);

    // Joined tables drop the entries reading them as well
    session
        .drop_table::<UnitConversion>(true)
        .await
        .expect("Failed to drop the UnitConversion table");
    session
        .create_table::<UnitConversion>(false)
        .await
        .expect("Failed to create the UnitConversion table");
    let converted = QueryExpression::new()
        .from::<UnitMeasure>()
        .join::<UnitConversion>(
            JoinType::Inner,
            UnitMeasure::code.equal(UnitConversion::unit),
        )
        .build()
        .expect("Valid query");
    let units = session.select::<UnitMeasure>(&converted).await.expect("Select failed");
    assert!(units.is_empty());
    assert_eq!(session.cached_results(), 1);
    let mut conversion = UnitConversion {
        id: 1,
        unit: "CM".into(),
        name: "Inch".into(),
    };
    session.insert(&mut conversion).await.expect("Failed to insert");
    assert_eq!(session.cached_results(), 0);
    let units = session.select::<UnitMeasure>(&converted).await.expect("Select failed");
    let codes: Vec<_> = units.iter().map(|v| v.code.as_str()).collect();
    assert_eq!(codes, ["CM"]);

    // Both "Name" columns survive the paging subquery
    let query = QueryExpression::new()
        .select([
            PropertyExpression::from(UnitMeasure::name),
            PropertyExpression::from(UnitConversion::name),
        ])
        .from::<UnitMeasure>()
        .join::<UnitConversion>(
            JoinType::Inner,
            UnitMeasure::code.equal(UnitConversion::unit),
        )
        .page(0, 10, [UnitConversion::id.asc()])
        .build()
        .expect("Valid query");
    let command = session.compile(&query).expect("Valid command");
    let rows = session.fetch(command).await.expect("Fetch failed");
    assert_eq!(rows.len(), 1);
    assert_eq!(
        rows[0].values(),
        [
            Value::Varchar(Some("Centimeter".into())),
            Value::Varchar(Some("Inch".into())),
        ]
    );
    session.clear_cache();
}
