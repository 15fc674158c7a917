use quarry::{Entity, Executor, Property, PropertyExpression, QueryExpression, Session};

#[derive(Entity, Debug, Clone, PartialEq)]
#[quarry(name = "InventoryCount", truncate)]
struct InventoryCount {
    #[quarry(name = "LocationID", identifier)]
    location: i32,
    #[quarry(name = "Shelf", identifier)]
    shelf: String,
    #[quarry(name = "Quantity")]
    quantity: i32,
}

#[derive(Entity, Debug, Clone, PartialEq)]
#[quarry(name = "ScrapReason")]
struct ScrapReason {
    #[quarry(name = "ScrapReasonID", identifier)]
    id: i64,
    #[quarry(name = "Name", size = 50)]
    name: String,
    #[quarry(name = "Weight")]
    weight: f64,
}

pub async fn batches<X: Executor>(session: &mut Session<X>) {
    session
        .drop_table::<ScrapReason>(true)
        .await
        .expect("Failed to drop the ScrapReason table");
    session
        .create_table::<ScrapReason>(false)
        .await
        .expect("Failed to create the ScrapReason table");
    let batch_size = session.config().batch_size;
    session.config_mut().batch_size = 50;

    let mut reasons: Vec<_> = (1..=250)
        .map(|i| ScrapReason {
            id: i,
            name: format!("Reason {i}"),
            weight: i as f64 / 4.0,
        })
        .collect();
    let result = session
        .insert_batch(&reasons)
        .await
        .expect("Failed to insert the reasons");
    assert_eq!(result.rows_affected, 250);
    assert_eq!(
        session
            .count::<ScrapReason>(PropertyExpression::Empty)
            .await
            .expect("Count failed"),
        250
    );

    for reason in reasons.iter_mut() {
        reason.weight *= 2.0;
        if reason.id % 5 == 0 {
            reason.name = format!("Reason {} (revised)", reason.id);
        }
    }
    let result = session
        .update_batch(&mut reasons)
        .await
        .expect("Failed to update the reasons");
    assert_eq!(result.rows_affected, 250);
    let stored = session
        .select::<ScrapReason>(
            &QueryExpression::new()
                .from::<ScrapReason>()
                .order_by([ScrapReason::id.asc()])
                .build()
                .expect("Valid query"),
        )
        .await
        .expect("Select failed");
    assert_eq!(stored, reasons);

    let result = session
        .delete_batch(&reasons[..100])
        .await
        .expect("Failed to delete the reasons");
    assert_eq!(result.rows_affected, 100);
    assert_eq!(
        session
            .count::<ScrapReason>(ScrapReason::id.less_equal(100))
            .await
            .expect("Count failed"),
        0
    );

    // Composite identifiers
    session
        .drop_table::<InventoryCount>(true)
        .await
        .expect("Failed to drop the InventoryCount table");
    session
        .create_table::<InventoryCount>(false)
        .await
        .expect("Failed to create the InventoryCount table");
    let mut counts: Vec<_> = (1..=3)
        .flat_map(|location| {
            ["A", "B"].into_iter().map(move |shelf| InventoryCount {
                location,
                shelf: shelf.into(),
                quantity: location * 10,
            })
        })
        .collect();
    session
        .insert_batch(&counts)
        .await
        .expect("Failed to insert the counts");
    counts[1].quantity = 99;
    let result = session
        .update_batch(&mut counts[1..2])
        .await
        .expect("Failed to update one count");
    assert_eq!(result.rows_affected, 1);
    let stored = session
        .select::<InventoryCount>(
            &QueryExpression::new()
                .from::<InventoryCount>()
                .filter(InventoryCount::quantity.equal(99))
                .build()
                .expect("Valid query"),
        )
        .await
        .expect("Select failed");
    assert_eq!(stored, [counts[1].clone()]);
    session
        .delete_batch(&counts[..2])
        .await
        .expect("Failed to delete the counts");
    assert_eq!(
        session
            .count::<InventoryCount>(PropertyExpression::Empty)
            .await
            .expect("Count failed"),
        4
    );
    session
        .truncate::<InventoryCount>()
        .await
        .expect("Failed to truncate the counts");
    assert_eq!(
        session
            .count::<InventoryCount>(PropertyExpression::Empty)
            .await
            .expect("Count failed"),
        0
    );

    session.config_mut().batch_size = batch_size;
}
