use crate::products::{Product, recreate_products};
use quarry::{ConcurrencyMode, ErrorKind, Executor, Session, Value, error_kind};
use rust_decimal::Decimal;

pub async fn concurrency<X: Executor>(session: &mut Session<X>) {
    recreate_products(session).await;
    let mut original = Product::new("Lock Washer", Some("Black"), Decimal::new(399, 2), 100);
    session
        .insert(&mut original)
        .await
        .expect("Failed to insert the lock washer");

    let mut first = session
        .find::<Product>(original.id)
        .await
        .expect("Failed to load the first copy")
        .expect("The lock washer is stored");
    let mut second = session
        .find::<Product>(original.id)
        .await
        .expect("Failed to load the second copy")
        .expect("The lock washer is stored");

    first.list_price = Decimal::new(449, 2);
    session.update(&mut first).await.expect("First writer wins");

    // The second copy was loaded before the first update
    second.safety_stock = 80;
    let error = session
        .update(&mut second)
        .await
        .expect_err("The second copy is stale");
    match error_kind(&error) {
        Some(ErrorKind::Concurrency { type_name, stale }) => {
            assert_eq!(*type_name, "Product");
            assert_eq!(
                stale.get_column("SafetyStockLevel"),
                Some(&Value::Int16(Some(80)))
            );
        }
        other => panic!("Expected a concurrency error, got {other:?}"),
    }
    let stored = session
        .reload(&second)
        .await
        .expect("Reload failed")
        .expect("The lock washer is stored");
    assert_eq!(stored.list_price, Decimal::new(449, 2));
    assert_eq!(stored.safety_stock, 100);

    // Objects without a checksum are never verified
    second.checksum = None;
    session
        .update(&mut second)
        .await
        .expect("Updates without checksum overwrite");
    assert!(second.checksum.is_some());

    // Conflicts can be ignored
    let mut stale = first.clone();
    stale.color = Some("Red".into());
    session.config_mut().concurrency = ConcurrencyMode::Ignore;
    let result = session.update(&mut stale).await;
    session.config_mut().concurrency = ConcurrencyMode::Fail;
    assert_eq!(result.expect("Last writer wins").rows_affected, 1);
    let stored = session
        .reload(&stale)
        .await
        .expect("Reload failed")
        .expect("The lock washer is stored");
    assert_eq!(stored.color.as_deref(), Some("Red"));
    assert_eq!(stored.safety_stock, 100);
}
