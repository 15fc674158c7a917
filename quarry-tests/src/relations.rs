use quarry::{Entity, Executor, Preload, Property, QueryExpression, Session};

#[derive(Entity, Debug, Default)]
#[quarry(name = "Customer")]
struct Customer {
    #[quarry(name = "CustomerID", identifier)]
    id: i32,
    #[quarry(name = "AccountNumber", size = 10)]
    account: String,
    #[quarry(relation(local = "CustomerID", foreign = "CustomerID"))]
    orders: Vec<SalesOrder>,
    #[quarry(relation(local = "CustomerID", foreign = "CustomerID"))]
    address: Option<Box<CustomerAddress>>,
    #[quarry(relation(local = "CustomerID", foreign = "CustomerID"), preload = false)]
    notes: Vec<CustomerNote>,
}

#[derive(Entity, Debug, Default)]
#[quarry(name = "SalesOrderHeader")]
struct SalesOrder {
    #[quarry(name = "SalesOrderID", identifier)]
    id: i32,
    #[quarry(name = "CustomerID")]
    customer: i32,
    #[quarry(name = "TotalDue")]
    total: f64,
    #[quarry(relation(local = "SalesOrderID", foreign = "SalesOrderID"))]
    lines: Vec<SalesOrderLine>,
}

#[derive(Entity, Debug, Default)]
#[quarry(name = "SalesOrderDetail")]
struct SalesOrderLine {
    #[quarry(name = "SalesOrderDetailID", identifier)]
    id: i32,
    #[quarry(name = "SalesOrderID")]
    order: i32,
    #[quarry(name = "OrderQty")]
    quantity: i16,
}

#[derive(Entity, Debug, Default)]
#[quarry(name = "CustomerAddress")]
struct CustomerAddress {
    #[quarry(name = "AddressID", identifier)]
    id: i32,
    #[quarry(name = "CustomerID")]
    customer: i32,
    #[quarry(name = "City", size = 30)]
    city: String,
}

#[derive(Entity, Debug, Default)]
#[quarry(name = "CustomerNote")]
struct CustomerNote {
    #[quarry(name = "NoteID", identifier)]
    id: i32,
    #[quarry(name = "CustomerID")]
    customer: i32,
    #[quarry(name = "Text")]
    text: String,
}

macro_rules! recreate {
    ($session:expr, $($entity:ty),+ $(,)?) => {
        $(
            $session
                .drop_table::<$entity>(true)
                .await
                .expect(concat!("Failed to drop ", stringify!($entity)));
            $session
                .create_table::<$entity>(false)
                .await
                .expect(concat!("Failed to create ", stringify!($entity)));
        )+
    };
}

pub async fn relations<X: Executor>(session: &mut Session<X>) {
    recreate!(
        session,
        Customer,
        SalesOrder,
        SalesOrderLine,
        CustomerAddress,
        CustomerNote
    );
    for id in 1..=2 {
        let mut customer = Customer {
            id,
            account: format!("AW{id:08}"),
            ..Default::default()
        };
        session
            .insert(&mut customer)
            .await
            .expect("Failed to insert a customer");
    }
    let mut orders: Vec<_> = (1..=3)
        .map(|id| SalesOrder {
            id,
            customer: 1,
            total: id as f64 * 100.0,
            ..Default::default()
        })
        .collect();
    orders.push(SalesOrder {
        id: 4,
        customer: 2,
        total: 42.0,
        ..Default::default()
    });
    session
        .insert_batch(&orders)
        .await
        .expect("Failed to insert the orders");
    let lines: Vec<_> = (1..=6)
        .map(|id| SalesOrderLine {
            id,
            order: (id + 1) / 2,
            quantity: id as i16,
        })
        .collect();
    session
        .insert_batch(&lines)
        .await
        .expect("Failed to insert the lines");
    let mut address = CustomerAddress {
        id: 10,
        customer: 1,
        city: "Bothell".into(),
    };
    session
        .insert(&mut address)
        .await
        .expect("Failed to insert the address");
    let mut note = CustomerNote {
        id: 1,
        customer: 1,
        text: "Prefers email".into(),
    };
    session.insert(&mut note).await.expect("Failed to insert the note");

    let query = || {
        QueryExpression::new()
            .from::<Customer>()
            .order_by([Customer::id.asc()])
            .build()
            .expect("Valid query")
    };

    // Nothing requested, nothing loaded
    let customers = session
        .select::<Customer>(&query())
        .await
        .expect("Select failed");
    assert_eq!(customers.len(), 2);
    assert!(customers.iter().all(|v| v.orders.is_empty() && v.address.is_none()));

    // Nested preload
    let preload = Preload::parse("orders.lines, address, notes");
    let customers = session
        .select_with::<Customer>(&query(), &preload)
        .await
        .expect("Select with preload failed");
    let first = &customers[0];
    assert_eq!(first.orders.len(), 3);
    assert!(first.orders.iter().all(|v| v.lines.len() == 2));
    assert_eq!(
        first.address.as_ref().map(|v| v.city.as_str()),
        Some("Bothell")
    );
    // Relation not allowing preload
    assert!(first.notes.is_empty());
    let second = &customers[1];
    assert_eq!(second.orders.len(), 1);
    assert_eq!(second.orders[0].total, 42.0);
    assert!(second.orders[0].lines.is_empty());
    assert!(second.address.is_none());

    // Traversal stops where the tree ends
    let preload = Preload::new().with("orders");
    let customers = session
        .select_with::<Customer>(&query(), &preload)
        .await
        .expect("Select with preload failed");
    assert_eq!(customers[0].orders.len(), 3);
    assert!(customers[0].orders.iter().all(|v| v.lines.is_empty()));
    assert!(customers[0].address.is_none());

    // Explicit load
    let notes = session
        .load_related::<Customer, CustomerNote>(&customers[0], "orders", &Preload::new())
        .await;
    assert!(notes.is_err(), "The relation targets another type");
    let orders = session
        .load_related::<Customer, SalesOrder>(&customers[1], "orders", &Preload::new())
        .await
        .expect("Failed to load the orders")
        .expect("Orders can be preloaded");
    assert_eq!(orders.len(), 1);
    assert!(
        session
            .load_related::<Customer, CustomerNote>(&customers[0], "notes", &Preload::new())
            .await
            .expect("Failed to load the notes")
            .is_none()
    );
}
