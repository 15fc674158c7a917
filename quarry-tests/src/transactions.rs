use quarry::{
    Entity, ErrorKind, Executor, IsolationLevel, PropertyExpression, Session, error_kind,
};

#[derive(Entity, Debug, Clone, PartialEq)]
#[quarry(name = "TransactionHistory")]
struct TransactionHistory {
    #[quarry(name = "TransactionID", identifier, auto_increment)]
    id: i64,
    #[quarry(name = "ReferenceOrderID")]
    reference: i32,
    #[quarry(name = "TransactionType", size = 1)]
    kind: char,
    #[quarry(name = "Quantity")]
    quantity: i32,
}

impl TransactionHistory {
    fn new(reference: i32, quantity: i32) -> Self {
        Self {
            id: 0,
            reference,
            kind: 'S',
            quantity,
        }
    }
}

async fn stored<X: Executor>(session: &mut Session<X>) -> u64 {
    session
        .count::<TransactionHistory>(PropertyExpression::Empty)
        .await
        .expect("Count failed")
}

pub async fn transactions<X: Executor>(session: &mut Session<X>) {
    session
        .drop_table::<TransactionHistory>(true)
        .await
        .expect("Failed to drop the TransactionHistory table");
    session
        .create_table::<TransactionHistory>(false)
        .await
        .expect("Failed to create the TransactionHistory table");

    // Commit
    let token = session.begin(None).await.expect("Failed to begin");
    assert!(token.is_owner());
    session
        .insert(&mut TransactionHistory::new(1, 10))
        .await
        .expect("Failed to insert");
    session.commit(token, false).await.expect("Failed to commit");
    assert!(!session.in_transaction());
    assert_eq!(stored(session).await, 1);

    // Rollback
    let token = session
        .begin(Some(IsolationLevel::Serializable))
        .await
        .expect("Failed to begin");
    session
        .insert(&mut TransactionHistory::new(2, 20))
        .await
        .expect("Failed to insert");
    assert_eq!(stored(session).await, 2);
    session.rollback(token).await.expect("Failed to roll back");
    assert_eq!(stored(session).await, 1);

    // Nested scopes commit once, with the outermost
    let outer = session.begin(None).await.expect("Failed to begin");
    let inner = session.begin(None).await.expect("Failed to enlist");
    assert!(!inner.is_owner());
    session
        .insert(&mut TransactionHistory::new(3, 30))
        .await
        .expect("Failed to insert");
    session.commit(inner, false).await.expect("Failed to leave");
    assert!(session.in_transaction());
    session.commit(outer, false).await.expect("Failed to commit");
    assert!(!session.in_transaction());
    assert_eq!(stored(session).await, 2);

    // A nested rollback poisons the whole transaction
    let outer = session.begin(None).await.expect("Failed to begin");
    let inner = session.begin(None).await.expect("Failed to enlist");
    session
        .insert(&mut TransactionHistory::new(4, 40))
        .await
        .expect("Failed to insert");
    session.rollback(inner).await.expect("Failed to roll back");
    let error = session
        .commit(outer, false)
        .await
        .expect_err("The transaction was rolled back");
    assert!(matches!(
        error_kind(&error),
        Some(ErrorKind::InvalidOperation(..))
    ));
    assert!(!session.in_transaction());
    assert_eq!(stored(session).await, 2);

    // Forced commit from a nested scope
    let outer = session.begin(None).await.expect("Failed to begin");
    let inner = session.begin(None).await.expect("Failed to enlist");
    session
        .insert(&mut TransactionHistory::new(5, 50))
        .await
        .expect("Failed to insert");
    session.commit(inner, true).await.expect("Failed to force the commit");
    assert!(!session.in_transaction());
    assert!(session.commit(outer, false).await.is_err());
    assert_eq!(stored(session).await, 3);
}
