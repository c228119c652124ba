use crate::{Order, session, shop};
use quarry::{Dialect, future::join_all};
use std::{sync::Arc, time::Duration};

pub async fn single_flight(dialect: Arc<dyn Dialect>) {
    // Introspection cost of one resolution
    let reference = session(shop(dialect.clone()), dialect.clone());
    reference
        .table::<Order>()
        .await
        .expect("Could not resolve Order");
    let expected = reference.executor().introspections();

    let executor = shop(dialect.clone()).with_delay(Duration::from_millis(5));
    let session = session(executor, dialect);
    let tables = join_all((0..16).map(|_| session.table::<Order>())).await;
    let tables = tables
        .into_iter()
        .collect::<Result<Vec<_>, _>>()
        .expect("Every concurrent caller gets the table");
    assert_eq!(tables.len(), 16);
    assert!(tables.iter().all(|v| Arc::ptr_eq(v, &tables[0])));
    assert_eq!(session.executor().introspections(), expected);
    assert_eq!(session.cache().tables_len(), 3, "Order, its scalar part and Customer");
}
