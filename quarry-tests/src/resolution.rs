use crate::{Customer, CustomerSummary, Ghost, Order, OrderLine, session, shop, shop_schema};
use quarry::{DataType, Dialect, QuarryError, TableKind, ValueGenerator};
use std::sync::Arc;

pub async fn resolution(dialect: Arc<dyn Dialect>) {
    let schema = shop_schema(dialect.as_ref());
    let session = session(shop(dialect.clone()), dialect);

    // Declared table name
    let orders = session
        .table::<Order>()
        .await
        .expect("Could not resolve Order");
    assert_eq!(orders.name, "orders");
    assert_eq!(orders.domain, schema);
    assert_eq!(orders.kind, TableKind::Table);
    assert_eq!(orders.primary_key, ["id"]);
    assert!(orders.contains_linked_table);
    assert_eq!(orders.generators.get("id"), Some(&ValueGenerator::Identity));
    let placed = orders.column("placed").expect("Column for the placed field");
    assert_eq!(placed.name, "placed_at");
    assert_eq!(placed.data_type, DataType::Timestamp);
    assert!(placed.nullable);
    let total = orders.column("total").expect("Column for the total field");
    assert_eq!(total.data_type, DataType::Decimal);
    assert!(!total.nullable);

    // Relation
    let customer = orders
        .column("customer")
        .expect("Column for the customer relation");
    let relation = customer
        .relation
        .as_ref()
        .expect("The customer field is a relation");
    assert_eq!(relation.local_columns, ["customer_id"]);
    assert_eq!(relation.linked.name, "customer");
    assert_eq!(relation.linked.primary_key, ["id"]);
    assert!(relation.linked.columns.iter().all(|c| !c.is_relation()));
    assert_eq!(
        customer
            .linked_columns()
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>(),
        ["id", "name", "email", "active"]
    );
    let name = relation.linked.column("name").expect("Customer name column");
    assert_eq!(name.length, Some(80));
    assert!(name.data_type.is_text());

    // Third name candidate, composite key, ignored field
    let lines = session
        .table::<OrderLine>()
        .await
        .expect("Could not resolve OrderLine");
    assert_eq!(lines.name, "orderline");
    assert_eq!(lines.primary_key, ["order_id", "line_no"]);
    assert!(lines.column("note").is_none());
    assert_eq!(lines.columns.len(), 4);
    assert!(lines.generators.is_empty());

    // View without key
    let summary = session
        .table::<CustomerSummary>()
        .await
        .expect("Could not resolve CustomerSummary");
    assert_eq!(summary.kind, TableKind::View);
    assert_eq!(summary.name, "customer_summary");
    assert!(summary.primary_key.is_empty());

    // Table known by name only
    let named = session
        .named_table("Customer")
        .await
        .expect("Could not resolve the customer table by name");
    assert_eq!(named.name, "Customer");
    assert_eq!(named.primary_key, ["id"]);
    assert!(named.record.is_none());
    assert_eq!(named.column("email").map(|c| c.nullable), Some(true));
    let qualified = session
        .named_table(&format!("{schema}.orderline"))
        .await
        .expect("Could not resolve the qualified orderline table");
    assert_eq!(qualified.primary_key, ["order_id", "line_no"]);
}

pub async fn caching(dialect: Arc<dyn Dialect>) {
    let session = session(shop(dialect.clone()), dialect);

    let first = session
        .table::<Customer>()
        .await
        .expect("Could not resolve Customer");
    let introspections = session.executor().introspections();
    assert_eq!(introspections, 3, "Existence, columns and primary key");
    let second = session
        .table::<Customer>()
        .await
        .expect("Could not resolve Customer again");
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(session.executor().introspections(), introspections);

    // Relations
    session
        .table::<Order>()
        .await
        .expect("Could not resolve Order");
    let after_order = session.executor().introspections();
    session
        .table::<Order>()
        .await
        .expect("Could not resolve Order again");
    assert_eq!(session.executor().introspections(), after_order);
    assert!(session.executor().statements().is_empty());
}

pub async fn missing_table(dialect: Arc<dyn Dialect>) {
    let session = session(shop(dialect.clone()), dialect);

    let error = session
        .table::<Ghost>()
        .await
        .expect_err("Ghost has no table");
    assert!(matches!(
        QuarryError::of(&error),
        Some(QuarryError::MetadataResolution(..))
    ));
    let message = error.to_string();
    assert!(message.contains("Ghost"), "{message}");
    assert!(message.contains("ghost"), "{message}");
    assert!(message.contains("GHOST"), "{message}");

    // Failures are not cached
    let introspections = session.executor().introspections();
    assert!(session.table::<Ghost>().await.is_err());
    assert!(session.executor().introspections() > introspections);
}
