use crate::mock::{MockExecutor, MockTable};
use quarry::{Dialect, DialectRegistry, Record, Session, SessionConfig};
use rust_decimal::Decimal;
use std::sync::Arc;
use time::PrimitiveDateTime;

#[derive(Default, Debug, Clone, PartialEq, Record)]
pub struct Customer {
    #[quarry(primary_key)]
    pub id: i64,
    #[quarry(length = 80)]
    pub name: String,
    pub email: Option<String>,
    pub active: bool,
}

#[derive(Default, Debug, Clone, PartialEq, Record)]
#[quarry(name = "orders")]
pub struct Order {
    #[quarry(primary_key, generated)]
    pub id: Option<i64>,
    #[quarry(relation = "customer_id")]
    pub customer: Option<Box<Customer>>,
    pub status: String,
    pub total: Decimal,
    #[quarry(name = "placed_at")]
    pub placed: Option<PrimitiveDateTime>,
}

/// Lives in the `orderline` table, the last name candidate.
#[derive(Default, Debug, Clone, PartialEq, Record)]
pub struct OrderLine {
    #[quarry(primary_key)]
    pub order_id: i64,
    #[quarry(primary_key)]
    pub line_no: i32,
    pub product: String,
    pub quantity: i32,
    #[quarry(ignore)]
    pub note: String,
}

#[derive(Default, Debug, Clone, PartialEq, Record)]
pub struct CustomerSummary {
    pub customer_id: i64,
    pub orders: i64,
}

#[derive(Default, Debug, Clone, PartialEq, Record)]
pub struct Invoice {
    #[quarry(primary_key, sequence = "invoice_seq")]
    pub id: Option<i64>,
    pub amount: Decimal,
}

/// A record without a table.
#[derive(Default, Debug, Clone, PartialEq, Record)]
pub struct Ghost {
    pub id: i64,
}

/// Schema holding the shop tables.
pub fn shop_schema(dialect: &dyn Dialect) -> &'static str {
    match dialect.default_schema() {
        "" => "shop",
        v => v,
    }
}

/// Executor whose catalog holds the shop tables.
pub fn shop(dialect: Arc<dyn Dialect>) -> MockExecutor {
    let schema = shop_schema(dialect.as_ref());
    MockExecutor::new(dialect)
        .with_table(
            MockTable::new(schema, "customer")
                .column("id", "bigint", false)
                .column("name", "varchar(80)", false)
                .column("email", "varchar(120)", true)
                .column("active", "boolean", false)
                .primary_key(&["id"]),
        )
        .with_table(
            MockTable::new(schema, "orders")
                .column("id", "bigint", false)
                .column("customer_id", "bigint", true)
                .column("status", "varchar(20)", false)
                .column("total", "numeric(12,2)", false)
                .column("placed_at", "timestamp", true)
                .primary_key(&["id"])
                .identity("id"),
        )
        .with_table(
            MockTable::new(schema, "orderline")
                .column("order_id", "bigint", false)
                .column("line_no", "integer", false)
                .column("product", "varchar(40)", false)
                .column("quantity", "integer", false)
                .primary_key(&["order_id", "line_no"]),
        )
        .with_table(
            MockTable::new(schema, "customer_summary")
                .view()
                .column("customer_id", "bigint", false)
                .column("orders", "bigint", false),
        )
        .with_table(
            MockTable::new(schema, "invoice")
                .column("id", "bigint", false)
                .column("amount", "numeric(12,2)", false)
                .primary_key(&["id"]),
        )
        .with_sequence(schema, "invoice_seq")
}

/// Session over `executor`, the schema comes from the database name when the
/// dialect has no default one.
pub fn session(executor: MockExecutor, dialect: Arc<dyn Dialect>) -> Session<MockExecutor> {
    let mut registry = DialectRegistry::empty();
    registry.register(dialect.clone());
    let config = SessionConfig {
        database: Some("shop".into()),
        ..SessionConfig::new(dialect.name())
    };
    Session::new(executor, &config, &registry).expect("Could not create the session")
}
