use crate::{Customer, Order, session, shop, shop_schema};
use quarry::{
    Dialect, DialectRegistry, Filter, KeyCase, Lock, Operator, QuarryError, Query, Session,
    SessionConfig, Value,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use time::macros::datetime;

const CUSTOMER_LABELS: &[&str] = &["id", "name", "email", "active"];

fn customer_row(id: i64, name: &'static str, email: Option<&str>) -> Vec<Value> {
    vec![
        id.into(),
        name.into(),
        email.map(ToString::to_string).into(),
        true.into(),
    ]
}

pub async fn queries(dialect: Arc<dyn Dialect>) {
    let schema = shop_schema(dialect.as_ref());
    let session = session(shop(dialect.clone()), dialect);
    let executor = session.executor();

    // By primary key
    executor.push_rows(CUSTOMER_LABELS, vec![customer_row(1, "Ada", None)]);
    let customer = session
        .select::<Customer>(1_i64)
        .await
        .expect("Could not select the customer")
        .expect("Customer 1 exists");
    assert_eq!(
        customer,
        Customer {
            id: 1,
            name: "Ada".into(),
            email: None,
            active: true,
        }
    );
    let statement = executor.last_statement();
    assert_eq!(
        statement.sql,
        format!("SELECT id, name, email, active FROM {schema}.customer WHERE id = :id_0")
    );
    assert_eq!(statement.params.get("id_0"), Some(&Value::Int64(Some(1))));
    assert_eq!(
        session
            .select::<Customer>(2_i64)
            .await
            .expect("Could not select the customer"),
        None
    );

    // Case-insensitive like, comma separated list, ordering
    executor.push_rows(
        CUSTOMER_LABELS,
        vec![
            customer_row(3, "Adam", Some("adam@example.com")),
            customer_row(1, "Ada", None),
        ],
    );
    let customers = session
        .select_list::<Customer>(
            Query::new()
                .filter(Filter::of("name", Operator::Like, "AD").case_insensitive())
                .filter(Filter::of("id", Operator::In, "3, 1,2"))
                .order(quarry::Order::desc("name")),
        )
        .await
        .expect("Could not select the customers");
    assert_eq!(customers.len(), 2);
    assert_eq!(customers[0].email.as_deref(), Some("adam@example.com"));
    let statement = executor.last_statement();
    assert_eq!(
        statement.sql,
        format!(
            "SELECT id, name, email, active FROM {schema}.customer \
            WHERE (LOWER(name) LIKE LOWER(:name_0) AND id IN (:id_1)) ORDER BY name DESC"
        )
    );
    assert_eq!(
        statement.params.get("name_0"),
        Some(&Value::Varchar(Some("%AD%".into())))
    );
    assert_eq!(
        statement.params.get("id_1"),
        Some(&Value::List(
            Some(vec![3_i64.into(), 1_i64.into(), 2_i64.into()]),
            Box::new(Value::Int64(None))
        ))
    );

    // Case-insensitive list is lowered before binding, wildcards are kept
    session
        .select_list::<Customer>(
            Query::or()
                .filter(Filter::of("name", Operator::In, "Ada,ADAM").case_insensitive())
                .filter(Filter::of("email", Operator::Like, "%@example.com")),
        )
        .await
        .expect("Could not select the customers");
    let statement = executor.last_statement();
    assert!(
        statement
            .sql
            .ends_with("WHERE (LOWER(name) IN (:name_0) OR email LIKE :email_1)"),
        "{}",
        statement.sql
    );
    assert_eq!(
        statement.params.get("name_0"),
        Some(&Value::List(
            Some(vec!["ada".into(), "adam".into()]),
            Box::new(Value::Varchar(None))
        ))
    );
    assert_eq!(
        statement.params.get("email_1"),
        Some(&Value::Varchar(Some("%@example.com".into())))
    );

    // Null inside a list, one sided between
    session
        .select_list::<Customer>(
            Query::new()
                .filter(Filter::with_values(
                    "email",
                    Operator::NotIn,
                    vec!["a@example.com".into(), Value::Null],
                ))
                .filter(Filter::new("id", "between", ",5").expect("Valid between")),
        )
        .await
        .expect("Could not select the customers");
    let statement = executor.last_statement();
    assert!(
        statement
            .sql
            .ends_with("WHERE ((email <> :email_0 AND email IS NOT NULL) AND id >= :id_1)"),
        "{}",
        statement.sql
    );
    assert_eq!(statement.params.get("id_1"), Some(&Value::Int64(Some(5))));

    // Null inside an inclusion list, also case insensitive
    session
        .select_list::<Customer>(
            Query::new()
                .filter(Filter::with_values(
                    "email",
                    Operator::In,
                    vec!["a@example.com".into(), Value::Null],
                ))
                .filter(
                    Filter::with_values(
                        "name",
                        Operator::In,
                        vec!["Ada".into(), Value::Null, "Bob".into()],
                    )
                    .case_insensitive(),
                ),
        )
        .await
        .expect("Could not select the customers");
    let statement = executor.last_statement();
    assert!(
        statement.sql.ends_with(
            "WHERE ((email = :email_0 OR email IS NULL) AND \
            (LOWER(name) = LOWER(:name_1) OR LOWER(name) IS NULL OR LOWER(name) = LOWER(:name_2)))"
        ),
        "{}",
        statement.sql
    );
    assert_eq!(
        statement.params.get("email_0"),
        Some(&Value::Varchar(Some("a@example.com".into())))
    );
    assert_eq!(
        statement.params.get("name_1"),
        Some(&Value::Varchar(Some("Ada".into())))
    );
    assert_eq!(
        statement.params.get("name_2"),
        Some(&Value::Varchar(Some("Bob".into())))
    );

    // Page with the total size
    executor.clear_statements();
    executor.push_rows(&["count"], vec![vec![25_i64.into()]]);
    executor.push_rows(
        CUSTOMER_LABELS,
        vec![customer_row(11, "Bob", None), customer_row(12, "Cid", None)],
    );
    let page = session
        .select_page::<Customer>(Query::new().page(2, 10).order(quarry::Order::asc("id")))
        .await
        .expect("Could not select the page");
    assert_eq!(page.index, 2);
    assert_eq!(page.size, 10);
    assert_eq!(page.total_size, 25);
    assert_eq!(page.last_index, 3);
    assert!(!page.is_last());
    assert_eq!(page.items.len(), 2);
    let statements = executor.statements();
    assert_eq!(statements.len(), 2);
    assert_eq!(
        statements[0].sql,
        format!("SELECT COUNT(*) FROM {schema}.customer")
    );
    assert!(statements[1].sql.contains("ORDER BY id ASC"));

    // Size and single column values
    executor.push_rows(&["count"], vec![vec![4_i64.into()]]);
    let size = session
        .select_size::<Customer>(Filter::unary("active", Operator::IsTrue))
        .await
        .expect("Could not count the active customers");
    assert_eq!(size, 4);
    assert!(
        executor
            .last_statement()
            .sql
            .starts_with(&format!("SELECT COUNT(*) FROM {schema}.customer WHERE active"))
    );
    executor.push_rows(
        &["email"],
        vec![vec!["ada@example.com".into()], vec!["bob@example.com".into()]],
    );
    let emails = session
        .select_values::<Customer, String>(
            Query::new()
                .select(["email"])
                .filter(Filter::unary("email", Operator::IsPresent)),
        )
        .await
        .expect("Could not select the emails");
    assert_eq!(emails, ["ada@example.com", "bob@example.com"]);
    assert!(
        executor
            .last_statement()
            .sql
            .starts_with(&format!("SELECT email FROM {schema}.customer WHERE "))
    );

    // Grouping
    executor.push_rows(&["count"], vec![vec![3_i64.into()]]);
    let groups = session
        .select_size::<Order>(Query::new().group(["status"]))
        .await
        .expect("Could not count the statuses");
    assert_eq!(groups, 3);
    assert_eq!(
        executor.last_statement().sql,
        format!("SELECT COUNT(*) FROM (SELECT status FROM {schema}.orders GROUP BY status) count__")
    );

    // Row locks and pagination do not mix
    let error = session
        .select_list::<Customer>(Query::new().page(1, 10).lock(Lock::wait()))
        .await
        .expect_err("Locking a page");
    assert!(matches!(
        QuarryError::of(&error),
        Some(QuarryError::Validation(..))
    ));
    session
        .select_list::<Customer>(Query::new().page(1, 10).lock(Lock::no_lock()))
        .await
        .expect("The no lock hint is allowed on pages");
}

pub async fn relation_queries(dialect: Arc<dyn Dialect>) {
    let schema = shop_schema(dialect.as_ref());
    let session = session(shop(dialect.clone()), dialect);
    let executor = session.executor();

    let placed = datetime!(2024-03-01 10:30:00);
    executor.push_rows(
        &[
            "id",
            "status",
            "total",
            "placed_at",
            "customer__id",
            "customer__name",
            "customer__email",
            "customer__active",
        ],
        vec![
            vec![
                42_i64.into(),
                "NEW".into(),
                Decimal::new(1999, 2).into(),
                placed.into(),
                1_i64.into(),
                "Ada".into(),
                Value::Varchar(None),
                true.into(),
            ],
            vec![
                43_i64.into(),
                "PAID".into(),
                Decimal::new(500, 2).into(),
                Value::Timestamp(None),
                Value::Int64(None),
                Value::Varchar(None),
                Value::Varchar(None),
                Value::Boolean(None),
            ],
        ],
    );
    let orders = session
        .select_list::<Order>(
            Query::new()
                .extselect(["customer"])
                .filter(Filter::of("customer.name", Operator::Equal, "Ada")),
        )
        .await
        .expect("Could not select the orders");
    let statement = executor.last_statement();
    assert_eq!(
        statement.sql,
        format!(
            "SELECT orders.id, orders.status, orders.total, orders.placed_at, \
            customer.id AS customer__id, customer.name AS customer__name, \
            customer.email AS customer__email, customer.active AS customer__active \
            FROM {schema}.orders orders \
            LEFT OUTER JOIN {schema}.customer customer ON customer.id = orders.customer_id \
            WHERE customer.name = :customer_name_0"
        )
    );
    assert_eq!(
        orders[0],
        Order {
            id: Some(42),
            customer: Some(Box::new(Customer {
                id: 1,
                name: "Ada".into(),
                email: None,
                active: true,
            })),
            status: "NEW".into(),
            total: Decimal::new(1999, 2),
            placed: Some(placed),
        }
    );
    assert_eq!(orders[1].customer, None);
    assert_eq!(orders[1].placed, None);

    // Filtering on the relation itself compares its local column
    session
        .select_list::<Order>(Filter::of("customer", Operator::Equal, "1"))
        .await
        .expect("Could not select the orders of customer 1");
    let statement = executor.last_statement();
    assert_eq!(
        statement.sql,
        format!(
            "SELECT id, status, total, placed_at FROM {schema}.orders WHERE customer_id = :customer_0"
        )
    );
    assert_eq!(statement.params.get("customer_0"), Some(&Value::Int64(Some(1))));

    // Ordering by a linked field joins without projecting it
    session
        .select_list::<Order>(Query::new().order(quarry::Order::desc("customer.name")))
        .await
        .expect("Could not select the orders by customer name");
    assert_eq!(
        executor.last_statement().sql,
        format!(
            "SELECT orders.id, orders.status, orders.total, orders.placed_at \
            FROM {schema}.orders orders \
            LEFT OUTER JOIN {schema}.customer customer ON customer.id = orders.customer_id \
            ORDER BY customer.name DESC"
        )
    );
}

pub async fn dynamic_maps(dialect: Arc<dyn Dialect>) {
    let schema = shop_schema(dialect.as_ref());
    let mut registry = DialectRegistry::empty();
    registry.register(dialect.clone());
    let config = SessionConfig {
        database: Some("shop".into()),
        ..SessionConfig::new(dialect.name())
    }
    .with_key_case(KeyCase::Camel);
    let session = Session::new(shop(dialect), &config, &registry)
        .expect("Could not create the session");
    let executor = session.executor();

    executor.push_rows(
        &["ID", "CUSTOMER_ID", "STATUS", "row_number__"],
        vec![vec![42_i64.into(), 1_i64.into(), "NEW".into(), 1_i64.into()]],
    );
    let rows = session
        .select_maps("orders", Filter::of("customer_id", Operator::Equal, "1"))
        .await
        .expect("Could not select the order maps");
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.keys().collect::<Vec<_>>(), ["id", "customerId", "status"]);
    assert_eq!(row.get_as::<i64>("customerId").expect("Integer value"), 1);
    assert_eq!(
        row.get("status"),
        Some(&Value::Varchar(Some("NEW".into())))
    );
    let statement = executor.last_statement();
    assert_eq!(
        statement.sql,
        format!(
            "SELECT id, customer_id, status, total, placed_at FROM {schema}.orders \
            WHERE customer_id = :customer_id_0"
        )
    );
    assert_eq!(
        statement.params.get("customer_id_0"),
        Some(&Value::Int64(Some(1)))
    );
}
