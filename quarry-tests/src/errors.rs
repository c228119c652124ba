use crate::{Customer, CustomerSummary, Order, OrderLine, session, shop, silent_logs};
use quarry::{
    Condition, Dialect, DialectRegistry, Filter, Operator, QuarryError, Query, Session,
    SessionConfig, Value,
};
use std::sync::Arc;

fn is_validation(error: &quarry::Error) -> bool {
    matches!(QuarryError::of(error), Some(QuarryError::Validation(..)))
}

pub async fn errors(dialect: Arc<dyn Dialect>) {
    let session = session(shop(dialect.clone()), dialect.clone());
    let executor = session.executor();

    // Malformed conditions
    let error = Filter::new("status", "approximately", "NEW").expect_err("Unknown operator");
    assert!(is_validation(&error));
    assert!(error.to_string().contains("approximately"));

    let error = session
        .select_list::<Customer>(Filter::of("nickname", Operator::Equal, "Ada"))
        .await
        .expect_err("Unknown field");
    assert!(is_validation(&error));
    assert!(error.to_string().contains("nickname"));

    let error = session
        .select_list::<Customer>(Filter::of("id", Operator::Equal, "one"))
        .await
        .expect_err("Text that is not an integer");
    assert!(is_validation(&error));

    let error = session
        .select_list::<Customer>(Filter::of("name", Operator::Greater, Value::Null))
        .await
        .expect_err("Ordering against null");
    assert!(is_validation(&error));

    let error = session
        .select_list::<Order>(Query::new().order(quarry::Order::asc("customer")))
        .await
        .expect_err("Ordering by a relation");
    assert!(is_validation(&error));

    let error = session
        .select_list::<Order>(Filter::of("customer.nickname", Operator::Equal, "Ada"))
        .await
        .expect_err("Unknown linked field");
    assert!(error.to_string().contains("customer.nickname"));

    let error = session
        .select_list::<Customer>(Query::new().select(["email"]).group(["name"]))
        .await
        .expect_err("Selecting outside of the group");
    assert!(is_validation(&error));

    // Primary keys
    let error = session
        .select::<OrderLine>(42_i64)
        .await
        .expect_err("Composite key with one value");
    assert!(is_validation(&error));
    assert!(error.to_string().contains("2 primary key columns"));
    executor.push_rows(&["order_id", "line_no"], vec![vec![42_i64.into(), 1_i32.into()]]);
    let line = session
        .select::<OrderLine>(Condition::composite_key(vec![42_i64.into(), 1_i32.into()]))
        .await
        .expect("Could not select by the composite key")
        .expect("Line 42/1 exists");
    assert_eq!((line.order_id, line.line_no), (42, 1));
    let error = session
        .select::<CustomerSummary>(1_i64)
        .await
        .expect_err("Views have no primary key");
    assert!(is_validation(&error));

    // Geometry nobody implements
    let error = session
        .select_list::<Customer>(Filter::with_values(
            "id",
            Operator::Circle,
            vec![0.0.into(), 0.0.into(), 1.0.into()],
        ))
        .await
        .expect_err("Circle search");
    assert!(matches!(
        QuarryError::of(&error),
        Some(QuarryError::UnsupportedDialect { .. })
    ));

    // Driver errors surface unchanged
    executor.push_error("connection reset by peer");
    let error = session
        .select_list::<Customer>(Condition::all())
        .await
        .expect_err("Driver failure");
    assert!(QuarryError::of(&error).is_none());
    assert_eq!(error.to_string(), "connection reset by peer");

    // Not found message
    silent_logs! {
        executor.push_affected(0, None);
        let error = session
            .delete(&Customer::default())
            .await
            .expect_err("Nothing deleted");
        assert_eq!(
            error.to_string(),
            "No Customer found with primary key (id=0)"
        );
    }

    // Session setup
    let config = SessionConfig::new("db2");
    let error = Session::new(shop(dialect.clone()), &config, &DialectRegistry::empty())
        .err()
        .expect("db2 is not registered");
    assert!(matches!(
        QuarryError::of(&error),
        Some(QuarryError::UnsupportedDialect { .. })
    ));
    if dialect.default_schema().is_empty() {
        let mut registry = DialectRegistry::empty();
        registry.register(dialect.clone());
        let error = Session::new(
            shop(dialect.clone()),
            &SessionConfig::new(dialect.name()),
            &registry,
        )
        .err()
        .expect("No schema can be derived");
        assert!(is_validation(&error));
    }
}
