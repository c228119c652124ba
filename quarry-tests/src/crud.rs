use crate::{Customer, Order, OrderLine, session, shop, shop_schema};
use quarry::{Dialect, Filter, Operator, QuarryError, Value};
use rust_decimal::Decimal;
use std::sync::Arc;
use time::macros::datetime;

fn ada() -> Customer {
    Customer {
        id: 1,
        name: "Ada".into(),
        email: Some("ada@example.com".into()),
        active: true,
    }
}

fn order(id: Option<i64>) -> Order {
    Order {
        id,
        customer: Some(Box::new(ada())),
        status: "NEW".into(),
        total: Decimal::new(1999, 2),
        placed: Some(datetime!(2024-03-01 10:30:00)),
    }
}

pub async fn crud(dialect: Arc<dyn Dialect>) {
    let schema = shop_schema(dialect.as_ref());
    let session = session(shop(dialect.clone()), dialect);
    let executor = session.executor();

    // Insert without generated values
    let mut customer = ada();
    executor.push_affected(1, None);
    let affected = session
        .insert(&mut customer)
        .await
        .expect("Could not insert the customer");
    assert_eq!(affected.rows_affected, 1);
    let statement = executor.last_statement();
    assert_eq!(
        statement.sql,
        format!(
            "INSERT INTO {schema}.customer (id, name, email, active) VALUES (:id, :name, :email, :active)"
        )
    );
    assert_eq!(statement.params.get("id"), Some(&Value::Int64(Some(1))));
    assert_eq!(
        statement.params.get("name"),
        Some(&Value::Varchar(Some("Ada".into())))
    );
    assert_eq!(statement.params.get("active"), Some(&Value::Boolean(Some(true))));

    // Identity is written back, relation key comes from the linked record
    let mut order = order(None);
    executor.push_affected(1, Some(42));
    session
        .insert(&mut order)
        .await
        .expect("Could not insert the order");
    assert_eq!(order.id, Some(42));
    let statement = executor.last_statement();
    assert_eq!(
        statement.sql,
        format!(
            "INSERT INTO {schema}.orders (status, total, placed_at, customer_id) VALUES (:status, :total, :placed_at, :customer_id)"
        )
    );
    assert!(!statement.params.contains_key("id"));
    assert_eq!(
        statement.params.get("customer_id"),
        Some(&Value::Int64(Some(1)))
    );
    assert_eq!(
        statement.params.get("total"),
        Some(&Value::Decimal(Some(Decimal::new(1999, 2))))
    );

    // Update
    order.status = "PAID".into();
    executor.push_affected(1, None);
    session
        .update(&order)
        .await
        .expect("Could not update the order");
    let statement = executor.last_statement();
    assert_eq!(
        statement.sql,
        format!(
            "UPDATE {schema}.orders SET status = :status, total = :total, placed_at = :placed_at, customer_id = :customer_id WHERE id = :id"
        )
    );
    assert_eq!(statement.params.get("id"), Some(&Value::Int64(Some(42))));
    assert_eq!(
        statement.params.get("status"),
        Some(&Value::Varchar(Some("PAID".into())))
    );

    // Missing rows
    executor.push_affected(0, None);
    let error = session
        .update(&order)
        .await
        .expect_err("Nothing was updated");
    match QuarryError::of(&error) {
        Some(QuarryError::NotFound { type_name, key }) => {
            assert_eq!(type_name, "Order");
            assert_eq!(key, "id=42");
        }
        other => panic!("Expected NotFound, got {other:?}"),
    }
    let error = session
        .delete(&customer)
        .await
        .expect_err("Empty response deletes nothing");
    assert!(matches!(
        QuarryError::of(&error),
        Some(QuarryError::NotFound { .. })
    ));
    assert_eq!(
        executor.last_statement().sql,
        format!("DELETE FROM {schema}.customer WHERE id = :id")
    );

    // Batches
    executor.clear_statements();
    let mut lines = [1, 2].map(|line_no| OrderLine {
        order_id: 42,
        line_no,
        product: format!("P-{line_no}"),
        quantity: line_no * 3,
        note: "not stored".into(),
    });
    executor.push_affected(1, None);
    executor.push_affected(1, None);
    let affected = session
        .insert_batch(&mut lines)
        .await
        .expect("Could not insert the lines");
    assert_eq!(affected.rows_affected, 2);
    let statements = executor.statements();
    assert_eq!(statements.len(), 2);
    assert_eq!(statements[0].sql, statements[1].sql);
    assert_eq!(
        statements[1].params.get("line_no"),
        Some(&Value::Int32(Some(2)))
    );
    assert!(!statements[0].params.contains_key("note"));

    executor.push_affected(1, None);
    executor.push_affected(0, None);
    let error = session
        .update_batch(&lines)
        .await
        .expect_err("The second line is missing");
    match QuarryError::of(&error) {
        Some(QuarryError::NotFound { type_name, key }) => {
            assert_eq!(type_name, "OrderLine");
            assert_eq!(key, "order_id=42, line_no=2");
        }
        other => panic!("Expected NotFound, got {other:?}"),
    }

    executor.push_affected(1, None);
    executor.push_affected(1, None);
    let affected = session
        .delete_batch(&lines)
        .await
        .expect("Could not delete the lines");
    assert_eq!(affected.rows_affected, 2);
    assert_eq!(
        executor.last_statement().sql,
        format!("DELETE FROM {schema}.orderline WHERE order_id = :order_id AND line_no = :line_no")
    );
}

pub async fn upserts(dialect: Arc<dyn Dialect>) {
    let schema = shop_schema(dialect.as_ref());
    let session = session(shop(dialect.clone()), dialect);
    let executor = session.executor();

    // Missing generated key takes the insert path
    let mut fresh = order(None);
    executor.push_affected(1, Some(7));
    session
        .upsert(&mut fresh)
        .await
        .expect("Could not upsert the new order");
    assert_eq!(fresh.id, Some(7));
    assert!(
        executor
            .last_statement()
            .sql
            .starts_with(&format!("INSERT INTO {schema}.orders (status,"))
    );

    // Known key merges
    let mut known = order(Some(7));
    executor.push_affected(1, None);
    session
        .upsert(&mut known)
        .await
        .expect("Could not upsert the known order");
    let statement = executor.last_statement();
    assert!(statement.sql.contains(&format!("{schema}.orders")));
    assert!(!statement.sql.starts_with(&format!("INSERT INTO {schema}.orders (status,")));
    assert_eq!(statement.params.get("id"), Some(&Value::Int64(Some(7))));
    assert_eq!(
        statement.params.get("customer_id"),
        Some(&Value::Int64(Some(1)))
    );

    // Mixed batch
    executor.clear_statements();
    let mut batch = [order(None), order(Some(7)), order(Some(8))];
    executor.push_affected(1, Some(9));
    executor.push_affected(1, None);
    executor.push_affected(1, None);
    let affected = session
        .upsert_batch(&mut batch)
        .await
        .expect("Could not upsert the batch");
    assert_eq!(affected.rows_affected, 3);
    assert_eq!(batch[0].id, Some(9));
    let statements = executor.statements();
    assert_eq!(statements.len(), 3);
    assert!(statements[0].sql.starts_with("INSERT INTO"));
    assert_eq!(statements[1].sql, statements[2].sql);
    assert_eq!(statements[2].params.get("id"), Some(&Value::Int64(Some(8))));
}

pub async fn delete_list(dialect: Arc<dyn Dialect>) {
    let schema = shop_schema(dialect.as_ref());
    let session = session(shop(dialect.clone()), dialect);
    let executor = session.executor();

    executor.push_affected(3, None);
    let deleted = session
        .delete_list::<Order>(Filter::of("status", Operator::Equal, "CANCELLED"))
        .await
        .expect("Could not delete the cancelled orders");
    assert_eq!(deleted, 3);
    let statement = executor.last_statement();
    assert_eq!(
        statement.sql,
        format!("DELETE FROM {schema}.orders WHERE status = :status_0")
    );
    assert_eq!(
        statement.params.get("status_0"),
        Some(&Value::Varchar(Some("CANCELLED".into())))
    );

    // Through a relation
    executor.push_affected(2, None);
    let deleted = session
        .delete_list::<Order>(Filter::of("customer.name", Operator::Equal, "Ada"))
        .await
        .expect("Could not delete the orders of Ada");
    assert_eq!(deleted, 2);
    assert_eq!(
        executor.last_statement().sql,
        format!(
            "DELETE FROM {schema}.orders WHERE id IN (SELECT id FROM (\
            SELECT orders.id FROM {schema}.orders orders \
            LEFT OUTER JOIN {schema}.customer customer ON customer.id = orders.customer_id \
            WHERE customer.name = :customer_name_0) d__)"
        )
    );

    // Composite key, no row matched is not an error
    let deleted = session
        .delete_list::<OrderLine>(Filter::of("product", Operator::StartsWith, "P-"))
        .await
        .expect("Could not delete the lines");
    assert_eq!(deleted, 0);
    assert_eq!(
        executor.last_statement().params.get("product_0"),
        Some(&Value::Varchar(Some("P-%".into())))
    );
}

#[cfg(not(feature = "disable-sequences"))]
pub async fn sequences(dialect: Arc<dyn Dialect>) {
    use crate::Invoice;

    let schema = shop_schema(dialect.as_ref());
    let session = session(shop(dialect.clone()), dialect);
    let executor = session.executor();

    let table = session
        .table::<Invoice>()
        .await
        .expect("Could not resolve Invoice");
    assert_eq!(
        table.generators.get("id"),
        Some(&quarry::ValueGenerator::Sequence {
            schema: schema.into(),
            name: "invoice_seq".into(),
        })
    );

    executor.clear_statements();
    let mut invoice = Invoice {
        id: None,
        amount: Decimal::new(5000, 2),
    };
    executor.push_rows(&["nextval"], vec![vec![Value::Int64(Some(100))]]);
    executor.push_affected(1, None);
    session
        .insert(&mut invoice)
        .await
        .expect("Could not insert the invoice");
    assert_eq!(invoice.id, Some(100));
    let statements = executor.statements();
    assert_eq!(statements.len(), 2);
    assert!(statements[0].sql.contains("invoice_seq"));
    assert_eq!(
        statements[1].sql,
        format!("INSERT INTO {schema}.invoice (id, amount) VALUES (:id, :amount)")
    );
    assert_eq!(statements[1].params.get("id"), Some(&Value::Int64(Some(100))));

    // A key already set skips the sequence
    executor.clear_statements();
    executor.push_affected(1, None);
    session
        .insert(&mut invoice)
        .await
        .expect("Could not insert the invoice again");
    assert_eq!(executor.statements().len(), 1);

    // A sequence returning nothing
    invoice.id = None;
    let error = session
        .insert(&mut invoice)
        .await
        .expect_err("Sequence without value");
    assert!(matches!(
        QuarryError::of(&error),
        Some(QuarryError::MetadataResolution(..))
    ));
}
