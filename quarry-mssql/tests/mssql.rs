#[cfg(test)]
mod tests {
    use indoc::indoc;
    use quarry_core::{Filter, Lock, Operator, Order, Query, Value};
    use quarry_mssql::MsSqlDialect;
    use quarry_tests::{
        Customer, Invoice, execute_tests, init_logs, session, shop, silent_logs,
    };
    use rust_decimal::Decimal;
    use std::sync::Arc;

    #[tokio::test]
    async fn mssql() {
        init_logs();
        execute_tests(MsSqlDialect).await;
    }

    #[tokio::test]
    async fn row_number_paging() {
        init_logs();
        let dialect = Arc::new(MsSqlDialect);
        let session = session(shop(dialect.clone()), dialect);
        let executor = session.executor();

        session
            .select_list::<Customer>(Query::new().page(3, 10).order(Order::asc("name")))
            .await
            .expect("Could not select the third page");
        assert_eq!(
            executor.last_statement().sql,
            indoc! {"
                SELECT * FROM (SELECT id, name, email, active, \
                ROW_NUMBER() OVER (ORDER BY name ASC) AS row_number__ FROM dbo.customer) w__ \
                WHERE row_number__ > 20 AND row_number__ <= 30 ORDER BY row_number__
            "}
            .trim()
        );

        session
            .select_list::<Customer>(
                Query::new()
                    .select(["id"])
                    .page(1, 10)
                    .lock(Lock::no_lock()),
            )
            .await
            .expect("Could not select the first page without locks");
        assert_eq!(
            executor.last_statement().sql,
            indoc! {"
                SELECT * FROM (SELECT id, ROW_NUMBER() OVER (ORDER BY (SELECT NULL)) AS row_number__ \
                FROM dbo.customer WITH (NOLOCK)) w__ \
                WHERE row_number__ > 0 AND row_number__ <= 10 ORDER BY row_number__
            "}
            .trim()
        );
    }

    #[tokio::test]
    async fn table_hints() {
        init_logs();
        let dialect = Arc::new(MsSqlDialect);
        let session = session(shop(dialect.clone()), dialect);
        let executor = session.executor();

        session
            .select_list::<Customer>(
                Query::new()
                    .filter(Filter::of("id", Operator::Equal, 1_i64))
                    .lock(Lock::no_wait()),
            )
            .await
            .expect("Could not lock the customer");
        assert_eq!(
            executor.last_statement().sql,
            "SELECT id, name, email, active FROM dbo.customer WITH (UPDLOCK, ROWLOCK, NOWAIT) WHERE id = :id_0"
        );

        silent_logs! {
            session
                .select_list::<Customer>(Query::new().select(["id"]).lock(Lock::timeout(500)))
                .await
                .expect("Could not lock the customers");
        }
        assert_eq!(
            executor.last_statement().sql,
            "SELECT id FROM dbo.customer WITH (UPDLOCK, ROWLOCK)"
        );

        session
            .select_list::<quarry_tests::Order>(
                Query::new()
                    .order(Order::desc("customer.name"))
                    .lock(Lock::no_lock()),
            )
            .await
            .expect("Could not select the orders");
        assert_eq!(
            executor.last_statement().sql,
            indoc! {"
                SELECT orders.id, orders.status, orders.total, orders.placed_at \
                FROM dbo.orders orders WITH (NOLOCK) \
                LEFT OUTER JOIN dbo.customer customer WITH (NOLOCK) ON customer.id = orders.customer_id \
                ORDER BY customer.name DESC
            "}
            .trim()
        );
    }

    #[tokio::test]
    async fn bit_booleans_and_blanks() {
        init_logs();
        let dialect = Arc::new(MsSqlDialect);
        let session = session(shop(dialect.clone()), dialect);
        let executor = session.executor();

        session
            .select_list::<Customer>(
                Query::new()
                    .select(["id"])
                    .filter(Filter::unary("active", Operator::IsFalse))
                    .filter(Filter::unary("name", Operator::IsBlank)),
            )
            .await
            .expect("Could not select the customers");
        assert_eq!(
            executor.last_statement().sql,
            "SELECT id FROM dbo.customer WHERE (active = 0 AND (name IS NULL OR LTRIM(RTRIM(name)) = ''))"
        );
    }

    #[tokio::test]
    async fn merge_and_sequence() {
        init_logs();
        let dialect = Arc::new(MsSqlDialect);
        let session = session(shop(dialect.clone()), dialect);
        let executor = session.executor();

        let mut invoice = Invoice {
            id: None,
            amount: Decimal::new(1500, 2),
        };
        executor.push_rows(&[""], vec![vec![Value::Int64(Some(12))]]);
        session
            .insert(&mut invoice)
            .await
            .expect("Could not insert the invoice");
        assert_eq!(invoice.id, Some(12));
        assert_eq!(
            executor.statements()[0].sql,
            "SELECT NEXT VALUE FOR dbo.invoice_seq"
        );

        session
            .upsert(&mut invoice)
            .await
            .expect("Could not merge the invoice");
        assert_eq!(
            executor.last_statement().sql,
            indoc! {"
                MERGE INTO dbo.invoice t__ USING (SELECT :id AS id, :amount AS amount) s__ \
                ON (t__.id = s__.id) WHEN MATCHED THEN UPDATE SET t__.amount = s__.amount \
                WHEN NOT MATCHED THEN INSERT (id, amount) VALUES (s__.id, s__.amount);
            "}
            .trim()
        );
    }
}
