#[cfg(test)]
mod tests {
    use indoc::indoc;
    use quarry_core::{Filter, Lock, Operator, Order, Query, Value};
    use quarry_oracle::OracleDialect;
    use quarry_tests::{Customer, Invoice, execute_tests, init_logs, session, shop};
    use rust_decimal::Decimal;
    use std::sync::Arc;

    #[tokio::test]
    async fn oracle() {
        init_logs();
        execute_tests(OracleDialect).await;
    }

    #[tokio::test]
    async fn rownum_paging() {
        init_logs();
        let dialect = Arc::new(OracleDialect);
        let session = session(shop(dialect.clone()), dialect);
        let executor = session.executor();

        session
            .select_list::<Customer>(Query::new().page(1, 10))
            .await
            .expect("Could not select the first page");
        assert_eq!(
            executor.last_statement().sql,
            "SELECT * FROM (SELECT id, name, email, active FROM shop.customer) WHERE ROWNUM <= 10"
        );

        session
            .select_list::<Customer>(Query::new().page(3, 10).order(Order::asc("name")))
            .await
            .expect("Could not select the third page");
        assert_eq!(
            executor.last_statement().sql,
            indoc! {"
                SELECT * FROM (SELECT q__.*, ROWNUM rownum__ FROM (\
                SELECT id, name, email, active FROM shop.customer ORDER BY name ASC\
                ) q__ WHERE ROWNUM <= 30) WHERE rownum__ > 20
            "}
            .trim()
        );

        session
            .select_list::<Customer>(
                Query::new()
                    .filter(Filter::of("id", Operator::Equal, 1_i64))
                    .lock(Lock::timeout(2500)),
            )
            .await
            .expect("Could not lock the customer");
        assert_eq!(
            executor.last_statement().sql,
            "SELECT id, name, email, active FROM shop.customer WHERE id = :id_0 FOR UPDATE WAIT 3"
        );
    }

    #[tokio::test]
    async fn numeric_booleans_and_blanks() {
        init_logs();
        let dialect = Arc::new(OracleDialect);
        let session = session(shop(dialect.clone()), dialect);
        let executor = session.executor();

        session
            .select_list::<Customer>(
                Query::or()
                    .select(["id"])
                    .filter(Filter::unary("active", Operator::IsTrue))
                    .filter(Filter::unary("active", Operator::IsNotTrue))
                    .filter(Filter::unary("name", Operator::IsBlank))
                    .filter(Filter::unary("email", Operator::IsPresent)),
            )
            .await
            .expect("Could not select the customers");
        assert_eq!(
            executor.last_statement().sql,
            indoc! {"
                SELECT id FROM shop.customer WHERE (active = 1 OR (active <> 1 OR active IS NULL) \
                OR TRIM(name) IS NULL OR TRIM(email) IS NOT NULL)
            "}
            .trim()
        );

        session
            .select_list::<Customer>(
                Query::new()
                    .select(["id"])
                    .filter(Filter::of("active", Operator::Equal, "true")),
            )
            .await
            .expect("Could not select the active customers");
        let statement = executor.last_statement();
        assert_eq!(statement.sql, "SELECT id FROM shop.customer WHERE active = :active_0");
        assert_eq!(
            statement.params.get("active_0"),
            Some(&Value::Boolean(Some(true)))
        );
    }

    #[tokio::test]
    async fn merge_and_sequence() {
        init_logs();
        let dialect = Arc::new(OracleDialect);
        let session = session(shop(dialect.clone()), dialect);
        let executor = session.executor();

        let mut invoice = Invoice {
            id: None,
            amount: Decimal::new(990, 2),
        };
        executor.push_rows(&["NEXTVAL"], vec![vec![Value::Decimal(Some(Decimal::new(31, 0)))]]);
        session
            .insert(&mut invoice)
            .await
            .expect("Could not insert the invoice");
        assert_eq!(invoice.id, Some(31));
        assert_eq!(
            executor.statements()[0].sql,
            "SELECT shop.invoice_seq.NEXTVAL FROM DUAL"
        );

        session
            .upsert(&mut invoice)
            .await
            .expect("Could not merge the invoice");
        assert_eq!(
            executor.last_statement().sql,
            indoc! {"
                MERGE INTO shop.invoice t__ USING (SELECT :id AS id, :amount AS amount FROM DUAL) s__ \
                ON (t__.id = s__.id) WHEN MATCHED THEN UPDATE SET t__.amount = s__.amount \
                WHEN NOT MATCHED THEN INSERT (id, amount) VALUES (s__.id, s__.amount)
            "}
            .trim()
        );
    }
}
