#[cfg(test)]
mod tests {
    use indoc::indoc;
    use quarry_core::{Filter, Lock, Operator, Order, Query, QuarryError, Value};
    use quarry_postgres::PostgresDialect;
    use quarry_tests::{Customer, Invoice, MockTable, execute_tests, init_logs, session, shop};
    use rust_decimal::Decimal;
    use std::sync::Arc;

    #[tokio::test]
    async fn postgres() {
        init_logs();
        execute_tests(PostgresDialect).await;
    }

    #[tokio::test]
    async fn paging_and_locks() {
        init_logs();
        let dialect = Arc::new(PostgresDialect);
        let session = session(shop(dialect.clone()), dialect);
        let executor = session.executor();

        session
            .select_list::<Customer>(Query::new().page(3, 10).order(Order::asc("name")))
            .await
            .expect("Could not select the third page");
        assert_eq!(
            executor.last_statement().sql,
            "SELECT id, name, email, active FROM public.customer ORDER BY name ASC LIMIT 10 OFFSET 20"
        );

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
            "SELECT id, name, email, active FROM public.customer WHERE id = :id_0 FOR UPDATE NOWAIT"
        );

        session
            .select_list::<Customer>(Filter::unary("active", Operator::IsNotFalse))
            .await
            .expect("Could not select the customers");
        assert_eq!(
            executor.last_statement().sql,
            "SELECT id, name, email, active FROM public.customer WHERE active IS NOT FALSE"
        );
    }

    #[tokio::test]
    async fn upsert_and_sequence() {
        init_logs();
        let dialect = Arc::new(PostgresDialect);
        let session = session(shop(dialect.clone()), dialect);
        let executor = session.executor();

        let mut invoice = Invoice {
            id: None,
            amount: Decimal::new(1250, 2),
        };
        executor.push_rows(&["nextval"], vec![vec![Value::Int64(Some(7))]]);
        session
            .insert(&mut invoice)
            .await
            .expect("Could not insert the invoice");
        let statements = executor.statements();
        assert_eq!(statements[0].sql, "SELECT nextval('public.invoice_seq')");
        assert_eq!(invoice.id, Some(7));

        session
            .upsert(&mut invoice)
            .await
            .expect("Could not upsert the invoice");
        assert_eq!(
            executor.last_statement().sql,
            indoc! {"
                INSERT INTO public.invoice (id, amount) VALUES (:id, :amount) \
                ON CONFLICT (id) DO UPDATE SET amount = EXCLUDED.amount
            "}
            .trim()
        );
    }

    #[tokio::test]
    async fn geometry() {
        init_logs();
        let dialect = Arc::new(PostgresDialect);
        let executor = shop(dialect.clone()).with_table(
            MockTable::new("public", "store")
                .column("id", "bigint", false)
                .column("location", "point", true)
                .primary_key(&["id"]),
        );
        let session = session(executor, dialect);
        let executor = session.executor();

        session
            .select_maps(
                "store",
                Filter::with_values(
                    "location",
                    Operator::Box,
                    vec![0.0.into(), 0.0.into(), 10.0.into(), 5.5.into()],
                ),
            )
            .await
            .expect("Could not search inside the box");
        let statement = executor.last_statement();
        assert_eq!(
            statement.sql,
            "SELECT id, location FROM public.store \
            WHERE location <@ box(point(:box_0, :box_1), point(:box_2, :box_3))"
        );
        assert_eq!(statement.params.get("box_3"), Some(&Value::Float64(Some(5.5))));

        session
            .select_maps(
                "store",
                Filter::with_values(
                    "location",
                    Operator::Polygon,
                    vec![
                        0.0.into(),
                        0.0.into(),
                        4.0.into(),
                        0.0.into(),
                        4.0.into(),
                        3.0.into(),
                    ],
                ),
            )
            .await
            .expect("Could not search inside the polygon");
        let statement = executor.last_statement();
        assert_eq!(
            statement.sql,
            "SELECT id, location FROM public.store WHERE location <@ CAST(:polygon_0 AS polygon)"
        );
        assert_eq!(
            statement.params.get("polygon_0"),
            Some(&Value::Varchar(Some("((0,0),(4,0),(4,3))".into())))
        );

        let error = session
            .select_maps(
                "store",
                Filter::with_values("location", Operator::Box, vec![0.0.into(), 1.0.into()]),
            )
            .await
            .expect_err("A box needs two corners");
        assert!(matches!(
            QuarryError::of(&error),
            Some(QuarryError::Validation(..))
        ));
    }
}
