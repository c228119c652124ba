#[cfg(test)]
mod tests {
    use indoc::indoc;
    use quarry_core::{Filter, Lock, Operator, QuarryError, Query};
    use quarry_sqlite::SqliteDialect;
    use quarry_tests::{
        Customer, Invoice, execute_tests, init_logs, session, shop, silent_logs,
    };
    use std::sync::Arc;

    #[tokio::test]
    async fn sqlite() {
        init_logs();
        execute_tests(SqliteDialect).await;
    }

    #[tokio::test]
    async fn paging_without_locks() {
        init_logs();
        let dialect = Arc::new(SqliteDialect);
        let session = session(shop(dialect.clone()), dialect);
        let executor = session.executor();

        session
            .select_list::<Customer>(Query {
                first_result_index: Some(5),
                ..Query::new().select(["id"])
            })
            .await
            .expect("Could not skip the first rows");
        assert_eq!(
            executor.last_statement().sql,
            "SELECT id FROM main.customer LIMIT -1 OFFSET 5"
        );

        silent_logs! {
            session
                .select_list::<Customer>(
                    Query::new()
                        .select(["id"])
                        .filter(Filter::of("id", Operator::Equal, 1_i64))
                        .lock(Lock::wait()),
                )
                .await
                .expect("Lock requests are ignored");
        }
        assert_eq!(
            executor.last_statement().sql,
            "SELECT id FROM main.customer WHERE id = :id_0"
        );
    }

    #[tokio::test]
    async fn upsert() {
        init_logs();
        let dialect = Arc::new(SqliteDialect);
        let session = session(shop(dialect.clone()), dialect);
        let executor = session.executor();

        let mut customer = Customer {
            id: 5,
            name: "Grace".into(),
            email: Some("grace@example.com".into()),
            active: false,
        };
        session
            .upsert(&mut customer)
            .await
            .expect("Could not upsert the customer");
        assert_eq!(
            executor.last_statement().sql,
            indoc! {"
                INSERT INTO main.customer (id, name, email, active) VALUES (:id, :name, :email, :active) \
                ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name, email = EXCLUDED.email, active = EXCLUDED.active
            "}
            .trim()
        );
    }

    #[tokio::test]
    async fn unsupported_features() {
        init_logs();
        let dialect = Arc::new(SqliteDialect);
        let session = session(shop(dialect.clone()), dialect);

        let error = session
            .table::<Invoice>()
            .await
            .expect_err("No sequences in sqlite");
        assert!(matches!(
            QuarryError::of(&error),
            Some(QuarryError::UnsupportedDialect { .. })
        ));

        let error = session
            .select_list::<Customer>(Filter::with_values(
                "id",
                Operator::Box,
                vec![0.0.into(), 0.0.into(), 1.0.into(), 1.0.into()],
            ))
            .await
            .expect_err("No geometry in sqlite");
        assert!(matches!(
            QuarryError::of(&error),
            Some(QuarryError::UnsupportedDialect { .. })
        ));
    }
}
