#[cfg(test)]
mod tests {
    use indoc::indoc;
    use quarry_core::{Filter, Operator, QuarryError, Query, Value};
    use quarry_mysql::MySqlDialect;
    use quarry_tests::{Customer, MockTable, execute_tests, init_logs, session, shop};
    use std::sync::Arc;

    #[tokio::test]
    async fn mysql() {
        init_logs();
        execute_tests(MySqlDialect).await;
    }

    #[tokio::test]
    async fn schema_from_database() {
        init_logs();
        let dialect = Arc::new(MySqlDialect);
        let session = session(shop(dialect.clone()), dialect);
        assert_eq!(session.schemas(), ["shop"]);
        let table = session
            .table::<Customer>()
            .await
            .expect("Could not resolve Customer");
        assert_eq!(table.full_name(), "shop.customer");
    }

    #[tokio::test]
    async fn fragments_and_escapes() {
        init_logs();
        let dialect = Arc::new(MySqlDialect);
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
            "SELECT id FROM shop.customer LIMIT 18446744073709551615 OFFSET 5"
        );

        session
            .select_list::<Customer>(
                Query::new()
                    .select(["id"])
                    .filter(Filter::of("name", Operator::Like, "50\\%").escape('\\')),
            )
            .await
            .expect("Could not select with an escape character");
        assert_eq!(
            executor.last_statement().sql,
            "SELECT id FROM shop.customer WHERE name LIKE :name_0 ESCAPE '\\\\'"
        );
    }

    #[tokio::test]
    async fn upsert() {
        init_logs();
        let dialect = Arc::new(MySqlDialect);
        let session = session(shop(dialect.clone()), dialect);
        let executor = session.executor();

        let mut customer = Customer {
            id: 5,
            name: "Grace".into(),
            email: None,
            active: true,
        };
        executor.push_affected(2, None);
        session
            .upsert(&mut customer)
            .await
            .expect("Could not upsert the customer");
        let statement = executor.last_statement();
        assert_eq!(
            statement.sql,
            indoc! {"
                INSERT INTO shop.customer (id, name, email, active) VALUES (:id, :name, :email, :active) \
                ON DUPLICATE KEY UPDATE name = VALUES(name), email = VALUES(email), active = VALUES(active)
            "}
            .trim()
        );
        assert_eq!(statement.params.get("email"), Some(&Value::Varchar(None)));
    }

    #[tokio::test]
    async fn geometry() {
        init_logs();
        let dialect = Arc::new(MySqlDialect);
        let executor = shop(dialect.clone()).with_table(
            MockTable::new("shop", "store")
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
            "SELECT id, location FROM shop.store WHERE MBRContains(ST_GeomFromText(:box_0), location)"
        );
        assert_eq!(
            statement.params.get("box_0"),
            Some(&Value::Varchar(Some(
                "POLYGON((0 0, 10 0, 10 5.5, 0 5.5, 0 0))".into()
            )))
        );

        let error = session
            .select_maps(
                "store",
                Filter::with_values(
                    "location",
                    Operator::Polygon,
                    vec![0.0.into(), 0.0.into(), 4.0.into(), 0.0.into(), 4.0.into(), 3.0.into()],
                ),
            )
            .await
            .expect_err("Polygons are not supported");
        assert!(matches!(
            QuarryError::of(&error),
            Some(QuarryError::UnsupportedDialect { .. })
        ));
    }
}
