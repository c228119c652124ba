#[cfg(test)]
mod tests {
    use indoc::indoc;
    use quarry_core::{
        Column, DataType, Filter, GenericDialect, Lock, Operator, Order, QuarryError, Query,
        QueryCompiler, StatementKind, Table, TableKind, Value,
    };
    use rust_decimal::Decimal;
    use std::collections::BTreeMap;

    fn column(name: &str, data_type: DataType) -> Column {
        Column {
            name: name.into(),
            field: name.into(),
            primary_key: name == "id",
            data_type,
            sql_type: String::new(),
            length: None,
            nullable: name != "id",
            generator: None,
            relation: None,
        }
    }

    fn product() -> Table {
        Table {
            domain: "shop".into(),
            name: "product".into(),
            kind: TableKind::Table,
            columns: vec![
                column("id", DataType::Integer),
                column("name", DataType::Text),
                column("price", DataType::Decimal),
                column("active", DataType::Boolean),
                column("order", DataType::Integer),
            ],
            primary_key: vec!["id".into()],
            contains_linked_table: false,
            generators: BTreeMap::new(),
            escape_reserved: false,
            record: None,
        }
    }

    fn sql(table: &Table, query: Query) -> String {
        QueryCompiler::new(&GenericDialect, table)
            .select(&query)
            .expect("Could not compile the query")
            .sql
    }

    #[test]
    fn paging_and_ordering() {
        let table = product();
        assert_eq!(
            sql(
                &table,
                Query::new()
                    .filter(Filter::of("name", Operator::Contains, "lamp"))
                    .page(3, 20)
                    .order(Order::asc("name, id desc")),
            ),
            indoc! {"
                SELECT id, name, price, active, order FROM shop.product \
                WHERE name LIKE :name_0 ORDER BY name ASC, id DESC LIMIT 20 OFFSET 40
            "}
            .trim()
        );
        let fragment = Query {
            first_result_index: Some(5),
            ..Query::new().unselect(["order", "active"])
        };
        assert_eq!(
            sql(&table, fragment),
            "SELECT id, name, price FROM shop.product OFFSET 5"
        );
        assert_eq!(
            sql(&table, Query::new().select(["price", "id"])),
            "SELECT price, id FROM shop.product"
        );
    }

    #[test]
    fn count_ignores_paging() {
        let table = product();
        let statement = QueryCompiler::new(&GenericDialect, &table)
            .count(
                &Query::new()
                    .filter(Filter::of("price", Operator::Between, "1.5,3"))
                    .page(2, 10)
                    .order(Order::desc("price")),
            )
            .expect("Could not compile the count");
        assert_eq!(
            statement.sql,
            "SELECT COUNT(*) FROM shop.product WHERE price BETWEEN :price_0 AND :price_1"
        );
        assert_eq!(
            statement.params.get("price_0"),
            Some(&Value::Decimal(Some(Decimal::new(15, 1))))
        );
        assert_eq!(
            statement.params.get("price_1"),
            Some(&Value::Decimal(Some(Decimal::new(3, 0))))
        );
    }

    #[test]
    fn locking() {
        let table = product();
        assert_eq!(
            sql(
                &table,
                Query::new()
                    .filter(Filter::of("id", Operator::Equal, 7))
                    .lock(Lock::no_wait()),
            ),
            "SELECT id, name, price, active, order FROM shop.product WHERE id = :id_0 FOR UPDATE NOWAIT"
        );
        assert_eq!(
            sql(&table, Query::new().lock(Lock::timeout(-1))),
            "SELECT id, name, price, active, order FROM shop.product FOR UPDATE"
        );
        let error = QueryCompiler::new(&GenericDialect, &table)
            .select(&Query::new().group(["name"]).lock(Lock::wait()))
            .expect_err("Grouped queries cannot lock");
        assert!(matches!(
            QuarryError::of(&error),
            Some(QuarryError::Validation(..))
        ));
    }

    #[test]
    fn zero_value_predicates() {
        let table = product();
        let query = Query::or()
            .filter(Filter::unary("name", Operator::IsBlank))
            .filter(Filter::unary("active", Operator::IsNotTrue))
            .filter(Filter::unary("id", Operator::IsEmptyNumericId))
            .filter(Filter::unary("price", Operator::IsPresent));
        assert_eq!(
            sql(&table, query.select(["id"])),
            indoc! {"
                SELECT id FROM shop.product WHERE ((name IS NULL OR TRIM(name) = '') \
                OR active IS NOT TRUE OR (id IS NULL OR id = 0) OR price IS NOT NULL)
            "}
            .trim()
        );
    }

    #[test]
    fn nested_filters_and_escape() {
        let table = product();
        let statement = QueryCompiler::new(&GenericDialect, &table)
            .select(
                &Query::new()
                    .filter(Filter::of("name", Operator::Like, "50\\%").escape('\\'))
                    .nest(quarry_core::Filters::or([
                        Filter::of("price", Operator::Less, "10"),
                        Filter::of("active", Operator::Equal, "yes"),
                    ]))
                    .select(["id"]),
            )
            .expect("Could not compile the query");
        assert_eq!(
            statement.sql,
            "SELECT id FROM shop.product WHERE (name LIKE :name_0 ESCAPE '\\' AND (price < :price_1 OR active = :active_2))"
        );
        assert_eq!(
            statement.params.get("name_0"),
            Some(&Value::Varchar(Some("50\\%".into())))
        );
        assert_eq!(
            statement.params.get("active_2"),
            Some(&Value::Boolean(Some(true)))
        );
    }

    #[test]
    fn reserved_words_are_quoted_on_request() {
        let table = Table {
            escape_reserved: true,
            ..product()
        };
        let compiler = QueryCompiler::new(&GenericDialect, &table);
        assert_eq!(
            compiler
                .write_statement(StatementKind::Insert)
                .expect("Could not write the insert"),
            r#"INSERT INTO shop.product (id, name, price, active, "order") VALUES (:id, :name, :price, :active, :order)"#
        );
        assert_eq!(
            compiler
                .write_statement(StatementKind::Update)
                .expect("Could not write the update"),
            r#"UPDATE shop.product SET name = :name, price = :price, active = :active, "order" = :order WHERE id = :id"#
        );
        let error = compiler
            .write_statement(StatementKind::Upsert)
            .expect_err("The generic dialect has no upsert");
        assert!(matches!(
            QuarryError::of(&error),
            Some(QuarryError::UnsupportedDialect { .. })
        ));
    }

    #[test]
    fn invalid_operands() {
        let table = product();
        let compiler = QueryCompiler::new(&GenericDialect, &table);
        for filter in [
            Filter::of("id", Operator::Equal, "seven"),
            Filter::with_values("id", Operator::In, Vec::new()),
            Filter::with_values("price", Operator::Between, vec![Value::Null, Value::Null]),
            Filter::of("missing", Operator::Equal, 1),
        ] {
            let error = compiler
                .select(&filter.clone().into())
                .expect_err("Invalid filter");
            assert!(
                matches!(QuarryError::of(&error), Some(QuarryError::Validation(..))),
                "{filter:?}: {error:#}"
            );
        }
    }

    #[test]
    fn page_out_of_range() {
        let table = product();
        let compiler = QueryCompiler::new(&GenericDialect, &table);
        let error = compiler
            .select(&Query::new().page(u64::MAX / 2, 10))
            .expect_err("Offset does not fit");
        assert!(matches!(
            QuarryError::of(&error),
            Some(QuarryError::Validation(..))
        ));
        assert!(
            compiler
                .count(&Query::new().page(u64::MAX / 2, 10))
                .is_ok(),
            "Counting ignores paging"
        );
    }
}
