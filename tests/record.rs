#[cfg(test)]
mod tests {
    use quarry::{Condition, Fields, QuarryError, Record, Value};
    use rust_decimal::Decimal;
    use time::{Date, macros::date};
    use uuid::Uuid;

    #[derive(Default, Debug, PartialEq, Record)]
    struct Warehouse {
        #[quarry(primary_key)]
        code: String,
        city: Option<String>,
    }

    #[derive(Default, Debug, PartialEq, Record)]
    #[quarry(name = "stock_item", schema = "inventory", escape_reserved)]
    struct StockItem {
        #[quarry(primary_key, generated)]
        id: Option<i64>,
        #[quarry(name = "sku_code", length = 24)]
        sku: String,
        #[quarry(nullable = false)]
        price: Decimal,
        r#type: String,
        restocked: Option<Date>,
        token: Uuid,
        #[quarry(relation = "warehouse_code")]
        warehouse: Warehouse,
        #[quarry(relation = ("origin_code"))]
        origin: Option<Warehouse>,
        #[quarry(ignore)]
        cache: Vec<u8>,
    }

    #[test]
    fn record_def() {
        let def = StockItem::record_def();
        assert_eq!(def.type_name, "StockItem");
        assert_eq!(def.schema, Some("inventory"));
        assert_eq!(def.table, Some("stock_item"));
        assert!(def.escape_reserved);
        assert_eq!(
            def.fields.iter().map(|f| f.name).collect::<Vec<_>>(),
            [
                "id", "sku", "price", "type", "restocked", "token", "warehouse", "origin", "cache"
            ]
        );

        let id = def.field("id").expect("Field id");
        assert!(id.primary_key && id.generated);
        assert_eq!(id.sequence, None);
        assert_eq!(id.value, Value::Int64(None));

        let sku = def.field("sku").expect("Field sku");
        assert_eq!(sku.column, Some("sku_code"));
        assert_eq!(sku.length, Some(24));
        assert_eq!(def.field("price").and_then(|f| f.nullable), Some(false));
        assert_eq!(
            def.field("restocked").map(|f| &f.value),
            Some(&Value::Date(None))
        );

        let warehouse = def
            .field("warehouse")
            .and_then(|f| f.relation.as_ref())
            .expect("Relation warehouse");
        assert_eq!(warehouse.local_columns, ["warehouse_code"]);
        assert_eq!((warehouse.linked)().type_name, "Warehouse");
        let origin = def
            .field("origin")
            .and_then(|f| f.relation.as_ref())
            .expect("Relation origin");
        assert_eq!(origin.local_columns, ["origin_code"]);
        assert!(def.field("cache").is_some_and(|f| f.ignore));

        let def = Warehouse::record_def();
        assert_eq!((def.schema, def.table), (None, None));
        assert!(!def.escape_reserved);
    }

    #[test]
    fn field_access() {
        let mut item = StockItem::default();
        item.set_field("id", Value::Int32(Some(5)))
            .expect("Integers widen");
        item.set_field("sku", "A-1".into()).expect("Text");
        item.set_field("price", "12.50".into())
            .expect("Decimal parsed from text");
        item.set_field("type", "bolt".into()).expect("Raw identifier");
        item.set_field("restocked", Value::Null)
            .expect("Null clears the option");
        assert_eq!(item.id, Some(5));
        assert_eq!(item.price, Decimal::new(1250, 2));
        assert_eq!(item.r#type, "bolt");
        assert_eq!(item.restocked, None);
        assert_eq!(
            item.get_field("sku"),
            Some(Value::Varchar(Some("A-1".into())))
        );
        assert_eq!(item.get_field("cache"), None);
        assert_eq!(item.get_field("warehouse"), None);

        let error = item
            .set_field("warehouse", "W1".into())
            .expect_err("Relations are not scalar fields");
        assert!(matches!(
            QuarryError::of(&error),
            Some(QuarryError::Validation(..))
        ));
        assert!(
            item.set_field("price", "cheap".into()).is_err(),
            "Not a decimal"
        );

        item.set_field("restocked", date!(2024 - 05 - 01).into())
            .expect("Date");
        assert_eq!(item.restocked, Some(date!(2024 - 05 - 01)));
    }

    #[test]
    fn linked_records() {
        let mut item = StockItem::default();
        assert!(item.linked("warehouse").is_some());
        assert!(item.linked("origin").is_none());
        assert!(item.linked("sku").is_none());

        item.linked_mut("origin")
            .expect("Relation origin")
            .set_field("code", "W2".into())
            .expect("Linked field");
        assert_eq!(
            item.origin,
            Some(Warehouse {
                code: "W2".into(),
                city: None,
            })
        );
        item.linked_mut("warehouse")
            .expect("Relation warehouse")
            .set_field("city", "Turin".into())
            .expect("Linked field");
        assert_eq!(item.warehouse.city.as_deref(), Some("Turin"));
        assert_eq!(
            item.linked("origin").and_then(|v| v.get_field("code")),
            Some(Value::Varchar(Some("W2".into())))
        );
    }

    #[test]
    fn condition_from_record() {
        let item = StockItem {
            sku: "A-1".into(),
            ..Default::default()
        };
        let Condition::Map(entries) = Condition::from_record(&item) else {
            panic!("Expected a map condition");
        };
        let names = entries.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>();
        assert_eq!(names, ["sku", "price", "type", "token"]);
        assert_eq!(entries[0].1, Value::Varchar(Some("A-1".into())));
    }
}
