use crate::{AsValue, Fields, QuarryError, Record, RecordDef, Result, RowLabeled, Table, Value};
use convert_case::{Case, Casing};
use std::{collections::HashMap, sync::Arc};

/// Delimiter between a relation and the linked column in result labels.
pub const RELATION_DELIMITER: &str = "__";

/// Label to field resolution of one record type, built once per type.
///
/// A label resolves by declared column name, then by its snake case
/// conversion (`firstName` to `first_name`), then by field name ignoring
/// case.
#[derive(Debug, Default)]
pub struct FieldMap {
    scalars: HashMap<String, &'static str>,
    relations: HashMap<String, (&'static str, Arc<FieldMap>)>,
}

impl FieldMap {
    pub fn new(def: &RecordDef, table: &Table) -> Self {
        let mut map = FieldMap::default();
        for field in def.fields.iter().filter(|f| !f.ignore) {
            let column = table.columns.iter().find(|c| c.field == field.name);
            if let Some(relation) = column.and_then(|c| c.relation.as_ref()) {
                let linked = (relation.linked.record.map(|d| FieldMap::new(d, &relation.linked)))
                    .unwrap_or_default();
                let entry = (field.name, Arc::new(linked));
                for key in [column.map(|c| c.name.as_str()), Some(field.name)]
                    .into_iter()
                    .flatten()
                {
                    map.relations.entry(key.to_lowercase()).or_insert(entry.clone());
                }
                continue;
            }
            if let Some(column) = column {
                map.scalars.entry(column.name.to_lowercase()).or_insert(field.name);
            }
        }
        for field in def.fields.iter().filter(|f| !f.ignore && f.relation.is_none()) {
            map.scalars.entry(field.name.to_lowercase()).or_insert(field.name);
        }
        map
    }

    /// Field receiving the column labeled `label`.
    pub fn scalar(&self, label: &str) -> Option<&'static str> {
        self.scalars
            .get(&label.to_lowercase())
            .or_else(|| self.scalars.get(&label.to_case(Case::Snake)))
            .copied()
    }

    /// Relation field owning the labels prefixed by `label__`.
    pub fn relation(&self, label: &str) -> Option<(&'static str, &FieldMap)> {
        self.relations
            .get(&label.to_lowercase())
            .or_else(|| self.relations.get(&label.to_case(Case::Snake)))
            .map(|(field, map)| (*field, map.as_ref()))
    }
}

/// Fills a new record from a row, skipping the columns no field takes.
pub fn materialize<R: Record>(map: &FieldMap, row: RowLabeled) -> Result<R> {
    let mut record = R::default();
    let RowLabeled { labels, values } = row;
    for (label, value) in labels.iter().zip(values.into_vec()) {
        if let Some((owner, linked)) = label.split_once(RELATION_DELIMITER) {
            if linked.is_empty() || value.is_null() {
                continue;
            }
            let Some((field, linked_map)) = map.relation(owner) else {
                continue;
            };
            let Some(linked_field) = linked_map.scalar(linked) else {
                continue;
            };
            let Some(target) = record.linked_mut(field) else {
                continue;
            };
            target
                .set_field(linked_field, value)
                .map_err(|e| e.context(format!("While reading column {label} into {field}.{linked_field}")))?;
        } else if let Some(field) = map.scalar(label) {
            record
                .set_field(field, value)
                .map_err(|e| e.context(format!("While reading column {label} into field {field}")))?;
        }
    }
    Ok(record)
}

/// First column of the row.
pub fn materialize_value<T: AsValue>(row: RowLabeled) -> Result<T> {
    let value = row.values.into_vec().into_iter().next().ok_or_else(|| {
        QuarryError::validation("The statement returned a row without columns")
    })?;
    T::try_from_value(value)
}

/// Casing applied to the keys of a [`DynamicRecord`].
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCase {
    #[default]
    AsIs,
    Upper,
    Lower,
    Camel,
}

impl KeyCase {
    pub fn parse(value: &str) -> Result<Self> {
        Ok(match value.trim().to_lowercase().replace(['-', '_'], "").as_str() {
            "asis" | "" => KeyCase::AsIs,
            "upper" => KeyCase::Upper,
            "lower" => KeyCase::Lower,
            "camel" | "camelcase" => KeyCase::Camel,
            _ => {
                return Err(QuarryError::validation(format!(
                    "Unknown key case `{value}`, expected as_is, upper, lower or camel"
                )));
            }
        })
    }

    pub fn apply(&self, key: &str) -> String {
        match self {
            KeyCase::AsIs => key.to_string(),
            KeyCase::Upper => key.to_uppercase(),
            KeyCase::Lower => key.to_lowercase(),
            KeyCase::Camel => key.to_lowercase().to_case(Case::Camel),
        }
    }
}

/// Ordered name to value map, the row of a table without a record type.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct DynamicRecord {
    entries: Vec<(String, Value)>,
}

impl DynamicRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_row(row: RowLabeled, key_case: KeyCase) -> Self {
        let RowLabeled { labels, values } = row;
        Self {
            entries: labels
                .iter()
                .zip(values.into_vec())
                .filter(|(label, _)| !label.ends_with(RELATION_DELIMITER))
                .map(|(label, value)| (key_case.apply(label), value))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Typed access.
    pub fn get_as<T: AsValue>(&self, key: &str) -> Result<T> {
        T::try_from_value(self.get(key).cloned().unwrap_or_default())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Fields for DynamicRecord {
    fn get_field(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }

    fn set_field(&mut self, name: &str, value: Value) -> Result<()> {
        self.insert(name, value);
        Ok(())
    }
}

impl IntoIterator for DynamicRecord {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;
    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn row(labels: &[&str], values: Vec<Value>) -> RowLabeled {
        RowLabeled::new(
            labels.iter().map(|v| v.to_string()).collect::<Vec<_>>().into(),
            values.into_boxed_slice(),
        )
    }

    #[test]
    fn key_cases() {
        assert_eq!(KeyCase::Camel.apply("FIRST_NAME"), "firstName");
        assert_eq!(KeyCase::Upper.apply("first_name"), "FIRST_NAME");
        assert_eq!(KeyCase::parse("as_is").unwrap(), KeyCase::AsIs);
        assert!(KeyCase::parse("kebab").is_err());
    }

    #[test]
    fn dynamic_records_skip_window_columns() {
        let record = DynamicRecord::from_row(
            row(
                &["ID", "FIRST_NAME", "rownum__"],
                vec![Value::Int32(Some(1)), "Ada".into(), Value::Int64(Some(1))],
            ),
            KeyCase::Lower,
        );
        assert_eq!(record.keys().collect::<Vec<_>>(), vec!["id", "first_name"]);
        assert_eq!(record.get_as::<String>("first_name").unwrap(), "Ada");
    }

    #[test]
    fn first_column() {
        let labels: Arc<[String]> = vec!["count".to_string()].into();
        let value: u64 = materialize_value(RowLabeled::new(
            labels,
            vec![Value::Int64(Some(12))].into_boxed_slice(),
        ))
        .unwrap();
        assert_eq!(value, 12);
    }
}
