use crate::{DataType, RecordDef};
use std::{
    any::TypeId,
    collections::BTreeMap,
    fmt::{self, Display},
    sync::Arc,
};

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    #[default]
    Table,
    View,
}

impl Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TableKind::Table => "table",
            TableKind::View => "view",
        })
    }
}

/// How the database produces the value of a generated column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueGenerator {
    /// Auto-increment column, the value is read back from the driver.
    Identity,
    /// Fetched from the sequence before inserting.
    Sequence { schema: String, name: String },
}

/// Cache key of a resolved table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TableKey {
    /// Record type with its relations resolved.
    Record(TypeId),
    /// Record type reached through a relation: scalar columns only.
    Linked(TypeId),
    /// Bare table name resolved through introspection alone.
    Named(String),
}

/// Link from a relation column to the table it references.
#[derive(Debug, Clone)]
pub struct Relation {
    pub linked: Arc<Table>,
    /// Local columns matching, in order, the primary key of `linked`.
    pub local_columns: Vec<String>,
    /// The same local columns, typed after the key they reference.
    pub local: Vec<Column>,
}

#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    /// Record field name, equal to `name` for dynamic tables.
    pub field: String,
    pub primary_key: bool,
    pub data_type: DataType,
    /// Type as reported by introspection.
    pub sql_type: String,
    pub length: Option<u32>,
    pub nullable: bool,
    pub generator: Option<ValueGenerator>,
    /// Present on relation columns only, they have no column of their own.
    pub relation: Option<Relation>,
}

impl Column {
    pub fn is_relation(&self) -> bool {
        self.relation.is_some()
    }

    /// Linked columns a relation expands to in projections.
    pub fn linked_columns(&self) -> &[Column] {
        self.relation
            .as_ref()
            .map(|v| v.linked.columns.as_slice())
            .unwrap_or_default()
    }
}

/// Resolved mapping of a record type (or bare name) onto a schema object.
///
/// Built once, then shared read-only.
#[derive(Debug, Clone)]
pub struct Table {
    /// Schema.
    pub domain: String,
    pub name: String,
    pub kind: TableKind,
    pub columns: Vec<Column>,
    /// Primary key column names in key order.
    pub primary_key: Vec<String>,
    pub contains_linked_table: bool,
    /// Field name to generator.
    pub generators: BTreeMap<String, ValueGenerator>,
    pub escape_reserved: bool,
    pub record: Option<&'static RecordDef>,
}

impl Table {
    /// `schema.name`, or `name` without schema.
    pub fn full_name(&self) -> String {
        if self.domain.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.domain, self.name)
        }
    }

    /// Type name of the record, the table name for dynamic tables.
    pub fn type_name(&self) -> &str {
        self.record.map(|v| v.type_name).unwrap_or(&self.name)
    }

    /// Column by field name, then by column name ignoring case.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.field == name)
            .or_else(|| {
                self.columns
                    .iter()
                    .find(|c| c.name.eq_ignore_ascii_case(name) || c.field.eq_ignore_ascii_case(name))
            })
    }

    pub fn column_by_name(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Scalar columns, relations excluded.
    pub fn scalar_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| !c.is_relation())
    }

    pub fn primary_key_columns(&self) -> impl Iterator<Item = &Column> {
        self.primary_key
            .iter()
            .filter_map(|k| self.scalar_columns().find(|c| c.name.eq_ignore_ascii_case(k)))
    }
}
