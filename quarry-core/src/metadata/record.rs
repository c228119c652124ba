use crate::{Result, Value};
use std::any::TypeId;

/// Field level access to a record, object safe so nested records can be
/// reached through `dyn Fields`.
pub trait Fields: Send + Sync {
    /// Current value of a scalar field, `None` when the record has no such field.
    fn get_field(&self, name: &str) -> Option<Value>;

    /// Assigns a scalar field, coercing the value to the field type.
    fn set_field(&mut self, name: &str, value: Value) -> Result<()>;

    /// Relation sub-record, if present.
    fn linked(&self, _name: &str) -> Option<&dyn Fields> {
        None
    }

    /// Relation sub-record, created with default values when absent.
    fn linked_mut(&mut self, _name: &str) -> Option<&mut dyn Fields> {
        None
    }
}

/// A type mapped onto a table, usually through `#[derive(Record)]`.
pub trait Record: Fields + Default + 'static {
    fn record_def() -> &'static RecordDef;
}

/// Declared metadata of a record type.
#[derive(Debug)]
pub struct RecordDef {
    pub type_id: fn() -> TypeId,
    pub type_name: &'static str,
    /// Explicit schema, otherwise each configured schema is probed.
    pub schema: Option<&'static str>,
    /// Explicit table name, otherwise derived from `type_name`.
    pub table: Option<&'static str>,
    /// Quote reserved words when rendering this table.
    pub escape_reserved: bool,
    pub fields: Vec<FieldDef>,
}

impl RecordDef {
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Declared metadata of one field.
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: &'static str,
    /// Explicit column name, otherwise derived from `name`.
    pub column: Option<&'static str>,
    pub length: Option<u32>,
    pub nullable: Option<bool>,
    /// Typed NULL of the field type.
    pub value: Value,
    pub primary_key: bool,
    /// The database generates the value, through an identity column or a sequence.
    pub generated: bool,
    /// Sequence name of a generated field, when not an identity column.
    pub sequence: Option<&'static str>,
    pub relation: Option<RelationDef>,
    pub ignore: bool,
}

impl FieldDef {
    pub fn new(name: &'static str, value: Value) -> Self {
        Self {
            name,
            column: None,
            length: None,
            nullable: None,
            value,
            primary_key: false,
            generated: false,
            sequence: None,
            relation: None,
            ignore: false,
        }
    }
}

/// The field holds another record, linked through `local_columns` to its primary key.
#[derive(Debug, Clone)]
pub struct RelationDef {
    pub linked: fn() -> &'static RecordDef,
    pub local_columns: Vec<&'static str>,
}
