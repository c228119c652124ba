use crate::Value;

/// Coarse classification of a column, shared by declared and introspected metadata.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Text,
    Char,
    Integer,
    Decimal,
    Float,
    Boolean,
    Date,
    Time,
    Timestamp,
    TimestampWithTimezone,
    Uuid,
    Binary,
    #[default]
    Other,
}

/// Lower-case SQL type names (without length/precision) and their class.
///
/// Lookup is exact first, then by prefix so that `varchar2`, `nvarchar` and
/// `character varying` all land on the right entry.
static SQL_TYPES: &[(&str, DataType)] = &[
    ("bigint", DataType::Integer),
    ("bigserial", DataType::Integer),
    ("binary", DataType::Binary),
    ("bit", DataType::Boolean),
    ("blob", DataType::Binary),
    ("bool", DataType::Boolean),
    ("boolean", DataType::Boolean),
    ("bpchar", DataType::Char),
    ("bytea", DataType::Binary),
    ("char", DataType::Char),
    ("character varying", DataType::Text),
    ("character", DataType::Char),
    ("citext", DataType::Text),
    ("clob", DataType::Text),
    ("date", DataType::Date),
    ("datetime", DataType::Timestamp),
    ("datetime2", DataType::Timestamp),
    ("datetimeoffset", DataType::TimestampWithTimezone),
    ("dec", DataType::Decimal),
    ("decimal", DataType::Decimal),
    ("double precision", DataType::Float),
    ("double", DataType::Float),
    ("enum", DataType::Text),
    ("float", DataType::Float),
    ("image", DataType::Binary),
    ("int", DataType::Integer),
    ("integer", DataType::Integer),
    ("long", DataType::Text),
    ("longblob", DataType::Binary),
    ("longtext", DataType::Text),
    ("mediumblob", DataType::Binary),
    ("mediumint", DataType::Integer),
    ("mediumtext", DataType::Text),
    ("money", DataType::Decimal),
    ("nchar", DataType::Char),
    ("nclob", DataType::Text),
    ("ntext", DataType::Text),
    ("number", DataType::Decimal),
    ("numeric", DataType::Decimal),
    ("nvarchar", DataType::Text),
    ("nvarchar2", DataType::Text),
    ("raw", DataType::Binary),
    ("real", DataType::Float),
    ("serial", DataType::Integer),
    ("smalldatetime", DataType::Timestamp),
    ("smallint", DataType::Integer),
    ("smallmoney", DataType::Decimal),
    ("smallserial", DataType::Integer),
    ("text", DataType::Text),
    ("time", DataType::Time),
    ("timestamp with time zone", DataType::TimestampWithTimezone),
    ("timestamp", DataType::Timestamp),
    ("timestamptz", DataType::TimestampWithTimezone),
    ("tinyblob", DataType::Binary),
    ("tinyint", DataType::Integer),
    ("tinytext", DataType::Text),
    ("uniqueidentifier", DataType::Uuid),
    ("uuid", DataType::Uuid),
    ("varbinary", DataType::Binary),
    ("varchar", DataType::Text),
    ("varchar2", DataType::Text),
];

impl DataType {
    /// Whether case-insensitive comparison applies to columns of this class.
    pub fn is_text(&self) -> bool {
        matches!(self, DataType::Text | DataType::Char)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            DataType::Integer | DataType::Decimal | DataType::Float
        )
    }

    /// Classifies a type name as reported by schema introspection.
    pub fn from_sql_type(name: &str) -> DataType {
        let name = name.trim().to_lowercase();
        if name.starts_with("timestamp") && name.contains("with time zone") {
            return DataType::TimestampWithTimezone;
        }
        let base = name.split('(').next().unwrap_or_default().trim();
        let base = base.strip_suffix(" unsigned").unwrap_or(base);
        if let Some((_, ty)) = SQL_TYPES.iter().find(|(k, _)| *k == base) {
            return *ty;
        }
        SQL_TYPES
            .iter()
            .filter(|(k, _)| base.starts_with(k))
            .max_by_key(|(k, _)| k.len())
            .map(|(_, ty)| *ty)
            .unwrap_or_default()
    }
}

impl From<&Value> for DataType {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => DataType::Other,
            Value::Boolean(..) => DataType::Boolean,
            Value::Int8(..)
            | Value::Int16(..)
            | Value::Int32(..)
            | Value::Int64(..)
            | Value::UInt8(..)
            | Value::UInt16(..)
            | Value::UInt32(..)
            | Value::UInt64(..) => DataType::Integer,
            Value::Float32(..) | Value::Float64(..) => DataType::Float,
            Value::Decimal(..) => DataType::Decimal,
            Value::Char(..) => DataType::Char,
            Value::Varchar(..) => DataType::Text,
            Value::Blob(..) => DataType::Binary,
            Value::Date(..) => DataType::Date,
            Value::Time(..) => DataType::Time,
            Value::Timestamp(..) => DataType::Timestamp,
            Value::TimestampWithTimezone(..) => DataType::TimestampWithTimezone,
            Value::Uuid(..) => DataType::Uuid,
            Value::List(..) => DataType::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DataType;

    #[test]
    fn text_boundary() {
        for name in [
            "varchar",
            "VARCHAR(255)",
            "character varying",
            "nvarchar2",
            "text",
            "clob",
            "char(1)",
            "nchar",
        ] {
            assert!(DataType::from_sql_type(name).is_text(), "{name}");
        }
        for name in [
            "integer",
            "numeric(10,2)",
            "uuid",
            "uniqueidentifier",
            "bytea",
            "date",
            "timestamp without time zone",
            "int unsigned",
        ] {
            assert!(!DataType::from_sql_type(name).is_text(), "{name}");
        }
    }

    #[test]
    fn timestamps() {
        assert_eq!(
            DataType::from_sql_type("timestamp with time zone"),
            DataType::TimestampWithTimezone
        );
        assert_eq!(
            DataType::from_sql_type("timestamp(6) with time zone"),
            DataType::TimestampWithTimezone
        );
        assert_eq!(
            DataType::from_sql_type("timestamp without time zone"),
            DataType::Timestamp
        );
        assert_eq!(DataType::from_sql_type("geometry"), DataType::Other);
    }
}
