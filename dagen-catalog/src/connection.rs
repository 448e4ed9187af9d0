//! The boundary between catalog logic and the database driver.

use crate::{CatalogError, ResultColumnDescriptor, Result};

/// A single value read from a catalog row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogValue {
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
}

impl CatalogValue {
    fn kind(&self) -> &'static str {
        match self {
            CatalogValue::Null => "NULL",
            CatalogValue::Bool(_) => "a bit",
            CatalogValue::Int(_) => "an integer",
            CatalogValue::Text(_) => "text",
        }
    }
}

impl From<&str> for CatalogValue {
    fn from(value: &str) -> Self {
        CatalogValue::Text(value.to_string())
    }
}

impl From<String> for CatalogValue {
    fn from(value: String) -> Self {
        CatalogValue::Text(value)
    }
}

impl From<bool> for CatalogValue {
    fn from(value: bool) -> Self {
        CatalogValue::Bool(value)
    }
}

impl From<i64> for CatalogValue {
    fn from(value: i64) -> Self {
        CatalogValue::Int(value)
    }
}

impl<T: Into<CatalogValue>> From<Option<T>> for CatalogValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(CatalogValue::Null, Into::into)
    }
}

/// A row returned by a catalog query, with columns addressed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogRow {
    columns: Vec<(String, CatalogValue)>,
}

impl CatalogRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style column append.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<CatalogValue>) -> Self {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<CatalogValue>) {
        self.columns.push((name.into(), value.into()));
    }

    /// Look up a column, ignoring ASCII case like SQL Server does.
    pub fn get(&self, column: &str) -> Result<&CatalogValue> {
        self.columns
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(column))
            .map(|(_, value)| value)
            .ok_or_else(|| CatalogError::MissingColumn {
                column: column.to_string(),
            })
    }

    pub fn string(&self, column: &str) -> Result<String> {
        match self.get(column)? {
            CatalogValue::Text(text) => Ok(text.clone()),
            other => Err(unexpected(column, "text", other)),
        }
    }

    pub fn opt_string(&self, column: &str) -> Result<Option<String>> {
        match self.get(column)? {
            CatalogValue::Null => Ok(None),
            CatalogValue::Text(text) => Ok(Some(text.clone())),
            other => Err(unexpected(column, "text", other)),
        }
    }

    pub fn int(&self, column: &str) -> Result<i64> {
        match self.get(column)? {
            CatalogValue::Int(value) => Ok(*value),
            other => Err(unexpected(column, "an integer", other)),
        }
    }

    /// Integer column narrowed to 32 bits, as used for `max_length`.
    pub fn int32(&self, column: &str) -> Result<i32> {
        let value = self.int(column)?;
        i32::try_from(value).map_err(|_| CatalogError::UnexpectedValue {
            column: column.to_string(),
            expected: "a 32-bit integer",
            found: "an out-of-range integer",
        })
    }

    /// Integer column narrowed to a byte, as used for precision and scale.
    pub fn byte(&self, column: &str) -> Result<u8> {
        let value = self.int(column)?;
        u8::try_from(value).map_err(|_| CatalogError::UnexpectedValue {
            column: column.to_string(),
            expected: "a byte",
            found: "an out-of-range integer",
        })
    }

    pub fn bool(&self, column: &str) -> Result<bool> {
        match self.get(column)? {
            CatalogValue::Bool(value) => Ok(*value),
            CatalogValue::Int(value) => Ok(*value != 0),
            other => Err(unexpected(column, "a bit", other)),
        }
    }
}

fn unexpected(column: &str, expected: &'static str, found: &CatalogValue) -> CatalogError {
    CatalogError::UnexpectedValue {
        column: column.to_string(),
        expected,
        found: found.kind(),
    }
}

/// An open connection to the catalog database.
///
/// Implementations own the per-call timeout. `begin_transaction` and
/// `rollback` bracket the speculative execution path; nothing in this crate
/// ever commits.
pub trait CatalogConnection {
    /// Run a query and collect all rows of its first result set.
    fn query(&mut self, sql: &str) -> Result<Vec<CatalogRow>>;

    fn begin_transaction(&mut self) -> Result<()>;

    fn rollback(&mut self) -> Result<()>;

    /// Execute `sql` and report the column metadata of its first result set.
    fn describe_execution(&mut self, sql: &str) -> Result<Vec<ResultColumnDescriptor>>;
}

/// Opens catalog connections. One connection is opened per catalog call.
pub trait Connector: Send + Sync {
    type Connection: CatalogConnection;

    fn connect(&self) -> Result<Self::Connection>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_accessors() {
        let row = CatalogRow::new()
            .with("ParameterName", "@Id")
            .with("max_length", 4_i64)
            .with("is_output", true)
            .with("TypeSchema", None::<String>);

        assert_eq!(row.string("parametername").unwrap(), "@Id");
        assert_eq!(row.int("max_length").unwrap(), 4);
        assert_eq!(row.byte("MAX_LENGTH").unwrap(), 4);
        assert!(row.bool("is_output").unwrap());
        assert_eq!(row.opt_string("TypeSchema").unwrap(), None);
    }

    #[test]
    fn test_missing_column() {
        let err = CatalogRow::new().string("name").unwrap_err();
        assert!(matches!(err, CatalogError::MissingColumn { ref column } if column == "name"));
    }

    #[test]
    fn test_type_mismatch() {
        let row = CatalogRow::new().with("name", 1_i64);
        let err = row.string("name").unwrap_err();
        assert_eq!(err.to_string(), "column 'name' holds an integer, expected text");
    }

    #[test]
    fn test_byte_out_of_range() {
        let row = CatalogRow::new().with("precision", 300_i64);
        assert!(row.byte("precision").is_err());
    }

    #[test]
    fn test_int32_out_of_range() {
        let row = CatalogRow::new().with("max_length", -1_i64);
        assert_eq!(row.int32("max_length").unwrap(), -1);

        let row = CatalogRow::new().with("max_length", i64::from(i32::MAX) + 1);
        let err = row.int32("max_length").unwrap_err();
        assert_eq!(
            err.to_string(),
            "column 'max_length' holds an out-of-range integer, expected a 32-bit integer"
        );
    }

    #[test]
    fn test_bit_from_integer() {
        let row = CatalogRow::new().with("is_nullable", 0_i64);
        assert!(!row.bool("is_nullable").unwrap());
    }
}
