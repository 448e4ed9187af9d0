//! Descriptors for routines, parameters, result columns and row-set types.

use std::sync::atomic::{AtomicBool, Ordering};

/// A routine parameter as declared in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDescriptor {
    /// Name including the leading `@`
    pub name: String,
    pub type_name: String,
    pub type_schema: String,
    pub max_length: i32,
    pub precision: u8,
    pub scale: u8,
    pub is_output: bool,
    /// Default literal scanned from the routine body, if declared
    pub default_value: Option<String>,
}

impl ParameterDescriptor {
    /// A plain input parameter; sizes zeroed, schema `sys`.
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            type_schema: String::from("sys"),
            max_length: 0,
            precision: 0,
            scale: 0,
            is_output: false,
            default_value: None,
        }
    }

    pub fn output(mut self) -> Self {
        self.is_output = true;
        self
    }

    pub fn with_max_length(mut self, max_length: i32) -> Self {
        self.max_length = max_length;
        self
    }

    pub fn with_type_schema(mut self, schema: impl Into<String>) -> Self {
        self.type_schema = schema.into();
        self
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }
}

/// A column of a result set or of a row-set type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultColumnDescriptor {
    pub name: String,
    pub type_name: String,
    pub nullable: bool,
    pub max_length: i32,
    pub precision: u8,
    pub scale: u8,
}

impl ResultColumnDescriptor {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>, nullable: bool) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            nullable,
            max_length: 0,
            precision: 0,
            scale: 0,
        }
    }

    pub fn with_max_length(mut self, max_length: i32) -> Self {
        self.max_length = max_length;
        self
    }
}

/// A user-defined table type usable as a routine parameter.
#[derive(Debug)]
pub struct RowSetType {
    pub schema: String,
    pub name: String,
    /// Columns in catalog ordinal order
    pub columns: Vec<ResultColumnDescriptor>,
    /// The same type name exists under another schema
    pub requires_disambiguation: bool,
    used: AtomicBool,
}

impl RowSetType {
    pub fn new(
        schema: impl Into<String>,
        name: impl Into<String>,
        columns: Vec<ResultColumnDescriptor>,
    ) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            columns,
            requires_disambiguation: false,
            used: AtomicBool::new(false),
        }
    }

    /// Generated class name, schema-prefixed when ambiguous.
    pub fn class_name(&self) -> String {
        if self.requires_disambiguation {
            format!("{}_{}", self.schema, self.name)
        } else {
            self.name.clone()
        }
    }

    /// The single column, for one-column types.
    pub fn single_column(&self) -> Option<&ResultColumnDescriptor> {
        match self.columns.as_slice() {
            [column] => Some(column),
            _ => None,
        }
    }

    /// Whether any resolution has referenced this type.
    pub fn is_used(&self) -> bool {
        self.used.load(Ordering::Acquire)
    }

    pub(crate) fn mark_used(&self) {
        self.used.store(true, Ordering::Release);
    }
}

impl PartialEq for RowSetType {
    fn eq(&self, other: &Self) -> bool {
        self.schema == other.schema && self.name == other.name && self.columns == other.columns
    }
}

impl Eq for RowSetType {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_name() {
        let mut udt = RowSetType::new("sales", "IdList", vec![]);
        assert_eq!(udt.class_name(), "IdList");
        udt.requires_disambiguation = true;
        assert_eq!(udt.class_name(), "sales_IdList");
    }

    #[test]
    fn test_single_column() {
        let one = RowSetType::new(
            "dbo",
            "GuidList",
            vec![ResultColumnDescriptor::new("Id", "uniqueidentifier", false)],
        );
        assert_eq!(one.single_column().map(|c| c.name.as_str()), Some("Id"));

        let two = RowSetType::new(
            "dbo",
            "Pair",
            vec![
                ResultColumnDescriptor::new("A", "int", false),
                ResultColumnDescriptor::new("B", "int", false),
            ],
        );
        assert!(two.single_column().is_none());
    }

    #[test]
    fn test_mark_used_is_idempotent() {
        let udt = RowSetType::new("dbo", "IdList", vec![]);
        assert!(!udt.is_used());
        udt.mark_used();
        udt.mark_used();
        assert!(udt.is_used());
    }
}
