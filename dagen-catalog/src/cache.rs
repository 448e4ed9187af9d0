use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::OnceCell;

use crate::{ResultColumnDescriptor, Result, RowSetType};

/// One column of a row-set type as read from the catalog.
#[derive(Debug, Clone)]
pub struct RowSetColumn {
    pub schema: String,
    pub type_name: String,
    pub column: ResultColumnDescriptor,
}

/// Row-set types loaded once per introspector.
///
/// The first access runs the loader; concurrent first accesses block on that
/// single computation.
#[derive(Debug, Default)]
pub struct RowSetTypeCache {
    types: OnceCell<Vec<Arc<RowSetType>>>,
}

impl RowSetTypeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// All row-set types, loading them on first use.
    pub fn get_or_load<F>(&self, load: F) -> Result<&[Arc<RowSetType>]>
    where
        F: FnOnce() -> Result<Vec<RowSetColumn>>,
    {
        self.types
            .get_or_try_init(|| load().map(group_row_set_types))
            .map(Vec::as_slice)
    }

    /// Find a type by exact schema and name, marking it used.
    pub fn lookup<F>(&self, schema: &str, name: &str, load: F) -> Result<Option<Arc<RowSetType>>>
    where
        F: FnOnce() -> Result<Vec<RowSetColumn>>,
    {
        let found = self
            .get_or_load(load)?
            .iter()
            .find(|udt| udt.schema == schema && udt.name == name)
            .cloned();
        if let Some(udt) = &found {
            udt.mark_used();
        }
        Ok(found)
    }

    /// Types referenced by at least one lookup, in catalog order.
    pub fn used(&self) -> Vec<Arc<RowSetType>> {
        self.types
            .get()
            .map(|types| types.iter().filter(|t| t.is_used()).cloned().collect())
            .unwrap_or_default()
    }
}

/// Group catalog rows by (schema, type name), keeping row order within each
/// group, and flag names that occur under more than one schema.
pub fn group_row_set_types(rows: Vec<RowSetColumn>) -> Vec<Arc<RowSetType>> {
    let mut groups: IndexMap<(String, String), Vec<ResultColumnDescriptor>> = IndexMap::new();
    for row in rows {
        groups
            .entry((row.schema, row.type_name))
            .or_default()
            .push(row.column);
    }

    let mut types: Vec<RowSetType> = groups
        .into_iter()
        .map(|((schema, name), columns)| RowSetType::new(schema, name, columns))
        .collect();

    let ambiguous: Vec<bool> = types
        .iter()
        .map(|t| {
            types
                .iter()
                .any(|other| other.name == t.name && other.schema != t.schema)
        })
        .collect();
    for (udt, ambiguous) in types.iter_mut().zip(ambiguous) {
        udt.requires_disambiguation = ambiguous;
    }

    types.into_iter().map(Arc::new).collect()
}
