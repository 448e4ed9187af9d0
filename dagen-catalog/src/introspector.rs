use std::sync::Arc;

use crate::{ParameterDescriptor, ResultColumnDescriptor, Result, RowSetType};

/// Read access to the routines and types of one database.
///
/// Implementations are shared across the generation worker threads.
pub trait SchemaIntrospector: Send + Sync {
    /// Routine names in the schema.
    fn list_routines(&self, schema: &str) -> Result<Vec<String>>;

    /// Parameters in declaration order, with defaults scanned from the body.
    fn parameters(&self, schema: &str, routine: &str) -> Result<Vec<ParameterDescriptor>>;

    /// Columns of the routine's first result set.
    ///
    /// When the catalog cannot describe the shape and `allow_speculative` is
    /// set, the routine is executed inside a transaction that is always
    /// rolled back. Failures of that attempt yield an empty shape.
    fn result_shape(
        &self,
        schema: &str,
        routine: &str,
        parameters: &[ParameterDescriptor],
        allow_speculative: bool,
    ) -> Result<Vec<ResultColumnDescriptor>>;

    /// Why the catalog could not describe the result shape, if it says.
    fn shape_diagnostic(&self, schema: &str, routine: &str) -> Result<Option<String>>;

    /// Every user-defined row-set type, loaded once.
    fn user_defined_types(&self) -> Result<&[Arc<RowSetType>]>;

    /// Exact-match lookup; a match is marked as used.
    fn user_defined_type(&self, schema: &str, name: &str) -> Result<Option<Arc<RowSetType>>>;

    /// Row-set types marked as used so far.
    fn used_user_defined_types(&self) -> Result<Vec<Arc<RowSetType>>> {
        Ok(self
            .user_defined_types()?
            .iter()
            .filter(|t| t.is_used())
            .cloned()
            .collect())
    }
}
