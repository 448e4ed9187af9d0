//! In-memory stand-ins for a database catalog.
//!
//! [`FakeIntrospector`] answers [`SchemaIntrospector`] calls from canned
//! descriptors. [`FakeConnector`] goes one level lower and scripts the raw
//! catalog queries, so [`crate::SqlIntrospector`] can be exercised end to end,
//! including its transaction handling.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;

use crate::{
    CatalogConnection, CatalogError, CatalogRow, Connector, ParameterDescriptor,
    ResultColumnDescriptor, Result, RowSetType, SchemaIntrospector,
    cache::{RowSetColumn, RowSetTypeCache},
};

/// A scripted routine.
#[derive(Debug, Clone, Default)]
pub struct FakeRoutine {
    pub name: String,
    /// Source text returned for the body query
    pub body: Option<String>,
    pub parameters: Vec<ParameterDescriptor>,
    /// Shape reported by the catalog's estimation facility
    pub described: Vec<ResultColumnDescriptor>,
    /// Message reported when estimation fails
    pub diagnostic: Option<String>,
    /// Shape observed when the routine is actually executed
    pub executed: Vec<ResultColumnDescriptor>,
    /// Rows the routine inserts each time it runs
    pub inserts: u64,
    /// Execution raises an error after inserting
    pub fails: bool,
}

impl FakeRoutine {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn parameter(mut self, parameter: ParameterDescriptor) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn column(mut self, column: ResultColumnDescriptor) -> Self {
        self.described.push(column);
        self
    }

    pub fn diagnostic(mut self, message: impl Into<String>) -> Self {
        self.diagnostic = Some(message.into());
        self
    }

    pub fn executed_column(mut self, column: ResultColumnDescriptor) -> Self {
        self.executed.push(column);
        self
    }

    pub fn inserts(mut self, rows: u64) -> Self {
        self.inserts = rows;
        self
    }

    pub fn fails(mut self) -> Self {
        self.fails = true;
        self
    }
}

/// Canned [`SchemaIntrospector`] that records every call it receives.
#[derive(Default)]
pub struct FakeIntrospector {
    schema: String,
    routines: IndexMap<String, FakeRoutine>,
    table_types: Vec<RowSetColumn>,
    cache: RowSetTypeCache,
    calls: Mutex<Vec<String>>,
}

impl FakeIntrospector {
    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            ..Self::default()
        }
    }

    pub fn with_routine(mut self, routine: FakeRoutine) -> Self {
        self.routines.insert(routine.name.clone(), routine);
        self
    }

    pub fn with_table_type(
        mut self,
        schema: &str,
        name: &str,
        columns: Vec<ResultColumnDescriptor>,
    ) -> Self {
        self.table_types
            .extend(columns.into_iter().map(|column| RowSetColumn {
                schema: schema.to_string(),
                type_name: name.to_string(),
                column,
            }));
        self
    }

    /// Calls received so far, as `operation:schema.routine`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn record(&self, operation: &str, schema: &str, routine: &str) {
        self.calls
            .lock()
            .push(format!("{operation}:{schema}.{routine}"));
    }

    fn load_table_types(&self) -> Result<Vec<RowSetColumn>> {
        self.record("load_table_types", "*", "*");
        Ok(self.table_types.clone())
    }

    fn routine(&self, schema: &str, routine: &str) -> Option<&FakeRoutine> {
        if schema != self.schema {
            return None;
        }
        self.routines.get(routine)
    }
}

impl SchemaIntrospector for FakeIntrospector {
    fn list_routines(&self, schema: &str) -> Result<Vec<String>> {
        self.record("list_routines", schema, "*");
        if schema != self.schema {
            return Ok(Vec::new());
        }
        Ok(self.routines.keys().cloned().collect())
    }

    fn parameters(&self, schema: &str, routine: &str) -> Result<Vec<ParameterDescriptor>> {
        self.record("parameters", schema, routine);
        Ok(self
            .routine(schema, routine)
            .map(|r| r.parameters.clone())
            .unwrap_or_default())
    }

    fn result_shape(
        &self,
        schema: &str,
        routine: &str,
        _parameters: &[ParameterDescriptor],
        allow_speculative: bool,
    ) -> Result<Vec<ResultColumnDescriptor>> {
        self.record("result_shape", schema, routine);
        let Some(fake) = self.routine(schema, routine) else {
            return Ok(Vec::new());
        };
        if !fake.described.is_empty() {
            return Ok(fake.described.clone());
        }
        if allow_speculative && !fake.fails {
            return Ok(fake.executed.clone());
        }
        Ok(Vec::new())
    }

    fn shape_diagnostic(&self, schema: &str, routine: &str) -> Result<Option<String>> {
        self.record("shape_diagnostic", schema, routine);
        Ok(self.routine(schema, routine).and_then(|r| r.diagnostic.clone()))
    }

    fn user_defined_types(&self) -> Result<&[Arc<RowSetType>]> {
        self.cache.get_or_load(|| self.load_table_types())
    }

    fn user_defined_type(&self, schema: &str, name: &str) -> Result<Option<Arc<RowSetType>>> {
        self.cache.lookup(schema, name, || self.load_table_types())
    }
}

/// Observable side effects of a [`FakeConnector`]'s database.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FakeDatabaseState {
    /// Rows that survived; the counter query before and after a call
    pub committed_rows: u64,
    pub connections: usize,
    pub transactions: usize,
    pub rollbacks: usize,
    /// Text of every executed routine call
    pub executions: Vec<String>,
}

/// A [`Connector`] whose connections answer catalog queries from scripted
/// routines and track transactional inserts.
#[derive(Clone, Default)]
pub struct FakeConnector {
    schema: String,
    routines: Arc<Vec<FakeRoutine>>,
    table_types: Arc<Vec<RowSetColumn>>,
    state: Arc<Mutex<FakeDatabaseState>>,
}

impl FakeConnector {
    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            ..Self::default()
        }
    }

    pub fn with_routine(mut self, routine: FakeRoutine) -> Self {
        Arc::make_mut(&mut self.routines).push(routine);
        self
    }

    pub fn with_table_type(
        mut self,
        schema: &str,
        name: &str,
        columns: Vec<ResultColumnDescriptor>,
    ) -> Self {
        Arc::make_mut(&mut self.table_types).extend(columns.into_iter().map(|column| {
            RowSetColumn {
                schema: schema.to_string(),
                type_name: name.to_string(),
                column,
            }
        }));
        self
    }

    pub fn state(&self) -> FakeDatabaseState {
        self.state.lock().clone()
    }
}

impl Connector for FakeConnector {
    type Connection = FakeConnection;

    fn connect(&self) -> Result<Self::Connection> {
        self.state.lock().connections += 1;
        Ok(FakeConnection {
            connector: self.clone(),
            pending_rows: None,
        })
    }
}

/// Connection handed out by [`FakeConnector`].
///
/// Inserts made inside a transaction stay pending until rollback or drop,
/// both of which discard them. Inserts outside a transaction commit at once.
pub struct FakeConnection {
    connector: FakeConnector,
    pending_rows: Option<u64>,
}

impl FakeConnection {
    fn find_routine(&self, sql: &str) -> Option<&FakeRoutine> {
        let schema = &self.connector.schema;
        self.connector.routines.iter().find(|r| {
            sql.contains(&format!("'{schema}.{}'", r.name))
                || sql.contains(&format!("EXEC {schema}.{} ", r.name))
        })
    }

    fn procedures(&self, sql: &str) -> Vec<CatalogRow> {
        if !sql.contains(&format!("'{}'", self.connector.schema)) {
            return Vec::new();
        }
        self.connector
            .routines
            .iter()
            .map(|r| CatalogRow::new().with("name", r.name.as_str()))
            .collect()
    }

    fn table_types(&self) -> Vec<CatalogRow> {
        self.connector
            .table_types
            .iter()
            .map(|row| {
                column_row(&row.column)
                    .with("TableTypeName", row.type_name.as_str())
                    .with("ColumnName", row.column.name.as_str())
                    .with("TypeName", row.column.type_name.as_str())
                    .with("SchemaName", row.schema.as_str())
            })
            .collect()
    }

    fn routine_rows(&self, sql: &str) -> Vec<CatalogRow> {
        let Some(routine) = self.find_routine(sql) else {
            return Vec::new();
        };

        if sql.contains("sys.sql_modules") {
            routine
                .body
                .iter()
                .map(|body| CatalogRow::new().with("definition", body.as_str()))
                .collect()
        } else if sql.contains("sys.parameters") {
            routine
                .parameters
                .iter()
                .map(|p| {
                    CatalogRow::new()
                        .with("ParameterName", p.name.as_str())
                        .with("TypeName", p.type_name.as_str())
                        .with("TypeSchema", p.type_schema.as_str())
                        .with("max_length", i64::from(p.max_length))
                        .with("precision", i64::from(p.precision))
                        .with("scale", i64::from(p.scale))
                        .with("is_output", p.is_output)
                })
                .collect()
        } else if sql.starts_with("SELECT error_message") {
            vec![CatalogRow::new().with("error_message", routine.diagnostic.clone())]
        } else {
            routine
                .described
                .iter()
                .map(|c| {
                    column_row(c)
                        .with("name", c.name.as_str())
                        .with("typeName", c.type_name.as_str())
                })
                .collect()
        }
    }
}

fn column_row(column: &ResultColumnDescriptor) -> CatalogRow {
    CatalogRow::new()
        .with("is_nullable", column.nullable)
        .with("max_length", i64::from(column.max_length))
        .with("precision", i64::from(column.precision))
        .with("scale", i64::from(column.scale))
}

impl CatalogConnection for FakeConnection {
    fn query(&mut self, sql: &str) -> Result<Vec<CatalogRow>> {
        if sql.contains("sys.procedures") {
            Ok(self.procedures(sql))
        } else if sql.contains("sys.table_types") {
            Ok(self.table_types())
        } else {
            Ok(self.routine_rows(sql))
        }
    }

    fn begin_transaction(&mut self) -> Result<()> {
        if self.pending_rows.is_some() {
            return Err(CatalogError::query("transaction already open"));
        }
        self.pending_rows = Some(0);
        self.connector.state.lock().transactions += 1;
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        if self.pending_rows.take().is_none() {
            return Err(CatalogError::query("no open transaction"));
        }
        self.connector.state.lock().rollbacks += 1;
        Ok(())
    }

    fn describe_execution(&mut self, sql: &str) -> Result<Vec<ResultColumnDescriptor>> {
        self.connector
            .state
            .lock()
            .executions
            .push(sql.to_string());

        let Some(routine) = self.find_routine(sql).cloned() else {
            return Err(CatalogError::query(format!("could not find procedure in: {sql}")));
        };

        match self.pending_rows.as_mut() {
            Some(pending) => *pending += routine.inserts,
            None => self.connector.state.lock().committed_rows += routine.inserts,
        }

        if routine.fails {
            return Err(CatalogError::query(format!("{} raised an error", routine.name)));
        }
        Ok(routine.executed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_outside_transaction_commits() {
        let connector = FakeConnector::new("dbo").with_routine(FakeRoutine::new("Touch").inserts(2));
        let mut connection = connector.connect().unwrap();
        connection.describe_execution(" EXEC dbo.Touch ").unwrap();
        assert_eq!(connector.state().committed_rows, 2);
    }

    #[test]
    fn test_rollback_discards_inserts() {
        let connector = FakeConnector::new("dbo").with_routine(FakeRoutine::new("Touch").inserts(2));
        let mut connection = connector.connect().unwrap();
        connection.begin_transaction().unwrap();
        connection.describe_execution(" EXEC dbo.Touch ").unwrap();
        connection.rollback().unwrap();
        assert_eq!(connector.state().committed_rows, 0);
        assert!(connection.rollback().is_err());
    }

    #[test]
    fn test_fake_introspector_records_calls() {
        let fake = FakeIntrospector::new("dbo").with_routine(FakeRoutine::new("Ping"));
        fake.list_routines("dbo").unwrap();
        fake.parameters("dbo", "Ping").unwrap();
        assert_eq!(fake.calls(), ["list_routines:dbo.*", "parameters:dbo.Ping"]);
    }

    #[test]
    fn test_concurrent_first_access_loads_table_types_once() {
        let fake = FakeIntrospector::new("dbo")
            .with_table_type("dbo", "IdList", vec![ResultColumnDescriptor::new("Id", "int", false)])
            .with_table_type("sales", "IdList", vec![ResultColumnDescriptor::new("Id", "int", false)]);

        std::thread::scope(|scope| {
            let workers: Vec<_> = (0..4)
                .map(|i| {
                    let fake = &fake;
                    scope.spawn(move || {
                        if i % 2 == 0 {
                            fake.user_defined_types().unwrap().len()
                        } else {
                            fake.user_defined_type("sales", "IdList").unwrap().map_or(0, |_| 2)
                        }
                    })
                })
                .collect();
            for worker in workers {
                assert_eq!(worker.join().unwrap(), 2);
            }
        });

        let loads = fake
            .calls()
            .iter()
            .filter(|c| c.starts_with("load_table_types:"))
            .count();
        assert_eq!(loads, 1);
        assert_eq!(fake.used_user_defined_types().unwrap().len(), 1);
    }
}
