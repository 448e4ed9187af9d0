use std::sync::Arc;

use tracing::debug;

use crate::{
    CatalogConnection, Connector, ParameterDescriptor, ResultColumnDescriptor, Result,
    RowSetType, SchemaIntrospector,
    cache::{RowSetColumn, RowSetTypeCache},
    defaults::scan_default_values,
    queries,
    speculative::speculative_call,
};

/// [`SchemaIntrospector`] backed by SQL Server catalog views.
pub struct SqlIntrospector<C: Connector> {
    connector: C,
    row_set_types: RowSetTypeCache,
}

impl<C: Connector> SqlIntrospector<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            row_set_types: RowSetTypeCache::new(),
        }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    fn routine_body(&self, schema: &str, routine: &str) -> Result<Option<String>> {
        let mut connection = self.connector.connect()?;
        let rows = connection.query(&queries::routine_body(schema, routine))?;
        match rows.first() {
            Some(row) => row.opt_string("definition"),
            None => Ok(None),
        }
    }

    fn load_row_set_columns(&self) -> Result<Vec<RowSetColumn>> {
        debug!("loading user-defined table types");
        let mut connection = self.connector.connect()?;
        connection
            .query(queries::TABLE_TYPES)?
            .iter()
            .map(|row| {
                Ok(RowSetColumn {
                    schema: row.string("SchemaName")?,
                    type_name: row.string("TableTypeName")?,
                    column: ResultColumnDescriptor {
                        name: row.string("ColumnName")?,
                        type_name: row.string("TypeName")?,
                        nullable: row.bool("is_nullable")?,
                        max_length: row.int32("max_length")?,
                        precision: row.byte("precision")?,
                        scale: row.byte("scale")?,
                    },
                })
            })
            .collect()
    }

    /// Execute the synthesized call inside a transaction that is rolled back
    /// whether or not the call succeeded.
    fn describe_by_execution(&self, sql: &str) -> Result<Vec<ResultColumnDescriptor>> {
        let mut connection = self.connector.connect()?;
        connection.begin_transaction()?;
        let described = connection.describe_execution(sql);
        let rolled_back = connection.rollback();
        let columns = described?;
        rolled_back?;
        Ok(columns)
    }
}

impl<C: Connector> SchemaIntrospector for SqlIntrospector<C> {
    fn list_routines(&self, schema: &str) -> Result<Vec<String>> {
        let mut connection = self.connector.connect()?;
        connection
            .query(&queries::procedures(schema))?
            .iter()
            .map(|row| row.string("name"))
            .collect()
    }

    fn parameters(&self, schema: &str, routine: &str) -> Result<Vec<ParameterDescriptor>> {
        let mut parameters = {
            let mut connection = self.connector.connect()?;
            connection
                .query(&queries::parameters(schema, routine))?
                .iter()
                .map(|row| {
                    Ok(ParameterDescriptor {
                        name: row.string("ParameterName")?,
                        type_name: row.string("TypeName")?,
                        type_schema: row.string("TypeSchema")?,
                        max_length: row.int32("max_length")?,
                        precision: row.byte("precision")?,
                        scale: row.byte("scale")?,
                        is_output: row.bool("is_output")?,
                        default_value: None,
                    })
                })
                .collect::<Result<Vec<_>>>()?
        };

        if let Some(body) = self.routine_body(schema, routine)? {
            let defaults = scan_default_values(&body);
            for parameter in &mut parameters {
                parameter.default_value = defaults.get(&parameter.name).cloned();
            }
        }

        debug!(schema, routine, count = parameters.len(), "resolved parameters");
        Ok(parameters)
    }

    fn result_shape(
        &self,
        schema: &str,
        routine: &str,
        parameters: &[ParameterDescriptor],
        allow_speculative: bool,
    ) -> Result<Vec<ResultColumnDescriptor>> {
        let columns = {
            let mut connection = self.connector.connect()?;
            connection
                .query(&queries::first_result_set(schema, routine))?
                .iter()
                .map(|row| {
                    Ok(ResultColumnDescriptor {
                        name: row.string("name")?,
                        type_name: row.string("typeName")?,
                        nullable: row.bool("is_nullable")?,
                        max_length: row.int32("max_length")?,
                        precision: row.byte("precision")?,
                        scale: row.byte("scale")?,
                    })
                })
                .collect::<Result<Vec<_>>>()?
        };

        if !columns.is_empty() || !allow_speculative {
            debug!(schema, routine, count = columns.len(), "resolved result shape");
            return Ok(columns);
        }

        let call = speculative_call(schema, routine, parameters);
        debug!(schema, routine, sql = %call, "describing result shape by execution");
        match self.describe_by_execution(&call) {
            Ok(columns) => Ok(columns),
            Err(error) => {
                debug!(schema, routine, %error, "speculative execution failed");
                Ok(Vec::new())
            }
        }
    }

    fn shape_diagnostic(&self, schema: &str, routine: &str) -> Result<Option<String>> {
        let mut connection = self.connector.connect()?;
        for row in connection.query(&queries::first_result_set_errors(schema, routine))? {
            if let Some(message) = row.opt_string("error_message")? {
                return Ok(Some(message));
            }
        }
        Ok(None)
    }

    fn user_defined_types(&self) -> Result<&[Arc<RowSetType>]> {
        self.row_set_types
            .get_or_load(|| self.load_row_set_columns())
    }

    fn user_defined_type(&self, schema: &str, name: &str) -> Result<Option<Arc<RowSetType>>> {
        self.row_set_types
            .lookup(schema, name, || self.load_row_set_columns())
    }

    fn used_user_defined_types(&self) -> Result<Vec<Arc<RowSetType>>> {
        Ok(self.row_set_types.used())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeConnector, FakeRoutine};

    const BODY: &str = "CREATE PROCEDURE dbo.Search @Name varchar(50) = 'x', @Ids dbo.IdList READONLY\nAS\nSELECT 1";

    fn connector() -> FakeConnector {
        FakeConnector::new("dbo")
            .with_routine(
                FakeRoutine::new("Search")
                    .body(BODY)
                    .parameter(ParameterDescriptor::new("@Name", "varchar").with_max_length(50))
                    .parameter(
                        ParameterDescriptor::new("@Ids", "IdList").with_type_schema("dbo"),
                    )
                    .column(ResultColumnDescriptor::new("Name", "varchar", false)),
            )
            .with_routine(
                FakeRoutine::new("Archive")
                    .diagnostic("The metadata could not be determined because of a temp table.")
                    .executed_column(ResultColumnDescriptor::new("Moved", "int", false))
                    .inserts(3),
            )
            .with_routine(FakeRoutine::new("Broken").inserts(1).fails())
            .with_table_type(
                "dbo",
                "IdList",
                vec![ResultColumnDescriptor::new("Id", "int", false)],
            )
            .with_table_type(
                "dbo",
                "Unused",
                vec![ResultColumnDescriptor::new("Id", "int", false)],
            )
    }

    #[test]
    fn test_list_routines() {
        let introspector = SqlIntrospector::new(connector());
        let names = introspector.list_routines("dbo").unwrap();
        assert_eq!(names, ["Search", "Archive", "Broken"]);
        assert!(introspector.list_routines("sales").unwrap().is_empty());
    }

    #[test]
    fn test_parameters_carry_scanned_defaults() {
        let introspector = SqlIntrospector::new(connector());
        let parameters = introspector.parameters("dbo", "Search").unwrap();

        assert_eq!(parameters.len(), 2);
        assert_eq!(parameters[0].default_value.as_deref(), Some("'x'"));
        assert_eq!(parameters[0].max_length, 50);
        assert_eq!(parameters[1].default_value, None);
        assert_eq!(parameters[1].type_schema, "dbo");
    }

    #[test]
    fn test_described_shape_skips_execution() {
        let connector = connector();
        let introspector = SqlIntrospector::new(connector.clone());
        let columns = introspector.result_shape("dbo", "Search", &[], true).unwrap();

        assert_eq!(columns.len(), 1);
        assert!(connector.state().executions.is_empty());
    }

    #[test]
    fn test_speculative_execution_never_commits() {
        let connector = connector();
        let introspector = SqlIntrospector::new(connector.clone());
        let before = connector.state().committed_rows;

        let columns = introspector.result_shape("dbo", "Archive", &[], true).unwrap();

        let state = connector.state();
        assert_eq!(columns.len(), 1);
        assert_eq!(columns[0].name, "Moved");
        assert_eq!(state.committed_rows, before);
        assert_eq!(state.transactions, 1);
        assert_eq!(state.rollbacks, 1);
    }

    #[test]
    fn test_speculative_failure_is_swallowed_and_rolled_back() {
        let connector = connector();
        let introspector = SqlIntrospector::new(connector.clone());

        let columns = introspector.result_shape("dbo", "Broken", &[], true).unwrap();

        let state = connector.state();
        assert!(columns.is_empty());
        assert_eq!(state.committed_rows, 0);
        assert_eq!(state.rollbacks, 1);
    }

    #[test]
    fn test_speculative_disabled() {
        let connector = connector();
        let introspector = SqlIntrospector::new(connector.clone());
        let columns = introspector.result_shape("dbo", "Archive", &[], false).unwrap();

        assert!(columns.is_empty());
        assert!(connector.state().executions.is_empty());
    }

    #[test]
    fn test_speculative_call_declares_row_set_parameters() {
        let connector = connector();
        let introspector = SqlIntrospector::new(connector.clone());
        let parameters = vec![ParameterDescriptor::new("@Ids", "IdList").with_type_schema("dbo")];
        introspector.result_shape("dbo", "Archive", &parameters, true).unwrap();

        assert_eq!(
            connector.state().executions,
            ["DECLARE @Ids dbo.IdList; EXEC dbo.Archive @Ids = @Ids"]
        );
    }

    #[test]
    fn test_shape_diagnostic() {
        let introspector = SqlIntrospector::new(connector());
        let message = introspector.shape_diagnostic("dbo", "Archive").unwrap();
        assert!(message.unwrap().contains("temp table"));
        assert_eq!(introspector.shape_diagnostic("dbo", "Search").unwrap(), None);
    }

    #[test]
    fn test_user_defined_types_load_once_and_track_use() {
        let connector = connector();
        let introspector = SqlIntrospector::new(connector.clone());

        assert_eq!(introspector.user_defined_types().unwrap().len(), 2);
        let connections = connector.state().connections;

        let found = introspector.user_defined_type("dbo", "IdList").unwrap();
        assert!(found.is_some());
        assert_eq!(connector.state().connections, connections);

        let used = introspector.used_user_defined_types().unwrap();
        assert_eq!(used.len(), 1);
        assert_eq!(used[0].name, "IdList");
    }
}
