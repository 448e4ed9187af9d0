//! Opening a catalog for a repository.

use dagen_catalog::SchemaIntrospector;
use eyre::Result;

/// An introspector over the database behind `connection`.
#[cfg(feature = "mssql")]
pub fn introspector(connection: &str) -> Result<Box<dyn SchemaIntrospector>> {
    use dagen_catalog::{SqlIntrospector, mssql::MssqlConnector};

    let connector = MssqlConnector::from_ado_string(connection)?;
    Ok(Box::new(SqlIntrospector::new(connector)))
}

/// An introspector over the database behind `connection`.
#[cfg(not(feature = "mssql"))]
pub fn introspector(_connection: &str) -> Result<Box<dyn SchemaIntrospector>> {
    eyre::bail!("dagen was built without SQL Server support; rebuild with `--features mssql`")
}
