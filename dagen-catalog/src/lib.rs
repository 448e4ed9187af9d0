//! Database catalog introspection for dagen.
//!
//! [`SchemaIntrospector`] is the read-only view of a database the generator
//! works against. [`SqlIntrospector`] implements it over SQL Server catalog
//! views through a [`Connector`], and the `mssql` feature provides a
//! `tiberius` connector.

mod cache;
mod connection;
mod defaults;
mod descriptor;
mod error;
mod introspector;
mod queries;
mod speculative;
mod sql;

#[cfg(feature = "mssql")]
pub mod mssql;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use cache::{RowSetColumn, RowSetTypeCache};
pub use connection::{CatalogConnection, CatalogRow, CatalogValue, Connector};
pub use defaults::scan_default_values;
pub use descriptor::{ParameterDescriptor, ResultColumnDescriptor, RowSetType};
pub use error::{CatalogError, Result};
pub use introspector::SchemaIntrospector;
pub use speculative::speculative_call;
pub use sql::SqlIntrospector;
