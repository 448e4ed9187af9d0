//! SQL Server connections over `tiberius`.
//!
//! Every connection owns a current-thread runtime, so catalog calls stay
//! blocking from the caller's point of view.

use std::{future::Future, time::Duration};

use tiberius::{Client, ColumnData, ColumnType, Config, Row};
use tokio::{net::TcpStream, runtime::Runtime};
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::debug;

use crate::{
    CatalogConnection, CatalogError, CatalogRow, CatalogValue, Connector, ResultColumnDescriptor,
    Result,
};

/// Fixed timeout applied to every catalog call.
pub const CALL_TIMEOUT: Duration = Duration::from_secs(120);

/// Opens `tiberius` connections from an ADO.NET style connection string.
#[derive(Clone)]
pub struct MssqlConnector {
    config: Config,
}

impl MssqlConnector {
    pub fn from_ado_string(connection_string: &str) -> Result<Self> {
        let config = Config::from_ado_string(connection_string)
            .map_err(|e| CatalogError::connection(e.to_string()))?;
        Ok(Self { config })
    }
}

impl Connector for MssqlConnector {
    type Connection = MssqlConnection;

    fn connect(&self) -> Result<Self::Connection> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| CatalogError::connection(e.to_string()))?;

        let config = self.config.clone();
        let client = block_on_timeout(&runtime, async move {
            let tcp = TcpStream::connect(config.get_addr())
                .await
                .map_err(|e| CatalogError::connection(e.to_string()))?;
            tcp.set_nodelay(true)
                .map_err(|e| CatalogError::connection(e.to_string()))?;
            Client::connect(config, tcp.compat_write())
                .await
                .map_err(|e| CatalogError::connection(e.to_string()))
        })?;

        debug!("opened catalog connection");
        Ok(MssqlConnection { runtime, client })
    }
}

pub struct MssqlConnection {
    runtime: Runtime,
    client: Client<Compat<TcpStream>>,
}

impl MssqlConnection {
    fn execute_batch(&mut self, sql: &str) -> Result<()> {
        let client = &mut self.client;
        block_on_timeout(&self.runtime, async move {
            client
                .simple_query(sql)
                .await
                .map_err(query_error)?
                .into_results()
                .await
                .map_err(query_error)?;
            Ok(())
        })
    }
}

impl CatalogConnection for MssqlConnection {
    fn query(&mut self, sql: &str) -> Result<Vec<CatalogRow>> {
        let client = &mut self.client;
        let rows = block_on_timeout(&self.runtime, async move {
            client
                .simple_query(sql)
                .await
                .map_err(query_error)?
                .into_first_result()
                .await
                .map_err(query_error)
        })?;
        Ok(rows.into_iter().map(catalog_row).collect())
    }

    fn begin_transaction(&mut self) -> Result<()> {
        self.execute_batch("BEGIN TRANSACTION")
    }

    fn rollback(&mut self) -> Result<()> {
        self.execute_batch("IF @@TRANCOUNT > 0 ROLLBACK TRANSACTION")
    }

    fn describe_execution(&mut self, sql: &str) -> Result<Vec<ResultColumnDescriptor>> {
        let client = &mut self.client;
        block_on_timeout(&self.runtime, async move {
            let mut stream = client.simple_query(sql).await.map_err(query_error)?;
            let columns: Vec<ResultColumnDescriptor> = stream
                .columns()
                .await
                .map_err(query_error)?
                .unwrap_or_default()
                .iter()
                .map(|column| {
                    // tiberius does not report nullability for ad-hoc results
                    ResultColumnDescriptor::new(
                        column.name(),
                        type_name(column.column_type()),
                        true,
                    )
                })
                .collect();
            stream.into_results().await.map_err(query_error)?;
            Ok(columns)
        })
    }
}

fn block_on_timeout<T, F>(runtime: &Runtime, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    runtime.block_on(async {
        tokio::time::timeout(CALL_TIMEOUT, future)
            .await
            .map_err(|_| CatalogError::Timeout {
                seconds: CALL_TIMEOUT.as_secs(),
            })?
    })
}

fn query_error(error: tiberius::error::Error) -> CatalogError {
    CatalogError::query(error.to_string())
}

fn catalog_row(row: Row) -> CatalogRow {
    let names: Vec<String> = row
        .columns()
        .iter()
        .map(|column| column.name().to_string())
        .collect();

    let mut out = CatalogRow::new();
    for (name, data) in names.into_iter().zip(row) {
        out.push(name, catalog_value(data));
    }
    out
}

fn catalog_value(data: ColumnData<'static>) -> CatalogValue {
    match data {
        ColumnData::U8(value) => value.map(i64::from).into(),
        ColumnData::I16(value) => value.map(i64::from).into(),
        ColumnData::I32(value) => value.map(i64::from).into(),
        ColumnData::I64(value) => value.into(),
        ColumnData::Bit(value) => value.into(),
        ColumnData::String(value) => value.map(|s| s.into_owned()).into(),
        _ => CatalogValue::Null,
    }
}

/// Best-effort SQL type name for a wire-level column type.
fn type_name(column_type: ColumnType) -> &'static str {
    match column_type {
        ColumnType::Bit | ColumnType::Bitn => "bit",
        ColumnType::Int1 => "tinyint",
        ColumnType::Int2 => "smallint",
        ColumnType::Int4 | ColumnType::Intn => "int",
        ColumnType::Int8 => "bigint",
        ColumnType::Float4 => "real",
        ColumnType::Float8 | ColumnType::Floatn => "float",
        ColumnType::Money | ColumnType::Money4 => "money",
        ColumnType::Datetime | ColumnType::Datetimen => "datetime",
        ColumnType::Datetime4 => "smalldatetime",
        ColumnType::Datetime2 => "datetime2",
        ColumnType::DatetimeOffsetn => "datetimeoffset",
        ColumnType::Daten => "date",
        ColumnType::Timen => "time",
        ColumnType::Guid => "uniqueidentifier",
        ColumnType::Decimaln => "decimal",
        ColumnType::Numericn => "numeric",
        ColumnType::BigVarBin => "varbinary",
        ColumnType::BigBinary => "binary",
        ColumnType::BigVarChar => "varchar",
        ColumnType::BigChar => "char",
        ColumnType::NVarchar => "nvarchar",
        ColumnType::NChar => "nchar",
        ColumnType::Xml => "xml",
        ColumnType::Text => "text",
        ColumnType::NText => "ntext",
        ColumnType::Image => "image",
        _ => "sql_variant",
    }
}
