//! SAP HANA connector built on the `hdbconnect_async` driver.

use async_trait::async_trait;
use hdbconnect_async::{ConnectParamsBuilder, Connection, HdbValue, ServerCerts};
use tracing::{debug, info};

use super::{ColumnEntry, Connector, QueryResult, TableEntry, ensure_select, escape_literal};
use crate::config::HanaConfig;
use crate::{Result, ServerError};

const PING_QUERY: &str = "SELECT 1 FROM DUMMY";

const LIST_TABLES_QUERY: &str =
    "SELECT TABLE_NAME, TABLE_TYPE FROM SYS.TABLES ORDER BY TABLE_NAME";

const LIST_COLUMNS_TEMPLATE: &str = "SELECT COLUMN_NAME, DATA_TYPE_NAME, IS_NULLABLE \
     FROM SYS.TABLE_COLUMNS WHERE TABLE_NAME = '{TABLE}' ORDER BY POSITION";

const SQL_TRUE: &str = "TRUE";

pub struct HanaConnector {
    config: HanaConfig,
    connection: Option<Connection>,
}

impl HanaConnector {
    #[inline]
    pub fn new(config: HanaConfig) -> Self {
        Self {
            config,
            connection: None,
        }
    }

    fn connection(&self) -> Result<&Connection> {
        self.connection
            .as_ref()
            .ok_or_else(|| ServerError::Connection("No open HANA connection".to_string()))
    }

    async fn query(&self, sql: &str) -> Result<QueryResult> {
        let conn = self.connection()?;
        debug!("Executing HANA statement: {}", sql);

        let result_set = conn
            .query(sql)
            .await
            .map_err(|e| ServerError::Query(e.to_string()))?;

        let metadata = result_set.metadata().clone();
        let columns: Vec<String> = metadata
            .iter()
            .map(|col| col.columnname().to_string())
            .collect();

        let raw_rows = result_set
            .into_rows()
            .await
            .map_err(|e| ServerError::Query(e.to_string()))?;

        let rows: Vec<Vec<Option<String>>> = raw_rows
            .into_iter()
            .map(|row| row.into_iter().map(value_to_cell).collect())
            .collect();

        Ok(QueryResult { columns, rows })
    }
}

#[async_trait]
impl Connector for HanaConnector {
    async fn connect(&mut self) -> Result<()> {
        let mut builder = ConnectParamsBuilder::new();
        builder
            .hostname(&self.config.host)
            .port(self.config.port)
            .dbuser(&self.config.user)
            .password(&self.config.password);

        if let Some(database_name) = &self.config.database_name {
            builder.dbname(database_name);
        }

        if self.config.encrypt {
            if self.config.ssl_validate_certificate {
                builder.tls_with(ServerCerts::RootCertificates);
            } else {
                builder.tls_without_server_verification();
            }
        }

        let connection = Connection::new(builder)
            .await
            .map_err(|e| ServerError::Connection(e.to_string()))?;

        info!(
            "Connected to HANA at {}:{}",
            self.config.host, self.config.port
        );
        self.connection = Some(connection);
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        // The driver closes the session on drop.
        if self.connection.take().is_some() {
            info!("Closed HANA connection");
        }
        Ok(())
    }

    async fn ping(&mut self) -> Result<()> {
        let conn = self.connection()?;
        conn.query(PING_QUERY)
            .await
            .map_err(|e| ServerError::Connection(e.to_string()))?;
        Ok(())
    }

    async fn list_tables(&mut self) -> Result<Vec<TableEntry>> {
        let result = self.query(LIST_TABLES_QUERY).await?;

        Ok(result
            .rows
            .into_iter()
            .filter_map(|mut row| {
                let name = row.first_mut().and_then(Option::take)?;
                let table_type = row.get_mut(1).and_then(Option::take)?;
                Some(TableEntry { name, table_type })
            })
            .collect())
    }

    async fn list_columns(&mut self, table: &str) -> Result<Vec<ColumnEntry>> {
        let sql = LIST_COLUMNS_TEMPLATE.replace("{TABLE}", &escape_literal(table));
        let result = self.query(&sql).await?;

        Ok(result
            .rows
            .into_iter()
            .filter_map(|mut row| {
                let name = row.first_mut().and_then(Option::take)?;
                let data_type = row.get_mut(1).and_then(Option::take)?;
                let nullable = row.get_mut(2).and_then(Option::take)?;
                Some(ColumnEntry {
                    name,
                    data_type,
                    nullable: nullable == SQL_TRUE,
                })
            })
            .collect())
    }

    async fn run_query(&mut self, sql: &str) -> Result<QueryResult> {
        ensure_select(sql)?;
        self.query(sql).await
    }
}

fn value_to_cell(value: HdbValue<'static>) -> Option<String> {
    match value {
        HdbValue::NULL => None,
        HdbValue::STRING(s) => Some(s),
        other => Some(other.to_string()),
    }
}
