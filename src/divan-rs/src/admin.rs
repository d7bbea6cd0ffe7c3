//! Server-level database management
//!
//! These run before any [`Connector`] exists and share URL validation with it.

use std::sync::Arc;

use divan_core::url;

use crate::client::{unexpected, Connector};
use crate::transport::{HttpRequest, HttpTransport};
use crate::{ClientError, Result};

/// Create database `name` and return a connector bound to it
#[tracing::instrument(skip(transport))]
pub async fn create_database(
    transport: &Arc<dyn HttpTransport>,
    name: &str,
    host: &str,
    port: i64,
) -> Result<Connector> {
    let db_url = url::make_database_url(name, host, port)?;
    tracing::debug!(url = %db_url, "Creating database");
    let response = transport.send(HttpRequest::put(&db_url)).await?;

    match response.status {
        201 => {
            tracing::info!(db = name, "Database created");
            Ok(Connector::from_url(db_url, transport.clone()))
        }
        409 => Err(ClientError::AlreadyExists(name.to_string())),
        _ => Err(unexpected(&response)),
    }
}

/// Delete database `name`. A missing database is an error here.
#[tracing::instrument(skip(transport))]
pub async fn delete_database(
    transport: &Arc<dyn HttpTransport>,
    name: &str,
    host: &str,
    port: i64,
) -> Result<bool> {
    let db_url = url::make_database_url(name, host, port)?;
    tracing::debug!(url = %db_url, "Deleting database");
    let response = transport.send(HttpRequest::delete(&db_url)).await?;

    match response.status {
        202 => {
            tracing::info!(db = name, "Database deleted");
            Ok(true)
        }
        404 => Err(ClientError::NotFound(format!("Database '{}'", name))),
        _ => Err(unexpected(&response)),
    }
}

/// Names of all databases on a server
#[tracing::instrument(skip(transport))]
pub async fn list_databases(
    transport: &Arc<dyn HttpTransport>,
    host: &str,
    port: i64,
) -> Result<Vec<String>> {
    let list_url = format!("{}/_all_dbs", url::make_server_url(host, port)?);
    let response = transport.send(HttpRequest::get(list_url)).await?;

    if !response.is_success() {
        return Err(unexpected(&response));
    }

    response.json()
}
