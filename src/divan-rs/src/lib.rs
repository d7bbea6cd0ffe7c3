//! Divan Client Library
//!
//! Typed access to a document database's HTTP API: database lifecycle,
//! document CRUD with revision-based optimistic concurrency, and view queries.

mod admin;
mod client;
mod document;
mod transport;
mod view;

pub use admin::{create_database, delete_database, list_databases};
pub use client::Connector;
pub use divan_core::{
    make_database_url, make_server_url, AllDocsRow, Config, DatabaseInfo, JsonMap, UrlError,
    DEFAULT_HOST, DEFAULT_PORT,
};
pub use document::{Document, DocumentRef, Typed};
pub use transport::{default_transport, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
pub use view::{ResultRow, ReturnMode, ViewResult};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Url(#[from] UrlError),

    #[error("{0} does not exist")]
    NotFound(String),

    #[error("Cannot save updated document: revision conflict")]
    RevisionConflict { status: u16 },

    #[error("Database '{0}' already exists")]
    AlreadyExists(String),

    #[error("View document '{0}' does not exist")]
    ViewNotFound(String),

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unexpected response from server: {status} {message}")]
    UnexpectedResponse { status: u16, message: String },

    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),
}

impl ClientError {
    /// HTTP status behind this error, when the server produced one
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::NotFound(_) => Some(404),
            ClientError::RevisionConflict { status } => Some(*status),
            ClientError::AlreadyExists(_) => Some(409),
            ClientError::ViewNotFound(_) => Some(500),
            ClientError::UnexpectedResponse { status, .. } => Some(*status),
            ClientError::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, ClientError::RevisionConflict { .. })
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
