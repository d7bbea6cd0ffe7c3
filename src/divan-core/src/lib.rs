//! Divan Core Library
//!
//! I/O-free building blocks shared by the Divan client:
//! - Database URL construction and validation
//! - Wire models for server responses
//! - Client configuration

pub mod config;
pub mod models;
pub mod url;

// Re-export commonly used types
pub use config::Config;
pub use models::*;
pub use url::{make_database_url, make_server_url, UrlError, DEFAULT_HOST, DEFAULT_PORT};
