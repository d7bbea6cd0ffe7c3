use serde::{Deserialize, Serialize};

use crate::url::{self, UrlError, DEFAULT_HOST};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: String,
    pub database: String,

    /// Whole-request timeout applied by the HTTP transport
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub insecure_skip_verify: bool,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> String {
    url::DEFAULT_PORT.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Config {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            ..Self::default()
        }
    }

    pub fn load(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        Ok(config)
    }

    pub fn port(&self) -> Result<u16, UrlError> {
        url::parse_port(&self.port)
    }

    pub fn server_url(&self) -> Result<String, UrlError> {
        url::make_server_url(&self.host, self.port()? as i64)
    }

    pub fn database_url(&self) -> Result<String, UrlError> {
        url::make_database_url(&self.database, &self.host, self.port()? as i64)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database: String::new(),
            timeout_secs: default_timeout_secs(),
            insecure_skip_verify: false,
        }
    }
}
