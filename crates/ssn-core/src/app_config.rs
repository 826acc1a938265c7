use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// JSON export of the service directory. Data routes answer 503 without it.
    pub directory_path: Option<PathBuf>,
    /// Base URL of the directory API consumed by the query client.
    pub api_base_url: String,
    pub postcode_api_url: String,
    pub query_timeout_secs: u64,
    pub cache_capacity: usize,
    pub cache_ttl_secs: u64,
    /// Overrides the bundled category taxonomy when set.
    pub categories_path: Option<PathBuf>,
    /// Overrides the bundled known-location list when set.
    pub locations_path: Option<PathBuf>,
}
