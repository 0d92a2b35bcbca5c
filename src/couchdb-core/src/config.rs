use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Server base URL. Credentials embedded in the URL are used for basic auth.
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub insecure_skip_verify: bool,

    // Applies to every request except the continuous change feed
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default)]
    pub changes: ChangesConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_url() -> String {
    "http://127.0.0.1:5984".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChangesConfig {
    /// Keep-alive interval requested from the server, in milliseconds
    #[serde(default = "default_heartbeat_ms")]
    pub heartbeat_ms: u64,
    #[serde(default)]
    pub include_docs: bool,
}

fn default_heartbeat_ms() -> u64 {
    10_000
}

impl Default for ChangesConfig {
    fn default() -> Self {
        Self {
            heartbeat_ms: default_heartbeat_ms(),
            include_docs: false,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Directory for rolling JSON log files; console only when unset
    #[serde(default)]
    pub dir: Option<String>,
    /// `EnvFilter` directive used when `RUST_LOG` is not set
    #[serde(default)]
    pub filter: Option<String>,
}

impl Config {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: default_url(),
            username: None,
            password: None,
            insecure_skip_verify: false,
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            changes: ChangesConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
