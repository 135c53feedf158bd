use config::{Config, ConfigError, Environment, File, FileFormat};

const ENV_PREFIX: &str = "COFFER";

fn load<T: serde::de::DeserializeOwned>(config_path: &str) -> Result<T, ConfigError> {
    let builder = Config::builder()
        .add_source(File::new(config_path, FileFormat::Toml))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

    builder.build()?.try_deserialize()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

#[derive(Clone, Debug, serde::Deserialize)]
pub struct CofferServerConfig {
    pub http: HttpConfig,
    pub persistence: PersistenceConfig,
    #[serde(default)]
    pub metrics: Option<MetricsPushConfig>,
    #[serde(default)]
    pub debug: bool,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
}

impl CofferServerConfig {
    pub fn from_file(config_path: &str) -> Result<Self, ConfigError> {
        load(config_path)
    }
}

#[derive(Clone, Debug, serde::Deserialize)]
pub struct CofferClientConfig {
    pub http: HttpConfig,
    pub tasks: u32,
    pub create_chance: u32,
    pub deposit_chance: u32,
    pub withdraw_chance: u32,
    #[serde(default = "default_pause_ms")]
    pub pause_ms: u64,
    #[serde(default)]
    pub debug: bool,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
}

fn default_pause_ms() -> u64 {
    50
}

impl CofferClientConfig {
    pub fn from_file(config_path: &str) -> Result<Self, ConfigError> {
        load(config_path)
    }
}

#[derive(Clone, Debug, serde::Deserialize)]
pub struct HttpConfig {
    pub address: String,
    pub port: u16,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Sqlite,
    Memory,
}

#[derive(Clone, Debug, serde::Deserialize)]
pub struct PersistenceConfig {
    pub backend: StoreBackend,
    #[serde(default = "default_db_path")]
    pub db_path: String,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_db_path() -> String {
    "coffer.db".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

#[derive(Clone, Debug, serde::Deserialize)]
pub struct MetricsPushConfig {
    pub remote_write_url: String,
    pub push_interval_seconds: u64,
}
