use bigwing_shared::Masked;
use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub stream: StreamConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Allowed CORS origins. Empty refuses every cross-origin request.
    #[serde(default)]
    pub cors_whitelist: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default)]
    pub run_migrations: bool,
}

fn default_max_connections() -> u32 { 5 }

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: Masked<String>,
    #[serde(default = "default_audience")]
    pub audience: String,
}

fn default_audience() -> String { "authenticated".to_string() }

#[derive(Debug, Deserialize, Clone)]
pub struct StreamConfig {
    pub poll_interval_seconds: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self { poll_interval_seconds: 5 }
    }
}

impl StreamConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds.max(1))
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Untracked developer overrides
            .add_source(config::File::with_name("config/local").required(false))
            // BIGWING__DATABASE__URL=... sets database.url
            .add_source(
                config::Environment::with_prefix("BIGWING")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors_whitelist")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    pub fn from_toml(contents: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(contents, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}
