use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use config::builder::DefaultState;
use serde::Deserialize;
use std::env;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub environment: String,
    pub server: ServerConfig,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        Self::defaults("development")?
            // Add in settings from the config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // E.g., `APP_SERVER__PORT=5001` would set `Settings.server.port`
            .add_source(Self::environment())
            .build()?
            .try_deserialize()
    }

    pub fn new_for_test() -> Result<Self, ConfigError> {
        Self::defaults("test")?
            .set_override("server.port", 0)?
            .set_override("server.workers", 1)?
            .build()?
            .try_deserialize()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    fn defaults(environment: &str) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("environment", environment)?
            .set_default("server.host", DEFAULT_HOST)?
            .set_default("server.port", DEFAULT_PORT as i64)?
            .set_default("server.workers", num_cpus::get() as i64)
    }

    fn environment() -> Environment {
        // `APP_SERVER__PORT`: single underscore after the prefix, double between keys
        Environment::with_prefix("app")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }
}
