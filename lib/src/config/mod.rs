use std::{env, path::PathBuf};

use config::{ConfigError, Environment, File};
use serde::{de::DeserializeOwned, Deserialize};
use url::Url;

use self::sensei::SenseiConfig;

mod sensei;

pub fn load() -> Result<Config, ConfigError> {
    load_config()
}

pub fn load_database_config() -> Result<Database, ConfigError> {
    Ok(load_config::<DatabaseConfig>()?.database)
}

pub fn load_config<T: DeserializeOwned>() -> Result<T, ConfigError> {
    let path = env::var("CONFIG_PATH").unwrap_or("config.toml".to_owned());
    config::Config::builder()
        .add_source(File::with_name(&path))
        .add_source(Environment::default().separator("__"))
        .build()?
        .try_deserialize()
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub jwt_secret: String,
    pub database: Database,
    pub redis: Redis,
    pub storage: Storage,
    pub gemini: Gemini,
    pub telegram: Telegram,
    pub sentry: Option<Sentry>,
    pub sensei: SenseiConfig,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseConfig {
    pub database: Database,
}

#[derive(Debug, Deserialize)]
pub struct Database {
    pub url: Url,
    pub connect_timeout: u64,
}

#[derive(Debug, Deserialize)]
pub struct Redis {
    pub auth: Url,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
    pub root: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct Gemini {
    /// Base url of the generative language API. Must end with a slash.
    pub api_url: Url,
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Deserialize)]
pub struct Telegram {
    /// Base url of the Telegram Bot API. Must end with a slash.
    pub api_url: Url,
    pub bot_token: String,
    /// Chat that receives operational alerts (student escalations).
    pub operations_chat_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct Sentry {
    pub dsn: Url,
}
