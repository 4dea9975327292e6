use serde::Deserialize;
use url::Url;

#[derive(Debug, Deserialize)]
pub struct SenseiConfig {
    pub host: String,
    pub port: u16,
    pub server: Url,
}
