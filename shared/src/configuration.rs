use figment::providers::Env;
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_table_name() -> String {
    "names".to_string()
}

fn default_discovery_timeout_secs() -> u64 {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Configuration {
    pub endpoint: String,
    pub database: String,
    #[serde(default = "default_table_name")]
    pub table_name: String,
    #[serde(default = "default_discovery_timeout_secs")]
    pub discovery_timeout_secs: u64,
}

impl Configuration {
    /// Reads the function's environment. Fails when `endpoint` or `database` is unset.
    pub fn load() -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Env::raw().only(&[
                "endpoint",
                "database",
                "table_name",
                "discovery_timeout_secs",
            ]))
            .extract()
    }

    /// Document API address of the database: the endpoint followed by the database path.
    pub fn store_url(&self) -> String {
        format!(
            "{}/{}",
            self.endpoint.trim_end_matches('/'),
            self.database.trim_start_matches('/')
        )
    }

    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_secs(self.discovery_timeout_secs)
    }
}
