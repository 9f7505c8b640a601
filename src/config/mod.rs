mod basic;
mod services;

pub use basic::BasicConfig;
pub use services::{FunctionsConfig, RealtimeConfig, StorageConfig};

use figment::{
    Figment,
    providers::{Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, sync::LazyLock};

/// Application configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Core server configuration (see `basic` table in config.toml).
    #[serde(default)]
    pub basic: BasicConfig,

    /// Remote function endpoint settings (see `functions` table in config.toml).
    #[serde(default)]
    pub functions: FunctionsConfig,

    /// Object storage settings (see `storage` table in config.toml).
    #[serde(default)]
    pub storage: StorageConfig,

    /// Change feed settings (see `realtime` table in config.toml).
    #[serde(default)]
    pub realtime: RealtimeConfig,
}

const DEFAULT_CONFIG_FILE: &str = "config.toml";

impl Config {
    /// Builds a Figment that merges defaults and a config TOML file.
    pub fn figment() -> Figment {
        let figment = Figment::new().merge(Serialized::defaults(Config::default()));
        if PathBuf::from(DEFAULT_CONFIG_FILE).is_file() {
            figment.merge(Toml::file(DEFAULT_CONFIG_FILE))
        } else {
            figment
        }
    }

    /// Loads configuration by merging defaults and `config.toml` if present.
    pub fn from_optional_toml() -> Self {
        Self::figment().extract().unwrap_or_else(|err| {
            panic!("failed to extract configuration (defaults + optional config.toml): {err}")
        })
    }
}

/// Global, lazily-initialized configuration instance.
pub static CONFIG: LazyLock<Config> = LazyLock::new(Config::from_optional_toml);

#[cfg(test)]
mod tests {
    use super::*;
    use figment::providers::{Format, Toml};

    #[test]
    fn toml_overrides_merge_onto_defaults() {
        let cfg: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::string(
                r#"
                [basic]
                listen_port = 9000

                [functions]
                configurator_pipelines = ["Vesuviano", "Napoli"]

                [realtime]
                subscription_queue = 8
                "#,
            ))
            .extract()
            .expect("config should extract");

        assert_eq!(cfg.basic.listen_port, 9000);
        assert_eq!(cfg.basic.database_url, "sqlite://opsdesk.db");
        assert_eq!(
            cfg.functions.configurator_pipelines,
            vec!["Vesuviano".to_string(), "Napoli".to_string()]
        );
        assert_eq!(cfg.realtime.subscription_queue, 8);
        assert_eq!(cfg.realtime.feed_capacity, 1024);
    }
}
