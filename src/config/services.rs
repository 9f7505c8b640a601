use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

/// Remote (server-side) function endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FunctionsConfig {
    /// Base URL; functions are invoked as `POST {base_url}/{name}`.
    /// TOML: `functions.base_url`. Default: `http://127.0.0.1:54321/functions/v1/`.
    #[serde(default = "default_functions_url")]
    pub base_url: Url,

    /// Optional bearer key sent with every invocation.
    /// TOML: `functions.api_key`.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Request timeout in seconds. No retries are attempted.
    /// TOML: `functions.timeout_secs`. Default: `30`.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Lead pipelines that are synced to the external configurator on creation.
    /// TOML: `functions.configurator_pipelines`. Default: `["Vesuviano"]`.
    #[serde(default = "default_configurator_pipelines")]
    pub configurator_pipelines: Vec<String>,
}

impl FunctionsConfig {
    pub fn syncs_pipeline(&self, pipeline: &str) -> bool {
        self.configurator_pipelines
            .iter()
            .any(|p| p.eq_ignore_ascii_case(pipeline.trim()))
    }
}

impl Default for FunctionsConfig {
    fn default() -> Self {
        Self {
            base_url: default_functions_url(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
            configurator_pipelines: default_configurator_pipelines(),
        }
    }
}

/// Local object storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Directory holding uploaded blobs.
    /// TOML: `storage.root`. Default: `data/storage`.
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,

    /// Base used to build retrievable URLs for stored objects.
    /// TOML: `storage.public_base_url`. Default: `http://127.0.0.1:8188/storage/`.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: Url,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
            public_base_url: default_public_base_url(),
        }
    }
}

/// Change feed configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RealtimeConfig {
    /// Broadcast buffer shared by all subscribers; slow subscribers lag past it.
    /// TOML: `realtime.feed_capacity`. Default: `1024`.
    #[serde(default = "default_feed_capacity")]
    pub feed_capacity: usize,

    /// Bounded per-subscription callback queue.
    /// TOML: `realtime.subscription_queue`. Default: `256`.
    #[serde(default = "default_subscription_queue")]
    pub subscription_queue: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            feed_capacity: default_feed_capacity(),
            subscription_queue: default_subscription_queue(),
        }
    }
}

fn default_functions_url() -> Url {
    Url::parse("http://127.0.0.1:54321/functions/v1/").expect("invalid default functions url")
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_configurator_pipelines() -> Vec<String> {
    vec!["Vesuviano".to_string()]
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("data/storage")
}

fn default_public_base_url() -> Url {
    Url::parse("http://127.0.0.1:8188/storage/").expect("invalid default storage url")
}

fn default_feed_capacity() -> usize {
    1024
}

fn default_subscription_queue() -> usize {
    256
}
