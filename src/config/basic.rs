use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};

const DEFAULT_PORT: u16 = 8188;

/// Server and storage essentials (`[basic]` in config.toml).
///
/// Missing keys fall back to [`BasicConfig::default`].
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BasicConfig {
    /// Interface the HTTP API binds to. Default: `0.0.0.0`.
    pub listen_addr: IpAddr,

    /// Default: `8188`.
    pub listen_port: u16,

    /// SQLite database URL; the file is created on first start.
    /// Default: `sqlite://opsdesk.db`.
    pub database_url: String,

    /// Fallback tracing filter when `RUST_LOG` is unset. Default: `info`.
    pub loglevel: String,
}

impl Default for BasicConfig {
    fn default() -> Self {
        Self {
            listen_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            listen_port: DEFAULT_PORT,
            database_url: "sqlite://opsdesk.db".to_string(),
            loglevel: "info".to_string(),
        }
    }
}
