// ============================
// huddle-backend-lib/src/config.rs
// ============================
//! Configuration management.
use std::net::SocketAddr;
use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Origins allowed to open cross-origin connections. Empty or `["*"]`
    /// means any origin.
    pub allowed_origins: Vec<String>,
    /// Log level used when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5174".parse().unwrap(),
            allowed_origins: Vec::new(),
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from the default config file location plus environment.
    pub fn load() -> Result<Self, AppError> {
        Self::load_from("config/default.toml")
    }

    /// Load settings layered as defaults ← TOML file ← `HUDDLE_` env vars.
    /// A missing file is fine; the defaults and environment still apply.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, AppError> {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("HUDDLE_"))
            .extract()
            .map_err(|e| AppError::Config(e.to_string()))
    }

    /// Whether CORS should allow any origin.
    pub fn cors_permissive(&self) -> bool {
        self.allowed_origins.is_empty() || self.allowed_origins.iter().any(|o| o == "*")
    }
}
