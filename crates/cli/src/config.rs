//! Configuration management for the CLI

use anyhow::{Context, Result};
use gyoka_client::{AuthConfig, ClientOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// CLI configuration
///
/// Read from `~/.config/gyoka/config.json`, then overridden by `GYOKA_*`
/// environment variables (`GYOKA_TOKEN`, `GYOKA_MAX_RETRIES`, ...).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// API endpoint URL
    pub base_url: Option<String>,
    /// Bearer token
    pub token: Option<String>,
    /// Cloudflare Access service token id
    pub cf_client_id: Option<String>,
    /// Cloudflare Access service token secret
    pub cf_client_secret: Option<String>,
    pub basic_user: Option<String>,
    pub basic_password: Option<String>,
    pub timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
    pub retry_wait_ms: Option<u64>,
}

impl Config {
    /// Load configuration from the default file and the environment
    pub fn load() -> Result<Self> {
        let path = Self::config_path().ok();
        Self::load_from(path.as_deref())
    }

    /// Load configuration from `path` (if it exists) and the environment
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, config::Environment::with_prefix("GYOKA"))
    }

    /// Load configuration from `path`, overridden by the `env` source
    fn load_with_env(path: Option<&Path>, env: config::Environment) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Json)
                    .required(false),
            );
        }

        let settings = builder
            .add_source(env)
            .build()
            .context("Failed to read configuration")?;

        settings
            .try_deserialize()
            .context("Failed to parse configuration")
    }

    /// Translate into client options.
    ///
    /// Auth modes are offered in the order token, Cloudflare Access, basic
    /// auth; the client keeps the first one.
    pub fn client_options(&self) -> ClientOptions {
        let mut options = ClientOptions::default();

        if let Some(secs) = self.timeout_secs {
            options.timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = self.max_retries {
            options.max_retries = retries;
        }
        if let Some(ms) = self.retry_wait_ms {
            options.retry_wait_time = Duration::from_millis(ms);
        }

        if let Some(token) = &self.token {
            options.set_auth(AuthConfig::BearerToken {
                token: token.clone(),
            });
        }
        if self.cf_client_id.is_some() || self.cf_client_secret.is_some() {
            options.set_auth(AuthConfig::CloudflareAccess {
                client_id: self.cf_client_id.clone().unwrap_or_default(),
                client_secret: self.cf_client_secret.clone().unwrap_or_default(),
            });
        }
        if let Some(username) = &self.basic_user {
            options.set_auth(AuthConfig::BasicAuth {
                username: username.clone(),
                password: self.basic_password.clone().unwrap_or_default(),
            });
        }

        options
    }

    /// Get the configuration file path
    fn config_path() -> Result<PathBuf> {
        let home = dirs_next::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".config").join("gyoka").join("config.json"))
    }
}
