//! Configuration management for the Kurier webhook relay.

use std::{net::SocketAddr, str::FromStr, time::Duration};

use anyhow::{Context, Result};
use axum::http::Uri;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use kurier_core::OriginPolicy;
use kurier_delivery::ClientConfig;
use serde::{Deserialize, Deserializer, Serialize};

use crate::state::RelaySettings;

const CONFIG_FILE: &str = "config.toml";

/// Legacy variable name the webhook URL is also read from.
const DISCORD_WEBHOOK_URL_ENV: &str = "DISCORD_WEBHOOK_URL";

/// Paths owned by the health routes.
const RESERVED_PATHS: [&str; 3] = ["/health", "/ready", "/live"];

/// Complete service configuration with defaults, file, and environment
/// overrides.
///
/// Configuration is loaded in priority order:
/// 1. Environment variables (highest priority)
/// 2. Configuration file (`config.toml`)
/// 3. Built-in defaults (lowest priority)
///
/// Only the webhook URL has no usable default. The service still starts
/// without it, and relay requests fail with a configuration error until it
/// is set.
///
/// # Example
///
/// ```no_run
/// use kurier_api::Config;
///
/// let config = Config::load().expect("Failed to load configuration");
///
/// println!("Relay listens on {}:{}{}", config.host, config.port, config.relay_path);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server
    /// Server bind address.
    ///
    /// Environment variable: `HOST`
    #[serde(default = "default_host")]
    pub host: String,
    /// Server bind port.
    ///
    /// Environment variable: `PORT`
    #[serde(default = "default_port")]
    pub port: u16,
    /// Path the relay handler is mounted on.
    ///
    /// Environment variable: `RELAY_PATH`
    #[serde(default = "default_relay_path")]
    pub relay_path: String,
    /// Inbound request timeout in seconds.
    ///
    /// Environment variable: `REQUEST_TIMEOUT`
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    // Relay
    /// Downstream chat webhook URL.
    ///
    /// Environment variables: `WEBHOOK_URL`, or `DISCORD_WEBHOOK_URL`
    #[serde(default)]
    pub webhook_url: Option<String>,
    /// Browser origins allowed to submit messages. Empty allows any origin.
    ///
    /// Environment variable: `ALLOWED_ORIGINS` (comma-separated)
    #[serde(default, deserialize_with = "deserialize_origin_list")]
    pub allowed_origins: Vec<String>,

    // Client
    /// Downstream request timeout in seconds.
    ///
    /// Environment variable: `DELIVERY_TIMEOUT_SECONDS`
    #[serde(default = "default_delivery_timeout")]
    pub delivery_timeout_seconds: u64,

    // Logging
    /// Log filter directives.
    ///
    /// Environment variable: `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub rust_log: String,
}

impl Config {
    /// Load configuration from defaults, config file, and environment variable
    /// overrides.
    ///
    /// `WEBHOOK_URL` takes precedence over `DISCORD_WEBHOOK_URL` when both
    /// are set.
    pub fn load() -> Result<Self> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::raw().only(&[DISCORD_WEBHOOK_URL_ENV]).map(|_| "webhook_url".into()))
            .merge(Env::prefixed(""));

        let config: Self = figment.extract().context("Failed to load configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Convert to the delivery client configuration.
    pub fn to_client_config(&self) -> ClientConfig {
        ClientConfig {
            timeout: Duration::from_secs(self.delivery_timeout_seconds),
            ..ClientConfig::default()
        }
    }

    /// Convert to the settings the relay route reads.
    pub fn relay_settings(&self) -> RelaySettings {
        RelaySettings {
            relay_path: self.relay_path.clone(),
            webhook_url: self.webhook_url().map(str::to_string),
            origin_policy: self.origin_policy(),
            request_timeout: Duration::from_secs(self.request_timeout),
        }
    }

    /// Build the origin policy from the configured allow-list.
    pub fn origin_policy(&self) -> OriginPolicy {
        OriginPolicy::from_origins(&self.allowed_origins)
    }

    /// Returns the webhook URL when it is set and not blank.
    pub fn webhook_url(&self) -> Option<&str> {
        self.webhook_url.as_deref().map(str::trim).filter(|url| !url.is_empty())
    }

    /// Parse server socket address from host and port configuration.
    pub fn parse_server_addr(&self) -> Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.host, self.port);
        SocketAddr::from_str(&addr_str).context("Invalid server address")
    }

    /// Get the webhook URL with its final path segment masked for logging.
    ///
    /// Chat webhook URLs carry their secret token in the last segment.
    pub fn webhook_url_masked(&self) -> Option<String> {
        let url = self.webhook_url()?.trim_end_matches('/');
        let path_start = url.find("://").map_or(0, |scheme_end| scheme_end + 3);

        match url[path_start..].rfind('/') {
            Some(slash) => Some(format!("{}/***", &url[..path_start + slash])),
            None => Some(url.to_string()),
        }
    }

    /// Validate configuration values.
    fn validate(&self) -> Result<()> {
        if self.port == 0 {
            anyhow::bail!("port must be greater than 0");
        }

        if self.request_timeout == 0 {
            anyhow::bail!("request_timeout must be greater than 0");
        }

        if self.delivery_timeout_seconds == 0 {
            anyhow::bail!("delivery_timeout_seconds must be greater than 0");
        }

        if self.delivery_timeout_seconds >= self.request_timeout {
            anyhow::bail!("delivery_timeout_seconds must be less than request_timeout");
        }

        if !self.relay_path.starts_with('/') {
            anyhow::bail!("relay_path must start with '/'");
        }

        if RESERVED_PATHS.contains(&self.relay_path.as_str()) {
            anyhow::bail!("relay_path {} is reserved for health checks", self.relay_path);
        }

        if self.allowed_origins.iter().any(|origin| origin.trim().is_empty()) {
            anyhow::bail!("allowed_origins must not contain blank entries");
        }

        if let Some(url) = self.webhook_url() {
            validate_webhook_url(url)?;
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            relay_path: default_relay_path(),
            request_timeout: default_request_timeout(),
            webhook_url: None,
            allowed_origins: Vec::new(),
            delivery_timeout_seconds: default_delivery_timeout(),
            rust_log: default_log_level(),
        }
    }
}

fn validate_webhook_url(url: &str) -> Result<()> {
    let uri: Uri = url.parse().context("webhook_url is not a valid URL")?;

    match uri.scheme_str() {
        Some("http" | "https") => {},
        _ => anyhow::bail!("webhook_url must use http or https"),
    }

    if uri.host().is_none() {
        anyhow::bail!("webhook_url must include a host");
    }

    Ok(())
}

/// Accepts either a list or a comma-separated string.
fn deserialize_origin_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OriginList {
        Joined(String),
        List(Vec<String>),
    }

    Ok(match OriginList::deserialize(deserializer)? {
        OriginList::Joined(joined) => joined
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect(),
        OriginList::List(list) => list,
    })
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_relay_path() -> String {
    crate::DEFAULT_RELAY_PATH.to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_delivery_timeout() -> u64 {
    kurier_delivery::DEFAULT_TIMEOUT_SECONDS
}

fn default_log_level() -> String {
    "info,kurier=debug,tower_http=debug".to_string()
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, env, sync::Mutex};

    use super::*;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const CONFIG_VARS: [&str; 9] = [
        "HOST",
        "PORT",
        "RELAY_PATH",
        "REQUEST_TIMEOUT",
        "WEBHOOK_URL",
        "DISCORD_WEBHOOK_URL",
        "ALLOWED_ORIGINS",
        "DELIVERY_TIMEOUT_SECONDS",
        "RUST_LOG",
    ];

    struct TestEnvGuard {
        _lock: std::sync::MutexGuard<'static, ()>,
        originals: HashMap<String, Option<String>>,
    }

    impl TestEnvGuard {
        /// Locks the environment and clears every variable the config reads.
        fn new() -> Self {
            let lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            let mut originals = HashMap::new();
            for key in CONFIG_VARS {
                originals.insert(key.to_string(), env::var(key).ok());
                env::remove_var(key);
            }
            Self { _lock: lock, originals }
        }

        fn set_var(&mut self, key: &str, value: &str) {
            self.originals.entry(key.to_string()).or_insert_with(|| env::var(key).ok());
            env::set_var(key, value);
        }
    }

    impl Drop for TestEnvGuard {
        fn drop(&mut self) {
            for (var, original) in &self.originals {
                match original {
                    Some(value) => env::set_var(var, value),
                    None => env::remove_var(var),
                }
            }
        }
    }

    #[test]
    fn default_config_snapshot() {
        let config = Config::default();

        assert!(config.validate().is_ok());

        insta::assert_json_snapshot!("default_config", config);
    }

    #[test]
    fn env_overrides_defaults() {
        let mut guard = TestEnvGuard::new();
        guard.set_var("HOST", "0.0.0.0");
        guard.set_var("PORT", "9090");
        guard.set_var("RELAY_PATH", "/api/webhook");
        guard.set_var("WEBHOOK_URL", "https://discord.com/api/webhooks/123/secret-token");
        guard.set_var("ALLOWED_ORIGINS", "https://tbilisi.hackclub.com, https://tbilisihc.andrinoff.com");
        guard.set_var("DELIVERY_TIMEOUT_SECONDS", "5");

        let config = Config::load().expect("Config should load with env overrides");

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 9090);
        assert_eq!(config.relay_path, "/api/webhook");
        assert_eq!(config.webhook_url(), Some("https://discord.com/api/webhooks/123/secret-token"));
        assert_eq!(
            config.allowed_origins,
            vec!["https://tbilisi.hackclub.com", "https://tbilisihc.andrinoff.com"]
        );
        assert_eq!(config.to_client_config().timeout, Duration::from_secs(5));
    }

    #[test]
    fn discord_variable_is_accepted() {
        let mut guard = TestEnvGuard::new();
        guard.set_var("DISCORD_WEBHOOK_URL", "https://discord.com/api/webhooks/1/legacy");

        let config = Config::load().expect("Config should load");

        assert_eq!(config.webhook_url(), Some("https://discord.com/api/webhooks/1/legacy"));
    }

    #[test]
    fn generic_variable_wins_over_discord_variable() {
        let mut guard = TestEnvGuard::new();
        guard.set_var("DISCORD_WEBHOOK_URL", "https://discord.com/api/webhooks/1/legacy");
        guard.set_var("WEBHOOK_URL", "https://chat.example.com/hooks/2/current");

        let config = Config::load().expect("Config should load");

        assert_eq!(config.webhook_url(), Some("https://chat.example.com/hooks/2/current"));
    }

    #[test]
    fn missing_webhook_url_still_loads() {
        let _guard = TestEnvGuard::new();

        let config = Config::load().expect("Config should load without webhook URL");

        assert_eq!(config.webhook_url(), None);
        assert_eq!(config.relay_settings().webhook_url, None);
    }

    #[test]
    fn invalid_config_validation_fails() {
        let mut config = Config::default();
        config.port = 0;
        assert!(config.validate().is_err());

        config = Config::default();
        config.delivery_timeout_seconds = 0;
        assert!(config.validate().is_err());

        config = Config::default();
        config.delivery_timeout_seconds = 60;
        config.request_timeout = 30;
        assert!(config.validate().is_err());

        config = Config::default();
        config.relay_path = "api/receive".to_string();
        assert!(config.validate().is_err());

        config = Config::default();
        config.relay_path = "/health".to_string();
        assert!(config.validate().is_err());

        config = Config::default();
        config.allowed_origins = vec![" ".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn webhook_url_must_be_http() {
        let mut config = Config::default();

        config.webhook_url = Some("ftp://files.example.com/hook".to_string());
        assert!(config.validate().is_err());

        config.webhook_url = Some("not a url".to_string());
        assert!(config.validate().is_err());

        config.webhook_url = Some("http://127.0.0.1:9000/hook".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn webhook_url_masking() {
        let mut config = Config::default();
        config.webhook_url = Some("https://discord.com/api/webhooks/123/secret-token".to_string());

        let masked = config.webhook_url_masked().expect("URL is set");

        assert_eq!(masked, "https://discord.com/api/webhooks/123/***");
        assert!(!masked.contains("secret-token"));
    }

    #[test]
    fn webhook_url_masking_with_trailing_slash() {
        let mut config = Config::default();
        config.webhook_url = Some("https://discord.com/api/webhooks/123/secret-token/".to_string());

        let masked = config.webhook_url_masked().expect("URL is set");

        assert_eq!(masked, "https://discord.com/api/webhooks/123/***");
        assert!(!masked.contains("secret-token"));
    }

    #[test]
    fn webhook_url_masking_without_path() {
        let mut config = Config::default();
        assert_eq!(config.webhook_url_masked(), None);

        config.webhook_url = Some("https://hooks.example.com".to_string());
        assert_eq!(config.webhook_url_masked().as_deref(), Some("https://hooks.example.com"));
    }

    #[test]
    fn origin_policy_built_from_list() {
        let mut config = Config::default();
        assert_eq!(config.origin_policy(), OriginPolicy::Any);

        config.allowed_origins = vec!["https://tbilisi.hackclub.com".to_string()];
        assert!(config.origin_policy().is_restricted());
    }

    #[test]
    fn socket_address_parsing() {
        let mut config = Config::default();
        config.host = "127.0.0.1".to_string();
        config.port = 9000;

        let addr = config.parse_server_addr().expect("Should parse socket address");

        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 9000);
    }
}
