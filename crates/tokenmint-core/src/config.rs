//! Server configuration.
//!
//! Values come from the process environment (after an optional `.env` file
//! has been loaded by the binary). Every key maps to the lower-cased field
//! name, so `API_KEY` fills [`ServerConfig::api_key`], `PORT` fills
//! [`ServerConfig::port`] and so on.

use config::{Config, Environment};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};

/// The provider's OAuth2 token endpoint.
pub const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Scope granting access to the document-processing API.
pub const DEFAULT_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Well-known credential file read when nothing else is configured.
pub const DEFAULT_CREDENTIAL_FILE: &str = "service-account-key.json";

/// Server configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Shared secret callers present as a bearer token.
    #[serde(default, skip_serializing)]
    pub api_key: String,
    /// Inline credential JSON, or a path to a credential file.
    #[serde(default)]
    pub service_account_json: Option<String>,
    /// Credential file used when `service_account_json` is unset.
    #[serde(default = "default_service_account_file")]
    pub service_account_file: String,
    /// Listen address.
    #[serde(default = "default_host")]
    pub host: String,
    /// Listen port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Deployment environment; `production` hides the API description.
    #[serde(default = "default_environment")]
    pub environment: String,
    /// Token endpoint; also the assertion audience.
    #[serde(default = "default_token_url")]
    pub token_url: String,
    /// Requested scopes, comma or whitespace separated.
    #[serde(default = "default_scopes")]
    pub scopes: String,
    /// Readiness probe target. Falls back to the token endpoint.
    #[serde(default)]
    pub probe_url: Option<String>,
    /// Upper bound on a token exchange round trip.
    #[serde(default = "default_exchange_timeout")]
    pub exchange_timeout_secs: u64,
    /// Upper bound on a readiness probe.
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,
    /// Time in-flight requests get to finish after a shutdown signal.
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_secs: u64,
    /// Log output format.
    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_service_account_file() -> String {
    DEFAULT_CREDENTIAL_FILE.to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_token_url() -> String {
    DEFAULT_TOKEN_URL.to_string()
}

fn default_scopes() -> String {
    DEFAULT_SCOPE.to_string()
}

fn default_exchange_timeout() -> u64 {
    30
}

fn default_probe_timeout() -> u64 {
    3
}

fn default_shutdown_grace() -> u64 {
    10
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            service_account_json: None,
            service_account_file: default_service_account_file(),
            host: default_host(),
            port: default_port(),
            environment: default_environment(),
            token_url: default_token_url(),
            scopes: default_scopes(),
            probe_url: None,
            exchange_timeout_secs: default_exchange_timeout(),
            probe_timeout_secs: default_probe_timeout(),
            shutdown_grace_secs: default_shutdown_grace(),
            log_format: LogFormat::default(),
        }
    }
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("api_key", &"[censored]")
            .field("service_account_json", &self.service_account_json.as_ref().map(|_| "[set]"))
            .field("service_account_file", &self.service_account_file)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("environment", &self.environment)
            .field("token_url", &self.token_url)
            .field("scopes", &self.scopes)
            .field("probe_url", &self.probe_url)
            .field("exchange_timeout_secs", &self.exchange_timeout_secs)
            .field("probe_timeout_secs", &self.probe_timeout_secs)
            .field("shutdown_grace_secs", &self.shutdown_grace_secs)
            .field("log_format", &self.log_format)
            .finish()
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("Invalid log format: {}", other)),
        }
    }
}

impl ServerConfig {
    /// Load configuration from the process environment and validate it.
    pub fn from_env() -> Result<Self> {
        Self::from_env_source(None)
    }

    /// Load configuration from an explicit variable map instead of the
    /// process environment.
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self> {
        Self::from_env_source(Some(vars))
    }

    fn from_env_source(vars: Option<HashMap<String, String>>) -> Result<Self> {
        let config: ServerConfig = Config::builder()
            .add_source(Environment::default().source(vars))
            .build()
            .and_then(Config::try_deserialize::<ServerConfig>)
            .map_err(|e| Error::Configuration(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the server cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(Error::Configuration("API_KEY must be set".to_string()));
        }
        if self.token_url.trim().is_empty() {
            return Err(Error::Configuration("TOKEN_URL must not be empty".to_string()));
        }
        if self.scope_list().is_empty() {
            return Err(Error::Configuration("SCOPES must name at least one scope".to_string()));
        }
        if self.exchange_timeout_secs == 0 || self.probe_timeout_secs == 0 {
            return Err(Error::Configuration("timeouts must be at least one second".to_string()));
        }
        Ok(())
    }

    /// Configured scopes in declaration order, without duplicates.
    pub fn scope_list(&self) -> Vec<String> {
        let mut scopes: Vec<String> = Vec::new();
        for scope in self
            .scopes
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
        {
            if !scopes.iter().any(|s| s == scope) {
                scopes.push(scope.to_string());
            }
        }
        scopes
    }

    /// The credential setting, treating an empty value as unset.
    pub fn credential_setting(&self) -> Option<&str> {
        self.service_account_json
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn probe_target(&self) -> &str {
        self.probe_url
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.token_url)
    }

    pub fn exchange_timeout(&self) -> Duration {
        Duration::from_secs(self.exchange_timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    /// Whether the machine-readable API description is served.
    pub fn docs_enabled(&self) -> bool {
        !self.environment.eq_ignore_ascii_case("production")
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    pub fn with_service_account_json(mut self, value: impl Into<String>) -> Self {
        self.service_account_json = Some(value.into());
        self
    }

    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    pub fn with_probe_url(mut self, url: impl Into<String>) -> Self {
        self.probe_url = Some(url.into());
        self
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    pub fn with_scopes(mut self, scopes: impl Into<String>) -> Self {
        self.scopes = scopes.into();
        self
    }

    pub fn with_exchange_timeout(mut self, secs: u64) -> Self {
        self.exchange_timeout_secs = secs;
        self
    }

    pub fn with_probe_timeout(mut self, secs: u64) -> Self {
        self.probe_timeout_secs = secs;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_from_minimal_env() {
        let config = ServerConfig::from_vars(vars(&[("API_KEY", "s3cret")])).unwrap();

        assert_eq!(config.api_key, "s3cret");
        assert_eq!(config.port, 8000);
        assert_eq!(config.token_url, DEFAULT_TOKEN_URL);
        assert_eq!(config.scope_list(), vec![DEFAULT_SCOPE.to_string()]);
        assert_eq!(config.exchange_timeout(), Duration::from_secs(30));
        assert_eq!(config.probe_timeout(), Duration::from_secs(3));
        assert_eq!(config.probe_target(), DEFAULT_TOKEN_URL);
        assert!(config.docs_enabled());
        assert!(config.credential_setting().is_none());
    }

    #[test]
    fn test_env_overrides() {
        let config = ServerConfig::from_vars(vars(&[
            ("API_KEY", "0042"),
            ("PORT", "9090"),
            ("ENVIRONMENT", "Production"),
            ("SERVICE_ACCOUNT_JSON", "/etc/creds.json"),
            ("LOG_FORMAT", "json"),
        ]))
        .unwrap();

        assert_eq!(config.api_key, "0042");
        assert_eq!(config.port, 9090);
        assert!(!config.docs_enabled());
        assert_eq!(config.credential_setting(), Some("/etc/creds.json"));
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.bind_addr(), "0.0.0.0:9090");
    }

    #[test]
    fn test_missing_api_key_is_rejected() {
        let err = ServerConfig::from_vars(vars(&[("PORT", "8000")])).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_scope_list_dedupes_and_splits() {
        let config = ServerConfig::default().with_scopes("a, b c,,a");
        assert_eq!(config.scope_list(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_empty_credential_setting_is_unset() {
        let config = ServerConfig::default().with_service_account_json("   ");
        assert!(config.credential_setting().is_none());
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
