//! Startup configuration: environment first, command-line flags on top.

use clap::Parser;
use std::path::PathBuf;

use tokenmint_core::{Error, LogFormat, Result, ServerConfig};

#[derive(Debug, Parser)]
#[command(name = "tokenmint")]
#[command(author, version, about = "Access token server for the document-processing API", long_about = None)]
pub struct Cli {
    /// Address to listen on (overrides HOST).
    #[arg(long)]
    pub host: Option<String>,
    /// Port to listen on (overrides PORT).
    #[arg(long)]
    pub port: Option<u16>,
    /// Log output format, `pretty` or `json` (overrides LOG_FORMAT).
    #[arg(long)]
    pub log_format: Option<LogFormat>,
    /// Read environment variables from this file instead of `.env`.
    #[arg(long)]
    pub env_file: Option<PathBuf>,
}

impl Cli {
    /// Load the dotenv file, read the environment and apply flag overrides.
    pub fn load_config(&self) -> Result<ServerConfig> {
        self.load_env_file()?;

        let mut config = ServerConfig::from_env()?;
        self.apply(&mut config);
        Ok(config)
    }

    /// Load variables from `--env-file`, or from `.env` when present.
    ///
    /// An explicit file must load; a missing `.env` is normal outside
    /// development.
    fn load_env_file(&self) -> Result<()> {
        match &self.env_file {
            Some(path) => dotenvy::from_path(path).map_err(|e| {
                Error::Configuration(format!("failed to load {}: {}", path.display(), e))
            }),
            None => match dotenvy::dotenv() {
                Ok(_) => Ok(()),
                Err(e) if e.not_found() => Ok(()),
                Err(e) => Err(Error::Configuration(format!("failed to load .env: {}", e))),
            },
        }
    }

    pub fn apply(&self, config: &mut ServerConfig) {
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(format) = self.log_format {
            config.log_format = format;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_environment() {
        let cli = Cli::parse_from(["tokenmint", "--port", "9000", "--log-format", "json"]);
        let mut config = ServerConfig::default().with_api_key("k");

        cli.apply(&mut config);

        assert_eq!(config.port, 9000);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_missing_env_file_is_configuration_error() {
        let missing = std::env::temp_dir()
            .join(format!("tokenmint-absent-{}", std::process::id()))
            .join("prod.env");
        let cli = Cli::parse_from(["tokenmint", "--env-file", missing.to_str().unwrap()]);

        let Err(err) = cli.load_config() else {
            panic!("a missing --env-file must fail");
        };
        assert!(matches!(err, Error::Configuration(ref msg) if msg.contains("prod.env")));
    }

    #[test]
    fn test_invalid_log_format_rejected() {
        assert!(Cli::try_parse_from(["tokenmint", "--log-format", "xml"]).is_err());
    }
}
