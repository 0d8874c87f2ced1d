//! Service configuration

use crate::cli::Cli;
use serde::{Deserialize, Serialize};
use std::path::Path;
use vietsent_classifiers::{CalibrationPolicy, ModelSpec};
use vietsent_core::{Error, Result};
use vietsent_history::HistoryConfig;

/// Service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// External sentiment model
    #[serde(default)]
    pub model: ModelSpec,

    /// Minimum trimmed input length, in characters
    #[serde(default = "default_min_text_length")]
    pub min_text_length: usize,

    /// History store
    #[serde(default)]
    pub history: HistoryConfig,

    /// Calibration thresholds
    #[serde(default)]
    pub calibration: CalibrationPolicy,

    /// HTTP server
    #[serde(default)]
    pub server: ServerConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Origins allowed by CORS; empty allows any origin
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,

    /// History page size when the client gives none
    #[serde(default = "default_history_limit")]
    pub history_default_limit: usize,

    /// Largest history page a client may request
    #[serde(default = "default_history_max_limit")]
    pub history_max_limit: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            model: ModelSpec::default(),
            min_text_length: default_min_text_length(),
            history: HistoryConfig::default(),
            calibration: CalibrationPolicy::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            port: default_port(),
            allowed_origins: default_allowed_origins(),
            history_default_limit: default_history_limit(),
            history_max_limit: default_history_max_limit(),
        }
    }
}

fn default_min_text_length() -> usize {
    4
}

fn default_listen() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_allowed_origins() -> Vec<String> {
    parse_origins("http://localhost:5173,http://localhost:4173")
}

fn default_history_limit() -> usize {
    20
}

fn default_history_max_limit() -> usize {
    200
}

/// Split a comma-separated origin list, dropping blanks
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(String::from)
        .collect()
}

impl ServiceConfig {
    /// Load configuration from file and CLI/env overrides
    pub fn load(config_path: &str, cli: &Cli) -> anyhow::Result<Self> {
        let mut config = if Path::new(config_path).exists() {
            let content = std::fs::read_to_string(config_path)?;
            serde_yaml::from_str(&content)?
        } else {
            Self::default()
        };

        config.apply_overrides(cli);
        config.validate()?;
        Ok(config)
    }

    /// Apply global CLI/env overrides
    pub fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(model) = &cli.model {
            let inference = self.model.inference.clone();
            self.model = ModelSpec {
                inference,
                ..ModelSpec::from_identifier(model)
            };
        }

        if let Some(min_text_length) = cli.min_text_length {
            self.min_text_length = min_text_length;
        }

        if let Some(path) = &cli.sqlite_path {
            self.history.path = path.clone();
        }

        if let Some(retain) = cli.history_limit {
            self.history.retain = retain;
        }
    }

    /// Apply `serve` subcommand overrides
    pub fn apply_server_overrides(
        &mut self,
        listen: Option<&str>,
        port: Option<u16>,
        allowed_origins: Option<&str>,
    ) {
        if let Some(listen) = listen {
            self.server.listen = listen.to_string();
        }
        if let Some(port) = port {
            self.server.port = port;
        }
        if let Some(origins) = allowed_origins {
            self.server.allowed_origins = parse_origins(origins);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.history_max_limit == 0 {
            return Err(Error::config("server.history_max_limit must be positive"));
        }
        if self.server.history_default_limit == 0
            || self.server.history_default_limit > self.server.history_max_limit
        {
            return Err(Error::config(format!(
                "server.history_default_limit must be within 1..={}",
                self.server.history_max_limit
            )));
        }
        if self.model.inference.max_length == 0 {
            return Err(Error::config("model.inference.max_length must be positive"));
        }
        if self.model.inference.max_input_chars == 0 {
            return Err(Error::config("model.inference.max_input_chars must be positive"));
        }
        Ok(())
    }
}
