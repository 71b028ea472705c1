//! Board configuration.
//!
//! Values come from `<project>/.msgboard/config.toml` when it exists; the CLI
//! layers flags and environment variables on top.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{BoardError, BoardResult};

/// Directory holding the database and config file, relative to the project.
pub const BOARD_DIR: &str = ".msgboard";

/// What to do with a save whose broadcast failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BroadcastFailurePolicy {
    /// Roll the save back and fail the create.
    #[default]
    Propagate,
    /// Keep the save and log the failure.
    Log,
}

impl BroadcastFailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Propagate => "propagate",
            Self::Log => "log",
        }
    }
}

impl FromStr for BroadcastFailurePolicy {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "propagate" => Ok(Self::Propagate),
            "log" => Ok(Self::Log),
            other => Err(BoardError::Config(format!(
                "unknown broadcast failure policy '{}' (expected 'propagate' or 'log')",
                other
            ))),
        }
    }
}

impl fmt::Display for BroadcastFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Database file. Defaults to `<project>/.msgboard/board.db`.
    pub database: Option<PathBuf>,
    /// Redis URL. When set, broadcasts go through Redis pub/sub.
    pub redis_url: Option<String>,
    /// Server used by the HTTP relay when Redis is not configured.
    pub server_url: String,
    pub channel_capacity: usize,
    /// Longest accepted message, in characters.
    pub max_length: usize,
    pub broadcast_failure: BroadcastFailurePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3030,
            database: None,
            redis_url: None,
            server_url: msgboard_cable::DEFAULT_SERVER_URL.to_string(),
            channel_capacity: msgboard_cable::DEFAULT_CAPACITY,
            max_length: crate::message::DEFAULT_MAX_LENGTH,
            broadcast_failure: BroadcastFailurePolicy::default(),
        }
    }
}

impl Config {
    /// Default config file location for a project.
    pub fn default_path(project_dir: &Path) -> PathBuf {
        project_dir.join(BOARD_DIR).join("config.toml")
    }

    /// Load from `path`, falling back to defaults when the file is absent.
    pub fn load(path: &Path) -> BoardResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        Self::parse(&raw)
    }

    /// Parse TOML text.
    pub fn parse(raw: &str) -> BoardResult<Self> {
        toml::from_str(raw).map_err(|e| BoardError::Config(e.to_string()))
    }

    /// Resolve the database path against the project directory.
    pub fn database_path(&self, project_dir: &Path) -> PathBuf {
        match &self.database {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => project_dir.join(path),
            None => project_dir.join(BOARD_DIR).join("board.db"),
        }
    }

    /// Whether the server binds to a loopback address only.
    pub fn is_loopback(&self) -> bool {
        self.host.eq_ignore_ascii_case("localhost")
            || self
                .host
                .parse::<IpAddr>()
                .map(|ip| ip.is_loopback())
                .unwrap_or(false)
    }

    /// Address the web server binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
