// src/config/models.rs
use anyhow::{bail, Result};
use hyper::StatusCode;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,

    /// Directory whose top-level entries are the available checks.
    pub scripts_dir: PathBuf,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub failure_status: FailureStatus,

    #[serde(default = "default_request_id_header")]
    pub request_id_header: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Log to this file instead of stderr.
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    #[serde(default)]
    pub metrics_enabled: bool,

    #[serde(default = "default_metrics_listen")]
    pub metrics_listen: SocketAddr,

    #[serde(default = "default_metrics_path")]
    pub metrics_path: String,
}

/// Status returned when a check ran but did not pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStatus {
    /// 500, so plain uptime monitors alert without parsing the body.
    #[default]
    ServerError,
    /// Always 200; the body alone tells passed from failed.
    Ok,
}

impl FailureStatus {
    pub fn status_code(self) -> StatusCode {
        match self {
            FailureStatus::ServerError => StatusCode::INTERNAL_SERVER_ERROR,
            FailureStatus::Ok => StatusCode::OK,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl Config {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.scripts_dir.as_os_str().is_empty() {
            bail!("scripts_dir must not be empty");
        }
        if self.timeout_secs == 0 {
            bail!("timeout_secs must be greater than zero");
        }
        if self.request_id_header.trim().is_empty() {
            bail!("request_id_header must not be empty");
        }
        if !self.metrics_path.starts_with('/') {
            bail!("metrics_path must start with '/': {}", self.metrics_path);
        }
        Ok(())
    }
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_request_id_header() -> String {
    "x-request-id".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_metrics_listen() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 9090))
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}
