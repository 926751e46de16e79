// src/check/error.rs
use hyper::{Method, StatusCode};
use std::error::Error as _;
use std::path::PathBuf;

/// Everything that can stop a request from producing an [`ExecutionOutcome`].
///
/// Timeouts and non-zero exits are not errors: they are failed outcomes.
/// The first two variants are expected routing results, the rest are
/// internal failures an operator needs to look at.
///
/// [`ExecutionOutcome`]: super::ExecutionOutcome
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error("Method {0} is not supported")]
    MethodNotAllowed(Method),

    #[error("No check named {0:?}")]
    NotFound(String),

    #[error("Failed to launch {}", .path.display())]
    Launch {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed waiting for {}", .path.display())]
    Wait {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("No scripts in directory {}", .0.display())]
    EmptyGroup(PathBuf),

    #[error("Failed to list {}", .path.display())]
    Listing {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Unhandled(#[from] anyhow::Error),
}

impl CheckError {
    /// Routing outcomes a client can cause, as opposed to internal failures.
    pub fn is_expected(&self) -> bool {
        matches!(self, Self::MethodNotAllowed(_) | Self::NotFound(_))
    }

    pub fn status(&self) -> StatusCode {
        if self.is_expected() {
            StatusCode::NOT_FOUND
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    /// Operator-facing text: the error followed by each underlying cause.
    pub fn diagnostic(&self) -> String {
        let mut text = self.to_string();
        let mut cause = self.source();
        while let Some(err) = cause {
            text.push_str("\ncaused by: ");
            text.push_str(&err.to_string());
            cause = err.source();
        }
        text.push('\n');
        text
    }
}
