// src/router/events.rs
use super::RequestContext;
use crate::check::{CheckError, ExecutionOutcome};
use tracing::{error, info, warn};

/// Points in request handling an operator may want to observe.
#[derive(Debug)]
pub enum RouterEvent<'a> {
    Accepted,
    UnsupportedMethod,
    UnknownCheck { name: &'a str },
    Completed { name: &'a str, outcome: &'a ExecutionOutcome },
    Failed { name: &'a str, error: &'a CheckError },
}

/// Receives router events. Injected into the router so the sink stays
/// swappable and tests can observe events directly.
pub trait EventSink: Send + Sync {
    fn emit(&self, ctx: &RequestContext, event: &RouterEvent<'_>);
}

/// Writes router events as structured `tracing` records keyed by request id.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEvents;

impl EventSink for TracingEvents {
    fn emit(&self, ctx: &RequestContext, event: &RouterEvent<'_>) {
        let request_id = ctx.request_id.as_str();
        match event {
            RouterEvent::Accepted => {
                info!(request_id, method = %ctx.method, path = %ctx.path, "request accepted")
            }
            RouterEvent::UnsupportedMethod => {
                warn!(request_id, method = %ctx.method, "unsupported method")
            }
            RouterEvent::UnknownCheck { name } => {
                warn!(request_id, check = %name, "unknown check")
            }
            RouterEvent::Completed { name, outcome } if outcome.success => info!(
                request_id,
                check = %name,
                elapsed = ?outcome.elapsed,
                "check passed"
            ),
            RouterEvent::Completed { name, outcome } => warn!(
                request_id,
                check = %name,
                elapsed = ?outcome.elapsed,
                message = %outcome.message,
                "check failed"
            ),
            RouterEvent::Failed { name, error } => {
                let diagnostic = error.diagnostic();
                error!(
                    request_id,
                    check = %name,
                    error = %diagnostic.trim_end(),
                    "check errored"
                )
            }
        }
    }
}

/// Keeps a one-line summary of every event, for assertions.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingEvents {
    pub(crate) seen: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl RecordingEvents {
    pub(crate) fn lines(&self) -> Vec<String> {
        self.seen.lock().expect("lock").clone()
    }
}

#[cfg(test)]
impl EventSink for RecordingEvents {
    fn emit(&self, ctx: &RequestContext, event: &RouterEvent<'_>) {
        let line = match event {
            RouterEvent::Accepted => format!("{} accepted {} {}", ctx.request_id, ctx.method, ctx.path),
            RouterEvent::UnsupportedMethod => format!("{} unsupported {}", ctx.request_id, ctx.method),
            RouterEvent::UnknownCheck { name } => format!("{} unknown {name}", ctx.request_id),
            RouterEvent::Completed { name, outcome } => {
                format!("{} completed {name} {}", ctx.request_id, outcome.success)
            }
            RouterEvent::Failed { name, .. } => format!("{} failed {name}", ctx.request_id),
        };
        self.seen.lock().expect("lock").push(line);
    }
}
