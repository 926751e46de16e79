// src/router/router.rs
use super::{EventSink, Reply, RequestContext, RouterEvent};
use crate::check::{
    normalize_name, CheckError, ExecutionOutcome, ResultAggregator, Runner, Target,
    TargetResolver,
};
use crate::config::FailureStatus;
use crate::metrics::MetricsCollector;
use hyper::{Method, StatusCode};
use std::sync::Arc;

/// `check` label used when the requested name could not be resolved.
const UNRESOLVED_CHECK: &str = "unresolved";

/// Turns a request into a check run and the run into a reply.
pub struct RequestRouter {
    resolver: TargetResolver,
    runner: Arc<dyn Runner>,
    aggregator: ResultAggregator,
    failure_status: FailureStatus,
    events: Arc<dyn EventSink>,
    metrics: Option<Arc<MetricsCollector>>,
}

impl RequestRouter {
    pub fn new(resolver: TargetResolver, runner: Arc<dyn Runner>, events: Arc<dyn EventSink>) -> Self {
        let aggregator = ResultAggregator::new(runner.clone());
        Self {
            resolver,
            runner,
            aggregator,
            failure_status: FailureStatus::default(),
            events,
            metrics: None,
        }
    }

    pub fn with_failure_status(mut self, failure_status: FailureStatus) -> Self {
        self.failure_status = failure_status;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Handle one request. Never fails: every error becomes a reply.
    pub async fn handle(&self, ctx: &RequestContext) -> Reply {
        self.events.emit(ctx, &RouterEvent::Accepted);
        let name = normalize_name(&ctx.path);

        let reply = match self.check(ctx).await {
            Ok(outcome) => {
                self.events.emit(ctx, &RouterEvent::Completed { name, outcome: &outcome });
                if let Some(metrics) = &self.metrics {
                    metrics.record_outcome(name, &outcome);
                }
                render_outcome(&outcome, self.failure_status)
            }
            Err(error) => {
                match &error {
                    CheckError::MethodNotAllowed(_) => {
                        self.events.emit(ctx, &RouterEvent::UnsupportedMethod)
                    }
                    CheckError::NotFound(_) => {
                        self.events.emit(ctx, &RouterEvent::UnknownCheck { name })
                    }
                    _ => {
                        self.events.emit(ctx, &RouterEvent::Failed { name, error: &error });
                        if let Some(metrics) = &self.metrics {
                            metrics.record_error(self.error_label(name, &error));
                        }
                    }
                }
                render_error(&error)
            }
        };

        if let Some(metrics) = &self.metrics {
            metrics.record_request(reply.status.as_u16());
        }
        reply
    }

    /// Metric label for a failed check. Errors raised before the name was
    /// matched against the scripts root get a fixed label, so client paths
    /// never become label values.
    fn error_label<'a>(&self, name: &'a str, error: &CheckError) -> &'a str {
        match error {
            CheckError::Listing { path, .. } if path.as_path() == self.resolver.root() => {
                UNRESOLVED_CHECK
            }
            CheckError::Unhandled(_) => UNRESOLVED_CHECK,
            _ => name,
        }
    }

    async fn check(&self, ctx: &RequestContext) -> Result<ExecutionOutcome, CheckError> {
        if ctx.method != Method::GET {
            return Err(CheckError::MethodNotAllowed(ctx.method.clone()));
        }

        match self.resolver.resolve(&ctx.path).await? {
            Target::Script(path) => self.runner.run(&path).await,
            Target::ScriptGroup(group) => self.aggregator.run_group(&group).await,
        }
    }
}

/// `CHECK PASSED` or `CHECK FAILED`, the message on following lines if
/// there is one, and a trailing newline.
pub fn render_outcome(outcome: &ExecutionOutcome, failure_status: FailureStatus) -> Reply {
    let (status, verdict) = if outcome.success {
        (StatusCode::OK, "CHECK PASSED")
    } else {
        (failure_status.status_code(), "CHECK FAILED")
    };

    let mut body = String::from(verdict);
    if !outcome.message.is_empty() {
        body.push('\n');
        body.push_str(&outcome.message);
    }
    body.push('\n');

    Reply::new(status, body)
}

fn render_error(error: &CheckError) -> Reply {
    if error.is_expected() {
        Reply::empty(error.status())
    } else {
        Reply::new(error.status(), error.diagnostic())
    }
}
