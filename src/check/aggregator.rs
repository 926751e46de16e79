// src/check/aggregator.rs
use super::{CheckError, ExecutionOutcome, Runner, ScriptGroup};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Runs every member of a [`ScriptGroup`] and folds the results into one outcome.
#[derive(Clone)]
pub struct ResultAggregator {
    runner: Arc<dyn Runner>,
}

impl ResultAggregator {
    pub fn new(runner: Arc<dyn Runner>) -> Self {
        Self { runner }
    }

    /// Members run one after another, in listing order. The group passes
    /// only if every member passes; the message has one `name: message`
    /// line per member. A launch failure of any member aborts the group.
    pub async fn run_group(&self, group: &ScriptGroup) -> Result<ExecutionOutcome, CheckError> {
        let start = Instant::now();
        let mut success = true;
        let mut lines = Vec::with_capacity(group.members().len());

        for member in group.members() {
            let outcome = self.runner.run(&member.path).await?;
            debug!(
                group = %group.dir().display(),
                member = %member.name,
                success = outcome.success,
                "group member finished"
            );
            success &= outcome.success;
            lines.push(format!("{}: {}", member.name, outcome.message));
        }

        Ok(ExecutionOutcome::new(success, lines.join("\n"), start.elapsed()))
    }
}
