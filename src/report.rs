use tracing::{info, warn};

/// Where in the sweep an alert failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    Rearm,
    Persist,
    Notify,
}

#[derive(Debug, Clone)]
pub struct SweepFailure {
    pub alert_id: String,
    pub user_id: i64,
    pub stage: FailureStage,
    pub error: String,
}

/// Tally of one evaluator sweep.
#[derive(Debug, Clone, Default)]
pub struct SweepReport {
    pub evaluated: usize,
    pub triggered: usize,
    pub rearmed: usize,
    pub missing: usize,
    pub failures: Vec<SweepFailure>,
}

impl SweepReport {
    pub fn fail(&mut self, alert_id: &str, user_id: i64, stage: FailureStage, err: &anyhow::Error) {
        warn!(alert_id = %alert_id, user_id, stage = ?stage, "alert sweep step failed: {err:#}");
        self.failures.push(SweepFailure {
            alert_id: alert_id.to_string(),
            user_id,
            stage,
            error: format!("{err:#}"),
        });
    }
}

pub fn log_sweep(report: &SweepReport) {
    info!(
        evaluated = report.evaluated,
        triggered = report.triggered,
        rearmed = report.rearmed,
        missing = report.missing,
        failed = report.failures.len(),
        "alert sweep done"
    );
}
