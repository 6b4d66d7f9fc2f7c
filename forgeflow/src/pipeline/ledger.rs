use crate::core::StageName;
use crate::stages::StageReport;
use parking_lot::Mutex;

/// Collects stage reports from concurrently running tracks.
#[derive(Debug, Default)]
pub struct StageLedger {
    reports: Mutex<Vec<StageReport>>,
}

impl StageLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a report.
    pub fn record(&self, report: StageReport) {
        self.reports.lock().push(report);
    }

    /// Records that a stage did not run.
    pub fn skip(&self, stage: StageName, why: &str) {
        tracing::debug!(stage = %stage, why, "Stage skipped");
        self.record(StageReport::skipped(stage, why));
    }

    /// Returns the reports ordered by pipeline position.
    #[must_use]
    pub fn into_reports(self) -> Vec<StageReport> {
        let mut reports = self.reports.into_inner();
        reports.sort_by_key(|r| StageName::ALL.iter().position(|s| *s == r.stage));
        reports
    }
}
