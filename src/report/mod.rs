//! Reporting
//!
//! Reporters consume the runner's verdict stream. The console reporter
//! prints as cases finish; the JSON reporter collects everything and emits a
//! single document at the end.

mod console;
mod json;

pub use console::ConsoleReporter;
pub use json::JsonReporter;

use serde::Serialize;

use crate::executor::ExecutionRecord;
use crate::runner::{RunOutcome, SuiteResult};
use crate::suite::Suite;

/// Consumer of suite progress and results
pub trait Reporter {
    fn suite_started(&mut self, _suite: &Suite) {}

    fn case_finished(&mut self, _record: &ExecutionRecord) {}

    fn suite_finished(&mut self, _result: &SuiteResult) {}

    /// Called once after every suite has finished
    fn finish(&mut self, _summary: &RunSummary) {}
}

/// Reporter that ignores everything
#[derive(Debug, Default)]
pub struct Silent;

impl Reporter for Silent {}

/// Feed a finished result through a reporter as if it had run live
pub fn replay(reporter: &mut dyn Reporter, suite: &Suite, result: &SuiteResult) {
    reporter.suite_started(suite);
    for record in &result.records {
        reporter.case_finished(record);
    }
    reporter.suite_finished(result);
}

/// Aggregate over all suites of a run
#[derive(Debug, Default, Clone, Serialize)]
pub struct RunSummary {
    pub suites: usize,
    pub suites_passed: usize,
    pub suites_faulted: usize,
    pub suites_cancelled: usize,
    pub cases_passed: usize,
    pub cases_failed: usize,
    pub cases_errored: usize,
    pub cases_skipped: usize,
}

impl RunSummary {
    pub fn from_results(results: &[SuiteResult]) -> Self {
        let mut summary = Self::default();
        for result in results {
            summary.suites += 1;
            if result.is_success() {
                summary.suites_passed += 1;
            }
            match result.outcome {
                RunOutcome::Faulted { .. } => summary.suites_faulted += 1,
                RunOutcome::Cancelled => summary.suites_cancelled += 1,
                RunOutcome::Completed => {}
            }
            summary.cases_passed += result.passed();
            summary.cases_failed += result.failed();
            summary.cases_errored += result.errored();
            summary.cases_skipped += result.skipped();
        }
        summary
    }

    /// Every suite completed and every case passed
    pub fn all_passed(&self) -> bool {
        self.suites_passed == self.suites
    }

    /// 0 when everything passed, 1 otherwise
    pub fn exit_code(&self) -> i32 {
        if self.all_passed() {
            0
        } else {
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::ResponseBody;
    use crate::suite::{Method, Phase};
    use crate::validate::Verdict;
    use std::time::Duration;

    fn record(verdict: Verdict) -> ExecutionRecord {
        let mut r = ExecutionRecord::response(
            Method::Get,
            "/x",
            Duration::from_millis(1),
            200,
            ResponseBody::Empty,
        )
        .for_case(Phase::Read, "case");
        r.verdict = Some(verdict);
        r
    }

    fn result(outcome: RunOutcome, verdicts: &[Verdict], total: usize) -> SuiteResult {
        SuiteResult {
            suite: "s".into(),
            uri: "/x".into(),
            outcome,
            records: verdicts.iter().map(|v| record(*v)).collect(),
            total_cases: total,
            elapsed: Duration::from_millis(5),
        }
    }

    #[test]
    fn test_summary_all_passed() {
        let results = vec![
            result(RunOutcome::Completed, &[Verdict::Pass, Verdict::Pass], 2),
            result(RunOutcome::Completed, &[Verdict::Pass], 1),
        ];
        let summary = RunSummary::from_results(&results);
        assert!(summary.all_passed());
        assert_eq!(summary.exit_code(), 0);
        assert_eq!(summary.cases_passed, 3);
    }

    #[test]
    fn test_summary_counts_failures() {
        let results = vec![
            result(RunOutcome::Completed, &[Verdict::Pass, Verdict::Fail], 2),
            result(RunOutcome::Completed, &[Verdict::Error], 1),
            result(
                RunOutcome::Faulted {
                    reason: "auth".into(),
                },
                &[Verdict::Pass],
                4,
            ),
        ];
        let summary = RunSummary::from_results(&results);
        assert!(!summary.all_passed());
        assert_eq!(summary.exit_code(), 1);
        assert_eq!(summary.cases_failed, 1);
        assert_eq!(summary.cases_errored, 1);
        assert_eq!(summary.cases_skipped, 3);
        assert_eq!(summary.suites_faulted, 1);
        assert_eq!(summary.suites_passed, 0);
    }

    #[test]
    fn test_cancelled_suite_is_not_a_pass() {
        let results = vec![result(RunOutcome::Cancelled, &[Verdict::Pass], 3)];
        let summary = RunSummary::from_results(&results);
        assert_eq!(summary.suites_cancelled, 1);
        assert_eq!(summary.exit_code(), 1);
    }
}
