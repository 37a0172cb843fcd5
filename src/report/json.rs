//! Machine-readable output for CI

use std::io::Write;

use serde::Serialize;

use super::{Reporter, RunSummary};
use crate::runner::SuiteResult;

/// Collects suite results and writes one JSON document on `finish`
pub struct JsonReporter {
    out: Box<dyn Write + Send>,
    results: Vec<SuiteResult>,
}

#[derive(Serialize)]
struct Document<'a> {
    passed: bool,
    summary: &'a RunSummary,
    suites: &'a [SuiteResult],
}

impl JsonReporter {
    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out,
            results: Vec::new(),
        }
    }
}

impl Reporter for JsonReporter {
    fn suite_finished(&mut self, result: &SuiteResult) {
        self.results.push(result.clone());
    }

    fn finish(&mut self, summary: &RunSummary) {
        let doc = Document {
            passed: summary.all_passed(),
            summary,
            suites: &self.results,
        };
        match serde_json::to_string_pretty(&doc) {
            Ok(text) => {
                let _ = writeln!(self.out, "{}", text);
                let _ = self.out.flush();
            }
            Err(e) => tracing::error!(error = %e, "Failed to serialize report"),
        }
    }
}
