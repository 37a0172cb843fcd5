//! Human-readable console output

use std::io::Write;

use colored::Colorize;

use super::{Reporter, RunSummary};
use crate::executor::ExecutionRecord;
use crate::runner::{RunOutcome, SuiteResult};
use crate::suite::Suite;
use crate::validate::Verdict;

/// Characters of a response body shown for failing cases in verbose mode
const VERBOSE_BODY_CHARS: usize = 500;

/// Prints one line per case as it finishes
pub struct ConsoleReporter {
    out: Box<dyn Write + Send>,
    verbose: bool,
}

impl ConsoleReporter {
    /// Reporter writing to stdout
    pub fn stdout(verbose: bool) -> Self {
        Self::new(Box::new(std::io::stdout()), verbose)
    }

    pub fn new(out: Box<dyn Write + Send>, verbose: bool) -> Self {
        Self { out, verbose }
    }
}

impl Reporter for ConsoleReporter {
    fn suite_started(&mut self, suite: &Suite) {
        let _ = writeln!(
            self.out,
            "\n{} {} {}",
            "Running Suite:".blue().bold(),
            suite.name.white().bold(),
            suite.primary_uri.dimmed()
        );
        if let Some(desc) = &suite.description {
            let _ = writeln!(self.out, "  {}", desc.dimmed());
        }
    }

    fn case_finished(&mut self, record: &ExecutionRecord) {
        let phase = record.phase.map(|p| p.as_str()).unwrap_or("?");
        let label = format!("[{}] {}", phase, record.case);
        let timing = format!("({:.2}s)", record.elapsed.as_secs_f64());

        let line = match record.final_verdict() {
            Verdict::Pass => format!("  {} {} {}", "✓".green(), label, timing.dimmed()),
            Verdict::Fail => format!(
                "  {} {} {}\n      {}",
                "✗".red(),
                label,
                timing.dimmed(),
                record.diagnostic.red()
            ),
            Verdict::Error => format!(
                "  {} {} {}\n      {}",
                "!".yellow().bold(),
                label,
                timing.dimmed(),
                record.diagnostic.yellow()
            ),
        };
        let _ = writeln!(self.out, "{}", line);

        if self.verbose && !record.final_verdict().is_pass() {
            let _ = writeln!(
                self.out,
                "      {} {} {}",
                record.method.to_string().dimmed(),
                record.uri.dimmed(),
                record.body.preview(VERBOSE_BODY_CHARS).dimmed()
            );
        }
    }

    fn suite_finished(&mut self, result: &SuiteResult) {
        let counts = format!(
            "{} passed, {} failed, {} errored",
            result.passed(),
            result.failed(),
            result.errored()
        );

        let line = match &result.outcome {
            RunOutcome::Completed if result.is_success() => format!(
                "{} {} ({}/{} in {:.1}s)",
                "✓".green().bold(),
                "Suite Passed".green().bold(),
                result.passed(),
                result.total_cases,
                result.elapsed.as_secs_f64()
            ),
            RunOutcome::Completed => {
                format!("{} {}: {}", "✗".red().bold(), "Suite Failed".red().bold(), counts)
            }
            RunOutcome::Faulted { reason } => format!(
                "{} {}: {}; {} not run\n  {}",
                "✗".red().bold(),
                "Suite Faulted".red().bold(),
                counts,
                result.skipped(),
                reason.red()
            ),
            RunOutcome::Cancelled => format!(
                "{} {}: {}; {} not run",
                "!".yellow().bold(),
                "Suite Cancelled".yellow().bold(),
                counts,
                result.skipped()
            ),
        };
        let _ = writeln!(self.out, "{}", line);
    }

    fn finish(&mut self, summary: &RunSummary) {
        let totals = format!(
            "{} suites: {} passed, {} faulted, {} cancelled | cases: {} passed, {} failed, {} errored, {} not run",
            summary.suites,
            summary.suites_passed,
            summary.suites_faulted,
            summary.suites_cancelled,
            summary.cases_passed,
            summary.cases_failed,
            summary.cases_errored,
            summary.cases_skipped
        );
        let headline = if summary.all_passed() {
            "ALL PASSED".green().bold()
        } else {
            "FAILED".red().bold()
        };
        let _ = writeln!(self.out, "\n{} {}", headline, totals);
        let _ = self.out.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::ResponseBody;
    use crate::suite::{Method, Phase};
    use crate::validate::Assessment;
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Writer that keeps everything in a shared buffer
    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Capture {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[test]
    fn test_failed_case_shows_diagnostic_and_body_when_verbose() {
        colored::control::set_override(false);
        let capture = Capture::default();
        let mut reporter = ConsoleReporter::new(Box::new(capture.clone()), true);

        let record = ExecutionRecord::response(
            Method::Post,
            "/api/v1/system/dns/server",
            Duration::from_millis(120),
            400,
            ResponseBody::Json(json!({"return": 1008})),
        )
        .for_case(Phase::Create, "Test DNS server IP validation")
        .finalize(Assessment {
            verdict: Verdict::Fail,
            diagnostic: "expected return code 1007, got 1008".into(),
        });
        reporter.case_finished(&record);

        let text = capture.text();
        assert!(text.contains("✗ [create] Test DNS server IP validation (0.12s)"));
        assert!(text.contains("expected return code 1007, got 1008"));
        assert!(text.contains(r#"POST /api/v1/system/dns/server {"return":1008}"#));
    }

    #[test]
    fn test_summary_line() {
        colored::control::set_override(false);
        let capture = Capture::default();
        let mut reporter = ConsoleReporter::new(Box::new(capture.clone()), false);
        reporter.finish(&RunSummary {
            suites: 2,
            suites_passed: 2,
            cases_passed: 7,
            ..Default::default()
        });
        let text = capture.text();
        assert!(text.contains("ALL PASSED"));
        assert!(text.contains("cases: 7 passed, 0 failed, 0 errored"));
    }
}
