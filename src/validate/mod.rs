//! Assertion validation
//!
//! Judges a record against its case. Status, return code and timing are
//! independent expectations and a case passes only when all three hold.
//! Validation is a pure function of the case and the record.

use std::fmt;

use serde::Serialize;

use crate::executor::{ExecutionRecord, ResponseBody};
use crate::suite::TestCase;

/// How much of an unparseable body is quoted in a diagnostic
const BODY_PREVIEW_CHARS: usize = 200;

/// Outcome of a case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Pass,
    Fail,
    /// Transport failure; always counts as a failure
    Error,
}

impl Verdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Verdict::Pass => "PASS",
            Verdict::Fail => "FAIL",
            Verdict::Error => "ERROR",
        })
    }
}

/// A verdict with its explanation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assessment {
    pub verdict: Verdict,
    pub diagnostic: String,
}

impl Assessment {
    fn pass(diagnostic: String) -> Self {
        Self {
            verdict: Verdict::Pass,
            diagnostic,
        }
    }

    fn fail(diagnostic: String) -> Self {
        Self {
            verdict: Verdict::Fail,
            diagnostic,
        }
    }
}

/// Judge a record against the expectations of its case
pub fn validate(case: &TestCase, record: &ExecutionRecord) -> Assessment {
    // 1. transport failures fail regardless of what the case expects
    if record.is_transport_error() {
        return Assessment::fail(format!("transport error: {}", record.diagnostic));
    }

    // 2. HTTP status
    let Some(status) = record.http_status else {
        return Assessment::fail("no HTTP status recorded".to_string());
    };
    if status != case.expected_status {
        let mut diag = format!(
            "expected HTTP status {}, got {}",
            case.expected_status, status
        );
        if let Some(code) = record.return_code() {
            diag.push_str(&format!(" (return {})", code));
        }
        if let Some(message) = record.message() {
            diag.push_str(&format!(": {}", message));
        }
        return Assessment::fail(diag);
    }

    // 3. application return code
    match record.return_code() {
        Some(code) if code != case.expected_code => {
            let mut diag = format!("expected return code {}, got {}", case.expected_code, code);
            if let Some(message) = record.message() {
                diag.push_str(&format!(": {}", message));
            }
            return Assessment::fail(diag);
        }
        Some(_) => {}
        None => {
            if let Some(diag) = missing_code(case, &record.body) {
                return Assessment::fail(diag);
            }
        }
    }

    // 4. timing
    if let Some(bound) = case.timing_bound {
        if record.elapsed > bound {
            return Assessment::fail(format!(
                "response took {:.2}s, bound is {:.2}s",
                record.elapsed.as_secs_f64(),
                bound.as_secs_f64()
            ));
        }
    }

    Assessment::pass(format!(
        "HTTP {} return {} in {:.2}s",
        status,
        case.expected_code,
        record.elapsed.as_secs_f64()
    ))
}

/// Diagnostic for a body without a usable return code, or `None` when the
/// case tolerates that
fn missing_code(case: &TestCase, body: &ResponseBody) -> Option<String> {
    let what = match body {
        ResponseBody::Json(_) => "response has no integer 'return' field".to_string(),
        ResponseBody::Empty => "response body is empty".to_string(),
        ResponseBody::Raw(_) => format!(
            "malformed response, body is not JSON: {}",
            body.preview(BODY_PREVIEW_CHARS)
        ),
    };

    if case.expects_success() {
        Some(format!("{} (success payload required)", what))
    } else if case.expected_code != 0 {
        Some(format!("{} (expected return code {})", what, case.expected_code))
    } else {
        None
    }
}
