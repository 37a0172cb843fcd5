//! Execution records
//!
//! A record is created when a request completes, finalized once the
//! validator has judged it, and never modified afterwards.

use std::time::Duration;

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::common::Error;
use crate::suite::{Method, Phase};
use crate::validate::{Assessment, Verdict};

/// Response body as received
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Empty,
    Json(Value),
    /// Body that did not parse as JSON
    Raw(Vec<u8>),
}

impl ResponseBody {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        if bytes.iter().all(|b| b.is_ascii_whitespace()) {
            return ResponseBody::Empty;
        }
        match serde_json::from_slice(bytes) {
            Ok(value) => ResponseBody::Json(value),
            Err(_) => ResponseBody::Raw(bytes.to_vec()),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseBody::Json(v) => Some(v),
            _ => None,
        }
    }

    /// Printable form, cut to `limit` characters
    pub fn preview(&self, limit: usize) -> String {
        let text = match self {
            ResponseBody::Empty => return "<empty>".to_string(),
            ResponseBody::Json(v) => v.to_string(),
            ResponseBody::Raw(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        };
        if text.chars().count() > limit {
            let cut: String = text.chars().take(limit).collect();
            format!("{}...", cut)
        } else {
            text
        }
    }
}

impl Serialize for ResponseBody {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ResponseBody::Empty => serializer.serialize_none(),
            ResponseBody::Json(v) => v.serialize(serializer),
            ResponseBody::Raw(bytes) => serializer.serialize_str(&String::from_utf8_lossy(bytes)),
        }
    }
}

/// Outcome of one case
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionRecord {
    /// Case name, set by the runner
    pub case: String,
    /// Phase the case ran in, set by the runner
    pub phase: Option<Phase>,
    pub method: Method,
    pub uri: String,
    #[serde(rename = "elapsed_secs", serialize_with = "as_secs")]
    pub elapsed: Duration,
    /// HTTP status; `None` when no response was received
    pub http_status: Option<u16>,
    #[serde(rename = "response")]
    pub body: ResponseBody,
    /// Requests sent, 2 when the session was re-authenticated
    pub attempts: u8,
    /// `Some(Error)` at creation for transport failures, otherwise set by `finalize`
    pub verdict: Option<Verdict>,
    pub diagnostic: String,
}

fn as_secs<S: Serializer>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(d.as_secs_f64())
}

impl ExecutionRecord {
    /// Record for a request that received a full response
    pub fn response(
        method: Method,
        uri: &str,
        elapsed: Duration,
        status: u16,
        body: ResponseBody,
    ) -> Self {
        Self {
            case: String::new(),
            phase: None,
            method,
            uri: uri.to_string(),
            elapsed,
            http_status: Some(status),
            body,
            attempts: 1,
            verdict: None,
            diagnostic: String::new(),
        }
    }

    /// Record for a request that failed below HTTP
    pub fn transport_failure(method: Method, uri: &str, elapsed: Duration, err: &Error) -> Self {
        Self {
            case: String::new(),
            phase: None,
            method,
            uri: uri.to_string(),
            elapsed,
            http_status: None,
            body: ResponseBody::Empty,
            attempts: 1,
            verdict: Some(Verdict::Error),
            diagnostic: err.to_string(),
        }
    }

    /// Label the record with the case it belongs to
    pub fn for_case(mut self, phase: Phase, name: &str) -> Self {
        self.phase = Some(phase);
        self.case = name.to_string();
        self
    }

    pub fn is_transport_error(&self) -> bool {
        self.verdict == Some(Verdict::Error)
    }

    /// Apply the validator's judgement. Transport errors keep their `Error` verdict.
    pub fn finalize(mut self, assessment: Assessment) -> Self {
        if !self.is_transport_error() {
            self.verdict = Some(assessment.verdict);
        }
        self.diagnostic = assessment.diagnostic;
        self
    }

    /// Final verdict; an unfinalized record counts as an error
    pub fn final_verdict(&self) -> Verdict {
        self.verdict.unwrap_or(Verdict::Error)
    }

    /// The `return` code in a JSON body, if any
    pub fn return_code(&self) -> Option<i64> {
        self.body.as_json()?.get("return")?.as_i64()
    }

    /// The `message` field in a JSON body, if any
    pub fn message(&self) -> Option<&str> {
        self.body.as_json()?.get("message")?.as_str()
    }
}
