//! Error types for the E2E engine
//!
//! Only a few of these ever escape a suite run: transport failures are turned
//! into `Error` verdicts by the executor, and assertion mismatches are plain
//! `Fail` verdicts. What is left here is what the caller has to act on.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the engine
#[derive(Error, Debug)]
pub enum Error {
    // === Connectivity Errors ===
    #[error("Cannot reach {host}: {message}")]
    Connectivity { host: String, message: String },

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    // === Authentication Errors ===
    #[error("Authentication rejected by {host} (HTTP {status}). Check username/password or --auth method")]
    Authentication { host: String, status: u16 },

    #[error("Token endpoint '{0}' did not return a token in data.token")]
    TokenMissing(String),

    // === Suite Definition Errors ===
    #[error("Failed to parse suite '{path}': {message}")]
    SuiteParse { path: String, message: String },

    #[error("Invalid suite '{suite}': {reason}")]
    SuiteInvalid { suite: String, reason: String },

    #[error("Suite '{0}' not found. Use 'api-e2e list' to see registered suites")]
    SuiteNotFound(String),

    #[error("Suite '{0}' is already registered")]
    DuplicateSuite(String),

    #[error("Unsupported suite file extension '{0}' (expected yaml, yml, json or toml)")]
    UnsupportedFormat(String),

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Internal Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a connectivity error for a host
    pub fn connectivity(host: &str, message: impl ToString) -> Self {
        Self::Connectivity {
            host: host.to_string(),
            message: message.to_string(),
        }
    }

    /// Create an authentication error
    pub fn authentication(host: &str, status: u16) -> Self {
        Self::Authentication {
            host: host.to_string(),
            status,
        }
    }

    /// Create a suite validation error
    pub fn suite_invalid(suite: &str, reason: impl ToString) -> Self {
        Self::SuiteInvalid {
            suite: suite.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a suite parse error
    pub fn suite_parse(path: &str, message: impl ToString) -> Self {
        Self::SuiteParse {
            path: path.to_string(),
            message: message.to_string(),
        }
    }

    /// Errors that must stop a suite instead of becoming a per-case verdict
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Authentication { .. } | Error::TokenMissing(_))
    }

    /// Map a reqwest error onto our taxonomy
    pub fn from_transport(host: &str, err: &reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            Error::Timeout(timeout_secs)
        } else if err.is_decode() || err.is_body() {
            Error::MalformedResponse(err.to_string())
        } else {
            Error::connectivity(host, err)
        }
    }
}
