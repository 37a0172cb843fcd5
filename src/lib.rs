//! api-e2e - declarative end-to-end tests for an appliance REST API
//!
//! Suites are data: a resource URI plus ordered read, create, update and
//! delete cases. The runner executes them over one authenticated session,
//! the validator turns each response into a verdict and reporters print or
//! serialize the results.

pub mod cli;
pub mod commands;
pub mod common;
pub mod executor;
pub mod report;
pub mod runner;
pub mod session;
pub mod suite;
pub mod validate;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use executor::{Dispatcher, ExecutionRecord, RequestExecutor, ResponseBody};
pub use runner::{Cancellation, RunOutcome, RunState, SuiteResult, SuiteRunner};
pub use suite::{Method, Phase, Suite, SuiteRegistry, TestCase};
pub use validate::{Assessment, Verdict};
