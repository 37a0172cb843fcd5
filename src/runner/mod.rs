//! Suite runner
//!
//! Drives one suite through `Idle → Authenticating → Running(read) →
//! Running(create) → Running(update) → Running(delete) → Completed`.
//! Cases run strictly one at a time in declared order, and a failing case
//! never stops the phase: every declared case is executed. Only an
//! authentication failure that survives re-authentication moves the run to
//! `Faulted`, after which no further requests are sent.

mod cancel;

pub use cancel::Cancellation;

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::common::Error;
use crate::executor::{Dispatcher, ExecutionRecord};
use crate::report::Reporter;
use crate::suite::{Phase, Suite, TestCase};
use crate::validate::{validate, Verdict};

/// Runner state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Authenticating,
    Running(Phase),
    Completed,
    Faulted,
    Cancelled,
}

impl RunState {
    /// Whether `self → next` is a legal transition
    pub fn can_transition(self, next: RunState) -> bool {
        use RunState::*;
        match (self, next) {
            (Idle, Authenticating) | (Idle, Cancelled) => true,
            (Authenticating, Running(Phase::Read)) => true,
            (Authenticating, Faulted) | (Authenticating, Cancelled) => true,
            (Running(from), Running(to)) => phase_index(to) == phase_index(from) + 1,
            (Running(Phase::Delete), Completed) => true,
            (Running(_), Faulted) | (Running(_), Cancelled) => true,
            _ => false,
        }
    }
}

fn phase_index(phase: Phase) -> usize {
    Phase::ORDER.iter().position(|p| *p == phase).unwrap_or(0)
}

/// How a suite run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Completed,
    Faulted { reason: String },
    Cancelled,
}

/// Everything a suite run produced
#[derive(Debug, Clone, Serialize)]
pub struct SuiteResult {
    pub suite: String,
    pub uri: String,
    pub outcome: RunOutcome,
    pub records: Vec<ExecutionRecord>,
    /// Declared cases, including those never reached
    pub total_cases: usize,
    #[serde(rename = "elapsed_secs", serialize_with = "as_secs")]
    pub elapsed: Duration,
}

fn as_secs<S: serde::Serializer>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(d.as_secs_f64())
}

impl SuiteResult {
    fn count(&self, verdict: Verdict) -> usize {
        self.records
            .iter()
            .filter(|r| r.final_verdict() == verdict)
            .count()
    }

    pub fn passed(&self) -> usize {
        self.count(Verdict::Pass)
    }

    pub fn failed(&self) -> usize {
        self.count(Verdict::Fail)
    }

    pub fn errored(&self) -> usize {
        self.count(Verdict::Error)
    }

    /// Cases that were declared but never executed
    pub fn skipped(&self) -> usize {
        self.total_cases.saturating_sub(self.records.len())
    }

    /// Completed with every case passing
    pub fn is_success(&self) -> bool {
        self.outcome == RunOutcome::Completed && self.records.iter().all(|r| r.final_verdict().is_pass())
    }
}

/// Runs one suite over a dispatcher it exclusively owns
pub struct SuiteRunner<'a, D: Dispatcher> {
    suite: &'a Suite,
    dispatcher: D,
    cancel: Cancellation,
    state: RunState,
    records: Vec<ExecutionRecord>,
}

impl<'a, D: Dispatcher> SuiteRunner<'a, D> {
    pub fn new(suite: &'a Suite, dispatcher: D) -> Self {
        Self {
            suite,
            dispatcher,
            cancel: Cancellation::new(),
            state: RunState::Idle,
            records: Vec::new(),
        }
    }

    /// Observe an external cancellation signal between cases
    pub fn with_cancellation(mut self, cancel: Cancellation) -> Self {
        self.cancel = cancel;
        self
    }

    fn transition(&mut self, next: RunState) {
        debug_assert!(
            self.state.can_transition(next),
            "illegal transition {:?} -> {:?}",
            self.state,
            next
        );
        tracing::debug!(suite = %self.suite.name, from = ?self.state, to = ?next, "State transition");
        self.state = next;
    }

    /// Run every phase and return the collected records
    pub async fn run(mut self, reporter: &mut dyn Reporter) -> SuiteResult {
        let started = Instant::now();
        reporter.suite_started(self.suite);

        let outcome = self.drive(reporter).await;

        let result = SuiteResult {
            suite: self.suite.name.clone(),
            uri: self.suite.primary_uri.clone(),
            outcome,
            records: self.records,
            total_cases: self.suite.total_cases(),
            elapsed: started.elapsed(),
        };
        reporter.suite_finished(&result);
        result
    }

    async fn drive(&mut self, reporter: &mut dyn Reporter) -> RunOutcome {
        if self.cancel.is_cancelled() {
            self.transition(RunState::Cancelled);
            return RunOutcome::Cancelled;
        }

        self.transition(RunState::Authenticating);
        if let Err(e) = self.dispatcher.open().await {
            tracing::error!(suite = %self.suite.name, error = %e, "Could not open session");
            self.transition(RunState::Faulted);
            return RunOutcome::Faulted {
                reason: e.to_string(),
            };
        }

        let suite = self.suite;
        for phase in Phase::ORDER {
            self.transition(RunState::Running(phase));
            let cases = suite.cases(phase);
            if !cases.is_empty() {
                tracing::info!(suite = %suite.name, %phase, cases = cases.len(), "Running phase");
            }

            for case in cases {
                if self.cancel.is_cancelled() {
                    tracing::warn!(suite = %suite.name, "Run cancelled, discarding remaining cases");
                    self.transition(RunState::Cancelled);
                    return RunOutcome::Cancelled;
                }

                if let Err(e) = self.run_case(phase, case, reporter).await {
                    tracing::error!(suite = %suite.name, case = %case.name, error = %e, "Suite faulted");
                    self.transition(RunState::Faulted);
                    return RunOutcome::Faulted {
                        reason: e.to_string(),
                    };
                }
            }
        }

        self.transition(RunState::Completed);
        RunOutcome::Completed
    }

    /// Dispatch, judge and record one case. Errors only on fatal failures,
    /// in which case an `Error` record for the case has already been kept.
    async fn run_case(
        &mut self,
        phase: Phase,
        case: &TestCase,
        reporter: &mut dyn Reporter,
    ) -> Result<(), Error> {
        let suite = self.suite;
        let method = phase.method();
        let uri = suite.effective_uri(case);

        let (record, fatal) = match self.dispatcher.dispatch(method, uri, case.payload.as_ref()).await {
            Ok(record) => (record, None),
            Err(e) => {
                let record =
                    ExecutionRecord::transport_failure(method, uri, Duration::ZERO, &e);
                if e.is_fatal() {
                    (record, Some(e))
                } else {
                    (record, None)
                }
            }
        };

        let record = record.for_case(phase, &case.name);
        if record.is_transport_error() && case.is_provisioning() {
            tracing::warn!(
                suite = %suite.name,
                case = %case.name,
                uri,
                error = %record.diagnostic,
                "Provisioning case failed at transport level; dependent cases will still run"
            );
        }

        let assessment = validate(case, &record);
        let record = record.finalize(assessment);
        tracing::debug!(case = %case.name, verdict = %record.final_verdict(), "{}", record.diagnostic);

        reporter.case_finished(&record);
        self.records.push(record);

        match fatal {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
