//! Request execution
//!
//! Turns one case into one HTTP exchange and normalizes the outcome into an
//! [`ExecutionRecord`]. Non-2xx responses are ordinary outcomes here; only
//! transport failures (timeouts, refused connections, unreadable bodies)
//! mark a record as `Error`. The only error that escapes is an unrecoverable
//! authentication failure: a failed re-login, or a rejection that persists
//! after one.

mod record;

pub use record::{ExecutionRecord, ResponseBody};

use std::time::Instant;

use async_trait::async_trait;

use crate::common::{Error, Result};
use crate::session::{is_auth_rejection, Credentials, SessionContext, Target, TransportPolicy};
use crate::suite::{Method, Payload};

/// Something that can open a session and dispatch requests in order
///
/// The runner drives suites through this trait; [`RequestExecutor`] is the
/// HTTP implementation.
#[async_trait]
pub trait Dispatcher: Send {
    /// Authenticate before the first request
    async fn open(&mut self) -> Result<()>;

    /// Send one request and return its (pre-assertion) record
    ///
    /// Returns `Err` only for errors where [`Error::is_fatal`] holds.
    async fn dispatch(
        &mut self,
        method: Method,
        uri: &str,
        payload: Option<&Payload>,
    ) -> Result<ExecutionRecord>;
}

/// HTTP dispatcher owning one session
pub struct RequestExecutor {
    target: Target,
    credentials: Credentials,
    policy: TransportPolicy,
    warm_up: bool,
    session: Option<SessionContext>,
}

impl RequestExecutor {
    pub fn new(target: Target, credentials: Credentials, policy: TransportPolicy) -> Self {
        Self {
            target,
            credentials,
            policy,
            warm_up: true,
            session: None,
        }
    }

    /// Whether to open the connection before the first timed request
    pub fn warm_up(mut self, enabled: bool) -> Self {
        self.warm_up = enabled;
        self
    }
}

#[async_trait]
impl Dispatcher for RequestExecutor {
    async fn open(&mut self) -> Result<()> {
        let session = SessionContext::acquire(
            self.target.clone(),
            self.credentials.clone(),
            self.policy.clone(),
        )
        .await?;

        if self.warm_up {
            warm_up(&session).await;
        }
        self.session = Some(session);
        Ok(())
    }

    async fn dispatch(
        &mut self,
        method: Method,
        uri: &str,
        payload: Option<&Payload>,
    ) -> Result<ExecutionRecord> {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| Error::Internal("dispatch called before open".to_string()))?;
        execute(session, method, uri, payload).await
    }
}

/// Make sure a pooled connection is open before the first timed request
///
/// Login already reaches the target through the same client, so this only
/// does work when the appliance closed the login connection (some answer
/// the probe or token endpoint with `Connection: close`). It is cheap
/// otherwise, since the idle pooled connection is reused.
async fn warm_up(session: &SessionContext) {
    let url = session.target().url("/");
    match session.client().head(&url).send().await {
        Ok(resp) => tracing::debug!(status = resp.status().as_u16(), "Warm-up complete"),
        Err(e) => tracing::debug!(error = %e, "Warm-up request failed, continuing"),
    }
}

/// Execute one request against the session
///
/// A 401/403 answer triggers one re-authentication and one retry. If the
/// re-authentication fails, or the retry is rejected again, an
/// authentication error is returned so the runner can fault the suite.
pub async fn execute(
    session: &mut SessionContext,
    method: Method,
    uri: &str,
    payload: Option<&Payload>,
) -> Result<ExecutionRecord> {
    let record = send(session, method, uri, payload).await;

    match record.http_status {
        Some(status) if is_auth_rejection(status_code(status)) => {
            session.reauthenticate().await?;
            let mut retried = send(session, method, uri, payload).await;
            retried.attempts = 2;
            match retried.http_status {
                Some(status) if is_auth_rejection(status_code(status)) => {
                    Err(Error::authentication(&session.target().host, status))
                }
                _ => Ok(retried),
            }
        }
        _ => Ok(record),
    }
}

fn status_code(status: u16) -> reqwest::StatusCode {
    reqwest::StatusCode::from_u16(status).unwrap_or(reqwest::StatusCode::INTERNAL_SERVER_ERROR)
}

/// One timed request/response exchange
async fn send(
    session: &SessionContext,
    method: Method,
    uri: &str,
    payload: Option<&Payload>,
) -> ExecutionRecord {
    let url = session.target().url(uri);
    let mut request = session.client().request(method.into(), &url);
    if let Some(payload) = payload {
        request = request.json(payload);
    }
    let request = session.attach(request);

    tracing::debug!(%method, %url, "Dispatching request");

    let started = Instant::now();
    let response = match request.send().await {
        Ok(response) => response,
        Err(e) => {
            let err = session.transport_error(&e);
            return ExecutionRecord::transport_failure(method, uri, started.elapsed(), &err);
        }
    };

    let status = response.status().as_u16();
    let bytes = match response.bytes().await {
        Ok(bytes) => bytes,
        Err(e) => {
            let err = session.transport_error(&e);
            return ExecutionRecord::transport_failure(method, uri, started.elapsed(), &err);
        }
    };
    let elapsed = started.elapsed();

    tracing::debug!(
        %method,
        uri,
        status,
        elapsed_ms = elapsed.as_millis() as u64,
        "Response received"
    );

    ExecutionRecord::response(method, uri, elapsed, status, ResponseBody::from_bytes(&bytes))
}
