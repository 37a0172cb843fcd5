//! Session context for the appliance API
//!
//! A session holds the HTTP client (and so the connection pool), the target
//! address and the credential material. It logs in once, attaches credentials
//! to every request, and can re-authenticate when the appliance reports an
//! expired session.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use reqwest::{RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::json;

use crate::common::{Error, Result};

/// URL scheme of the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Http,
    #[default]
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

impl FromStr for Scheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(Scheme::Http),
            "https" => Ok(Scheme::Https),
            other => Err(Error::Config(format!(
                "Unknown scheme '{}'. Supported: http, https",
                other
            ))),
        }
    }
}

/// How credentials are presented to the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    /// HTTP basic credentials on every request
    #[default]
    Local,
    /// Bearer token obtained from the token endpoint
    Jwt,
    /// `Authorization: <client-id> <client-token>`
    Token,
}

impl FromStr for AuthMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "local" => Ok(AuthMethod::Local),
            "jwt" => Ok(AuthMethod::Jwt),
            "token" => Ok(AuthMethod::Token),
            other => Err(Error::Config(format!(
                "Unknown auth method '{}'. Supported: local, jwt, token",
                other
            ))),
        }
    }
}

/// Address of the appliance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub scheme: Scheme,
    pub host: String,
    pub port: Option<u16>,
}

impl Target {
    pub fn base_url(&self) -> String {
        match self.port {
            Some(port) => format!("{}://{}:{}", self.scheme.as_str(), self.host, port),
            None => format!("{}://{}", self.scheme.as_str(), self.host),
        }
    }

    /// Absolute URL for an API path
    pub fn url(&self, uri: &str) -> String {
        format!("{}{}", self.base_url(), uri)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base_url())
    }
}

/// TLS and timeout settings for the HTTP client
#[derive(Debug, Clone)]
pub struct TransportPolicy {
    pub verify_tls: bool,
    /// Ceiling for one request, from dispatch to full body
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for TransportPolicy {
    fn default() -> Self {
        Self {
            verify_tls: false,
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Credential material and the endpoints used to check it
#[derive(Clone)]
pub struct Credentials {
    pub method: AuthMethod,
    /// Username, or client id for the token method
    pub username: String,
    /// Password, or client token for the token method
    pub password: String,
    pub token_uri: String,
    pub probe_uri: String,
}

impl Credentials {
    pub fn local(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            method: AuthMethod::Local,
            username: username.into(),
            password: password.into(),
            token_uri: "/api/v1/access_token".to_string(),
            probe_uri: "/api/v1/system/api".to_string(),
        }
    }

    pub fn with_method(mut self, method: AuthMethod) -> Self {
        self.method = method;
        self
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("method", &self.method)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// An authenticated connection to one appliance
#[derive(Debug)]
pub struct SessionContext {
    client: reqwest::Client,
    target: Target,
    credentials: Credentials,
    policy: TransportPolicy,
    /// Bearer token for the jwt method
    token: Option<String>,
    reauth_count: u32,
}

impl SessionContext {
    /// Build the client and authenticate
    ///
    /// Fails with `Error::Authentication` when the appliance rejects the
    /// credentials and with `Error::Connectivity` when it cannot be reached.
    pub async fn acquire(
        target: Target,
        credentials: Credentials,
        policy: TransportPolicy,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(!policy.verify_tls)
            .timeout(policy.request_timeout)
            .connect_timeout(policy.connect_timeout)
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {}", e)))?;

        let mut session = Self {
            client,
            target,
            credentials,
            policy,
            token: None,
            reauth_count: 0,
        };
        session.authenticate().await?;

        tracing::info!(
            appliance = %session.target,
            method = ?session.credentials.method,
            "Session established"
        );
        Ok(session)
    }

    /// Add whatever the API needs to accept a request
    pub fn attach(&self, request: RequestBuilder) -> RequestBuilder {
        let creds = &self.credentials;
        match creds.method {
            AuthMethod::Local => request.basic_auth(&creds.username, Some(&creds.password)),
            AuthMethod::Jwt => match &self.token {
                Some(token) => request.bearer_auth(token),
                None => request,
            },
            AuthMethod::Token => request.header(
                reqwest::header::AUTHORIZATION,
                format!("{} {}", creds.username, creds.password),
            ),
        }
    }

    /// Log in again after the appliance rejected the current session
    pub async fn reauthenticate(&mut self) -> Result<()> {
        self.reauth_count += 1;
        tracing::warn!(
            appliance = %self.target,
            attempt = self.reauth_count,
            "Session rejected, re-authenticating"
        );
        self.token = None;
        self.authenticate().await
    }

    async fn authenticate(&mut self) -> Result<()> {
        let creds = &self.credentials;
        let response = match creds.method {
            AuthMethod::Jwt => {
                self.client
                    .post(self.target.url(&creds.token_uri))
                    .basic_auth(&creds.username, Some(&creds.password))
                    .json(&json!({
                        "client-id": creds.username,
                        "client-token": creds.password,
                    }))
                    .send()
                    .await
            }
            AuthMethod::Local | AuthMethod::Token => {
                let probe = self.client.get(self.target.url(&creds.probe_uri));
                self.attach(probe).send().await
            }
        }
        .map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        if is_auth_rejection(status) {
            return Err(Error::authentication(&self.target.host, status.as_u16()));
        }

        if creds.method == AuthMethod::Jwt {
            let body: serde_json::Value = response
                .json()
                .await
                .map_err(|_| Error::TokenMissing(creds.token_uri.clone()))?;
            let token = body
                .pointer("/data/token")
                .and_then(|t| t.as_str())
                .ok_or_else(|| Error::TokenMissing(creds.token_uri.clone()))?;
            self.token = Some(token.to_string());
        }

        tracing::debug!(status = status.as_u16(), "Authentication accepted");
        Ok(())
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Map a transport failure using this session's host and timeout
    pub fn transport_error(&self, err: &reqwest::Error) -> Error {
        Error::from_transport(&self.target.host, err, self.policy.request_timeout.as_secs())
    }
}

/// Statuses that mean the credentials or session were not accepted
pub fn is_auth_rejection(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}
