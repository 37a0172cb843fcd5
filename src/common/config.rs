//! Configuration file handling
//!
//! The config file only supplies defaults; every value can be overridden
//! from the command line through [`Overrides`].

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::paths::config_path;
use super::{Error, Result};
use crate::session::{AuthMethod, Credentials, Scheme, Target, TransportPolicy};

/// Environment variable consulted when no password is configured
pub const PASSWORD_ENV: &str = "API_E2E_PASSWORD";

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Appliance to test against
    #[serde(default)]
    pub target: TargetConfig,

    /// Credential material and login method
    #[serde(default)]
    pub auth: AuthConfig,

    /// Timeout settings
    #[serde(default)]
    pub timeouts: Timeouts,

    /// Run behaviour
    #[serde(default)]
    pub run: RunConfig,
}

/// Target appliance settings
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    #[serde(default = "default_host")]
    pub host: String,

    /// Port, omitted from URLs when unset
    pub port: Option<u16>,

    #[serde(default)]
    pub scheme: Scheme,

    /// Verify the appliance's TLS certificate. Appliances usually ship
    /// self-signed certificates, hence the default.
    #[serde(default)]
    pub verify_tls: bool,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: None,
            scheme: Scheme::default(),
            verify_tls: false,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

/// Authentication settings
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    #[serde(default)]
    pub method: AuthMethod,

    #[serde(default = "default_username")]
    pub username: String,

    pub password: Option<String>,

    /// Endpoint issuing bearer tokens (jwt method)
    #[serde(default = "default_token_uri")]
    pub token_uri: String,

    /// Endpoint used to verify credentials (local and token methods)
    #[serde(default = "default_probe_uri")]
    pub probe_uri: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            method: AuthMethod::default(),
            username: default_username(),
            password: None,
            token_uri: default_token_uri(),
            probe_uri: default_probe_uri(),
        }
    }
}

fn default_username() -> String {
    "admin".to_string()
}
fn default_token_uri() -> String {
    "/api/v1/access_token".to_string()
}
fn default_probe_uri() -> String {
    "/api/v1/system/api".to_string()
}

/// Timeout settings in seconds
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Timeouts {
    /// Global ceiling for a single request, independent of any resp_time
    #[serde(default = "default_request")]
    pub request_secs: u64,

    /// TCP/TLS connect timeout
    #[serde(default = "default_connect")]
    pub connect_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            request_secs: default_request(),
            connect_secs: default_connect(),
        }
    }
}

fn default_request() -> u64 {
    30
}
fn default_connect() -> u64 {
    10
}

/// Run settings
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Open the connection before the first case so its setup cost is not timed
    #[serde(default = "default_warm_up")]
    pub warm_up: bool,

    /// Extra directory of suite files registered at startup
    pub suites_dir: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            warm_up: default_warm_up(),
            suites_dir: None,
        }
    }
}

fn default_warm_up() -> bool {
    true
}

/// Command-line values that take precedence over the config file
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub scheme: Option<Scheme>,
    pub insecure: bool,
    pub verify_tls: bool,
    pub auth: Option<AuthMethod>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout_secs: Option<u64>,
    pub no_warm_up: bool,
}

impl Config {
    /// Load configuration from `path`, or from the default config file
    ///
    /// Returns default configuration if the default file doesn't exist. An
    /// explicitly given path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match config_path() {
                Some(p) if p.exists() => p,
                _ => return Ok(Self::default()),
            },
        };

        let content = std::fs::read_to_string(&path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::ConfigParse(e.to_string()))
    }

    /// Apply command-line overrides in place
    pub fn apply_overrides(&mut self, o: Overrides) {
        if let Some(host) = o.host {
            self.target.host = host;
        }
        if o.port.is_some() {
            self.target.port = o.port;
        }
        if let Some(scheme) = o.scheme {
            self.target.scheme = scheme;
        }
        if o.insecure {
            self.target.verify_tls = false;
        } else if o.verify_tls {
            self.target.verify_tls = true;
        }
        if let Some(method) = o.auth {
            self.auth.method = method;
        }
        if let Some(username) = o.username {
            self.auth.username = username;
        }
        if o.password.is_some() {
            self.auth.password = o.password;
        }
        if let Some(secs) = o.timeout_secs {
            self.timeouts.request_secs = secs;
        }
        if o.no_warm_up {
            self.run.warm_up = false;
        }
    }

    pub fn target(&self) -> Target {
        Target {
            scheme: self.target.scheme,
            host: self.target.host.clone(),
            port: self.target.port,
        }
    }

    pub fn transport_policy(&self) -> TransportPolicy {
        TransportPolicy {
            verify_tls: self.target.verify_tls,
            request_timeout: Duration::from_secs(self.timeouts.request_secs),
            connect_timeout: Duration::from_secs(self.timeouts.connect_secs),
        }
    }

    /// Resolve credentials, falling back to the password environment variable
    pub fn credentials(&self) -> Result<Credentials> {
        let password = match &self.auth.password {
            Some(p) => p.clone(),
            None => std::env::var(PASSWORD_ENV).map_err(|_| {
                Error::Config(format!(
                    "No password configured. Pass --password, set [auth].password or {}",
                    PASSWORD_ENV
                ))
            })?,
        };

        Ok(Credentials {
            method: self.auth.method,
            username: self.auth.username.clone(),
            password,
            token_uri: self.auth.token_uri.clone(),
            probe_uri: self.auth.probe_uri.clone(),
        })
    }
}
