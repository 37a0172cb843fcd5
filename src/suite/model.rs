//! Suite and test case types
//!
//! These mirror the fixture contract: a suite has one primary `uri` and four
//! ordered phase lists, each case carries `name`, an optional `uri` override,
//! a `payload` and the `status` / `return` / `resp_time` expectations.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// HTTP status a case expects when the fixture omits `status`
pub const DEFAULT_STATUS: u16 = 200;

/// Return code a case expects when the fixture omits `return`
pub const DEFAULT_RETURN_CODE: i64 = 0;

/// Request body fields, passed to the API verbatim and in declared order
pub type Payload = serde_json::Map<String, Value>;

/// HTTP method of a case, implied by its phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// One of the four ordered groups of cases in a suite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Read,
    Create,
    Update,
    Delete,
}

impl Phase {
    /// Execution order of phases. Fixed regardless of how a suite file lists them.
    pub const ORDER: [Phase; 4] = [Phase::Read, Phase::Create, Phase::Update, Phase::Delete];

    pub fn method(&self) -> Method {
        match self {
            Phase::Read => Method::Get,
            Phase::Create => Method::Post,
            Phase::Update => Method::Put,
            Phase::Delete => Method::Delete,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Read => "read",
            Phase::Create => "create",
            Phase::Update => "update",
            Phase::Delete => "delete",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single request/expectation unit
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestCase {
    /// Human-readable name, unique within its phase
    pub name: String,

    /// Endpoint used instead of the suite's primary URI. A case with an
    /// override provisions or removes a dependency of the resource under test.
    #[serde(default, rename = "uri")]
    pub uri_override: Option<String>,

    /// Request body; absent means no body is sent
    #[serde(default)]
    pub payload: Option<Payload>,

    #[serde(default = "default_status", rename = "status")]
    pub expected_status: u16,

    #[serde(default, rename = "return")]
    pub expected_code: i64,

    /// Maximum elapsed time for the request (fixture key `resp_time`, seconds)
    #[serde(default, rename = "resp_time", deserialize_with = "deserialize_bound")]
    pub timing_bound: Option<Duration>,
}

fn default_status() -> u16 {
    DEFAULT_STATUS
}

fn deserialize_bound<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = Option::<f64>::deserialize(deserializer)?;
    secs.map(|s| {
        if s > 0.0 {
            Duration::try_from_secs_f64(s).map_err(serde::de::Error::custom)
        } else {
            Err(serde::de::Error::custom(format!(
                "resp_time must be a positive number of seconds, got {}",
                s
            )))
        }
    })
    .transpose()
}

impl TestCase {
    /// Create a case with the default expectations (HTTP 200, return 0, no bound)
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uri_override: None,
            payload: None,
            expected_status: DEFAULT_STATUS,
            expected_code: DEFAULT_RETURN_CODE,
            timing_bound: None,
        }
    }

    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri_override = Some(uri.into());
        self
    }

    /// Set the payload from a JSON object. Non-object values are ignored.
    pub fn payload(mut self, payload: Value) -> Self {
        if let Value::Object(map) = payload {
            self.payload = Some(map);
        }
        self
    }

    pub fn status(mut self, status: u16) -> Self {
        self.expected_status = status;
        self
    }

    pub fn returns(mut self, code: i64) -> Self {
        self.expected_code = code;
        self
    }

    pub fn resp_time(mut self, bound: Duration) -> Self {
        self.timing_bound = Some(bound);
        self
    }

    /// Whether this case targets a dependency rather than the primary resource
    pub fn is_provisioning(&self) -> bool {
        self.uri_override.is_some()
    }

    /// Whether the case expects a 2xx response
    pub fn expects_success(&self) -> bool {
        (200..300).contains(&self.expected_status)
    }
}

/// The cases for one primary API resource
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Suite {
    /// Suite name; the loader fills this from the file stem when omitted
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Resource endpoint under test
    #[serde(rename = "uri")]
    pub primary_uri: String,

    #[serde(default, rename = "read", alias = "get_tests")]
    pub read_cases: Vec<TestCase>,

    #[serde(default, rename = "create", alias = "post_tests")]
    pub create_cases: Vec<TestCase>,

    #[serde(default, rename = "update", alias = "put_tests")]
    pub update_cases: Vec<TestCase>,

    #[serde(default, rename = "delete", alias = "delete_tests")]
    pub delete_cases: Vec<TestCase>,
}

impl Suite {
    pub fn new(name: impl Into<String>, primary_uri: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            primary_uri: primary_uri.into(),
            read_cases: Vec::new(),
            create_cases: Vec::new(),
            update_cases: Vec::new(),
            delete_cases: Vec::new(),
        }
    }

    /// Append a case to a phase
    pub fn with_case(mut self, phase: Phase, case: TestCase) -> Self {
        self.cases_mut(phase).push(case);
        self
    }

    pub fn read(self, case: TestCase) -> Self {
        self.with_case(Phase::Read, case)
    }

    pub fn create(self, case: TestCase) -> Self {
        self.with_case(Phase::Create, case)
    }

    pub fn update(self, case: TestCase) -> Self {
        self.with_case(Phase::Update, case)
    }

    pub fn delete(self, case: TestCase) -> Self {
        self.with_case(Phase::Delete, case)
    }

    pub fn cases(&self, phase: Phase) -> &[TestCase] {
        match phase {
            Phase::Read => &self.read_cases,
            Phase::Create => &self.create_cases,
            Phase::Update => &self.update_cases,
            Phase::Delete => &self.delete_cases,
        }
    }

    fn cases_mut(&mut self, phase: Phase) -> &mut Vec<TestCase> {
        match phase {
            Phase::Read => &mut self.read_cases,
            Phase::Create => &mut self.create_cases,
            Phase::Update => &mut self.update_cases,
            Phase::Delete => &mut self.delete_cases,
        }
    }

    /// All cases in execution order, paired with their phase
    pub fn ordered_cases(&self) -> impl Iterator<Item = (Phase, &TestCase)> + '_ {
        Phase::ORDER
            .into_iter()
            .flat_map(move |phase| self.cases(phase).iter().map(move |case| (phase, case)))
    }

    pub fn total_cases(&self) -> usize {
        Phase::ORDER.iter().map(|p| self.cases(*p).len()).sum()
    }

    /// The endpoint a case is sent to
    pub fn effective_uri<'a>(&'a self, case: &'a TestCase) -> &'a str {
        case.uri_override.as_deref().unwrap_or(&self.primary_uri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_case_defaults() {
        let case: TestCase = serde_json::from_value(json!({"name": "Read all"})).unwrap();
        assert_eq!(case.expected_status, 200);
        assert_eq!(case.expected_code, 0);
        assert_eq!(case.timing_bound, None);
        assert_eq!(case.payload, None);
        assert!(!case.is_provisioning());
        assert_eq!(case, TestCase::new("Read all"));
    }

    #[test]
    fn test_case_fixture_keys() {
        let case: TestCase = serde_json::from_value(json!({
            "name": "Test DNS server IP validation",
            "status": 400,
            "return": 1007,
            "resp_time": 2.5,
            "uri": "/api/v1/firewall/alias",
            "payload": {"dnsserver": "INVALID"}
        }))
        .unwrap();
        assert_eq!(case.expected_status, 400);
        assert_eq!(case.expected_code, 1007);
        assert_eq!(case.timing_bound, Some(Duration::from_millis(2500)));
        assert!(case.is_provisioning());
        assert!(!case.expects_success());
    }

    #[test]
    fn test_resp_time_must_be_positive() {
        let res: Result<TestCase, _> =
            serde_json::from_value(json!({"name": "x", "resp_time": 0}));
        assert!(res.is_err());
        let res: Result<TestCase, _> =
            serde_json::from_value(json!({"name": "x", "resp_time": -3}));
        assert!(res.is_err());
    }

    #[test]
    fn test_unknown_case_key_rejected() {
        let res: Result<TestCase, _> =
            serde_json::from_value(json!({"name": "x", "resp-time": 3}));
        assert!(res.is_err());
    }

    #[test]
    fn test_payload_keeps_declared_order() {
        let case = TestCase::new("x").payload(json!({"if": "em2", "descr": "a", "type": "dhcp"}));
        let keys: Vec<&str> = case.payload.as_ref().unwrap().keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["if", "descr", "type"]);
    }

    #[test]
    fn test_phase_order_and_methods() {
        let methods: Vec<Method> = Phase::ORDER.iter().map(|p| p.method()).collect();
        assert_eq!(methods, vec![Method::Get, Method::Post, Method::Put, Method::Delete]);
    }

    #[test]
    fn test_ordered_cases_ignores_declaration_order() {
        let suite = Suite::new("gw", "/api/v1/routing/gateway")
            .delete(TestCase::new("d1"))
            .update(TestCase::new("u1"))
            .create(TestCase::new("c1"))
            .read(TestCase::new("r1"))
            .create(TestCase::new("c2"));

        let order: Vec<(Phase, &str)> = suite
            .ordered_cases()
            .map(|(p, c)| (p, c.name.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                (Phase::Read, "r1"),
                (Phase::Create, "c1"),
                (Phase::Create, "c2"),
                (Phase::Update, "u1"),
                (Phase::Delete, "d1"),
            ]
        );
        assert_eq!(suite.total_cases(), 5);
    }

    #[test]
    fn test_effective_uri() {
        let suite = Suite::new("iface", "/api/v1/interface");
        let primary = TestCase::new("p");
        let alias = TestCase::new("a").uri("/api/v1/firewall/alias");
        assert_eq!(suite.effective_uri(&primary), "/api/v1/interface");
        assert_eq!(suite.effective_uri(&alias), "/api/v1/firewall/alias");
    }

    #[test]
    fn test_suite_accepts_corpus_phase_keys() {
        let suite: Suite = serde_json::from_value(json!({
            "uri": "/api/v1/firewall/states",
            "get_tests": [{"name": "Read all firewall states"}],
            "delete_tests": [{"name": "Check source requirement", "status": 400, "return": 4231}]
        }))
        .unwrap();
        assert_eq!(suite.read_cases.len(), 1);
        assert_eq!(suite.delete_cases[0].expected_code, 4231);
        assert!(suite.create_cases.is_empty());
    }
}
