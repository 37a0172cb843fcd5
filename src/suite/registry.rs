//! Suite registry
//!
//! Suites are registered explicitly at startup (built-ins, files, directories)
//! and the runner iterates the registry afterwards. Registration order is
//! preserved and is the order suites run in.

use std::path::Path;

use super::loader::{self, Format};
use super::model::Suite;
use crate::common::{Error, Result};

/// Fixture suites shipped with the binary
const BUILTIN_SUITES: &[(&str, &str)] = &[
    ("firewall_nat_port_forward", include_str!("../../suites/firewall_nat_port_forward.yaml")),
    ("firewall_states", include_str!("../../suites/firewall_states.yaml")),
    ("interface", include_str!("../../suites/interface.yaml")),
    ("routing_gateway", include_str!("../../suites/routing_gateway.yaml")),
    ("system_dns_server", include_str!("../../suites/system_dns_server.yaml")),
    ("user_auth_server_radius", include_str!("../../suites/user_auth_server_radius.yaml")),
];

/// Ordered collection of suites, unique by name
#[derive(Debug, Default)]
pub struct SuiteRegistry {
    suites: Vec<Suite>,
}

impl SuiteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the bundled fixture suites
    pub fn with_builtin() -> Result<Self> {
        let mut registry = Self::new();
        registry.register_builtin()?;
        Ok(registry)
    }

    /// Register the bundled fixture suites
    pub fn register_builtin(&mut self) -> Result<()> {
        for (name, content) in BUILTIN_SUITES {
            let suite = loader::parse_str(content, Format::Yaml, name)?;
            self.register(suite)?;
        }
        Ok(())
    }

    /// Register a suite. Names must be unique.
    pub fn register(&mut self, suite: Suite) -> Result<()> {
        loader::validate(&suite)?;
        if self.get(&suite.name).is_some() {
            return Err(Error::DuplicateSuite(suite.name));
        }
        tracing::debug!(
            suite = %suite.name,
            uri = %suite.primary_uri,
            cases = suite.total_cases(),
            "Registered suite"
        );
        self.suites.push(suite);
        Ok(())
    }

    /// Load and register one suite file
    pub fn load_file(&mut self, path: &Path) -> Result<()> {
        let suite = loader::load_file(path)?;
        self.register(suite)
    }

    /// Load every suite file in a directory, in file name order
    ///
    /// Files with unsupported extensions are skipped. Returns how many suites
    /// were registered.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize> {
        let entries = std::fs::read_dir(dir).map_err(|e| Error::FileRead {
            path: dir.display().to_string(),
            error: e.to_string(),
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && Format::from_path(&path).is_ok() {
                paths.push(path);
            }
        }
        paths.sort();

        for path in &paths {
            self.load_file(path)?;
        }
        Ok(paths.len())
    }

    pub fn get(&self, name: &str) -> Option<&Suite> {
        self.suites.iter().find(|s| s.name == name)
    }

    /// Suites whose name contains `filter`; an exact name match wins outright
    pub fn select(&self, filter: Option<&str>) -> Result<Vec<&Suite>> {
        let Some(filter) = filter else {
            return Ok(self.suites.iter().collect());
        };

        if let Some(exact) = self.get(filter) {
            return Ok(vec![exact]);
        }

        let matched: Vec<&Suite> = self
            .suites
            .iter()
            .filter(|s| s.name.contains(filter))
            .collect();
        if matched.is_empty() {
            return Err(Error::SuiteNotFound(filter.to_string()));
        }
        Ok(matched)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Suite> {
        self.suites.iter()
    }

    pub fn len(&self) -> usize {
        self.suites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.suites.is_empty()
    }
}
