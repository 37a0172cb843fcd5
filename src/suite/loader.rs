//! Suite file loading
//!
//! Suites are plain data files. The format is picked from the extension and
//! every suite is validated before it can be registered, so that a broken
//! fixture is reported up front instead of halfway through a run against the
//! appliance.

use std::collections::HashSet;
use std::path::Path;

use super::model::{Phase, Suite};
use crate::common::{Error, Result};

/// Supported suite file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
    Toml,
}

impl Format {
    /// Detect the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match ext.as_str() {
            "yaml" | "yml" => Ok(Format::Yaml),
            "json" => Ok(Format::Json),
            "toml" => Ok(Format::Toml),
            _ => Err(Error::UnsupportedFormat(ext)),
        }
    }
}

/// Load and validate a suite file
///
/// The suite name defaults to the file stem.
pub fn load_file(path: &Path) -> Result<Suite> {
    let format = Format::from_path(path)?;
    let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
        path: path.display().to_string(),
        error: e.to_string(),
    })?;

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("suite");
    parse_str(&content, format, stem)
}

/// Parse and validate suite text. `default_name` is used when the file has no `name`.
pub fn parse_str(content: &str, format: Format, default_name: &str) -> Result<Suite> {
    let mut suite: Suite = match format {
        Format::Yaml => {
            serde_yaml::from_str(content).map_err(|e| Error::suite_parse(default_name, e))?
        }
        Format::Json => {
            serde_json::from_str(content).map_err(|e| Error::suite_parse(default_name, e))?
        }
        Format::Toml => toml::from_str(content).map_err(|e| Error::suite_parse(default_name, e))?,
    };

    if suite.name.trim().is_empty() {
        suite.name = default_name.to_string();
    }

    validate(&suite)?;
    Ok(suite)
}

/// Check the structural rules a suite must satisfy to be runnable
pub fn validate(suite: &Suite) -> Result<()> {
    check_uri(suite, &suite.primary_uri, "primary uri")?;

    for phase in Phase::ORDER {
        let mut seen = HashSet::new();
        for case in suite.cases(phase) {
            if case.name.trim().is_empty() {
                return Err(Error::suite_invalid(
                    &suite.name,
                    format!("a {} case has an empty name", phase),
                ));
            }
            if !seen.insert(case.name.as_str()) {
                return Err(Error::suite_invalid(
                    &suite.name,
                    format!("duplicate case name '{}' in {} phase", case.name, phase),
                ));
            }
            if let Some(uri) = &case.uri_override {
                check_uri(suite, uri, &format!("uri of case '{}'", case.name))?;
            }
            if !(100..=599).contains(&case.expected_status) {
                return Err(Error::suite_invalid(
                    &suite.name,
                    format!(
                        "case '{}' expects HTTP status {}, which is not a valid status code",
                        case.name, case.expected_status
                    ),
                ));
            }
        }
    }

    Ok(())
}

fn check_uri(suite: &Suite, uri: &str, what: &str) -> Result<()> {
    if !uri.starts_with('/') {
        return Err(Error::suite_invalid(
            &suite.name,
            format!("{} '{}' must start with '/'", what, uri),
        ));
    }
    if uri.contains('?') {
        return Err(Error::suite_invalid(
            &suite.name,
            format!("{} '{}' must not carry a query string", what, uri),
        ));
    }
    Ok(())
}
