//! Declarative suite definitions
//!
//! A suite is pure data: one resource URI and four ordered phase lists of
//! test cases. This module owns the typed model, the file loader and the
//! registry the runner iterates.

mod loader;
mod model;
mod registry;

pub use loader::{load_file, parse_str, validate, Format};
pub use model::*;
pub use registry::SuiteRegistry;
