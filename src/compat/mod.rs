//! Compatibility comparison between two extracted interface models
//!
//! The comparator is pure: it never touches the filesystem or the toolchain.
//! Every observed change is classified and reported; comparison never stops
//! at the first problem.

pub mod native_rules;
pub mod schema_rules;
pub mod types;

pub use native_rules::check_functions;
pub use schema_rules::check_schemas;
pub use types::{ChangeKind, Finding, FunctionDiff, NativeReport, SchemaReport, Severity, Verdict};
