pub mod capnp;
pub mod compat;
pub mod config;
pub mod error;
pub mod native;
pub mod proto;
pub mod schema;

pub use compat::{NativeReport, SchemaReport, Verdict, check_functions, check_schemas};
pub use config::{CheckConfig, NativeConfig};
pub use error::{AuditError, Result};
pub use schema::{NativeApi, Schema};

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// The interface format family of an input file, decided by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Native,
    Capnp,
    Proto,
}

impl Format {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext {
            "h" | "hh" | "hpp" | "hxx" | "c" | "cc" | "cpp" | "cxx" => Ok(Format::Native),
            "capnp" => Ok(Format::Capnp),
            "proto" => Ok(Format::Proto),
            _ => Err(AuditError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

/// The result of one audit run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuditReport {
    Schema(SchemaAudit),
    Native(NativeAudit),
}

/// Audit result for the schema formats (Cap'n Proto, protobuf).
#[derive(Debug, Clone, Serialize)]
pub struct SchemaAudit {
    pub old_fingerprint: String,
    pub new_fingerprint: String,
    pub report: SchemaReport,
}

/// Audit result for native C/C++ surfaces.
#[derive(Debug, Clone, Serialize)]
pub struct NativeAudit {
    pub old_path: PathBuf,
    pub new_path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_degraded: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_degraded: Option<String>,
    pub report: NativeReport,
}

impl AuditReport {
    /// Whether the audit found changes that break existing consumers.
    pub fn is_breaking(&self) -> bool {
        match self {
            AuditReport::Schema(audit) => audit.report.verdict() == Verdict::Incompatible,
            AuditReport::Native(audit) => audit.report.is_breaking(),
        }
    }

    /// Whether the audit found any change worth reporting at all.
    pub fn is_clean(&self) -> bool {
        match self {
            AuditReport::Schema(audit) => audit.report.findings.is_empty(),
            AuditReport::Native(audit) => {
                let report = &audit.report;
                report.removed.is_empty() && report.changed.is_empty() && report.added.is_empty()
            }
        }
    }
}

/// Audits two revisions of one interface file.
///
/// Both inputs must share a format. Extraction runs once per file, then the
/// comparator walks the two models. Errors abort the audit; compatibility
/// findings never do.
pub fn audit_files(old_path: &Path, new_path: &Path, config: &CheckConfig) -> Result<AuditReport> {
    let old_format = Format::from_path(old_path)?;
    let new_format = Format::from_path(new_path)?;
    if old_format != new_format {
        return Err(AuditError::FormatMismatch {
            old: old_path.to_path_buf(),
            new: new_path.to_path_buf(),
        });
    }

    match old_format {
        Format::Capnp => {
            let old = capnp::load_schema(old_path)?;
            let new = capnp::load_schema(new_path)?;
            schema_audit(&old, &new)
        }
        Format::Proto => {
            let old = proto::load_schema(old_path)?;
            let new = proto::load_schema(new_path)?;
            schema_audit(&old, &new)
        }
        Format::Native => {
            let old = native::extract_api(old_path, &config.native)?;
            let new = native::extract_api(new_path, &config.native)?;
            Ok(AuditReport::Native(NativeAudit {
                old_path: old_path.to_path_buf(),
                new_path: new_path.to_path_buf(),
                old_degraded: old.degraded.clone(),
                new_degraded: new.degraded.clone(),
                report: check_functions(&old, &new),
            }))
        }
    }
}

fn schema_audit(old: &Schema, new: &Schema) -> Result<AuditReport> {
    let old_fingerprint = fingerprint(old)?;
    let new_fingerprint = fingerprint(new)?;
    // Identical fingerprints mean identical models; skip the rule walk.
    let report = if old_fingerprint == new_fingerprint {
        SchemaReport::default()
    } else {
        check_schemas(old, new)
    };
    Ok(AuditReport::Schema(SchemaAudit {
        old_fingerprint,
        new_fingerprint,
        report,
    }))
}

/// Generates a semantic fingerprint for an extracted model.
///
/// The fingerprint is a SHA-256 hash of the model's canonical JSON
/// rendering. Extraction strips comments and the sorted maps erase
/// declaration order, so the fingerprint only moves when names, ordinals or
/// types move.
pub fn fingerprint<T: Serialize>(model: &T) -> Result<String> {
    let json_string = serde_json::to_string_pretty(model)?;
    let mut hasher = Sha256::new();
    hasher.update(json_string.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_dispatch_by_extension() {
        assert_eq!(
            Format::from_path(Path::new("api.h")).expect("native"),
            Format::Native
        );
        assert_eq!(
            Format::from_path(Path::new("api.hpp")).expect("native"),
            Format::Native
        );
        assert_eq!(
            Format::from_path(Path::new("api.capnp")).expect("capnp"),
            Format::Capnp
        );
        assert_eq!(
            Format::from_path(Path::new("api.proto")).expect("proto"),
            Format::Proto
        );
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = Format::from_path(Path::new("api.txt")).expect_err("unsupported");
        assert!(matches!(err, AuditError::UnsupportedFormat(_)));
    }

    #[test]
    fn mismatched_formats_are_rejected_before_extraction() {
        let err = audit_files(
            Path::new("old.capnp"),
            Path::new("new.proto"),
            &CheckConfig::default(),
        )
        .expect_err("mismatch");
        assert!(matches!(err, AuditError::FormatMismatch { .. }));
    }

    #[test]
    fn fingerprint_is_stable_and_content_sensitive() {
        let a = proto::parse_schema("message M { int32 id = 1; }");
        let b = proto::parse_schema("// changed comment\nmessage M {\n  int32 id = 1;\n}");
        let c = proto::parse_schema("message M { int64 id = 1; }");
        let fp_a = fingerprint(&a).expect("fingerprint");
        let fp_b = fingerprint(&b).expect("fingerprint");
        let fp_c = fingerprint(&c).expect("fingerprint");
        assert_eq!(fp_a, fp_b);
        assert_ne!(fp_a, fp_c);
    }

    #[test]
    fn fingerprint_ignores_declaration_order() {
        let a = proto::parse_schema("message A { int32 x = 1; } message B { int32 y = 1; }");
        let b = proto::parse_schema("message B { int32 y = 1; } message A { int32 x = 1; }");
        assert_eq!(
            fingerprint(&a).expect("fingerprint"),
            fingerprint(&b).expect("fingerprint")
        );
    }
}
