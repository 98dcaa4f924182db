//! Core types for compatibility findings

use crate::schema::FunctionSignature;
use serde::Serialize;

/// How severe a single finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    /// Consumers must be recompiled or regenerated, but the wire contract
    /// and call sites survive.
    SourceCompatible,
    /// Existing consumers break at the wire or call level.
    Incompatible,
}

/// Overall verdict of an audit, the maximum severity over all findings.
///
/// The derived order is the escalation order: a report's verdict only ever
/// moves up as findings are added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Verdict {
    /// No observed change affects consumers.
    Compatible,
    /// Consumers need a rebuild against regenerated sources.
    SourceCompatible,
    /// Existing consumers break.
    Incompatible,
}

/// The specific change a finding reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChangeKind {
    EnumRemoved,
    EnumValueRemoved,
    EnumValueOrdinalChanged,
    EnumValueRenamed,
    StructRemoved,
    FieldRemoved,
    FieldTypeChanged,
    FieldRenamed,
    InterfaceRemoved,
    MethodRemoved,
    MethodOrdinalChanged,
    ParamsRemoved,
    ParamTypeChanged,
    ResultsRemoved,
    ResultTypeChanged,
}

impl ChangeKind {
    pub fn severity(&self) -> Severity {
        match self {
            // Renames leave ordinals and types intact: the wire contract
            // holds, only generated identifiers move.
            ChangeKind::EnumValueRenamed | ChangeKind::FieldRenamed => Severity::SourceCompatible,
            _ => Severity::Incompatible,
        }
    }
}

/// One classified schema change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub kind: ChangeKind,
    pub severity: Severity,
    pub message: String,
}

impl Finding {
    pub fn new(kind: ChangeKind, message: String) -> Self {
        Finding {
            severity: kind.severity(),
            kind,
            message,
        }
    }
}

/// The complete result of comparing two schemas.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaReport {
    pub findings: Vec<Finding>,
}

impl SchemaReport {
    pub fn verdict(&self) -> Verdict {
        self.findings
            .iter()
            .map(|finding| match finding.severity {
                Severity::SourceCompatible => Verdict::SourceCompatible,
                Severity::Incompatible => Verdict::Incompatible,
            })
            .max()
            .unwrap_or(Verdict::Compatible)
    }

    pub fn incompatible(&self) -> impl Iterator<Item = &Finding> {
        self.findings
            .iter()
            .filter(|finding| finding.severity == Severity::Incompatible)
    }

    pub fn source_compatible(&self) -> impl Iterator<Item = &Finding> {
        self.findings
            .iter()
            .filter(|finding| finding.severity == Severity::SourceCompatible)
    }
}

/// One function whose presence or signature differs between revisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionDiff {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old: Option<FunctionSignature>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new: Option<FunctionSignature>,
}

/// The complete result of comparing two native surfaces.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NativeReport {
    pub removed: Vec<FunctionDiff>,
    pub changed: Vec<FunctionDiff>,
    /// Present only in the new revision. Informational; never breaking.
    pub added: Vec<FunctionDiff>,
}

impl NativeReport {
    pub fn is_breaking(&self) -> bool {
        !self.removed.is_empty() || !self.changed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_escalation_order() {
        assert!(Verdict::Compatible < Verdict::SourceCompatible);
        assert!(Verdict::SourceCompatible < Verdict::Incompatible);
    }

    #[test]
    fn empty_report_is_compatible() {
        assert_eq!(SchemaReport::default().verdict(), Verdict::Compatible);
    }

    #[test]
    fn verdict_is_max_severity() {
        let report = SchemaReport {
            findings: vec![
                Finding::new(
                    ChangeKind::FieldRenamed,
                    "Message 'M': field @1 name changed a -> b".to_string(),
                ),
                Finding::new(
                    ChangeKind::FieldRemoved,
                    "Message 'M': field @2 removed".to_string(),
                ),
            ],
        };
        assert_eq!(report.verdict(), Verdict::Incompatible);
        assert_eq!(report.incompatible().count(), 1);
        assert_eq!(report.source_compatible().count(), 1);
    }

    #[test]
    fn renames_are_source_compatible() {
        assert_eq!(
            ChangeKind::EnumValueRenamed.severity(),
            Severity::SourceCompatible
        );
        assert_eq!(
            ChangeKind::FieldRenamed.severity(),
            Severity::SourceCompatible
        );
        assert_eq!(ChangeKind::FieldRemoved.severity(), Severity::Incompatible);
    }
}
