use abi_audit::compat::{ChangeKind, SchemaReport, Verdict, check_schemas};
use abi_audit::proto::parse_schema;
use abi_audit::{AuditReport, CheckConfig, audit_files, fingerprint};
use std::fs;
use std::path::Path;

fn read_fixture(file_name: &str) -> String {
    fs::read_to_string(format!("tests/data/{file_name}")).expect("Could not read test schema file")
}

fn check(old: &str, new: &str) -> SchemaReport {
    check_schemas(&parse_schema(old), &parse_schema(new))
}

#[test]
fn test_field_removal_is_breaking() {
    let old_proto = r#"
syntax = "proto3";

message Task {
  string id = 1;
  int32 attempts = 2;
}
"#;

    let new_proto = r#"
syntax = "proto3";

message Task {
  string id = 1;
  // attempts deleted in this revision
}
"#;

    let report = check(old_proto, new_proto);

    assert_eq!(
        report.verdict(),
        Verdict::Incompatible,
        "Removing a field must be incompatible"
    );
    assert_eq!(report.findings.len(), 1);
    assert_eq!(report.findings[0].kind, ChangeKind::FieldRemoved);
    assert_eq!(report.findings[0].message, "Message 'Task': field @2 removed");
}

#[test]
fn test_field_rename_at_same_number_is_source_compatible() {
    let old_proto = r#"
syntax = "proto3";

message Task {
  string id = 1;
  int32 attempts = 2;
}
"#;

    let new_proto = r#"
syntax = "proto3";

message Task {
  string id = 1;
  int32 retries = 2;
}
"#;

    let report = check(old_proto, new_proto);

    assert_eq!(
        report.verdict(),
        Verdict::SourceCompatible,
        "Same number and type, new name: wire format is untouched"
    );
    assert_eq!(report.findings.len(), 1);
    assert_eq!(
        report.findings[0].message,
        "Message 'Task': field @2 name changed attempts -> retries"
    );
}

#[test]
fn test_field_type_change_is_breaking() {
    let old_proto = "message Counter { int32 total = 1; }";
    let new_proto = "message Counter { int64 total = 1; }";

    let report = check(old_proto, new_proto);

    // Types compare as exact strings; no widening is considered safe.
    assert_eq!(report.verdict(), Verdict::Incompatible);
    assert_eq!(
        report.findings[0].message,
        "Message 'Counter': field @1 type changed int32 -> int64"
    );
}

#[test]
fn test_rpc_input_type_change_is_breaking() {
    let old_proto = r#"
service Tracker {
  rpc Report (Task) returns (Receipt);
}
"#;

    let new_proto = r#"
service Tracker {
  rpc Report (TaskV2) returns (Receipt);
}
"#;

    let report = check(old_proto, new_proto);

    assert_eq!(report.verdict(), Verdict::Incompatible);
    assert_eq!(report.findings.len(), 1);
    assert_eq!(report.findings[0].kind, ChangeKind::ParamTypeChanged);
    assert_eq!(
        report.findings[0].message,
        "Tracker.Report: input type changed Task -> TaskV2"
    );
}

#[test]
fn test_rpc_output_type_change_is_breaking() {
    let old_proto = "service Tracker { rpc Report (Task) returns (Receipt); }";
    let new_proto = "service Tracker { rpc Report (Task) returns (Ack); }";

    let report = check(old_proto, new_proto);

    assert_eq!(report.findings.len(), 1);
    assert_eq!(report.findings[0].kind, ChangeKind::ResultTypeChanged);
    assert_eq!(
        report.findings[0].message,
        "Tracker.Report: output type changed Receipt -> Ack"
    );
}

#[test]
fn test_rpc_removal_is_breaking() {
    let old_proto = r#"
service Tracker {
  rpc Report (Task) returns (Receipt);
  rpc Query (Receipt) returns (Task);
}
"#;

    let new_proto = r#"
service Tracker {
  rpc Report (Task) returns (Receipt);
}
"#;

    let report = check(old_proto, new_proto);

    assert_eq!(report.findings.len(), 1);
    assert_eq!(report.findings[0].kind, ChangeKind::MethodRemoved);
    assert_eq!(
        report.findings[0].message,
        "Service Tracker: method 'Query' removed"
    );
}

#[test]
fn test_service_removal_is_breaking() {
    let old_proto = "service Tracker { rpc Report (Task) returns (Receipt); }";
    let new_proto = "message Unrelated { int32 x = 1; }";

    let report = check(old_proto, new_proto);

    let removed: Vec<_> = report
        .findings
        .iter()
        .filter(|f| f.kind == ChangeKind::InterfaceRemoved)
        .collect();
    assert_eq!(removed.len(), 1);
    assert_eq!(removed[0].message, "Service 'Tracker' removed");
}

#[test]
fn test_enum_value_renumber_is_breaking() {
    let old_proto = r#"
enum Phase {
  PHASE_UNSPECIFIED = 0;
  PHASE_ACTIVE = 1;
}
"#;

    let new_proto = r#"
enum Phase {
  PHASE_UNSPECIFIED = 0;
  PHASE_ACTIVE = 5;
}
"#;

    let report = check(old_proto, new_proto);

    assert_eq!(report.findings.len(), 1);
    assert_eq!(report.findings[0].kind, ChangeKind::EnumValueOrdinalChanged);
    assert_eq!(
        report.findings[0].message,
        "Enum Phase.PHASE_ACTIVE: ordinal changed 1 -> 5"
    );
}

#[test]
fn test_additions_do_not_raise_verdict() {
    let old_proto = read_fixture("tracker.proto");
    let new_proto = r#"
syntax = "proto3";

package tracker;

enum Phase {
    PHASE_UNSPECIFIED = 0;
    PHASE_ACTIVE = 1;
    PHASE_DONE = 2;
    PHASE_ABANDONED = 3;
}

message Task {
    string id = 1;
    int32 attempts = 2;
    Phase phase = 3;
    string owner = 4;
}

message Receipt {
    string id = 1;
    int64 accepted_at = 2;
}

message Audit {
    string who = 1;
}

service Tracker {
    rpc Report (Task) returns (Receipt);
    rpc Query (Receipt) returns (Task);
    rpc Purge (Receipt) returns (Receipt);
}
"#;

    let report = check(&old_proto, new_proto);

    assert!(
        report.findings.is_empty(),
        "Pure additions must produce no findings, got: {:?}",
        report.findings
    );
    assert_eq!(report.verdict(), Verdict::Compatible);
}

#[test]
fn test_fingerprint_ignores_formatting_and_declaration_order() {
    let base = parse_schema(&read_fixture("tracker.proto"));
    let cosmetic = parse_schema(&read_fixture("tracker_cosmetic.proto"));

    assert_eq!(
        fingerprint(&base).expect("fingerprint"),
        fingerprint(&cosmetic).expect("fingerprint"),
        "Cosmetic changes should not alter the fingerprint"
    );
}

#[test]
fn test_fingerprint_detects_semantic_change() {
    let base = parse_schema(&read_fixture("tracker.proto"));
    let breaking = parse_schema(&read_fixture("tracker_breaking.proto"));
    let renamed = parse_schema(&read_fixture("tracker_renamed.proto"));

    let base_fp = fingerprint(&base).expect("fingerprint");
    assert_ne!(base_fp, fingerprint(&breaking).expect("fingerprint"));
    assert_ne!(base_fp, fingerprint(&renamed).expect("fingerprint"));
}

#[test]
fn test_audit_short_circuits_on_equal_fingerprints() {
    let report = audit_files(
        Path::new("tests/data/tracker.proto"),
        Path::new("tests/data/tracker_cosmetic.proto"),
        &CheckConfig::default(),
    )
    .expect("audit");

    assert!(report.is_clean());
    let AuditReport::Schema(audit) = report else {
        panic!("expected a schema audit");
    };
    assert_eq!(audit.old_fingerprint, audit.new_fingerprint);
    assert!(audit.report.findings.is_empty());
}

#[test]
fn test_audit_reports_fixture_break() {
    let report = audit_files(
        Path::new("tests/data/tracker.proto"),
        Path::new("tests/data/tracker_breaking.proto"),
        &CheckConfig::default(),
    )
    .expect("audit");

    assert!(report.is_breaking());
    assert!(!report.is_clean());
    let AuditReport::Schema(audit) = report else {
        panic!("expected a schema audit");
    };
    assert_ne!(audit.old_fingerprint, audit.new_fingerprint);
    assert_eq!(audit.report.findings.len(), 1);
    assert_eq!(
        audit.report.findings[0].message,
        "Message 'Task': field @2 removed"
    );
}
