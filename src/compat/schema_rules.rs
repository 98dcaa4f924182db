//! Comparison rules for schema interfaces (Cap'n Proto and protobuf)
//!
//! Walks every definition of the old schema and classifies what happened to
//! it in the new one. Definitions only present in the new schema are pure
//! additions and produce no findings. Types compare as exact strings; no
//! widening or aliasing is considered compatible.

use crate::compat::types::{ChangeKind, Finding, SchemaReport};
use crate::schema::{Param, Schema, SchemaDialect};

/// Compares two schemas and reports every observed change.
pub fn check_schemas(old: &Schema, new: &Schema) -> SchemaReport {
    let mut report = SchemaReport::default();
    check_enums(old, new, &mut report);
    check_structs(old, new, &mut report);
    check_interfaces(old, new, &mut report);
    report
}

fn check_enums(old: &Schema, new: &Schema, report: &mut SchemaReport) {
    for (enum_name, old_enum) in &old.enums {
        let Some(new_enum) = new.enums.get(enum_name) else {
            report.findings.push(Finding::new(
                ChangeKind::EnumRemoved,
                format!("Enum '{enum_name}' removed"),
            ));
            continue;
        };
        for (ordinal, old_value) in &old_enum.values {
            // Wire identity is the ordinal. The name scan separates a
            // renumbered value from a removed one, and a survivor at the
            // old ordinal turns a removal into a rename.
            let by_name = new_enum
                .values
                .values()
                .find(|candidate| candidate.name == old_value.name);
            match by_name {
                Some(moved) if moved.ordinal != *ordinal => {
                    report.findings.push(Finding::new(
                        ChangeKind::EnumValueOrdinalChanged,
                        format!(
                            "Enum {enum_name}.{}: ordinal changed {ordinal} -> {}",
                            old_value.name, moved.ordinal
                        ),
                    ));
                }
                Some(_) => {}
                None => match new_enum.values.get(ordinal) {
                    Some(renamed) => {
                        report.findings.push(Finding::new(
                            ChangeKind::EnumValueRenamed,
                            format!(
                                "Enum {enum_name}: value name changed @{ordinal} {} -> {}",
                                old_value.name, renamed.name
                            ),
                        ));
                    }
                    None => {
                        report.findings.push(Finding::new(
                            ChangeKind::EnumValueRemoved,
                            format!("Enum {enum_name}: value '{}' removed", old_value.name),
                        ));
                    }
                },
            }
        }
    }
}

fn check_structs(old: &Schema, new: &Schema, report: &mut SchemaReport) {
    let noun = old.dialect.struct_noun();
    for (struct_name, old_struct) in &old.structs {
        let Some(new_struct) = new.structs.get(struct_name) else {
            report.findings.push(Finding::new(
                ChangeKind::StructRemoved,
                format!("{noun} '{struct_name}' removed"),
            ));
            continue;
        };
        for (ordinal, old_field) in &old_struct.fields {
            let Some(new_field) = new_struct.fields.get(ordinal) else {
                report.findings.push(Finding::new(
                    ChangeKind::FieldRemoved,
                    format!("{noun} '{struct_name}': field @{ordinal} removed"),
                ));
                continue;
            };
            if new_field.type_name != old_field.type_name {
                report.findings.push(Finding::new(
                    ChangeKind::FieldTypeChanged,
                    format!(
                        "{noun} '{struct_name}': field @{ordinal} type changed {} -> {}",
                        old_field.type_name, new_field.type_name
                    ),
                ));
            } else if new_field.name != old_field.name {
                report.findings.push(Finding::new(
                    ChangeKind::FieldRenamed,
                    format!(
                        "{noun} '{struct_name}': field @{ordinal} name changed {} -> {}",
                        old_field.name, new_field.name
                    ),
                ));
            }
        }
    }
}

fn check_interfaces(old: &Schema, new: &Schema, report: &mut SchemaReport) {
    let noun = old.dialect.interface_noun();
    for (iface_name, old_iface) in &old.interfaces {
        let Some(new_iface) = new.interfaces.get(iface_name) else {
            report.findings.push(Finding::new(
                ChangeKind::InterfaceRemoved,
                format!("{noun} '{iface_name}' removed"),
            ));
            continue;
        };
        for (method_name, old_method) in &old_iface.methods {
            let Some(new_method) = new_iface.methods.get(method_name) else {
                report.findings.push(Finding::new(
                    ChangeKind::MethodRemoved,
                    format!("{noun} {iface_name}: method '{method_name}' removed"),
                ));
                continue;
            };
            if let (Some(old_ord), Some(new_ord)) = (old_method.ordinal, new_method.ordinal) {
                if old_ord != new_ord {
                    report.findings.push(Finding::new(
                        ChangeKind::MethodOrdinalChanged,
                        format!(
                            "{iface_name}.{method_name}: ordinal changed {old_ord} -> {new_ord}"
                        ),
                    ));
                }
            }
            check_param_list(
                old.dialect,
                iface_name,
                method_name,
                &old_method.params,
                &new_method.params,
                ParamRole::Param,
                report,
            );
            check_param_list(
                old.dialect,
                iface_name,
                method_name,
                &old_method.results,
                &new_method.results,
                ParamRole::Result,
                report,
            );
        }
    }
}

#[derive(Clone, Copy)]
enum ParamRole {
    Param,
    Result,
}

/// Compares two positional type lists. Types at shared indices must match;
/// dropping entries is breaking, appending them is not.
fn check_param_list(
    dialect: SchemaDialect,
    iface: &str,
    method: &str,
    old_list: &[Param],
    new_list: &[Param],
    role: ParamRole,
    report: &mut SchemaReport,
) {
    if old_list.len() > new_list.len() {
        let (kind, what) = match role {
            ParamRole::Param => (ChangeKind::ParamsRemoved, "parameters"),
            ParamRole::Result => (ChangeKind::ResultsRemoved, "results"),
        };
        report
            .findings
            .push(Finding::new(kind, format!("{iface}.{method}: {what} removed")));
    }
    for (i, (old_param, new_param)) in old_list.iter().zip(new_list.iter()).enumerate() {
        if old_param.type_name != new_param.type_name {
            let kind = match role {
                ParamRole::Param => ChangeKind::ParamTypeChanged,
                ParamRole::Result => ChangeKind::ResultTypeChanged,
            };
            let slot = match (dialect, role) {
                (SchemaDialect::Capnp, ParamRole::Param) => format!("param[{i}]"),
                (SchemaDialect::Capnp, ParamRole::Result) => format!("result[{i}]"),
                (SchemaDialect::Proto, ParamRole::Param) => "input".to_string(),
                (SchemaDialect::Proto, ParamRole::Result) => "output".to_string(),
            };
            report.findings.push(Finding::new(
                kind,
                format!(
                    "{iface}.{method}: {slot} type changed {} -> {}",
                    old_param.type_name, new_param.type_name
                ),
            ));
        }
    }
}
