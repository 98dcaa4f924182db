//! Comparison rules for native function surfaces

use crate::compat::types::{FunctionDiff, NativeReport};
use crate::schema::NativeApi;

/// Partitions the two function maps into removed, changed and added entries.
///
/// A function counts as changed when any part of its signature differs:
/// return type, parameter types, parameter count or a parameter's default
/// status. Added functions are informational and never breaking.
pub fn check_functions(old: &NativeApi, new: &NativeApi) -> NativeReport {
    let mut report = NativeReport::default();
    for (name, old_sig) in &old.functions {
        match new.functions.get(name) {
            None => report.removed.push(FunctionDiff {
                name: name.clone(),
                old: Some(old_sig.clone()),
                new: None,
            }),
            Some(new_sig) if new_sig != old_sig => report.changed.push(FunctionDiff {
                name: name.clone(),
                old: Some(old_sig.clone()),
                new: Some(new_sig.clone()),
            }),
            Some(_) => {}
        }
    }
    for (name, new_sig) in &new.functions {
        if !old.functions.contains_key(name) {
            report.added.push(FunctionDiff {
                name: name.clone(),
                old: None,
                new: Some(new_sig.clone()),
            });
        }
    }
    report
}
