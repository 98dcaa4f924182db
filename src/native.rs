//! Native ABI extractor backed by libclang.
//!
//! Walks the AST of a C/C++ header or translation unit and records every
//! function and method declaration as a name keyed signature. Type spellings
//! are canonical (typedefs resolved), so `MyInt` and `int` compare equal.
//! Overloads are not distinguished: a later declaration of the same name
//! overwrites an earlier one.
//!
//! Compiler arguments come from a compilation database entry when one matches
//! the input file, otherwise from a default argument set built around the
//! configured language standard and the host compiler's include search path.

use crate::config::NativeConfig;
use crate::error::{AuditError, Result};
use crate::schema::{FunctionSignature, NativeApi, Param};
use clang::{Clang, Entity, EntityKind, EntityVisitResult, Index};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::{Mutex, MutexGuard, OnceLock};

// libclang is a per-process singleton; concurrent Clang handles are not
// allowed, so extraction is serialized.
static CLANG_GUARD: Mutex<()> = Mutex::new(());

static SYSTEM_INCLUDES: OnceLock<std::result::Result<Vec<String>, String>> = OnceLock::new();

/// Parameter kinds that indicate a default argument in the declaration.
const DEFAULT_ARG_KINDS: &[EntityKind] = &[
    EntityKind::IntegerLiteral,
    EntityKind::FloatingLiteral,
    EntityKind::StringLiteral,
    EntityKind::BoolLiteralExpr,
    EntityKind::NullPtrLiteralExpr,
    EntityKind::UnexposedExpr,
];

/// Extracts the exported function surface of one C/C++ file.
///
/// A missing input file and an unusable toolchain are fatal. A file that is
/// present but fails to parse degrades to an empty surface with
/// [`NativeApi::degraded`] set, so the caller can tell it apart from a
/// revision whose functions were genuinely removed.
pub fn extract_api(path: &Path, config: &NativeConfig) -> Result<NativeApi> {
    if !path.is_file() {
        return Err(AuditError::Extraction {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        });
    }

    let args = match compile_db_args(&config.compile_db, path) {
        Some(args) => {
            tracing::debug!(file = %path.display(), "using compilation database arguments");
            args
        }
        None => default_args(config)?,
    };

    let _guard = clang_guard();
    let clang = Clang::new().map_err(AuditError::Toolchain)?;
    let index = Index::new(&clang, false, false);
    let tu = match index.parser(path).arguments(&args).parse() {
        Ok(tu) => tu,
        Err(err) => {
            let message = err.to_string();
            tracing::warn!(
                file = %path.display(),
                error = %message,
                "file did not parse; treating interface as empty"
            );
            let mut api = NativeApi::new();
            api.degraded = Some(message);
            return Ok(api);
        }
    };

    let mut api = NativeApi::new();
    tu.get_entity().visit_children(|entity, _parent| {
        if matches!(
            entity.get_kind(),
            EntityKind::FunctionDecl | EntityKind::Method
        ) {
            if let (Some(name), Some(signature)) = (entity.get_name(), signature_of(&entity)) {
                api.functions.insert(name, signature);
            }
        }
        EntityVisitResult::Recurse
    });
    Ok(api)
}

fn clang_guard() -> MutexGuard<'static, ()> {
    CLANG_GUARD
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn signature_of(entity: &Entity) -> Option<FunctionSignature> {
    let return_type = entity
        .get_type()?
        .get_result_type()?
        .get_canonical_type()
        .get_display_name();
    let params = entity
        .get_arguments()
        .unwrap_or_default()
        .iter()
        .filter_map(|param| {
            let type_name = param.get_type()?.get_canonical_type().get_display_name();
            Some(Param {
                type_name,
                required: !has_default_argument(param),
            })
        })
        .collect();
    Some(FunctionSignature {
        return_type,
        params,
    })
}

fn has_default_argument(param: &Entity) -> bool {
    param
        .get_children()
        .iter()
        .any(|child| DEFAULT_ARG_KINDS.contains(&child.get_kind()))
}

#[derive(Deserialize)]
struct CompileDbEntry {
    file: String,
    #[serde(default)]
    arguments: Vec<String>,
}

/// Looks up compiler arguments for `source` in a compilation database.
/// A missing or malformed database is not an error; the defaults apply.
fn compile_db_args(db_path: &Path, source: &Path) -> Option<Vec<String>> {
    let text = fs::read_to_string(db_path).ok()?;
    let entries: Vec<CompileDbEntry> = match serde_json::from_str(&text) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::debug!(db = %db_path.display(), error = %err, "compilation database unreadable");
            return None;
        }
    };
    let needle = source.to_string_lossy();
    let entry = entries.into_iter().find(|e| e.file.contains(needle.as_ref()))?;
    if entry.arguments.len() < 2 {
        return None;
    }
    // arguments[0] is the compiler executable, not an argument.
    Some(entry.arguments[1..].to_vec())
}

fn default_args(config: &NativeConfig) -> Result<Vec<String>> {
    let mut args = vec![
        "-x".to_string(),
        "c++".to_string(),
        format!("-std={}", config.std),
    ];
    if let Some(sysroot) = macos_sysroot() {
        args.push("-isysroot".to_string());
        args.push(sysroot);
    }
    for path in system_include_paths()? {
        args.push(format!("-I{path}"));
    }
    args.extend(config.extra_args.iter().cloned());
    Ok(args)
}

fn macos_sysroot() -> Option<String> {
    if !cfg!(target_os = "macos") {
        return None;
    }
    let output = Command::new("xcrun")
        .args(["--show-sdk-path"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!path.is_empty()).then_some(path)
}

/// Returns the host compiler's system include directories, discovered once
/// per process. A discovery failure is remembered and reported on every
/// subsequent extraction.
fn system_include_paths() -> Result<&'static [String]> {
    match SYSTEM_INCLUDES.get_or_init(discover_system_includes) {
        Ok(paths) => Ok(paths.as_slice()),
        Err(message) => Err(AuditError::Toolchain(message.clone())),
    }
}

fn discover_system_includes() -> std::result::Result<Vec<String>, String> {
    let output = Command::new("clang++")
        .args(["-E", "-x", "c++", "-", "-v"])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .map_err(|err| format!("failed to run clang++: {err}"))?;
    let stderr = String::from_utf8_lossy(&output.stderr);
    let paths = parse_include_block(&stderr);
    tracing::debug!(count = paths.len(), "discovered system include paths");
    Ok(paths)
}

/// Extracts the directory list between `#include <...> search starts here:`
/// and `End of search list.` in the compiler's verbose preprocessor output.
fn parse_include_block(stderr: &str) -> Vec<String> {
    let mut paths = Vec::new();
    let mut in_block = false;
    for line in stderr.lines() {
        if line.starts_with("#include <...> search starts here:") {
            in_block = true;
            continue;
        }
        if line.starts_with("End of search list.") {
            break;
        }
        if in_block {
            let path = line.trim().trim_end_matches(" (framework directory)");
            if !path.is_empty() {
                paths.push(path.to_string());
            }
        }
    }
    paths
}
