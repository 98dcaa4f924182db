//! Lexical Cap'n Proto extractor with recursive import resolution.
//!
//! Same lexical subset philosophy as [`crate::proto`]: block regexes over
//! comment-stripped text, shallow bodies, compatibility-relevant facts only.
//! Generic types (`List(T)`) and `extends` clauses fall outside the subset.
//!
//! `import "file.capnp";` statements are resolved relative to the importing
//! file and loaded transitively. Imported enums and interfaces are merged
//! into the importer's schema (imported definitions win on name collision);
//! imported structs are not merged, so struct comparison covers the audited
//! file's own declarations.

use crate::error::{AuditError, Result};
use crate::schema::{
    EnumDef, EnumValue, FieldDef, InterfaceDef, MethodDef, Param, Schema, SchemaDialect, StructDef,
};
use regex::Regex;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(#|//).*").unwrap());
static IMPORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"import\s+"([^"]+)"\s*;"#).unwrap());
static ENUM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"enum\s+(\w+)\s*\{([^}]*)\}").unwrap());
static ENUM_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w+)\s*@\s*(\d+)\s*;").unwrap());
static STRUCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"struct\s+(\w+)\s*\{([^}]*)\}").unwrap());
static STRUCT_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w+)\s*@\s*(\d+)\s*:\s*([\w.]+)\s*;").unwrap());
static INTERFACE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"interface\s+(\w+)\s*(?:@\s*0x[0-9a-fA-F]+)?\s*\{([^}]*)\}").unwrap()
});
static METHOD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\w+)\s*@\s*(\d+)\s*\(([^)]*)\)\s*(?:->\s*\(([^)]*)\))?\s*;").unwrap()
});
static PARAM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\w+)\s*:\s*([\w.]+)").unwrap());

/// Loads a `.capnp` file and every file it transitively imports, merged into
/// one [`Schema`].
///
/// An import that names a missing file is fatal. Import cycles terminate:
/// each file is loaded at most once per call, keyed by canonical path, so a
/// diamond import is also merged only once.
pub fn load_schema(path: &Path) -> Result<Schema> {
    let mut visited = HashSet::new();
    load_with_visited(path, &mut visited)
}

fn load_with_visited(path: &Path, visited: &mut HashSet<PathBuf>) -> Result<Schema> {
    let canonical = fs::canonicalize(path).map_err(|source| AuditError::Extraction {
        path: path.to_path_buf(),
        source,
    })?;
    if !visited.insert(canonical.clone()) {
        // Already loaded on this walk. Contributes nothing new.
        return Ok(Schema::new(SchemaDialect::Capnp));
    }

    let text = fs::read_to_string(&canonical).map_err(|source| AuditError::Extraction {
        path: canonical.clone(),
        source,
    })?;
    let mut schema = parse_schema(&text);

    let dir = canonical.parent().unwrap_or_else(|| Path::new("."));
    // Imports are scanned in the raw text, not the comment-stripped form.
    for caps in IMPORT.captures_iter(&text) {
        let import = caps[1].to_string();
        let import_path = dir.join(&import);
        if !import_path.is_file() {
            return Err(AuditError::ImportResolution {
                import,
                from: canonical.clone(),
            });
        }
        tracing::debug!(import = %import_path.display(), from = %canonical.display(), "resolving import");
        let imported = load_with_visited(&import_path, visited)?;
        schema.enums.extend(imported.enums);
        schema.interfaces.extend(imported.interfaces);
    }

    Ok(schema)
}

/// Normalizes Cap'n Proto source text into a [`Schema`]. Import statements
/// are ignored here; [`load_schema`] handles resolution.
pub fn parse_schema(text: &str) -> Schema {
    let text = COMMENT.replace_all(text, "");
    let mut schema = Schema::new(SchemaDialect::Capnp);

    for caps in ENUM.captures_iter(&text) {
        let name = caps[1].to_string();
        let mut values = BTreeMap::new();
        for value in ENUM_VALUE.captures_iter(&caps[2]) {
            let Ok(ordinal) = value[2].parse::<u32>() else {
                continue;
            };
            values.insert(
                ordinal,
                EnumValue {
                    name: value[1].to_string(),
                    ordinal,
                },
            );
        }
        schema.enums.insert(name.clone(), EnumDef { name, values });
    }

    for caps in STRUCT.captures_iter(&text) {
        let name = caps[1].to_string();
        let mut fields = BTreeMap::new();
        for field in STRUCT_FIELD.captures_iter(&caps[2]) {
            let Ok(ordinal) = field[2].parse::<u32>() else {
                continue;
            };
            fields.insert(
                ordinal,
                FieldDef {
                    name: field[1].to_string(),
                    ordinal,
                    type_name: field[3].to_string(),
                },
            );
        }
        schema
            .structs
            .insert(name.clone(), StructDef { name, fields });
    }

    for caps in INTERFACE.captures_iter(&text) {
        let name = caps[1].to_string();
        let mut methods = BTreeMap::new();
        for method in METHOD.captures_iter(&caps[2]) {
            let Ok(ordinal) = method[2].parse::<u32>() else {
                continue;
            };
            let method_name = method[1].to_string();
            methods.insert(
                method_name.clone(),
                MethodDef {
                    name: method_name,
                    ordinal: Some(ordinal),
                    params: parse_params(&method[3]),
                    results: method.get(4).map(|m| parse_params(m.as_str())).unwrap_or_default(),
                },
            );
        }
        schema
            .interfaces
            .insert(name.clone(), InterfaceDef { name, methods });
    }

    schema
}

/// Parses a `name :Type, name :Type` list into positional params. Parameter
/// names are dropped; position and type carry the compatibility contract.
fn parse_params(text: &str) -> Vec<Param> {
    PARAM
        .captures_iter(text)
        .map(|caps| Param::required(&caps[2]))
        .collect()
}
