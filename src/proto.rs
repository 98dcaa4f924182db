//! Lexical protobuf/gRPC extractor.
//!
//! Deliberately not a grammar-correct parser: enums, messages and services
//! are recognized with block regexes and the compatibility-relevant facts
//! (names, field numbers, types, rpc shapes) are lifted out. Bodies match up
//! to the first closing brace, so nested definitions inside a message are
//! not traversed.

use crate::error::{AuditError, Result};
use crate::schema::{
    EnumDef, EnumValue, FieldDef, InterfaceDef, MethodDef, Param, Schema, SchemaDialect, StructDef,
};
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

static COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"//.*").unwrap());
static ENUM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"enum\s+(\w+)\s*\{([^}]*)\}").unwrap());
static ENUM_VALUE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\w+)\s*=\s*(\d+)\s*;").unwrap());
static MESSAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"message\s+(\w+)\s*\{([^}]*)\}").unwrap());
static FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:optional|required|repeated)?\s*([\w.]+)\s+(\w+)\s*=\s*(\d+)").unwrap()
});
static SERVICE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"service\s+(\w+)\s*\{([^}]*)\}").unwrap());
static RPC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"rpc\s+(\w+)\s*\(\s*([\w.]+)\s*\)\s*returns\s*\(\s*([\w.]+)\s*\)").unwrap()
});

/// Loads and normalizes a `.proto` file. Protobuf imports are not followed;
/// each file is audited on its own declarations.
pub fn load_schema(path: &Path) -> Result<Schema> {
    let text = fs::read_to_string(path).map_err(|source| AuditError::Extraction {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_schema(&text))
}

/// Normalizes protobuf source text into a [`Schema`].
pub fn parse_schema(text: &str) -> Schema {
    let text = COMMENT.replace_all(text, "");
    let mut schema = Schema::new(SchemaDialect::Proto);

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

    for caps in MESSAGE.captures_iter(&text) {
        let name = caps[1].to_string();
        let mut fields = BTreeMap::new();
        for field in FIELD.captures_iter(&caps[2]) {
            let Ok(ordinal) = field[3].parse::<u32>() else {
                continue;
            };
            fields.insert(
                ordinal,
                FieldDef {
                    name: field[2].to_string(),
                    ordinal,
                    // The optional/required/repeated label is dropped: it does
                    // not change the wire identity of the field number.
                    type_name: field[1].to_string(),
                },
            );
        }
        schema
            .structs
            .insert(name.clone(), StructDef { name, fields });
    }

    for caps in SERVICE.captures_iter(&text) {
        let name = caps[1].to_string();
        let mut methods = BTreeMap::new();
        for rpc in RPC.captures_iter(&caps[2]) {
            let method_name = rpc[1].to_string();
            methods.insert(
                method_name.clone(),
                MethodDef {
                    name: method_name,
                    ordinal: None,
                    params: vec![Param::required(&rpc[2])],
                    results: vec![Param::required(&rpc[3])],
                },
            );
        }
        schema
            .interfaces
            .insert(name.clone(), InterfaceDef { name, methods });
    }

    schema
}
