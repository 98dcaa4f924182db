//! Normalized interface model shared by all extractors.
//!
//! Extractors reduce their input to these types; the comparator never sees
//! source text. Every keyed collection is a `BTreeMap` so iteration order,
//! report order and the serialized form are stable across runs.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// The schema language a [`Schema`] was extracted from.
///
/// The model is shared; the dialect only drives the nouns used in
/// diagnostics (Struct/Interface for Cap'n Proto, Message/Service for
/// protobuf) and a few wording differences for method changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SchemaDialect {
    Capnp,
    Proto,
}

impl SchemaDialect {
    pub fn struct_noun(&self) -> &'static str {
        match self {
            SchemaDialect::Capnp => "Struct",
            SchemaDialect::Proto => "Message",
        }
    }

    pub fn interface_noun(&self) -> &'static str {
        match self {
            SchemaDialect::Capnp => "Interface",
            SchemaDialect::Proto => "Service",
        }
    }
}

//==============================================================================
// Schema entities (Cap'n Proto and protobuf)
//==============================================================================

/// A single named enum value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumValue {
    pub name: String,
    pub ordinal: u32,
}

/// An enum definition. Values are keyed by ordinal: the ordinal is the wire
/// identity, so renames and renumberings fall out of the map structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumDef {
    pub name: String,
    pub values: BTreeMap<u32, EnumValue>,
}

/// A struct or message field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDef {
    pub name: String,
    pub ordinal: u32,
    pub type_name: String,
}

/// A struct (Cap'n Proto) or message (protobuf). Fields are keyed by
/// ordinal/field number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructDef {
    pub name: String,
    pub fields: BTreeMap<u32, FieldDef>,
}

/// A positional parameter or result.
///
/// Schema methods always have `required = true`; native parameters clear it
/// when a default argument is present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Param {
    pub type_name: String,
    pub required: bool,
}

impl Param {
    pub fn required(type_name: impl Into<String>) -> Self {
        Param {
            type_name: type_name.into(),
            required: true,
        }
    }
}

/// A method on an interface or service.
///
/// `ordinal` is present for Cap'n Proto methods (`name @N`) and `None` for
/// protobuf rpcs, which have no wire-level method number in this subset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodDef {
    pub name: String,
    pub ordinal: Option<u32>,
    pub params: Vec<Param>,
    pub results: Vec<Param>,
}

/// An interface (Cap'n Proto) or service (protobuf). Methods are keyed by
/// name: method names are the call identity in both dialects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceDef {
    pub name: String,
    pub methods: BTreeMap<String, MethodDef>,
}

/// The normalized content of one schema file (plus, for Cap'n Proto, its
/// transitively imported enums and interfaces).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schema {
    pub dialect: SchemaDialect,
    pub enums: BTreeMap<String, EnumDef>,
    pub structs: BTreeMap<String, StructDef>,
    pub interfaces: BTreeMap<String, InterfaceDef>,
}

impl Schema {
    pub fn new(dialect: SchemaDialect) -> Self {
        Schema {
            dialect,
            enums: BTreeMap::new(),
            structs: BTreeMap::new(),
            interfaces: BTreeMap::new(),
        }
    }
}

//==============================================================================
// Native entities (C/C++)
//==============================================================================

/// A native function signature: canonical return type plus ordered
/// parameters. Two signatures are the same ABI surface iff they compare
/// equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionSignature {
    pub return_type: String,
    pub params: Vec<Param>,
}

impl fmt::Display for FunctionSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn(")?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", param.type_name)?;
            if !param.required {
                write!(f, "?")?;
            }
        }
        write!(f, ") -> {}", self.return_type)
    }
}

/// The exported function surface of one native header or translation unit.
///
/// `degraded` records the parse diagnostic when extraction fell back to an
/// empty map, so an unparseable header is distinguishable from one whose
/// functions were all removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NativeApi {
    pub functions: BTreeMap<String, FunctionSignature>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degraded: Option<String>,
}

impl NativeApi {
    pub fn new() -> Self {
        NativeApi {
            functions: BTreeMap::new(),
            degraded: None,
        }
    }
}

impl Default for NativeApi {
    fn default() -> Self {
        Self::new()
    }
}
