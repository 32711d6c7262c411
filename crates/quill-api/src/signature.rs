//! Declared-type model for method signatures.
//!
//! A [`SignatureEntry`] is the canonical description of one declared type:
//! a scalar kind, a uniformly-typed list, or a named struct whose field
//! order is part of the declaration. Signatures are built once at startup
//! when an API definition is assembled and never mutated afterwards.

use serde::Deserialize;
use serde::Serialize;

use crate::value::Value;

/// The six scalar kinds the wire protocol distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalarKind {
    Int,
    Bool,
    String,
    Double,
    DateTime,
    Base64,
}

impl ScalarKind {
    /// Canonical name for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            ScalarKind::Int => "int",
            ScalarKind::Bool => "bool",
            ScalarKind::String => "string",
            ScalarKind::Double => "double",
            ScalarKind::DateTime => "dateTime",
            ScalarKind::Base64 => "base64",
        }
    }
}

/// Canonical declared type: scalar, list, or struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SignatureEntry {
    /// One of the six scalar kinds.
    Scalar(ScalarKind),
    /// A list whose elements all share one declared type.
    Array(Box<SignatureEntry>),
    /// A named struct with ordered fields.
    Struct(StructDescriptor),
}

impl SignatureEntry {
    /// Shorthand for a scalar entry.
    pub fn scalar(kind: ScalarKind) -> Self {
        SignatureEntry::Scalar(kind)
    }

    /// Shorthand for a list entry.
    pub fn array(element: SignatureEntry) -> Self {
        SignatureEntry::Array(Box::new(element))
    }

    /// Infer a signature entry from a concrete runtime value.
    ///
    /// Used when no declaration exists, e.g. the return value of a default
    /// method or an ad-hoc multicall response. An empty array infers a
    /// string element type since there is nothing to inspect.
    pub fn infer(value: &Value) -> Self {
        match value {
            Value::Int(_) => SignatureEntry::Scalar(ScalarKind::Int),
            Value::Bool(_) => SignatureEntry::Scalar(ScalarKind::Bool),
            Value::String(_) => SignatureEntry::Scalar(ScalarKind::String),
            Value::Double(_) => SignatureEntry::Scalar(ScalarKind::Double),
            Value::DateTime(_) => SignatureEntry::Scalar(ScalarKind::DateTime),
            Value::Base64(_) => SignatureEntry::Scalar(ScalarKind::Base64),
            Value::Array(items) => {
                let element = match items.first() {
                    Some(first) => SignatureEntry::infer(first),
                    None => SignatureEntry::Scalar(ScalarKind::String),
                };
                SignatureEntry::Array(Box::new(element))
            }
            Value::Struct(fields) => {
                let mut descriptor = StructDescriptor::new("struct");
                for (name, field_value) in fields.iter() {
                    descriptor = descriptor.field(name, SignatureEntry::infer(field_value));
                }
                SignatureEntry::Struct(descriptor)
            }
        }
    }

    /// Human-readable type name, e.g. `int`, `[string]`, `struct Article`.
    pub fn type_name(&self) -> String {
        match self {
            SignatureEntry::Scalar(kind) => kind.name().to_string(),
            SignatureEntry::Array(element) => format!("[{}]", element.type_name()),
            SignatureEntry::Struct(descriptor) => format!("struct {}", descriptor.name()),
        }
    }
}

/// Named struct declaration with ordered fields.
///
/// Field order is declaration order; casting a wire struct against this
/// descriptor produces a value whose fields follow the declared order no
/// matter how the wire ordered them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructDescriptor {
    name: String,
    fields: Vec<(String, SignatureEntry)>,
}

impl StructDescriptor {
    /// Create a descriptor with no fields yet.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Append a field. Declaration order is iteration order.
    pub fn field(mut self, name: impl Into<String>, entry: SignatureEntry) -> Self {
        self.fields.push((name.into(), entry));
        self
    }

    /// Struct name for diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared fields in declaration order.
    pub fn fields(&self) -> &[(String, SignatureEntry)] {
        &self.fields
    }
}

/// One declared parameter: a name paired with its type.
///
/// The name feeds the named-parameter view hooks receive; the entry drives
/// positional casting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    name: String,
    entry: SignatureEntry,
}

impl Param {
    pub fn new(name: impl Into<String>, entry: SignatureEntry) -> Self {
        Self {
            name: name.into(),
            entry,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entry(&self) -> &SignatureEntry {
        &self.entry
    }
}
