//! Coercion between wire values and declared signatures.
//!
//! Remote callers are loosely typed: an integer parameter may arrive as the
//! string `"42"`, a boolean as `"yes"`, a timestamp as its compact wire
//! text. Casting normalizes each positional parameter against the declared
//! signature before the service method runs, and normalizes the return
//! value before it is encoded. The dispatcher treats parameter-cast
//! failures as non-fatal (it falls back to the raw values), so errors here
//! carry enough position/field context to make the warning log useful.

use chrono::DateTime;
use chrono::NaiveDateTime;
use chrono::Utc;
use thiserror::Error;

use crate::signature::Param;
use crate::signature::ScalarKind;
use crate::signature::SignatureEntry;
use crate::value::StructValue;
use crate::value::Value;

/// A value could not be coerced to its declared type.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CastError {
    /// The runtime type cannot be converted to the declared type at all.
    #[error("cannot cast {found} to {expected}")]
    Mismatch {
        /// Declared type name.
        expected: String,
        /// Runtime type name of the offending value.
        found: &'static str,
    },

    /// The value had a convertible type but unparseable contents.
    #[error("invalid {kind} literal: {text:?}")]
    InvalidLiteral {
        /// Scalar kind being parsed.
        kind: &'static str,
        /// The offending text.
        text: String,
    },

    /// Fewer parameters were supplied than the signature declares.
    #[error("expected {declared} parameters, got {supplied}")]
    Arity { declared: usize, supplied: usize },

    /// A positional parameter failed to cast.
    #[error("parameter {position} ({name}): {source}")]
    Parameter {
        position: usize,
        name: String,
        #[source]
        source: Box<CastError>,
    },

    /// A struct field failed to cast.
    #[error("field {name}: {source}")]
    Field {
        name: String,
        #[source]
        source: Box<CastError>,
    },

    /// An array element failed to cast.
    #[error("element {index}: {source}")]
    Element {
        index: usize,
        #[source]
        source: Box<CastError>,
    },
}

/// Cast raw positional parameters against a declared parameter list.
///
/// Produces exactly one value per declared parameter, in declaration
/// order. Extra trailing parameters are dropped; a shortfall is an
/// [`CastError::Arity`] error.
pub fn cast_expects(params: &[Value], expects: &[Param]) -> Result<Vec<Value>, CastError> {
    if params.len() < expects.len() {
        return Err(CastError::Arity {
            declared: expects.len(),
            supplied: params.len(),
        });
    }

    let mut casted = Vec::with_capacity(expects.len());
    for (position, declared) in expects.iter().enumerate() {
        let value = cast_value(&params[position], declared.entry()).map_err(|source| CastError::Parameter {
            position,
            name: declared.name().to_string(),
            source: Box::new(source),
        })?;
        casted.push(value);
    }
    Ok(casted)
}

/// Cast an outbound return value.
///
/// With a declared return signature the value is coerced against it. With
/// no declaration (a default method's ad-hoc return) the signature is
/// inferred from the runtime value first, which is an identity for any
/// value whose arrays are element-uniform.
pub fn cast_returns(value: &Value, returns: Option<&SignatureEntry>) -> Result<Value, CastError> {
    match returns {
        Some(entry) => cast_value(value, entry),
        None => {
            let inferred = SignatureEntry::infer(value);
            cast_value(value, &inferred)
        }
    }
}

/// Cast one value against one signature entry.
pub fn cast_value(value: &Value, entry: &SignatureEntry) -> Result<Value, CastError> {
    match entry {
        SignatureEntry::Scalar(kind) => cast_scalar(value, *kind),
        SignatureEntry::Array(element) => cast_array(value, element),
        SignatureEntry::Struct(descriptor) => cast_struct(value, descriptor),
    }
}

fn cast_array(value: &Value, element: &SignatureEntry) -> Result<Value, CastError> {
    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(CastError::Mismatch {
                expected: format!("[{}]", element.type_name()),
                found: other.type_name(),
            });
        }
    };

    let mut casted = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let item = cast_value(item, element).map_err(|source| CastError::Element {
            index,
            source: Box::new(source),
        })?;
        casted.push(item);
    }
    Ok(Value::Array(casted))
}

fn cast_struct(value: &Value, descriptor: &crate::signature::StructDescriptor) -> Result<Value, CastError> {
    let wire = match value {
        Value::Struct(fields) => fields,
        other => {
            return Err(CastError::Mismatch {
                expected: format!("struct {}", descriptor.name()),
                found: other.type_name(),
            });
        }
    };

    // Walk the declaration, not the wire: declared order wins, unknown
    // wire fields are ignored, missing fields stay absent.
    let mut casted = StructValue::new();
    for (name, field_entry) in descriptor.fields() {
        if let Some(field_value) = wire.get(name) {
            let field_value = cast_value(field_value, field_entry).map_err(|source| CastError::Field {
                name: name.clone(),
                source: Box::new(source),
            })?;
            casted.insert(name.clone(), field_value);
        }
    }
    Ok(Value::Struct(casted))
}

fn cast_scalar(value: &Value, kind: ScalarKind) -> Result<Value, CastError> {
    match kind {
        ScalarKind::Int => cast_int(value),
        ScalarKind::Bool => cast_bool(value),
        ScalarKind::String => cast_string(value),
        ScalarKind::Double => cast_double(value),
        ScalarKind::DateTime => cast_datetime(value),
        ScalarKind::Base64 => cast_base64(value),
    }
}

fn cast_int(value: &Value) -> Result<Value, CastError> {
    match value {
        Value::Int(n) => Ok(Value::Int(*n)),
        Value::String(text) => text.trim().parse::<i64>().map(Value::Int).map_err(|_| CastError::InvalidLiteral {
            kind: "int",
            text: text.clone(),
        }),
        Value::Double(d) if d.is_finite() => Ok(Value::Int(d.trunc() as i64)),
        other => Err(mismatch("int", other)),
    }
}

fn cast_bool(value: &Value) -> Result<Value, CastError> {
    match value {
        Value::Bool(b) => Ok(Value::Bool(*b)),
        Value::String(text) => bool_from_token(text).ok_or_else(|| CastError::InvalidLiteral {
            kind: "bool",
            text: text.clone(),
        }),
        Value::Int(0) => Ok(Value::Bool(false)),
        Value::Int(1) => Ok(Value::Bool(true)),
        other => Err(mismatch("bool", other)),
    }
}

/// Accepted boolean spellings, matched case-insensitively.
fn bool_from_token(text: &str) -> Option<Value> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Some(Value::Bool(true)),
        "false" | "no" | "n" | "0" => Some(Value::Bool(false)),
        _ => None,
    }
}

fn cast_string(value: &Value) -> Result<Value, CastError> {
    match value {
        Value::String(s) => Ok(Value::String(s.clone())),
        Value::Int(n) => Ok(Value::String(n.to_string())),
        Value::Bool(b) => Ok(Value::String(b.to_string())),
        Value::Double(d) => Ok(Value::String(format!("{d:?}"))),
        Value::DateTime(t) => Ok(Value::String(t.format("%Y%m%dT%H:%M:%S").to_string())),
        Value::Base64(bytes) => match std::str::from_utf8(bytes) {
            Ok(text) => Ok(Value::String(text.to_string())),
            Err(_) => Err(mismatch("string", value)),
        },
        other => Err(mismatch("string", other)),
    }
}

fn cast_double(value: &Value) -> Result<Value, CastError> {
    match value {
        Value::Double(d) => Ok(Value::Double(*d)),
        Value::Int(n) => Ok(Value::Double(*n as f64)),
        Value::String(text) => match text.trim().parse::<f64>() {
            Ok(d) if d.is_finite() => Ok(Value::Double(d)),
            _ => Err(CastError::InvalidLiteral {
                kind: "double",
                text: text.clone(),
            }),
        },
        other => Err(mismatch("double", other)),
    }
}

fn cast_datetime(value: &Value) -> Result<Value, CastError> {
    match value {
        Value::DateTime(t) => Ok(Value::DateTime(*t)),
        Value::String(text) => parse_datetime_text(text.trim()).map(Value::DateTime).ok_or_else(|| {
            CastError::InvalidLiteral {
                kind: "dateTime",
                text: text.clone(),
            }
        }),
        other => Err(mismatch("dateTime", other)),
    }
}

/// Parse the compact wire form (`19980717T14:08:55`), the dashed variant,
/// or RFC 3339. Forms without an offset are taken as UTC.
pub fn parse_datetime_text(text: &str) -> Option<DateTime<Utc>> {
    for format in ["%Y%m%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    DateTime::parse_from_rfc3339(text).ok().map(|t| t.with_timezone(&Utc))
}

fn cast_base64(value: &Value) -> Result<Value, CastError> {
    match value {
        Value::Base64(bytes) => Ok(Value::Base64(bytes.clone())),
        Value::String(text) => Ok(Value::Base64(text.as_bytes().to_vec())),
        other => Err(mismatch("base64", other)),
    }
}

fn mismatch(expected: &str, found: &Value) -> CastError {
    CastError::Mismatch {
        expected: expected.to_string(),
        found: found.type_name(),
    }
}
