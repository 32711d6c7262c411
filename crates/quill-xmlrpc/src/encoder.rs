//! XML-RPC document encoding.
//!
//! Response bodies are built by hand into a `String`. Every document
//! starts with [`XML_PROLOG`] and markup characters in text content are
//! entity-escaped. A missing return value encodes as the protocol's
//! void convention, `<boolean>1</boolean>`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use snafu::ensure;

use quill_api::limits::MAX_VALUE_DEPTH;
use quill_api::Fault;
use quill_api::Value;
use quill_rpc_core::MulticallOutcome;

use crate::error::DepthExceededSnafu;
use crate::error::NonFiniteDoubleSnafu;
use crate::error::Result;

pub const XML_PROLOG: &str = "<?xml version=\"1.0\"?>\n";

/// Encode a `methodCall` document.
pub fn encode_method_call(method_name: &str, params: &[Value]) -> Result<String> {
    let mut out = String::from(XML_PROLOG);
    out.push_str("<methodCall><methodName>");
    escape_into(&mut out, method_name);
    out.push_str("</methodName><params>");
    for param in params {
        out.push_str("<param>");
        encode_value(&mut out, param, 0)?;
        out.push_str("</param>");
    }
    out.push_str("</params></methodCall>");
    Ok(out)
}

/// Encode a successful `methodResponse`. `None` is the void convention.
pub fn encode_method_response(value: Option<&Value>) -> Result<String> {
    let mut out = String::from(XML_PROLOG);
    out.push_str("<methodResponse><params><param>");
    match value {
        Some(value) => encode_value(&mut out, value, 0)?,
        None => out.push_str("<value><boolean>1</boolean></value>"),
    }
    out.push_str("</param></params></methodResponse>");
    Ok(out)
}

/// Encode a fault `methodResponse`.
///
/// Fault bodies hold exactly two scalars, so this cannot fail.
pub fn encode_fault_response(fault: &Fault) -> String {
    let mut out = String::from(XML_PROLOG);
    out.push_str("<methodResponse><fault><value><struct>");
    out.push_str("<member><name>faultCode</name><value>");
    encode_int_into(&mut out, fault.code);
    out.push_str("</value></member>");
    out.push_str("<member><name>faultString</name><value><string>");
    escape_into(&mut out, &fault.message);
    out.push_str("</string></value></member>");
    out.push_str("</struct></value></fault></methodResponse>");
    out
}

/// Encode a `system.multicall` response body.
///
/// Successful entries wrap their return value in a one-element array;
/// failed entries appear as a bare fault struct.
pub fn encode_multicall_response(outcomes: &[MulticallOutcome]) -> Result<String> {
    let mut out = String::from(XML_PROLOG);
    out.push_str("<methodResponse><params><param><value><array><data>");
    for outcome in outcomes {
        match outcome {
            MulticallOutcome::Success(value) => {
                out.push_str("<value><array><data>");
                match value {
                    Some(value) => encode_value(&mut out, value, 0)?,
                    None => out.push_str("<value><boolean>1</boolean></value>"),
                }
                out.push_str("</data></array></value>");
            }
            MulticallOutcome::Fault(fields) => {
                encode_value(&mut out, &Value::Struct(fields.clone()), 0)?;
            }
        }
    }
    out.push_str("</data></array></value></param></params></methodResponse>");
    Ok(out)
}

fn encode_value(out: &mut String, value: &Value, depth: usize) -> Result<()> {
    ensure!(depth < MAX_VALUE_DEPTH, DepthExceededSnafu { limit: MAX_VALUE_DEPTH });

    out.push_str("<value>");
    match value {
        Value::Int(n) => encode_int_into(out, *n),
        Value::Bool(b) => {
            out.push_str("<boolean>");
            out.push_str(if *b { "1" } else { "0" });
            out.push_str("</boolean>");
        }
        Value::String(text) => {
            out.push_str("<string>");
            escape_into(out, text);
            out.push_str("</string>");
        }
        Value::Double(d) => {
            ensure!(d.is_finite(), NonFiniteDoubleSnafu);
            out.push_str(&format!("<double>{d:?}</double>"));
        }
        Value::DateTime(when) => {
            out.push_str(&format!(
                "<dateTime.iso8601>{}</dateTime.iso8601>",
                when.format("%Y%m%dT%H:%M:%S")
            ));
        }
        Value::Base64(bytes) => {
            out.push_str("<base64>");
            out.push_str(&STANDARD.encode(bytes));
            out.push_str("</base64>");
        }
        Value::Array(items) => {
            out.push_str("<array><data>");
            for item in items {
                encode_value(out, item, depth + 1)?;
            }
            out.push_str("</data></array>");
        }
        Value::Struct(fields) => {
            out.push_str("<struct>");
            for (name, field) in fields.iter() {
                out.push_str("<member><name>");
                escape_into(out, name);
                out.push_str("</name>");
                encode_value(out, field, depth + 1)?;
                out.push_str("</member>");
            }
            out.push_str("</struct>");
        }
    }
    out.push_str("</value>");
    Ok(())
}

/// `i4` when the value fits 32 bits, `i8` otherwise.
fn encode_int_into(out: &mut String, n: i64) {
    if i32::try_from(n).is_ok() {
        out.push_str(&format!("<i4>{n}</i4>"));
    } else {
        out.push_str(&format!("<i8>{n}</i8>"));
    }
}

fn escape_into(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
}
