//! Fault shape carried by failed responses.

use serde::Deserialize;
use serde::Serialize;

use crate::value::StructValue;
use crate::value::Value;

/// Fault code for a failed top-level request (decode or dispatch).
pub const FAULT_CODE_REQUEST: i64 = 1;

/// Fault code for a multicall entry that failed while executing.
///
/// Paired with the `faultString` member name. Kept distinct from
/// [`FAULT_CODE_RESOLUTION`]: existing callers match on the code and
/// member name together.
pub const FAULT_CODE_EXECUTION: i64 = 3;

/// Fault code for a multicall entry that failed to resolve.
///
/// Paired with the `faultMessage` member name, unlike execution faults.
pub const FAULT_CODE_RESOLUTION: i64 = 4;

/// One fault: a numeric code and a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fault {
    pub code: i64,
    pub message: String,
}

impl Fault {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Fault for a failed top-level request.
    pub fn request(message: impl Into<String>) -> Self {
        Self::new(FAULT_CODE_REQUEST, message)
    }

    /// The standard fault struct: `faultCode` + `faultString`.
    pub fn to_struct(&self) -> StructValue {
        StructValue::new().with("faultCode", self.code).with("faultString", self.message.clone())
    }
}

impl std::fmt::Display for Fault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "fault {}: {}", self.code, self.message)
    }
}

impl From<Fault> for Value {
    fn from(fault: Fault) -> Self {
        Value::Struct(fault.to_struct())
    }
}
