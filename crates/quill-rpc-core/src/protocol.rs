//! Wire protocol seam.
//!
//! The dispatcher talks to the codec exclusively through [`WireProtocol`];
//! everything XML-specific lives behind it.

use quill_api::Fault;
use quill_api::StructValue;
use quill_api::Value;

/// One decoded wire request: a method name plus raw positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedRequest {
    pub method_name: String,
    pub params: Vec<Value>,
}

impl DecodedRequest {
    pub fn new(method_name: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            method_name: method_name.into(),
            params,
        }
    }
}

/// Result of one sub-call inside a multicall batch.
#[derive(Debug, Clone, PartialEq)]
pub enum MulticallOutcome {
    /// The sub-call executed; `None` is a void return.
    Success(Option<Value>),
    /// The sub-call failed; the struct already has its wire shape.
    Fault(StructValue),
}

/// Contract a concrete codec implements.
///
/// Decoding failures surface as errors; response encoding is expected to
/// succeed for values the dispatcher produces, and fault encoding is
/// infallible so there is always a response to send.
pub trait WireProtocol: Send + Sync {
    /// Protocol name for logging.
    fn name(&self) -> &'static str;

    /// Decode a request body into a method name and raw parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not a well-formed request, exceeds
    /// a fixed limit, or uses a value shape the protocol does not define.
    fn decode_request(&self, body: &[u8]) -> anyhow::Result<DecodedRequest>;

    /// Encode a successful response. `None` encodes the protocol's empty
    /// success (a void return).
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be represented on the wire.
    fn encode_response(&self, value: Option<&Value>) -> anyhow::Result<Vec<u8>>;

    /// Encode a fault response. Infallible so that every failed request
    /// still produces wire bytes.
    fn encode_fault(&self, fault: &Fault) -> Vec<u8>;

    /// Encode a multicall response: one entry per sub-call, successes
    /// wrapped per the batching convention and faults passed through.
    ///
    /// # Errors
    ///
    /// Returns an error if a success value cannot be represented on the
    /// wire.
    fn encode_multicall_response(&self, outcomes: &[MulticallOutcome]) -> anyhow::Result<Vec<u8>>;
}
