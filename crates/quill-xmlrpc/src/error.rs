//! Codec error types.

use snafu::Snafu;

/// Errors produced while decoding or encoding XML-RPC documents.
#[derive(Debug, Snafu, Clone, PartialEq)]
#[snafu(visibility(pub))]
pub enum CodecError {
    #[snafu(display("request body is not valid utf-8"))]
    InvalidUtf8,

    #[snafu(display("request body exceeds {limit} bytes"))]
    TooLarge { limit: usize },

    #[snafu(display("unexpected end of document at byte {position}"))]
    UnexpectedEof { position: usize },

    #[snafu(display("malformed document at byte {position}: {reason}"))]
    Malformed { position: usize, reason: String },

    #[snafu(display("document type declarations are not accepted"))]
    DoctypeRejected,

    #[snafu(display("expected <{expected}>, found {found}"))]
    UnexpectedElement { expected: String, found: String },

    #[snafu(display("unknown value tag <{tag}>"))]
    UnknownValueTag { tag: String },

    #[snafu(display("invalid {kind} text {text:?}"))]
    InvalidScalar { kind: &'static str, text: String },

    #[snafu(display("value nesting exceeds {limit} levels"))]
    DepthExceeded { limit: usize },

    #[snafu(display("call carries more than {limit} parameters"))]
    TooManyParams { limit: usize },

    #[snafu(display("method name exceeds {limit} bytes"))]
    MethodNameTooLong { limit: usize },

    #[snafu(display("cannot encode non-finite double"))]
    NonFiniteDouble,
}

pub type Result<T, E = CodecError> = std::result::Result<T, E>;
