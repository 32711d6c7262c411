//! XML-RPC wire codec.
//!
//! A hand-rolled tokenizer and recursive-descent parser for the small
//! XML subset the protocol needs, an encoder for response documents,
//! and [`XmlRpcCodec`] tying both to the dispatcher's
//! [`WireProtocol`](quill_rpc_core::WireProtocol) seam. External
//! entities and document type declarations are rejected outright.

pub mod codec;
pub mod encoder;
pub mod error;
pub mod lexer;
pub mod parser;

pub use codec::XmlRpcCodec;
pub use encoder::encode_fault_response;
pub use encoder::encode_method_call;
pub use encoder::encode_method_response;
pub use encoder::encode_multicall_response;
pub use error::CodecError;
pub use parser::parse_method_call;
pub use parser::parse_method_response;
pub use parser::MethodCall;
pub use parser::MethodResponse;
