//! The XML-RPC implementation of [`WireProtocol`].

use snafu::ensure;
use snafu::OptionExt as _;

use quill_api::limits::MAX_REQUEST_SIZE;
use quill_api::Fault;
use quill_api::Value;
use quill_rpc_core::DecodedRequest;
use quill_rpc_core::MulticallOutcome;
use quill_rpc_core::WireProtocol;

use crate::encoder;
use crate::error::InvalidUtf8Snafu;
use crate::error::Result;
use crate::error::TooLargeSnafu;
use crate::parser;
use crate::parser::MethodCall;

/// Stateless codec; safe to share behind an `Arc`.
#[derive(Debug, Clone)]
pub struct XmlRpcCodec {
    max_request_size: usize,
}

impl XmlRpcCodec {
    pub fn new() -> Self {
        Self {
            max_request_size: MAX_REQUEST_SIZE,
        }
    }

    pub fn with_max_request_size(mut self, limit: usize) -> Self {
        self.max_request_size = limit;
        self
    }

    fn parse_call(&self, body: &[u8]) -> Result<MethodCall> {
        ensure!(
            body.len() <= self.max_request_size,
            TooLargeSnafu {
                limit: self.max_request_size
            }
        );
        let text = std::str::from_utf8(body).ok().context(InvalidUtf8Snafu)?;
        parser::parse_method_call(text)
    }
}

impl Default for XmlRpcCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl WireProtocol for XmlRpcCodec {
    fn name(&self) -> &'static str {
        "xmlrpc"
    }

    fn decode_request(&self, body: &[u8]) -> anyhow::Result<DecodedRequest> {
        let call = self.parse_call(body)?;
        Ok(DecodedRequest::new(call.method_name, call.params))
    }

    fn encode_response(&self, value: Option<&Value>) -> anyhow::Result<Vec<u8>> {
        Ok(encoder::encode_method_response(value)?.into_bytes())
    }

    fn encode_fault(&self, fault: &Fault) -> Vec<u8> {
        encoder::encode_fault_response(fault).into_bytes()
    }

    fn encode_multicall_response(&self, outcomes: &[MulticallOutcome]) -> anyhow::Result<Vec<u8>> {
        Ok(encoder::encode_multicall_response(outcomes)?.into_bytes())
    }
}
