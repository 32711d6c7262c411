//! Dispatch-level errors.

use quill_api::CastError;
use thiserror::Error;

/// Errors that can occur while resolving or executing one invocation.
///
/// Every variant is fatal to the single request it belongs to and never
/// to the process; the dispatcher converts them into fault responses (or,
/// inside a multicall, into per-entry fault structs).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DispatcherError {
    /// No service is registered under the resolved name.
    #[error("no service available for request '{name}'")]
    NoServiceFound {
        /// The service name the request selected.
        name: String,
    },

    /// No method descriptor matched and no default method is configured.
    #[error("no such method '{name}'")]
    NoSuchMethod {
        /// The public method name the caller used.
        name: String,
    },

    /// The descriptor resolved but the service never bound the method.
    #[error("method '{public_name}' resolves to '{internal_name}', which is not bound by the service")]
    MethodNotBound {
        /// Public wire name.
        public_name: String,
        /// Internal binding name the descriptor points at.
        internal_name: String,
    },

    /// A before hook vetoed the invocation with a reason.
    #[error("request canceled: {reason}")]
    Canceled {
        /// Human-readable reason supplied by the hook.
        reason: String,
    },

    /// The bound method returned an error.
    #[error("method '{method}' failed: {message}")]
    Execution {
        /// Public method name.
        method: String,
        /// Message from the underlying error.
        message: String,
    },

    /// The return value did not match the declared return signature.
    #[error("cannot cast return value of '{method}': {source}")]
    ReturnCast {
        /// Public method name.
        method: String,
        #[source]
        source: CastError,
    },

    /// A multicall arrived inside another multicall.
    #[error("recursive multicall is not allowed")]
    NestedMulticall,

    /// The multicall payload did not have the required shape.
    #[error("malformed multicall: {reason}")]
    MalformedMulticall {
        /// What was wrong with the payload.
        reason: String,
    },

    /// The codec failed to encode a response.
    #[error("protocol error: {message}")]
    Protocol {
        /// Message from the codec.
        message: String,
    },
}
