//! Core dispatch vocabulary for quill RPC.
//!
//! This crate defines what a remote-callable service looks like without
//! saying anything about wire formats or orchestration:
//!
//! - [`ApiMethod`] / [`ApiDefinition`]: the static registry of callable
//!   operations and their signatures.
//! - [`ServiceBinding`]: the map from internal method names to bound async
//!   functions that actually execute calls.
//! - [`InterceptorChain`] and the hook types around it: before/after
//!   guards that can veto an invocation.
//! - [`ServiceRegistry`]: the explicitly-built, dependency-injected
//!   collection of registered services.
//! - [`WireProtocol`]: the seam a concrete codec implements.

pub mod api;
pub mod binding;
pub mod error;
pub mod interceptor;
pub mod method;
pub mod protocol;
pub mod registry;

pub use api::ApiDefinition;
pub use binding::BoundMethodFn;
pub use binding::ServiceBinding;
pub use error::DispatcherError;
pub use interceptor::Decision;
pub use interceptor::HookContext;
pub use interceptor::HookFilter;
pub use interceptor::HookKind;
pub use interceptor::InterceptorChain;
pub use interceptor::InvocationHook;
pub use method::ApiMethod;
pub use protocol::DecodedRequest;
pub use protocol::MulticallOutcome;
pub use protocol::WireProtocol;
pub use registry::RegisteredService;
pub use registry::ServiceRegistry;
