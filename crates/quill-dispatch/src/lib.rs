//! Request dispatch.
//!
//! Ties the pieces together: a [`Dispatcher`] decodes request bodies
//! through a wire protocol, resolves method names against a
//! [`ServiceRegistry`](quill_rpc_core::ServiceRegistry) per its
//! [`DispatchMode`], casts parameters, runs interceptor phases around
//! the bound method, and encodes the outcome. `system.multicall`
//! batches are recognized before any name routing and fan out with
//! per-entry fault isolation.

pub mod config;
pub mod dispatcher;
pub mod invocation;
pub mod multicall;

pub use config::ConfigError;
pub use config::DispatchMode;
pub use config::DispatcherConfig;
pub use dispatcher::Dispatcher;
pub use invocation::Invocation;
pub use multicall::SYSTEM_MULTICALL;
