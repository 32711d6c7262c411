//! Typed XML-RPC service dispatch with interceptor chains and
//! multicall batching.
//!
//! This facade re-exports the workspace crates under one roof:
//!
//! - [`api`]: wire values, declared signatures, casting, faults.
//! - [`rpc`]: API definitions, bindings, interceptors, the registry,
//!   and the [`WireProtocol`](rpc::WireProtocol) seam.
//! - [`xmlrpc`]: the XML-RPC codec.
//! - [`dispatch`]: the dispatcher that ties a registry to a codec,
//!   including `system.multicall` batching.
//! - [`publishing`]: ready-made MetaWeblog and MovableType services
//!   over a pluggable content store.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use quill::dispatch::Dispatcher;
//! use quill::dispatch::DispatcherConfig;
//! use quill::publishing::metaweblog;
//! use quill::publishing::MemoryContentStore;
//! use quill::rpc::ServiceRegistry;
//! use quill::xmlrpc::XmlRpcCodec;
//!
//! let store = Arc::new(MemoryContentStore::new().with_user("admin", "secret"));
//! let registry = ServiceRegistry::new().with(metaweblog::service(store));
//! let dispatcher = Dispatcher::new(
//!     Arc::new(registry),
//!     Arc::new(XmlRpcCodec::new()),
//!     DispatcherConfig::delegated(metaweblog::SERVICE_NAME),
//! );
//! // dispatcher.handle_request(bytes).await drives a full call.
//! # drop(dispatcher);
//! ```

pub use quill_api as api;
pub use quill_dispatch as dispatch;
pub use quill_publishing as publishing;
pub use quill_rpc_core as rpc;
pub use quill_xmlrpc as xmlrpc;

pub use quill_api::Fault;
pub use quill_api::StructValue;
pub use quill_api::Value;
pub use quill_dispatch::DispatchMode;
pub use quill_dispatch::Dispatcher;
pub use quill_dispatch::DispatcherConfig;
pub use quill_rpc_core::ApiDefinition;
pub use quill_rpc_core::ApiMethod;
pub use quill_rpc_core::RegisteredService;
pub use quill_rpc_core::ServiceBinding;
pub use quill_rpc_core::ServiceRegistry;
pub use quill_xmlrpc::XmlRpcCodec;
