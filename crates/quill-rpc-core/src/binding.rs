//! Bound-function map backing a service.
//!
//! The dispatcher never reaches into a service by name reflection; every
//! callable method is an entry here, bound at startup to an async closure
//! over the service's own state.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use quill_api::Value;

/// Type alias for bound async method functions.
///
/// A method receives its casted positional parameters and returns an
/// optional wire value; `None` is a void return. Errors bubble into fault
/// responses, so bindings may return anything `anyhow` can wrap.
pub type BoundMethodFn = Arc<
    dyn Fn(Vec<Value>) -> Pin<Box<dyn Future<Output = anyhow::Result<Option<Value>>> + Send>> + Send + Sync,
>;

/// Map from internal method name to bound implementation.
///
/// Built once while wiring a service and immutable afterwards.
#[derive(Clone, Default)]
pub struct ServiceBinding {
    methods: HashMap<String, BoundMethodFn>,
}

impl ServiceBinding {
    /// Create an empty binding.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind an internal method name to an async closure.
    pub fn bind<F, Fut>(&mut self, internal_name: impl Into<String>, method: F)
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Option<Value>>> + Send + 'static,
    {
        let bound: BoundMethodFn = Arc::new(move |params| Box::pin(method(params)));
        self.methods.insert(internal_name.into(), bound);
    }

    /// Builder-style [`bind`](Self::bind).
    pub fn with<F, Fut>(mut self, internal_name: impl Into<String>, method: F) -> Self
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Option<Value>>> + Send + 'static,
    {
        self.bind(internal_name, method);
        self
    }

    /// Look up a bound method by internal name.
    pub fn get(&self, internal_name: &str) -> Option<BoundMethodFn> {
        self.methods.get(internal_name).cloned()
    }

    /// Check whether an internal name is bound.
    pub fn contains(&self, internal_name: &str) -> bool {
        self.methods.contains_key(internal_name)
    }

    /// Number of bound methods.
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Check whether the binding is empty.
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

impl std::fmt::Debug for ServiceBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceBinding").field("method_count", &self.methods.len()).finish()
    }
}
