//! Explicitly-built registry of services.
//!
//! There is no global registration: the application constructs a
//! [`ServiceRegistry`] at startup, registers each service, and hands the
//! registry to the dispatcher by reference. After startup the registry is
//! shared immutably, so lookups are lock-free.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::api::ApiDefinition;
use crate::binding::ServiceBinding;
use crate::interceptor::InterceptorChain;

/// One registered service: its API definition, its bound methods, and its
/// interceptor chain.
#[derive(Debug, Clone)]
pub struct RegisteredService {
    name: String,
    api: Arc<ApiDefinition>,
    binding: Arc<ServiceBinding>,
    interceptors: Arc<InterceptorChain>,
}

impl RegisteredService {
    pub fn new(name: impl Into<String>, api: ApiDefinition, binding: ServiceBinding) -> Self {
        Self {
            name: name.into(),
            api: Arc::new(api),
            binding: Arc::new(binding),
            interceptors: Arc::new(InterceptorChain::new()),
        }
    }

    /// Attach an interceptor chain. Replaces any previous chain.
    pub fn with_interceptors(mut self, interceptors: InterceptorChain) -> Self {
        self.interceptors = Arc::new(interceptors);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn api(&self) -> &ApiDefinition {
        &self.api
    }

    pub fn binding(&self) -> &ServiceBinding {
        &self.binding
    }

    pub fn interceptors(&self) -> &InterceptorChain {
        &self.interceptors
    }
}

/// Registry of services keyed by service name.
#[derive(Clone, Default)]
pub struct ServiceRegistry {
    services: HashMap<String, Arc<RegisteredService>>,
}

impl ServiceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service under its own name. Re-registering a name
    /// replaces the earlier service.
    pub fn register(&mut self, service: RegisteredService) {
        let name = service.name().to_string();
        debug!(service = %name, methods = service.api().len(), "service registered");
        self.services.insert(name, Arc::new(service));
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, service: RegisteredService) -> Self {
        self.register(service);
        self
    }

    /// Look up a service by name.
    pub fn get(&self, name: &str) -> Option<Arc<RegisteredService>> {
        self.services.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Registered service names, sorted for stable output.
    pub fn service_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.services.keys().cloned().collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRegistry").field("service_count", &self.services.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::ApiMethod;

    fn sample_service(name: &str) -> RegisteredService {
        let api = ApiDefinition::new(name).method(ApiMethod::new("ping"));
        let binding = ServiceBinding::new().with("ping", |_params| async move { Ok(None) });
        RegisteredService::new(name, api, binding)
    }

    #[test]
    fn lookup_returns_registered_service() {
        let registry = ServiceRegistry::new().with(sample_service("blog"));
        let service = registry.get("blog").expect("registered");
        assert_eq!(service.name(), "blog");
        assert!(service.api().has_public_api_method("ping"));
        assert!(service.binding().contains("ping"));
    }

    #[test]
    fn lookup_misses_unknown_names() {
        let registry = ServiceRegistry::new().with(sample_service("blog"));
        assert!(registry.get("shop").is_none());
        assert!(!registry.contains("shop"));
    }

    #[test]
    fn reregistering_replaces_earlier_service() {
        let mut registry = ServiceRegistry::new();
        registry.register(sample_service("blog"));
        let replacement =
            RegisteredService::new("blog", ApiDefinition::new("blog"), ServiceBinding::new());
        registry.register(replacement);

        assert_eq!(registry.len(), 1);
        let service = registry.get("blog").expect("registered");
        assert!(service.api().is_empty());
    }

    #[test]
    fn service_names_are_sorted() {
        let registry = ServiceRegistry::new().with(sample_service("mt")).with(sample_service("metaWeblog"));
        assert_eq!(registry.service_names(), vec!["metaWeblog", "mt"]);
    }
}
