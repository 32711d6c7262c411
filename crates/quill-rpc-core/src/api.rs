//! API definition: the registry of one service's callable methods.

use std::collections::HashMap;
use std::sync::Arc;

use crate::method::ApiMethod;

/// Named collection of method descriptors plus an optional default method.
///
/// Built once at startup with the builder methods and treated as immutable
/// afterwards; lookups hand out shared descriptors.
#[derive(Debug, Clone, Default)]
pub struct ApiDefinition {
    name: String,
    methods: Vec<Arc<ApiMethod>>,
    by_public: HashMap<String, usize>,
    by_internal: HashMap<String, usize>,
    default_method: Option<String>,
}

impl ApiDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Register a method. Re-registering a public name replaces the
    /// earlier descriptor in place.
    pub fn method(mut self, method: ApiMethod) -> Self {
        let public = method.public_name().to_string();
        let internal = method.internal_name().to_string();
        let method = Arc::new(method);

        match self.by_public.get(&public) {
            Some(&index) => {
                self.methods[index] = method;
                self.by_internal.insert(internal, index);
            }
            None => {
                let index = self.methods.len();
                self.methods.push(method);
                self.by_public.insert(public, index);
                self.by_internal.insert(internal, index);
            }
        }
        self
    }

    /// Configure a fallback handler: when no public name matches, the
    /// dispatcher synthesizes a signatureless descriptor targeting this
    /// internal method instead of failing.
    pub fn with_default_method(mut self, internal_name: impl Into<String>) -> Self {
        self.default_method = Some(internal_name.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_public_api_method(&self, public_name: &str) -> bool {
        self.by_public.contains_key(public_name)
    }

    /// Exact public-name lookup. The default method never matches here.
    pub fn public_api_method_instance(&self, public_name: &str) -> Option<Arc<ApiMethod>> {
        self.by_public.get(public_name).map(|&index| Arc::clone(&self.methods[index]))
    }

    pub fn has_api_method(&self, internal_name: &str) -> bool {
        self.by_internal.contains_key(internal_name)
    }

    /// Internal-name lookup, used to recover a declared return signature
    /// when a descriptor is reached through an alias.
    pub fn api_method_instance(&self, internal_name: &str) -> Option<Arc<ApiMethod>> {
        self.by_internal.get(internal_name).map(|&index| Arc::clone(&self.methods[index]))
    }

    /// Synthesize a descriptor for the default method under the public
    /// name a caller actually used. Returns `None` when no default is
    /// configured.
    pub fn default_api_method_instance(&self, public_name: &str) -> Option<Arc<ApiMethod>> {
        self.default_method
            .as_ref()
            .map(|internal| Arc::new(ApiMethod::default_for(public_name, internal.clone())))
    }

    pub fn has_default_api_method(&self) -> bool {
        self.default_method.is_some()
    }

    /// Public method names in registration order.
    pub fn public_method_names(&self) -> Vec<String> {
        self.methods.iter().map(|method| method.public_name().to_string()).collect()
    }

    /// Number of registered methods, not counting the default.
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_api::ScalarKind;
    use quill_api::SignatureEntry;

    fn sample_api() -> ApiDefinition {
        ApiDefinition::new("calc")
            .method(
                ApiMethod::new("add")
                    .expects("a", SignatureEntry::Scalar(ScalarKind::Int))
                    .expects("b", SignatureEntry::Scalar(ScalarKind::Int))
                    .returns(SignatureEntry::Scalar(ScalarKind::Int)),
            )
            .method(ApiMethod::new("reset"))
    }

    #[test]
    fn public_lookup_finds_exact_match() {
        let api = sample_api();
        assert!(api.has_public_api_method("add"));
        let method = api.public_api_method_instance("add").expect("add registered");
        assert_eq!(method.arity(), 2);
    }

    #[test]
    fn public_lookup_misses_unregistered_names() {
        let api = sample_api();
        assert!(!api.has_public_api_method("subtract"));
        assert!(api.public_api_method_instance("subtract").is_none());
    }

    #[test]
    fn internal_lookup_resolves_aliases() {
        let api = ApiDefinition::new("blog").method(ApiMethod::aliased("deletePost", "delete_post"));
        assert!(api.has_api_method("delete_post"));
        assert!(!api.has_api_method("deletePost"));
        let method = api.api_method_instance("delete_post").expect("registered");
        assert_eq!(method.public_name(), "deletePost");
    }

    #[test]
    fn default_method_synthesizes_descriptor_per_name() {
        let api = sample_api().with_default_method("catch_all");
        let method = api.default_api_method_instance("noSuchThing").expect("default configured");
        assert!(method.is_default());
        assert_eq!(method.public_name(), "noSuchThing");
        assert_eq!(method.internal_name(), "catch_all");
        // The default never shows up in public lookups.
        assert!(!api.has_public_api_method("noSuchThing"));
        assert!(!api.has_public_api_method("catch_all"));
    }

    #[test]
    fn no_default_means_no_synthesis() {
        let api = sample_api();
        assert!(!api.has_default_api_method());
        assert!(api.default_api_method_instance("anything").is_none());
    }

    #[test]
    fn method_names_keep_registration_order() {
        let api = sample_api();
        assert_eq!(api.public_method_names(), vec!["add", "reset"]);
    }

    #[test]
    fn reregistering_replaces_in_place() {
        let api = sample_api().method(ApiMethod::new("add").returns(SignatureEntry::Scalar(ScalarKind::String)));
        assert_eq!(api.len(), 2);
        assert_eq!(api.public_method_names(), vec!["add", "reset"]);
        let method = api.public_api_method_instance("add").expect("still registered");
        assert_eq!(method.returns_signature(), Some(&SignatureEntry::Scalar(ScalarKind::String)));
        assert_eq!(method.arity(), 0);
    }
}
