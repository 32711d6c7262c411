//! Static description of one remote-callable method.

use std::collections::HashMap;

use quill_api::Param;
use quill_api::SignatureEntry;
use quill_api::Value;

/// Descriptor for one callable remote method.
///
/// Built once when an API definition is assembled and never mutated
/// afterwards. The public name is what callers put on the wire; the
/// internal name is the key into the service binding. They usually match,
/// but aliases (and synthesized default methods) keep them distinct.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiMethod {
    public_name: String,
    internal_name: String,
    expects: Vec<Param>,
    returns: Option<SignatureEntry>,
    is_default: bool,
}

impl ApiMethod {
    /// Create a method whose public name equals its internal name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            public_name: name.clone(),
            internal_name: name,
            expects: Vec::new(),
            returns: None,
            is_default: false,
        }
    }

    /// Create a method whose public wire name differs from the internal
    /// binding name.
    pub fn aliased(public_name: impl Into<String>, internal_name: impl Into<String>) -> Self {
        Self {
            public_name: public_name.into(),
            internal_name: internal_name.into(),
            expects: Vec::new(),
            returns: None,
            is_default: false,
        }
    }

    /// Synthesize the descriptor a default method runs under: the caller's
    /// public name, the configured internal name, no declared signature.
    ///
    /// With no declared parameters the dispatcher skips casting and passes
    /// raw values through; with no declared return the response type is
    /// inferred from the runtime value.
    pub(crate) fn default_for(public_name: impl Into<String>, internal_name: impl Into<String>) -> Self {
        Self {
            public_name: public_name.into(),
            internal_name: internal_name.into(),
            expects: Vec::new(),
            returns: None,
            is_default: true,
        }
    }

    /// Append one declared parameter. Declaration order is wire order.
    pub fn expects(mut self, name: impl Into<String>, entry: SignatureEntry) -> Self {
        self.expects.push(Param::new(name, entry));
        self
    }

    /// Declare the return signature. Methods without one are void.
    pub fn returns(mut self, entry: SignatureEntry) -> Self {
        self.returns = Some(entry);
        self
    }

    pub fn public_name(&self) -> &str {
        &self.public_name
    }

    pub fn internal_name(&self) -> &str {
        &self.internal_name
    }

    pub fn expects_signature(&self) -> &[Param] {
        &self.expects
    }

    pub fn returns_signature(&self) -> Option<&SignatureEntry> {
        self.returns.as_ref()
    }

    /// Number of declared parameters.
    pub fn arity(&self) -> usize {
        self.expects.len()
    }

    /// Whether this descriptor was synthesized as a default-method stand-in.
    pub fn is_default(&self) -> bool {
        self.is_default
    }

    /// Name of the response message: the public name suffixed with
    /// `Response`.
    pub fn response_type_name(&self) -> String {
        format!("{}Response", self.public_name)
    }

    /// Derive the named-parameter view hooks receive: declared names
    /// zipped with the (casted) positional values.
    pub fn named_params(&self, params: &[Value]) -> HashMap<String, Value> {
        self.expects
            .iter()
            .zip(params.iter())
            .map(|(declared, value)| (declared.name().to_string(), value.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_api::ScalarKind;

    fn int() -> SignatureEntry {
        SignatureEntry::Scalar(ScalarKind::Int)
    }

    #[test]
    fn public_name_defaults_to_internal_name() {
        let method = ApiMethod::new("add");
        assert_eq!(method.public_name(), "add");
        assert_eq!(method.internal_name(), "add");
        assert!(!method.is_default());
    }

    #[test]
    fn aliased_names_stay_distinct() {
        let method = ApiMethod::aliased("blogger.deletePost", "delete_post");
        assert_eq!(method.public_name(), "blogger.deletePost");
        assert_eq!(method.internal_name(), "delete_post");
    }

    #[test]
    fn response_type_name_appends_suffix() {
        assert_eq!(ApiMethod::new("getPost").response_type_name(), "getPostResponse");
    }

    #[test]
    fn named_params_zip_declared_names_with_values() {
        let method = ApiMethod::new("add").expects("a", int()).expects("b", int());
        let named = method.named_params(&[Value::Int(2), Value::Int(3)]);
        assert_eq!(named.get("a"), Some(&Value::Int(2)));
        assert_eq!(named.get("b"), Some(&Value::Int(3)));
        assert_eq!(named.len(), 2);
    }

    #[test]
    fn named_params_tolerate_short_value_lists() {
        let method = ApiMethod::new("add").expects("a", int()).expects("b", int());
        let named = method.named_params(&[Value::Int(2)]);
        assert_eq!(named.len(), 1);
        assert!(named.contains_key("a"));
    }

    #[test]
    fn default_descriptor_has_no_signature() {
        let method = ApiMethod::default_for("anythingGoes", "fallback");
        assert!(method.is_default());
        assert_eq!(method.arity(), 0);
        assert!(method.returns_signature().is_none());
        assert_eq!(method.public_name(), "anythingGoes");
        assert_eq!(method.internal_name(), "fallback");
    }
}
