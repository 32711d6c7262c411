//! MovableType publishing surface.
//!
//! The MT extension API: category assignment, post title listings,
//! trackback pings, and the capability probes (`supportedMethods`,
//! `supportedTextFilters`). Three methods carry no credentials at all
//! and stay outside the gate.

use std::sync::Arc;

use anyhow::bail;

use quill_api::ScalarKind;
use quill_api::SignatureEntry;
use quill_api::Value;
use quill_rpc_core::ApiDefinition;
use quill_rpc_core::ApiMethod;
use quill_rpc_core::HookFilter;
use quill_rpc_core::HookKind;
use quill_rpc_core::InterceptorChain;
use quill_rpc_core::RegisteredService;
use quill_rpc_core::ServiceBinding;

use crate::auth::CredentialGate;
use crate::content::ArticleTitle;
use crate::content::Category;
use crate::content::CategoryAssignment;
use crate::content::TextFilterEntry;
use crate::content::TrackbackPing;
use crate::params::int_at;
use crate::params::string_at;
use crate::params::value_at;
use crate::store::ContentStore;

/// Registry name, and the prefix callers use in layered mode.
pub const SERVICE_NAME: &str = "mt";

/// Methods that declare no credentials and bypass the gate.
pub const AUTH_EXEMPT: [&str; 3] = ["getTrackbackPings", "supportedMethods", "supportedTextFilters"];

fn string() -> SignatureEntry {
    SignatureEntry::scalar(ScalarKind::String)
}

/// The MovableType method declarations.
pub fn api_definition() -> ApiDefinition {
    ApiDefinition::new("MovableType")
        .method(
            ApiMethod::new("getCategoryList")
                .expects("blogid", string())
                .expects("username", string())
                .expects("password", string())
                .returns(SignatureEntry::array(SignatureEntry::Struct(Category::descriptor()))),
        )
        .method(
            ApiMethod::new("getPostCategories")
                .expects("postid", string())
                .expects("username", string())
                .expects("password", string())
                .returns(SignatureEntry::array(SignatureEntry::Struct(CategoryAssignment::descriptor()))),
        )
        .method(
            ApiMethod::new("getRecentPostTitles")
                .expects("blogid", string())
                .expects("username", string())
                .expects("password", string())
                .expects("numberOfPosts", SignatureEntry::scalar(ScalarKind::Int))
                .returns(SignatureEntry::array(SignatureEntry::Struct(ArticleTitle::descriptor()))),
        )
        .method(
            ApiMethod::new("setPostCategories")
                .expects("postid", string())
                .expects("username", string())
                .expects("password", string())
                .expects("categories", SignatureEntry::array(SignatureEntry::Struct(CategoryAssignment::descriptor())))
                .returns(SignatureEntry::scalar(ScalarKind::Bool)),
        )
        .method(ApiMethod::new("supportedMethods").returns(SignatureEntry::array(string())))
        .method(
            ApiMethod::new("supportedTextFilters")
                .returns(SignatureEntry::array(SignatureEntry::Struct(TextFilterEntry::descriptor()))),
        )
        .method(
            ApiMethod::new("getTrackbackPings")
                .expects("postid", string())
                .returns(SignatureEntry::array(SignatureEntry::Struct(TrackbackPing::descriptor()))),
        )
        .method(
            ApiMethod::new("publishPost")
                .expects("postid", string())
                .expects("username", string())
                .expects("password", string())
                .returns(SignatureEntry::scalar(ScalarKind::Bool)),
        )
}

fn binding(store: &Arc<dyn ContentStore>, method_names: Vec<String>) -> ServiceBinding {
    let mut binding = ServiceBinding::new();

    {
        let store = Arc::clone(store);
        binding.bind("getCategoryList", move |_params: Vec<Value>| {
            let store = Arc::clone(&store);
            async move {
                let categories = store.categories().await?;
                Ok(Some(Value::Array(categories.iter().map(Category::to_value).collect())))
            }
        });
    }

    {
        let store = Arc::clone(store);
        binding.bind("getPostCategories", move |params: Vec<Value>| {
            let store = Arc::clone(&store);
            async move {
                let postid = string_at(&params, 0, "postid")?;
                let assignments = store.article_categories(&postid).await?;
                Ok(Some(Value::Array(assignments.iter().map(CategoryAssignment::to_value).collect())))
            }
        });
    }

    {
        let store = Arc::clone(store);
        binding.bind("getRecentPostTitles", move |params: Vec<Value>| {
            let store = Arc::clone(&store);
            async move {
                let count = int_at(&params, 3, "numberOfPosts")?;
                let limit = usize::try_from(count).unwrap_or_default();
                let articles = store.recent_articles(limit).await?;
                let titles = articles.iter().map(|article| ArticleTitle::from(article).to_value()).collect();
                Ok(Some(Value::Array(titles)))
            }
        });
    }

    {
        let store = Arc::clone(store);
        binding.bind("setPostCategories", move |params: Vec<Value>| {
            let store = Arc::clone(&store);
            async move {
                let postid = string_at(&params, 0, "postid")?;
                let raw = value_at(&params, 3, "categories")?;
                let Some(entries) = raw.as_array() else {
                    bail!("parameter 'categories' is a {}, not an array", raw.type_name());
                };
                let assignments = entries
                    .iter()
                    .map(CategoryAssignment::from_value)
                    .collect::<anyhow::Result<Vec<_>>>()?;
                store.set_article_categories(&postid, assignments).await?;
                Ok(Some(Value::Bool(true)))
            }
        });
    }

    binding.bind("supportedMethods", move |_params: Vec<Value>| {
        let names = method_names.clone();
        async move { Ok(Some(Value::Array(names.into_iter().map(Value::String).collect()))) }
    });

    {
        let store = Arc::clone(store);
        binding.bind("supportedTextFilters", move |_params: Vec<Value>| {
            let store = Arc::clone(&store);
            async move {
                let filters = store.text_filters().await?;
                Ok(Some(Value::Array(filters.iter().map(TextFilterEntry::to_value).collect())))
            }
        });
    }

    {
        let store = Arc::clone(store);
        binding.bind("getTrackbackPings", move |params: Vec<Value>| {
            let store = Arc::clone(&store);
            async move {
                let postid = string_at(&params, 0, "postid")?;
                let pings = store.trackbacks(&postid).await?;
                Ok(Some(Value::Array(pings.iter().map(TrackbackPing::to_value).collect())))
            }
        });
    }

    {
        let store = Arc::clone(store);
        binding.bind("publishPost", move |params: Vec<Value>| {
            let store = Arc::clone(&store);
            async move {
                let postid = string_at(&params, 0, "postid")?;
                store.publish_article(&postid).await?;
                Ok(Some(Value::Bool(true)))
            }
        });
    }

    binding
}

/// Assemble the surface as a registrable service. The credential gate
/// covers everything except the three exempt probes.
pub fn service(store: Arc<dyn ContentStore>) -> RegisteredService {
    let api = api_definition();
    let method_names = api.public_method_names();

    let gate = HookKind::named("authenticate", Arc::new(CredentialGate::new(Arc::clone(&store))));
    let interceptors = InterceptorChain::new().with_before(gate, HookFilter::except(AUTH_EXEMPT));

    RegisteredService::new(SERVICE_NAME, api, binding(&store, method_names))
        .with_interceptors(interceptors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_eight_methods_are_declared() {
        let api = api_definition();
        assert_eq!(
            api.public_method_names(),
            vec![
                "getCategoryList",
                "getPostCategories",
                "getRecentPostTitles",
                "setPostCategories",
                "supportedMethods",
                "supportedTextFilters",
                "getTrackbackPings",
                "publishPost",
            ],
        );
    }

    #[test]
    fn exempt_methods_declare_no_credentials() {
        let api = api_definition();
        for name in AUTH_EXEMPT {
            let method = api.public_api_method_instance(name).expect("declared");
            let params: Vec<&str> = method.expects_signature().iter().map(|param| param.name()).collect();
            assert!(!params.contains(&"username"), "{name} should not take username");
            assert!(!params.contains(&"password"), "{name} should not take password");
        }
    }

    #[test]
    fn gated_methods_all_declare_credentials() {
        let api = api_definition();
        for name in api.public_method_names() {
            if AUTH_EXEMPT.contains(&name.as_str()) {
                continue;
            }
            let method = api.public_api_method_instance(&name).expect("declared");
            let params: Vec<&str> = method.expects_signature().iter().map(|param| param.name()).collect();
            assert!(params.contains(&"username"), "{name} is missing username");
            assert!(params.contains(&"password"), "{name} is missing password");
        }
    }

    #[test]
    fn bindings_cover_the_declarations() {
        let store: Arc<dyn crate::store::ContentStore> = Arc::new(crate::store::MemoryContentStore::new());
        let service = service(store);
        for name in service.api().public_method_names() {
            assert!(service.binding().contains(&name), "{name} is not bound");
        }
    }
}
