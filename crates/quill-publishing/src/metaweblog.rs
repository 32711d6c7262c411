//! MetaWeblog publishing surface.
//!
//! Declares the seven classic MetaWeblog methods with their historical
//! parameter orders (`deletePost` leads with `appkey`) and binds each
//! to a [`ContentStore`] call. Every method carries `username` and
//! `password` somewhere in its signature; the credential gate reads
//! them by name, so position differences between methods do not
//! matter.

use std::sync::Arc;

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
use crate::content::Article;
use crate::content::MediaObject;
use crate::content::MediaUrl;
use crate::params::flag_at;
use crate::params::int_at;
use crate::params::string_at;
use crate::params::value_at;
use crate::store::ContentStore;

/// Registry name, and the prefix callers use in layered mode.
pub const SERVICE_NAME: &str = "metaWeblog";

fn string() -> SignatureEntry {
    SignatureEntry::scalar(ScalarKind::String)
}

/// The MetaWeblog method declarations.
pub fn api_definition() -> ApiDefinition {
    let article = SignatureEntry::Struct(Article::descriptor());

    ApiDefinition::new("MetaWeblog")
        .method(
            ApiMethod::new("getCategories")
                .expects("blogid", string())
                .expects("username", string())
                .expects("password", string())
                .returns(SignatureEntry::array(string())),
        )
        .method(
            ApiMethod::new("getPost")
                .expects("postid", string())
                .expects("username", string())
                .expects("password", string())
                .returns(article.clone()),
        )
        .method(
            ApiMethod::new("getRecentPosts")
                .expects("blogid", string())
                .expects("username", string())
                .expects("password", string())
                .expects("numberOfPosts", SignatureEntry::scalar(ScalarKind::Int))
                .returns(SignatureEntry::array(article.clone())),
        )
        .method(
            ApiMethod::new("newPost")
                .expects("blogid", string())
                .expects("username", string())
                .expects("password", string())
                .expects("struct", article.clone())
                .expects("publish", SignatureEntry::scalar(ScalarKind::Bool))
                .returns(string()),
        )
        .method(
            ApiMethod::new("editPost")
                .expects("postid", string())
                .expects("username", string())
                .expects("password", string())
                .expects("struct", article)
                .expects("publish", SignatureEntry::scalar(ScalarKind::Bool))
                .returns(SignatureEntry::scalar(ScalarKind::Bool)),
        )
        .method(
            // The appkey comes first; Blogger-era clients send it even
            // though nothing here uses it.
            ApiMethod::new("deletePost")
                .expects("appkey", string())
                .expects("postid", string())
                .expects("username", string())
                .expects("password", string())
                .expects("publish", SignatureEntry::scalar(ScalarKind::Bool))
                .returns(SignatureEntry::scalar(ScalarKind::Bool)),
        )
        .method(
            ApiMethod::new("newMediaObject")
                .expects("blogid", string())
                .expects("username", string())
                .expects("password", string())
                .expects("data", SignatureEntry::Struct(MediaObject::descriptor()))
                .returns(SignatureEntry::Struct(MediaUrl::descriptor())),
        )
}

fn binding(store: &Arc<dyn ContentStore>) -> ServiceBinding {
    let mut binding = ServiceBinding::new();

    {
        let store = Arc::clone(store);
        binding.bind("getCategories", move |_params: Vec<Value>| {
            let store = Arc::clone(&store);
            async move {
                let categories = store.categories().await?;
                let names = categories.into_iter().map(|category| Value::String(category.name)).collect();
                Ok(Some(Value::Array(names)))
            }
        });
    }

    {
        let store = Arc::clone(store);
        binding.bind("getPost", move |params: Vec<Value>| {
            let store = Arc::clone(&store);
            async move {
                let postid = string_at(&params, 0, "postid")?;
                let article = store.article(&postid).await?;
                Ok(Some(article.to_value()))
            }
        });
    }

    {
        let store = Arc::clone(store);
        binding.bind("getRecentPosts", move |params: Vec<Value>| {
            let store = Arc::clone(&store);
            async move {
                let count = int_at(&params, 3, "numberOfPosts")?;
                let limit = usize::try_from(count).unwrap_or_default();
                let articles = store.recent_articles(limit).await?;
                Ok(Some(Value::Array(articles.iter().map(Article::to_value).collect())))
            }
        });
    }

    {
        let store = Arc::clone(store);
        binding.bind("newPost", move |params: Vec<Value>| {
            let store = Arc::clone(&store);
            async move {
                let mut draft = Article::from_value(value_at(&params, 3, "struct")?)?;
                draft.author = string_at(&params, 1, "username")?;
                let publish = flag_at(&params, 4, "publish")?;
                let postid = store.create_article(draft, publish).await?;
                Ok(Some(Value::String(postid)))
            }
        });
    }

    {
        let store = Arc::clone(store);
        binding.bind("editPost", move |params: Vec<Value>| {
            let store = Arc::clone(&store);
            async move {
                let postid = string_at(&params, 0, "postid")?;
                let draft = Article::from_value(value_at(&params, 3, "struct")?)?;
                let publish = flag_at(&params, 4, "publish")?;
                store.update_article(&postid, draft, publish).await?;
                Ok(Some(Value::Bool(true)))
            }
        });
    }

    {
        let store = Arc::clone(store);
        binding.bind("deletePost", move |params: Vec<Value>| {
            let store = Arc::clone(&store);
            async move {
                let postid = string_at(&params, 1, "postid")?;
                store.delete_article(&postid).await?;
                Ok(Some(Value::Bool(true)))
            }
        });
    }

    {
        let store = Arc::clone(store);
        binding.bind("newMediaObject", move |params: Vec<Value>| {
            let store = Arc::clone(&store);
            async move {
                let media = MediaObject::from_value(value_at(&params, 3, "data")?)?;
                let url = store.store_media(media).await?;
                Ok(Some(url.to_value()))
            }
        });
    }

    binding
}

/// Assemble the surface as a registrable service: declarations,
/// bindings, and the credential gate on every method.
pub fn service(store: Arc<dyn ContentStore>) -> RegisteredService {
    let gate = HookKind::named("authenticate", Arc::new(CredentialGate::new(Arc::clone(&store))));
    let interceptors = InterceptorChain::new().with_before(gate, HookFilter::any());

    RegisteredService::new(SERVICE_NAME, api_definition(), binding(&store))
        .with_interceptors(interceptors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_seven_methods_are_declared() {
        let api = api_definition();
        assert_eq!(
            api.public_method_names(),
            vec![
                "getCategories",
                "getPost",
                "getRecentPosts",
                "newPost",
                "editPost",
                "deletePost",
                "newMediaObject",
            ],
        );
    }

    #[test]
    fn delete_post_leads_with_the_appkey() {
        let api = api_definition();
        let method = api.public_api_method_instance("deletePost").expect("declared");
        let names: Vec<&str> = method.expects_signature().iter().map(|param| param.name()).collect();
        assert_eq!(names, vec!["appkey", "postid", "username", "password", "publish"]);
    }

    #[test]
    fn every_method_names_its_credentials() {
        let api = api_definition();
        for name in api.public_method_names() {
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
        assert_eq!(service.interceptors().before_len(), 1);
    }
}
