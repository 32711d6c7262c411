//! Content persistence seam.
//!
//! The publishing surfaces talk to storage exclusively through
//! [`ContentStore`]; [`MemoryContentStore`] backs tests and embedded
//! use with a single `RwLock` over plain collections.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::content::Article;
use crate::content::Category;
use crate::content::CategoryAssignment;
use crate::content::MediaObject;
use crate::content::MediaUrl;
use crate::content::TextFilterEntry;
use crate::content::TrackbackPing;

/// Storage-level failures, distinct from dispatch failures: these come
/// out of bound methods and surface as execution faults.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContentError {
    #[error("no article found for id '{postid}'")]
    ArticleNotFound {
        /// The id the caller asked for.
        postid: String,
    },

    #[error("storage failure: {message}")]
    Storage {
        /// Backend-specific description.
        message: String,
    },
}

/// What the publishing surfaces need from a content backend.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Check a username/password pair.
    ///
    /// # Errors
    ///
    /// Returns an error only when the backend itself fails; a wrong
    /// password is `Ok(false)`.
    async fn authenticate(&self, username: &str, password: &str) -> Result<bool, ContentError>;

    async fn categories(&self) -> Result<Vec<Category>, ContentError>;

    /// # Errors
    ///
    /// Returns [`ContentError::ArticleNotFound`] for an unknown id.
    async fn article(&self, postid: &str) -> Result<Article, ContentError>;

    /// Most recently created articles first.
    async fn recent_articles(&self, limit: usize) -> Result<Vec<Article>, ContentError>;

    /// Store a new article and return its assigned id.
    async fn create_article(&self, draft: Article, publish: bool) -> Result<String, ContentError>;

    async fn update_article(&self, postid: &str, draft: Article, publish: bool) -> Result<(), ContentError>;

    async fn delete_article(&self, postid: &str) -> Result<(), ContentError>;

    async fn store_media(&self, media: MediaObject) -> Result<MediaUrl, ContentError>;

    async fn article_categories(&self, postid: &str) -> Result<Vec<CategoryAssignment>, ContentError>;

    async fn set_article_categories(
        &self,
        postid: &str,
        categories: Vec<CategoryAssignment>,
    ) -> Result<(), ContentError>;

    async fn publish_article(&self, postid: &str) -> Result<(), ContentError>;

    async fn trackbacks(&self, postid: &str) -> Result<Vec<TrackbackPing>, ContentError>;

    async fn text_filters(&self) -> Result<Vec<TextFilterEntry>, ContentError>;
}

#[derive(Debug, Default)]
struct State {
    users: HashMap<String, String>,
    categories: Vec<Category>,
    articles: Vec<Article>,
    assignments: HashMap<String, Vec<CategoryAssignment>>,
    trackbacks: HashMap<String, Vec<TrackbackPing>>,
    text_filters: Vec<TextFilterEntry>,
    media: Vec<MediaObject>,
    next_id: u64,
}

impl State {
    fn position(&self, postid: &str) -> Result<usize, ContentError> {
        self.articles
            .iter()
            .position(|article| article.postid == postid)
            .ok_or_else(|| ContentError::ArticleNotFound {
                postid: postid.to_string(),
            })
    }
}

/// In-memory [`ContentStore`].
///
/// Builder methods run before the store is shared; afterwards all
/// access goes through the lock.
#[derive(Debug)]
pub struct MemoryContentStore {
    base_url: String,
    state: RwLock<State>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self {
            base_url: "http://blog.example.com".to_string(),
            state: RwLock::new(State::default()),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_user(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.state.get_mut().users.insert(username.into(), password.into());
        self
    }

    pub fn with_category(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.state.get_mut().categories.push(Category::new(id, name));
        self
    }

    pub fn with_text_filter(mut self, key: impl Into<String>, label: impl Into<String>) -> Self {
        self.state.get_mut().text_filters.push(TextFilterEntry::new(key, label));
        self
    }

    pub fn with_trackback(mut self, postid: impl Into<String>, ping: TrackbackPing) -> Self {
        self.state.get_mut().trackbacks.entry(postid.into()).or_default().push(ping);
        self
    }

    fn article_url(&self, postid: &str) -> String {
        format!("{}/articles/{postid}", self.base_url)
    }
}

impl Default for MemoryContentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn authenticate(&self, username: &str, password: &str) -> Result<bool, ContentError> {
        let state = self.state.read().await;
        Ok(state.users.get(username).is_some_and(|stored| stored == password))
    }

    async fn categories(&self) -> Result<Vec<Category>, ContentError> {
        Ok(self.state.read().await.categories.clone())
    }

    async fn article(&self, postid: &str) -> Result<Article, ContentError> {
        let state = self.state.read().await;
        let position = state.position(postid)?;
        Ok(state.articles[position].clone())
    }

    async fn recent_articles(&self, limit: usize) -> Result<Vec<Article>, ContentError> {
        let state = self.state.read().await;
        Ok(state.articles.iter().rev().take(limit).cloned().collect())
    }

    async fn create_article(&self, mut draft: Article, publish: bool) -> Result<String, ContentError> {
        let mut state = self.state.write().await;
        state.next_id += 1;
        let postid = state.next_id.to_string();
        let url = self.article_url(&postid);
        draft.postid = postid.clone();
        draft.url = url.clone();
        draft.perma_link = url;
        draft.published = publish;
        if draft.date_created.is_none() {
            draft.date_created = Some(Utc::now());
        }
        state.articles.push(draft);
        Ok(postid)
    }

    async fn update_article(&self, postid: &str, draft: Article, publish: bool) -> Result<(), ContentError> {
        let mut state = self.state.write().await;
        let position = state.position(postid)?;
        let existing = &mut state.articles[position];
        existing.title = draft.title;
        existing.description = draft.description;
        existing.categories = draft.categories;
        existing.excerpt = draft.excerpt;
        existing.extended = draft.extended;
        existing.keywords = draft.keywords;
        existing.allow_comments = draft.allow_comments;
        existing.allow_pings = draft.allow_pings;
        existing.text_filter = draft.text_filter;
        existing.trackback_urls = draft.trackback_urls;
        existing.published = publish;
        if let Some(when) = draft.date_created {
            existing.date_created = Some(when);
        }
        Ok(())
    }

    async fn delete_article(&self, postid: &str) -> Result<(), ContentError> {
        let mut state = self.state.write().await;
        let position = state.position(postid)?;
        state.articles.remove(position);
        state.assignments.remove(postid);
        state.trackbacks.remove(postid);
        Ok(())
    }

    async fn store_media(&self, media: MediaObject) -> Result<MediaUrl, ContentError> {
        let url = format!("{}/files/{}", self.base_url, media.name);
        self.state.write().await.media.push(media);
        Ok(MediaUrl { url })
    }

    async fn article_categories(&self, postid: &str) -> Result<Vec<CategoryAssignment>, ContentError> {
        let state = self.state.read().await;
        state.position(postid)?;
        Ok(state.assignments.get(postid).cloned().unwrap_or_default())
    }

    async fn set_article_categories(
        &self,
        postid: &str,
        categories: Vec<CategoryAssignment>,
    ) -> Result<(), ContentError> {
        let mut state = self.state.write().await;
        let position = state.position(postid)?;
        // Category names live on the article too, so the MetaWeblog
        // view stays in step with the MovableType assignment.
        state.articles[position].categories =
            categories.iter().map(|c| c.category_name.clone()).collect();
        state.assignments.insert(postid.to_string(), categories);
        Ok(())
    }

    async fn publish_article(&self, postid: &str) -> Result<(), ContentError> {
        let mut state = self.state.write().await;
        let position = state.position(postid)?;
        state.articles[position].published = true;
        Ok(())
    }

    async fn trackbacks(&self, postid: &str) -> Result<Vec<TrackbackPing>, ContentError> {
        let state = self.state.read().await;
        state.position(postid)?;
        Ok(state.trackbacks.get(postid).cloned().unwrap_or_default())
    }

    async fn text_filters(&self) -> Result<Vec<TextFilterEntry>, ContentError> {
        Ok(self.state.read().await.text_filters.clone())
    }
}
