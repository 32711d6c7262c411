//! Content types the publishing surfaces carry.
//!
//! Each type knows its own wire struct: a descriptor declaring field
//! names and order, a conversion into a wire value following that
//! declaration, and where the surface accepts the type inbound, a
//! lenient conversion back that defaults absent fields. Wire field
//! names keep their historical spellings (`permaLink`,
//! `mt_allow_comments`, `dateCreated`).

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use quill_api::ScalarKind;
use quill_api::SignatureEntry;
use quill_api::StructDescriptor;
use quill_api::StructValue;
use quill_api::Value;

fn string_entry() -> SignatureEntry {
    SignatureEntry::scalar(ScalarKind::String)
}

fn field_str(fields: &StructValue, name: &str) -> String {
    fields.get(name).and_then(Value::as_str).unwrap_or_default().to_string()
}

fn field_flag(fields: &StructValue, name: &str) -> bool {
    match fields.get(name) {
        Some(Value::Bool(b)) => *b,
        Some(Value::Int(n)) => *n != 0,
        _ => false,
    }
}

fn field_strings(fields: &StructValue, name: &str) -> Vec<String> {
    fields
        .get(name)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default()
}

fn field_datetime(fields: &StructValue, name: &str) -> Option<DateTime<Utc>> {
    match fields.get(name) {
        Some(Value::DateTime(when)) => Some(*when),
        _ => None,
    }
}

fn strings_value(items: &[String]) -> Value {
    Value::Array(items.iter().cloned().map(Value::from).collect())
}

// ============================================================================
// MetaWeblog types
// ============================================================================

/// One article as the publishing surfaces carry it.
///
/// `author` and `published` are store-side state and never appear in
/// the wire struct.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub postid: String,
    pub title: String,
    pub description: String,
    pub url: String,
    pub perma_link: String,
    pub categories: Vec<String>,
    pub excerpt: String,
    pub extended: String,
    pub keywords: String,
    pub allow_comments: bool,
    pub allow_pings: bool,
    pub text_filter: String,
    pub trackback_urls: Vec<String>,
    pub date_created: Option<DateTime<Utc>>,
    pub author: String,
    pub published: bool,
}

impl Article {
    pub fn descriptor() -> StructDescriptor {
        StructDescriptor::new("Article")
            .field("description", string_entry())
            .field("title", string_entry())
            .field("postid", string_entry())
            .field("url", string_entry())
            .field("link", string_entry())
            .field("permaLink", string_entry())
            .field("categories", SignatureEntry::array(string_entry()))
            .field("mt_excerpt", string_entry())
            .field("mt_text_more", string_entry())
            .field("mt_keywords", string_entry())
            .field("mt_allow_comments", SignatureEntry::scalar(ScalarKind::Int))
            .field("mt_allow_pings", SignatureEntry::scalar(ScalarKind::Int))
            .field("mt_convert_breaks", string_entry())
            .field("mt_tb_ping_urls", SignatureEntry::array(string_entry()))
            .field("dateCreated", SignatureEntry::scalar(ScalarKind::DateTime))
    }

    /// Wire struct in declared field order. `link` mirrors `url`.
    pub fn to_value(&self) -> Value {
        let mut fields = StructValue::new();
        fields.insert("description", self.description.clone());
        fields.insert("title", self.title.clone());
        fields.insert("postid", self.postid.clone());
        fields.insert("url", self.url.clone());
        fields.insert("link", self.url.clone());
        fields.insert("permaLink", self.perma_link.clone());
        fields.insert("categories", strings_value(&self.categories));
        fields.insert("mt_excerpt", self.excerpt.clone());
        fields.insert("mt_text_more", self.extended.clone());
        fields.insert("mt_keywords", self.keywords.clone());
        fields.insert("mt_allow_comments", Value::Int(i64::from(self.allow_comments)));
        fields.insert("mt_allow_pings", Value::Int(i64::from(self.allow_pings)));
        fields.insert("mt_convert_breaks", self.text_filter.clone());
        fields.insert("mt_tb_ping_urls", strings_value(&self.trackback_urls));
        if let Some(when) = self.date_created {
            fields.insert("dateCreated", Value::DateTime(when));
        }
        Value::Struct(fields)
    }

    /// Read an inbound article payload. Absent fields default; only a
    /// non-struct payload is an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is not a struct value.
    pub fn from_value(value: &Value) -> anyhow::Result<Self> {
        let fields = value.as_struct().ok_or_else(|| {
            anyhow::anyhow!("article payload is a {}, not a struct", value.type_name())
        })?;
        Ok(Self {
            postid: field_str(fields, "postid"),
            title: field_str(fields, "title"),
            description: field_str(fields, "description"),
            url: field_str(fields, "url"),
            perma_link: field_str(fields, "permaLink"),
            categories: field_strings(fields, "categories"),
            excerpt: field_str(fields, "mt_excerpt"),
            extended: field_str(fields, "mt_text_more"),
            keywords: field_str(fields, "mt_keywords"),
            allow_comments: field_flag(fields, "mt_allow_comments"),
            allow_pings: field_flag(fields, "mt_allow_pings"),
            text_filter: field_str(fields, "mt_convert_breaks"),
            trackback_urls: field_strings(fields, "mt_tb_ping_urls"),
            date_created: field_datetime(fields, "dateCreated"),
            author: String::new(),
            published: false,
        })
    }
}

/// Inbound media upload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaObject {
    pub name: String,
    pub media_type: String,
    pub bits: Vec<u8>,
}

impl MediaObject {
    pub fn descriptor() -> StructDescriptor {
        StructDescriptor::new("MediaObject")
            .field("bits", SignatureEntry::scalar(ScalarKind::Base64))
            .field("name", string_entry())
            .field("type", string_entry())
    }

    pub fn to_value(&self) -> Value {
        let mut fields = StructValue::new();
        fields.insert("bits", Value::Base64(self.bits.clone()));
        fields.insert("name", self.name.clone());
        fields.insert("type", self.media_type.clone());
        Value::Struct(fields)
    }

    /// # Errors
    ///
    /// Returns an error if the payload is not a struct value.
    pub fn from_value(value: &Value) -> anyhow::Result<Self> {
        let fields = value.as_struct().ok_or_else(|| {
            anyhow::anyhow!("media payload is a {}, not a struct", value.type_name())
        })?;
        let bits = match fields.get("bits") {
            Some(Value::Base64(bytes)) => bytes.clone(),
            _ => Vec::new(),
        };
        Ok(Self {
            name: field_str(fields, "name"),
            media_type: field_str(fields, "type"),
            bits,
        })
    }
}

/// Where an uploaded media object ended up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaUrl {
    pub url: String,
}

impl MediaUrl {
    pub fn descriptor() -> StructDescriptor {
        StructDescriptor::new("Url").field("url", string_entry())
    }

    pub fn to_value(&self) -> Value {
        Value::Struct(StructValue::new().with("url", self.url.clone()))
    }
}

// ============================================================================
// MovableType types
// ============================================================================

/// Store-side category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
}

impl Category {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Wire shape for the category listing.
    pub fn descriptor() -> StructDescriptor {
        StructDescriptor::new("CategoryList")
            .field("categoryId", string_entry())
            .field("categoryName", string_entry())
    }

    pub fn to_value(&self) -> Value {
        Value::Struct(
            StructValue::new()
                .with("categoryId", self.id.clone())
                .with("categoryName", self.name.clone()),
        )
    }
}

/// One category assigned to one article.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryAssignment {
    pub category_id: String,
    pub category_name: String,
    pub is_primary: bool,
}

impl CategoryAssignment {
    pub fn descriptor() -> StructDescriptor {
        StructDescriptor::new("CategoryPerPost")
            .field("categoryName", string_entry())
            .field("categoryId", string_entry())
            .field("isPrimary", SignatureEntry::scalar(ScalarKind::Bool))
    }

    pub fn to_value(&self) -> Value {
        Value::Struct(
            StructValue::new()
                .with("categoryName", self.category_name.clone())
                .with("categoryId", self.category_id.clone())
                .with("isPrimary", self.is_primary),
        )
    }

    /// # Errors
    ///
    /// Returns an error if the payload is not a struct value.
    pub fn from_value(value: &Value) -> anyhow::Result<Self> {
        let fields = value.as_struct().ok_or_else(|| {
            anyhow::anyhow!("category payload is a {}, not a struct", value.type_name())
        })?;
        Ok(Self {
            category_id: field_str(fields, "categoryId"),
            category_name: field_str(fields, "categoryName"),
            is_primary: field_flag(fields, "isPrimary"),
        })
    }
}

/// Title line for the recent-post listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticleTitle {
    pub date_created: Option<DateTime<Utc>>,
    pub userid: String,
    pub postid: String,
    pub title: String,
}

impl ArticleTitle {
    pub fn descriptor() -> StructDescriptor {
        StructDescriptor::new("ArticleTitle")
            .field("dateCreated", SignatureEntry::scalar(ScalarKind::DateTime))
            .field("userid", string_entry())
            .field("postid", string_entry())
            .field("title", string_entry())
    }

    pub fn to_value(&self) -> Value {
        let mut fields = StructValue::new();
        if let Some(when) = self.date_created {
            fields.insert("dateCreated", Value::DateTime(when));
        }
        fields.insert("userid", self.userid.clone());
        fields.insert("postid", self.postid.clone());
        fields.insert("title", self.title.clone());
        Value::Struct(fields)
    }
}

impl From<&Article> for ArticleTitle {
    fn from(article: &Article) -> Self {
        Self {
            date_created: article.date_created,
            userid: article.author.clone(),
            postid: article.postid.clone(),
            title: article.title.clone(),
        }
    }
}

/// One installed text filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextFilterEntry {
    pub key: String,
    pub label: String,
}

impl TextFilterEntry {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
        }
    }

    pub fn descriptor() -> StructDescriptor {
        StructDescriptor::new("TextFilter")
            .field("key", string_entry())
            .field("label", string_entry())
    }

    pub fn to_value(&self) -> Value {
        Value::Struct(
            StructValue::new()
                .with("key", self.key.clone())
                .with("label", self.label.clone()),
        )
    }
}

/// One received trackback ping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackbackPing {
    pub title: String,
    pub url: String,
    pub ip: String,
}

impl TrackbackPing {
    pub fn descriptor() -> StructDescriptor {
        StructDescriptor::new("TrackBack")
            .field("pingTitle", string_entry())
            .field("pingURL", string_entry())
            .field("pingIP", string_entry())
    }

    pub fn to_value(&self) -> Value {
        Value::Struct(
            StructValue::new()
                .with("pingTitle", self.title.clone())
                .with("pingURL", self.url.clone())
                .with("pingIP", self.ip.clone()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use quill_api::cast::parse_datetime_text;

    fn sample_article() -> Article {
        Article {
            postid: "7".to_string(),
            title: "Hello".to_string(),
            description: "Body text".to_string(),
            url: "http://blog.example.com/articles/7".to_string(),
            perma_link: "http://blog.example.com/articles/7".to_string(),
            categories: vec!["General".to_string()],
            excerpt: "An excerpt".to_string(),
            extended: "More body".to_string(),
            keywords: "hello".to_string(),
            allow_comments: true,
            allow_pings: false,
            text_filter: "markdown".to_string(),
            trackback_urls: vec![],
            date_created: parse_datetime_text("20060215T10:30:00"),
            author: "admin".to_string(),
            published: true,
        }
    }

    #[test]
    fn article_wire_fields_follow_the_declaration() {
        let value = sample_article().to_value();
        let fields = value.as_struct().expect("struct");
        let declared: Vec<&str> = Article::descriptor()
            .fields()
            .iter()
            .map(|(name, _)| name.as_str())
            .collect();
        assert_eq!(fields.field_names(), declared);
    }

    #[test]
    fn article_link_mirrors_url() {
        let value = sample_article().to_value();
        let fields = value.as_struct().expect("struct");
        assert_eq!(fields.get("link"), fields.get("url"));
    }

    #[test]
    fn article_flags_encode_as_ints() {
        let value = sample_article().to_value();
        let fields = value.as_struct().expect("struct");
        assert_eq!(fields.get("mt_allow_comments"), Some(&Value::Int(1)));
        assert_eq!(fields.get("mt_allow_pings"), Some(&Value::Int(0)));
    }

    #[test]
    fn article_from_value_defaults_absent_fields() {
        let payload = Value::Struct(
            StructValue::new()
                .with("title", "Sparse")
                .with("description", "Just a body"),
        );
        let article = Article::from_value(&payload).expect("article");
        assert_eq!(article.title, "Sparse");
        assert_eq!(article.description, "Just a body");
        assert!(article.categories.is_empty());
        assert!(article.date_created.is_none());
        assert!(!article.allow_comments);
    }

    #[test]
    fn article_from_value_rejects_non_struct() {
        let err = Article::from_value(&Value::Int(3)).expect_err("not a struct");
        assert!(err.to_string().contains("not a struct"));
    }

    #[test]
    fn article_from_value_accepts_int_flags() {
        let payload = Value::Struct(
            StructValue::new()
                .with("mt_allow_comments", Value::Int(1))
                .with("mt_allow_pings", Value::Bool(true)),
        );
        let article = Article::from_value(&payload).expect("article");
        assert!(article.allow_comments);
        assert!(article.allow_pings);
    }

    #[test]
    fn category_assignment_round_trips() {
        let assignment = CategoryAssignment {
            category_id: "2".to_string(),
            category_name: "Meta".to_string(),
            is_primary: true,
        };
        let parsed = CategoryAssignment::from_value(&assignment.to_value()).expect("assignment");
        assert_eq!(parsed, assignment);
    }

    #[test]
    fn media_object_round_trips() {
        let media = MediaObject {
            name: "photo.png".to_string(),
            media_type: "image/png".to_string(),
            bits: vec![1, 2, 3],
        };
        let parsed = MediaObject::from_value(&media.to_value()).expect("media");
        assert_eq!(parsed, media);
    }

    #[test]
    fn article_title_derives_from_an_article() {
        let title = ArticleTitle::from(&sample_article());
        assert_eq!(title.postid, "7");
        assert_eq!(title.userid, "admin");
        assert_eq!(title.title, "Hello");
    }
}
