//! Blog publishing surfaces for quill RPC.
//!
//! Two classic XML-RPC editing APIs, MetaWeblog and MovableType,
//! declared as [`quill_rpc_core`] services over a shared
//! [`ContentStore`] seam:
//!
//! - [`content`]: the article, category, and media types with their
//!   wire struct declarations.
//! - [`store`]: the async storage trait plus an in-memory backend.
//! - [`auth`]: the credential-checking before-hook both surfaces
//!   register.
//! - [`metaweblog`] / [`movabletype`]: the method declarations and
//!   bindings, each exposing a `service()` constructor ready for a
//!   [`ServiceRegistry`](quill_rpc_core::ServiceRegistry).

pub mod auth;
pub mod content;
pub mod metaweblog;
pub mod movabletype;
mod params;
pub mod store;

pub use auth::CredentialGate;
pub use content::Article;
pub use content::ArticleTitle;
pub use content::Category;
pub use content::CategoryAssignment;
pub use content::MediaObject;
pub use content::MediaUrl;
pub use content::TextFilterEntry;
pub use content::TrackbackPing;
pub use store::ContentError;
pub use store::ContentStore;
pub use store::MemoryContentStore;
