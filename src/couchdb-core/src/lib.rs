//! CouchDB Core Library
//!
//! This crate provides the transport-agnostic pieces of the CouchDB client:
//! - Wire models for server, database, document, user and session endpoints
//! - View and `_changes` query parameter sets
//! - The continuous change-feed reader
//! - Client configuration

pub mod changes;
pub mod config;
pub mod feed;
pub mod mime;
pub mod models;
pub mod view;

// Re-export commonly used types
pub use changes::{
    Change, ChangesQueryParameters, ChangesResponse, ChangesStyle, FeedMode, Rev, Sequence,
};
pub use config::Config;
pub use feed::{ChangeFeed, FeedEnd};
pub use mime::mime_type;
pub use models::*;
pub use view::{DesignDocument, DesignDocumentView, QueryParameters, Row, ViewResponse};
