use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::changes::Sequence;

/// Document holds the metadata fields every CouchDB document carries.
///
/// Embed it in your own types with `#[serde(flatten)]` and implement
/// [`CouchDoc`] to store them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(rename = "_rev", default, skip_serializing_if = "String::is_empty")]
    pub rev: String,
    #[serde(
        rename = "_attachments",
        default,
        skip_serializing_if = "HashMap::is_empty"
    )]
    pub attachments: HashMap<String, Attachment>,
}

/// CouchDoc gives the client access to a document's metadata.
pub trait CouchDoc {
    fn document(&self) -> &Document;
    fn document_mut(&mut self) -> &mut Document;
}

impl CouchDoc for Document {
    fn document(&self) -> &Document {
        self
    }

    fn document_mut(&mut self) -> &mut Document {
        self
    }
}

/// Attachment is an entry of a document's `_attachments` map.
///
/// Inline uploads carry base64 `data`; documents read back from the server
/// carry a `stub` with digest and length instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub content_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoded_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revpos: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stub: Option<bool>,
}

/// DocumentResponse is returned by every single-document write
/// (and once per document by `_bulk_docs`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub rev: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// DocumentHead is what a `HEAD` request reveals about a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentHead {
    pub status: u16,
    /// Current revision, taken from the `ETag` header.
    pub rev: Option<String>,
}

/// DatabaseResponse is the plain `{"ok": true}` acknowledgement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseResponse {
    #[serde(default)]
    pub ok: bool,
}

/// ErrorResponse is CouchDB's error body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub reason: String,
}

/// ServerInfo is the welcome document served at `/`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerInfo {
    pub couchdb: String,
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub git_sha: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub vendor: Vendor,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Vendor {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
}

/// Task is one entry of `/_active_tasks`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    #[serde(rename = "type")]
    pub task_type: String,
    #[serde(default)]
    pub node: Option<String>,
    #[serde(default)]
    pub pid: String,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub progress: Option<u32>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub continuous: Option<bool>,
    #[serde(default)]
    pub doc_id: Option<String>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub started_on: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub updated_on: DateTime<Utc>,
}

/// DatabaseInfo describes a database (`GET /{db}`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseInfo {
    pub db_name: String,
    #[serde(default)]
    pub doc_count: u64,
    #[serde(default)]
    pub doc_del_count: u64,
    #[serde(default)]
    pub update_seq: Sequence,
    #[serde(default)]
    pub purge_seq: Sequence,
    #[serde(default)]
    pub compact_running: bool,
    #[serde(default)]
    pub instance_start_time: String,
    #[serde(default)]
    pub disk_format_version: u32,
    #[serde(default)]
    pub sizes: DatabaseSizes,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseSizes {
    #[serde(default)]
    pub file: u64,
    #[serde(default)]
    pub external: u64,
    #[serde(default)]
    pub active: u64,
}

/// PurgeResponse is returned by `POST /{db}/_purge`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PurgeResponse {
    #[serde(default)]
    pub purge_seq: Option<Sequence>,
    #[serde(default)]
    pub purged: HashMap<String, PurgedRevisions>,
}

/// PurgedRevisions accepts both shapes servers use for purged revisions:
/// a bare list (1.x) or `{"purged": [...]}` (2.3+).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PurgedRevisions {
    List(Vec<String>),
    Nested { purged: Vec<String> },
}

impl PurgedRevisions {
    pub fn revs(&self) -> &[String] {
        match self {
            PurgedRevisions::List(revs) => revs,
            PurgedRevisions::Nested { purged } => purged,
        }
    }
}

/// SecurityDocument is the database `_security` object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecurityDocument {
    #[serde(default)]
    pub admins: Element,
    #[serde(default)]
    pub members: Element,
}

/// Element lists the names and roles of one security section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Element {
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// ReplicationRequest is posted to `/_replicate`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplicationRequest {
    #[serde(flatten)]
    pub document: Document,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub cancel: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub continuous: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub create_target: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub doc_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub query_params: HashMap<String, String>,
}

impl CouchDoc for ReplicationRequest {
    fn document(&self) -> &Document {
        &self.document
    }

    fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }
}

/// ReplicationResponse covers both one-shot and continuous replication replies.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReplicationResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub source_last_seq: Option<Sequence>,
    #[serde(default)]
    pub replication_id_version: Option<u32>,
    #[serde(default)]
    pub history: Vec<ReplicationHistory>,
    #[serde(rename = "_local_id", default)]
    pub local_id: Option<String>,
}

/// ReplicationHistory is one past run of a replication.
///
/// CouchDB reports `start_time`/`end_time` as RFC 1123 strings, kept as text.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReplicationHistory {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
    #[serde(default)]
    pub start_last_seq: Sequence,
    #[serde(default)]
    pub end_last_seq: Sequence,
    #[serde(default)]
    pub recorded_seq: Sequence,
    #[serde(default)]
    pub missing_checked: u64,
    #[serde(default)]
    pub missing_found: u64,
    #[serde(default)]
    pub docs_read: u64,
    #[serde(default)]
    pub docs_written: u64,
    #[serde(default)]
    pub doc_write_failures: u64,
}

/// Prefix CouchDB requires for documents in the `_users` database.
pub const USER_ID_PREFIX: &str = "org.couchdb.user:";

/// User is a document of the `_users` database.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(flatten)]
    pub document: Document,
    pub name: String,
    #[serde(rename = "type")]
    pub user_type: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_scheme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derived_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iterations: Option<u32>,
}

impl User {
    /// Build a new user document with the id CouchDB expects.
    pub fn new(name: impl Into<String>, password: impl Into<String>, roles: Vec<String>) -> Self {
        let name = name.into();
        Self {
            document: Document {
                id: user_id(&name),
                ..Document::default()
            },
            name,
            user_type: "user".to_string(),
            roles,
            password: Some(password.into()),
            ..Self::default()
        }
    }
}

impl CouchDoc for User {
    fn document(&self) -> &Document {
        &self.document
    }

    fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }
}

pub fn user_id(name: &str) -> String {
    format!("{}{}", USER_ID_PREFIX, name)
}

/// CreateSessionRequest is the cookie-auth login body.
#[derive(Debug, Clone, Serialize)]
pub struct CreateSessionRequest {
    pub name: String,
    pub password: String,
}

/// CreateSessionResponse is returned by `POST /_session`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateSessionResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Session is returned by `GET /_session`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub info: SessionInfo,
    #[serde(rename = "userCtx", default)]
    pub user_ctx: UserContext,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionInfo {
    #[serde(default)]
    pub authenticated: Option<String>,
    #[serde(default)]
    pub authentication_db: Option<String>,
    #[serde(default)]
    pub authentication_handlers: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserContext {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}
