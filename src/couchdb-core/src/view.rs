use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;

use crate::changes::Sequence;
use crate::models::{CouchDoc, Document};

const DESIGN_PREFIX: &str = "_design/";

/// DesignDocument holds views and filter functions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DesignDocument {
    #[serde(flatten)]
    pub document: Document,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub language: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub views: HashMap<String, DesignDocumentView>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub filters: HashMap<String, String>,
}

impl DesignDocument {
    /// Create an empty javascript design document named `name`.
    pub fn new(name: &str) -> Self {
        Self {
            document: Document {
                id: format!("{}{}", DESIGN_PREFIX, name),
                ..Document::default()
            },
            language: "javascript".to_string(),
            ..Self::default()
        }
    }

    /// Name of the design document without the `_design/` prefix.
    pub fn name(&self) -> &str {
        self.document
            .id
            .strip_prefix(DESIGN_PREFIX)
            .unwrap_or(&self.document.id)
    }
}

impl CouchDoc for DesignDocument {
    fn document(&self) -> &Document {
        &self.document
    }

    fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }
}

/// DesignDocumentView is one map/reduce pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DesignDocumentView {
    pub map: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reduce: String,
}

/// QueryParameters are the URL query parameters of views and `_all_docs`.
///
/// Key fields hold JSON values and are sent JSON-encoded, as the server expects.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflicts: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descending: Option<bool>,
    #[serde(
        rename = "endkey",
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_json"
    )]
    pub end_key: Option<serde_json::Value>,
    #[serde(rename = "endkey_docid", skip_serializing_if = "Option::is_none")]
    pub end_key_doc_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_level: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_docs: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub att_encoding_info: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inclusive_end: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "serialize_json")]
    pub key: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reduce: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sorted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stale: Option<String>,
    #[serde(
        rename = "startkey",
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_json"
    )]
    pub start_key: Option<serde_json::Value>,
    #[serde(rename = "startkey_docid", skip_serializing_if = "Option::is_none")]
    pub start_key_doc_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_seq: Option<bool>,
}

fn serialize_json<S: Serializer>(
    value: &Option<serde_json::Value>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(value) => serializer.serialize_str(&value.to_string()),
        None => serializer.serialize_none(),
    }
}

/// ViewResponse is the result of a view or `_all_docs` query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ViewResponse {
    #[serde(default)]
    pub offset: u64,
    #[serde(default)]
    pub rows: Vec<Row>,
    #[serde(default)]
    pub total_rows: u64,
    #[serde(default)]
    pub update_seq: Option<Sequence>,
}

/// Row is one emitted key/value pair.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Row {
    /// Source document id; absent on reduced rows.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub key: serde_json::Value,
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(default)]
    pub doc: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Body of a multi-key view request.
#[derive(Debug, Serialize)]
pub struct ViewKeys<'a, K: Serialize> {
    pub keys: &'a [K],
}
