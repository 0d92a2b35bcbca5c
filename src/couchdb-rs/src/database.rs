use crate::{Changes, Client, ClientError, Result, View};
use base64::{engine::general_purpose, Engine as _};
use couchdb_core::{
    mime_type, Attachment, CouchDoc, DatabaseInfo, DatabaseResponse, DocumentHead,
    DocumentResponse, PurgeResponse, QueryParameters, SecurityDocument, ViewResponse,
};
use reqwest::header::ETAG;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;
use url::Url;

/// A single database on the server.
#[derive(Clone)]
pub struct Database {
    client: Client,
    name: String,
}

#[derive(Serialize)]
struct BulkDocsRequest<'a, D: Serialize> {
    docs: &'a [D],
}

impl Database {
    pub(crate) fn new(client: Client, name: String) -> Self {
        Self { client, name }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    /// URL of a path inside this database.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut all = Vec::with_capacity(segments.len() + 1);
        all.push(self.name.as_str());
        all.extend_from_slice(segments);
        self.client.endpoint(&all)
    }

    /// URL of a document. `_design/` and `_local/` ids keep their slash.
    fn document_url(&self, id: &str) -> Result<Url> {
        match id.split_once('/') {
            Some((prefix @ ("_design" | "_local"), name)) => self.endpoint(&[prefix, name]),
            _ => self.endpoint(&[id]),
        }
    }

    /// Database information
    pub async fn info(&self) -> Result<DatabaseInfo> {
        self.client.get_json(self.endpoint(&[])?).await
    }

    /// Check whether a document exists without fetching its body
    pub async fn head(&self, id: &str) -> Result<Option<DocumentHead>> {
        let url = self.document_url(id)?;
        let response = match self
            .client
            .send(self.client.request_builder(Method::HEAD, url))
            .await
        {
            Ok(response) => response,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };

        let rev = response
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim_matches('"').to_string());

        Ok(Some(DocumentHead {
            status: response.status().as_u16(),
            rev,
        }))
    }

    /// Get a document by ID
    pub async fn get<T: DeserializeOwned>(&self, id: &str) -> Result<Option<T>> {
        self.client.get_optional(self.document_url(id)?).await
    }

    /// Create a document; the server assigns an id when the document has none
    pub async fn post<D: CouchDoc + Serialize>(&self, doc: &D) -> Result<DocumentResponse> {
        let url = self.endpoint(&[])?;
        self.client
            .send_json(self.client.with_body(Method::POST, url, doc))
            .await
    }

    /// Create or update a document under its own id
    pub async fn put<D: CouchDoc + Serialize>(&self, doc: &D) -> Result<DocumentResponse> {
        let id = &doc.document().id;
        if id.is_empty() {
            return Err(ClientError::InvalidDocument(
                "cannot put a document without an id".to_string(),
            ));
        }

        let url = self.document_url(id)?;
        self.client
            .send_json(self.client.with_body(Method::PUT, url, doc))
            .await
    }

    /// Delete the revision of a document held in `doc`
    pub async fn delete<D: CouchDoc>(&self, doc: &D) -> Result<DocumentResponse> {
        let meta = doc.document();
        if meta.id.is_empty() || meta.rev.is_empty() {
            return Err(ClientError::InvalidDocument(
                "delete needs both id and revision".to_string(),
            ));
        }

        let url = self.document_url(&meta.id)?;
        let builder = self
            .client
            .request_builder(Method::DELETE, url)
            .query(&[("rev", meta.rev.as_str())]);
        self.client.send_json(builder).await
    }

    /// Inline the file at `path` as an attachment of `doc` and save it.
    ///
    /// The attachment is named after the file; its content type comes from
    /// the file extension.
    pub async fn put_attachment<D: CouchDoc + Serialize>(
        &self,
        doc: &mut D,
        path: impl AsRef<Path>,
    ) -> Result<DocumentResponse> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                ClientError::InvalidDocument(format!("no file name in {}", path.display()))
            })?
            .to_string();

        let content = tokio::fs::read(path).await?;
        debug!(
            db = %self.name,
            attachment = %file_name,
            bytes = content.len(),
            "Attaching file"
        );

        doc.document_mut().attachments.insert(
            file_name,
            Attachment {
                content_type: mime_type(path).to_string(),
                data: Some(general_purpose::STANDARD.encode(&content)),
                ..Attachment::default()
            },
        );

        if doc.document().id.is_empty() {
            self.post(doc).await
        } else {
            self.put(doc).await
        }
    }

    /// Write many documents in one request
    pub async fn bulk<D: Serialize>(&self, docs: &[D]) -> Result<Vec<DocumentResponse>> {
        let url = self.endpoint(&["_bulk_docs"])?;
        let req = BulkDocsRequest { docs };
        self.client
            .send_json(self.client.with_body(Method::POST, url, &req))
            .await
    }

    /// List documents, optionally filtered and with bodies
    pub async fn all_docs(&self, params: Option<&QueryParameters>) -> Result<ViewResponse> {
        let url = self.endpoint(&["_all_docs"])?;
        let mut builder = self.client.request_builder(Method::GET, url);
        if let Some(params) = params {
            builder = builder.query(params);
        }
        self.client.send_json(builder).await
    }

    /// Permanently remove document revisions
    pub async fn purge(&self, revs: &HashMap<String, Vec<String>>) -> Result<PurgeResponse> {
        let url = self.endpoint(&["_purge"])?;
        self.client
            .send_json(self.client.with_body(Method::POST, url, revs))
            .await
    }

    /// Read the security object
    pub async fn get_security(&self) -> Result<SecurityDocument> {
        self.client.get_json(self.endpoint(&["_security"])?).await
    }

    /// Replace the security object
    pub async fn put_security(&self, security: &SecurityDocument) -> Result<DatabaseResponse> {
        let url = self.endpoint(&["_security"])?;
        self.client
            .send_json(self.client.with_body(Method::PUT, url, security))
            .await
    }

    /// Views of the design document `_design/{design}`
    pub fn view(&self, design: impl Into<String>) -> View {
        View::new(self.clone(), design.into())
    }

    /// The `_changes` feed of this database
    pub fn changes(&self) -> Changes {
        Changes::new(self.clone())
    }
}
