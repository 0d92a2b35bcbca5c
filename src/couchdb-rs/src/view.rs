use crate::{Database, Result};
use couchdb_core::view::ViewKeys;
use couchdb_core::{QueryParameters, ViewResponse};
use reqwest::Method;
use serde::Serialize;

/// Views of one design document.
#[derive(Clone)]
pub struct View {
    db: Database,
    design: String,
}

impl View {
    pub(crate) fn new(db: Database, design: String) -> Self {
        Self { db, design }
    }

    pub fn design(&self) -> &str {
        &self.design
    }

    /// Query a view with GET
    pub async fn get(&self, name: &str, params: &QueryParameters) -> Result<ViewResponse> {
        let url = self
            .db
            .endpoint(&["_design", &self.design, "_view", name])?;
        let builder = self
            .db
            .client()
            .request_builder(Method::GET, url)
            .query(params);
        self.db.client().send_json(builder).await
    }

    /// Query a view for a set of keys with POST
    pub async fn post<K: Serialize>(
        &self,
        name: &str,
        keys: &[K],
        params: &QueryParameters,
    ) -> Result<ViewResponse> {
        let url = self
            .db
            .endpoint(&["_design", &self.design, "_view", name])?;
        let builder = self
            .db
            .client()
            .with_body(Method::POST, url, &ViewKeys { keys })
            .query(params);
        self.db.client().send_json(builder).await
    }
}
