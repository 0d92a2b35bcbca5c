use crate::{Database, Result};
use async_trait::async_trait;
use couchdb_core::{ChangeFeed, ChangesQueryParameters, ChangesResponse, FeedMode};
use futures::TryStreamExt;
use reqwest::Method;
use tokio_util::io::StreamReader;
use tracing::debug;

/// ChangesService reads the `_changes` endpoint of a database.
#[async_trait]
pub trait ChangesService: Send + Sync {
    /// Open a continuous feed. The feed mode in `params` is always
    /// replaced with `continuous`.
    async fn stream(&self, params: &ChangesQueryParameters) -> Result<ChangeFeed>;

    /// Fetch one batch of changes, possibly held open by the server
    /// when `params` asks for `longpoll`.
    async fn poll(&self, params: &ChangesQueryParameters) -> Result<ChangesResponse>;
}

/// Changes performs requests against `/{db}/_changes`
#[derive(Clone)]
pub struct Changes {
    db: Database,
}

impl Changes {
    pub(crate) fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ChangesService for Changes {
    async fn stream(&self, params: &ChangesQueryParameters) -> Result<ChangeFeed> {
        let params = params.streaming();
        let url = self.db.endpoint(&["_changes"])?;
        let builder = self
            .db
            .client()
            .request_builder(Method::GET, url)
            .query(&params);

        // No timeout: the body stays open for as long as the server streams.
        let response = self.db.client().send_untimed(builder).await?;
        debug!(db = %self.db.name(), since = ?params.since, "Streaming changes");

        let body = response.bytes_stream().map_err(std::io::Error::other);
        Ok(ChangeFeed::spawn(StreamReader::new(Box::pin(body))))
    }

    async fn poll(&self, params: &ChangesQueryParameters) -> Result<ChangesResponse> {
        let params = params.polling();
        let url = self.db.endpoint(&["_changes"])?;
        let builder = self
            .db
            .client()
            .request_builder(Method::GET, url)
            .query(&params);

        // A long poll is held open server-side for up to `timeout`.
        if params.feed == Some(FeedMode::Longpoll) {
            return self.db.client().send_json_untimed(builder).await;
        }
        self.db.client().send_json(builder).await
    }
}
