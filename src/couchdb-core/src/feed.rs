//! Continuous `_changes` feed reader.
//!
//! A [`ChangeFeed`] owns one open response body. A background task splits
//! the body into newline-delimited JSON records, decodes each into a
//! [`Change`] and hands it to the consumer over a channel with room for a
//! single event, so a consumer that stops receiving stops the network read.
//!
//! Consumers see the end of the feed only as the end of the sequence.
//! The reason it ended is kept aside and can be collected with
//! [`ChangeFeed::finish`].

use futures::Stream;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::{mpsc, Notify};
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, trace};

use crate::changes::Change;

/// Why a feed stopped delivering events.
#[derive(Debug)]
pub enum FeedEnd {
    /// The server closed the body.
    EndOfStream,
    /// Reading the body failed mid-stream.
    ReadError(std::io::Error),
    /// [`ChangeFeed::stop`] was called.
    Cancelled,
    /// The receiving side went away.
    ConsumerGone,
}

impl FeedEnd {
    pub fn is_error(&self) -> bool {
        matches!(self, FeedEnd::ReadError(_))
    }
}

/// A live change feed bound to exactly one response body.
pub struct ChangeFeed {
    rx: mpsc::Receiver<Change>,
    shutdown: Arc<Notify>,
    handle: JoinHandle<FeedEnd>,
}

impl ChangeFeed {
    /// Start reading `body` on a background task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<R>(body: R) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let (tx, rx) = mpsc::channel(1);
        let shutdown = Arc::new(Notify::new());
        let handle = tokio::spawn(read_feed(body, tx, shutdown.clone()));

        Self {
            rx,
            shutdown,
            handle,
        }
    }

    /// Receive the next change, or `None` once the feed has closed.
    pub async fn next(&mut self) -> Option<Change> {
        self.rx.recv().await
    }

    /// Ask the reader to stop. The body is released even if the reader is
    /// blocked on the network or on a full channel.
    pub fn stop(&self) {
        self.shutdown.notify_one();
    }

    /// Close the receiving side and wait for the reader task to exit,
    /// returning why the feed ended.
    pub async fn finish(mut self) -> Result<FeedEnd, JoinError> {
        self.rx.close();
        (&mut self.handle).await
    }
}

impl Drop for ChangeFeed {
    fn drop(&mut self) {
        self.shutdown.notify_one();
    }
}

impl Stream for ChangeFeed {
    type Item = Change;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

/// Decode one framed line of the feed.
///
/// Blank lines (heartbeats), undecodable lines and rows without a sequence
/// yield `None`.
pub fn decode_line(line: &[u8]) -> Option<Change> {
    let line = line.trim_ascii();
    if line.is_empty() {
        return None;
    }

    match serde_json::from_slice::<Change>(line) {
        Ok(change) if !change.seq.is_empty() => Some(change),
        Ok(_) => {
            trace!("Skipping change feed row without sequence");
            None
        }
        Err(e) => {
            trace!(error = %e, "Skipping undecodable change feed line");
            None
        }
    }
}

async fn read_feed<R>(body: R, tx: mpsc::Sender<Change>, shutdown: Arc<Notify>) -> FeedEnd
where
    R: AsyncRead + Unpin,
{
    debug!("Change feed opened");

    let mut reader = BufReader::new(body);
    let mut line = Vec::new();
    let mut delivered: u64 = 0;

    let end = loop {
        line.clear();
        // An idle feed only carries heartbeats, so a departed consumer has
        // to be noticed here and not just on the next send.
        let read = tokio::select! {
            biased;
            _ = shutdown.notified() => break FeedEnd::Cancelled,
            _ = tx.closed() => break FeedEnd::ConsumerGone,
            read = reader.read_until(b'\n', &mut line) => read,
        };

        match read {
            Ok(0) => break FeedEnd::EndOfStream,
            // A fragment without its terminator only shows up at end of body.
            Ok(_) if line.last() != Some(&b'\n') => break FeedEnd::EndOfStream,
            Ok(_) => {}
            Err(e) => break FeedEnd::ReadError(e),
        }

        let Some(change) = decode_line(&line) else {
            continue;
        };

        let sent = tokio::select! {
            biased;
            _ = shutdown.notified() => break FeedEnd::Cancelled,
            sent = tx.send(change) => sent,
        };
        if sent.is_err() {
            break FeedEnd::ConsumerGone;
        }
        delivered += 1;
    };

    // Release the body before the consumer can observe the closed channel.
    drop(reader);
    drop(tx);

    debug!(delivered, end = ?end, "Change feed closed");
    end
}
