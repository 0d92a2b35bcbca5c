use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Sequence is an opaque position in a database's change log.
///
/// CouchDB 2.x and later send composite string tokens; 1.x sends bare
/// integers. Both decode to their string form, and `null` decodes to the
/// empty sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Sequence(String);

impl Sequence {
    pub fn new(seq: impl Into<String>) -> Self {
        Self(seq.into())
    }

    /// Sequence that asks the server to start from the current end of the log.
    pub fn now() -> Self {
        Self("now".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Sequence {
    fn from(seq: &str) -> Self {
        Self(seq.to_string())
    }
}

impl From<String> for Sequence {
    fn from(seq: String) -> Self {
        Self(seq)
    }
}

impl From<u64> for Sequence {
    fn from(seq: u64) -> Self {
        Self(seq.to_string())
    }
}

impl Serialize for Sequence {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Sequence {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawSequence {
            Text(String),
            Number(serde_json::Number),
        }

        Ok(match Option::<RawSequence>::deserialize(deserializer)? {
            Some(RawSequence::Text(seq)) => Sequence(seq),
            Some(RawSequence::Number(seq)) => Sequence(seq.to_string()),
            None => Sequence::default(),
        })
    }
}

/// Change is a single row of the `_changes` feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Change {
    #[serde(default)]
    pub seq: Sequence,
    #[serde(default)]
    pub id: String,
    /// Leaf revisions touched by this change.
    #[serde(default)]
    pub changes: Vec<Rev>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deleted: bool,
    /// Present when the feed was requested with `include_docs=true`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<serde_json::Value>,
}

/// Rev holds the revision of a changed document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rev {
    #[serde(default)]
    pub rev: String,
}

/// ChangesResponse is the body of a polled `_changes` request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangesResponse {
    #[serde(default)]
    pub last_seq: Sequence,
    #[serde(default)]
    pub results: Vec<Change>,
    #[serde(default)]
    pub pending: u64,
}

/// FeedMode selects how the server delivers changes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FeedMode {
    Normal,
    Longpoll,
    Continuous,
    #[serde(rename = "eventsource")]
    EventSource,
}

/// ChangesStyle selects which revisions are listed per change.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChangesStyle {
    MainOnly,
    AllDocs,
}

/// ChangesQueryParameters are the URL query parameters of `_changes`.
///
/// Unset fields are left out of the query string.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChangesQueryParameters {
    #[serde(
        skip_serializing_if = "Vec::is_empty",
        serialize_with = "serialize_json_list"
    )]
    pub doc_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflicts: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descending: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feed: Option<FeedMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    /// Milliseconds between keep-alive newlines.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heartbeat: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_docs: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub att_encoding_info: Option<bool>,
    #[serde(rename = "last-event-id", skip_serializing_if = "Option::is_none")]
    pub last_event_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<Sequence>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<ChangesStyle>,
    /// Milliseconds the server waits for a change before closing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
}

impl ChangesQueryParameters {
    /// Copy of these parameters with the feed forced to `continuous`.
    ///
    /// Any other mode would not produce a streaming body.
    pub fn streaming(&self) -> Self {
        Self {
            feed: Some(FeedMode::Continuous),
            ..self.clone()
        }
    }

    /// Copy of these parameters suitable for a single poll.
    ///
    /// A `continuous` feed is dropped; other modes such as `longpoll` stay.
    pub fn polling(&self) -> Self {
        let feed = match self.feed {
            Some(FeedMode::Continuous) => None,
            other => other,
        };
        Self {
            feed,
            ..self.clone()
        }
    }
}

fn serialize_json_list<S: Serializer>(ids: &[String], serializer: S) -> Result<S::Ok, S::Error> {
    let encoded = serde_json::to_string(ids).map_err(serde::ser::Error::custom)?;
    serializer.serialize_str(&encoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_accepts_string_number_and_null() {
        let text: Sequence = serde_json::from_str(r#""12-g1AAAA""#).unwrap();
        assert_eq!(text.as_str(), "12-g1AAAA");

        let number: Sequence = serde_json::from_str("42").unwrap();
        assert_eq!(number.as_str(), "42");

        let null: Sequence = serde_json::from_str("null").unwrap();
        assert!(null.is_empty());
    }

    #[test]
    fn test_change_missing_fields_default() {
        let change: Change = serde_json::from_str(r#"{"id":"ignore"}"#).unwrap();
        assert!(change.seq.is_empty());
        assert!(change.changes.is_empty());
        assert!(!change.deleted);

        let change: Change = serde_json::from_str(
            r#"{"seq":"1-abc","id":"doc1","changes":[{"rev":"1-x"},{"rev":"1-y"}],"deleted":true}"#,
        )
        .unwrap();
        assert_eq!(change.seq.as_str(), "1-abc");
        assert_eq!(change.changes.len(), 2);
        assert_eq!(change.changes[1].rev, "1-y");
        assert!(change.deleted);
    }

    #[test]
    fn test_changes_response_defaults() {
        let res: ChangesResponse = serde_json::from_str("{}").unwrap();
        assert!(res.last_seq.is_empty());
        assert!(res.results.is_empty());
        assert_eq!(res.pending, 0);

        let res: ChangesResponse = serde_json::from_str(
            r#"{"results":[{"seq":"3-a","id":"x","changes":[{"rev":"2-b"}]}],"last_seq":"3-a","pending":5}"#,
        )
        .unwrap();
        assert_eq!(res.results[0].id, "x");
        assert_eq!(res.last_seq, Sequence::from("3-a"));
        assert_eq!(res.pending, 5);
    }

    #[test]
    fn test_streaming_forces_continuous_without_touching_caller() {
        let params = ChangesQueryParameters {
            feed: Some(FeedMode::Longpoll),
            since: Some(Sequence::from("5")),
            ..Default::default()
        };

        let streaming = params.streaming();
        assert_eq!(streaming.feed, Some(FeedMode::Continuous));
        assert_eq!(streaming.since, Some(Sequence::from("5")));
        assert_eq!(params.feed, Some(FeedMode::Longpoll));
    }

    #[test]
    fn test_polling_strips_only_continuous() {
        let continuous = ChangesQueryParameters {
            feed: Some(FeedMode::Continuous),
            ..Default::default()
        };
        assert_eq!(continuous.polling().feed, None);
        assert_eq!(continuous.feed, Some(FeedMode::Continuous));

        let longpoll = ChangesQueryParameters {
            feed: Some(FeedMode::Longpoll),
            ..Default::default()
        };
        assert_eq!(longpoll.polling().feed, Some(FeedMode::Longpoll));
    }

    #[test]
    fn test_feed_mode_wire_names() {
        assert_eq!(
            serde_json::to_string(&FeedMode::EventSource).unwrap(),
            r#""eventsource""#
        );
        assert_eq!(
            serde_json::to_string(&ChangesStyle::AllDocs).unwrap(),
            r#""all_docs""#
        );
    }
}
