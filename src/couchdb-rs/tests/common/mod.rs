//! In-process mock CouchDB used by the integration tests.
//!
//! The server answers from a fixed table of stubs keyed by method and raw
//! path, records every request it sees, and answers anything else with
//! CouchDB's `not_found` error.

#![allow(dead_code)]

use actix_web::http::StatusCode;
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use futures::stream::{self, Stream, StreamExt};
use serde_json::Value;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: String,
    pub body: Vec<u8>,
    pub authorization: Option<String>,
    pub cookie: Option<String>,
    pub content_type: Option<String>,
}

impl Recorded {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("request body is JSON")
    }

    /// Decoded query parameter value.
    pub fn param(&self, name: &str) -> Option<String> {
        url::form_urlencoded::parse(self.query.as_bytes())
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    }
}

#[derive(Clone)]
enum StubBody {
    Empty,
    Json(Value),
    Stream { chunks: Vec<String>, hang: bool },
}

#[derive(Clone)]
pub struct Stub {
    method: String,
    path: String,
    status: u16,
    headers: Vec<(String, String)>,
    body: StubBody,
}

impl Stub {
    pub fn json(method: &str, path: &str, status: u16, body: Value) -> Self {
        Self {
            method: method.to_string(),
            path: path.to_string(),
            status,
            headers: Vec::new(),
            body: StubBody::Json(body),
        }
    }

    pub fn empty(method: &str, path: &str, status: u16) -> Self {
        Self {
            method: method.to_string(),
            path: path.to_string(),
            status,
            headers: Vec::new(),
            body: StubBody::Empty,
        }
    }

    /// Chunked body that ends after the last chunk.
    pub fn stream(path: &str, chunks: &[&str]) -> Self {
        Self::chunked(path, chunks, false)
    }

    /// Chunked body that stays open after the last chunk.
    pub fn hanging_stream(path: &str, chunks: &[&str]) -> Self {
        Self::chunked(path, chunks, true)
    }

    fn chunked(path: &str, chunks: &[&str], hang: bool) -> Self {
        Self {
            method: "GET".to_string(),
            path: path.to_string(),
            status: 200,
            headers: Vec::new(),
            body: StubBody::Stream {
                chunks: chunks.iter().map(|c| c.to_string()).collect(),
                hang,
            },
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<Recorded>>>);

pub struct MockCouch {
    pub url: String,
    recorder: Recorder,
}

impl MockCouch {
    /// Start the mock on an ephemeral port.
    pub async fn start(stubs: Vec<Stub>) -> Self {
        let recorder = Recorder::default();
        let state = web::Data::new((recorder.clone(), stubs));

        let server = HttpServer::new(move || {
            App::new()
                .app_data(state.clone())
                .default_service(web::to(respond))
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .expect("bind mock server");

        let addr = server.addrs()[0];
        actix_web::rt::spawn(server.run());

        Self {
            url: format!("http://{}", addr),
            recorder,
        }
    }

    /// Base URL with basic-auth credentials embedded.
    pub fn url_with_credentials(&self, user: &str, password: &str) -> String {
        self.url
            .replacen("http://", &format!("http://{}:{}@", user, password), 1)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.recorder.0.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> Recorded {
        self.requests().pop().expect("no request recorded")
    }
}

type ChunkStream = Pin<Box<dyn Stream<Item = Result<web::Bytes, std::io::Error>>>>;

async fn respond(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<(Recorder, Vec<Stub>)>,
) -> HttpResponse {
    let (recorder, stubs) = state.get_ref();
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    recorder.0.lock().unwrap().push(Recorded {
        method: req.method().to_string(),
        path: req.path().to_string(),
        query: req.query_string().to_string(),
        body: body.to_vec(),
        authorization: header("authorization"),
        cookie: header("cookie"),
        content_type: header("content-type"),
    });

    let Some(stub) = stubs
        .iter()
        .find(|s| s.method == req.method().as_str() && s.path == req.path())
    else {
        return HttpResponse::NotFound()
            .json(serde_json::json!({"error": "not_found", "reason": "missing"}));
    };

    let mut builder =
        HttpResponse::build(StatusCode::from_u16(stub.status).expect("valid status"));
    for (name, value) in &stub.headers {
        builder.insert_header((name.as_str(), value.as_str()));
    }

    match &stub.body {
        StubBody::Empty => builder.finish(),
        StubBody::Json(value) => builder.json(value),
        StubBody::Stream { chunks, hang } => {
            let chunks: Vec<Result<web::Bytes, std::io::Error>> = chunks
                .iter()
                .map(|c| Ok(web::Bytes::from(c.clone())))
                .collect();
            let body: ChunkStream = if *hang {
                Box::pin(stream::iter(chunks).chain(stream::pending()))
            } else {
                Box::pin(stream::iter(chunks))
            };
            builder.content_type("application/json").streaming(body)
        }
    }
}
