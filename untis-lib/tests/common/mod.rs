//! In-process WebUntis stand-in for the integration tests.
//!
//! Replies are scripted per path, JSON-RPC endpoints additionally per method. Every request is
//! recorded so tests can check what went over the wire, or that nothing did.
#![allow(dead_code)]

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, Mutex},
};

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use hyper::client::HttpConnector;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use untis_lib::{ClientConfig, LoginStrategy, PasswordAuth, Untis};

pub const SCHOOL: &str = "demo school";
pub const JSONRPC: &str = "/WebUntis/jsonrpc.do";
pub const JSONRPC_INTERN: &str = "/WebUntis/jsonrpc_intern.do";

#[derive(Debug, Clone)]
pub enum ReplyBody {
    Json(Value),
    Text(String),
}

#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub headers: Vec<(&'static str, String)>,
    pub body: ReplyBody,
}

impl Reply {
    pub fn json(body: Value) -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: ReplyBody::Json(body),
        }
    }

    pub fn text(body: &str) -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: ReplyBody::Text(body.to_owned()),
        }
    }

    pub fn status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// `name` must be lowercase.
    pub fn header(mut self, name: &'static str, value: &str) -> Self {
        self.headers.push((name, value.to_owned()));
        self
    }
}

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: HashMap<String, String>,
    pub headers: HashMap<String, String>,
    pub body: Option<Value>,
}

impl Recorded {
    /// The JSON-RPC method of the request, if it was one.
    pub fn rpc_method(&self) -> Option<&str> {
        self.body.as_ref()?.get("method")?.as_str()
    }

    pub fn cookie(&self) -> Option<&str> {
        self.headers.get("cookie").map(String::as_str)
    }
}

#[derive(Debug, Default)]
struct Script {
    replies: HashMap<String, Reply>,
    requests: Vec<Recorded>,
}

#[derive(Debug, Clone)]
pub struct MockServer {
    addr: SocketAddr,
    script: Arc<Mutex<Script>>,
}

impl MockServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mock = MockServer {
            addr: listener.local_addr().unwrap(),
            script: Arc::default(),
        };

        let app = Router::new().fallback(handle).with_state(mock.clone());
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        mock
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(SCHOOL, &self.url()).unwrap()
    }

    pub fn client<S: LoginStrategy>(&self, strategy: S) -> Untis<S, HttpConnector> {
        Untis::with_client(self.config(), strategy, hyper::Client::new())
    }

    /// Reply to any request on `path` that no method specific reply matches.
    pub fn route(&self, path: &str, reply: Reply) -> &Self {
        self.script
            .lock()
            .unwrap()
            .replies
            .insert(path.to_owned(), reply);
        self
    }

    pub fn rpc_at(&self, path: &str, method: &str, reply: Reply) -> &Self {
        self.route(&format!("{path}#{method}"), reply)
    }

    pub fn rpc(&self, method: &str, result: Value) -> &Self {
        self.rpc_at(JSONRPC, method, Reply::json(json!({ "result": result })))
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.script.lock().unwrap().requests.clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|request| request.path == path)
            .collect()
    }

    pub fn rpc_calls(&self, method: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|request| request.rpc_method() == Some(method))
            .collect()
    }

    /// A password client that is logged in, with a probe that accepts the session.
    pub async fn logged_in(&self) -> Untis<PasswordAuth, HttpConnector> {
        self.rpc(
            "authenticate",
            json!({"sessionId": "s3ss10n", "personId": 17, "personType": 5, "klasseId": 99}),
        )
        .rpc("getLatestImportTime", json!(1700000000000i64));

        let mut untis = self.client(PasswordAuth::new("max", "secret"));
        untis.login().await.unwrap();
        untis
    }
}

async fn handle(
    State(mock): State<MockServer>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let recorded = Recorded {
        method: method.to_string(),
        path: uri.path().to_owned(),
        query: uri
            .query()
            .map(|query| url::form_urlencoded::parse(query.as_bytes()).into_owned().collect())
            .unwrap_or_default(),
        headers: headers
            .iter()
            .filter_map(|(name, value)| Some((name.to_string(), value.to_str().ok()?.to_owned())))
            .collect(),
        body: serde_json::from_slice(&body).ok(),
    };

    let mut script = mock.script.lock().unwrap();
    let keys = [
        recorded
            .rpc_method()
            .map(|rpc| format!("{}#{rpc}", recorded.path)),
        Some(recorded.path.clone()),
    ];
    let reply = keys
        .into_iter()
        .flatten()
        .find_map(|key| script.replies.get(&key).cloned());
    script.requests.push(recorded);
    drop(script);

    let Some(reply) = reply else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let mut response = match reply.body {
        ReplyBody::Json(body) => Json(body).into_response(),
        ReplyBody::Text(body) => ([(header::CONTENT_TYPE, "text/plain")], body).into_response(),
    };
    *response.status_mut() = StatusCode::from_u16(reply.status).unwrap();
    for (name, value) in reply.headers {
        response.headers_mut().append(
            HeaderName::from_static(name),
            HeaderValue::from_str(&value).unwrap(),
        );
    }
    response
}
