//! Thin request layer over a hyper client.
//!
//! hyper never follows redirects on its own, which is what the server expects: some 3xx
//! responses carry application signals the caller has to see.

use futures::TryFutureExt;
use hyper::{
    body,
    client::connect::Connect,
    header::{self, HeaderName},
    Body, Client, Method, Request, Response, StatusCode,
};
use serde_json::Value;
use url::Url;

use crate::{config::USER_AGENT, ClientConfig, Error};

/// Body of an outgoing request.
#[derive(Debug, Clone)]
pub enum RequestBody {
    /// Serialized as JSON with a `Content-Type: application/json` header.
    Json(Value),
    Text(String),
}

/// Everything about a request besides its path.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Method,
    /// `None` values are dropped, they never show up as `key=`.
    pub query: Vec<(String, Option<String>)>,
    pub headers: Vec<(HeaderName, String)>,
    /// Only sent for `POST`, `PUT` and `PATCH`.
    pub body: Option<RequestBody>,
    /// Always decode the response as text, whatever its content type.
    pub expect_text: bool,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post_json(body: Value) -> Self {
        Self {
            method: Method::POST,
            body: Some(RequestBody::Json(body)),
            ..Self::default()
        }
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_owned(), Some(value.to_string())));
        self
    }

    pub fn query_opt<V: ToString>(mut self, key: &str, value: Option<V>) -> Self {
        self.query
            .push((key.to_owned(), value.map(|value| value.to_string())));
        self
    }

    pub fn header(mut self, name: HeaderName, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn cookie(self, cookie: impl Into<String>) -> Self {
        self.header(header::COOKIE, cookie)
    }

    pub fn expect_text(mut self) -> Self {
        self.expect_text = true;
        self
    }
}

/// A decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Text(String),
}

impl Payload {
    /// The JSON value, or `None` if the server answered with something else.
    pub fn into_json(self) -> Option<Value> {
        match self {
            Payload::Json(value) => Some(value),
            Payload::Text(_) => None,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            Payload::Text(text) => Some(text),
            Payload::Json(_) => None,
        }
    }
}

/// Issues requests against one server on behalf of a client.
#[derive(Debug, Clone)]
pub struct Transport<T> {
    client: Client<T, Body>,
    base_url: Url,
    user_agent: bool,
}

impl<T> Transport<T> {
    pub fn new(client: Client<T, Body>, config: &ClientConfig) -> Self {
        Self {
            client,
            base_url: config.base_url().clone(),
            user_agent: config.sends_user_agent(),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

impl<T> Transport<T>
where
    T: Connect + Clone + Send + Sync + 'static,
{
    /// Send a request and decode its body.
    ///
    /// Statuses outside `[200, 303)` fail with [`Error::Http`].
    pub async fn request(&self, path: &str, options: RequestOptions) -> Result<Payload, Error> {
        let expect_text = options.expect_text;
        let response = self.request_raw(path, options).await?;
        check_status(response.status())?;

        let is_json = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map_or(false, |value| value.contains("application/json"));
        let bytes = body::to_bytes(response.into_body())
            .err_into::<Error>()
            .await?;

        if !expect_text && is_json {
            Ok(Payload::Json(serde_json::from_slice(&bytes)?))
        } else {
            Ok(Payload::Text(String::from_utf8_lossy(&bytes).into_owned()))
        }
    }

    /// Send a request and hand back the response untouched, status included.
    pub async fn request_raw(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<Response<Body>, Error> {
        let url = build_url(&self.base_url, path, &options.query)?;
        tracing::debug!(method = %options.method, path = url.path(), "sending request");

        let mut builder = Request::builder()
            .method(options.method.clone())
            .uri(url.as_str())
            .header(header::CACHE_CONTROL, "no-cache")
            .header(header::PRAGMA, "no-cache")
            .header("X-Requested-With", "XMLHttpRequest");
        if self.user_agent {
            builder = builder.header(header::USER_AGENT, USER_AGENT);
        }
        for (name, value) in options.headers {
            builder = builder.header(name, value);
        }

        let sends_body = matches!(options.method, Method::POST | Method::PUT | Method::PATCH);
        let body = match options.body {
            Some(RequestBody::Json(value)) if sends_body => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_vec(&value)?)
            }
            Some(RequestBody::Text(text)) if sends_body => Body::from(text),
            _ => Body::empty(),
        };

        Ok(self.client.request(builder.body(body)?).await?)
    }
}

/// Resolve `path` against `base` and append the defined query parameters.
pub fn build_url(base: &Url, path: &str, query: &[(String, Option<String>)]) -> Result<Url, Error> {
    let mut url = base.join(path)?;
    let mut defined = query
        .iter()
        .filter_map(|(key, value)| value.as_ref().map(|value| (key, value)))
        .peekable();
    // `query_pairs_mut` leaves a dangling `?` behind if nothing is appended.
    if defined.peek().is_some() {
        url.query_pairs_mut().extend_pairs(defined);
    }
    Ok(url)
}

/// Accept `[200, 303)`. Redirects below 303 are application signals, not failures.
pub fn check_status(status: StatusCode) -> Result<(), Error> {
    if (200..303).contains(&status.as_u16()) {
        Ok(())
    } else {
        Err(Error::Http {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_owned(),
        })
    }
}
