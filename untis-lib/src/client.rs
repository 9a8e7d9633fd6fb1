use hyper::{client::connect::Connect, Body, Client};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::{
    auth::{LoginContext, LoginStrategy},
    config::{JSONRPC_PATH, PROBE_METHOD},
    cookies::session_cookie_header,
    http::{RequestOptions, Transport},
    rpc, ClientConfig, Error, Session,
};

/// A WebUntis client bound to one school and one way of logging in.
///
/// The client starts without a session. [`Untis::login`] stores the session the strategy
/// produces, [`Untis::logout`] drops it again, after which the client may log in anew.
#[derive(Debug)]
pub struct Untis<S, T> {
    config: ClientConfig,
    transport: Transport<T>,
    strategy: S,
    session: Option<Session>,
}

impl<S, T> Untis<S, T>
where
    S: LoginStrategy,
{
    pub fn with_client(config: ClientConfig, strategy: S, client: Client<T, Body>) -> Self {
        Self {
            transport: Transport::new(client, &config),
            config,
            strategy,
            session: None,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// The current session, or [`Error::NotLoggedIn`] before login and after logout.
    pub fn session(&self) -> Result<&Session, Error> {
        self.session.as_ref().ok_or(Error::NotLoggedIn)
    }

    pub fn is_anonymous(&self) -> bool {
        self.strategy.is_anonymous()
    }

    /// Refuse operations that need a person behind the session.
    pub(crate) fn check_anonymous(&self) -> Result<(), Error> {
        if self.is_anonymous() {
            Err(Error::AnonymousNotSupported)
        } else {
            Ok(())
        }
    }

    pub(crate) fn cookie_header(&self) -> Result<String, Error> {
        let session = self.session()?;
        session_cookie_header(session.session_id(), self.config.school_token())
    }

    /// Person id and type of the session.
    pub(crate) fn current_person(&self) -> Result<(i64, i64), Error> {
        let session = self.session()?;
        let id = session.person_id().ok_or(Error::MissingPerson("personId"))?;
        let kind = session
            .person_type()
            .ok_or(Error::MissingPerson("personType"))?;
        Ok((id, kind))
    }

    pub(crate) fn transport(&self) -> &Transport<T> {
        &self.transport
    }

    pub(crate) fn update_session(&mut self, update: impl FnOnce(Session) -> Session) {
        self.session = self.session.take().map(update);
    }
}

#[cfg(feature = "rustls")]
impl<S> Untis<S, hyper_rustls::HttpsConnector<hyper::client::HttpConnector>>
where
    S: LoginStrategy,
{
    /// A client talking to the server over TLS with the platform's root certificates.
    pub fn https(config: ClientConfig, strategy: S) -> Self {
        let client = Client::builder().build(
            hyper_rustls::HttpsConnectorBuilder::new()
                .with_native_roots()
                .https_or_http()
                .enable_http1()
                .build(),
        );
        Self::with_client(config, strategy, client)
    }
}

impl<S, T> Untis<S, T>
where
    S: LoginStrategy,
    T: Connect + Clone + Send + Sync + 'static,
{
    /// Log in with the client's strategy and keep the resulting session.
    pub async fn login(&mut self) -> Result<Session, Error> {
        let session = self
            .strategy
            .login(LoginContext {
                transport: &self.transport,
                config: &self.config,
            })
            .await?;
        tracing::info!(
            school = self.config.school(),
            person_id = session.person_id(),
            anonymous = self.is_anonymous(),
            "logged in"
        );
        Ok(self.session.insert(session).clone())
    }

    /// End the session on the server and forget it locally.
    ///
    /// The local session is cleared even when the server call fails, the failure is still
    /// returned.
    pub async fn logout(&mut self) -> Result<bool, Error> {
        let mut options = self.rpc_options("logout", json!({}));
        if self.session.is_some() {
            options = options.cookie(self.cookie_header()?);
        }
        let response = self.transport.request(JSONRPC_PATH, options).await;

        self.session = None;
        response?;
        tracing::info!(school = self.config.school(), "logged out");
        Ok(true)
    }

    /// Whether the server still accepts the current session.
    ///
    /// `false` without a session, on an HTTP error status and on any probe answer that is not
    /// a number. Connection failures are returned as errors.
    pub async fn is_session_valid(&self) -> Result<bool, Error> {
        if self.session.is_none() {
            return Ok(false);
        }
        let options = self
            .rpc_options(PROBE_METHOD, json!({}))
            .cookie(self.cookie_header()?);

        match self.transport.request(JSONRPC_PATH, options).await {
            Ok(payload) => Ok(payload
                .into_json()
                .and_then(|response| response.get("result").map(Value::is_number))
                .unwrap_or(false)),
            Err(Error::Http { status, .. }) => {
                tracing::debug!(status, "session probe rejected");
                Ok(false)
            }
            Err(Error::Decode(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Call a JSON-RPC method on the public endpoint and decode its `result`.
    ///
    /// Probes the session first if the config asks for it.
    pub async fn call<R>(&self, method: &str, params: Value) -> Result<R, Error>
    where
        R: DeserializeOwned,
    {
        self.call_at(JSONRPC_PATH, method, params, self.config.validates_session())
            .await
    }

    /// Call a JSON-RPC method on `path`.
    ///
    /// With `validate`, an invalid session fails with [`Error::InvalidSession`] before the call is
    /// sent.
    pub async fn call_at<R>(
        &self,
        path: &str,
        method: &str,
        params: Value,
        validate: bool,
    ) -> Result<R, Error>
    where
        R: DeserializeOwned,
    {
        self.ensure_valid(validate).await?;
        let options = self
            .rpc_options(method, params)
            .cookie(self.cookie_header()?);

        let payload = self.transport.request(path, options).await?;
        Ok(serde_json::from_value(rpc::unwrap_result(payload)?)?)
    }

    pub(crate) async fn ensure_valid(&self, validate: bool) -> Result<(), Error> {
        if validate && !self.is_session_valid().await? {
            return Err(Error::InvalidSession);
        }
        Ok(())
    }

    fn rpc_options(&self, method: &str, params: Value) -> RequestOptions {
        RequestOptions::post_json(rpc::envelope(
            self.config.application_identity(),
            method,
            params,
        ))
        .query("school", self.config.school())
    }
}
