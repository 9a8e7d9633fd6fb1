use hyper::client::connect::Connect;
use serde_json::{json, Value};

use super::{LoginContext, LoginStrategy};
use crate::{
    config::JSONRPC_PATH,
    http::RequestOptions,
    rpc::{self, is_truthy},
    Error, Session,
};

/// Username and password login through the JSON-RPC `authenticate` method.
///
/// The server may revoke such a session after roughly ten minutes of idling.
#[derive(Debug, Clone)]
pub struct PasswordAuth {
    user: String,
    password: String,
}

impl PasswordAuth {
    pub fn new(user: &str, password: &str) -> Self {
        Self {
            user: user.to_owned(),
            password: password.to_owned(),
        }
    }
}

impl LoginStrategy for PasswordAuth {
    async fn login<T>(&self, ctx: LoginContext<'_, T>) -> Result<Session, Error>
    where
        T: Connect + Clone + Send + Sync + 'static,
    {
        let identity = ctx.config.application_identity();
        tracing::debug!(user = %self.user, "authenticating with password");

        let payload = ctx
            .transport
            .request(
                JSONRPC_PATH,
                RequestOptions::post_json(rpc::envelope(
                    identity,
                    "authenticate",
                    json!({
                        "user": self.user,
                        "password": self.password,
                        "client": identity,
                    }),
                ))
                .query("school", ctx.config.school()),
            )
            .await?;

        session_from_authenticate(payload.into_json())
    }
}

/// Check an `authenticate` response step by step, each failure has its own message.
fn session_from_authenticate(response: Option<Value>) -> Result<Session, Error> {
    let response = response
        .filter(Value::is_object)
        .ok_or_else(|| Error::auth("Failed to parse server response."))?;

    let result = match response.get("result") {
        Some(result) if is_truthy(result) => result,
        _ => return Err(Error::auth(format!("Failed to login. {response}"))),
    };
    if let Some(code) = result.get("code").filter(|code| is_truthy(code)) {
        return Err(Error::auth(format!(
            "Login returned error code: {}",
            rpc::scalar_to_string(code)
        )));
    }
    if !result.get("sessionId").map_or(false, is_truthy) {
        return Err(Error::auth("Failed to login. No session id."));
    }

    serde_json::from_value(result.clone())
        .map_err(|err| Error::auth(format!("Failed to login. Invalid session information: {err}")))
}
