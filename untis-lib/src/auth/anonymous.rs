use chrono::Utc;
use hyper::client::connect::Connect;
use serde_json::json;

use super::{otp::login_failed, otp_login, Enrichment, LoginContext, LoginStrategy, Otp, OtpRequest, PersonSelector};
use crate::{
    config::{
        ANONYMOUS_USER, DEFAULT_ANONYMOUS_OTP, JSONRPC_INTERN_PATH, SHARED_SECRET_API_VERSION,
        SHARED_SECRET_METHOD,
    },
    http::RequestOptions,
    rpc::is_truthy,
    Error, Session,
};

/// Public access for schools that allow it.
///
/// The session has no person behind it, so the client refuses operations about "own" data.
#[derive(Debug, Clone)]
pub struct AnonymousAuth {
    otp: u32,
}

impl AnonymousAuth {
    pub fn new() -> Self {
        Self {
            otp: DEFAULT_ANONYMOUS_OTP,
        }
    }

    /// Use a different code than [`DEFAULT_ANONYMOUS_OTP`].
    pub fn with_otp(otp: u32) -> Self {
        Self { otp }
    }
}

impl Default for AnonymousAuth {
    fn default() -> Self {
        Self::new()
    }
}

impl LoginStrategy for AnonymousAuth {
    async fn login<T>(&self, ctx: LoginContext<'_, T>) -> Result<Session, Error>
    where
        T: Connect + Clone + Send + Sync + 'static,
    {
        // Fails unless the school has public access enabled.
        let response = ctx
            .transport
            .request(
                JSONRPC_INTERN_PATH,
                RequestOptions::post_json(json!({
                    "id": ctx.config.application_identity(),
                    "method": SHARED_SECRET_METHOD,
                    "params": [{"userName": ANONYMOUS_USER, "password": ""}],
                    "jsonrpc": "2.0",
                }))
                .query("m", SHARED_SECRET_METHOD)
                .query("school", ctx.config.school())
                .query("v", SHARED_SECRET_API_VERSION),
            )
            .await?
            .into_json();
        if let Some(error) = response
            .as_ref()
            .and_then(|response| response.get("error"))
            .filter(|error| is_truthy(error))
        {
            return Err(login_failed(error));
        }

        otp_login(
            ctx,
            OtpRequest {
                code: Otp::Numeric(self.otp),
                user: ANONYMOUS_USER,
                client_time: Utc::now().timestamp_millis(),
                enrichment: Enrichment::none(),
                person: PersonSelector::default(),
            },
        )
        .await
    }

    fn is_anonymous(&self) -> bool {
        true
    }
}
