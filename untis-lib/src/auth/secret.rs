use chrono::Utc;
use hyper::client::connect::Connect;

use super::{otp_login, Enrichment, LoginContext, LoginStrategy, Otp, OtpGenerator, OtpRequest, PersonSelector, Totp};
use crate::{Error, Session};

/// Login with a user's shared app secret, as shown under "Data access" in the web client.
///
/// A fresh code is derived from the secret at the moment of each login. Clock skew is left to
/// the server.
#[derive(Debug, Clone)]
pub struct SecretAuth<G = Totp> {
    user: String,
    secret: String,
    generator: G,
    person: PersonSelector,
    enrichment: Enrichment,
}

impl SecretAuth<Totp> {
    pub fn new(user: &str, secret: &str) -> Self {
        Self::with_generator(user, secret, Totp)
    }
}

impl<G: OtpGenerator> SecretAuth<G> {
    pub fn with_generator(user: &str, secret: &str, generator: G) -> Self {
        Self {
            user: user.to_owned(),
            secret: secret.to_owned(),
            generator,
            person: PersonSelector::default(),
            enrichment: Enrichment::default(),
        }
    }

    /// Choose which of the account's persons the session acts as.
    pub fn person(mut self, person: PersonSelector) -> Self {
        self.person = person;
        self
    }

    pub fn enrichment(mut self, enrichment: Enrichment) -> Self {
        self.enrichment = enrichment;
        self
    }

    pub fn user(&self) -> &str {
        &self.user
    }
}

impl<G: OtpGenerator> LoginStrategy for SecretAuth<G> {
    async fn login<T>(&self, ctx: LoginContext<'_, T>) -> Result<Session, Error>
    where
        T: Connect + Clone + Send + Sync + 'static,
    {
        if self.user.is_empty() {
            return Err(Error::auth("No username provided for login."));
        }
        let now = Utc::now();
        let code = self.generator.generate(&self.secret, now)?;

        otp_login(
            ctx,
            OtpRequest {
                code: Otp::Text(code),
                user: &self.user,
                client_time: now.timestamp_millis(),
                enrichment: self.enrichment,
                person: self.person,
            },
        )
        .await
    }
}
