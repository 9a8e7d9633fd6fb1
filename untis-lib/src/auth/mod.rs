//! Login strategies.
//!
//! A client is generic over one [`LoginStrategy`]. All strategies produce a [`Session`], the
//! client stores it and uses it for every later call.

mod anonymous;
mod otp;
mod password;
mod secret;

pub use anonymous::AnonymousAuth;
pub use otp::{otp_login, Enrichment, Otp, OtpGenerator, OtpRequest, PersonSelector, StepPolicy, Totp};
pub use password::PasswordAuth;
pub use secret::SecretAuth;

use hyper::client::connect::Connect;

use crate::{http::Transport, ClientConfig, Error, Session};

/// What a strategy gets to work with while logging in.
pub struct LoginContext<'a, T> {
    pub transport: &'a Transport<T>,
    pub config: &'a ClientConfig,
}

impl<T> Clone for LoginContext<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for LoginContext<'_, T> {}

/// A way of obtaining a session from the server.
#[allow(async_fn_in_trait)]
pub trait LoginStrategy {
    async fn login<T>(&self, ctx: LoginContext<'_, T>) -> Result<Session, Error>
    where
        T: Connect + Clone + Send + Sync + 'static;

    /// Anonymous sessions have no person behind them, a client using such a strategy refuses
    /// every operation that needs one.
    fn is_anonymous(&self) -> bool {
        false
    }
}
