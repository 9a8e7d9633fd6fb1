//! The one-time password handshake on the internal endpoint, shared by the secret and
//! anonymous strategies.

use chrono::{DateTime, Utc};
use hyper::{body, client::connect::Connect, header};
use serde_json::{json, Value};
use totp_rs::{Algorithm, Secret, TOTP};

use super::LoginContext;
use crate::{
    config::{
        APP_CONFIG_PATH, DAY_TIMETABLE_CONFIG_PATH, JSONRPC_INTERN_PATH, SESSION_COOKIE,
        USER_DATA_API_VERSION, USER_DATA_METHOD,
    },
    cookies::{cookie_from_set_cookie, session_cookie_header},
    http::{check_status, RequestOptions},
    rpc::is_truthy,
    session::Person,
    Error, Session,
};

/// Produces one-time codes from a shared secret.
pub trait OtpGenerator {
    fn generate(&self, secret: &str, at: DateTime<Utc>) -> Result<String, Error>;
}

/// RFC 6238 codes: SHA-1, 6 digits, 30 second steps, base32 secret.
#[derive(Debug, Clone, Copy, Default)]
pub struct Totp;

impl OtpGenerator for Totp {
    fn generate(&self, secret: &str, at: DateTime<Utc>) -> Result<String, Error> {
        let bytes = Secret::Encoded(secret.trim().to_ascii_uppercase())
            .to_bytes()
            .ok()
            .filter(|bytes| !bytes.is_empty())
            .ok_or_else(|| Error::auth("OTP generator unavailable: secret is not valid base32"))?;
        let timestamp = u64::try_from(at.timestamp())
            .map_err(|_| Error::auth("OTP generator unavailable: time before the unix epoch"))?;

        // Untis secrets are shorter than the 128 bits `TOTP::new` insists on.
        Ok(TOTP::new_unchecked(Algorithm::SHA1, 6, 1, 30, bytes).generate(timestamp))
    }
}

/// A one-time code, the anonymous login sends a number where TOTP sends a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Otp {
    Numeric(u32),
    Text(String),
}

impl From<Otp> for Value {
    fn from(otp: Otp) -> Self {
        match otp {
            Otp::Numeric(code) => Value::from(code),
            Otp::Text(code) => Value::from(code),
        }
    }
}

/// How a failing enrichment step affects the login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepPolicy {
    /// The login fails with the step.
    Required,
    /// The failure is logged and the login continues without the step's data.
    BestEffort,
    /// The step is not attempted.
    Skip,
}

impl StepPolicy {
    fn recover(self, step: &str, err: Error, fallback: Session) -> Result<Session, Error> {
        match self {
            StepPolicy::Required => Err(err),
            StepPolicy::BestEffort | StepPolicy::Skip => {
                tracing::warn!(step, error = %err, "failed to fetch {step} during login (non-fatal)");
                Ok(fallback)
            }
        }
    }
}

/// Policies of the two lookups that follow the handshake.
///
/// Some deployments do not expose the day timetable config, or the role lacks permission for
/// it, so by default only the identity lookup is required.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Enrichment {
    /// Person id and type from the app config.
    pub identity: StepPolicy,
    /// Class id from the day timetable config.
    pub class: StepPolicy,
}

impl Enrichment {
    /// Keep only the session id.
    pub fn none() -> Self {
        Self {
            identity: StepPolicy::Skip,
            class: StepPolicy::Skip,
        }
    }
}

impl Default for Enrichment {
    fn default() -> Self {
        Self {
            identity: StepPolicy::Required,
            class: StepPolicy::BestEffort,
        }
    }
}

/// Which entry of the app config's `persons` becomes the session's person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PersonSelector {
    /// The person the login belongs to (`loginServiceConfig.user.personId`).
    #[default]
    LoginUser,
    /// A specific entry, e.g. one of a guardian's wards.
    Id(i64),
}

/// Input of [`otp_login`].
#[derive(Debug, Clone)]
pub struct OtpRequest<'a> {
    pub code: Otp,
    pub user: &'a str,
    /// Milliseconds since the unix epoch.
    pub client_time: i64,
    pub enrichment: Enrichment,
    pub person: PersonSelector,
}

/// Log in on the internal endpoint with a one-time code.
///
/// The session id comes back as a `JSESSIONID` cookie, not in the body. The identity and class
/// lookups then run according to `request.enrichment`.
pub async fn otp_login<T>(ctx: LoginContext<'_, T>, request: OtpRequest<'_>) -> Result<Session, Error>
where
    T: Connect + Clone + Send + Sync + 'static,
{
    tracing::debug!(user = %request.user, "logging in with one-time code");
    let response = ctx
        .transport
        .request_raw(
            JSONRPC_INTERN_PATH,
            RequestOptions::post_json(json!({
                "id": ctx.config.application_identity(),
                "method": USER_DATA_METHOD,
                "params": [{
                    "auth": {
                        "clientTime": request.client_time,
                        "user": request.user,
                        "otp": Value::from(request.code),
                    }
                }],
                "jsonrpc": "2.0",
            }))
            .query("m", USER_DATA_METHOD)
            .query("school", ctx.config.school())
            .query("v", USER_DATA_API_VERSION),
        )
        .await?;
    check_status(response.status())?;

    let set_cookies: Vec<String> = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .map(ToOwned::to_owned)
        .collect();
    let bytes = body::to_bytes(response.into_body()).await?;
    let data: Value = serde_json::from_slice(&bytes)?;
    if let Some(error) = data.get("error").filter(|error| is_truthy(error)) {
        return Err(login_failed(error));
    }

    if set_cookies.is_empty() {
        return Err(Error::auth(
            "Failed to login. Server didn't return a set-cookie",
        ));
    }
    let session_id = cookie_from_set_cookie(set_cookies.iter().map(String::as_str), SESSION_COOKIE)
        .ok_or_else(|| Error::auth("Failed to login. Server didn't return a session id."))?;

    let mut session = Session::new(session_id);
    let cookie = session_cookie_header(session.session_id(), ctx.config.school_token())?;

    if request.enrichment.identity != StepPolicy::Skip {
        session = match resolve_identity(ctx, &cookie, session.clone(), request.person).await {
            Ok(enriched) => enriched,
            Err(err) => request.enrichment.identity.recover("identity", err, session)?,
        };
    }
    if request.enrichment.class != StepPolicy::Skip {
        session = match resolve_klasse_id(ctx, &cookie, session.clone()).await {
            Ok(enriched) => enriched,
            Err(err) => request.enrichment.class.recover("klasseId", err, session)?,
        };
    }

    Ok(session)
}

pub(crate) fn login_failed(error: &Value) -> Error {
    let message = error.get("message").and_then(Value::as_str).unwrap_or_default();
    Error::auth(format!("Failed to login. {message}").trim_end().to_owned())
}

async fn resolve_identity<T>(
    ctx: LoginContext<'_, T>,
    cookie: &str,
    session: Session,
    selector: PersonSelector,
) -> Result<Session, Error>
where
    T: Connect + Clone + Send + Sync + 'static,
{
    let config = ctx
        .transport
        .request(APP_CONFIG_PATH, RequestOptions::get().cookie(cookie))
        .await?
        .into_json();
    person_from_app_config(config, session, selector)
}

fn person_from_app_config(
    config: Option<Value>,
    session: Session,
    selector: PersonSelector,
) -> Result<Session, Error> {
    let data = config
        .as_ref()
        .and_then(|config| config.get("data"))
        .filter(|data| data.is_object())
        .ok_or_else(|| Error::auth("Failed to fetch app config while login. data is not an object"))?;

    let user = data.pointer("/loginServiceConfig/user").unwrap_or(&Value::Null);
    let person_id = user
        .get("personId")
        .and_then(Value::as_i64)
        .ok_or_else(|| {
            Error::auth(format!(
                "Invalid personId. personId: {}",
                user.get("personId").unwrap_or(&Value::Null)
            ))
        })?;
    let persons = user
        .get("persons")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::auth("Invalid person array."))?;

    let wanted = match selector {
        PersonSelector::LoginUser => person_id,
        PersonSelector::Id(id) => id,
    };
    let person = persons
        .iter()
        .find(|person| person.get("id").and_then(Value::as_i64) == Some(wanted))
        .ok_or_else(|| Error::auth("Can not find person in person array."))?;
    let person_type = person.get("type").and_then(Value::as_i64).ok_or_else(|| {
        Error::auth(format!(
            "Invalid person type. type: {}",
            person.get("type").unwrap_or(&Value::Null)
        ))
    })?;

    let known: Vec<Person> = persons
        .iter()
        .filter_map(|person| serde_json::from_value(person.clone()).ok())
        .collect();
    Ok(session.with_person(wanted, person_type).with_persons(known))
}

async fn resolve_klasse_id<T>(
    ctx: LoginContext<'_, T>,
    cookie: &str,
    session: Session,
) -> Result<Session, Error>
where
    T: Connect + Clone + Send + Sync + 'static,
{
    let config = ctx
        .transport
        .request(DAY_TIMETABLE_CONFIG_PATH, RequestOptions::get().cookie(cookie))
        .await?
        .into_json();
    let klasse_id = config
        .as_ref()
        .and_then(|config| config.pointer("/data/klasseId"))
        .and_then(Value::as_i64)
        .ok_or_else(|| Error::invalid_data("day timetable config has no klasseId"))?;
    Ok(session.with_klasse_id(klasse_id))
}
