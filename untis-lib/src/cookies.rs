//! Cookie formatting and session cookie extraction.

use chrono::{DateTime, Utc};
use cookie::{time::OffsetDateTime, Cookie, SameSite};

use crate::{
    config::{SCHOOL_COOKIE, SESSION_COOKIE},
    Error,
};

/// Optional attributes of a serialized cookie.
#[derive(Debug, Clone, Default)]
pub struct CookieOptions<'a> {
    /// Seconds, fractions are truncated.
    pub max_age: Option<f64>,
    pub domain: Option<&'a str>,
    pub path: Option<&'a str>,
    pub expires: Option<DateTime<Utc>>,
    pub http_only: bool,
    pub secure: bool,
    /// One of `strict`, `lax` or `none`, case-insensitive.
    pub same_site: Option<&'a str>,
}

/// Serialize a name/value pair into a `Set-Cookie` style string.
///
/// The value is percent-encoded first, then both the name and the encoded value must consist of
/// cookie octets: visible ASCII except `;` and `,`, or the Latin-1 supplement.
pub fn serialize_cookie(
    name: &str,
    value: &str,
    options: &CookieOptions<'_>,
) -> Result<String, Error> {
    if name.is_empty() || name.contains('=') || !is_cookie_octets(name) {
        return Err(Error::Validation(format!("argument name `{name}` is invalid")));
    }
    let encoded = urlencoding::encode(value).into_owned();
    if !encoded.is_empty() && !is_cookie_octets(&encoded) {
        return Err(Error::Validation(format!("argument val `{value}` is invalid")));
    }

    let mut builder = Cookie::build((name.to_owned(), encoded));
    if let Some(max_age) = options.max_age {
        if !max_age.is_finite() {
            return Err(Error::Validation("option maxAge is invalid".to_owned()));
        }
        builder = builder.max_age(cookie::time::Duration::seconds(max_age.trunc() as i64));
    }
    if let Some(domain) = options.domain {
        if !is_cookie_octets(domain) {
            return Err(Error::Validation(format!("option domain `{domain}` is invalid")));
        }
        builder = builder.domain(domain.to_owned());
    }
    if let Some(path) = options.path {
        if !is_cookie_octets(path) {
            return Err(Error::Validation(format!("option path `{path}` is invalid")));
        }
        builder = builder.path(path.to_owned());
    }
    if let Some(expires) = options.expires {
        let expires = OffsetDateTime::from_unix_timestamp(expires.timestamp())
            .map_err(|_| Error::Validation("option expires is invalid".to_owned()))?;
        builder = builder.expires(expires);
    }
    if options.http_only {
        builder = builder.http_only(true);
    }
    // Always explicit, cookie adds `Secure` to `SameSite=None` otherwise.
    builder = builder.secure(options.secure);
    if let Some(same_site) = options.same_site {
        builder = builder.same_site(parse_same_site(same_site)?);
    }

    Ok(builder.build().to_string())
}

fn parse_same_site(same_site: &str) -> Result<SameSite, Error> {
    match same_site.to_ascii_lowercase().as_str() {
        "strict" => Ok(SameSite::Strict),
        "lax" => Ok(SameSite::Lax),
        "none" => Ok(SameSite::None),
        _ => Err(Error::Validation(format!(
            "option sameSite `{same_site}` is invalid"
        ))),
    }
}

fn is_cookie_octets(s: &str) -> bool {
    s.chars().all(|c| match c {
        ';' | ',' => false,
        '\u{21}'..='\u{7e}' | '\u{80}'..='\u{ff}' => true,
        _ => false,
    })
}

/// The `Cookie` header sent with every authenticated request.
pub fn session_cookie_header(session_id: &str, school_token: &str) -> Result<String, Error> {
    let options = CookieOptions::default();
    Ok([
        serialize_cookie(SESSION_COOKIE, session_id, &options)?,
        serialize_cookie(SCHOOL_COOKIE, school_token, &options)?,
    ]
    .join("; "))
}

/// Find the value of the cookie `name` across raw `Set-Cookie` header values.
///
/// Every `;` separated segment is considered, so the cookie may appear anywhere in a header.
pub fn cookie_from_set_cookie<'a>(
    headers: impl IntoIterator<Item = &'a str>,
    name: &str,
) -> Option<String> {
    headers.into_iter().find_map(|raw| {
        Cookie::split_parse(raw)
            // Attributes such as `HttpOnly` fail to parse, skip them.
            .filter_map(Result::ok)
            .find(|cookie| cookie.name() == name && !cookie.value().is_empty())
            .map(|cookie| cookie.value().to_owned())
    })
}
