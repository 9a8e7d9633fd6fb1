//! Client identity and the fixed values the WebUntis backend expects.

use std::{fmt, str::FromStr};

use base64::{engine::general_purpose::STANDARD, Engine};
use url::Url;

use crate::Error;

/// Identity sent as the JSON-RPC `id` and `client` when none is given.
pub const DEFAULT_IDENTITY: &str = "Awesome";
/// One-time code accepted by servers that allow anonymous (public) access.
pub const DEFAULT_ANONYMOUS_OTP: u32 = 100170;
pub const ANONYMOUS_USER: &str = "#anonymous#";

pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 15_7_2) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/26.0 Safari/605.1.15";

pub const SESSION_COOKIE: &str = "JSESSIONID";
pub const SCHOOL_COOKIE: &str = "schoolname";

pub const JSONRPC_PATH: &str = "/WebUntis/jsonrpc.do";
pub const JSONRPC_INTERN_PATH: &str = "/WebUntis/jsonrpc_intern.do";
pub const APP_CONFIG_PATH: &str = "/WebUntis/api/app/config";
pub const DAY_TIMETABLE_CONFIG_PATH: &str = "/WebUntis/api/daytimetable/config";
pub const TOKEN_PATH: &str = "/WebUntis/api/token/new";
pub const NEWS_WIDGET_PATH: &str = "/WebUntis/api/public/news/newsWidgetData";
pub const HOMEWORKS_PATH: &str = "/WebUntis/api/homeworks/lessons";
pub const EXAMS_PATH: &str = "/WebUntis/api/exams";
pub const WEEKLY_TIMETABLE_PATH: &str = "/WebUntis/api/public/timetable/weekly/data";
pub const ABSENCES_PATH: &str = "/WebUntis/api/classreg/absences/students";
pub const MESSAGES_PATH: &str = "/WebUntis/api/rest/view/v1/messages";
pub const REPORTS_PATH: &str = "/WebUntis/reports.do";

// Versions of the internal endpoint each legacy method is known to answer on.
pub const USER_DATA_METHOD: &str = "getUserData2017";
pub const USER_DATA_API_VERSION: &str = "i2.2";
pub const SHARED_SECRET_METHOD: &str = "getAppSharedSecret";
pub const SHARED_SECRET_API_VERSION: &str = "i3.5";

/// Probe method used to check whether a session is still alive.
pub const PROBE_METHOD: &str = "getLatestImportTime";

/// Kind of timetable element, as numbered by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    Class,
    Teacher,
    Subject,
    Room,
    Student,
}

impl ElementType {
    pub const ALL: [ElementType; 5] = [
        ElementType::Class,
        ElementType::Teacher,
        ElementType::Subject,
        ElementType::Room,
        ElementType::Student,
    ];

    /// Numeric id used on the wire.
    pub fn id(self) -> i64 {
        match self {
            ElementType::Class => 1,
            ElementType::Teacher => 2,
            ElementType::Subject => 3,
            ElementType::Room => 4,
            ElementType::Student => 5,
        }
    }
}

impl TryFrom<i64> for ElementType {
    type Error = Error;

    fn try_from(id: i64) -> Result<Self, Self::Error> {
        ElementType::ALL
            .into_iter()
            .find(|element| element.id() == id)
            .ok_or_else(|| Error::Validation(format!("`{id}` is not a known element type")))
    }
}

impl FromStr for ElementType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "class" | "klasse" => Ok(ElementType::Class),
            "teacher" => Ok(ElementType::Teacher),
            "subject" => Ok(ElementType::Subject),
            "room" => Ok(ElementType::Room),
            "student" => Ok(ElementType::Student),
            other => match other.parse::<i64>() {
                Ok(id) => ElementType::try_from(id),
                Err(_) => Err(Error::Validation(format!(
                    "`{s}` is not a known element type"
                ))),
            },
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ElementType::Class => "class",
            ElementType::Teacher => "teacher",
            ElementType::Subject => "subject",
            ElementType::Room => "room",
            ElementType::Student => "student",
        };
        f.write_str(name)
    }
}

/// Identity of a client, fixed once the client is constructed.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    school: String,
    school_token: String,
    base_url: Url,
    identity: String,
    user_agent: bool,
    validate_session: bool,
}

impl ClientConfig {
    /// `server` is usually the bare host (e.g. `mese.webuntis.com`). A full URL with a scheme is
    /// kept as is, which is how tests point the client at a local server. An empty `server`
    /// falls back to `{school}.webuntis.com`.
    pub fn new(school: &str, server: &str) -> Result<Self, Error> {
        Ok(Self {
            school: school.to_owned(),
            school_token: format!("_{}", STANDARD.encode(school)),
            base_url: canonical_base_url(school, server)?,
            identity: DEFAULT_IDENTITY.to_owned(),
            user_agent: true,
            validate_session: true,
        })
    }

    pub fn identity(mut self, identity: &str) -> Self {
        self.identity = identity.to_owned();
        self
    }

    /// Whether the descriptive browser `User-Agent` is sent with every request.
    pub fn user_agent(mut self, enabled: bool) -> Self {
        self.user_agent = enabled;
        self
    }

    /// Whether the typed accessors probe the session before each call. On by default.
    pub fn validate_session(mut self, enabled: bool) -> Self {
        self.validate_session = enabled;
        self
    }

    pub fn school(&self) -> &str {
        &self.school
    }

    /// The school name as carried by the `schoolname` cookie.
    pub fn school_token(&self) -> &str {
        &self.school_token
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn application_identity(&self) -> &str {
        &self.identity
    }

    pub fn sends_user_agent(&self) -> bool {
        self.user_agent
    }

    pub fn validates_session(&self) -> bool {
        self.validate_session
    }
}

fn canonical_base_url(school: &str, server: &str) -> Result<Url, Error> {
    let server = server.trim();
    let raw = if server.is_empty() {
        format!("https://{school}.webuntis.com/")
    } else if server.contains("://") {
        server.to_owned()
    } else {
        format!("https://{server}")
    };
    let mut url = Url::parse(&raw)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_host_gets_https_scheme() {
        let config = ClientConfig::new("school", "school.webuntis.com").unwrap();
        assert_eq!(config.base_url().as_str(), "https://school.webuntis.com/");
    }

    #[test]
    fn empty_server_falls_back_to_school_host() {
        let config = ClientConfig::new("mese", "").unwrap();
        assert_eq!(config.base_url().as_str(), "https://mese.webuntis.com/");
    }

    #[test]
    fn explicit_scheme_is_kept() {
        let config = ClientConfig::new("school", "http://127.0.0.1:8080").unwrap();
        assert_eq!(config.base_url().as_str(), "http://127.0.0.1:8080/");
    }

    #[test]
    fn school_token_is_prefixed_base64() {
        let config = ClientConfig::new("school", "").unwrap();
        assert_eq!(config.school_token(), "_c2Nob29s");
    }

    #[test]
    fn defaults() {
        let config = ClientConfig::new("school", "").unwrap();
        assert_eq!(config.application_identity(), DEFAULT_IDENTITY);
        assert!(config.sends_user_agent());
        assert!(config.validates_session());

        let config = config
            .identity("MyApp")
            .user_agent(false)
            .validate_session(false);
        assert_eq!(config.application_identity(), "MyApp");
        assert!(!config.sends_user_agent());
        assert!(!config.validates_session());
    }

    #[test]
    fn element_type_ids() {
        for element in ElementType::ALL {
            assert_eq!(ElementType::try_from(element.id()).unwrap(), element);
            assert_eq!(element.to_string().parse::<ElementType>().unwrap(), element);
        }
        assert_eq!("ROOM".parse::<ElementType>().unwrap(), ElementType::Room);
        assert_eq!("5".parse::<ElementType>().unwrap(), ElementType::Student);
        assert!(ElementType::try_from(6).is_err());
        assert!("guardian".parse::<ElementType>().is_err());
    }
}
