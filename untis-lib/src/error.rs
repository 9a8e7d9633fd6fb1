use thiserror::Error;

/// Represents errors that can occur talking to a WebUntis server.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The server answered with a status outside `[200, 303)`.
    #[error("HTTP {status}: {status_text}")]
    Http { status: u16, status_text: String },
    /// Failed to send the HTTP request or read its response.
    #[error("failed to send HTTP request")]
    Transport(#[from] hyper::Error),
    /// An argument to build the HTTP request was invalid.
    #[error("an argument while building an HTTP request was invalid")]
    MalformedRequest(#[from] hyper::http::Error),
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// A body announced as JSON could not be decoded.
    #[error("could not decode server response")]
    Decode(#[from] serde_json::Error),

    /// The JSON-RPC envelope carried no `result`.
    #[error("Server didn't return any result.")]
    NoResult,
    /// The server reported an application level error code.
    #[error("Server returned error code: {code}{}", detail(.message))]
    ServerCode {
        code: String,
        message: Option<String>,
    },
    /// The response decoded fine but did not have the expected shape.
    #[error("Server returned invalid data: {0}")]
    InvalidData(String),

    #[error("Current Session is not valid")]
    InvalidSession,
    #[error("Session not initialized")]
    NotLoggedIn,
    /// The session lacks the person (or class) ids the operation needs.
    #[error("Session does not contain {0}")]
    MissingPerson(&'static str),

    /// A login handshake failed, the message names the failing step.
    #[error("{0}")]
    Authentication(String),
    #[error("This method is not supported with anonymous login")]
    AnonymousNotSupported,

    #[error("{0}")]
    Validation(String),
}

fn detail(message: &Option<String>) -> String {
    match message {
        Some(message) => format!(" ({message})"),
        None => String::new(),
    }
}

/// Coarse grouping of [`Error`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Protocol,
    Session,
    Authentication,
    AnonymousNotSupported,
    Validation,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Http { .. }
            | Error::Transport(_)
            | Error::MalformedRequest(_)
            | Error::InvalidUrl(_) => ErrorKind::Transport,
            Error::Decode(_)
            | Error::NoResult
            | Error::ServerCode { .. }
            | Error::InvalidData(_) => ErrorKind::Protocol,
            Error::InvalidSession | Error::NotLoggedIn | Error::MissingPerson(_) => {
                ErrorKind::Session
            }
            Error::Authentication(_) => ErrorKind::Authentication,
            Error::AnonymousNotSupported => ErrorKind::AnonymousNotSupported,
            Error::Validation(_) => ErrorKind::Validation,
        }
    }

    pub(crate) fn auth(message: impl Into<String>) -> Self {
        Error::Authentication(message.into())
    }

    pub(crate) fn invalid_data(message: impl Into<String>) -> Self {
        Error::InvalidData(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_distinguish_causes() {
        assert_eq!(Error::InvalidSession.to_string(), "Current Session is not valid");
        assert_eq!(
            Error::auth("Failed to login. No session id.").to_string(),
            "Failed to login. No session id."
        );
        assert_eq!(
            Error::ServerCode {
                code: "-8520".to_owned(),
                message: None
            }
            .to_string(),
            "Server returned error code: -8520"
        );
        assert_eq!(
            Error::ServerCode {
                code: "-8520".to_owned(),
                message: Some("not authenticated".to_owned())
            }
            .to_string(),
            "Server returned error code: -8520 (not authenticated)"
        );
    }

    #[test]
    fn kinds() {
        let http = Error::Http {
            status: 500,
            status_text: "Internal Server Error".to_owned(),
        };
        assert_eq!(http.kind(), ErrorKind::Transport);
        assert_eq!(Error::NoResult.kind(), ErrorKind::Protocol);
        assert_eq!(Error::NotLoggedIn.kind(), ErrorKind::Session);
        assert_eq!(Error::auth("x").kind(), ErrorKind::Authentication);
        assert_eq!(
            Error::AnonymousNotSupported.kind(),
            ErrorKind::AnonymousNotSupported
        );
        assert_eq!(Error::Validation("x".into()).kind(), ErrorKind::Validation);
    }
}
