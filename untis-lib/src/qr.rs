//! Bootstrap from the QR code shown under "Data access" in the web client.

use std::str::FromStr;

use url::Url;

use crate::{auth::SecretAuth, ClientConfig, Error};

const QR_SCHEME: &str = "untis";

/// Contents of an `untis://setschool?url=...&school=...&user=...&key=...` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrCode {
    pub server: String,
    pub school: String,
    pub user: String,
    pub key: String,
}

impl QrCode {
    pub fn parse(uri: &str) -> Result<Self, Error> {
        let uri = Url::parse(uri.trim())
            .map_err(|err| Error::Validation(format!("QR code is not a valid uri: {err}")))?;
        if uri.scheme() != QR_SCHEME {
            return Err(Error::Validation(format!(
                "QR code uses scheme `{}`, expected `{QR_SCHEME}`",
                uri.scheme()
            )));
        }

        let param = |name: &str| {
            uri.query_pairs()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.into_owned())
                .filter(|value| !value.is_empty())
                .ok_or_else(|| Error::Validation(format!("QR code is missing `{name}`")))
        };
        Ok(Self {
            server: param("url")?,
            school: param("school")?,
            user: param("user")?,
            key: param("key")?,
        })
    }

    pub fn config(&self) -> Result<ClientConfig, Error> {
        ClientConfig::new(&self.school, &self.server)
    }

    pub fn strategy(&self) -> SecretAuth {
        SecretAuth::new(&self.user, &self.key)
    }
}

impl FromStr for QrCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QrCode::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URI: &str =
        "untis://setschool?url=mese.webuntis.com&school=demo%20school&user=max&key=JBSWY3DPEHPK3PXP";

    #[test]
    fn parses_all_parameters() {
        let qr: QrCode = URI.parse().unwrap();
        assert_eq!(
            qr,
            QrCode {
                server: "mese.webuntis.com".to_owned(),
                school: "demo school".to_owned(),
                user: "max".to_owned(),
                key: "JBSWY3DPEHPK3PXP".to_owned(),
            }
        );
        assert_eq!(qr.strategy().user(), "max");

        let config = qr.config().unwrap();
        assert_eq!(config.school(), "demo school");
        assert_eq!(config.base_url().as_str(), "https://mese.webuntis.com/");
    }

    #[test]
    fn rejects_other_schemes() {
        assert!(matches!(
            QrCode::parse("https://setschool?url=a&school=b&user=c&key=d"),
            Err(Error::Validation(_))
        ));
        assert!(QrCode::parse("not a uri").is_err());
    }

    #[test]
    fn rejects_missing_parameters() {
        let err = QrCode::parse("untis://setschool?url=a&school=b&user=c").unwrap_err();
        assert_eq!(err.to_string(), "QR code is missing `key`");
        assert!(QrCode::parse("untis://setschool?url=a&school=&user=c&key=d").is_err());
    }
}
