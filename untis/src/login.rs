use hyper::client::connect::Connect;
use untis_lib::{
    auth::LoginContext, AnonymousAuth, ClientConfig, LoginStrategy, PasswordAuth, QrCode,
    SecretAuth, Session,
};

use crate::{options::Options, Error};

/// The login method picked on the command line.
#[derive(Debug)]
pub enum Strategy {
    Anonymous(AnonymousAuth),
    Secret(SecretAuth),
    Password(PasswordAuth),
}

impl LoginStrategy for Strategy {
    async fn login<T>(&self, ctx: LoginContext<'_, T>) -> Result<Session, untis_lib::Error>
    where
        T: Connect + Clone + Send + Sync + 'static,
    {
        match self {
            Strategy::Anonymous(strategy) => strategy.login(ctx).await,
            Strategy::Secret(strategy) => strategy.login(ctx).await,
            Strategy::Password(strategy) => strategy.login(ctx).await,
        }
    }

    fn is_anonymous(&self) -> bool {
        matches!(self, Strategy::Anonymous(_))
    }
}

pub fn resolve(options: &Options) -> Result<(ClientConfig, Strategy), Error> {
    let login = &options.login;
    let (config, strategy) = match (login.anonymous, &login.qr) {
        (true, _) => (
            school_config(options)?,
            Strategy::Anonymous(AnonymousAuth::new()),
        ),
        (false, Some(qr)) => {
            let qr = QrCode::parse(qr)?;
            (qr.config()?, Strategy::Secret(qr.strategy()))
        }
        (false, None) => {
            let user = login.user.as_deref().ok_or(Error::LoginNotSpecified)?;
            let strategy = match (&login.secret, &login.password) {
                (Some(secret), _) => Strategy::Secret(SecretAuth::new(user, secret)),
                (None, Some(password)) => Strategy::Password(PasswordAuth::new(user, password)),
                (None, None) => return Err(Error::LoginNotSpecified),
            };
            (school_config(options)?, strategy)
        }
    };

    Ok((
        config
            .identity(&options.identity)
            .user_agent(!options.no_user_agent),
        strategy,
    ))
}

fn school_config(options: &Options) -> Result<ClientConfig, Error> {
    let school = options
        .school
        .as_deref()
        .ok_or(Error::SchoolNotSpecified)?;
    Ok(ClientConfig::new(school, &options.server)?)
}
