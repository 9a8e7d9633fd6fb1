use clap::Parser;
use hyper::client::connect::Connect;
use serde_json::Value;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use untis_lib::Untis;

use crate::{
    login::Strategy,
    options::{Command, DataFormat, Options},
};

mod login;
mod options;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Error> {
    let args = Options::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("untis=info,untis_lib=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let (config, strategy) = login::resolve(&args)?;
    let mut untis = Untis::https(config, strategy);
    untis.login().await?;

    let output = run(&untis, args.command).await;
    if let Err(err) = untis.logout().await {
        warn!(%err, "logout failed");
    }
    let output = output?;

    let result = match args.format {
        DataFormat::Json => match args.pretty {
            true => serde_json::to_string_pretty(&output)?,
            false => serde_json::to_string(&output)?,
        },
    };
    println!("{result}");

    Ok(())
}

async fn run<T>(untis: &Untis<Strategy, T>, command: Command) -> Result<Value, Error>
where
    T: Connect + Clone + Send + Sync + 'static,
{
    let value = match command {
        Command::Session => serde_json::to_value(untis.session()?)?,
        Command::Timetable {
            date,
            element_id,
            element_type,
        } => {
            let lessons = match (element_id.zip(element_type), date) {
                (Some((id, element)), Some(date)) => untis.timetable_for(date, id, element).await?,
                (Some((id, element)), None) => untis.timetable_for_today(id, element).await?,
                (None, Some(date)) => untis.own_timetable_for(date).await?,
                (None, None) => untis.own_timetable_for_today().await?,
            };
            serde_json::to_value(lessons)?
        }
        Command::Schoolyears => serde_json::to_value(untis.schoolyears().await?)?,
        Command::Exams { start, end } => {
            serde_json::to_value(untis.exams_for_range(start, end, None, false).await?)?
        }
        Command::Homework { start, end } => {
            serde_json::to_value(untis.homeworks_for(start, end).await?)?
        }
    };
    Ok(value)
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Untis(#[from] untis_lib::Error),
    #[error(transparent)]
    JsonSerializeFailed(#[from] serde_json::Error),
    #[error("school not specified, pass `--school` or `--qr`")]
    SchoolNotSpecified,
    #[error("no login specified, pass `--anonymous`, `--qr`, or `--user` with a secret or password")]
    LoginNotSpecified,
}
