//! A client for the WebUntis timetable service.
//!
//! A [`Untis`] client is bound to one school and one [`LoginStrategy`]:
//!
//! ```no_run
//! # async fn run() -> Result<(), untis_lib::Error> {
//! use untis_lib::{ClientConfig, PasswordAuth, Untis};
//!
//! let config = ClientConfig::new("demo school", "mese.webuntis.com")?;
//! let mut untis = Untis::https(config, PasswordAuth::new("user", "password"));
//! untis.login().await?;
//! for lesson in untis.own_timetable_for_today().await? {
//!     println!("{} {}", lesson.date, lesson.start_time);
//! }
//! untis.logout().await?;
//! # Ok(())
//! # }
//! ```
//!
//! Besides passwords, a client can log in with the app secret of a user ([`SecretAuth`], also
//! reachable through [`QrCode`]) or anonymously ([`AnonymousAuth`]) on schools that publish their
//! timetables.

pub mod auth;
mod catalog;
mod client;
pub mod config;
pub mod cookies;
pub mod date;
mod error;
pub mod http;
pub mod model;
mod qr;
mod rest;
mod rpc;
mod session;
mod timetable;

pub use auth::{
    AnonymousAuth, Enrichment, LoginStrategy, PasswordAuth, PersonSelector, SecretAuth,
    StepPolicy, Totp,
};
pub use client::Untis;
pub use config::{ClientConfig, ElementType};
pub use error::{Error, ErrorKind};
pub use qr::QrCode;
pub use rest::AbsenceReport;
pub use session::{Person, Session};
pub use timetable::{WeekElement, WeekPeriod};
