use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use untis_lib::{config::DEFAULT_IDENTITY, ElementType};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Options {
    /// School name as used by WebUntis (e.g. "demo school")
    #[arg(long, env = "UNTIS_SCHOOL")]
    pub school: Option<String>,
    /// Server of the school (e.g. mese.webuntis.com), defaults to `{school}.webuntis.com`
    #[arg(long, env = "UNTIS_SERVER", default_value = "")]
    pub server: String,
    /// Identity sent with every request
    #[arg(long, default_value = DEFAULT_IDENTITY)]
    pub identity: String,
    /// Don't send a browser user agent
    #[arg(long)]
    pub no_user_agent: bool,
    #[command(flatten)]
    pub login: Login,
    /// Format to output data
    #[arg(long, value_enum, default_value_t = DataFormat::Json)]
    pub format: DataFormat,
    /// Pretty print the output
    #[arg(long)]
    pub pretty: bool,
    #[command(subcommand)]
    pub command: Command,
}

/// Login method, tried in the order anonymous, QR code, secret, password.
#[derive(Debug, Args)]
pub struct Login {
    /// Log in without a user, if the school allows public access
    #[arg(long)]
    pub anonymous: bool,
    /// `untis://setschool?...` URI from the QR code under "Data access"
    #[arg(long, env = "UNTIS_QR", hide_env_values = true)]
    pub qr: Option<String>,
    #[arg(long, env = "UNTIS_USER")]
    pub user: Option<String>,
    /// App secret of the user, shown under "Data access"
    #[arg(long, env = "UNTIS_SECRET", hide_env_values = true)]
    pub secret: Option<String>,
    #[arg(long, env = "UNTIS_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and print the session
    Session,
    /// Print the timetable of a day, your own unless an element is given
    Timetable {
        /// Day to query (e.g. 2024-03-04), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, requires = "element_type")]
        element_id: Option<i64>,
        /// class, teacher, subject, room or student
        #[arg(long, requires = "element_id")]
        element_type: Option<ElementType>,
    },
    /// Print all school years, newest first
    Schoolyears,
    /// Print the exams between two days
    Exams {
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
    },
    /// Print the homework between two days
    Homework {
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
    },
}

#[derive(Debug, Clone, ValueEnum)]
pub enum DataFormat {
    Json,
}
