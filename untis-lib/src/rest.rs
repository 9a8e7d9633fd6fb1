//! Endpoints of the web client's REST API. They share the JSON-RPC session cookie, the inbox
//! additionally wants a bearer token.

use chrono::NaiveDate;
use hyper::{client::connect::Connect, header};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    auth::LoginStrategy,
    config::{
        ABSENCES_PATH, EXAMS_PATH, HOMEWORKS_PATH, MESSAGES_PATH, NEWS_WIDGET_PATH, REPORTS_PATH,
        TOKEN_PATH,
    },
    date::{to_untis_date, validate_range},
    http::{Payload, RequestOptions},
    model::{Absences, Exam, Homeworks, Inbox, NewsWidget},
    rpc::{is_truthy, scalar_to_string},
    Error, Untis,
};

/// Options of the absence report, see [`Untis::pdf_of_absent_lessons`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbsenceReport {
    /// `-1` for all.
    pub excuse_status_id: i64,
    pub lateness: bool,
    pub absences: bool,
    pub excuse_group: i64,
}

impl Default for AbsenceReport {
    fn default() -> Self {
        Self {
            excuse_status_id: -1,
            lateness: true,
            absences: true,
            excuse_group: 2,
        }
    }
}

impl<S, T> Untis<S, T>
where
    S: LoginStrategy,
    T: Connect + Clone + Send + Sync + 'static,
{
    pub async fn news_widget(&self, date: NaiveDate) -> Result<NewsWidget, Error> {
        self.ensure_valid(self.config().validates_session()).await?;
        let payload = self
            .rest(NEWS_WIDGET_PATH, RequestOptions::get().query("date", to_untis_date(date)))
            .await?;
        decode(data_object(payload)?)
    }

    pub async fn homeworks_for(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Homeworks, Error> {
        validate_range(start, end, "homeworks_for")?;
        self.ensure_valid(self.config().validates_session()).await?;
        let payload = self
            .rest(HOMEWORKS_PATH, range_query(start, end))
            .await?;

        let data = data_object(payload)?;
        if !data.get("homeworks").map_or(false, is_truthy) {
            return Err(Error::invalid_data(
                "Data object doesn't contain 'homeworks' field",
            ));
        }
        decode(data)
    }

    /// Exams between `start` and `end`, of one class or (with `None`) of all visible ones.
    pub async fn exams_for_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        klasse_id: Option<i64>,
        with_grades: bool,
    ) -> Result<Vec<Exam>, Error> {
        validate_range(start, end, "exams_for_range")?;
        self.ensure_valid(self.config().validates_session()).await?;
        let payload = self
            .rest(
                EXAMS_PATH,
                range_query(start, end)
                    .query("klasseId", klasse_id.unwrap_or(-1))
                    .query("withGrades", with_grades),
            )
            .await?;

        let mut data = data_object(payload)?;
        match data.get_mut("exams").map(Value::take) {
            Some(exams) if is_truthy(&exams) => decode(exams),
            _ => Err(Error::invalid_data("Data object doesn't contain 'exams' field")),
        }
    }

    /// Lessons the logged in student missed, excused or not.
    pub async fn absent_lessons(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        excuse_status_id: Option<i64>,
    ) -> Result<Absences, Error> {
        self.check_anonymous()?;
        validate_range(start, end, "absent_lessons")?;
        self.ensure_valid(self.config().validates_session()).await?;
        let (student_id, _) = self.current_person()?;

        let payload = self
            .rest(
                ABSENCES_PATH,
                range_query(start, end)
                    .query("studentId", student_id)
                    .query("excuseStatusId", excuse_status_id.unwrap_or(-1)),
            )
            .await?;
        match payload.into_json().and_then(|mut body| body.get_mut("data").map(Value::take)) {
            Some(data) if !data.is_null() => decode(data),
            _ => Err(Error::invalid_data("Server returned no data!")),
        }
    }

    /// Have the server render the absence report and return the URL of the PDF.
    pub async fn pdf_of_absent_lessons(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        report: AbsenceReport,
    ) -> Result<String, Error> {
        self.check_anonymous()?;
        validate_range(start, end, "pdf_of_absent_lessons")?;
        self.ensure_valid(self.config().validates_session()).await?;
        let (student_id, _) = self.current_person()?;

        let payload = self
            .rest(
                REPORTS_PATH,
                RequestOptions::get()
                    .query("name", "Excuse")
                    .query("format", "pdf")
                    .query("rpt_sd", to_untis_date(start))
                    .query("rpt_ed", to_untis_date(end))
                    .query("excuseStatusId", report.excuse_status_id)
                    .query("studentId", student_id)
                    .query("withLateness", report.lateness)
                    .query("withAbsences", report.absences)
                    // sic
                    .query("execuseGroup", report.excuse_group),
            )
            .await?;
        report_url(self.transport().base_url().as_str(), &data_object(payload)?)
    }

    /// A bearer token for the REST endpoints that want one, also kept in the session.
    pub async fn jwt(&mut self) -> Result<String, Error> {
        self.ensure_valid(self.config().validates_session()).await?;
        self.fetch_jwt().await
    }

    pub async fn inbox(&mut self) -> Result<Inbox, Error> {
        self.check_anonymous()?;
        self.ensure_valid(self.config().validates_session()).await?;
        let cached = self.session()?.jwt_token().map(ToOwned::to_owned);
        let token = match cached {
            Some(token) => token,
            None => self.fetch_jwt().await?,
        };

        let payload = self
            .rest(
                MESSAGES_PATH,
                RequestOptions::get().header(header::AUTHORIZATION, format!("Bearer {token}")),
            )
            .await?;
        match payload.into_json() {
            Some(inbox) if inbox.is_object() => decode(inbox),
            _ => Err(Error::invalid_data("expected object")),
        }
    }

    async fn fetch_jwt(&mut self) -> Result<String, Error> {
        let token = self
            .rest(TOKEN_PATH, RequestOptions::get().expect_text())
            .await?
            .into_text()
            .unwrap_or_default();
        if token.is_empty() {
            return Err(Error::invalid_data("empty token"));
        }
        self.update_session(|session| session.with_jwt(token.clone()));
        Ok(token)
    }

    async fn rest(&self, path: &str, options: RequestOptions) -> Result<Payload, Error> {
        let options = options.cookie(self.cookie_header()?);
        self.transport().request(path, options).await
    }
}

fn range_query(start: NaiveDate, end: NaiveDate) -> RequestOptions {
    RequestOptions::get()
        .query("startDate", to_untis_date(start))
        .query("endDate", to_untis_date(end))
}

/// The `data` member of a REST response, which has to be an object.
fn data_object(payload: Payload) -> Result<Value, Error> {
    match payload.into_json().and_then(|mut body| body.get_mut("data").map(Value::take)) {
        Some(data) if data.is_object() => Ok(data),
        Some(other) => Err(Error::invalid_data(format!(
            "expected data object, got {}",
            json_type(&other)
        ))),
        None => Err(Error::invalid_data("expected data object, got nothing")),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn decode<R: DeserializeOwned>(value: Value) -> Result<R, Error> {
    Ok(serde_json::from_value(value)?)
}

fn report_url(base: &str, data: &Value) -> Result<String, Error> {
    if data.get("error").map_or(false, is_truthy) {
        return Err(Error::invalid_data("Server returned no data!"));
    }
    let field = |name: &str| {
        data.get(name)
            .filter(|value| !value.is_null())
            .map(scalar_to_string)
            .ok_or_else(|| Error::invalid_data(format!("report response has no {name}")))
    };
    Ok(format!(
        "{base}WebUntis/reports.do?msgId={}&{}",
        field("messageId")?,
        field("reportParams")?
    ))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn extracts_data_object() {
        let payload = Payload::Json(json!({"data": {"rssUrl": "x"}}));
        assert_eq!(data_object(payload).unwrap(), json!({"rssUrl": "x"}));

        let err = data_object(Payload::Json(json!({"data": "nope"}))).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Server returned invalid data: expected data object, got string"
        );
        assert!(data_object(Payload::Text("<html>".into())).is_err());
    }

    #[test]
    fn builds_report_url() {
        let data = json!({"messageId": "abc-1", "reportParams": "rpt=Excuse&x=1"});
        assert_eq!(
            report_url("https://school.webuntis.com/", &data).unwrap(),
            "https://school.webuntis.com/WebUntis/reports.do?msgId=abc-1&rpt=Excuse&x=1"
        );
    }

    #[test]
    fn report_error_is_reported() {
        let data = json!({"error": {"message": "denied"}});
        assert!(matches!(
            report_url("https://school.webuntis.com/", &data),
            Err(Error::InvalidData(_))
        ));
        assert!(report_url("https://school.webuntis.com/", &json!({})).is_err());
    }

    #[test]
    fn report_defaults() {
        let report = AbsenceReport::default();
        assert_eq!(report.excuse_status_id, -1);
        assert_eq!(report.excuse_group, 2);
        assert!(report.lateness && report.absences);
    }
}
