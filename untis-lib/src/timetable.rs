//! Timetables, through `getTimetable` and through the weekly web API.

use chrono::{NaiveDate, Utc};
use hyper::client::connect::Connect;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::{
    auth::LoginStrategy,
    config::{ElementType, WEEKLY_TIMETABLE_PATH},
    date::{to_untis_date, validate_range},
    http::RequestOptions,
    model::Lesson,
    rpc::{is_truthy, scalar_to_string},
    Error, Untis,
};

const ELEMENT_FIELDS: [&str; 4] = ["id", "name", "longname", "externalkey"];

/// A period of the weekly timetable with its element references resolved.
///
/// `period` holds the fields as sent by the server. Each reference list keeps the raw reference
/// next to the matching entry of the response's element table, if there is one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekPeriod {
    #[serde(flatten)]
    pub period: Map<String, Value>,
    pub classes: Vec<WeekElement>,
    pub teachers: Vec<WeekElement>,
    pub subjects: Vec<WeekElement>,
    pub rooms: Vec<WeekElement>,
    pub students: Vec<WeekElement>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekElement {
    #[serde(flatten)]
    pub reference: Map<String, Value>,
    pub element: Option<Value>,
}

impl<S, T> Untis<S, T>
where
    S: LoginStrategy,
    T: Connect + Clone + Send + Sync + 'static,
{
    pub async fn timetable_for_today(
        &self,
        id: i64,
        element: ElementType,
    ) -> Result<Vec<Lesson>, Error> {
        self.timetable(id, element.id(), None, None).await
    }

    pub async fn timetable_for(
        &self,
        date: NaiveDate,
        id: i64,
        element: ElementType,
    ) -> Result<Vec<Lesson>, Error> {
        self.timetable(id, element.id(), Some(date), Some(date))
            .await
    }

    pub async fn timetable_for_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        id: i64,
        element: ElementType,
    ) -> Result<Vec<Lesson>, Error> {
        validate_range(start, end, "timetable_for_range")?;
        self.timetable(id, element.id(), Some(start), Some(end))
            .await
    }

    /// Today's timetable of the logged in person.
    pub async fn own_timetable_for_today(&self) -> Result<Vec<Lesson>, Error> {
        self.check_anonymous()?;
        let (id, kind) = self.current_person()?;
        self.timetable(id, kind, None, None).await
    }

    pub async fn own_timetable_for(&self, date: NaiveDate) -> Result<Vec<Lesson>, Error> {
        self.check_anonymous()?;
        let (id, kind) = self.current_person()?;
        self.timetable(id, kind, Some(date), Some(date)).await
    }

    pub async fn own_timetable_for_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Lesson>, Error> {
        self.check_anonymous()?;
        validate_range(start, end, "own_timetable_for_range")?;
        let (id, kind) = self.current_person()?;
        self.timetable(id, kind, Some(start), Some(end)).await
    }

    /// Today's timetable of the logged in person's class.
    pub async fn own_class_timetable_for_today(&self) -> Result<Vec<Lesson>, Error> {
        self.check_anonymous()?;
        let klasse_id = self.own_klasse_id()?;
        self.timetable(klasse_id, ElementType::Class.id(), None, None)
            .await
    }

    pub async fn own_class_timetable_for(&self, date: NaiveDate) -> Result<Vec<Lesson>, Error> {
        self.check_anonymous()?;
        let klasse_id = self.own_klasse_id()?;
        self.timetable(klasse_id, ElementType::Class.id(), Some(date), Some(date))
            .await
    }

    pub async fn own_class_timetable_for_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Lesson>, Error> {
        self.check_anonymous()?;
        validate_range(start, end, "own_class_timetable_for_range")?;
        let klasse_id = self.own_klasse_id()?;
        self.timetable(klasse_id, ElementType::Class.id(), Some(start), Some(end))
            .await
    }

    /// The week containing `date` for any element, from the web client's API.
    ///
    /// `format_id` 1 includes teachers, 2 leaves them out.
    pub async fn timetable_for_week(
        &self,
        date: NaiveDate,
        id: i64,
        element: ElementType,
        format_id: u32,
    ) -> Result<Vec<WeekPeriod>, Error> {
        self.week(date, id, element.id(), format_id).await
    }

    pub async fn own_timetable_for_week(
        &self,
        date: NaiveDate,
        format_id: u32,
    ) -> Result<Vec<WeekPeriod>, Error> {
        self.check_anonymous()?;
        let (id, kind) = self.current_person()?;
        self.week(date, id, kind, format_id).await
    }

    fn own_klasse_id(&self) -> Result<i64, Error> {
        self.session()?
            .klasse_id()
            .ok_or(Error::MissingPerson("klasseId"))
    }

    async fn timetable(
        &self,
        id: i64,
        kind: i64,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<Lesson>, Error> {
        let params = timetable_params(Utc::now().timestamp_millis(), id, kind, start, end);
        self.call("getTimetable", params).await
    }

    async fn week(
        &self,
        date: NaiveDate,
        id: i64,
        kind: i64,
        format_id: u32,
    ) -> Result<Vec<WeekPeriod>, Error> {
        self.ensure_valid(self.config().validates_session()).await?;
        let response = self
            .transport()
            .request(
                WEEKLY_TIMETABLE_PATH,
                RequestOptions::get()
                    .query("elementType", kind)
                    .query("elementId", id)
                    .query("date", date.format("%Y-%m-%d"))
                    .query("formatId", format_id)
                    .cookie(self.cookie_header()?),
            )
            .await?
            .into_json();
        resolve_week(response, id)
    }
}

fn timetable_params(
    request_id: i64,
    id: i64,
    kind: i64,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Value {
    let mut options = json!({
        "id": request_id,
        "element": { "id": id, "type": kind },
        "showLsText": true,
        "showStudentgroup": true,
        "showLsNumber": true,
        "showSubstText": true,
        "showInfo": true,
        "showBooking": true,
        "klasseFields": ELEMENT_FIELDS,
        "roomFields": ELEMENT_FIELDS,
        "subjectFields": ELEMENT_FIELDS,
        "teacherFields": ELEMENT_FIELDS,
    });
    if let Some(start) = start {
        options["startDate"] = Value::from(to_untis_date(start));
    }
    if let Some(end) = end {
        options["endDate"] = Value::from(to_untis_date(end));
    }
    json!({ "options": options })
}

fn resolve_week(response: Option<Value>, id: i64) -> Result<Vec<WeekPeriod>, Error> {
    let data = response
        .as_ref()
        .and_then(|response| response.get("data"))
        .filter(|data| data.is_object())
        .ok_or_else(|| Error::invalid_data("expected data object"))?;

    if let Some(error) = data.get("error").filter(|error| is_truthy(error)) {
        // Known key: ERR_TTVIEW_NOTALLOWED_ONDATE
        return Err(Error::ServerCode {
            code: error
                .pointer("/data/messageKey")
                .map(scalar_to_string)
                .unwrap_or_default(),
            message: Some("Server responded with error".to_owned()),
        });
    }

    let data = data
        .pointer("/result/data")
        .ok_or_else(|| Error::invalid_data("Invalid response"))?;
    let periods = data
        .get("elementPeriods")
        .and_then(|periods| periods.get(id.to_string()))
        .and_then(Value::as_array)
        .ok_or_else(|| Error::invalid_data("Invalid response"))?;
    let elements = data
        .get("elements")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    periods
        .iter()
        .map(|period| {
            let period = period
                .as_object()
                .ok_or_else(|| Error::invalid_data("period is not an object"))?;
            let references = period
                .get("elements")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();
            let of_type = |element: ElementType| resolve_references(references, elements, element);

            Ok(WeekPeriod {
                classes: of_type(ElementType::Class),
                teachers: of_type(ElementType::Teacher),
                subjects: of_type(ElementType::Subject),
                rooms: of_type(ElementType::Room),
                students: of_type(ElementType::Student),
                period: period.clone(),
            })
        })
        .collect()
}

fn resolve_references(
    references: &[Value],
    elements: &[Value],
    element: ElementType,
) -> Vec<WeekElement> {
    let kind = Value::from(element.id());
    references
        .iter()
        .filter_map(Value::as_object)
        .filter(|reference| reference.get("type") == Some(&kind))
        .map(|reference| WeekElement {
            element: elements
                .iter()
                .find(|candidate| {
                    candidate.get("type") == Some(&kind) && candidate.get("id") == reference.get("id")
                })
                .cloned(),
            reference: reference.clone(),
        })
        .collect()
}
