//! Master data of the school: years, subjects, rooms and the like.

use hyper::client::connect::Connect;
use serde_json::{json, Value};

use crate::{
    auth::LoginStrategy,
    model::{
        Department, Holiday, Klasse, Room, SchoolYear, StatusData, Student, Subject, Teacher,
        Timegrid,
    },
    Error, Untis,
};

impl<S, T> Untis<S, T>
where
    S: LoginStrategy,
    T: Connect + Clone + Send + Sync + 'static,
{
    /// Time of the last data import, in milliseconds since the unix epoch.
    pub async fn latest_import_time(&self) -> Result<i64, Error> {
        self.call("getLatestImportTime", json!({})).await
    }

    /// All school years, newest first.
    pub async fn schoolyears(&self) -> Result<Vec<SchoolYear>, Error> {
        let years = self.call("getSchoolyears", json!({})).await?;
        newest_first(years)
    }

    pub async fn latest_schoolyear(&self) -> Result<SchoolYear, Error> {
        let mut years = self.schoolyears().await?;
        // `schoolyears` never returns an empty list.
        Ok(years.swap_remove(0))
    }

    pub async fn current_schoolyear(&self) -> Result<SchoolYear, Error> {
        self.call("getCurrentSchoolyear", json!({})).await
    }

    pub async fn subjects(&self) -> Result<Vec<Subject>, Error> {
        self.call("getSubjects", json!({})).await
    }

    pub async fn timegrid(&self) -> Result<Vec<Timegrid>, Error> {
        self.call("getTimegridUnits", json!({})).await
    }

    pub async fn teachers(&self) -> Result<Vec<Teacher>, Error> {
        self.call("getTeachers", json!({})).await
    }

    pub async fn students(&self) -> Result<Vec<Student>, Error> {
        self.call("getStudents", json!({})).await
    }

    pub async fn rooms(&self) -> Result<Vec<Room>, Error> {
        self.call("getRooms", json!({})).await
    }

    /// Classes of the given school year, or of the current one.
    pub async fn classes(&self, schoolyear_id: Option<i64>) -> Result<Vec<Klasse>, Error> {
        let params = match schoolyear_id {
            Some(id) => json!({ "schoolyearId": id }),
            None => Value::Object(Default::default()),
        };
        self.call("getKlassen", params).await
    }

    pub async fn departments(&self) -> Result<Vec<Department>, Error> {
        self.call("getDepartments", json!({})).await
    }

    pub async fn holidays(&self) -> Result<Vec<Holiday>, Error> {
        self.call("getHolidays", json!({})).await
    }

    pub async fn status_data(&self) -> Result<StatusData, Error> {
        self.call("getStatusData", json!({})).await
    }
}

fn newest_first(mut years: Vec<SchoolYear>) -> Result<Vec<SchoolYear>, Error> {
    if years.is_empty() {
        return Err(Error::invalid_data("Failed to receive school year"));
    }
    years.sort_by(|a, b| b.start_date.cmp(&a.start_date));
    Ok(years)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn year(id: i64, start: i32) -> SchoolYear {
        SchoolYear {
            id,
            name: format!("{start}/{}", start + 1),
            start_date: NaiveDate::from_ymd_opt(start, 9, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(start + 1, 7, 1).unwrap(),
        }
    }

    #[test]
    fn sorts_newest_first() {
        let years = newest_first(vec![year(1, 2019), year(3, 2021), year(2, 2020)]).unwrap();
        let ids: Vec<_> = years.iter().map(|year| year.id).collect();
        assert_eq!(ids, [3, 2, 1]);
    }

    #[test]
    fn empty_years_are_an_error() {
        let err = newest_first(Vec::new()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Server returned invalid data: Failed to receive school year"
        );
    }
}
