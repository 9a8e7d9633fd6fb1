//! Typed results of the JSON-RPC and REST endpoints.
//!
//! Fields the server leaves out on some installations default to empty values.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::date::de;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolYear {
    pub id: i64,
    pub name: String,
    #[serde(deserialize_with = "de::date")]
    pub start_date: NaiveDate,
    #[serde(deserialize_with = "de::date")]
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub long_name: String,
    #[serde(default)]
    pub alternate_name: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fore_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub back_color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub fore_name: String,
    #[serde(default)]
    pub long_name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: i64,
    #[serde(default)]
    pub key: Option<String>,
    pub name: String,
    #[serde(default)]
    pub fore_name: String,
    #[serde(default)]
    pub long_name: String,
    #[serde(default)]
    pub gender: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub long_name: String,
    #[serde(default)]
    pub alternate_name: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub building: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Klasse {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub long_name: String,
    #[serde(default)]
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub long_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holiday {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub long_name: String,
    #[serde(deserialize_with = "de::date")]
    pub start_date: NaiveDate,
    #[serde(deserialize_with = "de::date")]
    pub end_date: NaiveDate,
}

/// One day of the school's time grid. `day` counts from Sunday = 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timegrid {
    pub day: u8,
    pub time_units: Vec<TimeUnit>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeUnit {
    #[serde(default)]
    pub name: String,
    #[serde(deserialize_with = "de::time")]
    pub start_time: NaiveTime,
    #[serde(deserialize_with = "de::time")]
    pub end_time: NaiveTime,
}

/// Reference to an element inside a [`Lesson`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortData {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub longname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orgid: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orgname: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: i64,
    #[serde(deserialize_with = "de::date")]
    pub date: NaiveDate,
    #[serde(deserialize_with = "de::time")]
    pub start_time: NaiveTime,
    #[serde(deserialize_with = "de::time")]
    pub end_time: NaiveTime,
    #[serde(default)]
    pub kl: Vec<ShortData>,
    #[serde(default)]
    pub te: Vec<ShortData>,
    #[serde(default)]
    pub su: Vec<ShortData>,
    #[serde(default)]
    pub ro: Vec<ShortData>,
    #[serde(default)]
    pub lstext: Option<String>,
    #[serde(default)]
    pub lsnumber: Option<i64>,
    #[serde(default)]
    pub activity_type: Option<String>,
    /// `cancelled` or `irregular` when set.
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub info: Option<String>,
    #[serde(default)]
    pub subst_text: Option<String>,
    #[serde(default)]
    pub statflags: Option<String>,
    #[serde(default)]
    pub sg: Option<String>,
    #[serde(default)]
    pub bk_remark: Option<String>,
    #[serde(default)]
    pub bk_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exam {
    pub id: i64,
    #[serde(default)]
    pub exam_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub student_class: Vec<String>,
    #[serde(deserialize_with = "de::date")]
    pub exam_date: NaiveDate,
    #[serde(deserialize_with = "de::time")]
    pub start_time: NaiveTime,
    #[serde(deserialize_with = "de::time")]
    pub end_time: NaiveTime,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub teachers: Vec<String>,
    #[serde(default)]
    pub rooms: Vec<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub grade: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorEntity {
    pub fore_color: String,
    pub back_color: String,
}

/// Colors the school uses for lesson types (`ls`, `oh`, `sb`, `bs`, `ex`) and lesson codes
/// (`cancelled`, `irregular`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusData {
    #[serde(default)]
    pub lstypes: Vec<BTreeMap<String, Option<ColorEntity>>>,
    #[serde(default)]
    pub codes: Vec<BTreeMap<String, Option<ColorEntity>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageOfDay {
    pub id: i64,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub is_expanded: bool,
    #[serde(default)]
    pub attachments: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsWidget {
    #[serde(default)]
    pub system_message: Option<Value>,
    #[serde(default)]
    pub messages_of_day: Vec<MessageOfDay>,
    #[serde(default)]
    pub rss_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Homework {
    pub id: i64,
    #[serde(default)]
    pub lesson_id: i64,
    #[serde(deserialize_with = "de::date")]
    pub date: NaiveDate,
    #[serde(deserialize_with = "de::date")]
    pub due_date: NaiveDate,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub remark: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub attachments: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeworkRecord {
    pub homework_id: i64,
    #[serde(default)]
    pub teacher_id: i64,
    #[serde(default)]
    pub element_ids: Vec<i64>,
}

/// Homework with the lessons and teachers it refers to. Lessons and teachers come back partial,
/// so they are kept as raw JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Homeworks {
    pub homeworks: Vec<Homework>,
    #[serde(default)]
    pub lessons: Vec<Value>,
    #[serde(default)]
    pub records: Vec<HomeworkRecord>,
    #[serde(default)]
    pub teachers: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Excuse {
    pub id: i64,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub excuse_status: String,
    #[serde(default)]
    pub is_excused: bool,
    #[serde(default)]
    pub user_id: i64,
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Absence {
    pub id: i64,
    #[serde(deserialize_with = "de::date")]
    pub start_date: NaiveDate,
    #[serde(deserialize_with = "de::date")]
    pub end_date: NaiveDate,
    #[serde(deserialize_with = "de::time")]
    pub start_time: NaiveTime,
    #[serde(deserialize_with = "de::time")]
    pub end_time: NaiveTime,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub student_name: String,
    #[serde(default)]
    pub excuse_status: Option<String>,
    #[serde(default)]
    pub is_excused: bool,
    #[serde(default)]
    pub excuse: Option<Excuse>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbsenceReason {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Absences {
    #[serde(default)]
    pub absences: Vec<Absence>,
    #[serde(default)]
    pub absence_reasons: Vec<AbsenceReason>,
    #[serde(default)]
    pub show_absence_reason_change: bool,
    #[serde(default)]
    pub show_create_absence: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxSender {
    pub user_id: i64,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub class_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxMessage {
    pub id: i64,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub content_preview: Option<String>,
    pub sender: InboxSender,
    /// ISO 8601, as sent.
    #[serde(default)]
    pub sent_date_time: String,
    #[serde(default)]
    pub has_attachments: bool,
    #[serde(default)]
    pub is_message_read: bool,
    #[serde(default)]
    pub is_reply: bool,
    #[serde(default)]
    pub is_reply_allowed: bool,
    #[serde(default)]
    pub allow_message_deletion: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inbox {
    #[serde(default)]
    pub incoming_messages: Vec<InboxMessage>,
    #[serde(default)]
    pub read_confirmation_messages: Vec<InboxMessage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lesson_from_wire() {
        let lesson: Lesson = serde_json::from_str(
            r#"{
                "id": 125043, "date": 20191113, "startTime": 745, "endTime": 830,
                "kl": [{"id": 71, "name": "1A", "longname": "Klasse 1A"}],
                "te": [{"id": 23, "name": "MUS", "orgid": 4, "orgname": "SMI"}],
                "su": [{"id": 13, "name": "M"}],
                "ro": [],
                "lsnumber": 1000, "activityType": "Unterricht", "code": "cancelled"
            }"#,
        )
        .unwrap();
        assert_eq!(lesson.date, NaiveDate::from_ymd_opt(2019, 11, 13).unwrap());
        assert_eq!(lesson.start_time, NaiveTime::from_hms_opt(7, 45, 0).unwrap());
        assert_eq!(lesson.kl[0].longname, "Klasse 1A");
        assert_eq!(lesson.te[0].orgname.as_deref(), Some("SMI"));
        assert_eq!(lesson.code.as_deref(), Some("cancelled"));
    }

    #[test]
    fn school_year_accepts_string_dates() {
        let year: SchoolYear = serde_json::from_str(
            r#"{"id": 10, "name": "2019/2020", "startDate": "20190902", "endDate": "20200710"}"#,
        )
        .unwrap();
        assert_eq!(year.end_date, NaiveDate::from_ymd_opt(2020, 7, 10).unwrap());
    }

    #[test]
    fn dates_serialize_as_iso() {
        let year: SchoolYear = serde_json::from_str(
            r#"{"id": 10, "name": "2019/2020", "startDate": 20190902, "endDate": 20200710}"#,
        )
        .unwrap();
        assert_eq!(
            serde_json::to_value(&year).unwrap(),
            serde_json::json!({
                "id": 10, "name": "2019/2020", "startDate": "2019-09-02", "endDate": "2020-07-10"
            })
        );

        let lesson: Lesson = serde_json::from_str(
            r#"{"id": 1, "date": 20191113, "startTime": 745, "endTime": 1230}"#,
        )
        .unwrap();
        let value = serde_json::to_value(&lesson).unwrap();
        assert_eq!(value["date"], "2019-11-13");
        assert_eq!(value["startTime"], "07:45:00");
        assert_eq!(value["endTime"], "12:30:00");
    }

    #[test]
    fn exam_from_rest() {
        let exam: Exam = serde_json::from_str(
            r#"{
                "id": 1, "examType": "Schularbeit", "name": "SA1", "studentClass": ["1A"],
                "examDate": 20240312, "startTime": 800, "endTime": 950,
                "subject": "M", "teachers": ["MUS"], "rooms": ["R101"], "text": "", "grade": null
            }"#,
        )
        .unwrap();
        assert_eq!(exam.exam_date, NaiveDate::from_ymd_opt(2024, 3, 12).unwrap());
        assert_eq!(exam.end_time, NaiveTime::from_hms_opt(9, 50, 0).unwrap());
        assert!(exam.grade.is_none());
    }

    #[test]
    fn status_data_keeps_unknown_keys() {
        let status: StatusData = serde_json::from_str(
            r##"{
                "lstypes": [{"ls": {"foreColor": "000000", "backColor": "ee7f00"}}, {"oh": null}],
                "codes": [{"cancelled": {"foreColor": "FFFFFF", "backColor": "B1B3B4"}}]
            }"##,
        )
        .unwrap();
        assert_eq!(status.lstypes[0]["ls"].as_ref().unwrap().back_color, "ee7f00");
        assert!(status.lstypes[1]["oh"].is_none());
        assert_eq!(status.codes.len(), 1);
    }

    #[test]
    fn absences_with_excuse() {
        let absences: Absences = serde_json::from_str(
            r#"{
                "absences": [{
                    "id": 3, "startDate": 20240110, "endDate": 20240110,
                    "startTime": 800, "endTime": 1535, "reason": "sick",
                    "isExcused": true,
                    "excuse": {"id": 9, "excuseStatus": "entsch.", "isExcused": true}
                }],
                "absenceReasons": [{"id": 1, "name": "sick"}]
            }"#,
        )
        .unwrap();
        let absence = &absences.absences[0];
        assert_eq!(absence.end_time, NaiveTime::from_hms_opt(15, 35, 0).unwrap());
        assert_eq!(absence.excuse.as_ref().unwrap().id, 9);
        assert!(!absences.show_create_absence);
    }
}
