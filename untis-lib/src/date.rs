//! Conversion between chrono types and the compact numeric dates (`YYYYMMDD`) and times
//! (`HMM`/`HHMM`) used on the wire.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::Error;

/// Format a date as `YYYYMMDD`.
pub fn to_untis_date(date: NaiveDate) -> String {
    format!("{:04}{:02}{:02}", date.year(), date.month(), date.day())
}

/// Parse a `YYYYMMDD` date.
///
/// Some servers send dates as JSON numbers, format those with `to_string` first.
pub fn from_untis_date(date: &str) -> Result<NaiveDate, Error> {
    let date = date.trim();
    if date.len() != 8 || !date.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid_date(date));
    }

    // Slicing is safe, the string is 8 ASCII digits.
    let year = date[..4].parse().map_err(|_| invalid_date(date))?;
    let month = date[4..6].parse().map_err(|_| invalid_date(date))?;
    let day = date[6..].parse().map_err(|_| invalid_date(date))?;
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| invalid_date(date))
}

/// Format a time as `HMM` (no leading zero for the hour), e.g. `745` or `1330`.
pub fn to_untis_time(time: NaiveTime) -> String {
    (time.hour() * 100 + time.minute()).to_string()
}

/// Parse a `HMM`/`HHMM` time, e.g. `745` or `1330`.
pub fn from_untis_time(time: &str) -> Result<NaiveTime, Error> {
    let time = time.trim();
    if time.is_empty() || time.len() > 4 || !time.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid_time(time));
    }

    let padded = format!("{time:0>4}");
    let hour = padded[..2].parse().map_err(|_| invalid_time(time))?;
    let minute = padded[2..].parse().map_err(|_| invalid_time(time))?;
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(|| invalid_time(time))
}

/// Combine a wire date and a wire time.
pub fn from_untis_datetime(date: &str, time: &str) -> Result<NaiveDateTime, Error> {
    Ok(from_untis_date(date)?.and_time(from_untis_time(time)?))
}

/// Reject ranges whose start lies after their end. Equal bounds are a valid one-day range.
///
/// `name` is the operation the range belongs to and prefixes the error message.
pub fn validate_range(start: NaiveDate, end: NaiveDate, name: &str) -> Result<(), Error> {
    if start > end {
        return Err(Error::Validation(format!(
            "{name}: rangeStart must be <= rangeEnd"
        )));
    }
    Ok(())
}

fn invalid_date(date: &str) -> Error {
    Error::Validation(format!("`{date}` is not a valid YYYYMMDD date"))
}

fn invalid_time(time: &str) -> Error {
    Error::Validation(format!("`{time}` is not a valid HMM time"))
}

/// Serde helpers for fields that arrive as either numbers or strings.
pub(crate) mod de {
    use chrono::{NaiveDate, NaiveTime};
    use serde::{de::Error as _, Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(u64),
        String(String),
    }

    impl NumberOrString {
        fn into_string(self) -> String {
            match self {
                NumberOrString::Number(number) => number.to_string(),
                NumberOrString::String(string) => string,
            }
        }
    }

    pub fn date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = NumberOrString::deserialize(deserializer)?.into_string();
        super::from_untis_date(&raw).map_err(D::Error::custom)
    }

    pub fn time<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = NumberOrString::deserialize(deserializer)?.into_string();
        super::from_untis_time(&raw).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn round_trips_zero_padded_date() {
        assert_eq!(to_untis_date(from_untis_date("20191113").unwrap()), "20191113");
        assert_eq!(to_untis_date(from_untis_date("20200105").unwrap()), "20200105");
    }

    #[test]
    fn date_codec_is_lossless_across_a_year() {
        let mut day = date(2024, 1, 1);
        while day.year() == 2024 {
            assert_eq!(from_untis_date(&to_untis_date(day)).unwrap(), day);
            day = day.succ_opt().unwrap();
        }
    }

    #[test]
    fn rejects_malformed_dates() {
        for bad in ["2019111", "201911131", "2019-11-1", "20191332", "20190229", ""] {
            let err = from_untis_date(bad).unwrap_err();
            assert!(matches!(err, Error::Validation(_)), "{bad}");
        }
    }

    #[test]
    fn parses_times() {
        assert_eq!(from_untis_time("745").unwrap(), NaiveTime::from_hms_opt(7, 45, 0).unwrap());
        assert_eq!(from_untis_time("1330").unwrap(), NaiveTime::from_hms_opt(13, 30, 0).unwrap());
        assert_eq!(from_untis_time("5").unwrap(), NaiveTime::from_hms_opt(0, 5, 0).unwrap());
        assert!(from_untis_time("2460").is_err());
        assert!(from_untis_time("12:30").is_err());
    }

    #[test]
    fn formats_times() {
        assert_eq!(to_untis_time(NaiveTime::from_hms_opt(7, 45, 0).unwrap()), "745");
        assert_eq!(to_untis_time(NaiveTime::from_hms_opt(13, 5, 0).unwrap()), "1305");
    }

    #[test]
    fn combines_date_and_time() {
        let datetime = from_untis_datetime("20191113", "800").unwrap();
        assert_eq!(datetime, date(2019, 11, 13).and_hms_opt(8, 0, 0).unwrap());
    }

    #[test]
    fn range_validation() {
        let start = date(2024, 3, 1);
        let end = date(2024, 3, 8);
        assert!(validate_range(start, end, "test").is_ok());
        assert!(validate_range(start, start, "test").is_ok());

        let err = validate_range(end, start, "getExamsForRange").unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(err.to_string().starts_with("getExamsForRange"));
    }

    #[test]
    fn deserializes_numbers_and_strings() {
        #[derive(serde::Deserialize)]
        struct Row {
            #[serde(deserialize_with = "de::date")]
            date: NaiveDate,
            #[serde(deserialize_with = "de::time")]
            time: NaiveTime,
        }

        let row: Row = serde_json::from_str(r#"{"date":20191113,"time":"745"}"#).unwrap();
        assert_eq!(row.date, date(2019, 11, 13));
        assert_eq!(row.time, NaiveTime::from_hms_opt(7, 45, 0).unwrap());
    }
}
