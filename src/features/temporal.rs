//! Calendar features derived from a timestamp
//!
//! Fills the `hour`, `day`, `month` and `dayofweek` record fields the same
//! way the training data was prepared (Monday = 0).

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

use crate::{BuildingRecord, EnergyError, Result};

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Calendar breakdown of a reading timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarParts {
    pub hour: u8,
    pub day: u8,
    pub month: u8,
    pub year: i32,
    /// Monday = 0 ... Sunday = 6
    pub dayofweek: u8,
    pub dayofyear: u16,
}

impl CalendarParts {
    pub fn from_datetime(ts: &NaiveDateTime) -> Self {
        CalendarParts {
            hour: ts.hour() as u8,
            day: ts.day() as u8,
            month: ts.month() as u8,
            year: ts.year(),
            dayofweek: ts.weekday().num_days_from_monday() as u8,
            dayofyear: ts.ordinal() as u16,
        }
    }

    /// Overwrite the calendar fields of a record
    pub fn apply(&self, record: &mut BuildingRecord) {
        record.hour = self.hour;
        record.day = self.day;
        record.month = self.month;
        record.dayofweek = self.dayofweek;
    }
}

/// Parse a timestamp such as `2016-01-01 13:00:00`
///
/// A bare date is taken as midnight.
pub fn parse_timestamp(text: &str) -> Result<NaiveDateTime> {
    let text = text.trim();
    for format in DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(ts);
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| EnergyError::Parse(format!("Unrecognized timestamp: {}", text)))
}

/// Parse a timestamp and break it into calendar parts
pub fn calendar_parts(text: &str) -> Result<CalendarParts> {
    parse_timestamp(text).map(|ts| CalendarParts::from_datetime(&ts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::record_repr::tests::sample_record;

    #[test]
    fn test_calendar_parts() {
        // 2016-01-01 was a Friday
        let parts = calendar_parts("2016-01-01 13:00:00").unwrap();
        assert_eq!(parts.hour, 13);
        assert_eq!(parts.day, 1);
        assert_eq!(parts.month, 1);
        assert_eq!(parts.year, 2016);
        assert_eq!(parts.dayofweek, 4);
        assert_eq!(parts.dayofyear, 1);
    }

    #[test]
    fn test_accepted_formats() {
        assert_eq!(calendar_parts("2016-12-31T23:15:00").unwrap().dayofyear, 366);
        assert_eq!(calendar_parts("2016-06-05 08:30").unwrap().dayofweek, 6);
        assert_eq!(calendar_parts("2016-06-06").unwrap().hour, 0);
        assert!(calendar_parts("06/06/2016").is_err());
    }

    #[test]
    fn test_apply_to_record() {
        let mut record = sample_record();
        calendar_parts("2017-07-18 06:00:00").unwrap().apply(&mut record);
        assert_eq!(record.hour, 6);
        assert_eq!(record.day, 18);
        assert_eq!(record.month, 7);
        assert_eq!(record.dayofweek, 1);
    }
}
