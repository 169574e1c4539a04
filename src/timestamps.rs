use chrono::{Local, NaiveDate, NaiveDateTime};

pub const DATE_FORMAT: &str = "%d/%m/%Y";
pub const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M";

pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), TIMESTAMP_FORMAT).ok()
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}

pub fn format_timestamp(value: NaiveDateTime) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

pub fn format_date(value: NaiveDate) -> String {
    value.format(DATE_FORMAT).to_string()
}

pub fn now_local() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Timestamp used when none was recorded: the creation date at midnight.
pub fn midnight_of(date: &str) -> String {
    format!("{} 00:00", date)
}
