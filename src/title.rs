use chrono::{Datelike, NaiveDate};

use crate::match_data::{MatchInfo, UNCONFIRMED};

const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const HOURS_SUFFIX: &str = "hrs";
const FIELD_LABEL: &str = "Field";

pub fn match_title(info: &MatchInfo) -> String {
    format_match_title(&info.date, &info.time, &info.field)
}

/// `"Match <date> - <time> - <field>"`. Never fails: anything it cannot interpret is
/// passed through as given.
pub fn format_match_title(date: &str, time: &str, field: &str) -> String {
    format!(
        "Match {} - {} - {}",
        format_date(date),
        format_time(time),
        format_field(field)
    )
}

/// `2025-06-15` → `Sunday 15 de June`.
pub fn format_date(raw: &str) -> String {
    let cleaned = raw.trim();
    if is_unconfirmed(cleaned) {
        return raw.to_string();
    }
    let Ok(date) = NaiveDate::parse_from_str(cleaned, "%Y-%m-%d") else {
        return raw.to_string();
    };
    let weekday = WEEKDAYS[date.weekday().num_days_from_monday() as usize];
    let month = MONTHS[date.month0() as usize];
    format!("{weekday} {} de {month}", date.day())
}

pub fn format_time(raw: &str) -> String {
    let cleaned = raw.trim();
    if is_unconfirmed(cleaned) || cleaned.is_empty() || cleaned.contains(HOURS_SUFFIX) {
        return raw.to_string();
    }
    format!("{cleaned} {HOURS_SUFFIX}")
}

pub fn format_field(raw: &str) -> String {
    let cleaned = raw.trim();
    if !cleaned.is_empty() && cleaned.chars().all(|c| c.is_ascii_digit()) {
        return format!("{FIELD_LABEL} {cleaned}");
    }
    raw.to_string()
}

fn is_unconfirmed(value: &str) -> bool {
    value.eq_ignore_ascii_case(UNCONFIRMED)
}
