use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::source::CellValue;

/// Text date formats accepted from the sheet, tried in order
const DATE_FORMATS: [&str; 5] = ["%m/%d/%y", "%m/%d/%Y", "%Y-%m-%d", "%b/%d/%y", "%d/%m/%Y"];

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Normalize a raw cell into a calendar date.
///
/// Never fails: null, blank, numeric and unparseable cells all yield `None`,
/// which the eligibility filter treats as "not in window".
pub fn normalize_date(value: &CellValue) -> Option<NaiveDate> {
    if value.is_null() {
        return None;
    }

    match value {
        CellValue::Date(d) => Some(*d),
        CellValue::DateTime(dt) => Some(dt.date()),
        CellValue::Text(s) => parse_date_text(s),
        CellValue::Null | CellValue::Number(_) | CellValue::Bool(_) => None,
    }
}

fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn text(s: &str) -> CellValue {
        CellValue::from(s)
    }

    #[test]
    fn test_known_formats() {
        assert_eq!(normalize_date(&text("01/15/25")), Some(date(2025, 1, 15)));
        assert_eq!(normalize_date(&text("01/15/2025")), Some(date(2025, 1, 15)));
        assert_eq!(normalize_date(&text("2025-01-15")), Some(date(2025, 1, 15)));
        assert_eq!(normalize_date(&text("Jan/15/25")), Some(date(2025, 1, 15)));
        assert_eq!(normalize_date(&text("25/12/2024")), Some(date(2024, 12, 25)));
    }

    #[test]
    fn test_month_first_wins_when_ambiguous() {
        assert_eq!(normalize_date(&text("03/04/2025")), Some(date(2025, 3, 4)));
    }

    #[test]
    fn test_datetime_text() {
        assert_eq!(normalize_date(&text("2025-02-01T13:45:00")), Some(date(2025, 2, 1)));
        assert_eq!(normalize_date(&text("2025-02-01 08:00:00")), Some(date(2025, 2, 1)));
        assert_eq!(normalize_date(&text("2025-02-01T23:30:00-05:00")), Some(date(2025, 2, 1)));
    }

    #[test]
    fn test_native_values() {
        let dt = date(2024, 11, 2).and_hms_opt(9, 30, 0).unwrap();
        assert_eq!(normalize_date(&CellValue::DateTime(dt)), Some(date(2024, 11, 2)));
        assert_eq!(normalize_date(&CellValue::Date(date(2024, 11, 2))), Some(date(2024, 11, 2)));
    }

    #[test]
    fn test_unparseable_is_no_date() {
        assert_eq!(normalize_date(&CellValue::Null), None);
        assert_eq!(normalize_date(&text("")), None);
        assert_eq!(normalize_date(&text("   ")), None);
        assert_eq!(normalize_date(&text("pending")), None);
        assert_eq!(normalize_date(&text("13/45/2025")), None);
        assert_eq!(normalize_date(&CellValue::Number(45000.0)), None);
        assert_eq!(normalize_date(&CellValue::Bool(true)), None);
    }

    #[test]
    fn test_surrounding_whitespace() {
        assert_eq!(normalize_date(&text(" 2025-05-31 ")), Some(date(2025, 5, 31)));
    }
}
