use crate::orm::value::DATETIME_FORMAT;
use chrono::{Duration, Local, NaiveDateTime};

/// Display form of a stored datetime, minutes precision.
pub fn format_datetime(moment: NaiveDateTime) -> String {
    moment.format("%Y-%m-%d %H:%M").to_string()
}

/// Parses `YYYY-MM-DD HH:MM:SS`, the layout DATETIME columns are stored in.
pub fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text.trim(), DATETIME_FORMAT).ok()
}

/// Now plus `days`, truncated to whole seconds so it survives a round trip
/// through the database unchanged.
pub fn days_from_now(days: i64) -> NaiveDateTime {
    let moment = Local::now().naive_local() + Duration::days(days);
    parse_datetime(&moment.format(DATETIME_FORMAT).to_string()).unwrap_or(moment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_format() {
        let moment = parse_datetime("2024-05-01 08:15:00").unwrap();
        assert_eq!(format_datetime(moment), "2024-05-01 08:15");
        assert!(parse_datetime("05/01/2024").is_none());
    }

    #[test]
    fn test_days_from_now_has_no_fraction() {
        assert_eq!(days_from_now(1).and_utc().timestamp_subsec_nanos(), 0);
    }
}
