// src/schedule.rs

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Whether an announcement is currently accepting applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SupportStatus {
    Upcoming,
    Open,
    Closed,
    /// A bound is missing or unparsable.
    Unknown,
}

impl SupportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upcoming => "upcoming",
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Unknown => "unknown",
        }
    }
}

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y%m%d", "%Y.%m.%d"];

/// Parses the date formats seen in announcement exports.
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    parse_datetime(raw).map(|dt| dt.date())
}

/// Status of an application window relative to `reference`. Both bounds are inclusive.
pub fn support_status(
    start: Option<&str>,
    end: Option<&str>,
    reference: NaiveDateTime,
) -> SupportStatus {
    let (Some(start), Some(end)) = (start.and_then(parse_datetime), end.and_then(parse_datetime))
    else {
        return SupportStatus::Unknown;
    };
    if reference < start {
        SupportStatus::Upcoming
    } else if reference > end {
        SupportStatus::Closed
    } else {
        SupportStatus::Open
    }
}

/// Days from `today` until `due` (negative once past). `None` for blank or bad dates.
pub fn days_until(due: &str, today: NaiveDate) -> Option<i64> {
    parse_date(due).map(|d| (d - today).num_days())
}

/// Reason text shown with a recommendation; falls back to a score band label.
pub fn format_reason(reason: Option<&str>, score: f64) -> String {
    match reason.map(str::trim) {
        Some(r) if !r.is_empty() => r.to_string(),
        _ if score >= 80.0 => "High fit - keyword match and conditions met".to_string(),
        _ if score >= 60.0 => "Good fit - main conditions met".to_string(),
        _ if score >= 40.0 => "Moderate fit - some conditions met".to_string(),
        _ => "Low fit - for reference only".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(date: &str) -> NaiveDateTime {
        parse_datetime(date).unwrap()
    }

    #[test]
    fn test_parse_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 9, 16).unwrap();
        for raw in [
            "2025-09-16",
            "20250916",
            "2025.09.16",
            "2025-09-16 10:30",
            "2025-09-16 10:30:00",
            "2025-09-16T10:30:00+09:00",
        ] {
            assert_eq!(parse_date(raw), Some(expected), "format {}", raw);
        }
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("soon"), None);
    }

    #[test]
    fn test_support_status_bounds_are_inclusive() {
        let (start, end) = (Some("2025-09-01"), Some("2025-09-30"));
        assert_eq!(support_status(start, end, at("2025-08-31")), SupportStatus::Upcoming);
        assert_eq!(support_status(start, end, at("2025-09-01")), SupportStatus::Open);
        assert_eq!(support_status(start, end, at("2025-09-16")), SupportStatus::Open);
        assert_eq!(support_status(start, end, at("2025-09-30")), SupportStatus::Open);
        assert_eq!(support_status(start, end, at("2025-10-01")), SupportStatus::Closed);
    }

    #[test]
    fn test_support_status_unknown_on_missing_bound() {
        let reference = at("2025-09-16");
        assert_eq!(support_status(None, Some("2025-09-30"), reference), SupportStatus::Unknown);
        assert_eq!(support_status(Some("2025-09-01"), Some("tbd"), reference), SupportStatus::Unknown);
    }

    #[test]
    fn test_days_until() {
        let today = NaiveDate::from_ymd_opt(2025, 9, 16).unwrap();
        assert_eq!(days_until("2025-09-20", today), Some(4));
        assert_eq!(days_until("2025-09-10", today), Some(-6));
        assert_eq!(days_until("", today), None);
    }

    #[test]
    fn test_format_reason_bands() {
        assert_eq!(format_reason(Some("  업종 매칭 "), 10.0), "업종 매칭");
        assert!(format_reason(None, 85.0).starts_with("High fit"));
        assert!(format_reason(Some("   "), 60.0).starts_with("Good fit"));
        assert!(format_reason(None, 40.0).starts_with("Moderate fit"));
        assert!(format_reason(None, 39.9).starts_with("Low fit"));
    }
}
