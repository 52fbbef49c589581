//! Raw field normalization
//!
//! Converts extractor output into canonical typed values. Every function
//! here is total: unparseable input degrades to a defined fallback (0.0
//! rating, original date string) instead of an error, so normalization can
//! never lose a record.

use crate::records::{CanonicalRecord, RawRecord};
use chrono::{DateTime, Days, Months, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;

static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").unwrap());

static NEWLINE_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

static RELATIVE_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(\d+)\s+(day|week|month|year)s?\s+ago$").unwrap());

/// Human-readable date formats tried in order
///
/// Month-name-first and day-first, full and abbreviated month names, one-
/// and two-digit days. Ambiguous numeric slash dates parse month-first;
/// day-first still catches values MDY rejects (e.g. `25/12/2024`).
const HUMAN_DATE_FORMATS: &[&str] = &[
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%d %B, %Y",
    "%d %b, %Y",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%m/%d/%y",
];

/// Builds a canonical record from one raw record
pub fn normalize(raw: &RawRecord) -> CanonicalRecord {
    CanonicalRecord {
        rating: rating(&raw.rating),
        text: text(&raw.text),
        date: date(&raw.date),
        reviewer_name: raw.reviewer_name.trim().to_string(),
        title: raw.title.as_deref().map(|t| t.trim().to_string()).unwrap_or_default(),
        verified: verified(raw.verified.as_deref()),
    }
}

/// Extracts a rating from arbitrary text
///
/// The first numeric token (integer or decimal) is accepted iff it lies
/// within [1, 5]; anything else yields 0.0. No rounding: 4.5 stays 4.5.
pub fn rating(raw: &str) -> f64 {
    let Some(token) = NUMBER_RE.find(raw) else {
        return 0.0;
    };
    match token.as_str().parse::<f64>() {
        Ok(value) if (1.0..=5.0).contains(&value) => value,
        _ => 0.0,
    }
}

/// Normalizes review body whitespace
///
/// Trims, converts CRLF/CR to LF, and collapses runs of three or more
/// newlines to exactly two. Empty input stays empty.
pub fn text(raw: &str) -> String {
    let unified = raw.replace("\r\n", "\n").replace('\r', "\n");
    let collapsed = NEWLINE_RUN_RE.replace_all(&unified, "\n\n");
    collapsed.trim().to_string()
}

/// Canonicalizes a date string to `YYYY-MM-DD`
///
/// Tries ISO-8601 (dates and date-times), the human-readable format list,
/// relative phrases like "3 weeks ago", and literal today/yesterday. A
/// string matching none of these is returned trimmed but otherwise
/// unchanged; passing garbage through is deliberate so the dataset never
/// silently loses the original value.
pub fn date(raw: &str) -> String {
    date_with_today(raw, Utc::now().date_naive())
}

/// `date` with an injectable "today", for deterministic tests
pub fn date_with_today(raw: &str, today: NaiveDate) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    if let Ok(parsed) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return format_date(parsed);
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return format_date(parsed.date_naive());
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S") {
        return format_date(parsed.date());
    }

    for format in HUMAN_DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(trimmed, format) {
            return format_date(parsed);
        }
    }

    if let Some(parsed) = parse_relative(trimmed, today) {
        return format_date(parsed);
    }

    match trimmed.to_lowercase().as_str() {
        "today" => return format_date(today),
        "yesterday" => {
            if let Some(parsed) = today.checked_sub_days(Days::new(1)) {
                return format_date(parsed);
            }
        }
        _ => {}
    }

    trimmed.to_string()
}

/// True iff the optional verified-field extraction produced non-empty text
pub fn verified(raw: Option<&str>) -> bool {
    raw.map_or(false, |value| !value.trim().is_empty())
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parses `"<N> <day|week|month|year>(s) ago"` relative to `today`
fn parse_relative(raw: &str, today: NaiveDate) -> Option<NaiveDate> {
    let captures = RELATIVE_DATE_RE.captures(raw)?;
    let count: u64 = captures.get(1)?.as_str().parse().ok()?;
    let unit = captures.get(2)?.as_str().to_lowercase();

    match unit.as_str() {
        "day" => today.checked_sub_days(Days::new(count)),
        "week" => today.checked_sub_days(Days::new(count.checked_mul(7)?)),
        "month" => today.checked_sub_months(Months::new(u32::try_from(count).ok()?)),
        "year" => today.checked_sub_months(Months::new(u32::try_from(count.checked_mul(12)?).ok()?)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    #[test]
    fn test_rating_plain_and_embedded_numbers() {
        assert_eq!(rating("5 stars"), 5.0);
        assert_eq!(rating("Rated 3 out of 5"), 3.0);
        assert_eq!(rating("4.5"), 4.5);
        assert_eq!(rating("1"), 1.0);
    }

    #[test]
    fn test_rating_out_of_range_or_missing_is_zero() {
        assert_eq!(rating("6"), 0.0);
        assert_eq!(rating("0.5"), 0.0);
        assert_eq!(rating("invalid"), 0.0);
        assert_eq!(rating(""), 0.0);
    }

    #[test]
    fn test_rating_keeps_decimals_unrounded() {
        assert_eq!(rating("3.7 out of 5"), 3.7);
    }

    #[test]
    fn test_text_trims_and_unifies_newlines() {
        assert_eq!(text("  hello world  "), "hello world");
        assert_eq!(text("line one\r\nline two\rline three"), "line one\nline two\nline three");
    }

    #[test]
    fn test_text_collapses_newline_runs() {
        assert_eq!(text("a\n\n\n\n\nb"), "a\n\nb");
        // Exactly two newlines are left alone
        assert_eq!(text("a\n\nb"), "a\n\nb");
    }

    #[test]
    fn test_text_empty_stays_empty() {
        assert_eq!(text(""), "");
        assert_eq!(text("   \n  "), "");
    }

    #[test]
    fn test_text_invariants_hold() {
        let out = text("  mixed\r\n\r\n\r\n\r\ncontent\r here  ");
        assert!(!out.contains('\r'));
        assert!(!out.contains("\n\n\n"));
        assert_eq!(out, out.trim());
    }

    #[test]
    fn test_date_iso_passthrough_round_trip() {
        assert_eq!(date_with_today("2024-01-15", today()), "2024-01-15");
    }

    #[test]
    fn test_date_iso_datetime_truncates() {
        assert_eq!(
            date_with_today("2024-01-15T10:30:00Z", today()),
            "2024-01-15"
        );
        assert_eq!(
            date_with_today("2024-01-15T10:30:00", today()),
            "2024-01-15"
        );
    }

    #[test]
    fn test_date_human_formats() {
        assert_eq!(date_with_today("Jan 5, 2024", today()), "2024-01-05");
        assert_eq!(date_with_today("January 5, 2024", today()), "2024-01-05");
        assert_eq!(date_with_today("5 Jan 2024", today()), "2024-01-05");
        assert_eq!(date_with_today("15 March 2023", today()), "2023-03-15");
        assert_eq!(date_with_today("March 15 2023", today()), "2023-03-15");
    }

    #[test]
    fn test_date_slash_formats_month_first() {
        assert_eq!(date_with_today("03/04/2024", today()), "2024-03-04");
        // Day-first rescues values MDY rejects
        assert_eq!(date_with_today("25/12/2024", today()), "2024-12-25");
    }

    #[test]
    fn test_date_relative_phrases() {
        assert_eq!(date_with_today("3 days ago", today()), "2024-06-12");
        assert_eq!(date_with_today("1 day ago", today()), "2024-06-14");
        assert_eq!(date_with_today("2 weeks ago", today()), "2024-06-01");
        assert_eq!(date_with_today("4 months ago", today()), "2024-02-15");
        assert_eq!(date_with_today("1 year ago", today()), "2023-06-15");
        assert_eq!(date_with_today("2 Years Ago", today()), "2022-06-15");
    }

    #[test]
    fn test_date_today_and_yesterday() {
        assert_eq!(date_with_today("today", today()), "2024-06-15");
        assert_eq!(date_with_today("Today", today()), "2024-06-15");
        assert_eq!(date_with_today("yesterday", today()), "2024-06-14");
    }

    #[test]
    fn test_date_unparseable_passes_through() {
        assert_eq!(date_with_today("gibberish", today()), "gibberish");
        assert_eq!(date_with_today("  gibberish  ", today()), "gibberish");
    }

    #[test]
    fn test_verified_flag() {
        assert!(verified(Some("Verified Purchase")));
        assert!(!verified(Some("   ")));
        assert!(!verified(Some("")));
        assert!(!verified(None));
    }

    #[test]
    fn test_normalize_full_record() {
        let raw = RawRecord {
            rating: "Rated 4 out of 5".to_string(),
            text: "  Good value.\r\n\r\n\r\nWould buy again.  ".to_string(),
            date: "2024-02-10T00:15:00Z".to_string(),
            reviewer_name: " alice ".to_string(),
            title: None,
            verified: Some("Verified".to_string()),
        };

        let canonical = normalize(&raw);
        assert_eq!(canonical.rating, 4.0);
        assert_eq!(canonical.text, "Good value.\n\nWould buy again.");
        assert_eq!(canonical.date, "2024-02-10");
        assert_eq!(canonical.reviewer_name, "alice");
        assert_eq!(canonical.title, "");
        assert!(canonical.verified);
    }
}
