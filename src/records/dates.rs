//! Date parsing for extracted records.
//!
//! Accepts `DD/MM/YYYY` and `YYYY-MM-DD`. Text holding several dates, such as
//! `(1) 21/02/1961. (2) 21/01/1961.`, yields the first valid one.

use chrono::NaiveDate;

const FORMATS: &[(&str, DateShape)] = &[("%d/%m/%Y", DateShape::DayFirst), ("%Y-%m-%d", DateShape::Iso)];

#[derive(Clone, Copy)]
enum DateShape {
    /// `dd/dd/dddd`
    DayFirst,
    /// `dddd-dd-dd`
    Iso,
}

impl DateShape {
    fn matches(self, window: &[u8]) -> bool {
        let (sep, sep_at): (u8, &[usize]) = match self {
            DateShape::DayFirst => (b'/', &[2, 5]),
            DateShape::Iso => (b'-', &[4, 7]),
        };
        window.len() == 10
            && window.iter().enumerate().all(|(i, b)| {
                if sep_at.contains(&i) { *b == sep } else { b.is_ascii_digit() }
            })
    }
}

/// Parse the first recognisable date in `text`.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    for (fmt, _) in FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, fmt) {
            return Some(date);
        }
    }

    let bytes = text.as_bytes();
    for start in 0..bytes.len().saturating_sub(9) {
        let window = &bytes[start..start + 10];
        // Do not start inside a longer digit run ("121/02/1961").
        if start > 0 && bytes[start - 1].is_ascii_digit() {
            continue;
        }
        if bytes.get(start + 10).is_some_and(u8::is_ascii_digit) {
            continue;
        }
        for (fmt, shape) in FORMATS {
            if !shape.matches(window) {
                continue;
            }
            // The window is pure ASCII once a shape matches.
            let Ok(candidate) = std::str::from_utf8(window) else { continue };
            if let Ok(date) = NaiveDate::parse_from_str(candidate, fmt) {
                return Some(date);
            }
        }
    }
    None
}

/// ISO `YYYY-MM-DD` form of the first date in `text`.
pub fn to_iso(text: &str) -> Option<String> {
    parse_date(text).map(|d| d.format("%Y-%m-%d").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_first_format() {
        assert_eq!(to_iso("25/03/2024").as_deref(), Some("2024-03-25"));
        assert_eq!(to_iso(" 01/12/1980 ").as_deref(), Some("1980-12-01"));
    }

    #[test]
    fn iso_format() {
        assert_eq!(to_iso("2024-03-25").as_deref(), Some("2024-03-25"));
    }

    #[test]
    fn compound_text_takes_first_date() {
        assert_eq!(
            to_iso("(1) 21/02/1961. (2) 21/01/1961.").as_deref(),
            Some("1961-02-21")
        );
        assert_eq!(to_iso("Date designated: 2022-05-04").as_deref(), Some("2022-05-04"));
    }

    #[test]
    fn invalid_calendar_dates_are_skipped() {
        assert_eq!(to_iso("00/00/1961"), None);
        assert_eq!(to_iso("(1) 31/02/1961 (2) 01/03/1961").as_deref(), Some("1961-03-01"));
    }

    #[test]
    fn partial_dates_do_not_parse() {
        assert_eq!(to_iso("1961"), None);
        assert_eq!(to_iso("--/--/1961"), None);
        assert_eq!(to_iso("March 1961"), None);
        assert_eq!(to_iso(""), None);
    }

    #[test]
    fn embedded_in_longer_digit_run_is_ignored() {
        assert_eq!(to_iso("121/02/19612"), None);
    }

    #[test]
    fn non_ascii_text_is_safe() {
        assert_eq!(to_iso("дата: 21/02/1961").as_deref(), Some("1961-02-21"));
    }
}
