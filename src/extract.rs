//! Heuristic slot extraction from free-text queries.
//!
//! Pulls origin city, destination city, and departure date out of a message
//! using string markers and a date pattern. Anything that fails to parse is
//! reported as absent rather than an error.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use tracing::debug;

use crate::cities;

const DATE_FORMAT: &str = "%Y-%m-%d";

// ISO date, "Month Day", or "Day Month", optionally preceded by "on ".
static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(on\s+)?(\d{4}-\d{2}-\d{2}|\w+\s+\d{1,2}|\d{1,2}\s+\w+)")
        .expect("Invalid date regex")
});

/// Slots extracted from a single message. Absent fields simply were not
/// recognized in the text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedSlots {
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub date: Option<String>,
}

/// Find a date expression in the query and normalize it to `YYYY-MM-DD`.
///
/// Word dates without a year ("March 5") match the pattern but fail
/// normalization, so they come back as `None`.
pub fn extract_date(query: &str) -> Option<String> {
    let caps = DATE_RE.captures(query)?;
    let raw = caps.get(2)?.as_str().trim();
    match NaiveDate::parse_from_str(raw, DATE_FORMAT) {
        Ok(date) => Some(date.format(DATE_FORMAT).to_string()),
        Err(_) => {
            debug!(raw, "date expression did not normalize");
            None
        }
    }
}

/// Extract origin, destination, and date from a query.
///
/// Origin and destination require the literal markers `from` and `to`: the
/// origin is looked up in the segment between `from` and the last `to`, the
/// destination in the segment after the last `to`. The date is extracted
/// independently of the markers.
pub fn extract_flight_details(query: &str) -> ExtractedSlots {
    let normalized = query.to_lowercase();
    let date = extract_date(&normalized);

    let mut origin = None;
    let mut destination = None;

    if normalized.contains("from") && normalized.contains("to") {
        if let Some((_, after_from)) = normalized.split_once("from") {
            if let Some((origin_part, destination_part)) = after_from.rsplit_once("to") {
                origin = cities::find_city(origin_part).map(str::to_string);
                destination = cities::find_city(destination_part).map(str::to_string);
            }
        }
    }

    ExtractedSlots {
        origin,
        destination,
        date,
    }
}
