//! City name to IATA location code lookup.
//!
//! The table is an ordered slice so that substring scans are deterministic:
//! when two city names both occur in a query segment, the first table entry
//! wins.

pub const CITY_CODES: &[(&str, &str)] = &[
    ("Jakarta", "CGK"),
    ("Tokyo", "NRT"),
    ("New York", "JFK"),
    ("Los Angeles", "LAX"),
    ("London", "LON"),
    ("Paris", "CDG"),
    ("Singapore", "SIN"),
    ("Sydney", "SYD"),
    ("Dubai", "DXB"),
    ("Bangkok", "BKK"),
    ("Hong Kong", "HKG"),
    ("Beijing", "PEK"),
    ("Seoul", "ICN"),
    ("Kuala Lumpur", "KUL"),
    ("Istanbul", "IST"),
    ("Berlin", "TXL"),
    ("Madrid", "MAD"),
    ("Rome", "FCO"),
    ("Mexico City", "MEX"),
    ("Amsterdam", "AMS"),
    ("Cairo", "CAI"),
    ("Moscow", "SVO"),
    ("Athens", "ATH"),
    ("Copenhagen", "CPH"),
    ("Zurich", "ZRH"),
];

/// Exact, case-sensitive lookup of the location code for a city name.
pub fn code_for(city: &str) -> Option<&'static str> {
    CITY_CODES
        .iter()
        .find(|(name, _)| *name == city)
        .map(|(_, code)| *code)
}

/// Case-insensitive substring scan of a query segment against every known
/// city name. No word-boundary checks: first match in table order wins.
pub fn find_city(segment: &str) -> Option<&'static str> {
    let lower = segment.to_lowercase();
    CITY_CODES
        .iter()
        .map(|(name, _)| *name)
        .find(|name| lower.contains(&name.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_for_known_city() {
        assert_eq!(code_for("Tokyo"), Some("NRT"));
        assert_eq!(code_for("Kuala Lumpur"), Some("KUL"));
    }

    #[test]
    fn test_code_for_unknown_city() {
        assert_eq!(code_for("Atlantis"), None);
    }

    #[test]
    fn test_code_for_is_case_sensitive() {
        assert_eq!(code_for("tokyo"), None);
    }

    #[test]
    fn test_find_city_case_insensitive() {
        assert_eq!(find_city("i live in TOKYO these days"), Some("Tokyo"));
    }

    #[test]
    fn test_find_city_multi_word() {
        assert_eq!(find_city("flights out of new york please"), Some("New York"));
    }

    #[test]
    fn test_find_city_first_table_order_wins() {
        // Both Tokyo and London appear; Tokyo comes first in the table.
        assert_eq!(find_city("tokyo or london"), Some("Tokyo"));
    }

    #[test]
    fn test_find_city_none() {
        assert_eq!(find_city("somewhere warm"), None);
    }

    #[test]
    fn test_find_city_empty_segment() {
        assert_eq!(find_city(""), None);
    }

    #[test]
    fn test_table_codes_unique() {
        for (i, (_, code)) in CITY_CODES.iter().enumerate() {
            assert!(
                !CITY_CODES[i + 1..].iter().any(|(_, c)| c == code),
                "duplicate code {code}"
            );
        }
    }
}
