use chrono::{DateTime, NaiveDateTime, SecondsFormat};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Rewrite a naive timestamp as UTC with an explicit `+00:00` offset.
///
/// Returns `None` when the value needs no change: it already carries an
/// offset, has no time component, or does not parse.
pub fn ensure_timezone_aware(value: &str) -> Option<String> {
    if !value.contains(['T', ' ']) {
        return None;
    }
    if DateTime::parse_from_rfc3339(value).is_ok()
        || DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z").is_ok()
    {
        return None;
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| {
            naive
                .and_utc()
                .to_rfc3339_opts(SecondsFormat::AutoSi, false)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn naive_values_get_utc_offset() {
        assert_eq!(
            ensure_timezone_aware("2024-01-15T10:30:00").as_deref(),
            Some("2024-01-15T10:30:00+00:00")
        );
        assert_eq!(
            ensure_timezone_aware("2024-01-15T10:30:00.250").as_deref(),
            Some("2024-01-15T10:30:00.250+00:00")
        );
        assert_eq!(
            ensure_timezone_aware("2024-01-15 10:30").as_deref(),
            Some("2024-01-15T10:30:00+00:00")
        );
    }

    #[test]
    fn aware_date_only_and_garbage_are_untouched() {
        assert_eq!(ensure_timezone_aware("2024-01-15T10:30:00Z"), None);
        assert_eq!(ensure_timezone_aware("2024-01-15T10:30:00-05:00"), None);
        assert_eq!(ensure_timezone_aware("2024-01-15"), None);
        assert_eq!(ensure_timezone_aware("yesterday at noon"), None);
        assert_eq!(ensure_timezone_aware(""), None);
    }

    #[test]
    fn rewrite_is_stable() {
        let once = ensure_timezone_aware("2023-06-01T08:00:00").unwrap();
        assert_eq!(ensure_timezone_aware(&once), None);
    }
}
