use chrono::NaiveDateTime;

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format an API datetime string for display.
/// The API emits RFC 3339 for creation timestamps but deadlines arrive
/// as bare `YYYY-MM-DDTHH:MM`, so both shapes are handled.
pub fn format_datetime(value: &str) -> String {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(value) {
        return dt.format("%b %d, %Y %H:%M").to_string();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return dt.format("%b %d, %Y %H:%M").to_string();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M") {
        return dt.format("%b %d, %Y %H:%M").to_string();
    }
    value.to_string()
}

/// Format a date-only view of an API datetime string.
pub fn format_date(value: &str) -> String {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(value) {
        dt.format("%b %d, %Y").to_string()
    } else if value.len() >= 10 {
        value.chars().take(10).collect()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Hello", 10), "Hello");
        assert_eq!(truncate_string("Hello World", 8), "Hello...");
        assert_eq!(truncate_string("Hi", 2), "Hi");
    }

    #[test]
    fn test_format_datetime_rfc3339() {
        assert_eq!(
            format_datetime("2025-09-18T18:00:00+00:00"),
            "Sep 18, 2025 18:00"
        );
    }

    #[test]
    fn test_format_datetime_local_shape() {
        // datetime-local inputs have no seconds and no offset
        assert_eq!(format_datetime("2025-09-18T18:00"), "Sep 18, 2025 18:00");
    }

    #[test]
    fn test_format_datetime_passthrough() {
        assert_eq!(format_datetime("soon"), "soon");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("2025-09-18T18:00:00Z"), "Sep 18, 2025");
        assert_eq!(format_date("2025-09-18T18:00"), "2025-09-18");
    }
}
