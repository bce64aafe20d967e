/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Parse an identifier taken from a URL or token payload.
///
/// Malformed input resolves to `None` so lookups treat it as "absent"
/// instead of failing the request with a parse error.
pub fn parse_db_id(raw: &str) -> Option<DbId> {
    raw.trim().parse::<DbId>().ok().filter(|id| *id > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_positive_ids() {
        assert_eq!(parse_db_id("42"), Some(42));
        assert_eq!(parse_db_id(" 7 "), Some(7));
    }

    #[test]
    fn malformed_ids_are_absent() {
        assert_eq!(parse_db_id("abc"), None);
        assert_eq!(parse_db_id(""), None);
        assert_eq!(parse_db_id("0"), None);
        assert_eq!(parse_db_id("-3"), None);
        assert_eq!(parse_db_id("65f1c0ffee"), None);
    }
}
