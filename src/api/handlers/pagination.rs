//! Shared pagination types for list endpoints.
//!
//! List handlers accept optional `limit`/`skip` query parameters and pass
//! them to the service layer, which applies defaults and bounds checking.

use serde::Deserialize;
use utoipa::IntoParams;

/// Pagination query parameters shared by the list endpoints.
///
/// Both fields are optional; the service substitutes configured defaults
/// and rejects non-positive limits and negative skips.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ListQuery {
    /// Maximum number of items to return
    pub limit: Option<i64>,
    /// Number of items to skip
    pub skip: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_fields_are_optional() {
        let query: ListQuery = serde_json::from_str("{}").expect("deserialize");
        assert!(query.limit.is_none());
        assert!(query.skip.is_none());
    }

    #[test]
    fn test_list_query_parses_values() {
        let query: ListQuery =
            serde_json::from_str(r#"{"limit": 25, "skip": 10}"#).expect("deserialize");
        assert_eq!(query.limit, Some(25));
        assert_eq!(query.skip, Some(10));
    }
}
