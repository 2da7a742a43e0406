//! Pagination Calculator — offset/limit derivation and page metadata.
//!
//! Clamping lives server-side: a client can never request a zero or
//! unbounded page size. An out-of-range page yields an empty result set,
//! not an error.

use serde::Serialize;

pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationParams {
    pub page: u64,
    pub limit: u64,
    pub skip: u64,
}

/// Derived page metadata for list envelopes. Computed fresh each request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMetadata {
    pub page: u64,
    pub limit: u64,
    pub total_docs: u64,
    pub total_pages: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
    pub next_page: Option<u64>,
    pub prev_page: Option<u64>,
}

/// Parses raw `page`/`limit` values. Missing or non-numeric input falls back
/// to `1` / `default_limit`; results are clamped into `[1, max_limit]`.
pub fn pagination_params(
    raw_page: Option<&str>,
    raw_limit: Option<&str>,
    default_limit: u64,
    max_limit: u64,
) -> PaginationParams {
    let page = raw_page
        .and_then(|p| p.parse::<i64>().ok())
        .filter(|p| *p >= 1)
        .unwrap_or(1) as u64;

    let limit = raw_limit
        .and_then(|l| l.parse::<i64>().ok())
        .map(|l| if l < 1 { default_limit as i64 } else { l })
        .unwrap_or(default_limit as i64)
        .min(max_limit as i64) as u64;

    PaginationParams {
        page,
        limit,
        skip: (page - 1) * limit,
    }
}

/// Pure metadata derivation from a total count.
pub fn pagination_metadata(total_docs: u64, page: u64, limit: u64) -> PaginationMetadata {
    let total_pages = total_docs.div_ceil(limit.max(1));
    let has_next_page = page < total_pages;
    let has_prev_page = page > 1;
    PaginationMetadata {
        page,
        limit,
        total_docs,
        total_pages,
        has_next_page,
        has_prev_page,
        next_page: has_next_page.then_some(page + 1),
        prev_page: has_prev_page.then_some(page - 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_is_page_minus_one_times_limit() {
        let p = pagination_params(Some("3"), Some("20"), DEFAULT_LIMIT, MAX_LIMIT);
        assert_eq!(p.page, 3);
        assert_eq!(p.limit, 20);
        assert_eq!(p.skip, 40);
    }

    #[test]
    fn test_zero_and_negative_page_clamp_to_one() {
        assert_eq!(pagination_params(Some("0"), None, 10, 100).page, 1);
        assert_eq!(pagination_params(Some("-4"), None, 10, 100).page, 1);
    }

    #[test]
    fn test_non_numeric_input_falls_back() {
        let p = pagination_params(Some("abc"), Some("xyz"), 10, 100);
        assert_eq!(p.page, 1);
        assert_eq!(p.limit, 10);
        assert_eq!(p.skip, 0);
    }

    #[test]
    fn test_limit_clamping() {
        assert_eq!(pagination_params(None, Some("0"), 10, 100).limit, 10);
        assert_eq!(pagination_params(None, Some("-5"), 10, 100).limit, 10);
        assert_eq!(pagination_params(None, Some("500"), 10, 100).limit, 100);
    }

    #[test]
    fn test_missing_values_default() {
        let p = pagination_params(None, None, 25, 100);
        assert_eq!(p.page, 1);
        assert_eq!(p.limit, 25);
    }

    #[test]
    fn test_metadata_middle_page() {
        let m = pagination_metadata(25, 2, 10);
        assert_eq!(m.total_pages, 3);
        assert!(m.has_next_page);
        assert!(m.has_prev_page);
        assert_eq!(m.next_page, Some(3));
        assert_eq!(m.prev_page, Some(1));
    }

    #[test]
    fn test_metadata_last_page() {
        let m = pagination_metadata(25, 3, 10);
        assert!(!m.has_next_page);
        assert_eq!(m.next_page, None);
        assert!(m.has_prev_page);
        assert_eq!(m.prev_page, Some(2));
    }

    #[test]
    fn test_metadata_empty_result_set() {
        let m = pagination_metadata(0, 1, 10);
        assert_eq!(m.total_pages, 0);
        assert!(!m.has_next_page);
        assert!(!m.has_prev_page);
        assert_eq!(m.next_page, None);
        assert_eq!(m.prev_page, None);
    }

    #[test]
    fn test_metadata_serializes_camel_case() {
        let m = pagination_metadata(12, 1, 5);
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["totalDocs"], 12);
        assert_eq!(json["totalPages"], 3);
        assert_eq!(json["hasNextPage"], true);
        assert_eq!(json["hasPrevPage"], false);
        assert_eq!(json["nextPage"], 2);
        assert!(json["prevPage"].is_null());
    }
}
