//! Sort Parameter Parser — `?sort=field:direction,field2` against a
//! per-endpoint allow-list.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// One `(field, direction)` pair. Field is a document path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Ordered sort specification; the first key is the primary sort.
pub type SortSpec = Vec<SortKey>;

/// Parses a comma-separated `field:direction` list. Direction is optional
/// and case-insensitive, defaulting to ascending. Tokens naming fields
/// outside the allow-list are dropped silently; when nothing survives the
/// default is returned verbatim.
pub fn parse_sort_params(
    raw: Option<&str>,
    allowed_fields: &[&str],
    default_sort: &SortSpec,
) -> SortSpec {
    let Some(raw) = raw else {
        return default_sort.clone();
    };

    let mut spec = SortSpec::new();
    for token in raw.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let (field, direction) = match token.split_once(':') {
            Some((field, direction)) => (field, parse_direction(direction)),
            None => (token, SortDirection::Asc),
        };
        if !allowed_fields.contains(&field) {
            continue;
        }
        spec.push(SortKey {
            field: field.to_string(),
            direction,
        });
    }

    if spec.is_empty() {
        default_sort.clone()
    } else {
        spec
    }
}

fn parse_direction(raw: &str) -> SortDirection {
    if raw.eq_ignore_ascii_case("desc") {
        SortDirection::Desc
    } else {
        SortDirection::Asc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_sort() -> SortSpec {
        vec![SortKey::desc("createdAt")]
    }

    const ALLOWED: &[&str] = &["title", "createdAt"];

    #[test]
    fn test_disallowed_fields_are_dropped() {
        let spec = parse_sort_params(Some("title:asc,unknownField:desc"), ALLOWED, &default_sort());
        assert_eq!(spec, vec![SortKey::asc("title")]);
    }

    #[test]
    fn test_absent_input_returns_default_verbatim() {
        let spec = parse_sort_params(None, ALLOWED, &default_sort());
        assert_eq!(spec, default_sort());
    }

    #[test]
    fn test_all_tokens_invalid_returns_default() {
        let spec = parse_sort_params(Some("nope:desc,also_nope"), ALLOWED, &default_sort());
        assert_eq!(spec, default_sort());
    }

    #[test]
    fn test_token_order_is_preserved() {
        let spec = parse_sort_params(Some("createdAt:desc,title"), ALLOWED, &default_sort());
        assert_eq!(spec, vec![SortKey::desc("createdAt"), SortKey::asc("title")]);
    }

    #[test]
    fn test_direction_is_case_insensitive_and_defaults_to_asc() {
        let spec = parse_sort_params(Some("title:DESC,createdAt"), ALLOWED, &default_sort());
        assert_eq!(spec, vec![SortKey::desc("title"), SortKey::asc("createdAt")]);
    }

    #[test]
    fn test_empty_string_returns_default() {
        let spec = parse_sort_params(Some(""), ALLOWED, &default_sort());
        assert_eq!(spec, default_sort());
    }
}
