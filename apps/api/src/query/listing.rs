//! Shared list pipeline: one request's query parameters in, one response
//! payload out.
//!
//! The payload keeps the long-standing dual shape: a bare array when the
//! client asked for no pagination, or `{results, pagination}` when `page`
//! or `limit` was sent. Both forms must continue to be produced.

use std::collections::HashMap;

use serde_json::{json, Value};

use crate::query::filter::{build_filter, FieldSpecs, FilterExpression};
use crate::query::pagination::{
    pagination_metadata, pagination_params, DEFAULT_LIMIT, MAX_LIMIT,
};
use crate::query::sort::{parse_sort_params, SortDirection, SortKey, SortSpec};
use crate::store::{DocumentStore, StoreError};

/// Per-endpoint listing contract: which parameters filter, which fields
/// sort, and the fallback ordering.
pub struct ListingConfig {
    pub specs: &'static FieldSpecs,
    pub allowed_sort: &'static [&'static str],
    pub default_sort: &'static [(&'static str, SortDirection)],
}

impl ListingConfig {
    fn default_sort_spec(&self) -> SortSpec {
        self.default_sort
            .iter()
            .map(|(field, direction)| SortKey {
                field: (*field).to_string(),
                direction: *direction,
            })
            .collect()
    }
}

/// Runs a listing against the store. `base_filter` carries code-driven
/// constraints (ownership scoping) that override anything the request
/// asked for on the same fields.
pub async fn run_listing(
    store: &dyn DocumentStore,
    collection: &str,
    config: &ListingConfig,
    params: &HashMap<String, String>,
    base_filter: FilterExpression,
) -> Result<Value, StoreError> {
    let mut filter = build_filter(config.specs, params);
    filter.merge(base_filter);

    let sort = parse_sort_params(
        params.get("sort").map(String::as_str),
        config.allowed_sort,
        &config.default_sort_spec(),
    );

    let paginated = params.contains_key("page") || params.contains_key("limit");
    if !paginated {
        let docs = store.find(collection, &filter, &sort, 0, None).await?;
        return Ok(Value::Array(docs));
    }

    let page = pagination_params(
        params.get("page").map(String::as_str),
        params.get("limit").map(String::as_str),
        DEFAULT_LIMIT,
        MAX_LIMIT,
    );
    let total_docs = store.count(collection, &filter).await?;
    let results = store
        .find(collection, &filter, &sort, page.skip, Some(page.limit))
        .await?;
    let pagination = pagination_metadata(total_docs, page.page, page.limit);

    Ok(json!({
        "results": results,
        "pagination": pagination,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::filter::{FieldSpec, ValueType};
    use crate::store::MemoryStore;
    use serde_json::json;

    const JOB_LISTING: ListingConfig = ListingConfig {
        specs: &[
            (
                "company",
                FieldSpec {
                    target: "company",
                    value_type: ValueType::String,
                },
            ),
            (
                "skills",
                FieldSpec {
                    target: "skills",
                    value_type: ValueType::Array,
                },
            ),
        ],
        allowed_sort: &["createdAt", "title"],
        default_sort: &[("createdAt", SortDirection::Desc)],
    };

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    async fn seed_jobs(store: &MemoryStore) {
        // Twelve matching documents spread across days, plus two that the
        // filter must exclude.
        for i in 0..12 {
            store
                .insert(
                    "jobs",
                    json!({
                        "id": format!("00000000-0000-0000-0000-0000000000{i:02}"),
                        "title": format!("Engineer {i}"),
                        "company": "HighTech Labs",
                        "skills": ["React", "Node.js", "GraphQL"],
                        "createdAt": format!("2026-03-{:02}T12:00:00Z", i + 1),
                    }),
                )
                .await
                .unwrap();
        }
        store
            .insert(
                "jobs",
                json!({
                    "id": "00000000-0000-0000-0000-000000000050",
                    "title": "Other Co role",
                    "company": "Paper Mill",
                    "skills": ["React", "Node.js"],
                    "createdAt": "2026-03-20T12:00:00Z",
                }),
            )
            .await
            .unwrap();
        store
            .insert(
                "jobs",
                json!({
                    "id": "00000000-0000-0000-0000-000000000051",
                    "title": "Missing skills",
                    "company": "HighTech Labs",
                    "skills": ["React"],
                    "createdAt": "2026-03-21T12:00:00Z",
                }),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_filtered_sorted_paginated_listing() {
        let store = MemoryStore::new();
        seed_jobs(&store).await;

        let payload = run_listing(
            &store,
            "jobs",
            &JOB_LISTING,
            &params(&[
                ("company_like", "tech"),
                ("skills_all", "React,Node.js"),
                ("sort", "createdAt:desc"),
                ("page", "1"),
                ("limit", "5"),
            ]),
            FilterExpression::new(),
        )
        .await
        .unwrap();

        let results = payload["results"].as_array().unwrap();
        assert_eq!(results.len(), 5);
        // Newest first.
        assert_eq!(results[0]["title"], "Engineer 11");
        assert_eq!(results[4]["title"], "Engineer 7");

        let pagination = &payload["pagination"];
        assert_eq!(pagination["page"], 1);
        assert_eq!(pagination["limit"], 5);
        assert_eq!(pagination["totalDocs"], 12);
        assert_eq!(pagination["totalPages"], 3);
        assert_eq!(pagination["hasNextPage"], true);
        assert_eq!(pagination["hasPrevPage"], false);
        assert_eq!(pagination["nextPage"], 2);
        assert!(pagination["prevPage"].is_null());
    }

    #[tokio::test]
    async fn test_no_pagination_params_returns_bare_array() {
        let store = MemoryStore::new();
        seed_jobs(&store).await;

        let payload = run_listing(
            &store,
            "jobs",
            &JOB_LISTING,
            &params(&[("company_like", "tech"), ("skills_all", "React,Node.js")]),
            FilterExpression::new(),
        )
        .await
        .unwrap();

        let results = payload.as_array().expect("bare array");
        assert_eq!(results.len(), 12);
    }

    #[tokio::test]
    async fn test_out_of_range_page_yields_empty_results_not_error() {
        let store = MemoryStore::new();
        seed_jobs(&store).await;

        let payload = run_listing(
            &store,
            "jobs",
            &JOB_LISTING,
            &params(&[("page", "99"), ("limit", "10")]),
            FilterExpression::new(),
        )
        .await
        .unwrap();

        assert_eq!(payload["results"].as_array().unwrap().len(), 0);
        assert_eq!(payload["pagination"]["page"], 99);
    }

    #[tokio::test]
    async fn test_base_filter_overrides_request_params() {
        let store = MemoryStore::new();
        seed_jobs(&store).await;

        let payload = run_listing(
            &store,
            "jobs",
            &JOB_LISTING,
            &params(&[("company", "HighTech Labs")]),
            FilterExpression::eq_str("company", "Paper Mill"),
        )
        .await
        .unwrap();

        let results = payload.as_array().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["title"], "Other Co role");
    }
}
