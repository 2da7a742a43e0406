//! In-memory `DocumentStore`. Backs the test suite and API-key-less local
//! runs; mirrors the Postgres backend's ordering semantics (jsonb type
//! ranks, missing sort fields last in both directions).

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::query::filter::{lookup_path, FilterExpression};
use crate::query::sort::{SortDirection, SortSpec};

use super::{document_id, Document, DocumentStore, StoreError};

#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_collection<T>(&self, collection: &str, f: impl FnOnce(&[Document]) -> T) -> T {
        let collections = self.collections.read().expect("store lock poisoned");
        f(collections.get(collection).map(Vec::as_slice).unwrap_or(&[]))
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find(
        &self,
        collection: &str,
        filter: &FilterExpression,
        sort: &SortSpec,
        skip: u64,
        limit: Option<u64>,
    ) -> Result<Vec<Document>, StoreError> {
        let mut matches = self.with_collection(collection, |docs| {
            docs.iter()
                .filter(|doc| filter.matches(doc))
                .cloned()
                .collect::<Vec<_>>()
        });
        matches.sort_by(|a, b| compare_documents(a, b, sort));
        let docs = matches
            .into_iter()
            .skip(skip as usize)
            .take(limit.map(|l| l as usize).unwrap_or(usize::MAX))
            .collect();
        Ok(docs)
    }

    async fn count(&self, collection: &str, filter: &FilterExpression) -> Result<u64, StoreError> {
        Ok(self.with_collection(collection, |docs| {
            docs.iter().filter(|doc| filter.matches(doc)).count() as u64
        }))
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: &FilterExpression,
    ) -> Result<Option<Document>, StoreError> {
        Ok(self.with_collection(collection, |docs| {
            docs.iter().find(|doc| filter.matches(doc)).cloned()
        }))
    }

    async fn get(&self, collection: &str, id: Uuid) -> Result<Option<Document>, StoreError> {
        let id = id.to_string();
        Ok(self.with_collection(collection, |docs| {
            docs.iter()
                .find(|doc| doc.get("id").and_then(Value::as_str) == Some(id.as_str()))
                .cloned()
        }))
    }

    async fn insert(&self, collection: &str, doc: Document) -> Result<Document, StoreError> {
        document_id(&doc)?;
        let mut collections = self.collections.write().expect("store lock poisoned");
        collections
            .entry(collection.to_string())
            .or_default()
            .push(doc.clone());
        Ok(doc)
    }

    async fn update(
        &self,
        collection: &str,
        id: Uuid,
        doc: Document,
    ) -> Result<Option<Document>, StoreError> {
        let id = id.to_string();
        let mut collections = self.collections.write().expect("store lock poisoned");
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(None);
        };
        for existing in docs.iter_mut() {
            if existing.get("id").and_then(Value::as_str) == Some(id.as_str()) {
                *existing = doc.clone();
                return Ok(Some(doc));
            }
        }
        Ok(None)
    }

    async fn delete(&self, collection: &str, id: Uuid) -> Result<bool, StoreError> {
        let id = id.to_string();
        let mut collections = self.collections.write().expect("store lock poisoned");
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(false);
        };
        let before = docs.len();
        docs.retain(|doc| doc.get("id").and_then(Value::as_str) != Some(id.as_str()));
        Ok(docs.len() < before)
    }
}

fn compare_documents(a: &Document, b: &Document, sort: &SortSpec) -> Ordering {
    for key in sort {
        let va = lookup_path(a, &key.field);
        let vb = lookup_path(b, &key.field);
        let ordering = match (va, vb) {
            (None, None) => Ordering::Equal,
            // Missing fields sort last in both directions, like NULLS LAST.
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(va), Some(vb)) => match key.direction {
                SortDirection::Asc => compare_values(va, vb),
                SortDirection::Desc => compare_values(va, vb).reverse(),
            },
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// jsonb-style cross-type ordering: null < bool < number < string < array
/// < object, numeric within numbers, lexicographic within strings.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        _ => rank(a).cmp(&rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::filter::{Condition, Scalar};
    use crate::query::sort::SortKey;
    use serde_json::json;

    fn doc(id: &str, title: &str, salary: i64) -> Document {
        json!({
            "id": format!("00000000-0000-0000-0000-0000000000{id}"),
            "title": title,
            "salary": {"min": salary},
        })
    }

    #[tokio::test]
    async fn test_insert_then_get_round_trips() {
        let store = MemoryStore::new();
        let inserted = store.insert("jobs", doc("01", "Engineer", 100)).await.unwrap();
        let id = document_id(&inserted).unwrap();
        let fetched = store.get("jobs", id).await.unwrap().unwrap();
        assert_eq!(fetched, inserted);
    }

    #[tokio::test]
    async fn test_insert_without_id_is_rejected() {
        let store = MemoryStore::new();
        let err = store.insert("jobs", json!({"title": "x"})).await.unwrap_err();
        assert!(matches!(err, StoreError::MissingId));
    }

    #[tokio::test]
    async fn test_find_filters_sorts_and_paginates() {
        let store = MemoryStore::new();
        store.insert("jobs", doc("01", "A", 50)).await.unwrap();
        store.insert("jobs", doc("02", "B", 90)).await.unwrap();
        store.insert("jobs", doc("03", "C", 70)).await.unwrap();

        let mut filter = FilterExpression::new();
        filter.insert(
            "salary.min",
            Condition::Cmp(crate::query::filter::CmpOp::Gte, Scalar::Num(60.0)),
        );
        let sort = vec![SortKey::desc("salary.min")];

        let page = store.find("jobs", &filter, &sort, 0, Some(1)).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0]["title"], "B");

        let rest = store.find("jobs", &filter, &sort, 1, Some(10)).await.unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0]["title"], "C");

        assert_eq!(store.count("jobs", &filter).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_missing_sort_field_orders_last_in_both_directions() {
        let store = MemoryStore::new();
        store.insert("jobs", doc("01", "A", 50)).await.unwrap();
        store
            .insert(
                "jobs",
                json!({"id": "00000000-0000-0000-0000-000000000099", "title": "no-salary"}),
            )
            .await
            .unwrap();

        let filter = FilterExpression::new();
        for sort in [vec![SortKey::asc("salary.min")], vec![SortKey::desc("salary.min")]] {
            let docs = store.find("jobs", &filter, &sort, 0, None).await.unwrap();
            assert_eq!(docs.last().unwrap()["title"], "no-salary");
        }
    }

    #[tokio::test]
    async fn test_update_replaces_and_delete_removes() {
        let store = MemoryStore::new();
        let inserted = store.insert("jobs", doc("01", "Engineer", 100)).await.unwrap();
        let id = document_id(&inserted).unwrap();

        let mut replacement = inserted.clone();
        replacement["title"] = json!("Staff Engineer");
        let updated = store.update("jobs", id, replacement).await.unwrap().unwrap();
        assert_eq!(updated["title"], "Staff Engineer");

        assert!(store.delete("jobs", id).await.unwrap());
        assert!(!store.delete("jobs", id).await.unwrap());
        assert!(store.get("jobs", id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_unknown_id_returns_none() {
        let store = MemoryStore::new();
        let missing = store
            .update("jobs", Uuid::new_v4(), doc("01", "X", 1))
            .await
            .unwrap();
        assert!(missing.is_none());
    }
}
