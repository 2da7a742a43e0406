//! Typed domain models. Each one round-trips through the document store as
//! camelCase JSON; timestamps serialize as RFC 3339, which the store's
//! filter compiler relies on.

pub mod application;
pub mod job;
pub mod profile;
pub mod saved_job;
pub mod user;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::store::{Document, StoreError};

pub fn to_document<T: Serialize>(value: &T) -> Result<Document, StoreError> {
    Ok(serde_json::to_value(value)?)
}

pub fn from_document<T: DeserializeOwned>(doc: Document) -> Result<T, StoreError> {
    Ok(serde_json::from_value(doc)?)
}
