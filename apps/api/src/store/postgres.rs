//! JSONB-backed Postgres `DocumentStore`.
//!
//! Documents live in a single `documents (collection, id, data)` table.
//! Filter expressions compile to jsonb operators; each comparison carries a
//! `jsonb_typeof` guard so cross-type documents fall out of the result set
//! instead of matching by jsonb type rank, matching the in-memory semantics.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use sqlx::postgres::PgArguments;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::query::filter::{CmpOp, Condition, FilterExpression, Scalar};
use crate::query::sort::{SortDirection, SortSpec};

use super::{document_id, Document, DocumentStore, StoreError};

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the documents table and its GIN index if absent.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id UUID NOT NULL,
                data JSONB NOT NULL,
                PRIMARY KEY (collection, id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS documents_data_idx \
             ON documents USING GIN (data jsonb_path_ops)",
        )
        .execute(&self.pool)
        .await?;

        info!("Document store schema ready");
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn find(
        &self,
        collection: &str,
        filter: &FilterExpression,
        sort: &SortSpec,
        skip: u64,
        limit: Option<u64>,
    ) -> Result<Vec<Document>, StoreError> {
        let compiled = compile_filter(filter);
        let mut sql = format!(
            "SELECT data FROM documents WHERE collection = $1{}",
            compiled.where_suffix()
        );
        sql.push_str(&order_by_clause(sort));
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        if skip > 0 {
            sql.push_str(&format!(" OFFSET {skip}"));
        }

        let query = sqlx::query_scalar::<_, Value>(&sql).bind(collection);
        let docs = push_binds(query, &compiled.binds).fetch_all(&self.pool).await?;
        Ok(docs)
    }

    async fn count(&self, collection: &str, filter: &FilterExpression) -> Result<u64, StoreError> {
        let compiled = compile_filter(filter);
        let sql = format!(
            "SELECT COUNT(*) FROM documents WHERE collection = $1{}",
            compiled.where_suffix()
        );
        let query = sqlx::query_scalar::<_, i64>(&sql).bind(collection);
        let count = push_binds(query, &compiled.binds).fetch_one(&self.pool).await?;
        Ok(count as u64)
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: &FilterExpression,
    ) -> Result<Option<Document>, StoreError> {
        let compiled = compile_filter(filter);
        let sql = format!(
            "SELECT data FROM documents WHERE collection = $1{} LIMIT 1",
            compiled.where_suffix()
        );
        let query = sqlx::query_scalar::<_, Value>(&sql).bind(collection);
        let doc = push_binds(query, &compiled.binds)
            .fetch_optional(&self.pool)
            .await?;
        Ok(doc)
    }

    async fn get(&self, collection: &str, id: Uuid) -> Result<Option<Document>, StoreError> {
        let doc = sqlx::query_scalar::<_, Value>(
            "SELECT data FROM documents WHERE collection = $1 AND id = $2",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(doc)
    }

    async fn insert(&self, collection: &str, doc: Document) -> Result<Document, StoreError> {
        let id = document_id(&doc)?;
        sqlx::query("INSERT INTO documents (collection, id, data) VALUES ($1, $2, $3)")
            .bind(collection)
            .bind(id)
            .bind(&doc)
            .execute(&self.pool)
            .await?;
        Ok(doc)
    }

    async fn update(
        &self,
        collection: &str,
        id: Uuid,
        doc: Document,
    ) -> Result<Option<Document>, StoreError> {
        let result =
            sqlx::query("UPDATE documents SET data = $3 WHERE collection = $1 AND id = $2")
                .bind(collection)
                .bind(id)
                .bind(&doc)
                .execute(&self.pool)
                .await?;
        Ok((result.rows_affected() > 0).then_some(doc))
    }

    async fn delete(&self, collection: &str, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Filter compilation
// ────────────────────────────────────────────────────────────────────────────

enum Bind {
    Text(String),
    Float(f64),
    Bool(bool),
    Timestamp(DateTime<Utc>),
    Jsonb(Value),
}

struct CompiledFilter {
    clauses: Vec<String>,
    binds: Vec<Bind>,
}

impl CompiledFilter {
    fn where_suffix(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" AND {}", self.clauses.join(" AND "))
        }
    }
}

/// jsonb path literal for a dotted field. Field paths come from FieldSpec
/// tables and model code, never from request input.
fn path(field: &str) -> String {
    format!("'{{{}}}'", field.split('.').collect::<Vec<_>>().join(","))
}

fn cmp_sql(op: CmpOp) -> &'static str {
    match op {
        CmpOp::Gt => ">",
        CmpOp::Gte => ">=",
        CmpOp::Lt => "<",
        CmpOp::Lte => "<=",
    }
}

fn compile_filter(filter: &FilterExpression) -> CompiledFilter {
    let mut compiled = CompiledFilter {
        clauses: Vec::new(),
        binds: Vec::new(),
    };
    // $1 is always the collection name.
    for (field, condition) in filter.iter() {
        let clause = compile_condition(field, condition, &mut compiled.binds);
        compiled.clauses.push(clause);
    }
    compiled
}

fn compile_condition(field: &str, condition: &Condition, binds: &mut Vec<Bind>) -> String {
    let p = path(field);
    match condition {
        Condition::Eq(scalar) => compile_eq(&p, scalar, binds),
        Condition::Cmp(op, scalar) => compile_cmp(&p, *op, scalar, binds),
        Condition::In(items) => {
            let clauses: Vec<String> = items
                .iter()
                .map(|scalar| compile_eq(&p, scalar, binds))
                .collect();
            if clauses.is_empty() {
                "FALSE".to_string()
            } else {
                format!("({})", clauses.join(" OR "))
            }
        }
        Condition::ContainsAll(items) => {
            binds.push(Bind::Jsonb(json!(items)));
            format!("data #> {p} @> ${}", binds.len() + 1)
        }
        Condition::Like(needle) => {
            binds.push(Bind::Text(format!("%{}%", escape_like(needle))));
            format!("data #>> {p} ILIKE ${}", binds.len() + 1)
        }
    }
}

fn compile_eq(p: &str, scalar: &Scalar, binds: &mut Vec<Bind>) -> String {
    match scalar {
        Scalar::Str(s) => {
            binds.push(Bind::Text(s.clone()));
            let n = binds.len() + 1;
            // Equality on array fields is element membership.
            format!(
                "(CASE WHEN jsonb_typeof(data #> {p}) = 'array' \
                 THEN data #> {p} @> to_jsonb(${n}::text) \
                 ELSE data #>> {p} = ${n} END)"
            )
        }
        Scalar::Num(n) if n.is_nan() => "FALSE".to_string(),
        Scalar::Num(n) => {
            binds.push(Bind::Float(*n));
            format!("data #> {p} = to_jsonb(${}::float8)", binds.len() + 1)
        }
        Scalar::Bool(b) => {
            binds.push(Bind::Bool(*b));
            format!("data #> {p} = to_jsonb(${}::boolean)", binds.len() + 1)
        }
        // Unparseable operand matches nothing, by contract.
        Scalar::Date(None) => "FALSE".to_string(),
        Scalar::Date(Some(ts)) => {
            binds.push(Bind::Timestamp(*ts));
            // Date fields are RFC 3339 strings written by the models layer,
            // which keeps the timestamptz cast safe.
            format!(
                "(jsonb_typeof(data #> {p}) = 'string' \
                 AND (data #>> {p})::timestamptz = ${})",
                binds.len() + 1
            )
        }
    }
}

fn compile_cmp(p: &str, op: CmpOp, scalar: &Scalar, binds: &mut Vec<Bind>) -> String {
    let sql_op = cmp_sql(op);
    match scalar {
        Scalar::Num(n) if n.is_nan() => "FALSE".to_string(),
        Scalar::Num(n) => {
            binds.push(Bind::Float(*n));
            format!(
                "(jsonb_typeof(data #> {p}) = 'number' \
                 AND data #> {p} {sql_op} to_jsonb(${}::float8))",
                binds.len() + 1
            )
        }
        Scalar::Str(s) => {
            binds.push(Bind::Text(s.clone()));
            format!(
                "(jsonb_typeof(data #> {p}) = 'string' AND data #>> {p} {sql_op} ${})",
                binds.len() + 1
            )
        }
        Scalar::Bool(b) => {
            binds.push(Bind::Bool(*b));
            format!(
                "(jsonb_typeof(data #> {p}) = 'boolean' \
                 AND data #> {p} {sql_op} to_jsonb(${}::boolean))",
                binds.len() + 1
            )
        }
        Scalar::Date(None) => "FALSE".to_string(),
        Scalar::Date(Some(ts)) => {
            binds.push(Bind::Timestamp(*ts));
            format!(
                "(jsonb_typeof(data #> {p}) = 'string' \
                 AND (data #>> {p})::timestamptz {sql_op} ${})",
                binds.len() + 1
            )
        }
    }
}

fn order_by_clause(sort: &SortSpec) -> String {
    if sort.is_empty() {
        return String::new();
    }
    let keys: Vec<String> = sort
        .iter()
        .map(|key| {
            let direction = match key.direction {
                SortDirection::Asc => "ASC",
                SortDirection::Desc => "DESC",
            };
            format!("data #> {} {direction} NULLS LAST", path(&key.field))
        })
        .collect();
    format!(" ORDER BY {}", keys.join(", "))
}

fn escape_like(needle: &str) -> String {
    needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn push_binds<'q, T>(
    mut query: sqlx::query::QueryScalar<'q, sqlx::Postgres, T, PgArguments>,
    binds: &'q [Bind],
) -> sqlx::query::QueryScalar<'q, sqlx::Postgres, T, PgArguments> {
    for bind in binds {
        query = match bind {
            Bind::Text(s) => query.bind(s),
            Bind::Float(f) => query.bind(*f),
            Bind::Bool(b) => query.bind(*b),
            Bind::Timestamp(ts) => query.bind(*ts),
            Bind::Jsonb(v) => query.bind(v),
        };
    }
    query
}
