//! Query Filter Builder — turns flat request query parameters into a
//! structured filter expression against the document store.
//!
//! Each endpoint declares its filterable fields as a `FieldSpec` table; the
//! builder is deliberately permissive: unknown parameters, empty values, and
//! unparseable operands never fail a request. A value that cannot be coerced
//! to its declared type degrades to a condition that matches nothing.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde_json::Value;

/// Parameters reserved for pagination, sorting, and projection.
/// Never interpreted as filters.
pub const RESERVED_PARAMS: [&str; 4] = ["page", "limit", "sort", "fields"];

/// Declared type of a filterable field. Drives operand coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    String,
    Number,
    Boolean,
    Date,
    Array,
}

/// Maps an external query-parameter name to a document field.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Dotted path into the document, e.g. `salary.min`.
    pub target: &'static str,
    pub value_type: ValueType,
}

/// Per-endpoint table of `(parameter name, FieldSpec)`.
pub type FieldSpecs = [(&'static str, FieldSpec)];

/// A coerced filter operand. Coercion failures are encoded, not raised:
/// `Num(NaN)` and `Date(None)` are legal values that no document matches.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Str(String),
    Num(f64),
    Bool(bool),
    Date(Option<DateTime<Utc>>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Gt,
    Gte,
    Lt,
    Lte,
}

/// One condition on one document field. The closed set of operator variants
/// the parameter parser can produce.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Exact match. On array fields this is element membership.
    Eq(Scalar),
    /// Range comparison.
    Cmp(CmpOp, Scalar),
    /// Set membership over a comma-separated list.
    In(Vec<Scalar>),
    /// Array field contains every listed element.
    ContainsAll(Vec<String>),
    /// Case-insensitive substring match on a string field.
    Like(String),
}

/// Mapping from document field path to the condition it must satisfy.
/// Built fresh per request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterExpression(BTreeMap<String, Condition>);

impl FilterExpression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, condition: Condition) {
        self.0.insert(field.into(), condition);
    }

    /// Convenience for code-driven equality filters (lookups by email,
    /// userId, token digest, ...).
    pub fn eq_str(field: impl Into<String>, value: impl Into<String>) -> Self {
        let mut expr = Self::new();
        expr.insert(field, Condition::Eq(Scalar::Str(value.into())));
        expr
    }

    pub fn get(&self, field: &str) -> Option<&Condition> {
        self.0.get(field)
    }

    /// Folds `other` into `self`; conditions in `other` win on conflict.
    /// Used to pin code-driven constraints (ownership scoping) over
    /// request-driven filters.
    pub fn merge(&mut self, other: FilterExpression) {
        self.0.extend(other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Condition)> {
        self.0.iter()
    }

    /// Canonical match semantics, used by the in-memory store. The SQL
    /// compiler in `store::postgres` must agree with this function.
    pub fn matches(&self, doc: &Value) -> bool {
        self.0
            .iter()
            .all(|(field, condition)| condition_matches(doc, field, condition))
    }
}

/// How a parameter name maps onto an operator, decided by its suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParamOp {
    Cmp(CmpOp),
    In,
    All,
    Like,
    Exact,
}

/// Suffixes in precedence order. `_gte`/`_lte` must be tried before their
/// two-letter prefixes.
const SUFFIXES: [(&str, ParamOp); 7] = [
    ("_gte", ParamOp::Cmp(CmpOp::Gte)),
    ("_gt", ParamOp::Cmp(CmpOp::Gt)),
    ("_lte", ParamOp::Cmp(CmpOp::Lte)),
    ("_lt", ParamOp::Cmp(CmpOp::Lt)),
    ("_in", ParamOp::In),
    ("_all", ParamOp::All),
    ("_like", ParamOp::Like),
];

fn split_param(name: &str) -> (&str, ParamOp) {
    for (suffix, op) in SUFFIXES {
        if let Some(base) = name.strip_suffix(suffix) {
            if !base.is_empty() {
                return (base, op);
            }
        }
    }
    (name, ParamOp::Exact)
}

/// Builds a filter expression from raw query parameters.
///
/// Reserved parameters and empty values are skipped. Parameters whose base
/// name (after suffix stripping) has no FieldSpec are dropped silently, as
/// are operator/type combinations that do not apply (`_all` on a non-array,
/// `_like` on a non-string).
pub fn build_filter(specs: &FieldSpecs, params: &HashMap<String, String>) -> FilterExpression {
    let mut expr = FilterExpression::new();
    for (name, raw) in params {
        if RESERVED_PARAMS.contains(&name.as_str()) || raw.is_empty() {
            continue;
        }
        let (base, op) = split_param(name);
        let Some(spec) = specs.iter().find(|(param, _)| *param == base).map(|(_, s)| s) else {
            continue;
        };
        if let Some(condition) = compile_condition(spec, op, raw) {
            expr.insert(spec.target, condition);
        }
    }
    expr
}

fn compile_condition(spec: &FieldSpec, op: ParamOp, raw: &str) -> Option<Condition> {
    match op {
        ParamOp::Cmp(cmp) => Some(Condition::Cmp(cmp, coerce(spec.value_type, raw))),
        ParamOp::In => Some(Condition::In(
            raw.split(',').map(|v| coerce(spec.value_type, v)).collect(),
        )),
        ParamOp::All if spec.value_type == ValueType::Array => Some(Condition::ContainsAll(
            raw.split(',').map(|v| v.trim().to_string()).collect(),
        )),
        ParamOp::Like if spec.value_type == ValueType::String => {
            Some(Condition::Like(raw.to_string()))
        }
        ParamOp::Exact => Some(Condition::Eq(coerce(spec.value_type, raw))),
        // Suffix does not apply to the declared type: drop, don't error.
        ParamOp::All | ParamOp::Like => None,
    }
}

fn coerce(value_type: ValueType, raw: &str) -> Scalar {
    match value_type {
        ValueType::String => Scalar::Str(raw.to_string()),
        // Unparseable numbers become NaN: every comparison is false.
        ValueType::Number => Scalar::Num(raw.parse::<f64>().unwrap_or(f64::NAN)),
        ValueType::Boolean => Scalar::Bool(raw == "true"),
        ValueType::Date => Scalar::Date(parse_date(raw)),
        // A single value against an array field filters by membership.
        ValueType::Array => Scalar::Str(raw.to_string()),
    }
}

/// Accepts RFC 3339 timestamps and bare `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    raw.parse::<NaiveDate>()
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN).and_utc())
}

/// Resolves a dotted field path inside a document.
pub fn lookup_path<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(doc, |value, segment| value.get(segment))
}

fn condition_matches(doc: &Value, field: &str, condition: &Condition) -> bool {
    let value = lookup_path(doc, field);
    match condition {
        Condition::Eq(scalar) => value.is_some_and(|v| scalar_eq(v, scalar)),
        Condition::Cmp(op, scalar) => value.is_some_and(|v| scalar_cmp(v, *op, scalar)),
        Condition::In(items) => value.is_some_and(|v| items.iter().any(|s| scalar_eq(v, s))),
        Condition::ContainsAll(items) => match value {
            Some(Value::Array(elements)) => items
                .iter()
                .all(|item| elements.iter().any(|e| e.as_str() == Some(item))),
            _ => false,
        },
        Condition::Like(needle) => {
            let needle = needle.to_lowercase();
            value
                .and_then(Value::as_str)
                .is_some_and(|s| s.to_lowercase().contains(&needle))
        }
    }
}

fn scalar_eq(value: &Value, scalar: &Scalar) -> bool {
    match scalar {
        Scalar::Str(want) => match value {
            Value::String(have) => have == want,
            Value::Array(elements) => elements.iter().any(|e| e.as_str() == Some(want)),
            _ => false,
        },
        Scalar::Num(want) => value.as_f64().is_some_and(|have| have == *want),
        Scalar::Bool(want) => value.as_bool() == Some(*want),
        Scalar::Date(Some(want)) => value
            .as_str()
            .and_then(parse_date)
            .is_some_and(|have| have == *want),
        Scalar::Date(None) => false,
    }
}

fn scalar_cmp(value: &Value, op: CmpOp, scalar: &Scalar) -> bool {
    use std::cmp::Ordering;

    let ordering = match scalar {
        Scalar::Num(want) => value.as_f64().and_then(|have| have.partial_cmp(want)),
        Scalar::Str(want) => value.as_str().map(|have| have.cmp(want.as_str())),
        Scalar::Bool(want) => value.as_bool().map(|have| have.cmp(want)),
        Scalar::Date(Some(want)) => value
            .as_str()
            .and_then(parse_date)
            .map(|have| have.cmp(want)),
        Scalar::Date(None) => None,
    };
    match ordering {
        None => false,
        Some(ordering) => match op {
            CmpOp::Gt => ordering == Ordering::Greater,
            CmpOp::Gte => ordering != Ordering::Less,
            CmpOp::Lt => ordering == Ordering::Less,
            CmpOp::Lte => ordering != Ordering::Greater,
        },
    }
}
