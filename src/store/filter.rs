// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Typed query filters.
//!
//! A [`Filter`] is a conjunction of per-field conditions:
//! exact match, case-insensitive pattern, proximity, set membership and
//! field existence.

use regex::{Regex, RegexBuilder};
use serde_json::Value;
use std::cmp::Ordering;

use crate::error::{StoreError, StoreResult};
use crate::types::Location;

use super::Document;

#[derive(Debug, Clone)]
pub enum Condition {
    Eq(Value),
    Regex(Regex),
    Near(Location),
    In(Vec<Value>),
    Exists(bool),
}

impl Condition {
    fn matches(&self, value: Option<&Value>) -> bool {
        match self {
            Condition::Eq(expected) => value.map_or(false, |v| values_equal(v, expected)),
            Condition::Regex(re) => value.and_then(Value::as_str).map_or(false, |s| re.is_match(s)),
            Condition::Near(_) => value.and_then(Location::from_value).is_some(),
            Condition::In(options) => value.map_or(false, |v| options.iter().any(|o| values_equal(v, o))),
            Condition::Exists(expected) => value.is_some() == *expected,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Filter {
    clauses: Vec<(String, Condition)>,
}

impl Filter {
    /// Matches every document.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.clauses.push((field.to_string(), Condition::Eq(value.into())));
        self
    }

    /// Case-insensitive pattern match on a string field.
    pub fn regex(mut self, field: &str, pattern: &str) -> StoreResult<Self> {
        let re = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| StoreError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })?;
        self.clauses.push((field.to_string(), Condition::Regex(re)));
        Ok(self)
    }

    pub fn near(mut self, field: &str, location: Location) -> Self {
        self.clauses.push((field.to_string(), Condition::Near(location)));
        self
    }

    pub fn is_in<I, V>(mut self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.clauses.push((field.to_string(), Condition::In(values)));
        self
    }

    pub fn exists(mut self, field: &str, present: bool) -> Self {
        self.clauses.push((field.to_string(), Condition::Exists(present)));
        self
    }

    pub fn clauses(&self) -> &[(String, Condition)] {
        &self.clauses
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.clauses
            .iter()
            .all(|(field, cond)| cond.matches(doc.get(field)))
    }

    /// First proximity clause, if any.
    pub fn near_clause(&self) -> Option<(&str, Location)> {
        self.clauses.iter().find_map(|(field, cond)| match cond {
            Condition::Near(loc) => Some((field.as_str(), *loc)),
            _ => None,
        })
    }
}

/// Orders the documents for a filter: by distance when it has a proximity
/// clause, then stably by `sort` if given.
pub fn order_documents(docs: &mut [Document], filter: &Filter, sort: Option<&str>) {
    if let Some((field, origin)) = filter.near_clause() {
        let distance = |doc: &Document| {
            doc.get(field)
                .and_then(Location::from_value)
                .map_or(f64::INFINITY, |loc| loc.distance_sq(&origin))
        };
        docs.sort_by(|a, b| distance(a).partial_cmp(&distance(b)).unwrap_or(Ordering::Equal));
    }
    if let Some(key) = sort {
        docs.sort_by(|a, b| compare_values(a.get(key), b.get(key)));
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Number(_)) => 1,
        Some(Value::String(_)) => 2,
        Some(Value::Object(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Bool(_)) => 5,
    }
}

/// Missing and null sort first, then numbers, strings, objects, arrays, booleans.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}
