//! Declarative request-parameter filtering and sorting.
//!
//! Each entity describes its filterable fields and sortable columns as a
//! static [`FilterSet`]; the set turns [`FilterParams`] into SQL predicates
//! and an `ORDER BY` clause on a [`QueryBuilder`].

pub mod certification;
pub mod project;
pub mod technology;
pub mod work_experience;

use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::{Postgres, QueryBuilder};

use crate::entities::technology::TagPivot;

/// Parameter names consumed elsewhere and never treated as filters.
pub const RESERVED_PARAMS: &[&str] = &["sort", "direction", "page", "per_page"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
    Text(String),
    List(Vec<String>),
}

impl FilterValue {
    pub fn is_blank(&self) -> bool {
        match self {
            FilterValue::Text(s) => s.trim().is_empty(),
            FilterValue::List(items) => items.iter().all(|s| s.trim().is_empty()),
        }
    }

    /// The scalar value; a list yields its first non-blank entry.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FilterValue::Text(s) => Some(s.trim()).filter(|s| !s.is_empty()),
            FilterValue::List(items) => items.iter().map(|s| s.trim()).find(|s| !s.is_empty()),
        }
    }

    /// Items of a list, or of a comma separated scalar.
    pub fn items(&self) -> Vec<&str> {
        let raw: Vec<&str> = match self {
            FilterValue::Text(s) => s.split(',').collect(),
            FilterValue::List(items) => items.iter().flat_map(|s| s.split(',')).collect(),
        };
        raw.into_iter().map(str::trim).filter(|s| !s.is_empty()).collect()
    }
}

/// Query parameters grouped by name. Repeated keys and `key[]` / `key[N]`
/// forms collapse into a single list value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterParams {
    entries: Vec<(String, FilterValue)>,
}

impl FilterParams {
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut params = FilterParams::default();
        for (raw_key, value) in pairs {
            let (key, bracketed) = match raw_key.find('[') {
                Some(pos) if raw_key.ends_with(']') => (raw_key[..pos].to_string(), true),
                _ => (raw_key, false),
            };
            params.push(key, value, bracketed);
        }
        params
    }

    fn push(&mut self, key: String, value: String, bracketed: bool) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => {
                let merged = match std::mem::replace(existing, FilterValue::List(Vec::new())) {
                    FilterValue::Text(first) => vec![first, value],
                    FilterValue::List(mut items) => {
                        items.push(value);
                        items
                    }
                };
                *existing = FilterValue::List(merged);
            }
            None => {
                let entry = if bracketed { FilterValue::List(vec![value]) } else { FilterValue::Text(value) };
                self.entries.push((key, entry));
            }
        }
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.push(key.to_string(), value.to_string(), false);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FilterValue> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// Non-blank scalar value of `name`.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FilterValue::as_text)
    }

    pub fn parsed<T: FromStr>(&self, name: &str) -> Option<T> {
        self.text(name).and_then(|v| v.parse().ok())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Echo of the non-blank parameters, for list payloads.
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .iter()
            .filter(|(_, v)| !v.is_blank())
            .map(|(k, v)| (k.to_string(), serde_json::to_value(v).unwrap_or(Value::Null)))
            .collect();
        Value::Object(map)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// How one filter parameter constrains the base table.
#[derive(Debug, Clone, Copy)]
pub enum FilterKind {
    /// Case-insensitive substring match on a column.
    Contains(&'static str),
    /// Exact match on the column's text form.
    Equals(&'static str),
    /// Exact match on an integer column; non-numeric input matches nothing.
    EqualsId(&'static str),
    /// `column >= date`.
    OnOrAfter(&'static str),
    /// `column <= date`.
    OnOrBefore(&'static str),
    /// Owner linked to any of the listed technology ids.
    HasTechnology(TagPivot),
}

#[derive(Debug, Clone, Copy)]
pub struct FilterField {
    pub name: &'static str,
    pub kind: FilterKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Column(&'static str),
    /// Name of the first linked technology by pivot sort order.
    FirstTechnology { name: &'static str, pivot: TagPivot },
}

impl SortKey {
    pub fn name(&self) -> &'static str {
        match self {
            SortKey::Column(column) => column,
            SortKey::FirstTechnology { name, .. } => name,
        }
    }
}

/// Per-entity filter and sort configuration.
#[derive(Debug)]
pub struct FilterSet {
    pub table: &'static str,
    pub fields: &'static [FilterField],
    pub sorts: &'static [SortKey],
    pub default_sort: SortKey,
    pub default_direction: SortDirection,
}

impl FilterSet {
    /// Appends ` AND <predicate>` for every recognised, non-blank parameter.
    /// The builder must already end inside a `WHERE` clause.
    pub fn push_predicates(&self, params: &FilterParams, qb: &mut QueryBuilder<'_, Postgres>) {
        for (name, value) in params.iter() {
            if RESERVED_PARAMS.contains(&name) || value.is_blank() {
                continue;
            }
            let Some(field) = self.fields.iter().find(|f| f.name == name) else {
                continue;
            };
            self.push_predicate(field.kind, value, qb);
        }
    }

    fn push_predicate(&self, kind: FilterKind, value: &FilterValue, qb: &mut QueryBuilder<'_, Postgres>) {
        match kind {
            FilterKind::Contains(column) => {
                let Some(text) = value.as_text() else { return };
                qb.push(format!(" AND {}.{} ILIKE ", self.table, column))
                    .push_bind(format!("%{}%", escape_like(text)));
            }
            FilterKind::Equals(column) => {
                let Some(text) = value.as_text() else { return };
                qb.push(format!(" AND {}.{}::TEXT = ", self.table, column))
                    .push_bind(text.to_string());
            }
            FilterKind::EqualsId(column) => {
                let Some(text) = value.as_text() else { return };
                match text.parse::<i64>() {
                    Ok(id) => {
                        qb.push(format!(" AND {}.{} = ", self.table, column)).push_bind(id);
                    }
                    Err(_) => {
                        qb.push(" AND FALSE");
                    }
                }
            }
            FilterKind::OnOrAfter(column) => {
                if let Some(date) = value.as_text().and_then(parse_date) {
                    qb.push(format!(" AND {}.{} >= ", self.table, column)).push_bind(date);
                }
            }
            FilterKind::OnOrBefore(column) => {
                if let Some(date) = value.as_text().and_then(parse_date) {
                    qb.push(format!(" AND {}.{} <= ", self.table, column)).push_bind(date);
                }
            }
            FilterKind::HasTechnology(pivot) => {
                let ids: Vec<i64> = value.items().into_iter().filter_map(|s| s.parse().ok()).collect();
                if ids.is_empty() {
                    return;
                }
                qb.push(format!(
                    " AND EXISTS (SELECT 1 FROM {pivot} tf WHERE tf.{owner} = {table}.id AND tf.technology_id = ANY(",
                    pivot = pivot.table(),
                    owner = pivot.owner_column(),
                    table = self.table
                ))
                .push_bind(ids)
                .push("))");
            }
        }
    }

    /// The requested sort when allowlisted, else the default sort with the
    /// default direction. A bad direction falls back to the default one.
    pub fn resolve_sort(&self, params: &FilterParams) -> (SortKey, SortDirection) {
        let requested = params
            .text("sort")
            .and_then(|name| self.sorts.iter().find(|s| s.name() == name));

        match requested {
            Some(key) => {
                let direction = params
                    .text("direction")
                    .and_then(SortDirection::parse)
                    .unwrap_or(self.default_direction);
                (*key, direction)
            }
            None => (self.default_sort, self.default_direction),
        }
    }

    /// Appends the `ORDER BY` clause with an `id` tiebreaker.
    pub fn push_order(&self, params: &FilterParams, qb: &mut QueryBuilder<'_, Postgres>) {
        let (key, direction) = self.resolve_sort(params);

        match key {
            SortKey::Column(column) => {
                qb.push(format!(" ORDER BY {}.{} {}", self.table, column, direction.as_sql()));
            }
            SortKey::FirstTechnology { pivot, .. } => {
                qb.push(format!(
                    " ORDER BY (SELECT t.name FROM {pivot} tp JOIN technologies t ON t.id = tp.technology_id \
                     WHERE tp.{owner} = {table}.id ORDER BY tp.sort_order, t.id LIMIT 1) {dir} NULLS LAST",
                    pivot = pivot.table(),
                    owner = pivot.owner_column(),
                    table = self.table,
                    dir = direction.as_sql()
                ));
            }
        }

        if key != SortKey::Column("id") {
            qb.push(format!(", {}.id ASC", self.table));
        }
    }
}

/// Escapes LIKE wildcards so user input matches literally.
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

#[cfg(test)]
pub(crate) fn filtered_sql(set: &FilterSet, params: &FilterParams) -> String {
    let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT * FROM {} WHERE TRUE", set.table));
    set.push_predicates(params, &mut qb);
    set.push_order(params, &mut qb);
    qb.sql().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> FilterParams {
        FilterParams::from_pairs(raw.iter().map(|(k, v)| (k.to_string(), v.to_string())))
    }

    #[test]
    fn repeated_and_bracketed_keys_become_lists() {
        let params = pairs(&[
            ("technologies[]", "1"),
            ("technologies[]", "2"),
            ("name", "api"),
            ("tag", "a"),
            ("tag", "b"),
        ]);

        assert_eq!(params.get("technologies"), Some(&FilterValue::List(vec!["1".into(), "2".into()])));
        assert_eq!(params.get("name"), Some(&FilterValue::Text("api".into())));
        assert_eq!(params.get("tag"), Some(&FilterValue::List(vec!["a".into(), "b".into()])));
    }

    #[test]
    fn blank_values_read_as_absent() {
        let params = pairs(&[("name", "  "), ("technologies[]", "")]);

        assert!(params.text("name").is_none());
        assert!(params.get("technologies").is_some_and(FilterValue::is_blank));
        assert_eq!(params.to_json(), serde_json::json!({}));
    }

    #[test]
    fn comma_separated_items_are_split() {
        let value = FilterValue::Text("3, 4,,5".into());
        assert_eq!(value.items(), vec!["3", "4", "5"]);
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }

    #[test]
    fn direction_parsing_is_case_insensitive() {
        assert_eq!(SortDirection::parse("DESC"), Some(SortDirection::Desc));
        assert_eq!(SortDirection::parse(" asc "), Some(SortDirection::Asc));
        assert_eq!(SortDirection::parse("sideways"), None);
    }
}
