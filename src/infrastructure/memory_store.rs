//! 内存行存储
//!
//! 按与远端相同的语义执行 `RowQuery`，用于测试和本地演示。

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use async_trait::async_trait;
use chrono::DateTime;
use serde_json::{Map, Value as JsonValue};
use tokio::sync::RwLock;

use crate::error::AppResult;
use crate::infrastructure::row_query::{wildcard_match, Filter, RowQuery};
use crate::infrastructure::store::RowStore;

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Vec<JsonValue>>>,
    next_id: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置若干行
    pub fn with_rows(mut self, table: &str, rows: impl IntoIterator<Item = JsonValue>) -> Self {
        self.tables
            .get_mut()
            .entry(table.to_string())
            .or_default()
            .extend(rows);
        self
    }

    /// 表中当前所有行
    pub async fn rows(&self, table: &str) -> Vec<JsonValue> {
        self.tables
            .read()
            .await
            .get(table)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl RowStore for MemoryStore {
    async fn select(&self, query: &RowQuery) -> AppResult<Vec<JsonValue>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<JsonValue> = tables
            .get(query.table())
            .map(|rows| {
                rows.iter()
                    .filter(|row| query.filters().iter().all(|f| filter_matches(row, f)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if !query.ordering().is_empty() {
            rows.sort_by(|a, b| {
                for order in query.ordering() {
                    let ord = compare_values(a.get(&order.column), b.get(&order.column));
                    let ord = if order.descending { ord.reverse() } else { ord };
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                Ordering::Equal
            });
        }

        let offset = query.offset_value().unwrap_or(0);
        let limit = query.limit_value().unwrap_or(usize::MAX);

        Ok(rows
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|row| project(row, query.columns()))
            .collect())
    }

    async fn insert(&self, table: &str, mut row: JsonValue) -> AppResult<JsonValue> {
        if let Some(obj) = row.as_object_mut() {
            if obj.get("id").map_or(true, JsonValue::is_null) {
                let id = self.next_id.fetch_add(1, AtomicOrdering::SeqCst) + 1;
                obj.insert("id".to_string(), JsonValue::from(id));
            }
        }

        self.tables
            .write()
            .await
            .entry(table.to_string())
            .or_default()
            .push(row.clone());

        Ok(row)
    }
}

fn text_of(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn filter_matches(row: &JsonValue, filter: &Filter) -> bool {
    match filter {
        Filter::ILike { column, pattern } => row
            .get(column)
            .and_then(text_of)
            .is_some_and(|text| wildcard_match(&text, pattern)),
        Filter::Eq { column, value } => row
            .get(column)
            .and_then(text_of)
            .is_some_and(|text| &text == value),
    }
}

fn compare_values(a: Option<&JsonValue>, b: Option<&JsonValue>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(JsonValue::Number(x)), Some(JsonValue::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        // 时间戳的小数位数不固定，按时间而不是字符串比较
        (Some(JsonValue::String(x)), Some(JsonValue::String(y))) => {
            match (DateTime::parse_from_rfc3339(x), DateTime::parse_from_rfc3339(y)) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => x.cmp(y),
            }
        }
        (Some(x), Some(y)) => text_of(x).cmp(&text_of(y)),
    }
}

fn project(row: JsonValue, columns: &[String]) -> JsonValue {
    if columns.is_empty() {
        return row;
    }
    match row {
        JsonValue::Object(obj) => {
            let projected: Map<String, JsonValue> = obj
                .into_iter()
                .filter(|(key, _)| columns.contains(key))
                .collect();
            JsonValue::Object(projected)
        }
        other => other,
    }
}
