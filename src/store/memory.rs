use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{tables, StoreError, TableStore};

/// Child rows removed together with their parent: (parent table, child table,
/// foreign key column).
const CASCADES: &[(&str, &str, &str)] = &[(tables::OKRS, tables::KEY_RESULTS, "okr_id")];

/// In-process tables with the same read/write semantics as the remote store.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Vec<Value>>>,
    user_id: Option<String>,
    calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Build a store from a JSON object mapping table names to row arrays.
    pub fn from_seed(seed: Value) -> Result<Self, StoreError> {
        let Value::Object(map) = seed else {
            return Err(StoreError::Rejected {
                status: 400,
                message: "seed must be an object of table name to rows".to_string(),
            });
        };

        let mut tables = HashMap::new();
        for (table, rows) in map {
            let Value::Array(rows) = rows else {
                return Err(StoreError::Rejected {
                    status: 400,
                    message: format!("seed table {table} must be an array"),
                });
            };
            tables.insert(table, rows);
        }

        Ok(Self {
            tables: RwLock::new(tables),
            ..Self::default()
        })
    }

    pub fn load_seed(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let seed: Value = serde_json::from_str(&raw)?;
        Ok(Self::from_seed(seed)?)
    }

    /// Number of store operations issued so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

fn field_eq(row: &Value, field: &str, expected: &str) -> bool {
    row.get(field).and_then(Value::as_str) == Some(expected)
}

fn sort_key(row: &Value, field: &str) -> String {
    match row.get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

#[async_trait]
impl TableStore for MemoryStore {
    async fn select(&self, table: &str, order_by: Option<&str>) -> Result<Vec<Value>, StoreError> {
        self.record_call();
        let data = self.tables.read().await;
        let mut rows = data.get(table).cloned().unwrap_or_default();
        if let Some(field) = order_by {
            rows.sort_by_key(|row| sort_key(row, field));
        }
        Ok(rows)
    }

    async fn select_okrs(&self, id: Option<&str>) -> Result<Vec<Value>, StoreError> {
        self.record_call();
        let data = self.tables.read().await;
        let empty = Vec::new();
        let okrs = data.get(tables::OKRS).unwrap_or(&empty);
        let key_results = data.get(tables::KEY_RESULTS).unwrap_or(&empty);
        let profiles = data.get(tables::PROFILES).unwrap_or(&empty);

        let rows = okrs
            .iter()
            .filter(|okr| id.map_or(true, |id| field_eq(okr, "id", id)))
            .map(|okr| {
                let mut row = okr.clone();
                let id = okr.get("id").and_then(Value::as_str).unwrap_or_default();

                let embedded: Vec<Value> = key_results
                    .iter()
                    .filter(|kr| field_eq(kr, "okr_id", id))
                    .cloned()
                    .collect();

                let profile = okr
                    .get("assigned_user_id")
                    .and_then(Value::as_str)
                    .and_then(|user_id| profiles.iter().find(|p| field_eq(p, "id", user_id)))
                    .map(|p| {
                        serde_json::json!({
                            "full_name": p.get("full_name").cloned().unwrap_or(Value::Null)
                        })
                    })
                    .unwrap_or(Value::Null);

                if let Value::Object(map) = &mut row {
                    map.insert("key_results".to_string(), Value::Array(embedded));
                    map.insert("profiles".to_string(), profile);
                }
                row
            })
            .collect();

        Ok(rows)
    }

    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>, StoreError> {
        self.record_call();

        let mut stored = Vec::with_capacity(rows.len());
        for row in rows {
            let Value::Object(mut map) = row else {
                return Err(StoreError::Rejected {
                    status: 400,
                    message: format!("row for {table} must be an object"),
                });
            };
            if !map.get("id").is_some_and(Value::is_string) {
                map.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
            }
            stored.push(Value::Object(map));
        }

        let mut data = self.tables.write().await;
        data
            .entry(table.to_string())
            .or_default()
            .extend(stored.iter().cloned());

        Ok(stored)
    }

    async fn update(&self, table: &str, id: &str, patch: Value) -> Result<(), StoreError> {
        self.record_call();
        let Value::Object(patch) = patch else {
            return Err(StoreError::Rejected {
                status: 400,
                message: "patch must be an object".to_string(),
            });
        };

        let mut data = self.tables.write().await;
        if let Some(Value::Object(row)) = data
            .get_mut(table)
            .and_then(|rows| rows.iter_mut().find(|row| field_eq(row, "id", id)))
        {
            row.extend(patch);
        }
        Ok(())
    }

    async fn delete(&self, table: &str, id: &str) -> Result<(), StoreError> {
        self.record_call();
        let mut data = self.tables.write().await;

        if let Some(rows) = data.get_mut(table) {
            rows.retain(|row| !field_eq(row, "id", id));
        }
        for (parent, child, foreign_key) in CASCADES {
            if *parent == table {
                if let Some(rows) = data.get_mut(*child) {
                    rows.retain(|row| !field_eq(row, foreign_key, id));
                }
            }
        }
        Ok(())
    }

    async fn current_user_id(&self) -> Result<Option<String>, StoreError> {
        self.record_call();
        Ok(self.user_id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn seeded() -> MemoryStore {
        MemoryStore::from_seed(json!({
            "organizations": [
                { "id": "o2", "name": "Zeta" },
                { "id": "o1", "name": "Acme" }
            ],
            "profiles": [ { "id": "u1", "full_name": "Ada Lovelace" } ],
            "okrs": [
                { "id": "k1", "title": "Ship", "team_id": "t1", "assigned_user_id": "u1" },
                { "id": "k2", "title": "Hire", "team_id": "t1" }
            ],
            "key_results": [
                { "id": "r1", "okr_id": "k1", "title": "v1 out" },
                { "id": "r2", "okr_id": "k2", "title": "3 engineers" }
            ]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_select_ordering() {
        let store = seeded();
        let rows = store.select(tables::ORGANIZATIONS, Some("name")).await.unwrap();
        let names: Vec<_> = rows.iter().map(|r| r["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["Acme", "Zeta"]);

        let unordered = store.select(tables::ORGANIZATIONS, None).await.unwrap();
        assert_eq!(unordered[0]["name"], "Zeta");

        assert!(store.select("missing", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_select_okrs_embeds_and_joins() {
        let store = seeded();
        let rows = store.select_okrs(None).await.unwrap();

        assert_eq!(rows[0]["key_results"].as_array().unwrap().len(), 1);
        assert_eq!(rows[0]["profiles"]["full_name"], "Ada Lovelace");
        assert!(rows[1]["profiles"].is_null());

        let single = store.select_okrs(Some("k2")).await.unwrap();
        assert_eq!(single.len(), 1);
        assert_eq!(single[0]["key_results"][0]["title"], "3 engineers");
        assert!(store.select_okrs(Some("nope")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_insert_assigns_ids() {
        let store = MemoryStore::new();
        let rows = store
            .insert(tables::TEAMS, vec![json!({ "name": "Core", "department_id": "d1" })])
            .await
            .unwrap();

        let id = rows[0]["id"].as_str().unwrap();
        assert!(Uuid::parse_str(id).is_ok());
        assert_eq!(store.select(tables::TEAMS, None).await.unwrap(), rows);
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let store = seeded();
        store
            .update(tables::OKRS, "k2", json!({ "status": "completed" }))
            .await
            .unwrap();
        store
            .update(tables::OKRS, "nope", json!({ "status": "completed" }))
            .await
            .unwrap();

        let rows = store.select(tables::OKRS, None).await.unwrap();
        assert_eq!(rows[1]["status"], "completed");
        assert_eq!(rows[1]["title"], "Hire");
    }

    #[tokio::test]
    async fn test_delete_cascades_to_key_results() {
        let store = seeded();
        store.delete(tables::OKRS, "k1").await.unwrap();

        let okrs = store.select(tables::OKRS, None).await.unwrap();
        assert_eq!(okrs.len(), 1);
        let key_results = store.select(tables::KEY_RESULTS, None).await.unwrap();
        assert_eq!(key_results.len(), 1);
        assert_eq!(key_results[0]["okr_id"], "k2");
    }

    #[tokio::test]
    async fn test_call_counter() {
        let store = MemoryStore::new().with_user("u1");
        assert_eq!(store.calls(), 0);
        assert_eq!(store.current_user_id().await.unwrap().as_deref(), Some("u1"));
        assert_eq!(store.calls(), 1);
    }

    #[test]
    fn test_seed_shape_is_checked() {
        assert!(MemoryStore::from_seed(json!([])).is_err());
        assert!(MemoryStore::from_seed(json!({ "teams": {} })).is_err());
    }
}
