//! Access to the remote tabular store that owns every board record.
//!
//! The store speaks JSON rows. [`TableStore`] is the seam between the board and
//! whatever backs it: [`RestStore`] talks to a PostgREST-style service over
//! HTTP and [`MemoryStore`] keeps tables in process.

pub mod memory;
pub mod rest;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub use memory::MemoryStore;
pub use rest::RestStore;

pub mod tables {
    pub const ORGANIZATIONS: &str = "organizations";
    pub const DEPARTMENTS: &str = "departments";
    pub const TEAMS: &str = "teams";
    pub const OKRS: &str = "okrs";
    pub const KEY_RESULTS: &str = "key_results";
    pub const PROFILES: &str = "profiles";
}

/// Embed expression for OKR reads: every column, nested key results and the
/// assignee's display name.
pub const OKR_SELECT: &str = "*,key_results(*),profiles:assigned_user_id(full_name)";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Store rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("Unexpected row shape in {table}: {source}")]
    Decode {
        table: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Store returned no row for insert into {0}")]
    MissingRow(String),
}

impl StoreError {
    /// Message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

#[async_trait]
pub trait TableStore: Send + Sync {
    /// All rows of `table`, ascending by `order_by` when given.
    async fn select(&self, table: &str, order_by: Option<&str>) -> Result<Vec<Value>, StoreError>;

    /// OKR rows with `key_results` embedded and `profiles.full_name` joined
    /// through `assigned_user_id`, restricted to one row when `id` is given.
    async fn select_okrs(&self, id: Option<&str>) -> Result<Vec<Value>, StoreError>;

    /// Insert rows and return them as stored, ids included.
    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>, StoreError>;

    /// Merge `patch` into the row with the given id. Unknown ids are a no-op.
    async fn update(&self, table: &str, id: &str, patch: Value) -> Result<(), StoreError>;

    /// Delete the row with the given id. Dependent rows follow the store's own
    /// referential rules.
    async fn delete(&self, table: &str, id: &str) -> Result<(), StoreError>;

    /// Id of the authenticated user, if any.
    async fn current_user_id(&self) -> Result<Option<String>, StoreError>;
}

pub fn decode_rows<T: DeserializeOwned>(table: &str, rows: Vec<Value>) -> Result<Vec<T>, StoreError> {
    rows.into_iter()
        .map(|row| {
            serde_json::from_value(row).map_err(|source| StoreError::Decode {
                table: table.to_string(),
                source,
            })
        })
        .collect()
}
