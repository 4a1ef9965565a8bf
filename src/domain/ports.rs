use crate::domain::model::Notification;
use crate::utils::error::Result;
use async_trait::async_trait;
use serde_json::Value;

pub const UNIT_TABLE: &str = "unidade";
pub const SERVED_TABLE: &str = "unidade_ceps_atende";
pub const EXCLUDED_TABLE: &str = "unidade_ceps_nao_atende";
pub const BLOCKED_TABLE: &str = "unit_blocked_ceps";

/// Remote relational data service, one request per call.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Rows of `table` whose columns equal every `(column, value)` pair.
    async fn select(&self, table: &str, columns: &str, eq: &[(&str, String)])
        -> Result<Vec<Value>>;

    /// Inserts `row` and returns the created row, generated columns included.
    async fn insert(&self, table: &str, row: Value) -> Result<Value>;

    async fn update(&self, table: &str, id: i64, row: Value) -> Result<()>;

    async fn delete(&self, table: &str, id: i64) -> Result<()>;
}

/// User-facing toast sink.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

pub trait BackendConfig: Send + Sync {
    fn backend_url(&self) -> &str;
    fn api_key(&self) -> &str;
    fn timeout_seconds(&self) -> u64;
}
