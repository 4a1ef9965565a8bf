use crate::domain::model::Notification;
use crate::domain::ports::{Backend, Notifier};
use crate::utils::error::{Result, UnitError};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Select { table: String },
    Insert { table: String, row: Value },
    Update { table: String, id: i64, row: Value },
    Delete { table: String, id: i64 },
}

#[derive(Default)]
struct State {
    calls: Vec<Call>,
    rows: HashMap<String, Vec<Value>>,
    failing: HashSet<String>,
    next_id: i64,
}

/// In-memory backend that records every attempted call, in order.
#[derive(Clone, Default)]
pub struct RecordingBackend {
    state: Arc<Mutex<State>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        let backend = Self::default();
        backend.state.lock().unwrap().next_id = 100;
        backend
    }

    pub fn seed_rows(&self, table: &str, rows: Vec<Value>) {
        self.state
            .lock()
            .unwrap()
            .rows
            .insert(table.to_string(), rows);
    }

    /// Every call against `table` fails from now on.
    pub fn fail_on(&self, table: &str) {
        self.state.lock().unwrap().failing.insert(table.to_string());
    }

    /// Undoes `fail_on`.
    pub fn heal(&self, table: &str) {
        self.state.lock().unwrap().failing.remove(table);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Calls other than selects.
    pub fn writes(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, Call::Select { .. }))
            .collect()
    }

    fn record(&self, table: &str, call: Call) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        if state.failing.contains(table) {
            return Err(UnitError::BackendError {
                table: table.to_string(),
                status: 500,
                message: "simulated failure".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Backend for RecordingBackend {
    async fn select(
        &self,
        table: &str,
        _columns: &str,
        _eq: &[(&str, String)],
    ) -> Result<Vec<Value>> {
        self.record(
            table,
            Call::Select {
                table: table.to_string(),
            },
        )?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .rows
            .get(table)
            .cloned()
            .unwrap_or_default())
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value> {
        self.record(
            table,
            Call::Insert {
                table: table.to_string(),
                row: row.clone(),
            },
        )?;
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let mut created = row;
        created["id"] = json!(state.next_id);
        Ok(created)
    }

    async fn update(&self, table: &str, id: i64, row: Value) -> Result<()> {
        self.record(
            table,
            Call::Update {
                table: table.to_string(),
                id,
                row,
            },
        )
    }

    async fn delete(&self, table: &str, id: i64) -> Result<()> {
        self.record(
            table,
            Call::Delete {
                table: table.to_string(),
                id,
            },
        )
    }
}

#[derive(Clone, Default)]
pub struct RecordingNotifier {
    seen: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub fn seen(&self) -> Vec<Notification> {
        self.seen.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.seen.lock().unwrap().push(notification);
    }
}
