use serde::{Serialize, Deserialize};
use uuid::Uuid;
use chrono::{Duration, Utc};

pub const MAX_OPAQUE_LEN: usize = 1024;

// Execution-duration hint carried for the dispatcher; milliseconds.
pub const DEFAULT_TIMEOUT_MS: i64 = 25_000;

// Sortable as a raw string and parseable by SQLite datetime()/julianday().
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Job {
  pub id: String,
  #[serde(rename = "workerName")]
  pub worker_name: String,
  pub active: bool,
  pub payload: String,
  #[serde(rename = "metaData")]
  pub meta_data: String,
  pub attempts: i64,
  pub created: String,
  pub scheduled_for: String,
  pub failed: String,
  pub timeout: i64,
  pub priority: i64,
}

impl Job {
  pub fn new(worker_name: impl Into<String>, payload: impl Into<String>) -> Self {
    let now = now_timestamp();
    Self {
      id: Uuid::new_v4().to_string(),
      worker_name: worker_name.into(),
      active: false,
      payload: payload.into(),
      meta_data: String::new(),
      attempts: 0,
      created: now.clone(),
      scheduled_for: now,
      failed: String::new(),
      timeout: DEFAULT_TIMEOUT_MS,
      priority: 0,
    }
  }
}

pub fn now_timestamp() -> String {
  Utc::now().format(TIMESTAMP_FORMAT).to_string()
}

pub fn timestamp_after(seconds: i64) -> String {
  (Utc::now() + Duration::seconds(seconds))
    .format(TIMESTAMP_FORMAT)
    .to_string()
}
