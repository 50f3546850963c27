use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::info;

use crate::error::QueueError;

// The literal default 'now' is resolved by datetime() at query time.
const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS job (
  id            TEXT PRIMARY KEY NOT NULL,
  worker_name   TEXT NOT NULL,
  active        INTEGER NOT NULL,
  payload       TEXT,
  meta_data     TEXT,
  attempts      INTEGER NOT NULL,
  created       TEXT,
  scheduled_for TEXT NOT NULL DEFAULT 'now',
  failed        TEXT,
  timeout       INTEGER NOT NULL,
  priority      INTEGER NOT NULL
);";

pub async fn setup_database(database_url: &str) -> Result<SqlitePool, QueueError> {
  let options = SqliteConnectOptions::from_str(database_url)
    .map_err(QueueError::Unavailable)?
    .create_if_missing(true);

  // Single connection: the store is single-writer embedded storage, and an
  // in-memory database only stays coherent on one connection.
  let pool = SqlitePoolOptions::new()
    .max_connections(1)
    .connect_with(options)
    .await
    .map_err(QueueError::Unavailable)?;

  sqlx::query(SCHEMA)
    .execute(&pool)
    .await
    .map_err(QueueError::Unavailable)?;
  info!("Job table ready");
  Ok(pool)
}
