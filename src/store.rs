use sqlx::SqlitePool;
use tracing::debug;

use crate::database::setup_database;
use crate::error::QueueError;
use crate::models::{Job, MAX_OPAQUE_LEN};

const ELIGIBLE: &str = "active = 0 AND failed = '' AND datetime('now') >= datetime(scheduled_for)";

pub struct JobStore {
  pool: SqlitePool,
}

impl JobStore {
  pub async fn connect(database_url: &str) -> Result<Self, QueueError> {
    let pool = setup_database(database_url).await?;
    Ok(Self { pool })
  }

  pub fn new(pool: SqlitePool) -> Self {
    Self { pool }
  }

  pub async fn enqueue(&self, job: &Job) -> Result<(), QueueError> {
    validate_opaque("payload", &job.payload)?;
    validate_opaque("meta_data", &job.meta_data)?;
    sqlx::query(
      "INSERT INTO job (id, worker_name, active, payload, meta_data, attempts, created, failed, timeout, priority, scheduled_for)
       VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&job.id)
    .bind(&job.worker_name)
    .bind(job.active)
    .bind(&job.payload)
    .bind(&job.meta_data)
    .bind(job.attempts)
    .bind(&job.created)
    .bind(&job.failed)
    .bind(job.timeout)
    .bind(job.priority)
    .bind(&job.scheduled_for)
    .execute(&self.pool)
    .await
    .map_err(|e| match &e {
      sqlx::Error::Database(db) if db.is_unique_violation() => {
        QueueError::DuplicateId(job.id.clone())
      }
      _ => QueueError::Storage(e),
    })?;
    debug!("Job {} enqueued for worker {}", job.id, job.worker_name);
    Ok(())
  }

  pub async fn list_all(&self) -> Result<Vec<Job>, QueueError> {
    let jobs = sqlx::query_as::<_, Job>(
      "SELECT * FROM job WHERE datetime('now') >= datetime(scheduled_for)
       ORDER BY priority DESC, created ASC",
    )
    .fetch_all(&self.pool)
    .await?;
    Ok(jobs)
  }

  pub async fn list_active(&self) -> Result<Vec<Job>, QueueError> {
    let jobs = sqlx::query_as::<_, Job>("SELECT * FROM job WHERE active = 1")
      .fetch_all(&self.pool)
      .await?;
    Ok(jobs)
  }

  pub async fn next_eligible(&self) -> Result<Option<Job>, QueueError> {
    let job = sqlx::query_as::<_, Job>(&format!(
      "SELECT * FROM job WHERE {ELIGIBLE} ORDER BY priority DESC, created ASC LIMIT 1",
    ))
    .fetch_optional(&self.pool)
    .await?;
    Ok(job)
  }

  pub async fn next_eligible_batch(&self, worker: &str, count: u32) -> Result<Vec<Job>, QueueError> {
    let jobs = sqlx::query_as::<_, Job>(&format!(
      "SELECT * FROM job WHERE {ELIGIBLE} AND worker_name = ?
       ORDER BY priority DESC, created ASC LIMIT ?",
    ))
    .bind(worker)
    .bind(count as i64)
    .fetch_all(&self.pool)
    .await?;
    Ok(jobs)
  }

  // Marks the best eligible job active and returns it in one statement, so
  // two concurrent dispatch loops can never claim the same job.
  pub async fn claim_next(&self) -> Result<Option<Job>, QueueError> {
    let job = sqlx::query_as::<_, Job>(&format!(
      "UPDATE job SET active = 1 WHERE id = (
         SELECT id FROM job WHERE {ELIGIBLE} ORDER BY priority DESC, created ASC LIMIT 1
       ) RETURNING *",
    ))
    .fetch_optional(&self.pool)
    .await?;
    if let Some(job) = &job {
      debug!("Job {} claimed", job.id);
    }
    Ok(job)
  }

  pub async fn next_scheduled_delay(&self) -> Result<Option<f64>, QueueError> {
    let seconds = sqlx::query_scalar::<_, f64>(
      "SELECT (julianday(scheduled_for) - julianday('now')) * 86400.0 FROM job
       WHERE datetime(scheduled_for) > datetime('now') AND failed = ''
       ORDER BY datetime(scheduled_for) ASC LIMIT 1",
    )
    .fetch_optional(&self.pool)
    .await?;
    Ok(seconds)
  }

  pub async fn update(&self, job: &Job) -> Result<(), QueueError> {
    validate_opaque("meta_data", &job.meta_data)?;
    sqlx::query(
      "UPDATE job SET active = ?, failed = ?, meta_data = ?, attempts = ?, scheduled_for = ?
       WHERE id = ?",
    )
    .bind(job.active)
    .bind(&job.failed)
    .bind(&job.meta_data)
    .bind(job.attempts)
    .bind(&job.scheduled_for)
    .bind(&job.id)
    .execute(&self.pool)
    .await?;
    Ok(())
  }

  pub async fn remove(&self, job: &Job) -> Result<(), QueueError> {
    sqlx::query("DELETE FROM job WHERE id = ?")
      .bind(&job.id)
      .execute(&self.pool)
      .await?;
    Ok(())
  }

  pub async fn remove_by_worker(&self, worker: &str) -> Result<(), QueueError> {
    let result = sqlx::query("DELETE FROM job WHERE worker_name = ?")
      .bind(worker)
      .execute(&self.pool)
      .await?;
    debug!("Removed {} jobs for worker {}", result.rows_affected(), worker);
    Ok(())
  }
}

fn validate_opaque(field: &str, value: &str) -> Result<(), QueueError> {
  if value.len() > MAX_OPAQUE_LEN {
    return Err(QueueError::Validation(format!(
      "{} exceeds {} bytes ({})",
      field,
      MAX_OPAQUE_LEN,
      value.len()
    )));
  }
  Ok(())
}
