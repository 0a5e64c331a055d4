//! Metadata Store (spec.md §4.1): dimension tables with race-free upserts,
//! fact tables for run-time and result telemetry. Postgres via `sqlx`,
//! since spec.md §6 names a Postgres-flavored upsert (`ON CONFLICT DO
//! NOTHING`) directly.

pub mod error;
pub mod schema;

use eas_lib::telemetry::{ResultRecord, RunTimeRecord};
use error::{StoreError, StoreResult};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::path::PathBuf;

/// One of the five dimension tables (spec.md §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Job,
    TdaCode,
    Server,
    Target,
    Task,
}

impl Dimension {
    fn table(self) -> &'static str {
        match self {
            Dimension::Job => "eas_jobs",
            Dimension::TdaCode => "eas_tda_codes",
            Dimension::Server => "eas_servers",
            Dimension::Target => "eas_targets",
            Dimension::Task => "eas_tasks",
        }
    }
}

/// Thin wrapper over a connection pool, cloned per drain/worker per spec.md
/// §5's shared-resource policy (the pool itself is the only thing shared
/// across worker processes).
#[derive(Clone)]
pub struct MetadataStore {
    pool: PgPool,
    archive_root: PathBuf,
}

impl MetadataStore {
    /// `archive_root` is the same directory the worker's Arena writes
    /// `archive` artifacts under; extended result payloads are staged at
    /// `archive_root/scratch` and relocated to `archive_root/results`.
    pub async fn connect(dsn: &str, archive_root: impl Into<PathBuf>) -> StoreResult<Self> {
        let pool = PgPoolOptions::new().max_connections(10).connect(dsn).await?;
        Ok(MetadataStore {
            pool,
            archive_root: archive_root.into(),
        })
    }

    fn scratch_dir(&self) -> PathBuf {
        self.archive_root.join("scratch")
    }

    fn output_dir(&self) -> PathBuf {
        self.archive_root.join("results")
    }

    /// Moves a staged extended payload from the scratch directory into the
    /// output directory, addressed by its deterministic filename (spec.md
    /// §4.1/§6). A no-op if the file was never staged locally (e.g. a
    /// record replayed from a previous run, or a remote worker's staging
    /// area this process can't see).
    fn relocate_extended_payload(&self, filename: &str) -> StoreResult<()> {
        let source = self.scratch_dir().join(filename);
        if !source.exists() {
            return Ok(());
        }
        let output_dir = self.output_dir();
        std::fs::create_dir_all(&output_dir)?;
        std::fs::rename(&source, output_dir.join(filename))?;
        Ok(())
    }

    pub async fn ensure_schema(&self, drop_if_exists: bool) -> StoreResult<()> {
        schema::ensure_schema(&self.pool, drop_if_exists).await
    }

    /// Race-free upsert: dimension names are unique, repeated inserts
    /// return the existing id (spec.md §3 invariant 2 / §8 property 1).
    pub async fn get_or_create_id(&self, dimension: Dimension, name: &str) -> StoreResult<i64> {
        let table = dimension.table();
        sqlx::query(&format!(
            "INSERT INTO {table} (name) VALUES ($1) ON CONFLICT (name) DO NOTHING"
        ))
        .bind(name)
        .execute(&self.pool)
        .await?;

        let row: (i64,) = sqlx::query_as(&format!("SELECT id FROM {table} WHERE name = $1"))
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    pub async fn insert_run_time(&self, record: &RunTimeRecord) -> StoreResult<()> {
        let job_id = self.get_or_create_id(Dimension::Job, &record.job_name).await?;
        let code_id = self
            .get_or_create_id(Dimension::TdaCode, &record.tda_code)
            .await?;
        let server_id = self
            .get_or_create_id(Dimension::Server, &hostname())
            .await?;
        let target_id = self
            .get_or_create_id(Dimension::Target, &record.target_name)
            .await?;
        let task_id = self.get_or_create_id(Dimension::Task, &record.task_name).await?;

        sqlx::query(
            "INSERT INTO eas_run_times
                (job_id, code_id, server_id, target_id, task_id, timestamp,
                 run_time_wall_clock, run_time_cpu, run_time_cpu_inc_children)
             VALUES ($1, $2, $3, $4, $5, to_timestamp($6), $7, $8, $9)",
        )
        .bind(job_id)
        .bind(code_id)
        .bind(server_id)
        .bind(target_id)
        .bind(task_id)
        .bind(record.timestamp)
        .bind(record.wall)
        .bind(record.cpu_self)
        .bind(record.cpu_with_children)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn insert_result(
        &self,
        record: &ResultRecord,
        extended_payload_filename: Option<&str>,
    ) -> StoreResult<()> {
        let job_id = self.get_or_create_id(Dimension::Job, &record.job_name).await?;
        let code_id = self
            .get_or_create_id(Dimension::TdaCode, &record.tda_code)
            .await?;
        let server_id = self.get_or_create_id(Dimension::Server, &hostname()).await?;
        let target_id = self
            .get_or_create_id(Dimension::Target, &record.target_name)
            .await?;
        let task_id = self.get_or_create_id(Dimension::Task, &record.task_name).await?;

        let filename = extended_payload_filename.or(record.extended_artifact_name.as_deref());
        if let Some(filename) = filename {
            self.relocate_extended_payload(filename)?;
        }

        // Inline the summary only below the 1MB threshold (spec.md §4.1);
        // above it, keep only the filename reference.
        const INLINE_THRESHOLD_BYTES: usize = 1_000_000;
        let serialized_len = serde_json::to_vec(&record.result_summary_json)?.len();
        let results = if serialized_len < INLINE_THRESHOLD_BYTES {
            record.result_summary_json.clone()
        } else {
            serde_json::Value::Null
        };

        sqlx::query(
            "INSERT INTO eas_results
                (job_id, code_id, server_id, target_id, task_id, timestamp, results, result_filename)
             VALUES ($1, $2, $3, $4, $5, to_timestamp($6), $7, $8)",
        )
        .bind(job_id)
        .bind(code_id)
        .bind(server_id)
        .bind(target_id)
        .bind(task_id)
        .bind(record.timestamp)
        .bind(&results)
        .bind(filename)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn hostname() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown-server".to_string())
}
