//! DDL for the five dimension tables and two fact tables (spec.md §6).

use crate::error::StoreResult;
use sqlx::PgPool;

const DIMENSION_TABLES: &[&str] = &["eas_jobs", "eas_tda_codes", "eas_servers", "eas_targets", "eas_tasks"];

pub async fn ensure_schema(pool: &PgPool, drop_if_exists: bool) -> StoreResult<()> {
    if drop_if_exists {
        sqlx::query("DROP TABLE IF EXISTS eas_results CASCADE")
            .execute(pool)
            .await?;
        sqlx::query("DROP TABLE IF EXISTS eas_run_times CASCADE")
            .execute(pool)
            .await?;
        for table in DIMENSION_TABLES {
            sqlx::query(&format!("DROP TABLE IF EXISTS {table} CASCADE"))
                .execute(pool)
                .await?;
        }
    }

    for table in DIMENSION_TABLES {
        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                id BIGSERIAL PRIMARY KEY,
                name TEXT NOT NULL UNIQUE
            )"
        ))
        .execute(pool)
        .await?;
    }

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS eas_run_times (
            run_id BIGSERIAL PRIMARY KEY,
            job_id BIGINT NOT NULL REFERENCES eas_jobs(id),
            code_id BIGINT NOT NULL REFERENCES eas_tda_codes(id),
            server_id BIGINT NOT NULL REFERENCES eas_servers(id),
            target_id BIGINT NOT NULL REFERENCES eas_targets(id),
            task_id BIGINT NOT NULL REFERENCES eas_tasks(id),
            lc_length BIGINT,
            timestamp TIMESTAMPTZ NOT NULL,
            run_time_wall_clock DOUBLE PRECISION NOT NULL,
            run_time_cpu DOUBLE PRECISION NOT NULL,
            run_time_cpu_inc_children DOUBLE PRECISION NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS eas_results (
            run_id BIGSERIAL PRIMARY KEY,
            job_id BIGINT NOT NULL REFERENCES eas_jobs(id),
            code_id BIGINT NOT NULL REFERENCES eas_tda_codes(id),
            server_id BIGINT NOT NULL REFERENCES eas_servers(id),
            target_id BIGINT NOT NULL REFERENCES eas_targets(id),
            task_id BIGINT NOT NULL REFERENCES eas_tasks(id),
            lc_length BIGINT,
            timestamp TIMESTAMPTZ NOT NULL,
            results JSONB NOT NULL,
            result_filename TEXT
        )",
    )
    .execute(pool)
    .await?;

    Ok(())
}
