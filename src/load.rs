//! Bulk data loading.
//!
//! Executes a SQL script against the store. Schema provisioning belongs to
//! `shoprec init`; this command is for populating the base relations from
//! a data file.

use anyhow::{Context, Result};
use std::path::Path;

use crate::config::Config;
use crate::db;

pub async fn run_load(config: &Config, path: &Path) -> Result<()> {
    let script = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read data file: {}", path.display()))?;

    let pool = db::connect(config).await?;

    let result = sqlx::raw_sql(&script)
        .execute(&pool)
        .await
        .with_context(|| format!("Failed to execute data file: {}", path.display()))?;

    println!("load {}", path.display());
    println!("  rows affected: {}", result.rows_affected());

    pool.close().await;
    Ok(())
}
