use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;

use crate::config::AppConfig;

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by the user and task stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write; carries the offending column.
    #[error("duplicate value for {0}")]
    Conflict(&'static str),

    /// The row disappeared between load and write.
    #[error("record not found")]
    NotFound,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Maps a unique violation on one of the known constraints to `Conflict`.
    pub fn from_sqlx(err: sqlx::Error, constraints: &[(&str, &'static str)]) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                let hit = db_err
                    .constraint()
                    .and_then(|name| constraints.iter().find(|(c, _)| *c == name));
                if let Some((_, column)) = hit {
                    return Self::Conflict(*column);
                }
            }
        }
        Self::Database(err)
    }
}

pub async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    let db = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("connect to database")?;
    Ok(db)
}

pub async fn migrate(db: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(db)
        .await
        .context("run migrations")?;
    Ok(())
}
