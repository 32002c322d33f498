use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::config::AppConfig;

pub async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .context("connect to database")
}

pub async fn migrate(db: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(db)
        .await
        .context("run migrations")
}

fn database_error(err: &anyhow::Error) -> Option<&(dyn sqlx::error::DatabaseError + 'static)> {
    err.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
}

/// A unique constraint rejected the write (e.g. duplicate email).
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    database_error(err).is_some_and(|e| e.is_unique_violation())
}

/// A referenced row does not exist (e.g. unknown product variant).
pub fn is_foreign_key_violation(err: &anyhow::Error) -> bool {
    database_error(err).is_some_and(|e| e.is_foreign_key_violation())
}

/// Name of the constraint a database error reports, if any.
pub fn violated_constraint(err: &anyhow::Error) -> Option<&str> {
    database_error(err).and_then(|e| e.constraint())
}
