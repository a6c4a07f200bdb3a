//! Schema migrations: apply, revert and report.
//!
//! Migrations are reversible pairs embedded from `migrations/` at build time. Applying is
//! idempotent; reverting walks back through the down scripts in reverse version order.

use crate::migrator;
use chrono::{DateTime, Utc};
use sqlx::migrate::MigrateError;
use sqlx::{FromRow, PgPool};
use tracing::{info, instrument};

/// How far `migrate down` goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevertTarget {
    /// Only the most recently applied migration
    Last,
    /// Everything, leaving an empty schema
    All,
    /// Every migration newer than this version
    Version(i64),
}

/// One known migration and whether it is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    pub version: i64,
    pub description: String,
    pub installed_on: Option<DateTime<Utc>>,
}

impl MigrationStatus {
    pub fn is_applied(&self) -> bool {
        self.installed_on.is_some()
    }
}

#[derive(Debug, FromRow)]
struct Applied {
    version: i64,
    installed_on: DateTime<Utc>,
}

/// Apply every pending migration.
#[instrument(skip_all, err)]
pub async fn run(pool: &PgPool) -> Result<(), MigrateError> {
    migrator().run(pool).await?;
    info!("Migrations applied");
    Ok(())
}

async fn applied(pool: &PgPool) -> Result<Vec<Applied>, sqlx::Error> {
    let exists: bool = sqlx::query_scalar("SELECT to_regclass('_sqlx_migrations') IS NOT NULL")
        .fetch_one(pool)
        .await?;
    if !exists {
        return Ok(Vec::new());
    }

    sqlx::query_as::<_, Applied>(
        "SELECT version, installed_on FROM _sqlx_migrations WHERE success ORDER BY version",
    )
    .fetch_all(pool)
    .await
}

/// Revert applied migrations down to `target`.
#[instrument(skip(pool), err)]
pub async fn revert(pool: &PgPool, target: RevertTarget) -> Result<(), MigrateError> {
    let version = match target {
        RevertTarget::All => 0,
        RevertTarget::Version(version) => version,
        RevertTarget::Last => {
            let applied = applied(pool).await?;
            match applied.len() {
                0 => {
                    info!("No migrations applied, nothing to revert");
                    return Ok(());
                }
                1 => 0,
                n => applied[n - 2].version,
            }
        }
    };

    migrator().undo(pool, version).await?;
    info!(version, "Migrations reverted");
    Ok(())
}

/// Every known migration, oldest first, with its install time if applied.
#[instrument(skip_all, err)]
pub async fn status(pool: &PgPool) -> Result<Vec<MigrationStatus>, sqlx::Error> {
    let applied = applied(pool).await?;

    Ok(migrator()
        .iter()
        .filter(|m| !m.migration_type.is_down_migration())
        .map(|m| MigrationStatus {
            version: m.version,
            description: m.description.to_string(),
            installed_on: applied.iter().find(|a| a.version == m.version).map(|a| a.installed_on),
        })
        .collect())
}
