//! Seeding straight into the database through the repository layer.

use super::{Roster, SeedError, SeedReport};
use crate::db::errors::DbError;
use crate::db::handlers::Recursos;
use crate::db::models::recursos::RecursoCreateDBRequest;
use sqlx::PgPool;
use tracing::{debug, info, instrument};

/// Upsert every record by `codigo` in a single transaction. Running it twice leaves the
/// table unchanged.
#[instrument(skip_all, fields(records = roster.len()), err)]
pub async fn seed(pool: &PgPool, roster: &Roster) -> Result<SeedReport, SeedError> {
    let mut tx = pool.begin().await.map_err(DbError::from)?;
    let mut inserted = 0usize;
    let mut updated = 0usize;

    {
        let mut repo = Recursos::new(&mut tx);
        for recurso in &roster.recursos {
            let request = RecursoCreateDBRequest::from(recurso.clone());
            let (row, was_inserted) = repo.upsert(&request).await?;
            debug!(codigo = %row.codigo, id = row.id, inserted = was_inserted, "Upserted recurso");
            if was_inserted {
                inserted += 1;
            } else {
                updated += 1;
            }
        }
    }

    tx.commit().await.map_err(DbError::from)?;
    info!(inserted, updated, "Roster upserted");

    Ok(SeedReport {
        attempted: roster.len(),
        succeeded: inserted + updated,
        failed: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::Repository;
    use crate::db::handlers::recursos::RecursoFilter;
    use crate::types::TipoRecurso;

    #[sqlx::test]
    #[ignore = "requires a PostgreSQL server at DATABASE_URL"]
    async fn test_seed_twice_is_idempotent(pool: PgPool) {
        let roster = Roster::embedded().unwrap();

        let first = seed(&pool, &roster).await.unwrap();
        let second = seed(&pool, &roster).await.unwrap();
        assert_eq!(first.succeeded, 19);
        assert_eq!(second.succeeded, 19);

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Recursos::new(&mut conn);
        let all = repo.list(&RecursoFilter::new(0, 1000)).await.unwrap();
        assert_eq!(all.len(), 19);
        assert_eq!(all.iter().filter(|r| r.tipo == TipoRecurso::Maquina).count(), 7);

        let counts = repo.count_active_by_tipo().await.unwrap();
        assert_eq!(counts, vec![(TipoRecurso::Maquina, 7), (TipoRecurso::Operario, 12)]);
        assert_eq!(counts.iter().map(|(_, n)| n).sum::<i64>(), 19);
    }

    #[sqlx::test]
    #[ignore = "requires a PostgreSQL server at DATABASE_URL"]
    async fn test_seed_overwrites_edited_rows(pool: PgPool) {
        let roster = Roster::embedded().unwrap();
        seed(&pool, &roster).await.unwrap();

        sqlx::query("UPDATE recursos SET nombre = 'editado' WHERE codigo = 'OP001'")
            .execute(&pool)
            .await
            .unwrap();
        seed(&pool, &roster).await.unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let recurso = Recursos::new(&mut conn).get_by_codigo("OP001").await.unwrap().unwrap();
        assert_eq!(recurso.nombre, roster.recursos[0].nombre);
    }
}
