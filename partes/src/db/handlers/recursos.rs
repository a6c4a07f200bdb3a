//! Database repository for recursos.

use crate::types::{RecursoId, TipoRecurso};
use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::recursos::{RecursoCreateDBRequest, RecursoDBResponse, RecursoUpdateDBRequest},
};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, QueryBuilder};
use tracing::instrument;

/// Filter for listing recursos
#[derive(Debug, Clone)]
pub struct RecursoFilter {
    pub skip: i64,
    pub limit: i64,
    pub tipo: Option<TipoRecurso>,
    pub activo: Option<bool>,
}

impl RecursoFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            tipo: None,
            activo: None,
        }
    }

    pub fn with_tipo(mut self, tipo: TipoRecurso) -> Self {
        self.tipo = Some(tipo);
        self
    }

    pub fn with_activo(mut self, activo: bool) -> Self {
        self.activo = Some(activo);
        self
    }
}

// Database entity model
#[derive(Debug, Clone, FromRow)]
struct Recurso {
    pub id: RecursoId,
    pub codigo: String,
    pub nombre: String,
    #[sqlx(try_from = "String")]
    pub tipo: TipoRecurso,
    pub activo: bool,
    pub agr_coste: Option<String>,
    pub fecha_creacion: DateTime<Utc>,
}

impl From<Recurso> for RecursoDBResponse {
    fn from(r: Recurso) -> Self {
        Self {
            id: r.id,
            codigo: r.codigo,
            nombre: r.nombre,
            tipo: r.tipo,
            activo: r.activo,
            agr_coste: r.agr_coste,
            fecha_creacion: r.fecha_creacion,
        }
    }
}

pub struct Recursos<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Recursos<'c> {
    type CreateRequest = RecursoCreateDBRequest;
    type UpdateRequest = RecursoUpdateDBRequest;
    type Response = RecursoDBResponse;
    type Id = RecursoId;
    type Filter = RecursoFilter;

    #[instrument(skip(self, request), fields(codigo = %request.codigo), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let recurso = sqlx::query_as::<_, Recurso>(
            r#"
            INSERT INTO recursos (codigo, nombre, tipo, activo, agr_coste)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&request.codigo)
        .bind(&request.nombre)
        .bind(request.tipo.as_str())
        .bind(request.activo)
        .bind(&request.agr_coste)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(recurso.into())
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let recurso = sqlx::query_as::<_, Recurso>("SELECT * FROM recursos WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(recurso.map(Into::into))
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM recursos WHERE 1=1");

        if let Some(tipo) = filter.tipo {
            query.push(" AND tipo = ");
            query.push_bind(tipo.as_str());
        }

        if let Some(activo) = filter.activo {
            query.push(" AND activo = ");
            query.push_bind(activo);
        }

        query.push(" ORDER BY tipo, codigo LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let recursos = query.build_query_as::<Recurso>().fetch_all(&mut *self.db).await?;

        Ok(recursos.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let recurso = sqlx::query_as::<_, Recurso>(
            r#"
            UPDATE recursos SET
                nombre = COALESCE($2, nombre),
                activo = COALESCE($3, activo),
                agr_coste = CASE WHEN $5 THEN $4 ELSE agr_coste END
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.nombre)
        .bind(request.activo)
        .bind(request.agr_coste.as_ref().and_then(Option::as_deref))
        .bind(request.agr_coste.is_some())
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(recurso.into())
    }
}

impl<'c> Recursos<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Get a recurso by its unique codigo
    #[instrument(skip(self), err)]
    pub async fn get_by_codigo(&mut self, codigo: &str) -> Result<Option<RecursoDBResponse>> {
        let recurso = sqlx::query_as::<_, Recurso>("SELECT * FROM recursos WHERE codigo = $1")
            .bind(codigo)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(recurso.map(Into::into))
    }

    /// Insert a recurso, or overwrite the existing row with the same codigo.
    ///
    /// `fecha_creacion` of an existing row is preserved. Returns the stored row and whether
    /// it was newly inserted.
    #[instrument(skip(self, request), fields(codigo = %request.codigo), err)]
    pub async fn upsert(&mut self, request: &RecursoCreateDBRequest) -> Result<(RecursoDBResponse, bool)> {
        #[derive(FromRow)]
        struct Upserted {
            #[sqlx(flatten)]
            recurso: Recurso,
            inserted: bool,
        }

        // xmax is zero only for rows created by this statement
        let row = sqlx::query_as::<_, Upserted>(
            r#"
            INSERT INTO recursos (codigo, nombre, tipo, activo, agr_coste)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (codigo) DO UPDATE SET
                nombre = EXCLUDED.nombre,
                tipo = EXCLUDED.tipo,
                activo = EXCLUDED.activo,
                agr_coste = EXCLUDED.agr_coste
            RETURNING *, (xmax = 0) AS inserted
            "#,
        )
        .bind(&request.codigo)
        .bind(&request.nombre)
        .bind(request.tipo.as_str())
        .bind(request.activo)
        .bind(&request.agr_coste)
        .fetch_one(&mut *self.db)
        .await?;

        Ok((row.recurso.into(), row.inserted))
    }

    /// Count active recursos per tipo
    #[instrument(skip(self), err)]
    pub async fn count_active_by_tipo(&mut self) -> Result<Vec<(TipoRecurso, i64)>> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT tipo, COUNT(*) FROM recursos WHERE activo GROUP BY tipo ORDER BY tipo")
                .fetch_all(&mut *self.db)
                .await?;

        rows.into_iter()
            .map(|(tipo, count)| {
                let tipo = tipo.parse::<TipoRecurso>().map_err(|e| DbError::Other(e.into()))?;
                Ok((tipo, count))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::PgPool;

    fn create_request(codigo: &str, tipo: TipoRecurso) -> RecursoCreateDBRequest {
        RecursoCreateDBRequest {
            codigo: codigo.to_string(),
            nombre: format!("Recurso {codigo}"),
            tipo,
            activo: true,
            agr_coste: Some("MO".to_string()),
        }
    }

    #[sqlx::test]
    #[ignore = "requires a PostgreSQL server at DATABASE_URL"]
    async fn test_create_and_get_recurso(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Recursos::new(&mut conn);

        let created = repo.create(&create_request("OP100", TipoRecurso::Operario)).await.unwrap();
        assert_eq!(created.codigo, "OP100");
        assert_eq!(created.tipo, TipoRecurso::Operario);
        assert!(created.activo);

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.codigo, "OP100");
        assert_eq!(fetched.agr_coste.as_deref(), Some("MO"));
    }

    #[sqlx::test]
    #[ignore = "requires a PostgreSQL server at DATABASE_URL"]
    async fn test_duplicate_codigo_is_unique_violation(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Recursos::new(&mut conn);

        repo.create(&create_request("MQ100", TipoRecurso::Maquina)).await.unwrap();
        let err = repo.create(&create_request("MQ100", TipoRecurso::Maquina)).await.unwrap_err();

        match err {
            DbError::UniqueViolation {
                constraint,
                conflicting_value,
                ..
            } => {
                assert_eq!(constraint.as_deref(), Some("uq_recursos_codigo"));
                assert_eq!(conflicting_value.as_deref(), Some("MQ100"));
            }
            other => panic!("expected unique violation, got {other:?}"),
        }
    }

    #[sqlx::test]
    #[ignore = "requires a PostgreSQL server at DATABASE_URL"]
    async fn test_upsert_is_idempotent(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Recursos::new(&mut conn);

        let (first, inserted) = repo.upsert(&create_request("OP200", TipoRecurso::Operario)).await.unwrap();
        assert!(inserted);

        let mut changed = create_request("OP200", TipoRecurso::Operario);
        changed.nombre = "Renombrado".to_string();
        let (second, inserted) = repo.upsert(&changed).await.unwrap();
        assert!(!inserted);
        assert_eq!(second.id, first.id);
        assert_eq!(second.nombre, "Renombrado");
        assert_eq!(second.fecha_creacion, first.fecha_creacion);
    }

    #[sqlx::test]
    #[ignore = "requires a PostgreSQL server at DATABASE_URL"]
    async fn test_list_filters_by_tipo_and_activo(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Recursos::new(&mut conn);

        repo.create(&create_request("OP001", TipoRecurso::Operario)).await.unwrap();
        let maquina = repo.create(&create_request("MQ001", TipoRecurso::Maquina)).await.unwrap();
        repo.create(&create_request("MQ002", TipoRecurso::Maquina)).await.unwrap();
        repo.update(
            maquina.id,
            &RecursoUpdateDBRequest {
                activo: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let maquinas = repo
            .list(&RecursoFilter::new(0, 100).with_tipo(TipoRecurso::Maquina))
            .await
            .unwrap();
        assert_eq!(maquinas.len(), 2);

        let activas = repo
            .list(&RecursoFilter::new(0, 100).with_tipo(TipoRecurso::Maquina).with_activo(true))
            .await
            .unwrap();
        assert_eq!(activas.len(), 1);
        assert_eq!(activas[0].codigo, "MQ002");

        let counts = repo.count_active_by_tipo().await.unwrap();
        assert_eq!(counts, vec![(TipoRecurso::Maquina, 1), (TipoRecurso::Operario, 1)]);
    }

    #[sqlx::test]
    #[ignore = "requires a PostgreSQL server at DATABASE_URL"]
    async fn test_update_clears_agr_coste_only_when_asked(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Recursos::new(&mut conn);

        let mut request = create_request("MQ001", TipoRecurso::Maquina);
        request.agr_coste = Some("MAQ".to_string());
        let recurso = repo.create(&request).await.unwrap();

        let renamed = repo
            .update(
                recurso.id,
                &RecursoUpdateDBRequest {
                    nombre: Some("Grúa torre".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.agr_coste.as_deref(), Some("MAQ"));

        let cleared = repo
            .update(
                recurso.id,
                &RecursoUpdateDBRequest {
                    agr_coste: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(cleared.agr_coste, None);
        assert_eq!(cleared.nombre, "Grúa torre");
    }

    #[sqlx::test]
    #[ignore = "requires a PostgreSQL server at DATABASE_URL"]
    async fn test_update_unknown_id_is_not_found(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Recursos::new(&mut conn);

        let err = repo.update(9999, &RecursoUpdateDBRequest::default()).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound));
    }
}
