//! Database repository for obras.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::obras::{ObraCreateDBRequest, ObraDBResponse, ObraUpdateDBRequest},
};
use crate::types::ObraId;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, QueryBuilder};
use tracing::instrument;

/// Filter for listing obras
#[derive(Debug, Clone)]
pub struct ObraFilter {
    pub skip: i64,
    pub limit: i64,
    pub activo: Option<bool>,
}

impl ObraFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit, activo: None }
    }

    pub fn with_activo(mut self, activo: bool) -> Self {
        self.activo = Some(activo);
        self
    }
}

#[derive(Debug, Clone, FromRow)]
struct Obra {
    pub id: ObraId,
    pub codigo: String,
    pub descripcion: String,
    pub observaciones: Option<String>,
    pub activo: bool,
    pub fecha_creacion: DateTime<Utc>,
    pub fecha_actualizacion: DateTime<Utc>,
}

impl From<Obra> for ObraDBResponse {
    fn from(o: Obra) -> Self {
        Self {
            id: o.id,
            codigo: o.codigo,
            descripcion: o.descripcion,
            observaciones: o.observaciones,
            activo: o.activo,
            fecha_creacion: o.fecha_creacion,
            fecha_actualizacion: o.fecha_actualizacion,
        }
    }
}

pub struct Obras<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Obras<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Obras<'c> {
    type CreateRequest = ObraCreateDBRequest;
    type UpdateRequest = ObraUpdateDBRequest;
    type Response = ObraDBResponse;
    type Id = ObraId;
    type Filter = ObraFilter;

    #[instrument(skip(self, request), fields(codigo = %request.codigo), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let obra = sqlx::query_as::<_, Obra>(
            r#"
            INSERT INTO obras (codigo, descripcion, observaciones)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&request.codigo)
        .bind(&request.descripcion)
        .bind(&request.observaciones)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(obra.into())
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let obra = sqlx::query_as::<_, Obra>("SELECT * FROM obras WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(obra.map(Into::into))
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM obras WHERE 1=1");

        if let Some(activo) = filter.activo {
            query.push(" AND activo = ");
            query.push_bind(activo);
        }

        query.push(" ORDER BY codigo LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let obras = query.build_query_as::<Obra>().fetch_all(&mut *self.db).await?;

        Ok(obras.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let obra = sqlx::query_as::<_, Obra>(
            r#"
            UPDATE obras SET
                descripcion = COALESCE($2, descripcion),
                observaciones = COALESCE($3, observaciones),
                activo = COALESCE($4, activo),
                fecha_actualizacion = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.descripcion)
        .bind(&request.observaciones)
        .bind(request.activo)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(obra.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::PgPool;

    #[sqlx::test]
    #[ignore = "requires a PostgreSQL server at DATABASE_URL"]
    async fn test_update_touches_fecha_actualizacion(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Obras::new(&mut conn);

        let obra = repo
            .create(&ObraCreateDBRequest {
                codigo: "OB-2025-01".to_string(),
                descripcion: "Variante de la N-340".to_string(),
                observaciones: None,
            })
            .await
            .unwrap();

        let updated = repo
            .update(
                obra.id,
                &ObraUpdateDBRequest {
                    activo: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(!updated.activo);
        assert_eq!(updated.descripcion, "Variante de la N-340");
        assert!(updated.fecha_actualizacion >= obra.fecha_actualizacion);

        let activas = repo.list(&ObraFilter::new(0, 10).with_activo(true)).await.unwrap();
        assert!(activas.is_empty());
    }
}
