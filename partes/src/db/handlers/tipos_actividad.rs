//! Database repository for tipos_actividad.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::tipos_actividad::{TipoActividadCreateDBRequest, TipoActividadDBResponse, TipoActividadUpdateDBRequest},
};
use crate::types::TipoActividadId;
use sqlx::{FromRow, PgConnection};
use tracing::instrument;

#[derive(Debug, Clone)]
pub struct TipoActividadFilter {
    pub skip: i64,
    pub limit: i64,
}

impl TipoActividadFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit }
    }
}

#[derive(Debug, Clone, FromRow)]
struct TipoActividad {
    pub id: TipoActividadId,
    pub codigo: String,
    pub nombre: String,
    pub descripcion: Option<String>,
}

impl From<TipoActividad> for TipoActividadDBResponse {
    fn from(t: TipoActividad) -> Self {
        Self {
            id: t.id,
            codigo: t.codigo,
            nombre: t.nombre,
            descripcion: t.descripcion,
        }
    }
}

pub struct TiposActividad<'c> {
    db: &'c mut PgConnection,
}

impl<'c> TiposActividad<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for TiposActividad<'c> {
    type CreateRequest = TipoActividadCreateDBRequest;
    type UpdateRequest = TipoActividadUpdateDBRequest;
    type Response = TipoActividadDBResponse;
    type Id = TipoActividadId;
    type Filter = TipoActividadFilter;

    #[instrument(skip(self, request), fields(codigo = %request.codigo), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let tipo = sqlx::query_as::<_, TipoActividad>(
            "INSERT INTO tipos_actividad (codigo, nombre, descripcion) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(&request.codigo)
        .bind(&request.nombre)
        .bind(&request.descripcion)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(tipo.into())
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let tipo = sqlx::query_as::<_, TipoActividad>("SELECT * FROM tipos_actividad WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(tipo.map(Into::into))
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let tipos = sqlx::query_as::<_, TipoActividad>("SELECT * FROM tipos_actividad ORDER BY codigo LIMIT $1 OFFSET $2")
            .bind(filter.limit)
            .bind(filter.skip)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(tipos.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let tipo = sqlx::query_as::<_, TipoActividad>(
            r#"
            UPDATE tipos_actividad SET
                nombre = COALESCE($2, nombre),
                descripcion = COALESCE($3, descripcion)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.nombre)
        .bind(&request.descripcion)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(tipo.into())
    }
}
