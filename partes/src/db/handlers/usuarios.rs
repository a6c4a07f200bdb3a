//! Database repository for usuarios.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::usuarios::{UsuarioCreateDBRequest, UsuarioDBResponse, UsuarioUpdateDBRequest},
};
use crate::types::{Rol, UsuarioId};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, QueryBuilder};
use tracing::instrument;

/// Filter for listing usuarios
#[derive(Debug, Clone)]
pub struct UsuarioFilter {
    pub skip: i64,
    pub limit: i64,
    pub rol: Option<Rol>,
    pub activo: Option<bool>,
}

impl UsuarioFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            rol: None,
            activo: None,
        }
    }

    pub fn with_rol(mut self, rol: Rol) -> Self {
        self.rol = Some(rol);
        self
    }

    pub fn with_activo(mut self, activo: bool) -> Self {
        self.activo = Some(activo);
        self
    }
}

// Database entity model
#[derive(Debug, Clone, FromRow)]
struct Usuario {
    pub id: UsuarioId,
    pub email: String,
    pub nombre: String,
    #[sqlx(try_from = "String")]
    pub rol: Rol,
    pub activo: bool,
    pub fecha_creacion: DateTime<Utc>,
}

impl From<Usuario> for UsuarioDBResponse {
    fn from(u: Usuario) -> Self {
        Self {
            id: u.id,
            email: u.email,
            nombre: u.nombre,
            rol: u.rol,
            activo: u.activo,
            fecha_creacion: u.fecha_creacion,
        }
    }
}

pub struct Usuarios<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Usuarios<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_email(&mut self, email: &str) -> Result<Option<UsuarioDBResponse>> {
        let usuario = sqlx::query_as::<_, Usuario>("SELECT * FROM usuarios WHERE email = $1")
            .bind(email.trim().to_lowercase())
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(usuario.map(Into::into))
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Usuarios<'c> {
    type CreateRequest = UsuarioCreateDBRequest;
    type UpdateRequest = UsuarioUpdateDBRequest;
    type Response = UsuarioDBResponse;
    type Id = UsuarioId;
    type Filter = UsuarioFilter;

    #[instrument(skip(self, request), fields(email = %request.email), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let usuario = sqlx::query_as::<_, Usuario>(
            r#"
            INSERT INTO usuarios (email, nombre, rol)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&request.email)
        .bind(&request.nombre)
        .bind(request.rol.as_str())
        .fetch_one(&mut *self.db)
        .await?;

        Ok(usuario.into())
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let usuario = sqlx::query_as::<_, Usuario>("SELECT * FROM usuarios WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(usuario.map(Into::into))
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM usuarios WHERE 1=1");

        if let Some(rol) = filter.rol {
            query.push(" AND rol = ");
            query.push_bind(rol.as_str());
        }

        if let Some(activo) = filter.activo {
            query.push(" AND activo = ");
            query.push_bind(activo);
        }

        query.push(" ORDER BY nombre, id LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let usuarios = query.build_query_as::<Usuario>().fetch_all(&mut *self.db).await?;

        Ok(usuarios.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let usuario = sqlx::query_as::<_, Usuario>(
            r#"
            UPDATE usuarios SET
                nombre = COALESCE($2, nombre),
                rol = COALESCE($3, rol),
                activo = COALESCE($4, activo)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.nombre)
        .bind(request.rol.map(|r| r.as_str()))
        .bind(request.activo)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(usuario.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::PgPool;

    #[sqlx::test]
    #[ignore = "requires a PostgreSQL server at DATABASE_URL"]
    async fn test_email_is_case_insensitive(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Usuarios::new(&mut conn);

        repo.create(&UsuarioCreateDBRequest {
            email: "jefe@example.com".to_string(),
            nombre: "Jefe de Equipo".to_string(),
            rol: Rol::JefeEquipo,
        })
        .await
        .unwrap();

        let found = repo.get_by_email("  JEFE@example.com ").await.unwrap().unwrap();
        assert_eq!(found.rol, Rol::JefeEquipo);

        let jefes = repo.list(&UsuarioFilter::new(0, 10).with_rol(Rol::JefeEquipo)).await.unwrap();
        assert_eq!(jefes.len(), 1);
        let admins = repo
            .list(&UsuarioFilter::new(0, 10).with_rol(Rol::Administrador).with_activo(true))
            .await
            .unwrap();
        assert!(admins.is_empty());
    }
}
