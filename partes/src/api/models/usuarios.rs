//! API request/response models for usuarios.

use super::pagination::Pagination;
use crate::db::models::usuarios::UsuarioDBResponse;
use crate::types::{Rol, UsuarioId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UsuarioCreate {
    pub email: String,
    pub nombre: String,
    pub rol: Rol,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UsuarioUpdate {
    pub nombre: Option<String>,
    pub rol: Option<Rol>,
    pub activo: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UsuarioResponse {
    pub id: UsuarioId,
    pub email: String,
    pub nombre: String,
    pub rol: Rol,
    pub activo: bool,
    pub fecha_creacion: DateTime<Utc>,
}

#[serde_as]
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListUsuariosQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    pub rol: Option<Rol>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    pub activo: Option<bool>,
}

impl UsuarioCreate {
    pub fn validate(&self) -> Result<(), String> {
        if !self.email.contains('@') {
            return Err(format!("'{}' is not a valid email address", self.email));
        }
        if self.nombre.trim().is_empty() {
            return Err("nombre must not be empty".to_string());
        }
        Ok(())
    }
}

impl From<UsuarioDBResponse> for UsuarioResponse {
    fn from(db: UsuarioDBResponse) -> Self {
        Self {
            id: db.id,
            email: db.email,
            nombre: db.nombre,
            rol: db.rol,
            activo: db.activo,
            fecha_creacion: db.fecha_creacion,
        }
    }
}
