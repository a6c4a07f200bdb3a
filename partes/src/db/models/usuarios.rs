//! Database models for usuarios.

use crate::api::models::usuarios::{UsuarioCreate, UsuarioUpdate};
use crate::types::{Rol, UsuarioId};
use chrono::{DateTime, Utc};

/// Database request for creating a new usuario
#[derive(Debug, Clone)]
pub struct UsuarioCreateDBRequest {
    pub email: String,
    pub nombre: String,
    pub rol: Rol,
}

impl From<UsuarioCreate> for UsuarioCreateDBRequest {
    fn from(api: UsuarioCreate) -> Self {
        Self {
            email: api.email.trim().to_lowercase(),
            nombre: api.nombre,
            rol: api.rol,
        }
    }
}

/// Database request for updating a usuario
#[derive(Debug, Clone, Default)]
pub struct UsuarioUpdateDBRequest {
    pub nombre: Option<String>,
    pub rol: Option<Rol>,
    pub activo: Option<bool>,
}

impl From<UsuarioUpdate> for UsuarioUpdateDBRequest {
    fn from(api: UsuarioUpdate) -> Self {
        Self {
            nombre: api.nombre,
            rol: api.rol,
            activo: api.activo,
        }
    }
}

/// Database response for a usuario
#[derive(Debug, Clone)]
pub struct UsuarioDBResponse {
    pub id: UsuarioId,
    pub email: String,
    pub nombre: String,
    pub rol: Rol,
    pub activo: bool,
    pub fecha_creacion: DateTime<Utc>,
}
