//! Database models for obras.

use crate::api::models::obras::{ObraCreate, ObraUpdate};
use crate::types::ObraId;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct ObraCreateDBRequest {
    pub codigo: String,
    pub descripcion: String,
    pub observaciones: Option<String>,
}

impl From<ObraCreate> for ObraCreateDBRequest {
    fn from(api: ObraCreate) -> Self {
        Self {
            codigo: api.codigo.trim().to_string(),
            descripcion: api.descripcion,
            observaciones: api.observaciones,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ObraUpdateDBRequest {
    pub descripcion: Option<String>,
    pub observaciones: Option<String>,
    pub activo: Option<bool>,
}

impl From<ObraUpdate> for ObraUpdateDBRequest {
    fn from(api: ObraUpdate) -> Self {
        Self {
            descripcion: api.descripcion,
            observaciones: api.observaciones,
            activo: api.activo,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ObraDBResponse {
    pub id: ObraId,
    pub codigo: String,
    pub descripcion: String,
    pub observaciones: Option<String>,
    pub activo: bool,
    pub fecha_creacion: DateTime<Utc>,
    pub fecha_actualizacion: DateTime<Utc>,
}
