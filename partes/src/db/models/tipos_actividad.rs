//! Database models for tipos_actividad.

use crate::api::models::tipos_actividad::{TipoActividadCreate, TipoActividadUpdate};
use crate::types::TipoActividadId;

#[derive(Debug, Clone)]
pub struct TipoActividadCreateDBRequest {
    pub codigo: String,
    pub nombre: String,
    pub descripcion: Option<String>,
}

impl From<TipoActividadCreate> for TipoActividadCreateDBRequest {
    fn from(api: TipoActividadCreate) -> Self {
        Self {
            codigo: api.codigo.trim().to_string(),
            nombre: api.nombre,
            descripcion: api.descripcion,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TipoActividadUpdateDBRequest {
    pub nombre: Option<String>,
    pub descripcion: Option<String>,
}

impl From<TipoActividadUpdate> for TipoActividadUpdateDBRequest {
    fn from(api: TipoActividadUpdate) -> Self {
        Self {
            nombre: api.nombre,
            descripcion: api.descripcion,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TipoActividadDBResponse {
    pub id: TipoActividadId,
    pub codigo: String,
    pub nombre: String,
    pub descripcion: Option<String>,
}
