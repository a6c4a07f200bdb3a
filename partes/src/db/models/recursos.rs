//! Database models for recursos.

use crate::api::models::recursos::{RecursoCreate, RecursoUpdate};
use crate::types::{RecursoId, TipoRecurso};
use chrono::{DateTime, Utc};

/// Database request for creating a new recurso
#[derive(Debug, Clone)]
pub struct RecursoCreateDBRequest {
    pub codigo: String,
    pub nombre: String,
    pub tipo: TipoRecurso,
    pub activo: bool,
    pub agr_coste: Option<String>,
}

impl From<RecursoCreate> for RecursoCreateDBRequest {
    fn from(api: RecursoCreate) -> Self {
        Self {
            codigo: api.codigo.trim().to_string(),
            nombre: api.nombre,
            tipo: api.tipo,
            activo: api.activo,
            agr_coste: api.agr_coste,
        }
    }
}

/// Database request for updating a recurso
#[derive(Debug, Clone, Default)]
pub struct RecursoUpdateDBRequest {
    pub nombre: Option<String>,
    pub activo: Option<bool>,
    /// `Some(None)` clears the column
    pub agr_coste: Option<Option<String>>,
}

impl From<RecursoUpdate> for RecursoUpdateDBRequest {
    fn from(api: RecursoUpdate) -> Self {
        Self {
            nombre: api.nombre,
            activo: api.activo,
            agr_coste: api.agr_coste,
        }
    }
}

/// Database response for a recurso
#[derive(Debug, Clone)]
pub struct RecursoDBResponse {
    pub id: RecursoId,
    pub codigo: String,
    pub nombre: String,
    pub tipo: TipoRecurso,
    pub activo: bool,
    pub agr_coste: Option<String>,
    pub fecha_creacion: DateTime<Utc>,
}
