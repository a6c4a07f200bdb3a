//! API request/response models for activity types.

use super::pagination::Pagination;
use crate::db::models::tipos_actividad::TipoActividadDBResponse;
use crate::types::TipoActividadId;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TipoActividadCreate {
    pub codigo: String,
    pub nombre: String,
    pub descripcion: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct TipoActividadUpdate {
    pub nombre: Option<String>,
    pub descripcion: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TipoActividadResponse {
    pub id: TipoActividadId,
    pub codigo: String,
    pub nombre: String,
    pub descripcion: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListTiposActividadQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,
}

impl TipoActividadCreate {
    pub fn validate(&self) -> Result<(), String> {
        if self.codigo.trim().is_empty() {
            return Err("codigo must not be empty".to_string());
        }
        if self.nombre.trim().is_empty() {
            return Err("nombre must not be empty".to_string());
        }
        Ok(())
    }
}

impl From<TipoActividadDBResponse> for TipoActividadResponse {
    fn from(db: TipoActividadDBResponse) -> Self {
        Self {
            id: db.id,
            codigo: db.codigo,
            nombre: db.nombre,
            descripcion: db.descripcion,
        }
    }
}
