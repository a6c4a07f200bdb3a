//! API request/response models for obras (job sites).

use super::pagination::Pagination;
use crate::db::models::obras::ObraDBResponse;
use crate::types::ObraId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ObraCreate {
    pub codigo: String,
    pub descripcion: String,
    pub observaciones: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ObraUpdate {
    pub descripcion: Option<String>,
    pub observaciones: Option<String>,
    pub activo: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ObraResponse {
    pub id: ObraId,
    pub codigo: String,
    pub descripcion: String,
    pub observaciones: Option<String>,
    pub activo: bool,
    pub fecha_creacion: DateTime<Utc>,
    pub fecha_actualizacion: DateTime<Utc>,
}

#[serde_as]
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListObrasQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    #[serde_as(as = "Option<DisplayFromStr>")]
    pub activo: Option<bool>,
}

impl ObraCreate {
    pub fn validate(&self) -> Result<(), String> {
        if self.codigo.trim().is_empty() {
            return Err("codigo must not be empty".to_string());
        }
        if self.descripcion.trim().is_empty() {
            return Err("descripcion must not be empty".to_string());
        }
        Ok(())
    }
}

impl From<ObraDBResponse> for ObraResponse {
    fn from(db: ObraDBResponse) -> Self {
        Self {
            id: db.id,
            codigo: db.codigo,
            descripcion: db.descripcion,
            observaciones: db.observaciones,
            activo: db.activo,
            fecha_creacion: db.fecha_creacion,
            fecha_actualizacion: db.fecha_actualizacion,
        }
    }
}
