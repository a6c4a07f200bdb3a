//! API request/response models for recursos (workers and machines).

use super::pagination::Pagination;
use crate::db::models::recursos::RecursoDBResponse;
use crate::types::{RecursoId, TipoRecurso};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

fn default_activo() -> bool {
    true
}

/// Body of `POST /recursos`; also the record shape of the seed roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RecursoCreate {
    pub codigo: String,
    pub nombre: String,
    pub tipo: TipoRecurso,
    #[serde(default = "default_activo")]
    pub activo: bool,
    /// Cost grouping code used by the accounting export
    #[serde(rename = "agrCoste", default)]
    pub agr_coste: Option<String>,
}

/// Body of `PATCH /recursos/{id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct RecursoUpdate {
    pub nombre: Option<String>,
    pub activo: Option<bool>,
    /// `null` clears the code, an absent field keeps it
    #[serde(
        rename = "agrCoste",
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    #[schema(value_type = Option<String>, nullable)]
    pub agr_coste: Option<Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RecursoResponse {
    pub id: RecursoId,
    pub codigo: String,
    pub nombre: String,
    pub tipo: TipoRecurso,
    pub activo: bool,
    #[serde(rename = "agrCoste")]
    pub agr_coste: Option<String>,
    pub fecha_creacion: DateTime<Utc>,
}

/// Query parameters for listing recursos
#[serde_as]
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListRecursosQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Only resources of this kind
    pub tipo: Option<TipoRecurso>,

    /// Only active (or inactive) resources
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub activo: Option<bool>,
}

const CODIGO_MAX: usize = 50;
const NOMBRE_MAX: usize = 255;
const AGR_COSTE_MAX: usize = 50;

fn check_length(field: &str, value: &str, max: usize) -> Result<(), String> {
    if value.chars().count() > max {
        return Err(format!("{field} must be at most {max} characters"));
    }
    Ok(())
}

fn check_nombre(nombre: &str) -> Result<(), String> {
    if nombre.trim().is_empty() {
        return Err("nombre must not be empty".to_string());
    }
    check_length("nombre", nombre, NOMBRE_MAX)
}

impl RecursoCreate {
    /// Reject obviously invalid input before it reaches the database.
    pub fn validate(&self) -> Result<(), String> {
        if self.codigo.trim().is_empty() {
            return Err("codigo must not be empty".to_string());
        }
        check_length("codigo", &self.codigo, CODIGO_MAX)?;
        check_nombre(&self.nombre)?;
        if let Some(agr_coste) = &self.agr_coste {
            check_length("agrCoste", agr_coste, AGR_COSTE_MAX)?;
        }
        Ok(())
    }
}

impl RecursoUpdate {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(nombre) = &self.nombre {
            check_nombre(nombre)?;
        }
        if let Some(Some(agr_coste)) = &self.agr_coste {
            check_length("agrCoste", agr_coste, AGR_COSTE_MAX)?;
        }
        Ok(())
    }
}

impl From<RecursoDBResponse> for RecursoResponse {
    fn from(db: RecursoDBResponse) -> Self {
        Self {
            id: db.id,
            codigo: db.codigo,
            nombre: db.nombre,
            tipo: db.tipo,
            activo: db.activo,
            agr_coste: db.agr_coste,
            fecha_creacion: db.fecha_creacion,
        }
    }
}
