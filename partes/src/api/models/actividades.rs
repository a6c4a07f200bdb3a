//! API request/response models for actividades.
//!
//! An activity is opened with a start date/time (and optionally a GPS fix) and later closed
//! with `POST /actividades/{id}/cierre`. Until then `fecha_fin` and `hora_fin` are null.

use super::pagination::Pagination;
use crate::db::models::actividades::ActividadDBResponse;
use crate::types::{ActividadId, ObraId, RecursoId, TipoActividadId, UsuarioId};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Coordenadas {
    pub lat: f64,
    pub lon: f64,
}

impl Coordenadas {
    pub fn validate(&self) -> Result<(), String> {
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(format!("latitude {} is out of range", self.lat));
        }
        if !(-180.0..=180.0).contains(&self.lon) {
            return Err(format!("longitude {} is out of range", self.lon));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ActividadCreate {
    pub obra_id: ObraId,
    pub recurso_id: RecursoId,
    pub tipo_actividad_id: TipoActividadId,
    pub fecha_inicio: NaiveDate,
    #[schema(value_type = String, example = "07:30:00")]
    pub hora_inicio: NaiveTime,
    pub gps_inicio: Option<Coordenadas>,
    pub usuario_creacion: Option<UsuarioId>,
}

/// Body of `POST /actividades/{id}/cierre`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ActividadCierre {
    pub fecha_fin: NaiveDate,
    #[schema(value_type = String, example = "15:00:00")]
    pub hora_fin: NaiveTime,
    pub gps_fin: Option<Coordenadas>,
    #[schema(value_type = Option<String>, example = "42.50")]
    pub km_recorridos: Option<Decimal>,
    pub usuario_modificacion: Option<UsuarioId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ActividadResponse {
    pub id: ActividadId,
    pub obra_id: ObraId,
    pub recurso_id: RecursoId,
    pub tipo_actividad_id: TipoActividadId,
    pub fecha_inicio: NaiveDate,
    #[schema(value_type = String)]
    pub hora_inicio: NaiveTime,
    pub fecha_fin: Option<NaiveDate>,
    #[schema(value_type = Option<String>)]
    pub hora_fin: Option<NaiveTime>,
    /// True while the activity has no end time
    pub en_curso: bool,
    pub gps_inicio: Option<Coordenadas>,
    pub gps_fin: Option<Coordenadas>,
    #[schema(value_type = Option<String>)]
    pub km_recorridos: Option<Decimal>,
    pub usuario_creacion: Option<UsuarioId>,
    pub usuario_modificacion: Option<UsuarioId>,
    pub fecha_creacion: DateTime<Utc>,
    pub fecha_modificacion: DateTime<Utc>,
}

/// Query parameters for listing actividades. `desde`/`hasta` bound `fecha_inicio`
/// inclusively, which is the shape of the date-range export.
#[serde_as]
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListActividadesQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    #[serde_as(as = "Option<DisplayFromStr>")]
    pub obra_id: Option<ObraId>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    pub recurso_id: Option<RecursoId>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    pub desde: Option<NaiveDate>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    pub hasta: Option<NaiveDate>,

    /// Only activities that are still open (`true`) or already closed (`false`)
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub en_curso: Option<bool>,
}

impl ActividadCreate {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(gps) = &self.gps_inicio {
            gps.validate()?;
        }
        Ok(())
    }
}

impl ActividadCierre {
    /// Check the closing data against the activity it closes.
    pub fn validate_against(&self, fecha_inicio: NaiveDate, hora_inicio: NaiveTime) -> Result<(), String> {
        let inicio = NaiveDateTime::new(fecha_inicio, hora_inicio);
        let fin = NaiveDateTime::new(self.fecha_fin, self.hora_fin);
        if fin < inicio {
            return Err(format!("end {fin} is before start {inicio}"));
        }
        if let Some(gps) = &self.gps_fin {
            gps.validate()?;
        }
        if let Some(km) = self.km_recorridos {
            if km.is_sign_negative() {
                return Err("km_recorridos must not be negative".to_string());
            }
            // NUMERIC(10,2)
            if km >= Decimal::new(100_000_000, 0) {
                return Err("km_recorridos must be below 100000000".to_string());
            }
            if km.normalize().scale() > 2 {
                return Err("km_recorridos must have at most 2 decimal places".to_string());
            }
        }
        Ok(())
    }
}

fn coordenadas(lat: Option<f64>, lon: Option<f64>) -> Option<Coordenadas> {
    match (lat, lon) {
        (Some(lat), Some(lon)) => Some(Coordenadas { lat, lon }),
        _ => None,
    }
}

impl From<ActividadDBResponse> for ActividadResponse {
    fn from(db: ActividadDBResponse) -> Self {
        Self {
            id: db.id,
            obra_id: db.obra_id,
            recurso_id: db.recurso_id,
            tipo_actividad_id: db.tipo_actividad_id,
            fecha_inicio: db.fecha_inicio,
            hora_inicio: db.hora_inicio,
            en_curso: db.fecha_fin.is_none(),
            fecha_fin: db.fecha_fin,
            hora_fin: db.hora_fin,
            gps_inicio: coordenadas(db.gps_inicio_lat, db.gps_inicio_lon),
            gps_fin: coordenadas(db.gps_fin_lat, db.gps_fin_lon),
            km_recorridos: db.km_recorridos,
            usuario_creacion: db.usuario_creacion,
            usuario_modificacion: db.usuario_modificacion,
            fecha_creacion: db.fecha_creacion,
            fecha_modificacion: db.fecha_modificacion,
        }
    }
}
