//! Database models for actividades.

use crate::api::models::actividades::{ActividadCierre, ActividadCreate};
use crate::types::{ActividadId, ObraId, RecursoId, TipoActividadId, UsuarioId};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;

/// Database request for opening an activity
#[derive(Debug, Clone)]
pub struct ActividadCreateDBRequest {
    pub obra_id: ObraId,
    pub recurso_id: RecursoId,
    pub tipo_actividad_id: TipoActividadId,
    pub fecha_inicio: NaiveDate,
    pub hora_inicio: NaiveTime,
    pub gps_inicio_lat: Option<f64>,
    pub gps_inicio_lon: Option<f64>,
    pub usuario_creacion: Option<UsuarioId>,
}

impl From<ActividadCreate> for ActividadCreateDBRequest {
    fn from(api: ActividadCreate) -> Self {
        Self {
            obra_id: api.obra_id,
            recurso_id: api.recurso_id,
            tipo_actividad_id: api.tipo_actividad_id,
            fecha_inicio: api.fecha_inicio,
            hora_inicio: api.hora_inicio,
            gps_inicio_lat: api.gps_inicio.map(|c| c.lat),
            gps_inicio_lon: api.gps_inicio.map(|c| c.lon),
            usuario_creacion: api.usuario_creacion,
        }
    }
}

/// Database request for closing an open activity
#[derive(Debug, Clone)]
pub struct ActividadCierreDBRequest {
    pub fecha_fin: NaiveDate,
    pub hora_fin: NaiveTime,
    pub gps_fin_lat: Option<f64>,
    pub gps_fin_lon: Option<f64>,
    pub km_recorridos: Option<Decimal>,
    pub usuario_modificacion: Option<UsuarioId>,
}

impl From<ActividadCierre> for ActividadCierreDBRequest {
    fn from(api: ActividadCierre) -> Self {
        Self {
            fecha_fin: api.fecha_fin,
            hora_fin: api.hora_fin,
            gps_fin_lat: api.gps_fin.map(|c| c.lat),
            gps_fin_lon: api.gps_fin.map(|c| c.lon),
            km_recorridos: api.km_recorridos,
            usuario_modificacion: api.usuario_modificacion,
        }
    }
}

/// Database response for an activity
#[derive(Debug, Clone)]
pub struct ActividadDBResponse {
    pub id: ActividadId,
    pub obra_id: ObraId,
    pub recurso_id: RecursoId,
    pub tipo_actividad_id: TipoActividadId,
    pub fecha_inicio: NaiveDate,
    pub hora_inicio: NaiveTime,
    pub fecha_fin: Option<NaiveDate>,
    pub hora_fin: Option<NaiveTime>,
    pub usuario_creacion: Option<UsuarioId>,
    pub usuario_modificacion: Option<UsuarioId>,
    pub gps_inicio_lat: Option<f64>,
    pub gps_inicio_lon: Option<f64>,
    pub gps_fin_lat: Option<f64>,
    pub gps_fin_lon: Option<f64>,
    pub km_recorridos: Option<Decimal>,
    pub fecha_creacion: DateTime<Utc>,
    pub fecha_modificacion: DateTime<Utc>,
}

impl ActividadDBResponse {
    pub fn en_curso(&self) -> bool {
        self.fecha_fin.is_none()
    }
}
