//! Common type definitions shared by the database and API layers.
//!
//! # ID Types
//!
//! Every table uses a `SERIAL` primary key, so entity IDs are `i32` wrapped in type
//! aliases for readability:
//!
//! - [`UsuarioId`]: application user
//! - [`ObraId`]: job site
//! - [`RecursoId`]: worker or machine
//! - [`TipoActividadId`]: activity type
//! - [`ActividadId`]: timed activity record
//!
//! # Constrained values
//!
//! [`Rol`] and [`TipoRecurso`] mirror the `CHECK` constraints on `usuarios.rol` and
//! `recursos.tipo`. They are stored as text and converted with `TryFrom<String>` when rows
//! are decoded.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

pub type UsuarioId = i32;
pub type ObraId = i32;
pub type RecursoId = i32;
pub type TipoActividadId = i32;
pub type ActividadId = i32;

/// Role of an application user (`usuarios.rol`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Rol {
    Operario,
    JefeEquipo,
    TecnicoTransporte,
    Administrador,
}

impl Rol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rol::Operario => "operario",
            Rol::JefeEquipo => "jefe_equipo",
            Rol::TecnicoTransporte => "tecnico_transporte",
            Rol::Administrador => "administrador",
        }
    }
}

/// Kind of trackable resource (`recursos.tipo`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TipoRecurso {
    Operario,
    Maquina,
}

impl TipoRecurso {
    pub const ALL: [TipoRecurso; 2] = [TipoRecurso::Operario, TipoRecurso::Maquina];

    pub fn as_str(&self) -> &'static str {
        match self {
            TipoRecurso::Operario => "operario",
            TipoRecurso::Maquina => "maquina",
        }
    }
}

/// Raised when a stored or submitted value is outside an enumerated set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl FromStr for Rol {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "operario" => Ok(Rol::Operario),
            "jefe_equipo" => Ok(Rol::JefeEquipo),
            "tecnico_transporte" => Ok(Rol::TecnicoTransporte),
            "administrador" => Ok(Rol::Administrador),
            other => Err(UnknownVariant {
                kind: "rol",
                value: other.to_string(),
            }),
        }
    }
}

impl FromStr for TipoRecurso {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "operario" => Ok(TipoRecurso::Operario),
            "maquina" => Ok(TipoRecurso::Maquina),
            other => Err(UnknownVariant {
                kind: "tipo de recurso",
                value: other.to_string(),
            }),
        }
    }
}

// sqlx decodes the text column into a String first, then converts via these impls
// (see `#[sqlx(try_from = "String")]` on the row structs).
impl TryFrom<String> for Rol {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl TryFrom<String> for TipoRecurso {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Rol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for TipoRecurso {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
