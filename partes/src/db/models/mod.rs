//! Database record structures and requests.
//!
//! Each module holds the `*CreateDBRequest`, `*UpdateDBRequest` and `*DBResponse` types
//! its repository in [`crate::db::handlers`] works with.

pub mod actividades;
pub mod obras;
pub mod recursos;
pub mod tipos_actividad;
pub mod usuarios;
