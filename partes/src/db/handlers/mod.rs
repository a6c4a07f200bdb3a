//! Repository implementations for database access.
//!
//! Each repository wraps a `&mut PgConnection` (a pooled connection or an open
//! transaction), implements [`Repository`], and returns models from
//! [`crate::db::models`].
//!
//! - [`Usuarios`]: application users
//! - [`Obras`]: job sites
//! - [`Recursos`]: workers and machines, including the idempotent roster upsert
//! - [`TiposActividad`]: activity catalogue
//! - [`Actividades`]: timed activity records and their closing
//!
//! ```ignore
//! use partes::db::handlers::{Recursos, Repository};
//!
//! let mut tx = pool.begin().await?;
//! let recurso = Recursos::new(&mut tx).create(&request).await?;
//! tx.commit().await?;
//! ```

pub mod actividades;
pub mod obras;
pub mod recursos;
pub mod repository;
pub mod tipos_actividad;
pub mod usuarios;

pub use actividades::Actividades;
pub use obras::Obras;
pub use recursos::Recursos;
pub use repository::Repository;
pub use tipos_actividad::TiposActividad;
pub use usuarios::Usuarios;
