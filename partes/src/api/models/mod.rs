//! API request and response data models.
//!
//! These models define the public JSON contract and are kept apart from the database
//! models in [`crate::db::models`], so the wire shape (for example the `agrCoste` field
//! the front end and the seeders send) can differ from column naming.
//!
//! - [`recursos`]: workers and machines
//! - [`obras`]: job sites
//! - [`tipos_actividad`]: activity types
//! - [`usuarios`]: application users and their roles
//! - [`actividades`]: timed activity records, opening and closing
//! - [`pagination`]: shared `skip`/`limit` query parameters

pub mod actividades;
pub mod obras;
pub mod pagination;
pub mod recursos;
pub mod tipos_actividad;
pub mod usuarios;
