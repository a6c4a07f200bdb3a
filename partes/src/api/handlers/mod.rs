//! HTTP request handlers for the REST API.
//!
//! Each handler validates its input, runs the query through a repository from
//! [`crate::db::handlers`] and returns [`crate::errors::Error`] on failure, which maps onto
//! a status code and message.
//!
//! - [`usuarios`]: application users
//! - [`obras`]: job sites
//! - [`recursos`]: workers and machines
//! - [`tipos_actividad`]: activity catalogue
//! - [`actividades`]: opening, listing and closing timed activities

pub mod actividades;
pub mod obras;
pub mod recursos;
pub mod tipos_actividad;
pub mod usuarios;
