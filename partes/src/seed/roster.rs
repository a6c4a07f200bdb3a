//! The declarative roster shared by every loader.

use super::SeedError;
use crate::api::models::recursos::RecursoCreate;
use crate::types::TipoRecurso;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

const EMBEDDED: &str = include_str!("../../seed/recursos.json");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Roster {
    pub recursos: Vec<RecursoCreate>,
}

impl Roster {
    /// The roster shipped with the binary.
    pub fn embedded() -> Result<Self, SeedError> {
        Self::from_json(EMBEDDED)
    }

    pub async fn from_path(path: &Path) -> Result<Self, SeedError> {
        let text = tokio::fs::read_to_string(path).await.map_err(|source| SeedError::RosterRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, SeedError> {
        let roster: Roster = serde_json::from_str(text)?;
        roster.validate()?;
        Ok(roster)
    }

    fn validate(&self) -> Result<(), SeedError> {
        let mut seen = HashSet::new();
        for recurso in &self.recursos {
            recurso
                .validate()
                .map_err(|e| SeedError::InvalidRoster(format!("{}: {e}", recurso.codigo)))?;
            if !seen.insert(recurso.codigo.trim()) {
                return Err(SeedError::InvalidRoster(format!("duplicate codigo {}", recurso.codigo)));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.recursos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recursos.is_empty()
    }

    /// Records of one category, in roster order.
    pub fn by_tipo(&self, tipo: TipoRecurso) -> impl Iterator<Item = &RecursoCreate> {
        self.recursos.iter().filter(move |r| r.tipo == tipo)
    }
}
