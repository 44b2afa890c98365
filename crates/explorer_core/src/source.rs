use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type SourceId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceCategory {
    Database,
    Web,
    Api,
}

impl fmt::Display for SourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceCategory::Database => write!(f, "database"),
            SourceCategory::Web => write!(f, "web"),
            SourceCategory::Api => write!(f, "api"),
        }
    }
}

/// A named data source that a federated search fans out to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub id: SourceId,
    pub name: String,
    pub category: SourceCategory,
}

impl Source {
    pub fn new(id: impl Into<SourceId>, name: impl Into<String>, category: SourceCategory) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("source id must not be empty (name {name:?})")]
    EmptyId { name: String },
    #[error("duplicate source id {0:?}")]
    DuplicateId(SourceId),
}

/// Ordered, immutable catalog of data sources.
///
/// Registry order is significant: start triggers are staggered by index.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceRegistry {
    sources: Vec<Source>,
    index: HashMap<SourceId, usize>,
}

impl SourceRegistry {
    pub fn new(sources: Vec<Source>) -> Result<Self, RegistryError> {
        let mut seen = HashSet::with_capacity(sources.len());
        for source in &sources {
            if source.id.trim().is_empty() {
                return Err(RegistryError::EmptyId {
                    name: source.name.clone(),
                });
            }
            if !seen.insert(source.id.as_str()) {
                return Err(RegistryError::DuplicateId(source.id.clone()));
            }
        }
        Ok(Self::from_validated(sources))
    }

    /// Built-in catalog shown by the dashboard when no configuration is supplied.
    pub fn default_catalog() -> Self {
        let sources = vec![
            Source::new("crunchbase", "Crunchbase", SourceCategory::Database),
            Source::new("pitchbook", "PitchBook", SourceCategory::Database),
            Source::new("sec-edgar", "SEC EDGAR", SourceCategory::Api),
            Source::new("opencorporates", "OpenCorporates", SourceCategory::Api),
            Source::new("linkedin", "LinkedIn", SourceCategory::Web),
            Source::new("news", "News Search", SourceCategory::Web),
        ];
        let registry = Self::from_validated(sources);
        debug_assert_eq!(registry.index.len(), registry.sources.len());
        registry
    }

    /// Builds the lookup index without checking ids.
    fn from_validated(sources: Vec<Source>) -> Self {
        let index = sources
            .iter()
            .enumerate()
            .map(|(position, source)| (source.id.clone(), position))
            .collect();
        Self { sources, index }
    }

    pub fn list(&self) -> &[Source] {
        &self.sources
    }

    pub fn get(&self, id: &str) -> Option<&Source> {
        self.index_of(id).map(|position| &self.sources[position])
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn ids(&self) -> Vec<SourceId> {
        self.sources.iter().map(|source| source.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
