use std::collections::BTreeMap;

use linkage_solver::Linkage;
use tracing::{info, warn};

use crate::document::{decode_linkage, encode_linkage};
use crate::errors::StoreError;
use crate::metadata::LinkageMetadata;

/// Named storage for linkages.
///
/// The solver never calls into a repository; hosts load a linkage, hand it to
/// the solver, and save whatever they want to keep.
pub trait LinkageRepository {
    /// Store `linkage` under `name`. Fails if the name is already taken.
    fn save(&mut self, name: &str, linkage: &Linkage) -> Result<(), StoreError>;

    /// Load and validate the linkage stored under `name`.
    fn load(&self, name: &str) -> Result<Linkage, StoreError>;

    /// Remove the linkage stored under `name`.
    fn delete(&mut self, name: &str) -> Result<(), StoreError>;

    /// Every stored name, sorted.
    fn names(&self) -> Vec<String>;

    fn contains(&self, name: &str) -> bool {
        self.names().iter().any(|n| n == name)
    }
}

/// Repository that keeps each linkage as a JSON document in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    documents: BTreeMap<String, String>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// The raw document stored under `name`.
    pub fn document(&self, name: &str) -> Option<&str> {
        self.documents.get(name).map(String::as_str)
    }

    /// Store a raw document without decoding it. It is validated on load.
    pub fn import_document(&mut self, name: &str, json: impl Into<String>) -> Result<(), StoreError> {
        self.claim(name)?;
        self.documents.insert(name.to_string(), json.into());
        info!(name, "imported linkage document");
        Ok(())
    }

    /// Load a linkage together with its stored metadata.
    pub fn load_with_metadata(&self, name: &str) -> Result<(Linkage, LinkageMetadata), StoreError> {
        let json = self
            .documents
            .get(name)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;
        decode_linkage(json)
    }

    fn claim(&self, name: &str) -> Result<(), StoreError> {
        if name.is_empty() {
            return Err(StoreError::EmptyName);
        }
        if self.documents.contains_key(name) {
            warn!(name, "linkage name already taken");
            return Err(StoreError::AlreadyExists(name.to_string()));
        }
        Ok(())
    }
}

impl LinkageRepository for MemoryRepository {
    fn save(&mut self, name: &str, linkage: &Linkage) -> Result<(), StoreError> {
        self.claim(name)?;
        let json = encode_linkage(linkage, &LinkageMetadata::new(name))?;
        self.documents.insert(name.to_string(), json);
        info!(
            name,
            joints = linkage.joint_count(),
            rods = linkage.rod_count(),
            "saved linkage"
        );
        Ok(())
    }

    fn load(&self, name: &str) -> Result<Linkage, StoreError> {
        self.load_with_metadata(name).map(|(linkage, _)| linkage)
    }

    fn delete(&mut self, name: &str) -> Result<(), StoreError> {
        self.documents
            .remove(name)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;
        info!(name, "deleted linkage");
        Ok(())
    }

    fn names(&self) -> Vec<String> {
        self.documents.keys().cloned().collect()
    }

    fn contains(&self, name: &str) -> bool {
        self.documents.contains_key(name)
    }
}
