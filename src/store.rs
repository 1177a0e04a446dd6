use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::StoreError;
use crate::types::SkillRating;

// Durable mapping from entity id to its current rating. `write_pair` must be
// atomic: a failed write leaves both entities untouched.
pub trait RatingStore: Send + Sync {
    fn read(&self, entity_id: &str) -> Result<Option<SkillRating>, StoreError>;
    fn write_pair(&self, a: &SkillRating, b: &SkillRating) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryRatingStore {
    ratings: RwLock<HashMap<String, SkillRating>>,
}

impl MemoryRatingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ratings
            .read()
            .map(|map| map.len())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RatingStore for MemoryRatingStore {
    fn read(&self, entity_id: &str) -> Result<Option<SkillRating>, StoreError> {
        let map = self
            .ratings
            .read()
            .map_err(|_| StoreError::Backend("rating map lock poisoned".to_string()))?;
        Ok(map.get(entity_id).cloned())
    }

    fn write_pair(&self, a: &SkillRating, b: &SkillRating) -> Result<(), StoreError> {
        // One write lock covers both inserts, so readers never observe a
        // half-applied result.
        let mut map = self
            .ratings
            .write()
            .map_err(|_| StoreError::Backend("rating map lock poisoned".to_string()))?;
        map.insert(a.entity_id.clone(), a.clone());
        map.insert(b.entity_id.clone(), b.clone());
        Ok(())
    }
}
