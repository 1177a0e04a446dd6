use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};

use crate::types::{PredictionContext, PredictionResult};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    entity_a: String,
    entity_b: String,
    context_digest: [u8; 32],
}

struct CacheEntry {
    stored_at: Instant,
    result: PredictionResult,
}

// Short-lived per-matchup memo. Entries expire on a TTL, but a rating write
// for either entity removes them eagerly so a fresh rating is never shadowed
// by a stale prediction.
pub struct PredictionCache {
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl PredictionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, entity_a: &str, entity_b: &str, digest: [u8; 32]) -> Option<PredictionResult> {
        let key = CacheKey {
            entity_a: entity_a.to_string(),
            entity_b: entity_b.to_string(),
            context_digest: digest,
        };
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        match entries.get(&key) {
            Some(entry) if entry.stored_at.elapsed() <= self.ttl => Some(entry.result.clone()),
            Some(_) => {
                entries.remove(&key);
                None
            }
            None => None,
        }
    }

    pub fn put(
        &self,
        entity_a: &str,
        entity_b: &str,
        digest: [u8; 32],
        result: PredictionResult,
    ) {
        let key = CacheKey {
            entity_a: entity_a.to_string(),
            entity_b: entity_b.to_string(),
            context_digest: digest,
        };
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.insert(
            key,
            CacheEntry {
                stored_at: Instant::now(),
                result,
            },
        );
    }

    pub fn invalidate_entity(&self, entity_id: &str) {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.retain(|key, _| key.entity_a != entity_id && key.entity_b != entity_id);
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// Digest over everything besides the pair itself that changes the answer.
pub fn context_digest(ctx: &PredictionContext, simulations: usize) -> [u8; 32] {
    let mut hasher = Sha256::new();
    if let Ok(bytes) = serde_json::to_vec(ctx) {
        hasher.update(&bytes);
    }
    hasher.update(simulations.to_le_bytes());
    hasher.finalize().into()
}
