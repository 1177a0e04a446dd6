use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;
use tracing::debug;

use crate::cache::{PredictionCache, context_digest};
use crate::config::EngineConfig;
use crate::confidence;
use crate::error::PredictError;
use crate::goal_rates;
use crate::market;
use crate::rating;
use crate::simulate;
use crate::store::RatingStore;
use crate::types::{
    MatchObservation, PredictionContext, PredictionResult, SimMeta, SkillRating,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct PredictOptions {
    pub simulations: Option<usize>,
    pub seed: Option<u64>,
}

// The only surface exposed to calling application code: one read path
// (predict/get_rating) and one write path (record_result).
pub struct Predictor<S: RatingStore> {
    store: S,
    cfg: EngineConfig,
    cache: PredictionCache,
    // Serializes read-modify-write rating updates so overlapping results
    // cannot drop each other's writes. Predictions never take this lock.
    record_lock: Mutex<()>,
}

impl<S: RatingStore> Predictor<S> {
    pub fn new(store: S, cfg: EngineConfig) -> Result<Self, PredictError> {
        cfg.validate()?;
        let cache = PredictionCache::new(Duration::from_secs(cfg.cache_ttl_secs));
        Ok(Self {
            store,
            cfg,
            cache,
            record_lock: Mutex::new(()),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // Returns the stored rating, or the cold-start prior for an entity that
    // has never been seen. Only a store failure surfaces as an error.
    pub fn get_rating(&self, entity_id: &str) -> Result<SkillRating, PredictError> {
        let entity_id = valid_entity(entity_id)?;
        let stored = self.store.read(entity_id)?;
        Ok(stored.unwrap_or_else(|| {
            SkillRating::cold_start(entity_id, self.cfg.rating.mu0, self.cfg.rating.sigma0)
        }))
    }

    pub fn record_result(
        &self,
        observation: &MatchObservation,
    ) -> Result<(SkillRating, SkillRating), PredictError> {
        let entity_a = valid_entity(&observation.entity_a)?;
        let entity_b = valid_entity(&observation.entity_b)?;
        if entity_a == entity_b {
            return Err(PredictError::invalid(format!(
                "an entity cannot play itself: {entity_a}"
            )));
        }

        let guard = self
            .record_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let before_a = self.get_rating(entity_a)?;
        let before_b = self.get_rating(entity_b)?;
        let (after_a, after_b) = rating::rate_pair(
            &before_a,
            &before_b,
            observation.score_a,
            observation.score_b,
            &self.cfg.rating,
            Utc::now(),
        );

        // Atomic pair write: on failure neither entity may change.
        self.store.write_pair(&after_a, &after_b)?;
        drop(guard);

        self.cache.invalidate_entity(entity_a);
        self.cache.invalidate_entity(entity_b);
        debug!(
            entity_a,
            entity_b,
            score_a = observation.score_a,
            score_b = observation.score_b,
            mu_a = after_a.mu,
            mu_b = after_b.mu,
            "recorded result"
        );

        Ok((after_a, after_b))
    }

    pub fn predict(
        &self,
        entity_a: &str,
        entity_b: &str,
        ctx: &PredictionContext,
        opts: PredictOptions,
    ) -> Result<PredictionResult, PredictError> {
        let entity_a = valid_entity(entity_a)?;
        let entity_b = valid_entity(entity_b)?;
        if entity_a == entity_b {
            return Err(PredictError::invalid(format!(
                "an entity cannot play itself: {entity_a}"
            )));
        }
        let samples = opts.simulations.unwrap_or(self.cfg.sim.simulation_count);
        if samples == 0 {
            return Err(PredictError::invalid(
                "simulation count must be positive".to_string(),
            ));
        }

        // Seeded runs are reproducibility tools; they bypass the cache in
        // both directions.
        let digest = context_digest(ctx, samples);
        if opts.seed.is_none() {
            if let Some(hit) = self.cache.get(entity_a, entity_b, digest) {
                debug!(entity_a, entity_b, "prediction cache hit");
                return Ok(hit);
            }
        }

        let rating_a = self.get_rating(entity_a)?;
        let rating_b = self.get_rating(entity_b)?;

        let (rate_a, rate_b) =
            goal_rates::expected_rates(&rating_a, &rating_b, ctx, &self.cfg.rates);

        let seed = opts.seed.unwrap_or_else(rand::random::<u64>);
        let table = simulate::simulate(
            rate_a.expected,
            rate_b.expected,
            samples,
            seed,
            &self.cfg.sim,
        );

        let outcome = table.outcome();
        let confidence = confidence::estimate(
            &rating_a,
            &rating_b,
            ctx,
            &outcome,
            self.cfg.rating.sigma0,
            &self.cfg.confidence,
        );
        let markets = market::derive(&table, &self.cfg.market);
        let top_scorelines = market::top_scorelines(&table, self.cfg.market.top_scorelines);

        let result = PredictionResult {
            outcome,
            rate_a,
            rate_b,
            top_scorelines,
            markets,
            confidence,
            sim: SimMeta {
                samples,
                std_error: table.std_error,
            },
        };

        if opts.seed.is_none() {
            self.cache.put(entity_a, entity_b, digest, result.clone());
        }
        Ok(result)
    }

    #[cfg(test)]
    pub(crate) fn cached_predictions(&self) -> usize {
        self.cache.len()
    }
}

fn valid_entity(raw: &str) -> Result<&str, PredictError> {
    let id = raw.trim();
    if id.is_empty() {
        return Err(PredictError::invalid("entity id must not be empty"));
    }
    Ok(id)
}
