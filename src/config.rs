use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::PredictError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RatingConfig {
    // Prior belief for unseen entities.
    pub mu0: f64,
    pub sigma0: f64,
    // Performance variance: how noisy a single match result is.
    pub beta: f64,
    // Per-update uncertainty drift, applied before each observation.
    pub tau: f64,
    // Prior probability mass reserved for draws; drives the draw margin.
    pub draw_probability: f64,
    pub sigma_floor: f64,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            mu0: 25.0,
            sigma0: 25.0 / 3.0,
            beta: 25.0 / 6.0,
            tau: 25.0 / 300.0,
            draw_probability: 0.26,
            sigma_floor: 0.80,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RateConfig {
    pub goals_total_base: f64,
    pub home_advantage: f64,
    // Skill-to-goals mapping: maximum total swing and the rating scale at
    // which the S-curve starts to saturate.
    pub skill_swing_max: f64,
    pub skill_sigma_scale: f64,
    pub form_mult_min: f64,
    pub form_mult_max: f64,
    pub h2h_min_matches: u32,
    pub h2h_weight: f64,
    pub h2h_mult_cap: f64,
    pub lambda_min: f64,
    pub lambda_max: f64,
}

impl Default for RateConfig {
    fn default() -> Self {
        Self {
            goals_total_base: 2.60,
            home_advantage: 0.15,
            skill_swing_max: 2.80,
            skill_sigma_scale: 25.0 / 3.0,
            form_mult_min: 0.70,
            form_mult_max: 1.30,
            h2h_min_matches: 4,
            h2h_weight: 0.20,
            h2h_mult_cap: 0.10,
            lambda_min: 0.10,
            lambda_max: 6.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    pub simulation_count: usize,
    pub score_cap_max: u32,
    // Low-score correlation coefficient, typically small and negative.
    pub rho: f64,
    pub over_under_lines: Vec<f64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            simulation_count: 10_000,
            score_cap_max: 10,
            rho: -0.10,
            over_under_lines: vec![1.5, 2.5, 3.5],
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ConfidenceConfig {
    pub weight_rating: f64,
    pub weight_experience: f64,
    pub weight_form: f64,
    pub weight_clarity: f64,
    // Matches at which the experience sub-score saturates.
    pub experience_full_matches: u32,
    pub level_medium: f64,
    pub level_high: f64,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            weight_rating: 0.35,
            weight_experience: 0.25,
            weight_form: 0.15,
            weight_clarity: 0.25,
            experience_full_matches: 15,
            level_medium: 0.45,
            level_high: 0.70,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MarketConfig {
    pub bookmaker_margin: f64,
    // Floor applied before dividing, so odds stay bounded.
    pub min_probability: f64,
    pub top_scorelines: usize,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            bookmaker_margin: 0.05,
            min_probability: 0.001,
            top_scorelines: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub rating: RatingConfig,
    #[serde(default)]
    pub rates: RateConfig,
    #[serde(default)]
    pub sim: SimConfig,
    #[serde(default)]
    pub confidence: ConfidenceConfig,
    #[serde(default)]
    pub market: MarketConfig,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

fn default_cache_ttl_secs() -> u64 {
    300
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rating: RatingConfig::default(),
            rates: RateConfig::default(),
            sim: SimConfig::default(),
            confidence: ConfidenceConfig::default(),
            market: MarketConfig::default(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), PredictError> {
        let r = &self.rating;
        if r.sigma0 <= 0.0 || r.beta <= 0.0 || r.tau < 0.0 {
            return Err(PredictError::Config(
                "sigma0 and beta must be positive, tau non-negative".to_string(),
            ));
        }
        if r.sigma_floor <= 0.0 || r.sigma_floor >= r.sigma0 {
            return Err(PredictError::Config(
                "sigma_floor must be in (0, sigma0)".to_string(),
            ));
        }
        if !(0.0 < r.draw_probability && r.draw_probability < 1.0) {
            return Err(PredictError::Config(
                "draw_probability must be in (0, 1)".to_string(),
            ));
        }

        let g = &self.rates;
        if g.lambda_min <= 0.0 || g.lambda_min >= g.lambda_max {
            return Err(PredictError::Config(
                "lambda bounds must satisfy 0 < lambda_min < lambda_max".to_string(),
            ));
        }
        if g.form_mult_min > 1.0 || g.form_mult_max < 1.0 || g.form_mult_min >= g.form_mult_max {
            return Err(PredictError::Config(
                "form multiplier bounds must straddle 1.0".to_string(),
            ));
        }
        if g.skill_sigma_scale <= 0.0 || g.goals_total_base <= 0.0 {
            return Err(PredictError::Config(
                "skill_sigma_scale and goals_total_base must be positive".to_string(),
            ));
        }

        let s = &self.sim;
        if s.simulation_count == 0 {
            return Err(PredictError::Config(
                "simulation_count must be positive".to_string(),
            ));
        }
        if s.score_cap_max < 2 {
            return Err(PredictError::Config(
                "score_cap_max must be at least 2".to_string(),
            ));
        }

        let c = &self.confidence;
        let weight_sum = c.weight_rating + c.weight_experience + c.weight_form + c.weight_clarity;
        if (weight_sum - 1.0).abs() > 1e-6 {
            return Err(PredictError::Config(format!(
                "confidence weights must sum to 1, got {weight_sum}"
            )));
        }
        if c.experience_full_matches == 0 || c.level_medium >= c.level_high {
            return Err(PredictError::Config(
                "confidence thresholds must be ordered and experience_full_matches positive"
                    .to_string(),
            ));
        }

        let m = &self.market;
        if !(0.0..1.0).contains(&m.bookmaker_margin) {
            return Err(PredictError::Config(
                "bookmaker_margin must be in [0, 1)".to_string(),
            ));
        }
        if m.min_probability <= 0.0 || m.top_scorelines == 0 {
            return Err(PredictError::Config(
                "min_probability must be positive and top_scorelines non-zero".to_string(),
            ));
        }

        Ok(())
    }

    pub fn load_json(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read engine config {}", path.display()))?;
        let cfg: EngineConfig = serde_json::from_str(&raw).context("parse engine config")?;
        Ok(cfg)
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(self).context("serialize engine config")?;
        fs::write(&tmp, json).context("write engine config")?;
        fs::rename(&tmp, path).context("swap engine config")?;
        Ok(())
    }
}
