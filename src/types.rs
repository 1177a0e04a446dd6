use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Venue {
    Home,
    #[default]
    Neutral,
    Away,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillRating {
    pub entity_id: String,
    pub mu: f64,
    pub sigma: f64,
    pub matches_observed: u32,
    pub last_updated: DateTime<Utc>,
}

impl SkillRating {
    pub fn cold_start(entity_id: &str, mu0: f64, sigma0: f64) -> Self {
        Self {
            entity_id: entity_id.to_string(),
            mu: mu0,
            sigma: sigma0,
            matches_observed: 0,
            last_updated: Utc::now(),
        }
    }

    // Conservative single-number rank: mean minus three standard deviations.
    pub fn ordinal(&self) -> f64 {
        self.mu - 3.0 * self.sigma
    }
}

// A finished match as reported to the rating model. Venue describes entity A's
// assignment; scores are final and non-negative by construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchObservation {
    pub entity_a: String,
    pub entity_b: String,
    pub score_a: u32,
    pub score_b: u32,
    #[serde(default)]
    pub venue: Venue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    WinA,
    Draw,
    WinB,
}

impl Outcome {
    pub fn from_scores(score_a: u32, score_b: u32) -> Self {
        if score_a > score_b {
            Outcome::WinA
        } else if score_a < score_b {
            Outcome::WinB
        } else {
            Outcome::Draw
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HeadToHead {
    pub wins_a: u32,
    pub draws: u32,
    pub wins_b: u32,
}

impl HeadToHead {
    pub fn total(&self) -> u32 {
        self.wins_a + self.draws + self.wins_b
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PredictionContext {
    #[serde(default)]
    pub venue: Venue,
    // Recent form normalized to [0,1]; 0.5 (or absent) is neutral.
    #[serde(default)]
    pub form_a: Option<f64>,
    #[serde(default)]
    pub form_b: Option<f64>,
    #[serde(default)]
    pub head_to_head: Option<HeadToHead>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prob3 {
    pub win_a: f64,
    pub draw: f64,
    pub win_b: f64,
}

impl Prob3 {
    pub fn uniform() -> Self {
        Self {
            win_a: 1.0 / 3.0,
            draw: 1.0 / 3.0,
            win_b: 1.0 / 3.0,
        }
    }

    // Renormalizes in place; falls back to uniform when the mass vanishes.
    pub fn normalized(self) -> Self {
        let sum = self.win_a + self.draw + self.win_b;
        if sum > 1e-12 {
            Self {
                win_a: self.win_a / sum,
                draw: self.draw / sum,
                win_b: self.win_b / sum,
            }
        } else {
            Self::uniform()
        }
    }

    pub fn sum(&self) -> f64 {
        self.win_a + self.draw + self.win_b
    }

    pub fn max_class(&self) -> f64 {
        self.win_a.max(self.draw).max(self.win_b)
    }
}

// Expected-goals figure with an analytic 25th-75th percentile band.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RateBand {
    pub expected: f64,
    pub low: f64,
    pub high: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scoreline {
    pub goals_a: u32,
    pub goals_b: u32,
    pub probability: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OverUnderLine {
    pub threshold: f64,
    pub over: f64,
    pub under: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketBoard {
    // Offered decimal odds (margin already subtracted from the fair price).
    pub win_a: f64,
    pub draw: f64,
    pub win_b: f64,
    pub over_under: Vec<OverUnderLine>,
    // Probability both sides score at least once.
    pub both_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ConfidenceReport {
    pub score: f64,
    pub level: ConfidenceLevel,
    pub rating_certainty: f64,
    pub experience: f64,
    pub form_stability: f64,
    pub outcome_clarity: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SimMeta {
    pub samples: usize,
    // Worst-case standard error of any tabulated probability.
    pub std_error: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    pub outcome: Prob3,
    pub rate_a: RateBand,
    pub rate_b: RateBand,
    pub top_scorelines: Vec<Scoreline>,
    pub markets: MarketBoard,
    pub confidence: ConfidenceReport,
    pub sim: SimMeta,
}
