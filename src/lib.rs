pub mod cache;
pub mod config;
pub mod confidence;
pub mod error;
pub mod gaussian;
pub mod goal_rates;
pub mod market;
pub mod metrics;
pub mod predict;
pub mod rating;
pub mod rating_db;
pub mod simulate;
pub mod store;
pub mod types;

pub use config::EngineConfig;
pub use error::{PredictError, StoreError};
pub use predict::{PredictOptions, Predictor};
pub use rating_db::SqliteRatingStore;
pub use store::{MemoryRatingStore, RatingStore};
pub use types::{
    ConfidenceLevel, HeadToHead, MatchObservation, PredictionContext, PredictionResult,
    SkillRating, Venue,
};
