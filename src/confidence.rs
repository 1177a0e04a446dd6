use crate::config::ConfidenceConfig;
use crate::types::{ConfidenceLevel, ConfidenceReport, Prob3, PredictionContext, SkillRating};

// Scores how much weight the prediction deserves. Missing inputs degrade to
// neutral sub-scores; this function has no failure path.
pub fn estimate(
    a: &SkillRating,
    b: &SkillRating,
    ctx: &PredictionContext,
    outcome: &Prob3,
    sigma0: f64,
    cfg: &ConfidenceConfig,
) -> ConfidenceReport {
    let rating_certainty = if sigma0 > 0.0 {
        (1.0 - (a.sigma + b.sigma) / 2.0 / sigma0).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let fewest = a.matches_observed.min(b.matches_observed) as f64;
    let experience = (fewest / cfg.experience_full_matches as f64).clamp(0.0, 1.0);

    let form_stability = form_stability(ctx);

    // Distance of the strongest class above the uniform three-way baseline.
    let outcome_clarity = ((outcome.max_class() - 1.0 / 3.0) / (2.0 / 3.0)).clamp(0.0, 1.0);

    let score = (cfg.weight_rating * rating_certainty
        + cfg.weight_experience * experience
        + cfg.weight_form * form_stability
        + cfg.weight_clarity * outcome_clarity)
        .clamp(0.0, 1.0);

    ConfidenceReport {
        score,
        level: bucket(score, cfg),
        rating_certainty,
        experience,
        form_stability,
        outcome_clarity,
    }
}

// A form signal sitting at an extreme is a volatile streak; mid-range form
// reads as stable. No signal at all is neutral.
fn form_stability(ctx: &PredictionContext) -> f64 {
    let scores: Vec<f64> = [ctx.form_a, ctx.form_b]
        .iter()
        .flatten()
        .map(|f| 1.0 - (f.clamp(0.0, 1.0) - 0.5).abs())
        .collect();
    if scores.is_empty() {
        0.5
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    }
}

fn bucket(score: f64, cfg: &ConfidenceConfig) -> ConfidenceLevel {
    if score >= cfg.level_high {
        ConfidenceLevel::High
    } else if score >= cfg.level_medium {
        ConfidenceLevel::Medium
    } else {
        ConfidenceLevel::Low
    }
}
