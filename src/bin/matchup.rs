use std::fs;
use std::path::PathBuf;

use matchcast::metrics::evaluate_probs;
use matchcast::types::Outcome;
use matchcast::{
    EngineConfig, MatchObservation, MemoryRatingStore, PredictOptions, PredictionContext,
    Predictor, Venue,
};

#[derive(Debug, serde::Deserialize)]
struct MatchupCase {
    entity_a: String,
    entity_b: String,
    #[serde(default)]
    context: PredictionContext,
    #[serde(default)]
    history: Vec<HistoryRow>,
    #[serde(default)]
    config: Option<EngineConfig>,
    #[serde(default)]
    simulations: Option<usize>,
    #[serde(default)]
    seed: Option<u64>,
}

#[derive(Debug, serde::Deserialize)]
struct HistoryRow {
    home: String,
    away: String,
    score_home: u32,
    score_away: u32,
    #[serde(default)]
    neutral: bool,
}

// Walk-forward predictions during replay use a smaller sample count; they
// only feed the summary metrics, not the headline prediction.
const REPLAY_SIMULATIONS: usize = 4_000;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("tests/fixtures/matchup_case.json"));

    let raw = fs::read_to_string(&path)?;
    let case: MatchupCase = serde_json::from_str(&raw)?;

    let cfg = case.config.clone().unwrap_or_default();
    let predictor = Predictor::new(MemoryRatingStore::new(), cfg)?;

    // Replay the history in order, predicting each match before scoring it
    // so the metrics are honest walk-forward numbers.
    let mut replay_predictions = Vec::new();
    let mut replay_outcomes = Vec::new();
    for row in &case.history {
        let ctx = PredictionContext {
            venue: if row.neutral {
                Venue::Neutral
            } else {
                Venue::Home
            },
            ..Default::default()
        };
        let predicted = predictor.predict(
            &row.home,
            &row.away,
            &ctx,
            PredictOptions {
                simulations: Some(REPLAY_SIMULATIONS),
                seed: None,
            },
        )?;
        replay_predictions.push(predicted.outcome);
        replay_outcomes.push(Outcome::from_scores(row.score_home, row.score_away));

        predictor.record_result(&MatchObservation {
            entity_a: row.home.clone(),
            entity_b: row.away.clone(),
            score_a: row.score_home,
            score_b: row.score_away,
            venue: ctx.venue,
        })?;
    }

    let result = predictor.predict(
        &case.entity_a,
        &case.entity_b,
        &case.context,
        PredictOptions {
            simulations: case.simulations,
            seed: case.seed,
        },
    )?;

    let rating_a = predictor.get_rating(&case.entity_a)?;
    let rating_b = predictor.get_rating(&case.entity_b)?;

    println!("{} vs {}", case.entity_a, case.entity_b);
    println!(
        "  ratings     {:>6.2} +/- {:.2} ({} matches)   {:>6.2} +/- {:.2} ({} matches)",
        rating_a.mu,
        rating_a.sigma,
        rating_a.matches_observed,
        rating_b.mu,
        rating_b.sigma,
        rating_b.matches_observed,
    );
    println!(
        "  outcome     A {:>5.1}%   draw {:>5.1}%   B {:>5.1}%",
        result.outcome.win_a * 100.0,
        result.outcome.draw * 100.0,
        result.outcome.win_b * 100.0,
    );
    println!(
        "  rates       A {:.2} [{:.2}..{:.2}]   B {:.2} [{:.2}..{:.2}]",
        result.rate_a.expected,
        result.rate_a.low,
        result.rate_a.high,
        result.rate_b.expected,
        result.rate_b.low,
        result.rate_b.high,
    );
    println!(
        "  odds        A {:.2}   draw {:.2}   B {:.2}",
        result.markets.win_a, result.markets.draw, result.markets.win_b,
    );
    for line in &result.markets.over_under {
        println!(
            "  totals      over {:.1} {:>5.1}%   under {:>5.1}%",
            line.threshold,
            line.over * 100.0,
            line.under * 100.0,
        );
    }
    println!(
        "  both score  {:>5.1}%",
        result.markets.both_score * 100.0
    );
    for s in &result.top_scorelines {
        println!(
            "  scoreline   {}-{} {:>5.1}%",
            s.goals_a,
            s.goals_b,
            s.probability * 100.0
        );
    }
    println!(
        "  confidence  {:.2} ({:?})   samples {}   se {:.4}",
        result.confidence.score, result.confidence.level, result.sim.samples, result.sim.std_error,
    );

    if !replay_predictions.is_empty() {
        let m = evaluate_probs(&replay_predictions, &replay_outcomes);
        println!(
            "  replay      {} matches   brier {:.3}   log-loss {:.3}   accuracy {:.1}%",
            m.samples,
            m.brier,
            m.log_loss,
            m.accuracy * 100.0,
        );
    }

    Ok(())
}
