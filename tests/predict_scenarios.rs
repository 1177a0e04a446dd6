use matchcast::types::{ConfidenceLevel, PredictionContext, SkillRating, Venue};
use matchcast::{
    EngineConfig, MatchObservation, MemoryRatingStore, PredictOptions, Predictor, RatingStore,
};

fn predictor() -> Predictor<MemoryRatingStore> {
    Predictor::new(MemoryRatingStore::new(), EngineConfig::default()).unwrap()
}

fn seeded(samples: usize, seed: u64) -> PredictOptions {
    PredictOptions {
        simulations: Some(samples),
        seed: Some(seed),
    }
}

fn seed_rating(store: &MemoryRatingStore, id: &str, mu: f64, sigma: f64, matches: u32) {
    let mut r = SkillRating::cold_start(id, mu, sigma);
    r.matches_observed = matches;
    // write_pair is the only write the trait offers; pair it with itself
    // under a scratch id to keep the helper simple.
    let scratch = SkillRating::cold_start(&format!("_{id}"), mu, sigma);
    store.write_pair(&r, &scratch).unwrap();
}

#[test]
fn identical_ratings_neutral_venue_is_symmetric() {
    let p = predictor();
    let result = p
        .predict(
            "north",
            "south",
            &PredictionContext::default(),
            seeded(40_000, 2024),
        )
        .unwrap();

    let o = &result.outcome;
    assert!((o.win_a + o.draw + o.win_b - 1.0).abs() < 1e-6);
    assert!(
        (o.win_a - o.win_b).abs() < 0.04,
        "expected near-symmetric outcome, got A={} B={}",
        o.win_a,
        o.win_b
    );
    let draw_prior = p.config().rating.draw_probability;
    assert!(
        (o.draw - draw_prior).abs() < 0.05,
        "draw {} should sit near the configured prior {draw_prior}",
        o.draw
    );
}

#[test]
fn heavy_favorite_at_home_is_overwhelming() {
    let p = predictor();
    seed_rating(p.store(), "titans", 40.0, 3.0, 20);
    seed_rating(p.store(), "minnows", 15.0, 3.0, 20);

    let ctx = PredictionContext {
        venue: Venue::Home,
        ..Default::default()
    };
    let result = p.predict("titans", "minnows", &ctx, seeded(40_000, 7)).unwrap();

    assert!(
        result.outcome.win_a > 0.9,
        "favorite should clear 90%, got {}",
        result.outcome.win_a
    );
    let top = &result.top_scorelines[0];
    assert!(
        top.goals_a >= top.goals_b + 2,
        "top scoreline {}-{} should favor the favorite by two or more",
        top.goals_a,
        top.goals_b
    );
}

#[test]
fn unseen_entities_predict_without_error_at_low_confidence() {
    let p = predictor();
    let result = p
        .predict(
            "ghosts",
            "strangers",
            &PredictionContext::default(),
            seeded(10_000, 5),
        )
        .unwrap();
    assert_eq!(result.confidence.level, ConfidenceLevel::Low);
    assert!((result.outcome.win_a + result.outcome.draw + result.outcome.win_b - 1.0).abs() < 1e-6);
}

#[test]
fn scoreline_table_mass_is_complete() {
    let p = predictor();
    let result = p
        .predict(
            "alpha",
            "beta",
            &PredictionContext {
                venue: Venue::Home,
                ..Default::default()
            },
            seeded(20_000, 99),
        )
        .unwrap();
    // Every over/under split partitions the same mass the grid carries.
    for line in &result.markets.over_under {
        assert!((line.over + line.under - 1.0).abs() < 1e-9);
    }
    // The ranked list is a prefix of the grid, so its mass is a lower bound.
    let top_mass: f64 = result.top_scorelines.iter().map(|s| s.probability).sum();
    assert!(top_mass > 0.0 && top_mass <= 1.0 + 1e-9);
}

#[test]
fn larger_sample_counts_report_smaller_error() {
    let p = predictor();
    let coarse = p
        .predict("a", "b", &PredictionContext::default(), seeded(2_000, 1))
        .unwrap();
    let fine = p
        .predict("a", "b", &PredictionContext::default(), seeded(32_000, 1))
        .unwrap();
    assert!(fine.sim.std_error < coarse.sim.std_error);
}

#[test]
fn confidence_rises_with_shared_match_history() {
    let p = predictor();
    let mut last = -1.0;
    for (idx, matches) in [0u32, 3, 8, 15, 30].into_iter().enumerate() {
        let a = format!("home{idx}");
        let b = format!("away{idx}");
        seed_rating(p.store(), &a, 26.0, 4.0, matches);
        seed_rating(p.store(), &b, 24.0, 4.0, matches);
        let result = p
            .predict(&a, &b, &PredictionContext::default(), seeded(10_000, 31))
            .unwrap();
        assert!(
            result.confidence.score >= last,
            "confidence regressed at {matches} matches"
        );
        last = result.confidence.score;
    }
}

#[test]
fn form_and_head_to_head_shift_the_rates() {
    let p = predictor();
    seed_rating(p.store(), "hosts", 25.0, 4.0, 12);
    seed_rating(p.store(), "guests", 25.0, 4.0, 12);

    let flat = p
        .predict(
            "hosts",
            "guests",
            &PredictionContext::default(),
            seeded(10_000, 3),
        )
        .unwrap();
    let tilted = p
        .predict(
            "hosts",
            "guests",
            &PredictionContext {
                form_a: Some(0.95),
                form_b: Some(0.2),
                ..Default::default()
            },
            seeded(10_000, 3),
        )
        .unwrap();
    assert!(tilted.rate_a.expected > flat.rate_a.expected);
    assert!(tilted.rate_b.expected < flat.rate_b.expected);
}

#[test]
fn recording_results_shifts_subsequent_predictions() {
    let p = predictor();
    let before = p
        .predict("reds", "blues", &PredictionContext::default(), seeded(20_000, 12))
        .unwrap();

    for _ in 0..6 {
        p.record_result(&MatchObservation {
            entity_a: "reds".to_string(),
            entity_b: "blues".to_string(),
            score_a: 3,
            score_b: 0,
            venue: Venue::Neutral,
        })
        .unwrap();
    }

    let after = p
        .predict("reds", "blues", &PredictionContext::default(), seeded(20_000, 12))
        .unwrap();
    assert!(
        after.outcome.win_a > before.outcome.win_a + 0.10,
        "six straight wins should move the needle: {} -> {}",
        before.outcome.win_a,
        after.outcome.win_a
    );
}
