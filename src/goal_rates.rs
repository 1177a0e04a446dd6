use crate::config::RateConfig;
use crate::types::{PredictionContext, RateBand, SkillRating, Venue};

// 25th/75th percentile of the skill-gap belief, in standard deviations.
const QUARTILE_Z: f64 = 0.6745;

// Maps two ratings plus context onto expected-goals figures for each side,
// with an analytic interquartile band derived from the rating uncertainty.
pub fn expected_rates(
    a: &SkillRating,
    b: &SkillRating,
    ctx: &PredictionContext,
    cfg: &RateConfig,
) -> (RateBand, RateBand) {
    // No observed matches means no evidence behind form or head-to-head.
    let cold = a.matches_observed == 0 || b.matches_observed == 0;

    let gap = a.mu - b.mu;
    let (la, lb) = rates_at_gap(gap, ctx, cold, cfg);

    let spread = (a.sigma * a.sigma + b.sigma * b.sigma).sqrt();
    let (la_down, lb_up) = rates_at_gap(gap - QUARTILE_Z * spread, ctx, cold, cfg);
    let (la_up, lb_down) = rates_at_gap(gap + QUARTILE_Z * spread, ctx, cold, cfg);

    (
        RateBand {
            expected: la,
            low: la_down.min(la),
            high: la_up.max(la),
        },
        RateBand {
            expected: lb,
            low: lb_down.min(lb),
            high: lb_up.max(lb),
        },
    )
}

fn rates_at_gap(gap: f64, ctx: &PredictionContext, cold: bool, cfg: &RateConfig) -> (f64, f64) {
    let base = cfg.goals_total_base / 2.0;

    // Bounded S-curve: saturates for extreme mismatches instead of diverging.
    let swing = cfg.skill_swing_max * saturate(gap / cfg.skill_sigma_scale);
    let mut la = base + swing / 2.0;
    let mut lb = base - swing / 2.0;

    match ctx.venue {
        Venue::Home => {
            la += cfg.home_advantage;
            lb -= cfg.home_advantage;
        }
        Venue::Away => {
            la -= cfg.home_advantage;
            lb += cfg.home_advantage;
        }
        Venue::Neutral => {}
    }

    if !cold {
        la *= form_multiplier(ctx.form_a, cfg);
        lb *= form_multiplier(ctx.form_b, cfg);

        if let Some(h2h) = &ctx.head_to_head {
            if h2h.total() >= cfg.h2h_min_matches {
                let edge = (h2h.wins_a as f64 - h2h.wins_b as f64) / h2h.total() as f64;
                let tilt = (cfg.h2h_weight * edge).clamp(-cfg.h2h_mult_cap, cfg.h2h_mult_cap);
                la *= 1.0 + tilt;
                lb *= 1.0 - tilt;
            }
        }
    }

    (
        la.clamp(cfg.lambda_min, cfg.lambda_max),
        lb.clamp(cfg.lambda_min, cfg.lambda_max),
    )
}

// 2*sigmoid(x) - 1: odd, monotone, bounded to (-1, 1).
fn saturate(x: f64) -> f64 {
    2.0 / (1.0 + (-x).exp()) - 1.0
}

fn form_multiplier(form: Option<f64>, cfg: &RateConfig) -> f64 {
    match form {
        None => 1.0,
        Some(f) => {
            let f = f.clamp(0.0, 1.0);
            cfg.form_mult_min + (cfg.form_mult_max - cfg.form_mult_min) * f
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HeadToHead;

    fn rating(mu: f64, sigma: f64, matches: u32) -> SkillRating {
        let mut r = SkillRating::cold_start("x", mu, sigma);
        r.matches_observed = matches;
        r
    }

    fn neutral() -> PredictionContext {
        PredictionContext::default()
    }

    #[test]
    fn equal_teams_neutral_venue_split_the_base_rate() {
        let cfg = RateConfig::default();
        let a = rating(25.0, 4.0, 10);
        let b = rating(25.0, 4.0, 10);
        let (ra, rb) = expected_rates(&a, &b, &neutral(), &cfg);
        assert!((ra.expected - cfg.goals_total_base / 2.0).abs() < 1e-9);
        assert!((ra.expected - rb.expected).abs() < 1e-9);
    }

    #[test]
    fn home_advantage_is_additive_and_symmetric() {
        let cfg = RateConfig::default();
        let a = rating(25.0, 4.0, 10);
        let b = rating(25.0, 4.0, 10);
        let ctx = PredictionContext {
            venue: Venue::Home,
            ..Default::default()
        };
        let (ra, rb) = expected_rates(&a, &b, &ctx, &cfg);
        let base = cfg.goals_total_base / 2.0;
        assert!((ra.expected - (base + cfg.home_advantage)).abs() < 1e-9);
        assert!((rb.expected - (base - cfg.home_advantage)).abs() < 1e-9);
    }

    #[test]
    fn extreme_gap_saturates_inside_lambda_bounds() {
        let cfg = RateConfig::default();
        let a = rating(200.0, 3.0, 30);
        let b = rating(-100.0, 3.0, 30);
        let (ra, rb) = expected_rates(&a, &b, &neutral(), &cfg);
        assert!(ra.expected <= cfg.lambda_max);
        assert!(rb.expected >= cfg.lambda_min);
        // The swing is bounded, so even an absurd gap cannot exceed it.
        let max_possible = cfg.goals_total_base / 2.0 + cfg.skill_swing_max / 2.0;
        assert!(ra.expected <= max_possible + 1e-9);
    }

    #[test]
    fn form_scales_within_bounds() {
        let cfg = RateConfig::default();
        let a = rating(25.0, 4.0, 10);
        let b = rating(25.0, 4.0, 10);

        let hot = PredictionContext {
            form_a: Some(1.0),
            ..Default::default()
        };
        let icy = PredictionContext {
            form_a: Some(0.0),
            ..Default::default()
        };
        let base = cfg.goals_total_base / 2.0;
        let (ra_hot, _) = expected_rates(&a, &b, &hot, &cfg);
        let (ra_icy, _) = expected_rates(&a, &b, &icy, &cfg);
        assert!((ra_hot.expected - base * cfg.form_mult_max).abs() < 1e-9);
        assert!((ra_icy.expected - base * cfg.form_mult_min).abs() < 1e-9);
    }

    #[test]
    fn unseen_entity_disables_form_and_h2h() {
        let cfg = RateConfig::default();
        let seen = rating(25.0, 4.0, 10);
        let unseen = rating(25.0, 8.33, 0);
        let ctx = PredictionContext {
            form_a: Some(1.0),
            head_to_head: Some(HeadToHead {
                wins_a: 6,
                draws: 1,
                wins_b: 0,
            }),
            ..Default::default()
        };
        let (ra, rb) = expected_rates(&seen, &unseen, &ctx, &cfg);
        // Only the skill term applies, and the gap is zero.
        assert!((ra.expected - cfg.goals_total_base / 2.0).abs() < 1e-9);
        assert!((rb.expected - cfg.goals_total_base / 2.0).abs() < 1e-9);
    }

    #[test]
    fn shallow_h2h_history_is_a_no_op() {
        let cfg = RateConfig::default();
        let a = rating(25.0, 4.0, 10);
        let b = rating(25.0, 4.0, 10);
        let thin = PredictionContext {
            head_to_head: Some(HeadToHead {
                wins_a: 2,
                draws: 0,
                wins_b: 0,
            }),
            ..Default::default()
        };
        let deep = PredictionContext {
            head_to_head: Some(HeadToHead {
                wins_a: 8,
                draws: 0,
                wins_b: 0,
            }),
            ..Default::default()
        };
        let (ra_thin, _) = expected_rates(&a, &b, &thin, &cfg);
        let (ra_deep, _) = expected_rates(&a, &b, &deep, &cfg);
        assert!((ra_thin.expected - cfg.goals_total_base / 2.0).abs() < 1e-9);
        assert!(ra_deep.expected > ra_thin.expected);
    }

    #[test]
    fn band_brackets_the_expectation_and_widens_with_sigma() {
        let cfg = RateConfig::default();
        let sharp_a = rating(27.0, 1.5, 20);
        let sharp_b = rating(23.0, 1.5, 20);
        let vague_a = rating(27.0, 8.0, 1);
        let vague_b = rating(23.0, 8.0, 1);

        let (ra_sharp, _) = expected_rates(&sharp_a, &sharp_b, &neutral(), &cfg);
        let (ra_vague, _) = expected_rates(&vague_a, &vague_b, &neutral(), &cfg);

        assert!(ra_sharp.low <= ra_sharp.expected && ra_sharp.expected <= ra_sharp.high);
        let sharp_width = ra_sharp.high - ra_sharp.low;
        let vague_width = ra_vague.high - ra_vague.low;
        assert!(vague_width > sharp_width);
    }
}
