use chrono::{DateTime, Utc};

use crate::config::RatingConfig;
use crate::gaussian;
use crate::types::{Outcome, SkillRating};

// One pairwise Bayesian update from a finished match. Pure: callers own the
// read and the (atomic) write of the pair.
pub fn rate_pair(
    a: &SkillRating,
    b: &SkillRating,
    score_a: u32,
    score_b: u32,
    cfg: &RatingConfig,
    now: DateTime<Utc>,
) -> (SkillRating, SkillRating) {
    // Dynamics: skill may have moved since each entity's last match.
    let sa = (a.sigma * a.sigma + cfg.tau * cfg.tau).sqrt();
    let sb = (b.sigma * b.sigma + cfg.tau * cfg.tau).sqrt();

    let c = (2.0 * cfg.beta * cfg.beta + sa * sa + sb * sb).sqrt();
    let eps = draw_margin(cfg.draw_probability, cfg.beta) / c;

    let (mut mu_a, mut mu_b) = (a.mu, b.mu);
    let w = match Outcome::from_scores(score_a, score_b) {
        Outcome::WinA => {
            let t = (mu_a - mu_b) / c;
            let v = v_win(t, eps);
            mu_a += (sa * sa / c) * v;
            mu_b -= (sb * sb / c) * v;
            w_win(t, eps)
        }
        Outcome::WinB => {
            let t = (mu_b - mu_a) / c;
            let v = v_win(t, eps);
            mu_b += (sb * sb / c) * v;
            mu_a -= (sa * sa / c) * v;
            w_win(t, eps)
        }
        Outcome::Draw => {
            let t = (mu_a - mu_b) / c;
            let v = v_draw(t, eps);
            mu_a += (sa * sa / c) * v;
            mu_b -= (sb * sb / c) * v;
            w_draw(t, eps)
        }
    };

    let sigma_a = shrink_sigma(sa, c, w, cfg.sigma_floor);
    let sigma_b = shrink_sigma(sb, c, w, cfg.sigma_floor);

    (
        SkillRating {
            entity_id: a.entity_id.clone(),
            mu: mu_a,
            sigma: sigma_a,
            matches_observed: a.matches_observed + 1,
            last_updated: now,
        },
        SkillRating {
            entity_id: b.entity_id.clone(),
            mu: mu_b,
            sigma: sigma_b,
            matches_observed: b.matches_observed + 1,
            last_updated: now,
        },
    )
}

// Half-width of the tie zone in performance space, scaled to t-units by the
// caller via c.
pub fn draw_margin(draw_probability: f64, beta: f64) -> f64 {
    gaussian::inv_cdf((draw_probability + 1.0) / 2.0) * std::f64::consts::SQRT_2 * beta
}

fn shrink_sigma(sigma: f64, c: f64, w: f64, floor: f64) -> f64 {
    let factor = (1.0 - (sigma * sigma) / (c * c) * w).max(1e-4);
    (sigma * factor.sqrt()).max(floor)
}

// Mean of a standard normal truncated below at eps - t: the additive
// correction for a decisive result seen from the winner's side.
fn v_win(t: f64, eps: f64) -> f64 {
    let d = t - eps;
    let denom = gaussian::cdf(d);
    if denom < 1e-12 {
        // Far tail: the truncated mean collapses onto the cut point.
        -d
    } else {
        gaussian::pdf(d) / denom
    }
}

fn w_win(t: f64, eps: f64) -> f64 {
    let v = v_win(t, eps);
    (v * (v + t - eps)).clamp(0.0, 1.0)
}

// Truncation to the tie zone [-eps - t, eps - t].
fn v_draw(t: f64, eps: f64) -> f64 {
    let denom = gaussian::cdf(eps - t) - gaussian::cdf(-eps - t);
    if denom < 1e-12 {
        if t > 0.0 { eps - t } else { -eps - t }
    } else {
        (gaussian::pdf(-eps - t) - gaussian::pdf(eps - t)) / denom
    }
}

fn w_draw(t: f64, eps: f64) -> f64 {
    let denom = gaussian::cdf(eps - t) - gaussian::cdf(-eps - t);
    if denom < 1e-12 {
        return 1.0;
    }
    let v = v_draw(t, eps);
    let w = v * v
        + ((eps - t) * gaussian::pdf(eps - t) + (eps + t) * gaussian::pdf(eps + t)) / denom;
    w.clamp(0.0, 1.0)
}
