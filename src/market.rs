use crate::config::MarketConfig;
use crate::simulate::OutcomeTable;
use crate::types::{MarketBoard, Scoreline};

pub fn derive(table: &OutcomeTable, cfg: &MarketConfig) -> MarketBoard {
    MarketBoard {
        win_a: offered_odds(table.win_a, cfg),
        draw: offered_odds(table.draw, cfg),
        win_b: offered_odds(table.win_b, cfg),
        over_under: table.over_under.clone(),
        both_score: table.both_score,
    }
}

// Offered (not fair) decimal price: invert the probability, then take the
// bookmaker margin off. The floor keeps long-shot prices bounded.
pub fn offered_odds(probability: f64, cfg: &MarketConfig) -> f64 {
    let p = probability.max(cfg.min_probability);
    (1.0 / p) * (1.0 - cfg.bookmaker_margin)
}

// Highest-probability exact scorelines. Ties resolve toward fewer total
// goals, then the lower score for side A, so output order is reproducible.
pub fn top_scorelines(table: &OutcomeTable, n: usize) -> Vec<Scoreline> {
    let mut cells: Vec<Scoreline> = table
        .cells()
        .filter(|(_, _, p)| *p > 0.0)
        .map(|(goals_a, goals_b, probability)| Scoreline {
            goals_a,
            goals_b,
            probability,
        })
        .collect();

    cells.sort_by(|x, y| {
        y.probability
            .total_cmp(&x.probability)
            .then((x.goals_a + x.goals_b).cmp(&(y.goals_a + y.goals_b)))
            .then(x.goals_a.cmp(&y.goals_a))
    });
    cells.truncate(n);
    cells
}
