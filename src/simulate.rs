use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::config::SimConfig;
use crate::types::{OverUnderLine, Prob3};

// Fixed chunk size keeps per-chunk rng streams identical regardless of how
// rayon schedules them, so a seed fully determines the output.
const CHUNK: usize = 4096;

#[derive(Debug, Clone)]
pub struct OutcomeTable {
    pub samples: usize,
    pub win_a: f64,
    pub draw: f64,
    pub win_b: f64,
    pub over_under: Vec<OverUnderLine>,
    pub both_score: f64,
    pub std_error: f64,
    score_cap: usize,
    grid: Vec<f64>,
}

impl OutcomeTable {
    pub fn outcome(&self) -> Prob3 {
        Prob3 {
            win_a: self.win_a,
            draw: self.draw,
            win_b: self.win_b,
        }
        .normalized()
    }

    pub fn score_cap(&self) -> u32 {
        self.score_cap as u32
    }

    pub fn scoreline_prob(&self, goals_a: u32, goals_b: u32) -> f64 {
        let (a, b) = (goals_a as usize, goals_b as usize);
        if a > self.score_cap || b > self.score_cap {
            return 0.0;
        }
        self.grid[a * (self.score_cap + 1) + b]
    }

    pub fn cells(&self) -> impl Iterator<Item = (u32, u32, f64)> + '_ {
        let side = self.score_cap + 1;
        self.grid
            .iter()
            .enumerate()
            .map(move |(idx, p)| ((idx / side) as u32, (idx % side) as u32, *p))
    }
}

struct Tally {
    weight: f64,
    win_a: f64,
    draw: f64,
    win_b: f64,
    both_score: f64,
    grid: Vec<f64>,
    over: Vec<f64>,
}

impl Tally {
    fn new(cap: usize, lines: usize) -> Self {
        Self {
            weight: 0.0,
            win_a: 0.0,
            draw: 0.0,
            win_b: 0.0,
            both_score: 0.0,
            grid: vec![0.0; (cap + 1) * (cap + 1)],
            over: vec![0.0; lines],
        }
    }

    fn add(&mut self, goals_a: usize, goals_b: usize, w: f64, cap: usize, lines: &[f64]) {
        self.weight += w;
        match goals_a.cmp(&goals_b) {
            std::cmp::Ordering::Greater => self.win_a += w,
            std::cmp::Ordering::Equal => self.draw += w,
            std::cmp::Ordering::Less => self.win_b += w,
        }
        if goals_a >= 1 && goals_b >= 1 {
            self.both_score += w;
        }
        self.grid[goals_a * (cap + 1) + goals_b] += w;
        let total = (goals_a + goals_b) as f64;
        for (slot, line) in self.over.iter_mut().zip(lines) {
            if total > *line {
                *slot += w;
            }
        }
    }

    fn merge(mut self, other: Tally) -> Tally {
        self.weight += other.weight;
        self.win_a += other.win_a;
        self.draw += other.draw;
        self.win_b += other.win_b;
        self.both_score += other.both_score;
        for (dst, src) in self.grid.iter_mut().zip(&other.grid) {
            *dst += src;
        }
        for (dst, src) in self.over.iter_mut().zip(&other.over) {
            *dst += src;
        }
        self
    }
}

// Pure Monte Carlo pass: (lambda_a, lambda_b, n, seed) -> empirical outcome
// distribution. The low-score correlation correction is applied by importance
// reweighting each sample, then normalizing by the total weight.
pub fn simulate(lambda_a: f64, lambda_b: f64, n: usize, seed: u64, cfg: &SimConfig) -> OutcomeTable {
    let lambda_a = lambda_a.max(1e-6);
    let lambda_b = lambda_b.max(1e-6);
    let cap = cfg.score_cap_max as usize;
    let lines = &cfg.over_under_lines;

    let cum_a = cumulative(&poisson_pmf(lambda_a, cap));
    let cum_b = cumulative(&poisson_pmf(lambda_b, cap));

    let chunks = n.div_ceil(CHUNK);
    let tallies: Vec<Tally> = (0..chunks)
        .into_par_iter()
        .map(|chunk| {
            let mut rng =
                StdRng::seed_from_u64(seed.wrapping_add((chunk as u64).wrapping_mul(SEED_STRIDE)));
            let take = CHUNK.min(n - chunk * CHUNK);
            let mut tally = Tally::new(cap, lines.len());
            for _ in 0..take {
                let goals_a = sample_index(&cum_a, rng.gen_range(0.0..1.0));
                let goals_b = sample_index(&cum_b, rng.gen_range(0.0..1.0));
                let w = dc_tau(goals_a as u32, goals_b as u32, lambda_a, lambda_b, cfg.rho)
                    .max(0.0);
                tally.add(goals_a, goals_b, w, cap, lines);
            }
            tally
        })
        .collect();

    // Sequential merge keeps float summation order fixed for a given seed.
    let tally = tallies
        .into_iter()
        .fold(Tally::new(cap, lines.len()), Tally::merge);

    let weight = tally.weight;
    let norm = if weight > 1e-12 { 1.0 / weight } else { 0.0 };

    let (win_a, draw, win_b) = if weight > 1e-12 {
        (
            tally.win_a * norm,
            tally.draw * norm,
            tally.win_b * norm,
        )
    } else {
        (1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0)
    };

    let over_under = lines
        .iter()
        .zip(&tally.over)
        .map(|(line, over_w)| {
            let over = over_w * norm;
            OverUnderLine {
                threshold: *line,
                over,
                under: 1.0 - over,
            }
        })
        .collect();

    OutcomeTable {
        samples: n,
        win_a,
        draw,
        win_b,
        over_under,
        both_score: tally.both_score * norm,
        // Worst-case binomial standard error for any tabulated probability.
        std_error: 0.5 / (n as f64).sqrt(),
        score_cap: cap,
        grid: tally.grid.iter().map(|w| w * norm).collect(),
    }
}

const SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

// Joint-mass correction for the four low-scoring cells that independent
// Poisson margins systematically under-predict.
pub fn dc_tau(goals_a: u32, goals_b: u32, lambda_a: f64, lambda_b: f64, rho: f64) -> f64 {
    match (goals_a, goals_b) {
        (0, 0) => 1.0 - lambda_a * lambda_b * rho,
        (0, 1) => 1.0 + lambda_a * rho,
        (1, 0) => 1.0 + lambda_b * rho,
        (1, 1) => 1.0 - rho,
        _ => 1.0,
    }
}

// Capped pmf via the multiplicative recurrence; mass beyond the cap is folded
// into the top bucket so the table always sums to 1.
pub fn poisson_pmf(lambda: f64, max_k: usize) -> Vec<f64> {
    let lambda = lambda.max(0.0);
    let mut out = vec![0.0; max_k + 1];
    out[0] = (-lambda).exp();
    for k in 1..=max_k {
        out[k] = out[k - 1] * lambda / k as f64;
    }
    let sum: f64 = out.iter().sum();
    if sum < 1.0 {
        out[max_k] += 1.0 - sum;
    }
    out
}

fn cumulative(pmf: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(pmf.len());
    let mut acc = 0.0;
    for p in pmf {
        acc += p;
        out.push(acc);
    }
    out
}

fn sample_index(cum: &[f64], u: f64) -> usize {
    for (idx, threshold) in cum.iter().enumerate() {
        if u <= *threshold {
            return idx;
        }
    }
    cum.len() - 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> SimConfig {
        SimConfig::default()
    }

    #[test]
    fn same_seed_same_table() {
        let a = simulate(1.4, 1.1, 20_000, 7, &cfg());
        let b = simulate(1.4, 1.1, 20_000, 7, &cfg());
        assert_eq!(a.win_a, b.win_a);
        assert_eq!(a.draw, b.draw);
        assert_eq!(a.scoreline_prob(1, 1), b.scoreline_prob(1, 1));
    }

    #[test]
    fn different_seeds_differ_within_tolerance() {
        let a = simulate(1.4, 1.1, 20_000, 7, &cfg());
        let b = simulate(1.4, 1.1, 20_000, 8, &cfg());
        assert!(a.win_a != b.win_a);
        assert!((a.win_a - b.win_a).abs() < 0.03);
    }

    #[test]
    fn outcome_and_grid_sum_to_one() {
        let table = simulate(1.7, 0.9, 10_000, 42, &cfg());
        assert!((table.win_a + table.draw + table.win_b - 1.0).abs() < 1e-9);
        let grid_sum: f64 = table.cells().map(|(_, _, p)| p).sum();
        assert!((grid_sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn symmetric_lambdas_give_symmetric_outcomes() {
        let table = simulate(1.3, 1.3, 40_000, 11, &cfg());
        assert!((table.win_a - table.win_b).abs() < 0.02);
    }

    #[test]
    fn negative_rho_boosts_goalless_and_one_all_draws() {
        let mut flat = cfg();
        flat.rho = 0.0;
        let mut corrected = cfg();
        corrected.rho = -0.15;

        let base = simulate(1.3, 1.3, 40_000, 3, &flat);
        let adj = simulate(1.3, 1.3, 40_000, 3, &corrected);

        assert!(adj.scoreline_prob(0, 0) > base.scoreline_prob(0, 0));
        assert!(adj.scoreline_prob(1, 1) > base.scoreline_prob(1, 1));
        let adj_sum: f64 = adj.cells().map(|(_, _, p)| p).sum();
        assert!((adj_sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn std_error_shrinks_with_more_samples() {
        let small = simulate(1.3, 1.3, 5_000, 9, &cfg());
        let large = simulate(1.3, 1.3, 50_000, 9, &cfg());
        assert!(large.std_error < small.std_error);
    }

    #[test]
    fn over_under_lines_partition_the_mass() {
        let table = simulate(1.8, 1.2, 10_000, 5, &cfg());
        for line in &table.over_under {
            assert!((line.over + line.under - 1.0).abs() < 1e-9);
            assert!(line.over >= 0.0 && line.over <= 1.0);
        }
        assert!(table.both_score >= 0.0 && table.both_score <= 1.0);
    }

    #[test]
    fn high_lambda_mass_folds_into_cap_bucket() {
        let pmf = poisson_pmf(9.0, 10);
        let sum: f64 = pmf.iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
        // With lambda 9 the cap bucket holds the folded tail.
        assert!(pmf[10] > 0.10);
    }

    #[test]
    fn degenerate_lambda_still_produces_a_distribution() {
        let table = simulate(0.0, 0.0, 2_000, 1, &cfg());
        assert!((table.win_a + table.draw + table.win_b - 1.0).abs() < 1e-9);
        assert!(table.draw > 0.9);
    }
}
