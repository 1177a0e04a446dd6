use crate::types::{Outcome, Prob3};

#[derive(Debug, Clone, Copy)]
pub struct Metrics {
    pub samples: usize,
    pub brier: f64,
    pub log_loss: f64,
    pub accuracy: f64,
}

// Scores a batch of three-way predictions against what actually happened.
// Used by the offline harness to sanity-check tuning changes.
pub fn evaluate_probs(predictions: &[Prob3], outcomes: &[Outcome]) -> Metrics {
    if predictions.is_empty() || predictions.len() != outcomes.len() {
        return Metrics {
            samples: 0,
            brier: 0.0,
            log_loss: 0.0,
            accuracy: 0.0,
        };
    }

    let mut brier_sum = 0.0_f64;
    let mut log_loss_sum = 0.0_f64;
    let mut correct = 0usize;

    for (p, outcome) in predictions.iter().zip(outcomes) {
        let y = one_hot(*outcome);
        brier_sum += (p.win_a - y.win_a).powi(2)
            + (p.draw - y.draw).powi(2)
            + (p.win_b - y.win_b).powi(2);

        let actual_prob = match outcome {
            Outcome::WinA => p.win_a,
            Outcome::Draw => p.draw,
            Outcome::WinB => p.win_b,
        }
        .clamp(1e-12, 1.0);
        log_loss_sum += -actual_prob.ln();

        if argmax(*p) == *outcome {
            correct += 1;
        }
    }

    let n = predictions.len() as f64;
    Metrics {
        samples: predictions.len(),
        brier: brier_sum / n,
        log_loss: log_loss_sum / n,
        accuracy: correct as f64 / n,
    }
}

fn argmax(p: Prob3) -> Outcome {
    if p.win_a >= p.draw && p.win_a >= p.win_b {
        Outcome::WinA
    } else if p.draw >= p.win_b {
        Outcome::Draw
    } else {
        Outcome::WinB
    }
}

fn one_hot(outcome: Outcome) -> Prob3 {
    match outcome {
        Outcome::WinA => Prob3 {
            win_a: 1.0,
            draw: 0.0,
            win_b: 0.0,
        },
        Outcome::Draw => Prob3 {
            win_a: 0.0,
            draw: 1.0,
            win_b: 0.0,
        },
        Outcome::WinB => Prob3 {
            win_a: 0.0,
            draw: 0.0,
            win_b: 1.0,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_predictions_have_zero_brier() {
        let preds = vec![
            Prob3 {
                win_a: 1.0,
                draw: 0.0,
                win_b: 0.0,
            },
            Prob3 {
                win_a: 0.0,
                draw: 0.0,
                win_b: 1.0,
            },
        ];
        let outcomes = vec![Outcome::WinA, Outcome::WinB];
        let m = evaluate_probs(&preds, &outcomes);
        assert_eq!(m.samples, 2);
        assert!(m.brier < 1e-12);
        assert!((m.accuracy - 1.0).abs() < 1e-12);
    }

    #[test]
    fn uniform_predictions_score_uniform_brier() {
        let preds = vec![Prob3::uniform(); 9];
        let outcomes = vec![
            Outcome::WinA,
            Outcome::Draw,
            Outcome::WinB,
            Outcome::WinA,
            Outcome::Draw,
            Outcome::WinB,
            Outcome::WinA,
            Outcome::Draw,
            Outcome::WinB,
        ];
        let m = evaluate_probs(&preds, &outcomes);
        assert!((m.brier - 2.0 / 3.0).abs() < 1e-9);
        assert!((m.log_loss - (3.0_f64).ln()).abs() < 1e-9);
    }

    #[test]
    fn mismatched_lengths_yield_empty_metrics() {
        let m = evaluate_probs(&[Prob3::uniform()], &[]);
        assert_eq!(m.samples, 0);
    }
}
