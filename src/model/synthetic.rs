//! Labeled archetype samples for training before any real data exists.
//! Columns follow [`crate::features::FEATURE_DIM`] order.

use super::Dataset;
use crate::features::FEATURE_DIM;
use crate::risk::RiskLevel;
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::TAU;

struct Archetype {
    label: RiskLevel,
    /// (mean, std)
    speed: (f64, f64),
    acceleration: (f64, f64),
    lane_change_rate: f64,
    erratic_rate: f64,
    /// [low, high)
    score: (f64, f64),
}

const ARCHETYPES: [Archetype; 3] = [
    Archetype {
        label: RiskLevel::Safe,
        speed: (30.0, 10.0),
        acceleration: (0.0, 5.0),
        lane_change_rate: 0.5,
        erratic_rate: 0.2,
        score: (0.0, 30.0),
    },
    Archetype {
        label: RiskLevel::Risky,
        speed: (60.0, 15.0),
        acceleration: (0.0, 15.0),
        lane_change_rate: 2.0,
        erratic_rate: 1.0,
        score: (30.0, 70.0),
    },
    Archetype {
        label: RiskLevel::Dangerous,
        speed: (100.0, 20.0),
        acceleration: (0.0, 25.0),
        lane_change_rate: 4.0,
        erratic_rate: 3.0,
        score: (60.0, 100.0),
    },
];

/// Box-Muller.
fn normal(rng: &mut StdRng, mean: f64, std: f64) -> f64 {
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen();
    mean + std * (-2.0 * u1.ln()).sqrt() * (TAU * u2).cos()
}

/// Knuth's multiplication method; fine for the small rates used here.
fn poisson(rng: &mut StdRng, lambda: f64) -> f64 {
    let limit = (-lambda).exp();
    let mut k = 0u32;
    let mut p = 1.0;
    loop {
        p *= rng.gen::<f64>();
        if p <= limit {
            return f64::from(k);
        }
        k += 1;
    }
}

/// `n_samples / 3` rows per label (SAFE, RISKY, DANGEROUS in that order), seeded.
pub fn generate(n_samples: usize, seed: u64) -> Dataset {
    let per_class = (n_samples / ARCHETYPES.len()).max(1);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut x = Array2::<f64>::zeros((per_class * ARCHETYPES.len(), FEATURE_DIM));
    let mut y = Vec::with_capacity(x.nrows());

    let mut rows = x.rows_mut().into_iter();
    for a in &ARCHETYPES {
        for _ in 0..per_class {
            let Some(mut row) = rows.next() else {
                break;
            };
            row[0] = normal(&mut rng, a.speed.0, a.speed.1);
            row[1] = normal(&mut rng, a.acceleration.0, a.acceleration.1);
            row[2] = poisson(&mut rng, a.lane_change_rate);
            row[3] = poisson(&mut rng, a.erratic_rate);
            row[4] = rng.gen_range(a.score.0..a.score.1);
            y.push(a.label);
        }
    }
    drop(rows);

    Dataset { x, y }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balanced_and_reproducible() {
        let a = generate(1000, 42);
        let b = generate(1000, 42);
        assert_eq!(a.x.nrows(), 999);
        assert_eq!(a.y.len(), 999);
        assert_eq!(a.x, b.x);
        for level in RiskLevel::ALL {
            assert_eq!(a.y.iter().filter(|l| **l == level).count(), 333);
        }
    }

    #[test]
    fn archetype_means_are_ordered() {
        let d = generate(3000, 7);
        let mean_speed = |level: RiskLevel| {
            let rows: Vec<f64> = d
                .y
                .iter()
                .enumerate()
                .filter(|(_, l)| **l == level)
                .map(|(i, _)| d.x[[i, 0]])
                .collect();
            rows.iter().sum::<f64>() / rows.len() as f64
        };
        let safe = mean_speed(RiskLevel::Safe);
        let risky = mean_speed(RiskLevel::Risky);
        let dangerous = mean_speed(RiskLevel::Dangerous);
        assert!((safe - 30.0).abs() < 2.0);
        assert!(safe < risky && risky < dangerous);
    }

    #[test]
    fn counts_are_non_negative_integers() {
        let d = generate(300, 1);
        for i in 0..d.x.nrows() {
            for col in [2, 3] {
                let v = d.x[[i, col]];
                assert!(v >= 0.0 && v.fract() == 0.0);
            }
        }
    }
}
