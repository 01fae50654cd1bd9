//! Scalar potentials `V(q)`
//!
//! Kinds mirror the configurations the simulator ships with. `Central` is
//! regularized to a quadratic inside `rs` and is singular only at `r = 0`,
//! where it returns `+inf`.

use serde::{Deserialize, Serialize};

use super::params::Parameters;
use super::states::NVec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PotentialKind {
    #[default]
    #[serde(rename = "free")]
    Free,

    #[serde(rename = "pendulum")]
    Pendulum,

    #[serde(rename = "smallangle", alias = "smallAngle")]
    SmallAngle,

    #[serde(rename = "oscillator")]
    Oscillator,

    #[serde(rename = "Central", alias = "central")]
    Central,

    #[serde(rename = "nearEarth", alias = "nearearth")]
    NearEarth,
}

pub fn potential(kind: PotentialKind, q: NVec2, p: &Parameters) -> f64 {
    let (q1, q2) = (q.x, q.y);
    match kind {
        PotentialKind::Free => 0.0,
        PotentialKind::Pendulum => {
            p.mass * (1.0 + p.mu) * p.gravity * p.l1 * (1.0 - q1.cos())
                + p.mass * p.mu * p.gravity * p.l2 * (1.0 - q2.cos())
        }
        PotentialKind::SmallAngle => {
            0.5 * p.mass * (1.0 + p.mu) * p.gravity * p.l1 * q1 * q1
                + 0.5 * p.mass * p.mu * p.gravity * p.l2 * q2 * q2
        }
        PotentialKind::Oscillator => {
            let d = q1 - q2;
            0.5 * p.k1 * (q1 * q1 + q2 * q2) + 0.5 * p.k2 * d * d
        }
        PotentialKind::Central => central(q1.hypot(q2), p.k, p.rs),
        PotentialKind::NearEarth => p.mass * p.gravity * q2,
    }
}

/// `k / r` outside `rs`, matched quadratic well inside
fn central(r: f64, k: f64, rs: f64) -> f64 {
    if r == 0.0 {
        return f64::INFINITY;
    }
    if r <= rs {
        let rs3 = rs * rs * rs;
        return 0.5 * k / rs - 0.5 * k * r * r / rs3 + k / rs;
    }
    k / r
}
