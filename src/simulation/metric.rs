//! Covariant metric tensors and their inverse
//!
//! The metric defines the kinetic form `T = 1/2 v^T g(q) v`. Three kinds:
//! - `flat`:          constant `[[1, mu], [mu, 1]]`
//! - `pendulum`:      double-pendulum kinetic metric
//! - `schwarzschild`: radial stretching `f = 1 / (1 - rs/r)` folded into 2D

use serde::{Deserialize, Serialize};

use super::error::DomainFault;
use super::params::Parameters;
use super::states::{NMat2, NVec2};

/// `|1 - rs/r|` at or below this is treated as sitting on the horizon
const HORIZON_TOLERANCE: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MetricKind {
    #[default]
    #[serde(rename = "flat")]
    Flat,

    #[serde(rename = "pendulum")]
    Pendulum,

    #[serde(rename = "schwarzschild", alias = "Schwarzschild")]
    Schwarzschild,
}

/// Metric tensor at `q`.
///
/// Schwarzschild falls back to the identity at `r = 0` and reports
/// [`DomainFault::HorizonSingularity`] at `r = rs`.
pub fn metric(kind: MetricKind, q: NVec2, p: &Parameters) -> Result<NMat2, DomainFault> {
    match kind {
        MetricKind::Flat => Ok(NMat2::new(1.0, p.mu, p.mu, 1.0)),
        MetricKind::Pendulum => {
            let g11 = (1.0 + p.mu) * p.l1 * p.l1;
            let g22 = p.mu * p.l2 * p.l2;
            let g12 = p.mu * p.l1 * p.l2 * (q.x - q.y).cos();
            Ok(NMat2::new(g11, g12, g12, g22))
        }
        MetricKind::Schwarzschild => {
            let r = q.x.hypot(q.y);
            if r == 0.0 {
                return Ok(NMat2::identity());
            }
            let denom = 1.0 - p.rs / r;
            if denom.abs() <= HORIZON_TOLERANCE {
                return Err(DomainFault::HorizonSingularity { r });
            }
            let f = 1.0 / denom;
            let factor = 1.0 / (r * r);
            let g11 = 1.0 + factor * (f - 1.0) * q.x * q.x;
            let g22 = 1.0 + factor * (f - 1.0) * q.y * q.y;
            let g12 = (f - 1.0) * q.x * q.y * factor;
            Ok(NMat2::new(g11, g12, g12, g22))
        }
    }
}

/// Result of the closed-form 2x2 inversion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InverseMetric {
    pub matrix: NMat2,
    pub det: f64,
    pub singular: bool, // true -> `matrix` is the zero matrix
}

impl InverseMetric {
    pub fn fault(&self) -> Option<DomainFault> {
        self.singular.then_some(DomainFault::DegenerateMetric { det: self.det })
    }
}

/// `adj(g) / det(g)`; zero matrix and `singular = true` when the determinant
/// vanishes relative to the entries or is not finite
pub fn inverse(g: &NMat2) -> InverseMetric {
    let (g11, g12, g21, g22) = (g[(0, 0)], g[(0, 1)], g[(1, 0)], g[(1, 1)]);
    let det = g11 * g22 - g12 * g21;
    let scale = (g11 * g22).abs() + (g12 * g21).abs();

    if !det.is_finite() || det.abs() <= f64::EPSILON * scale {
        return InverseMetric {
            matrix: NMat2::zeros(),
            det,
            singular: true,
        };
    }

    InverseMetric {
        matrix: NMat2::new(g22, -g12, -g21, g11) / det,
        det,
        singular: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn params() -> Parameters {
        Parameters { mu: 0.3, l1: 1.2, l2: 0.8, ..Parameters::default() }
    }

    #[test]
    fn inverse_times_metric_is_identity() {
        let p = params();
        let points = [NVec2::new(0.3, -0.2), NVec2::new(1.5, 2.0), NVec2::new(-0.9, 0.4)];
        for kind in [MetricKind::Flat, MetricKind::Pendulum, MetricKind::Schwarzschild] {
            for &q in &points {
                let g = metric(kind, q, &p).unwrap();
                let inv = inverse(&g);
                assert!(!inv.singular);
                let prod = inv.matrix * g;
                assert_abs_diff_eq!(prod, NMat2::identity(), epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn flat_metric_with_unit_coupling_is_degenerate() {
        let p = Parameters { mu: 1.0, ..Parameters::default() };
        let g = metric(MetricKind::Flat, NVec2::new(0.1, 0.2), &p).unwrap();
        let inv = inverse(&g);
        assert!(inv.singular);
        assert_eq!(inv.matrix, NMat2::zeros());
        assert!(matches!(inv.fault(), Some(DomainFault::DegenerateMetric { .. })));
    }

    #[test]
    fn schwarzschild_origin_is_identity() {
        let g = metric(MetricKind::Schwarzschild, NVec2::zeros(), &params()).unwrap();
        assert_eq!(g, NMat2::identity());
    }

    #[test]
    fn schwarzschild_horizon_is_a_fault() {
        let p = params();
        let q = NVec2::new(p.rs, 0.0);
        let r = metric(MetricKind::Schwarzschild, q, &p);
        assert!(matches!(r, Err(DomainFault::HorizonSingularity { .. })));
    }

    #[test]
    fn pendulum_metric_is_symmetric() {
        let g = metric(MetricKind::Pendulum, NVec2::new(0.4, 1.1), &params()).unwrap();
        assert_eq!(g[(0, 1)], g[(1, 0)]);
        assert_abs_diff_eq!(g[(0, 0)], 1.3 * 1.44, epsilon = 1e-12);
    }
}
