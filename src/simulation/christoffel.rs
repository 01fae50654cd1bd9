//! Christoffel symbols of the first kind
//!
//! `G[i][j][k] = 1/2 (d_j g_ik + d_k g_ij - d_i g_jk)`, with the lowered index
//! first. The solver contracts the last two indices with the velocity,
//! `Gamma[v, v]_i = sum_jk G[i][j][k] v_j v_k`, so assembly and contraction
//! must agree on this layout.

use super::differentiation::try_tensor_gradient;
use super::engine::Configuration;
use super::error::DomainFault;
use super::metric::{metric, MetricKind};
use super::states::{Christoffel, NVec2};

/// Connection coefficients at `q`. All zero for the flat metric, whose
/// derivatives vanish analytically.
pub fn christoffel(cfg: &Configuration, q: NVec2) -> Result<Christoffel, DomainFault> {
    let mut out = [[[0.0; 2]; 2]; 2];
    if cfg.metric == MetricKind::Flat {
        return Ok(out);
    }

    // dg[k][(i, j)] = d_k g_ij
    let dg = try_tensor_gradient(|p| metric(cfg.metric, p, &cfg.params), q, cfg.params.dq)?;

    for (i, gi) in out.iter_mut().enumerate() {
        for (j, gij) in gi.iter_mut().enumerate() {
            for (k, gijk) in gij.iter_mut().enumerate() {
                *gijk = 0.5 * (dg[j][(i, k)] + dg[k][(i, j)] - dg[i][(j, k)]);
            }
        }
    }
    Ok(out)
}

/// `Gamma[v, v]_i = sum_jk G[i][j][k] v_j v_k`
pub fn contract(g: &Christoffel, v: NVec2) -> NVec2 {
    let mut out = NVec2::zeros();
    for i in 0..2 {
        let mut sum = 0.0;
        for j in 0..2 {
            for k in 0..2 {
                sum += g[i][j][k] * v[j] * v[k];
            }
        }
        out[i] = sum;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::params::Parameters;
    use crate::simulation::potential::PotentialKind;
    use approx::assert_abs_diff_eq;

    fn cfg(metric: MetricKind) -> Configuration {
        Configuration::new(metric, PotentialKind::Free, None, Parameters { mu: 0.5, ..Parameters::default() })
    }

    #[test]
    fn flat_metric_has_no_connection() {
        let g = christoffel(&cfg(MetricKind::Flat), NVec2::new(0.2, 0.3)).unwrap();
        assert_eq!(g, [[[0.0; 2]; 2]; 2]);
    }

    #[test]
    fn symmetric_in_last_two_indices() {
        let g = christoffel(&cfg(MetricKind::Schwarzschild), NVec2::new(1.3, -0.7)).unwrap();
        for gi in &g {
            assert_abs_diff_eq!(gi[0][1], gi[1][0], epsilon = 1e-12);
        }
    }

    #[test]
    fn pendulum_matches_analytic() {
        // g12 = c cos(q1 - q2), c = mu l1 l2; other entries constant.
        // G[0][1][1] = d_1 g01 = c sin(q1 - q2), G[1][0][0] = d_0 g10 = -c sin(q1 - q2)
        let c = cfg(MetricKind::Pendulum);
        let q = NVec2::new(0.9, 0.1);
        let g = christoffel(&c, q).unwrap();
        let s = c.params.mu * c.params.l1 * c.params.l2 * (q.x - q.y).sin();

        assert_abs_diff_eq!(g[0][1][1], s, epsilon = 1e-9);
        assert_abs_diff_eq!(g[1][0][0], -s, epsilon = 1e-9);
        assert_abs_diff_eq!(g[0][0][0], 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(g[0][0][1], 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(g[1][1][1], 0.0, epsilon = 1e-9);
    }

    #[test]
    fn horizon_fault_propagates() {
        let c = cfg(MetricKind::Schwarzschild);
        let q = NVec2::new(c.params.rs + 0.5 * c.params.dq, 0.0);
        assert!(matches!(christoffel(&c, q), Err(DomainFault::HorizonSingularity { .. })));
    }
}
