//! Covariant force contributors
//!
//! Each term adds its share of the unconstrained covariant right-hand side
//! `A0 = F/m - Gamma[v, v] - grad V / m`. The solver raises the index with the
//! inverse metric and applies the constraint projection afterwards.

use std::fmt;

use super::christoffel::{christoffel, contract};
use super::differentiation::gradient;
use super::engine::Configuration;
use super::error::DomainFault;
use super::metric::{metric, MetricKind};
use super::potential::potential;
use super::states::NVec2;

/// Collection of covariant force terms (potential, connection, time dilation)
/// Contributions from all terms are summed into a single covariant vector
pub struct ForceSet {
    terms: Vec<Box<dyn CovariantForce + Send + Sync>>,
}

impl ForceSet {
    /// Create an empty force set
    pub fn new() -> Self {
        Self {
            terms: Vec::new()
        }
    }

    /// The terms every configuration uses. Terms that do not apply to a
    /// metric or potential kind contribute zero.
    pub fn standard() -> Self {
        Self::new()
            .with(TimeDilationForce)
            .with(ConnectionForce)
            .with(PotentialForce)
    }

    /// Add a force term
    pub fn with<T>(mut self, term: T) -> Self
    where
        T: CovariantForce + Send + Sync + 'static,
    {
        self.terms.push(Box::new(term));
        self
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Sum of all contributions at `(q, v)`; the first fault aborts the sum
    pub fn accumulate(&self, cfg: &Configuration, q: NVec2, v: NVec2) -> Result<NVec2, DomainFault> {
        let mut total = NVec2::zeros();
        for term in &self.terms {
            total += term.covariant_force(cfg, q, v)?;
        }
        Ok(total)
    }
}

impl Default for ForceSet {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for ForceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForceSet").field("terms", &self.terms.len()).finish()
    }
}

/// A source of covariant (index-lowered) acceleration
pub trait CovariantForce {
    fn covariant_force(&self, cfg: &Configuration, q: NVec2, v: NVec2) -> Result<NVec2, DomainFault>;
}

/// `-grad V / m`
pub struct PotentialForce;

impl CovariantForce for PotentialForce {
    fn covariant_force(&self, cfg: &Configuration, q: NVec2, _v: NVec2) -> Result<NVec2, DomainFault> {
        // Central is infinite at r = 0, either at q itself or at a sample
        if !potential(cfg.potential, q, &cfg.params).is_finite() {
            return Err(DomainFault::PotentialSingularity);
        }
        let grad = gradient(|p| potential(cfg.potential, p, &cfg.params), q, cfg.params.dq);
        if !grad.iter().all(|g| g.is_finite()) {
            return Err(DomainFault::PotentialSingularity);
        }
        Ok(-grad / cfg.params.mass)
    }
}

/// `-Gamma[v, v]`, the curvature pseudo-force
pub struct ConnectionForce;

impl CovariantForce for ConnectionForce {
    fn covariant_force(&self, cfg: &Configuration, q: NVec2, v: NVec2) -> Result<NVec2, DomainFault> {
        let g = christoffel(cfg, q)?;
        Ok(-contract(&g, v))
    }
}

/// Generalized force `F / m` from the curved time coordinate
pub struct TimeDilationForce;

impl CovariantForce for TimeDilationForce {
    fn covariant_force(&self, cfg: &Configuration, q: NVec2, v: NVec2) -> Result<NVec2, DomainFault> {
        Ok(generalized_force(cfg, q, v)? / cfg.params.mass)
    }
}

/// Time-dilation pseudo-force: zero except for the Schwarzschild metric,
/// where `F_i = -rs / r^3 * sum_j g_ij q_j`. Zero at the origin.
pub fn generalized_force(cfg: &Configuration, q: NVec2, _v: NVec2) -> Result<NVec2, DomainFault> {
    if cfg.metric != MetricKind::Schwarzschild {
        return Ok(NVec2::zeros());
    }
    let r = q.norm();
    if r == 0.0 {
        return Ok(NVec2::zeros());
    }
    let g = metric(cfg.metric, q, &cfg.params)?;
    let factor = -cfg.params.rs / (r * r * r);
    Ok(factor * (g * q))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::params::Parameters;
    use crate::simulation::potential::PotentialKind;
    use approx::assert_abs_diff_eq;

    fn cfg(metric: MetricKind, potential: PotentialKind) -> Configuration {
        Configuration::new(metric, potential, None, Parameters { mu: 0.0, ..Parameters::default() })
    }

    #[test]
    fn generalized_force_vanishes_off_schwarzschild() {
        let c = cfg(MetricKind::Pendulum, PotentialKind::Free);
        let f = generalized_force(&c, NVec2::new(1.0, 2.0), NVec2::zeros()).unwrap();
        assert_eq!(f, NVec2::zeros());
    }

    #[test]
    fn generalized_force_points_inward() {
        let c = cfg(MetricKind::Schwarzschild, PotentialKind::Free);
        let q = NVec2::new(2.0, 0.0);
        let f = generalized_force(&c, q, NVec2::zeros()).unwrap();
        // on the x axis g = diag(f, 1), f = 1 / (1 - rs/r)
        let stretch = 1.0 / (1.0 - c.params.rs / 2.0);
        assert_abs_diff_eq!(f.x, -c.params.rs / 8.0 * stretch * 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(f.y, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn potential_force_is_negative_gradient() {
        let c = cfg(MetricKind::Flat, PotentialKind::Oscillator);
        let q = NVec2::new(1.0, 0.0);
        let a = PotentialForce.covariant_force(&c, q, NVec2::zeros()).unwrap();
        // dV/dq1 = k1 q1 + k2 (q1 - q2), dV/dq2 = k1 q2 - k2 (q1 - q2)
        assert_abs_diff_eq!(a.x, -13.0, epsilon = 1e-8);
        assert_abs_diff_eq!(a.y, 5.0, epsilon = 1e-8);
    }

    #[test]
    fn potential_force_faults_at_central_origin() {
        let c = cfg(MetricKind::Flat, PotentialKind::Central);
        let f = PotentialForce.covariant_force(&c, NVec2::zeros(), NVec2::zeros());
        assert_eq!(f, Err(DomainFault::PotentialSingularity));
    }

    #[test]
    fn empty_set_contributes_nothing() {
        let c = cfg(MetricKind::Pendulum, PotentialKind::Pendulum);
        let set = ForceSet::new();
        assert!(set.is_empty());
        assert_eq!(set.accumulate(&c, NVec2::new(0.3, 0.1), NVec2::new(1.0, 1.0)).unwrap(), NVec2::zeros());
        assert_eq!(ForceSet::standard().len(), 3);
    }
}
