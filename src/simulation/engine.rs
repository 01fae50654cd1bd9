//! Runtime configuration and the stateless physics engine
//!
//! `Configuration` is the immutable per-run record: metric and potential
//! kinds, the compiled constraint, and the physical constants. Changing any
//! of it means building a new value.
//!
//! `Engine` bundles a configuration with its force terms and exposes every
//! kernel operation as a method. It holds no mutable data, so one engine can
//! be shared across threads and every call is a pure function of its inputs.

use super::constraint::Constraint;
use super::energy;
use super::error::DomainFault;
use super::forces::ForceSet;
use super::integrator::rk4_step;
use super::metric::{self, InverseMetric, MetricKind};
use super::params::Parameters;
use super::potential::{self, PotentialKind};
use super::solver::{self, AccelerationResult};
use super::states::{NMat2, NVec2, State};

#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    pub metric: MetricKind, // kinetic metric
    pub potential: PotentialKind, // scalar potential
    pub constraint: Constraint, // holonomic constraint, or the zero function
    pub params: Parameters, // physical constants
}

impl Configuration {
    /// Build a configuration, compiling `constraint` (fails closed)
    pub fn new(
        metric: MetricKind,
        potential: PotentialKind,
        constraint: Option<&str>,
        params: Parameters,
    ) -> Self {
        Self {
            metric,
            potential,
            constraint: Constraint::compile(constraint),
            params,
        }
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new(MetricKind::Flat, PotentialKind::Free, None, Parameters::default())
    }
}

pub struct Engine {
    config: Configuration,
    forces: ForceSet,
}

impl Engine {
    /// Engine with the standard force terms for `config`
    pub fn new(config: Configuration) -> Self {
        let forces = ForceSet::standard();
        Self { config, forces }
    }

    /// Engine with a caller-supplied force set
    pub fn with_forces(config: Configuration, forces: ForceSet) -> Self {
        Self { config, forces }
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn forces(&self) -> &ForceSet {
        &self.forces
    }

    pub fn metric(&self, q: NVec2) -> Result<NMat2, DomainFault> {
        metric::metric(self.config.metric, q, &self.config.params)
    }

    pub fn inverse_metric(&self, q: NVec2) -> Result<InverseMetric, DomainFault> {
        self.metric(q).map(|g| metric::inverse(&g))
    }

    pub fn potential(&self, q: NVec2) -> f64 {
        potential::potential(self.config.potential, q, &self.config.params)
    }

    pub fn constraint(&self, q: NVec2) -> f64 {
        self.config.constraint.eval(q)
    }

    pub fn acceleration(&self, q: NVec2, v: NVec2) -> AccelerationResult {
        solver::acceleration(&self.config, &self.forces, q, v)
    }

    pub fn energy(&self, q: NVec2, v: NVec2) -> Result<f64, DomainFault> {
        energy::energy(&self.config, q, v)
    }

    /// Advance `state` by one RK4 step; returns the first fault hit, if any
    pub fn step(&self, state: &mut State, dt: f64) -> Option<DomainFault> {
        rk4_step(self, state, dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn flat(potential: PotentialKind, constraint: Option<&str>) -> Configuration {
        Configuration::new(MetricKind::Flat, potential, constraint, Parameters { mu: 0.0, ..Parameters::default() })
    }

    #[test]
    fn engine_without_forces_coasts() {
        let engine = Engine::with_forces(flat(PotentialKind::Oscillator, None), ForceSet::new());
        assert!(engine.forces().is_empty());
        let r = engine.acceleration(NVec2::new(1.0, 0.0), NVec2::new(0.5, 0.0));
        assert_eq!(r.a, NVec2::zeros());
        assert!(r.fault.is_none());

        let standard = Engine::new(flat(PotentialKind::Oscillator, None));
        assert_eq!(standard.forces().len(), 3);
        assert_abs_diff_eq!(standard.acceleration(NVec2::new(1.0, 0.0), NVec2::zeros()).a.x, -13.0, epsilon = 1e-8);
    }

    #[test]
    fn engine_exposes_metric_and_constraint() {
        let engine = Engine::new(flat(PotentialKind::Free, Some("q1 - q2")));
        let inv = engine.inverse_metric(NVec2::new(0.2, 0.7)).unwrap();
        assert!(!inv.singular);
        assert_eq!(inv.matrix, NMat2::identity());
        assert_eq!(engine.constraint(NVec2::new(3.0, 1.0)), 2.0);
        assert!(engine.config().constraint.is_active());
    }
}
