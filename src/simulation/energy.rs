//! Mechanical energy and drift diagnostics
//!
//! `E = 1/2 v^T g(q) v + V(q)`. Used only to judge integration quality;
//! nothing here feeds back into the dynamics.

use serde::{Deserialize, Serialize};

use super::engine::Configuration;
use super::error::DomainFault;
use super::metric::metric;
use super::potential::potential;
use super::states::NVec2;

/// Reference energies smaller than this are replaced by it
pub const ENERGY_REFERENCE_FLOOR: f64 = 1e-12;

/// Smallest reported relative error, keeps `log10` finite
pub const RELATIVE_ERROR_FLOOR: f64 = 1e-16;

/// Fails on the metric horizon and where the potential is not finite
pub fn energy(cfg: &Configuration, q: NVec2, v: NVec2) -> Result<f64, DomainFault> {
    let g = metric(cfg.metric, q, &cfg.params)?;
    let kinetic = 0.5 * v.dot(&(g * v));
    let v_q = potential(cfg.potential, q, &cfg.params);
    if !v_q.is_finite() {
        return Err(DomainFault::PotentialSingularity);
    }
    Ok(kinetic + v_q)
}

/// `|E - E0| / max(|E0|, floor)`, floored at [`RELATIVE_ERROR_FLOOR`]
pub fn relative_error(e: f64, e0: f64) -> f64 {
    let reference = e0.abs().max(ENERGY_REFERENCE_FLOOR);
    let err = (e - e0).abs() / reference;
    if err.is_nan() {
        return err;
    }
    err.max(RELATIVE_ERROR_FLOOR)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnergySample {
    pub step_index: u64,
    pub energy: f64,
    pub relative_error: f64,
}

impl EnergySample {
    pub fn log10_error(&self) -> f64 {
        self.relative_error.log10()
    }
}

/// Drift tracker against a fixed reference energy `E0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyMonitor {
    reference: f64,
}

impl EnergyMonitor {
    pub fn new(reference: f64) -> Self {
        Self { reference }
    }

    pub fn reference(&self) -> f64 {
        self.reference
    }

    pub fn sample(&self, step_index: u64, energy: f64) -> EnergySample {
        EnergySample {
            step_index,
            energy,
            relative_error: relative_error(energy, self.reference),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::metric::MetricKind;
    use crate::simulation::params::Parameters;
    use crate::simulation::potential::PotentialKind;
    use approx::assert_abs_diff_eq;

    #[test]
    fn kinetic_plus_potential() {
        let cfg = Configuration::new(
            MetricKind::Flat,
            PotentialKind::Oscillator,
            None,
            Parameters { mu: 0.5, ..Parameters::default() },
        );
        let q = NVec2::new(1.0, 0.0);
        let v = NVec2::new(1.0, 2.0);
        // T = 1/2 (1 + 2 * 0.5 * 2 + 4) = 3.5, V = 4 + 2.5
        assert_abs_diff_eq!(energy(&cfg, q, v).unwrap(), 10.0, epsilon = 1e-12);
    }

    #[test]
    fn central_origin_has_no_energy() {
        let cfg = Configuration::new(MetricKind::Flat, PotentialKind::Central, None, Parameters { mu: 0.0, ..Parameters::default() });
        assert_eq!(energy(&cfg, NVec2::zeros(), NVec2::zeros()), Err(DomainFault::PotentialSingularity));
        assert!(energy(&cfg, NVec2::new(1.0, 0.0), NVec2::zeros()).unwrap().is_finite());
    }

    #[test]
    fn zero_reference_uses_floor() {
        let err = relative_error(1e-15, 0.0);
        assert!(err.is_finite());
        assert_abs_diff_eq!(err, 1e-3, epsilon = 1e-12);
    }

    #[test]
    fn exact_conservation_is_floored() {
        let monitor = EnergyMonitor::new(2.0);
        assert_eq!(monitor.reference(), 2.0);
        let s = monitor.sample(7, 2.0);
        assert_eq!(s.relative_error, RELATIVE_ERROR_FLOOR);
        assert_abs_diff_eq!(s.log10_error(), -16.0, epsilon = 1e-12);
        assert_eq!(s.step_index, 7);
    }
}
