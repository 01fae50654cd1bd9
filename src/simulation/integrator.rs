//! Fixed-step time integrator for the 2-DOF system
//!
//! Classical RK4 on the first-order system `(q', v') = (v, a(q, v))`.
//! The integrator knows nothing about constraints: projection happens
//! inside the acceleration solver at every stage.

use super::engine::Engine;
use super::error::DomainFault;
use super::states::{NVec2, State};

/// Time derivative of `(q, v)`
#[derive(Debug, Clone, Copy)]
struct Slope {
    dq: NVec2, // = v
    dv: NVec2, // = a(q, v)
}

/// Advance `state` by one RK4 step of size `dt`, updating `q`, `v`, and `t`
/// in place. Returns the first fault any of the four stages reported.
pub fn rk4_step(engine: &Engine, state: &mut State, dt: f64) -> Option<DomainFault> {
    let mut fault = None;
    let mut f = |q: NVec2, v: NVec2| {
        let r = engine.acceleration(q, v);
        if fault.is_none() {
            fault = r.fault;
        }
        Slope { dq: v, dv: r.a }
    };

    let (q0, v0) = (state.q, state.v);
    let half_dt = 0.5 * dt;

    // k1 at the start, k2/k3 at the midpoint, k4 at the end
    let k1 = f(q0, v0);
    let k2 = f(q0 + half_dt * k1.dq, v0 + half_dt * k1.dv);
    let k3 = f(q0 + half_dt * k2.dq, v0 + half_dt * k2.dv);
    let k4 = f(q0 + dt * k3.dq, v0 + dt * k3.dv);

    let sixth = dt / 6.0;
    state.q = q0 + sixth * (k1.dq + 2.0 * k2.dq + 2.0 * k3.dq + k4.dq);
    state.v = v0 + sixth * (k1.dv + 2.0 * k2.dv + 2.0 * k3.dv + k4.dv);
    state.t += dt;

    fault
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::engine::Configuration;
    use crate::simulation::metric::MetricKind;
    use crate::simulation::params::Parameters;
    use crate::simulation::potential::PotentialKind;
    use approx::assert_abs_diff_eq;

    #[test]
    fn free_particle_moves_in_a_straight_line() {
        let engine = Engine::new(Configuration::new(
            MetricKind::Flat,
            PotentialKind::Free,
            None,
            Parameters { mu: 0.0, ..Parameters::default() },
        ));
        let mut s = State::new(NVec2::new(0.5, -1.0), NVec2::new(2.0, 3.0));
        for _ in 0..100 {
            assert!(rk4_step(&engine, &mut s, 0.01).is_none());
        }
        assert_abs_diff_eq!(s.q, NVec2::new(2.5, 2.0), epsilon = 1e-12);
        assert_abs_diff_eq!(s.v, NVec2::new(2.0, 3.0), epsilon = 1e-12);
        assert_abs_diff_eq!(s.t, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn uniform_gravity_is_integrated_exactly() {
        let engine = Engine::new(Configuration::new(
            MetricKind::Flat,
            PotentialKind::NearEarth,
            None,
            Parameters { mu: 0.0, ..Parameters::default() },
        ));
        let mut s = State::new(NVec2::zeros(), NVec2::new(1.0, 5.0));
        for _ in 0..50 {
            rk4_step(&engine, &mut s, 0.02);
        }
        // t = 1: y = 5 - g/2
        assert_abs_diff_eq!(s.q.y, 5.0 - 0.5 * 9.8, epsilon = 1e-7);
        assert_abs_diff_eq!(s.q.x, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn oscillator_error_is_fourth_order() {
        // k2 = 0 decouples the springs: q1(t) = cos(t)
        let p = Parameters { mu: 0.0, k2: 0.0, k1: 1.0, ..Parameters::default() };
        let engine = Engine::new(Configuration::new(MetricKind::Flat, PotentialKind::Oscillator, None, p));

        let err = |dt: f64| {
            let mut s = State::new(NVec2::new(1.0, 0.0), NVec2::zeros());
            let n = (1.0 / dt).round() as usize;
            for _ in 0..n {
                rk4_step(&engine, &mut s, dt);
            }
            (s.q.x - 1.0f64.cos()).abs()
        };
        let ratio = err(0.1) / err(0.05);
        assert!(ratio > 12.0 && ratio < 20.0, "ratio = {ratio}");
    }
}
