use std::time::Instant;

use crate::simulation::engine::{Configuration, Engine};
use crate::simulation::metric::MetricKind;
use crate::simulation::params::Parameters;
use crate::simulation::potential::PotentialKind;
use crate::simulation::states::{NVec2, State};

/// Helper to build an engine for a metric/potential pair
fn make_engine(metric: MetricKind, potential: PotentialKind, constraint: Option<&str>) -> Engine {
    let params = Parameters {
        mu: if metric == MetricKind::Flat { 0.0 } else { 1.0 },
        ..Parameters::default()
    };
    Engine::new(Configuration::new(metric, potential, constraint, params))
}

/// Time RK4 steps for each metric kind, with and without a constraint
pub fn bench_steps() {
    let cases = [
        (MetricKind::Flat, PotentialKind::Oscillator, None),
        (MetricKind::Flat, PotentialKind::Oscillator, Some("q1 - q2")),
        (MetricKind::Pendulum, PotentialKind::Pendulum, None),
        (MetricKind::Pendulum, PotentialKind::Pendulum, Some("q1^2 + q2^2 - 1")),
        (MetricKind::Schwarzschild, PotentialKind::Central, None),
    ];
    let steps = 20_000; // number of integrator steps per case (tune as needed)
    let dt = 0.001;

    for (metric, potential, constraint) in cases {
        let engine = make_engine(metric, potential, constraint);
        let mut state = State::new(NVec2::new(1.0, 0.5), NVec2::new(0.0, 0.3));

        // Warm up
        engine.step(&mut state, dt);

        let t0 = Instant::now();
        for _ in 0..steps {
            engine.step(&mut state, dt);
        }
        let per_step = t0.elapsed().as_secs_f64() / steps as f64;

        println!(
            "{:>13} / {:>10} / {:<16} step = {:8.3} us",
            format!("{metric:?}"),
            format!("{potential:?}"),
            constraint.unwrap_or("-"),
            per_step * 1e6
        );
    }
}

/// Final relative energy error of the double pendulum against dt
/// Paste output directly into excel to graph
pub fn bench_energy_curve() {
    println!("dt,steps,rel_error");

    let engine = make_engine(MetricKind::Pendulum, PotentialKind::Pendulum, None);
    let t_end: f64 = 5.0;

    for dt in [0.02, 0.01, 0.005, 0.0025, 0.00125] {
        let mut state = State::new(NVec2::new(1.0, 2.0), NVec2::zeros());
        let e0 = engine.energy(state.q, state.v).unwrap_or(f64::NAN);
        let steps = (t_end / dt).round() as usize;

        for _ in 0..steps {
            engine.step(&mut state, dt);
        }
        let e = engine.energy(state.q, state.v).unwrap_or(f64::NAN);
        println!("{},{},{:.3e}", dt, steps, ((e - e0) / e0).abs());
    }
}
