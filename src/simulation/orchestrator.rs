//! Step batches: the unit exchanged with whatever drives the simulation
//!
//! A [`StepRequest`] asks for `step_count` sequential RK4 steps from a given
//! state; the [`StepResponse`] carries the final state and acceleration, an
//! energy-error sample every `log_interval` steps, and the coordinates after
//! every step. Both are serde types so they can cross a thread or process
//! boundary as JSON.
//!
//! [`Simulation`] is the session form: it owns the state, keeps `E0` from the
//! initial condition, and numbers steps globally across batches.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::energy::{EnergyMonitor, EnergySample};
use super::engine::Engine;
use super::error::DomainFault;
use super::states::{State, StateVector};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRequest {
    pub initial_state: StateVector,
    pub dt: f64,
    pub step_count: u32,
    pub log_interval: u32, // 0 disables energy sampling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_energy: Option<f64>, // E0; energy of `initial_state` when absent
    #[serde(default)]
    pub first_step_index: u64, // index of the step before the first one taken
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResponse {
    pub final_state: StateVector,
    pub final_acceleration: [f64; 2],
    pub energy_log: Vec<EnergySample>,
    pub trajectory: Vec<[f64; 2]>, // q after each step
    pub degraded_steps: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_fault: Option<DomainFault>,
}

impl StepResponse {
    pub fn last_sample(&self) -> Option<&EnergySample> {
        self.energy_log.last()
    }
}

/// Run one batch. Steps are strictly sequential.
///
/// Samples are taken after every step whose global index
/// `first_step_index + i` is a multiple of `log_interval`, so the cadence does
/// not depend on how a run is split into batches. A zero-step batch returns the starting
/// state and, if sampling is on, one sample of it.
pub fn run_batch(engine: &Engine, request: &StepRequest) -> StepResponse {
    let mut state = State::from(request.initial_state);
    let energy_of = |s: &State| engine.energy(s.q, s.v).unwrap_or(f64::NAN);

    let reference = request.reference_energy.unwrap_or_else(|| energy_of(&state));
    let monitor = EnergyMonitor::new(reference);
    let interval = request.log_interval;

    let mut energy_log = Vec::new();
    let mut trajectory = Vec::new();
    let mut degraded_steps = 0u32;
    let mut first_fault = None;

    if request.step_count == 0 && interval > 0 {
        energy_log.push(monitor.sample(request.first_step_index, energy_of(&state)));
    }

    for i in 1..=request.step_count {
        if let Some(fault) = engine.step(&mut state, request.dt) {
            degraded_steps += 1;
            first_fault.get_or_insert(fault);
        }
        trajectory.push([state.q.x, state.q.y]);

        let index = request.first_step_index + u64::from(i);
        if interval > 0 && index % u64::from(interval) == 0 {
            energy_log.push(monitor.sample(index, energy_of(&state)));
        }
    }

    let a = engine.acceleration(state.q, state.v).a;

    if let Some(fault) = first_fault {
        warn!(degraded_steps, %fault, "batch hit a domain fault");
    }
    if let Some(last) = energy_log.last() {
        debug!(steps = request.step_count, step = last.step_index, relative_error = last.relative_error, "batch done");
    }

    StepResponse {
        final_state: StateVector::from(&state),
        final_acceleration: [a.x, a.y],
        energy_log,
        trajectory,
        degraded_steps,
        first_fault,
    }
}

/// A running simulation: state, reference energy, and global step count
pub struct Simulation {
    engine: Engine,
    state: State,
    reference_energy: f64,
    steps_taken: u64,
}

impl Simulation {
    pub fn new(engine: Engine, initial: State) -> Self {
        let reference_energy = engine.energy(initial.q, initial.v).unwrap_or(f64::NAN);
        Self {
            engine,
            state: initial,
            reference_energy,
            steps_taken: 0,
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn reference_energy(&self) -> f64 {
        self.reference_energy
    }

    pub fn steps_taken(&self) -> u64 {
        self.steps_taken
    }

    /// Request for the next batch from the current state
    pub fn next_request(&self, dt: f64, step_count: u32, log_interval: u32) -> StepRequest {
        StepRequest {
            initial_state: StateVector::from(&self.state),
            dt,
            step_count,
            log_interval,
            reference_energy: Some(self.reference_energy),
            first_step_index: self.steps_taken,
        }
    }

    /// Apply a response produced for [`Simulation::next_request`]
    pub fn apply(&mut self, request: &StepRequest, response: &StepResponse) {
        let t = self.state.t + request.dt * f64::from(request.step_count);
        self.state = State { t, ..State::from(response.final_state) };
        self.steps_taken += u64::from(request.step_count);
    }

    /// Run one batch in place
    pub fn advance(&mut self, dt: f64, step_count: u32, log_interval: u32) -> StepResponse {
        let request = self.next_request(dt, step_count, log_interval);
        let response = run_batch(&self.engine, &request);
        self.apply(&request, &response);
        response
    }
}
