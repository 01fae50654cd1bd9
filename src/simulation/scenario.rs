//! Build fully-initialized simulation scenarios from configuration
//!
//! Takes a `ScenarioConfig` (YAML-facing) and produces a runtime bundle
//! containing:
//! - a `Simulation` (engine with compiled configuration, state at t = 0)
//! - the run schedule (`RunConfig`)
//!
//! `Scenario::run` drives the simulation batch by batch, the same way a
//! host scheduler would, and hands each response to a callback.

use tracing::info;

use crate::configuration::config::{RunConfig, ScenarioConfig};
use crate::simulation::engine::Engine;
use crate::simulation::orchestrator::{Simulation, StepResponse};
use crate::simulation::worker::SimulationWorker;

pub struct Scenario {
    pub simulation: Simulation,
    pub run: RunConfig,
}

impl Scenario {
    pub fn build_scenario(cfg: ScenarioConfig) -> Self {
        // Configuration (runtime) from SimulationConfig; compiles the constraint
        let config = cfg.configuration.build();
        let engine = Engine::new(config);

        // Initial state at t = 0
        let state = cfg.initial.state();

        info!(
            metric = ?engine.config().metric,
            potential = ?engine.config().potential,
            constraint = engine.config().constraint.source().unwrap_or("none"),
            q = ?[state.q.x, state.q.y],
            v = ?[state.v.x, state.v.y],
            "scenario built"
        );

        Self {
            simulation: Simulation::new(engine, state),
            run: cfg.run,
        }
    }

    /// Batch sizes covering `run.steps`
    fn batches(&self) -> impl Iterator<Item = u32> {
        let total = self.run.steps;
        let size = u64::from(self.run.batch_size.max(1));
        let full = total / size;
        let rest = total % size;
        std::iter::repeat(size as u32)
            .take(full as usize)
            .chain((rest > 0).then_some(rest as u32))
    }

    /// Run every batch on the calling thread
    pub fn run<F: FnMut(&StepResponse)>(&mut self, mut on_batch: F) -> Option<StepResponse> {
        let (dt, interval) = (self.run.dt, self.run.log_interval);
        let sizes: Vec<u32> = self.batches().collect();
        let mut last = None;
        for n in sizes {
            let response = self.simulation.advance(dt, n, interval);
            on_batch(&response);
            last = Some(response);
        }
        last
    }

    /// Run every batch through a dedicated worker thread, one request in flight
    pub fn run_on_worker<F: FnMut(&StepResponse)>(&mut self, mut on_batch: F) -> Option<StepResponse> {
        let (dt, interval) = (self.run.dt, self.run.log_interval);
        let sizes: Vec<u32> = self.batches().collect();
        let mut worker = SimulationWorker::spawn(self.simulation.engine().config().clone());
        let mut last = None;
        for n in sizes {
            let request = self.simulation.next_request(dt, n, interval);
            let id = worker.submit(request.clone());
            let Some(response) = worker.wait_for(id) else {
                break;
            };
            self.simulation.apply(&request, &response);
            on_batch(&response);
            last = Some(response);
        }
        worker.shutdown();
        last
    }
}
