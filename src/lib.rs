pub mod simulation;
pub mod configuration;
pub mod benchmark;

pub use simulation::states::{State, StateVector, NVec2, NMat2, Christoffel};
pub use simulation::params::Parameters;
pub use simulation::error::{DomainFault, ConstraintError};
pub use simulation::metric::{MetricKind, InverseMetric};
pub use simulation::potential::PotentialKind;
pub use simulation::constraint::Constraint;
pub use simulation::forces::{CovariantForce, ForceSet, PotentialForce, ConnectionForce, TimeDilationForce};
pub use simulation::solver::AccelerationResult;
pub use simulation::integrator::rk4_step;
pub use simulation::energy::{EnergyMonitor, EnergySample};
pub use simulation::engine::{Configuration, Engine};
pub use simulation::orchestrator::{run_batch, Simulation, StepRequest, StepResponse};
pub use simulation::worker::{SimulationWorker, WorkerReply};
pub use simulation::scenario::Scenario;

pub use configuration::config::{SimulationConfig, InitialStateConfig, RunConfig, ScenarioConfig};

pub use benchmark::benchmark::{bench_steps, bench_energy_curve};
