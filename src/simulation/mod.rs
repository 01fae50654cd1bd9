pub mod states;
pub mod params;
pub mod error;
pub mod differentiation;
pub mod metric;
pub mod potential;
pub mod constraint;
pub mod christoffel;
pub mod forces;
pub mod solver;
pub mod integrator;
pub mod energy;
pub mod engine;
pub mod orchestrator;
pub mod worker;
pub mod scenario;
