//! Configuration types for loading simulation scenarios from YAML.
//!
//! This module defines a thin, `serde`-deserializable representation of a
//! simulation scenario. A scenario consists of:
//!
//! - [`SimulationConfig`]   – metric/potential kinds, constraint, physical constants
//! - [`InitialStateConfig`] – initial coordinates and velocities
//! - [`RunConfig`]          – step size, total steps, batch size, log interval
//! - [`ScenarioConfig`]     – top-level wrapper used to load a scenario from YAML
//!
//! [`SimulationConfig`] is also the configuration message of the worker
//! boundary, so its field names are camelCase.
//!
//! # YAML format
//! An example scenario matching these types:
//!
//! ```yaml
//! configuration:
//!   metricKind: pendulum        # flat | pendulum | schwarzschild
//!   potentialKind: pendulum     # free | pendulum | smallangle | oscillator | Central | nearEarth
//!   constraintExpr: null        # e.g. "q1 - q2"
//!   isRepulsive: false
//!   mass: 1.0
//!   couplingMu: 1.0
//!   l1: 1.0
//!   l2: 1.0
//!   k1: 8.0
//!   k2: 5.0
//!   gravity: 9.8
//!   schwarzschildRadius: 0.4
//!   dq: 1.0e-4
//!
//! initial:
//!   q: [ 1.0, 2.0 ]
//!   v: [ 0.0, 0.0 ]
//!
//! run:
//!   dt: 0.001
//!   steps: 10000
//!   batchSize: 32
//!   logInterval: 1000
//! ```
//!
//! Every field has a default, so partial files are accepted.

use serde::{Deserialize, Serialize};

use crate::simulation::engine::Configuration;
use crate::simulation::metric::MetricKind;
use crate::simulation::params::Parameters;
use crate::simulation::potential::PotentialKind;
use crate::simulation::states::{NVec2, State};

/// Physics configuration: what the dynamics are
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SimulationConfig {
    pub metric_kind: MetricKind, // kinetic metric
    pub potential_kind: PotentialKind, // scalar potential
    pub constraint_expr: Option<String>, // constraint f(q1, q2) = 0, absent -> unconstrained
    pub is_repulsive: bool, // sign of the central-force coefficient
    pub mass: f64, // point mass
    pub coupling_mu: f64, // coupling parameter mu
    pub l1: f64, // first link length
    pub l2: f64, // second link length
    pub k1: f64, // spring constant
    pub k2: f64, // coupling spring constant
    pub gravity: f64, // gravitational acceleration
    pub schwarzschild_radius: f64, // rs
    pub dq: f64, // finite-difference step
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let p = Parameters::default();
        Self {
            metric_kind: MetricKind::Flat,
            potential_kind: PotentialKind::Free,
            constraint_expr: None,
            is_repulsive: false,
            mass: p.mass,
            coupling_mu: p.mu,
            l1: p.l1,
            l2: p.l2,
            k1: p.k1,
            k2: p.k2,
            gravity: p.gravity,
            schwarzschild_radius: p.rs,
            dq: p.dq,
        }
    }
}

impl SimulationConfig {
    /// Runtime parameters, deriving the central-force coefficient
    pub fn parameters(&self) -> Parameters {
        Parameters {
            mass: self.mass,
            mu: self.coupling_mu,
            l1: self.l1,
            l2: self.l2,
            k1: self.k1,
            k2: self.k2,
            gravity: self.gravity,
            rs: self.schwarzschild_radius,
            k: Parameters::central_force_coefficient(self.is_repulsive, self.schwarzschild_radius),
            dq: self.dq,
        }
    }

    /// Immutable runtime configuration; the constraint is compiled here
    pub fn build(&self) -> Configuration {
        Configuration::new(
            self.metric_kind,
            self.potential_kind,
            self.constraint_expr.as_deref(),
            self.parameters(),
        )
    }
}

/// Initial state of the point mass
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct InitialStateConfig {
    pub q: [f64; 2], // generalized coordinates
    pub v: [f64; 2], // generalized velocities
}

impl InitialStateConfig {
    pub fn state(&self) -> State {
        State::new(NVec2::new(self.q[0], self.q[1]), NVec2::new(self.v[0], self.v[1]))
    }
}

/// How long and how finely to integrate
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RunConfig {
    pub dt: f64, // time step
    pub steps: u64, // total steps
    pub batch_size: u32, // steps per batch
    pub log_interval: u32, // steps between energy samples, 0 = off
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            dt: 0.001,
            steps: 10_000,
            batch_size: 32,
            log_interval: 100,
        }
    }
}

/// Top-level scenario configuration loaded from YAML.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ScenarioConfig {
    pub configuration: SimulationConfig, // physics configuration
    pub initial: InitialStateConfig, // initial condition
    pub run: RunConfig, // integration schedule
}
