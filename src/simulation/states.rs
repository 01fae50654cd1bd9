//! Core state types for the 2-DOF simulation
//!
//! - `NVec2` / `NMat2`: nalgebra aliases used throughout the kernel
//! - `State`: generalized coordinates `q`, velocities `v`, and time `t`
//! - `Christoffel`: rank-3 connection array, `G[i][j][k]`

use nalgebra::{Matrix2, Vector2};
use serde::{Deserialize, Serialize};

pub type NVec2 = Vector2<f64>;
pub type NMat2 = Matrix2<f64>;

/// Connection coefficients indexed `[i][j][k]`, symmetric in `(j, k)`
pub type Christoffel = [[[f64; 2]; 2]; 2];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct State {
    pub q: NVec2, // generalized coordinates
    pub v: NVec2, // generalized velocities
    pub t: f64, // time
}

impl State {
    pub fn new(q: NVec2, v: NVec2) -> Self {
        Self { q, v, t: 0.0 }
    }
}

/// Plain-array form of a state, used on the worker message boundary
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateVector {
    pub q: [f64; 2],
    pub v: [f64; 2],
}

impl From<&State> for StateVector {
    fn from(s: &State) -> Self {
        Self {
            q: [s.q.x, s.q.y],
            v: [s.v.x, s.v.y],
        }
    }
}

impl From<StateVector> for State {
    fn from(s: StateVector) -> Self {
        State::new(NVec2::new(s.q[0], s.q[1]), NVec2::new(s.v[0], s.v[1]))
    }
}
