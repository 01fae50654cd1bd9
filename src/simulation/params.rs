//! Physical constants for a simulation run
//!
//! `Parameters` holds the constants every provider reads:
//! - mass and coupling `mu`,
//! - link lengths and spring constants,
//! - gravity and Schwarzschild radius `rs`,
//! - the derived central-force coefficient `k`,
//! - the differentiation step `dq`

#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    pub mass: f64, // point mass
    pub mu: f64, // coupling parameter
    pub l1: f64, // first link length
    pub l2: f64, // second link length
    pub k1: f64, // spring constant (both coordinates)
    pub k2: f64, // coupling spring constant
    pub gravity: f64, // gravitational acceleration
    pub rs: f64, // Schwarzschild radius
    pub k: f64, // central-force coefficient, derived from rs and the attraction sign
    pub dq: f64, // finite-difference step
}

impl Parameters {
    /// `k = +0.5 rs` for a repulsive central force, `-0.5 rs` otherwise
    pub fn central_force_coefficient(is_repulsive: bool, rs: f64) -> f64 {
        let k = (0.5 * rs).abs();
        if is_repulsive { k } else { -k }
    }
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            mass: 1.0,
            mu: 1.0,
            l1: 1.0,
            l2: 1.0,
            k1: 8.0,
            k2: 5.0,
            gravity: 9.8,
            rs: 0.4,
            k: Self::central_force_coefficient(false, 0.4),
            dq: 1e-4,
        }
    }
}
