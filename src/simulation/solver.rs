//! Constrained acceleration
//!
//! 1. `A0 = F/m - Gamma[v, v] - grad V / m` from the force set
//! 2. No constraint: `a = g^-1 A0`
//! 3. Constraint `f`: pick the multiplier that makes `d^2 f / dt^2 = 0`,
//!    `lambda = -(grad f^T g^-1 A0 + v^T H_f v) / (grad f^T g^-1 grad f)`,
//!    and return `a = g^-1 (A0 + lambda grad f)`
//!
//! This is a velocity-level law: it cancels the constraint's second
//! derivative but does not pull an already drifted trajectory back onto
//! `f = 0`.
//!
//! Faults never escape as errors. Each one resolves to a fallback value and
//! is reported in [`AccelerationResult::fault`]:
//! - metric singular or undefined: zero acceleration
//! - force term singular: zero acceleration
//! - constraint derivatives unusable: unconstrained motion

use super::differentiation::{gradient, hessian};
use super::engine::Configuration;
use super::error::DomainFault;
use super::forces::ForceSet;
use super::metric::{inverse, metric};
use super::states::{NMat2, NVec2};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccelerationResult {
    pub a: NVec2, // contravariant acceleration
    pub fault: Option<DomainFault>, // set when a fallback was used
}

impl AccelerationResult {
    fn ok(a: NVec2) -> Self {
        Self { a, fault: None }
    }

    fn degraded(a: NVec2, fault: DomainFault) -> Self {
        Self { a, fault: Some(fault) }
    }
}

pub fn acceleration(cfg: &Configuration, forces: &ForceSet, q: NVec2, v: NVec2) -> AccelerationResult {
    let g = match metric(cfg.metric, q, &cfg.params) {
        Ok(g) => g,
        Err(fault) => return AccelerationResult::degraded(NVec2::zeros(), fault),
    };
    let inv = inverse(&g);
    if let Some(fault) = inv.fault() {
        return AccelerationResult::degraded(NVec2::zeros(), fault);
    }
    let inv = inv.matrix;

    let a0 = match forces.accumulate(cfg, q, v) {
        Ok(a0) => a0,
        Err(fault) => return AccelerationResult::degraded(NVec2::zeros(), fault),
    };

    if !cfg.constraint.is_active() {
        return AccelerationResult::ok(inv * a0);
    }

    match multiplier(cfg, &inv, a0, q, v) {
        Ok((lambda, grad_f)) => AccelerationResult::ok(inv * (a0 + lambda * grad_f)),
        Err(fault) => AccelerationResult::degraded(inv * a0, fault),
    }
}

/// Lagrange multiplier and the constraint gradient it scales
fn multiplier(
    cfg: &Configuration,
    inv: &NMat2,
    a0: NVec2,
    q: NVec2,
    v: NVec2,
) -> Result<(f64, NVec2), DomainFault> {
    let f = |p: NVec2| cfg.constraint.eval(p);
    let grad_f = gradient(f, q, cfg.params.dq);
    let hess_f = hessian(f, q, cfg.params.dq);

    if !grad_f.iter().chain(hess_f.iter()).all(|x| x.is_finite()) {
        return Err(DomainFault::NonFiniteConstraint);
    }

    let inv_grad = inv * grad_f;
    let denom = grad_f.dot(&inv_grad);
    let scale = grad_f.norm_squared() * inv.amax();
    if scale == 0.0 || denom.abs() <= f64::EPSILON * scale {
        return Err(DomainFault::DegenerateConstraint);
    }

    let lambda = -(inv_grad.dot(&a0) + v.dot(&(hess_f * v))) / denom;
    Ok((lambda, grad_f))
}
