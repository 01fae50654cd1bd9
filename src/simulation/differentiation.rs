//! Richardson-extrapolated central differences
//!
//! Every derivative in the kernel goes through [`try_derivative`]: the central
//! difference at `h` and at `h/2` are combined as `(4 D(h/2) - D(h)) / 3`,
//! which cancels the leading `O(h^2)` truncation term.
//!
//! The `try_*` forms take fallible closures and propagate the first error
//! unchanged. The plain forms are for closures that cannot fail.

use std::convert::Infallible;

use super::states::{NMat2, NVec2};

/// Default finite-difference step
pub const DEFAULT_STEP: f64 = 1e-4;

/// Richardson order-2 combination of two central differences
#[inline]
fn richardson(base: f64, half: f64) -> f64 {
    (4.0 * half - base) / 3.0
}

/// First derivative of `f` at `x`
pub fn try_derivative<F, E>(f: F, x: f64, h: f64) -> Result<f64, E>
where
    F: Fn(f64) -> Result<f64, E>,
{
    let base = (f(x + h)? - f(x - h)?) / (2.0 * h);
    let hh = 0.5 * h;
    let half = (f(x + hh)? - f(x - hh)?) / (2.0 * hh);
    Ok(richardson(base, half))
}

/// Partial derivative of `f` along `axis` at `q`
pub fn try_partial<F, E>(f: &F, q: NVec2, axis: usize, h: f64) -> Result<f64, E>
where
    F: Fn(NVec2) -> Result<f64, E>,
{
    try_derivative(
        |x| {
            let mut p = q;
            p[axis] = x;
            f(p)
        },
        q[axis],
        h,
    )
}

/// Gradient `(df/dq1, df/dq2)` at `q`
pub fn try_gradient<F, E>(f: F, q: NVec2, h: f64) -> Result<NVec2, E>
where
    F: Fn(NVec2) -> Result<f64, E>,
{
    Ok(NVec2::new(try_partial(&f, q, 0, h)?, try_partial(&f, q, 1, h)?))
}

/// Hessian at `q`, built by nesting the first-derivative operator.
/// The mixed partial is computed once and mirrored.
pub fn try_hessian<F, E>(f: F, q: NVec2, h: f64) -> Result<NMat2, E>
where
    F: Fn(NVec2) -> Result<f64, E>,
{
    let along = |axis: usize| {
        try_derivative(
            |x| {
                let mut p = q;
                p[axis] = x;
                try_partial(&f, p, axis, h)
            },
            q[axis],
            h,
        )
    };
    let d11 = along(0)?;
    let d22 = along(1)?;
    let d12 = try_derivative(
        |x| try_partial(&f, NVec2::new(x, q.y), 1, h),
        q.x,
        h,
    )?;

    Ok(NMat2::new(d11, d12, d12, d22))
}

/// Coordinate derivatives of a matrix-valued function: `out[k] = d_k M`.
///
/// The difference operator is linear, so differencing whole matrices gives
/// exactly the element-wise result while evaluating `f` once per point.
pub fn try_tensor_gradient<F, E>(f: F, q: NVec2, h: f64) -> Result<[NMat2; 2], E>
where
    F: Fn(NVec2) -> Result<NMat2, E>,
{
    let along = |axis: usize| -> Result<NMat2, E> {
        let at = |x: f64| {
            let mut p = q;
            p[axis] = x;
            f(p)
        };
        let x = q[axis];
        let hh = 0.5 * h;
        let base = (at(x + h)? - at(x - h)?) / (2.0 * h);
        let half = (at(x + hh)? - at(x - hh)?) / (2.0 * hh);
        Ok((4.0 * half - base) / 3.0)
    };
    Ok([along(0)?, along(1)?])
}

fn infallible<T>(r: Result<T, Infallible>) -> T {
    match r {
        Ok(v) => v,
        Err(never) => match never {},
    }
}

pub fn derivative<F: Fn(f64) -> f64>(f: F, x: f64, h: f64) -> f64 {
    infallible(try_derivative(|x| Ok(f(x)), x, h))
}

pub fn gradient<F: Fn(NVec2) -> f64>(f: F, q: NVec2, h: f64) -> NVec2 {
    infallible(try_gradient(|p| Ok(f(p)), q, h))
}

pub fn hessian<F: Fn(NVec2) -> f64>(f: F, q: NVec2, h: f64) -> NMat2 {
    infallible(try_hessian(|p| Ok(f(p)), q, h))
}
