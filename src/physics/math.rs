//! Scalar helpers shared by the geometry, collision and integration code

/// Scalar type for physics calculations (f64 for precision)
pub type Scalar = f64;

/// 2D vector type for embedding-space positions and tangents
pub type Vector = bevy::math::DVec2;

pub const PI: Scalar = core::f64::consts::PI;
pub const TAU: Scalar = core::f64::consts::TAU;

/// Wrap a manifold coordinate into `[0, 2π)`.
///
/// `rem_euclid` can round up to exactly `TAU` for tiny negative inputs, so
/// that case is folded back to zero.
#[inline]
pub fn wrap_coordinate(phi: Scalar) -> Scalar {
    let wrapped = phi.rem_euclid(TAU);
    if wrapped >= TAU { 0.0 } else { wrapped }
}

/// Wrap a periodic quantity with the given period into `[0, period)`.
#[inline]
pub fn wrap_periodic(value: Scalar, period: Scalar) -> Scalar {
    let wrapped = value.rem_euclid(period);
    if wrapped >= period { 0.0 } else { wrapped }
}

/// Signed difference `to - from` folded into `(-π, π]`.
#[inline]
pub fn angular_difference(from: Scalar, to: Scalar) -> Scalar {
    let difference = wrap_coordinate(to - from);
    if difference > PI {
        difference - TAU
    } else {
        difference
    }
}

/// Five-point Gauss–Legendre nodes on `[-1, 1]`.
const GAUSS_LEGENDRE_NODES: [Scalar; 5] = [
    -0.906_179_845_938_664,
    -0.538_469_310_105_683_1,
    0.0,
    0.538_469_310_105_683_1,
    0.906_179_845_938_664,
];

/// Weights matching [`GAUSS_LEGENDRE_NODES`].
const GAUSS_LEGENDRE_WEIGHTS: [Scalar; 5] = [
    0.236_926_885_056_189_1,
    0.478_628_670_499_366_5,
    0.568_888_888_888_888_9,
    0.478_628_670_499_366_5,
    0.236_926_885_056_189_1,
];

/// Integrate `f` over `[from, to]` with a single five-point Gauss–Legendre panel.
///
/// Exact for polynomials up to degree nine; callers keep panels short enough
/// that smooth periodic integrands converge to machine precision.
pub fn gauss_legendre<F>(f: F, from: Scalar, to: Scalar) -> Scalar
where
    F: Fn(Scalar) -> Scalar,
{
    let half_width = 0.5 * (to - from);
    let midpoint = 0.5 * (to + from);
    GAUSS_LEGENDRE_NODES
        .iter()
        .zip(GAUSS_LEGENDRE_WEIGHTS.iter())
        .map(|(node, weight)| weight * f(midpoint + half_width * node))
        .sum::<Scalar>()
        * half_width
}
