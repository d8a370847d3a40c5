use kurbo::Point;

/// Interpolate from `a` toward `b` by `t`.
///
/// `t = 0` yields `a` and `t = 1` yields `b` bit-for-bit; equal endpoints are a fixed point.
#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    if t >= 1.0 {
        return b;
    }
    a + ((b - a) * t)
}

#[inline]
pub(crate) fn lerp_point(a: Point, b: Point, t: f64) -> Point {
    Point::new(lerp(a.x, b.x, t), lerp(a.y, b.y, t))
}

#[inline]
pub(crate) fn is_unit_interval(x: f64) -> bool {
    x.is_finite() && (0.0..=1.0).contains(&x)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
