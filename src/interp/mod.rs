pub mod parameters;

pub use parameters::ParameterInterpolator;

use hifitime::Epoch;

/// Position of x_s between x_0 and x_1, where 0 is x_0 and 1 is x_1.
/// Not clamped: extrapolation is the caller's responsibility.
pub fn fraction(x_s: Epoch, x_0: Epoch, x_1: Epoch) -> f64 {
    let dx = (x_1 - x_0).to_seconds();
    (x_s - x_0).to_seconds() / dx
}

/// Linear blend of y_0 and y_1 at fraction t
pub(crate) fn linear(y_0: f64, y_1: f64, t: f64) -> f64 {
    y_0 + (y_1 - y_0) * t
}
