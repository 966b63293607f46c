use log::{debug, warn};

use crate::{
    ephemerides::{EphemerisRecord, OrbitalParameterSet},
    interp::{fraction, linear},
    prelude::Epoch,
};

/// Blends two bracketing records into one synthetic [OrbitalParameterSet].
/// Every field is interpolated linearly, toe included, so the synthetic
/// set stays self consistent.
///
/// toe is expressed in seconds of week: when the bracket spans a GPS week
/// rollover (after.toe < before.toe, like 597600 then 0), the blended toe
/// lands about half a week away from the target and the resulting position
/// is not usable. Such brackets are reported at `warn` level, see
/// [ParameterInterpolator::spans_week_rollover].
#[derive(Debug, Default, Clone, Copy)]
pub struct ParameterInterpolator {}

impl ParameterInterpolator {
    /// Interpolates the parameters at x_s, which is expected
    /// to lie within [before.epoch, after.epoch[.
    pub fn interpolate(
        &self,
        before: &EphemerisRecord,
        after: &EphemerisRecord,
        x_s: Epoch,
    ) -> OrbitalParameterSet {
        let t = fraction(x_s, before.epoch, after.epoch);
        debug!(
            "{:?} ({}) - interpolating iode {}/{} (t={})",
            x_s, before.sv, before.params.iode, after.params.iode, t
        );
        if Self::spans_week_rollover(&before.params, &after.params) {
            warn!(
                "{:?} ({}) - bracket spans a week rollover (toe {} -> {})",
                x_s, before.sv, before.params.toe, after.params.toe
            );
        }
        Self::blend(&before.params, &after.params, t)
    }
    /// True when the toe of `after` wrapped past the end of the GPS week
    pub fn spans_week_rollover(before: &OrbitalParameterSet, after: &OrbitalParameterSet) -> bool {
        after.toe < before.toe
    }
    /// Blends two parameter sets at fraction t
    pub fn blend(
        before: &OrbitalParameterSet,
        after: &OrbitalParameterSet,
        t: f64,
    ) -> OrbitalParameterSet {
        before.zip_with(after, |y_0, y_1| linear(y_0, y_1, t))
    }
}
