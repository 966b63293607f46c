//! GPS week / seconds of week conversions
use hifitime::Epoch;

/// Duration of one GPS week [s]
pub const WEEK_SECONDS: f64 = 604800.0;

/// Half a GPS week [s], the crossover threshold
pub const HALF_WEEK_SECONDS: f64 = WEEK_SECONDS / 2.0;

/// Returns the (week, seconds of week) pair of this [Epoch] in GPST.
/// The epoch may be expressed in any timescale, hifitime
/// takes care of the leap seconds.
pub fn gpst_week_seconds(t: Epoch) -> (u32, f64) {
    let total = t.to_gpst_seconds();
    let week = (total / WEEK_SECONDS).floor();
    let sow = total - week * WEEK_SECONDS;
    (week as u32, sow)
}

/// Returns the seconds elapsed in the current GPS week, at this [Epoch].
/// This is the timescale of the broadcast `toe`.
pub fn seconds_of_week(t: Epoch) -> f64 {
    gpst_week_seconds(t).1
}

/// Brings a time difference between two seconds of week values
/// back within a half week, to account for week crossovers.
pub fn wrap_week_crossover(dt: f64) -> f64 {
    if dt > HALF_WEEK_SECONDS {
        dt - WEEK_SECONDS
    } else if dt < -HALF_WEEK_SECONDS {
        dt + WEEK_SECONDS
    } else {
        dt
    }
}
