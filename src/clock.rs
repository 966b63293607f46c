use hifitime::Duration;

use crate::{
    ephemerides::{EphemerisRecord, OrbitalParameterSet},
    time::{seconds_of_week, wrap_week_crossover},
};

/// Satellite Vehicle broadcast clock model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Clock {
    /// Reference time of clock [s of GPS week]
    pub(crate) toc: f64,
    /// Clock offset [s]
    pub(crate) offset: f64,
    /// Clock drift [s/s]
    pub(crate) drift: f64,
    /// Clock drift rate [s/s^2]
    pub(crate) drift_rate: f64,
}

impl Clock {
    /// Builds new Clock model from its reference time [s of GPS week],
    /// Clock Offset [s], Clock drift [s/s] and Clock drift rate [s/s^2].
    pub fn new(toc: f64, offset: f64, drift: f64, drift_rate: f64) -> Self {
        Self {
            toc,
            offset,
            drift,
            drift_rate,
        }
    }
    /// Clock model of this record, referenced to its header epoch
    pub fn from_record(record: &EphemerisRecord) -> Self {
        let params = &record.params;
        Self::new(
            seconds_of_week(record.epoch),
            params.clock_bias,
            params.clock_drift,
            params.clock_drift_rate,
        )
    }
    /// Clock model of a parameter set that has no header epoch
    /// (interpolated), referenced to its toe.
    pub fn from_parameters(params: &OrbitalParameterSet) -> Self {
        Self::new(
            params.toe,
            params.clock_bias,
            params.clock_drift,
            params.clock_drift_rate,
        )
    }
    /// Clock correction at t [s of GPS week]. Polynomial terms only:
    /// the relativistic term is not modeled.
    pub fn correction(&self, t: f64) -> Duration {
        let dt = wrap_week_crossover(t - self.toc);
        Duration::from_seconds(self.offset + self.drift * dt + self.drift_rate * dt.powi(2))
    }
}
