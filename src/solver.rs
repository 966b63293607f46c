//! Satellite state solver
use log::{debug, info, warn};
use thiserror::Error;

use crate::{
    archive::EphemerisArchive,
    cfg::Config,
    clock::Clock,
    ephemerides::{EphemerisRecord, ParsingError},
    interp::ParameterInterpolator,
    observation::{ObservationIndex, ObservationRecord},
    orbit::{OrbitPropagator, SatellitePosition},
    prelude::{Duration, Epoch, SV},
    selection::{EpochSelector, Selection},
    time::seconds_of_week,
};

#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed record: {0}")]
    MalformedRecord(#[from] ParsingError),
    #[error("{0}: no ephemeris available")]
    UnknownSatellite(SV),
    #[error("{0}: no ephemeris bracketing {1}")]
    NoBracketFound(SV, Epoch),
    #[error("{0}: nearest ephemeris to {1} is {2}s away")]
    NoNearbyEphemeris(SV, Epoch, f64),
    #[error("non finite orbital parameter: {0}")]
    InvalidParameters(&'static str),
    #[error("{0}: unhealthy vehicle")]
    UnhealthySatellite(SV),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Ephemeris the state was derived from
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Source {
    /// Broadcast record, published at this epoch
    Broadcast(Epoch),
    /// Interpolated between records published at these epochs
    Interpolated(Epoch, Epoch),
}

/// Resolved satellite state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SatelliteState {
    /// Satellite vehicle
    pub sv: SV,
    /// Instant of resolution
    pub epoch: Epoch,
    /// Ephemeris [Source]
    pub source: Source,
    /// ECEF position
    pub position: SatellitePosition,
    /// Broadcast clock correction
    pub clock_correction: Duration,
}

/// Resolves satellite states out of an [EphemerisArchive]
#[derive(Debug, Clone)]
pub struct Solver<'a> {
    /// Solver configuration
    cfg: Config,
    /// Ephemeris source
    archive: &'a EphemerisArchive,
    /// Selector, following the configured strategy
    selector: EpochSelector,
    /// Used by the bracket strategy
    interpolator: ParameterInterpolator,
    /// Shared by both strategies
    propagator: OrbitPropagator,
}

impl<'a> Solver<'a> {
    /// Builds new [Solver] using given Configuration settings
    pub fn new(cfg: Config, archive: &'a EphemerisArchive) -> Self {
        info!(
            "{} strategy - {} satellites archived",
            cfg.strategy,
            archive.satellites().count()
        );
        if archive.is_empty() {
            warn!("empty ephemeris archive: all queries will fail");
        }
        let selector = EpochSelector::new(cfg.strategy, cfg.nearest_max_distance);
        Self {
            cfg,
            archive,
            selector,
            interpolator: ParameterInterpolator::default(),
            propagator: OrbitPropagator::default(),
        }
    }
    /// Returns [Config] in use
    pub fn config(&self) -> &Config {
        &self.cfg
    }
    /// Indexes these observations, following the configured
    /// [crate::prelude::ObservationFallback]
    pub fn index_observations<'b, I: IntoIterator<Item = &'b ObservationRecord>>(
        &self,
        records: I,
    ) -> ObservationIndex {
        ObservationIndex::load(records).with_fallback(self.cfg.fallback)
    }
    fn check_health(&self, record: &EphemerisRecord) -> Result<(), Error> {
        if self.cfg.reject_unhealthy && !record.is_healthy() {
            return Err(Error::UnhealthySatellite(record.sv));
        }
        Ok(())
    }
    /// Resolves the state of this vehicle at given [Epoch]
    pub fn resolve(&self, sv: SV, t: Epoch) -> Result<SatelliteState, Error> {
        let t_sow = seconds_of_week(t);
        let (source, position, clock) = match self.selector.select(self.archive, sv, t)? {
            Selection::Bracket { before, after } => {
                self.check_health(before)?;
                self.check_health(after)?;
                let params = self.interpolator.interpolate(before, after, t);
                let position = self.propagator.compute_position(&params, t_sow)?;
                (
                    Source::Interpolated(before.epoch, after.epoch),
                    position,
                    Clock::from_parameters(&params),
                )
            },
            Selection::Nearest(record) => {
                self.check_health(record)?;
                let position = self.propagator.compute_position(&record.params, t_sow)?;
                (
                    Source::Broadcast(record.epoch),
                    position,
                    Clock::from_record(record),
                )
            },
        };

        debug!("{:?} ({}) - {:?}", t, sv, position.position);

        Ok(SatelliteState {
            sv,
            epoch: t,
            source,
            position,
            clock_correction: clock.correction(t_sow),
        })
    }
    /// Resolves the state of all these vehicles at given [Epoch].
    /// One failure does not prevent resolving the other vehicles.
    pub fn resolve_all(&self, t: Epoch, svs: &[SV]) -> Vec<(SV, Result<SatelliteState, Error>)> {
        svs.iter()
            .map(|sv| {
                let result = self.resolve(*sv, t);
                if let Err(e) = &result {
                    warn!("{:?} ({}) - {}", t, sv, e);
                }
                (*sv, result)
            })
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cfg::{ObservationFallback, Strategy};
    use crate::prelude::{Constellation, TimeScale};
    use crate::tests::{block, brdc_blocks, g05, g26, init_logger, obs_records, target};

    #[test]
    fn bracket_strategy() {
        init_logger();
        let archive = EphemerisArchive::load(&brdc_blocks());
        let solver = Solver::new(Config::default(), &archive);

        let state = solver.resolve(g26(), target()).unwrap();
        assert_eq!(state.sv, g26());
        assert_eq!(state.epoch, target());
        assert_eq!(
            state.source,
            Source::Interpolated(
                Epoch::from_gregorian(2024, 12, 27, 23, 59, 44, 0, TimeScale::GPST),
                Epoch::from_gregorian(2024, 12, 28, 1, 59, 44, 0, TimeScale::GPST),
            )
        );
        assert!(state.position.converged);

        // single G05 record
        assert!(matches!(
            solver.resolve(g05(), target()),
            Err(Error::NoBracketFound(_, _))
        ));
    }

    #[test]
    fn nearest_strategy() {
        init_logger();
        let archive = EphemerisArchive::load(&brdc_blocks());
        let cfg = Config::default().with_strategy(Strategy::Nearest);
        let solver = Solver::new(cfg, &archive);

        let state = solver.resolve(g05(), target()).unwrap();
        assert_eq!(
            state.source,
            Source::Broadcast(Epoch::from_gregorian(
                2024,
                12,
                27,
                23,
                59,
                44,
                0,
                TimeScale::GPST
            ))
        );

        // a0 + a1.dt, dt = 1816s, Duration has a nanosecond resolution
        let expected = 4.127062857151E-04 + 1.136868377216E-12 * 1816.0;
        assert!((state.clock_correction.to_seconds() - expected).abs() < 1.0E-9);

        let sv = SV::new(Constellation::GPS, 31);
        assert!(matches!(
            solver.resolve(sv, target()),
            Err(Error::UnknownSatellite(_))
        ));
    }

    #[test]
    fn unhealthy_vehicles() {
        init_logger();
        let mut sick = block("G26", "2024 12 28 01 59 44", 2.0);
        sick.lines[6] =
            "     2.000000000000E+00 6.300000000000E+01 6.519258022308E-09 6.900000000000E+01"
                .to_string();
        let blocks = vec![block("G26", "2024 12 27 23 59 44", 1.0), sick];
        let archive = EphemerisArchive::load(&blocks);

        let solver = Solver::new(Config::default(), &archive);
        assert!(solver.resolve(g26(), target()).is_ok());

        let solver = Solver::new(Config::default().rejecting_unhealthy(), &archive);
        assert!(matches!(
            solver.resolve(g26(), target()),
            Err(Error::UnhealthySatellite(_))
        ));
    }

    #[test]
    fn resolve_all() {
        init_logger();
        let archive = EphemerisArchive::load(&brdc_blocks());
        let solver = Solver::new(Config::default(), &archive);
        let g31 = SV::new(Constellation::GPS, 31);

        let results = solver.resolve_all(target(), &[g05(), g26(), g31]);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].0, g05());
        assert!(matches!(results[0].1, Err(Error::NoBracketFound(_, _))));
        assert_eq!(results[1].0, g26());
        assert!(results[1].1.is_ok());
        assert_eq!(results[2].0, g31);
        assert!(matches!(results[2].1, Err(Error::NoBracketFound(_, _))));
    }

    #[test]
    fn observation_fallback() {
        let archive = EphemerisArchive::load(&brdc_blocks());
        let t = Epoch::from_gregorian(2024, 12, 28, 0, 30, 5, 0, TimeScale::GPST);

        let solver = Solver::new(Config::default(), &archive);
        let index = solver.index_observations(&obs_records());
        assert_eq!(index.lookup(t, g26()), (0.0, 0.0));

        let cfg = Config::default().with_fallback(ObservationFallback::PerSatelliteNearest);
        let solver = Solver::new(cfg, &archive);
        let index = solver.index_observations(&obs_records());
        assert_eq!(index.lookup(t, g26()), (117421883.695, 42.0));
    }

    #[test]
    fn empty_archive() {
        let archive = EphemerisArchive::default();
        let solver = Solver::new(Config::default(), &archive);
        assert!(matches!(
            solver.resolve(g26(), target()),
            Err(Error::NoBracketFound(_, _))
        ));
    }
}
