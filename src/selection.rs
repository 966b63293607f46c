//! Ephemeris selection
use itertools::Itertools;
use log::trace;

use crate::{
    archive::EphemerisArchive,
    cfg::Strategy,
    ephemerides::EphemerisRecord,
    prelude::{Epoch, SV},
    solver::Error,
};

/// Records selected for one (SV, Epoch) query
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Selection<'a> {
    /// Adjacent records surrounding the target epoch
    Bracket {
        before: &'a EphemerisRecord,
        after: &'a EphemerisRecord,
    },
    /// Closest record to the target epoch
    Nearest(&'a EphemerisRecord),
}

/// Selects archived records, following the [Strategy]
/// picked at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochSelector {
    strategy: Strategy,
    /// [Strategy::Nearest] acceptance threshold [s]
    max_distance: f64,
}

impl EpochSelector {
    pub fn new(strategy: Strategy, max_distance: f64) -> Self {
        Self {
            strategy,
            max_distance,
        }
    }
    /// Returns the [Strategy] in use
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }
    /// Selects record(s) of this SV for target epoch t
    pub fn select<'a>(
        &self,
        archive: &'a EphemerisArchive,
        sv: SV,
        t: Epoch,
    ) -> Result<Selection<'a>, Error> {
        let records = archive.records_for(sv);
        match self.strategy {
            Strategy::Bracket => Self::bracket(records, sv, t),
            Strategy::Nearest => self.nearest(records, sv, t),
        }
    }
    /// Unique adjacent pair such that before.epoch <= t < after.epoch
    fn bracket(records: &[EphemerisRecord], sv: SV, t: Epoch) -> Result<Selection, Error> {
        let (before, after) = records
            .iter()
            .tuple_windows()
            .find(|(before, after)| before.epoch <= t && t < after.epoch)
            .ok_or(Error::NoBracketFound(sv, t))?;

        trace!(
            "{:?} ({}) - bracket [{:?}, {:?}[",
            t,
            sv,
            before.epoch,
            after.epoch
        );
        Ok(Selection::Bracket { before, after })
    }
    /// Closest record, within max_distance (inclusive).
    /// Ties resolve to the earliest record.
    fn nearest<'a>(
        &self,
        records: &'a [EphemerisRecord],
        sv: SV,
        t: Epoch,
    ) -> Result<Selection<'a>, Error> {
        let nearest = records
            .iter()
            .position_min_by(|a, b| (a.epoch - t).abs().cmp(&(b.epoch - t).abs()))
            .map(|index| &records[index])
            .ok_or(Error::UnknownSatellite(sv))?;

        let distance = (nearest.epoch - t).abs().to_seconds();
        if distance > self.max_distance {
            return Err(Error::NoNearbyEphemeris(sv, t, distance));
        }

        trace!("{:?} ({}) - nearest {:?}", t, sv, nearest.epoch);
        Ok(Selection::Nearest(nearest))
    }
}
