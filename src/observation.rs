//! Observation index
use std::collections::{BTreeMap, HashMap};

use log::{debug, trace};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    archive::ParseReport,
    cfg::ObservationFallback,
    prelude::{Epoch, TimeScale, Unit, SV},
};

/// Signal observation of one satellite at one epoch
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ObservationRecord {
    /// Sampling epoch
    pub epoch: Epoch,
    /// SV (signal emitter)
    pub sv: SV,
    /// Carrier phase [cycles]
    pub carrier_phase: f64,
    /// Signal strength [dB.Hz]
    pub signal_strength: f64,
}

/// Indexed measurement
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Measurement {
    /// Carrier phase [cycles]
    pub carrier_phase: f64,
    /// Signal strength [dB.Hz]
    pub signal_strength: f64,
}

impl From<Measurement> for (f64, f64) {
    fn from(m: Measurement) -> Self {
        (m.carrier_phase, m.signal_strength)
    }
}

/// Formatted GPST timestamp, resolved to 100 ns like RINEX epochs.
/// Two epochs share a key when they format identically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EpochKey(String);

impl EpochKey {
    pub fn new(t: Epoch) -> Self {
        let t = t
            .to_time_scale(TimeScale::GPST)
            .round(100.0 * Unit::Nanosecond);
        Self(t.to_string())
    }
}

impl std::fmt::Display for EpochKey {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
struct IndexedEpoch {
    epoch: Epoch,
    measurements: HashMap<SV, Measurement>,
}

/// Epoch → satellite → measurement table.
/// Built once, read only afterwards.
#[derive(Debug, Default, Clone)]
pub struct ObservationIndex {
    epochs: BTreeMap<EpochKey, IndexedEpoch>,
    fallback: ObservationFallback,
    report: ParseReport,
}

impl ObservationIndex {
    /// Indexes these observations. When one satellite is observed
    /// twice at the same epoch, the latest observation is retained.
    pub fn load<'a, I: IntoIterator<Item = &'a ObservationRecord>>(records: I) -> Self {
        let mut s = Self::default();
        for record in records {
            let key = EpochKey::new(record.epoch);
            let entry = s.epochs.entry(key).or_insert_with(|| IndexedEpoch {
                epoch: record.epoch,
                measurements: HashMap::new(),
            });
            let measurement = Measurement {
                carrier_phase: record.carrier_phase,
                signal_strength: record.signal_strength,
            };
            if entry.measurements.insert(record.sv, measurement).is_some() {
                debug!("{:?} ({}) - duplicated observation", record.epoch, record.sv);
                s.report.skipped += 1;
            } else {
                s.report.loaded += 1;
            }
        }
        s
    }
    /// Returns Self with desired [ObservationFallback] policy
    pub fn with_fallback(mut self, fallback: ObservationFallback) -> Self {
        self.fallback = fallback;
        self
    }
    /// Exact lookup, then nearest epoch fallback.
    /// Returns (carrier phase, signal strength), or (0.0, 0.0) when
    /// no measurement could be found.
    pub fn lookup(&self, t: Epoch, sv: SV) -> (f64, f64) {
        self.try_lookup(t, sv).unwrap_or_default().into()
    }
    /// Same as [Self::lookup], without the null sentinel
    pub fn try_lookup(&self, t: Epoch, sv: SV) -> Option<Measurement> {
        if let Some(measurement) = self
            .epochs
            .get(&EpochKey::new(t))
            .and_then(|indexed| indexed.measurements.get(&sv))
        {
            return Some(*measurement);
        }

        let nearest = match self.fallback {
            ObservationFallback::GlobalNearest => self.nearest(t, |_| true),
            ObservationFallback::PerSatelliteNearest => {
                self.nearest(t, |indexed| indexed.measurements.contains_key(&sv))
            },
        }?;

        trace!("{:?} ({}) - nearest epoch {:?}", t, sv, nearest.epoch);
        nearest.measurements.get(&sv).copied()
    }
    /// Nearest indexed epoch among the ones matching the filter.
    /// Ties resolve to the earliest epoch.
    fn nearest<F: Fn(&IndexedEpoch) -> bool>(&self, t: Epoch, filter: F) -> Option<&IndexedEpoch> {
        self.epochs
            .values()
            .filter(|&indexed| filter(indexed))
            .min_by(|a, b| {
                let da = (a.epoch - t).abs();
                let db = (b.epoch - t).abs();
                da.cmp(&db).then(a.epoch.cmp(&b.epoch))
            })
    }
    /// Returns indexed epochs, in chronological order
    pub fn epochs(&self) -> Vec<Epoch> {
        let mut epochs = self
            .epochs
            .values()
            .map(|indexed| indexed.epoch)
            .collect::<Vec<_>>();
        epochs.sort();
        epochs
    }
    /// Number of indexed epochs
    pub fn len(&self) -> usize {
        self.epochs.len()
    }
    /// True if nothing was indexed
    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }
    /// Returns the [ParseReport]
    pub fn report(&self) -> ParseReport {
        self.report
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tests::{g05, g26, obs_records};
    use rstest::rstest;
    use std::str::FromStr;

    fn gpst(second: u8) -> Epoch {
        Epoch::from_gregorian(2024, 12, 28, 0, 30, second, 0, TimeScale::GPST)
    }

    #[test]
    fn epoch_keys() {
        let gpst = Epoch::from_str("2024-12-28T00:30:01 GPST").unwrap();
        let utc = Epoch::from_str("2024-12-28T00:29:43 UTC").unwrap();
        assert_eq!(EpochKey::new(gpst), EpochKey::new(utc));
        assert_ne!(EpochKey::new(gpst), EpochKey::new(gpst + 1.0 * Unit::Second));
        // sub 100ns differences are not significant
        assert_eq!(
            EpochKey::new(gpst),
            EpochKey::new(gpst + 10.0 * Unit::Nanosecond)
        );
    }

    #[test]
    fn indexing() {
        let index = ObservationIndex::load(&obs_records());
        assert_eq!(index.len(), 5);
        assert_eq!(index.report(), ParseReport { loaded: 8, skipped: 0 });
        assert_eq!(
            index.epochs(),
            vec![gpst(0), gpst(1), gpst(2), gpst(5), gpst(9)]
        );
    }

    #[rstest]
    #[case(1, (117424198.475, 41.5), (110013868.527, 44.25))]
    // 00:30:09 is indexed without G05
    #[case(9, (117410309.875, 43.5), (0.0, 0.0))]
    // nearest: 00:30:05
    #[case(4, (0.0, 0.0), (110019962.117, 45.0))]
    #[case(6, (0.0, 0.0), (110019962.117, 45.0))]
    // equidistant from 00:30:05 and 00:30:09: earliest wins
    #[case(7, (0.0, 0.0), (110019962.117, 45.0))]
    // nearest: 00:30:09
    #[case(8, (117410309.875, 43.5), (0.0, 0.0))]
    #[case(30, (117410309.875, 43.5), (0.0, 0.0))]
    fn global_nearest(#[case] second: u8, #[case] g26_m: (f64, f64), #[case] g05_m: (f64, f64)) {
        let index = ObservationIndex::load(&obs_records());
        assert_eq!(index.lookup(gpst(second), g26()), g26_m);
        assert_eq!(index.lookup(gpst(second), g05()), g05_m);
    }

    #[rstest]
    #[case(1, (117424198.475, 41.5), (110013868.527, 44.25))]
    #[case(4, (117421883.695, 42.0), (110019962.117, 45.0))]
    #[case(6, (117410309.875, 43.5), (110019962.117, 45.0))]
    #[case(8, (117410309.875, 43.5), (110019962.117, 45.0))]
    fn per_satellite_nearest(
        #[case] second: u8,
        #[case] g26_m: (f64, f64),
        #[case] g05_m: (f64, f64),
    ) {
        let index = ObservationIndex::load(&obs_records())
            .with_fallback(ObservationFallback::PerSatelliteNearest);
        assert_eq!(index.lookup(gpst(second), g26()), g26_m);
        assert_eq!(index.lookup(gpst(second), g05()), g05_m);
    }

    #[test]
    fn utc_lookup() {
        let index = ObservationIndex::load(&obs_records());
        let t = Epoch::from_str("2024-12-28T00:29:44 UTC").unwrap();
        assert_eq!(index.lookup(t, g26()), (117421883.695, 42.0));
    }

    #[test]
    fn unknown_satellite() {
        let index = ObservationIndex::load(&obs_records())
            .with_fallback(ObservationFallback::PerSatelliteNearest);
        let sv = SV::from_str("G12").unwrap();
        assert_eq!(index.lookup(gpst(1), sv), (0.0, 0.0));
        assert_eq!(index.try_lookup(gpst(1), sv), None);
    }

    #[test]
    fn empty_index() {
        let index = ObservationIndex::load(&Vec::<ObservationRecord>::new());
        assert!(index.is_empty());
        assert_eq!(index.lookup(gpst(1), g26()), (0.0, 0.0));
    }

    #[test]
    fn duplicated_observations() {
        let record = ObservationRecord {
            epoch: gpst(0),
            sv: g26(),
            carrier_phase: 1.0,
            signal_strength: 30.0,
        };
        let mut second = record;
        second.carrier_phase = 2.0;

        let index = ObservationIndex::load(&[record, second]);
        assert_eq!(index.report(), ParseReport { loaded: 1, skipped: 1 });
        assert_eq!(index.lookup(gpst(0), g26()), (2.0, 30.0));
    }
}
