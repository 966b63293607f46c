//! Broadcast ephemeris archive
use std::collections::HashMap;

use itertools::Itertools;
use log::{debug, warn};

use crate::{
    ephemerides::EphemerisRecord,
    prelude::SV,
    reader::RawBlock,
};

/// Load statistics
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ParseReport {
    /// Records that were retained
    pub loaded: usize,
    /// Records that were dropped (malformed or duplicated)
    pub skipped: usize,
}

/// Per satellite broadcast ephemeris storage.
/// Built once, read only afterwards.
#[derive(Debug, Default, Clone)]
pub struct EphemerisArchive {
    records: HashMap<SV, Vec<EphemerisRecord>>,
    report: ParseReport,
}

impl EphemerisArchive {
    /// Builds the archive from raw broadcast frames, in any order.
    /// Malformed frames are logged and skipped.
    pub fn load<'a, I: IntoIterator<Item = &'a RawBlock>>(blocks: I) -> Self {
        let mut skipped = 0;
        let mut records = Vec::<EphemerisRecord>::new();

        for block in blocks {
            match EphemerisRecord::try_from(block) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!("{} - {}", block.sv, e);
                    skipped += 1;
                },
            }
        }

        let mut s = Self::from_records(records);
        s.report.skipped += skipped;
        debug!(
            "ephemeris archive: {} records loaded, {} skipped",
            s.report.loaded, s.report.skipped
        );
        s
    }
    /// Builds the archive from already parsed records, in any order.
    /// Records sharing the same epoch are dropped, except the first one.
    pub fn from_records<I: IntoIterator<Item = EphemerisRecord>>(records: I) -> Self {
        let mut report = ParseReport::default();
        let mut grouped = HashMap::<SV, Vec<EphemerisRecord>>::new();

        for record in records {
            grouped.entry(record.sv).or_default().push(record);
        }

        for (sv, records) in grouped.iter_mut() {
            let total = records.len();
            // stable: first parsed wins
            let sorted = records
                .drain(..)
                .sorted_by(|a, b| a.epoch.cmp(&b.epoch))
                .dedup_by(|a, b| a.epoch == b.epoch)
                .collect::<Vec<_>>();
            if sorted.len() < total {
                warn!("{} - {} duplicated record(s) dropped", sv, total - sorted.len());
            }
            report.loaded += sorted.len();
            report.skipped += total - sorted.len();
            *records = sorted;
        }

        Self {
            records: grouped,
            report,
        }
    }
    /// Returns all records for this satellite, in chronological order.
    /// Unknown satellites return an empty slice.
    pub fn records_for(&self, sv: SV) -> &[EphemerisRecord] {
        self.records
            .get(&sv)
            .map(|records| records.as_slice())
            .unwrap_or(&[])
    }
    /// Returns archived satellites, sorted
    pub fn satellites(&self) -> impl Iterator<Item = SV> + '_ {
        self.records.keys().copied().sorted()
    }
    /// Total number of records
    pub fn len(&self) -> usize {
        self.report.loaded
    }
    /// True if no record was archived
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Returns the [ParseReport]
    pub fn report(&self) -> ParseReport {
        self.report
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::prelude::{Epoch, TimeScale};
    use crate::tests::{block, brdc_blocks, g05, g26};

    #[test]
    fn load_test_resources() {
        let archive = EphemerisArchive::load(&brdc_blocks());
        assert_eq!(archive.len(), 3);
        assert_eq!(archive.report(), ParseReport { loaded: 3, skipped: 0 });
        assert_eq!(archive.satellites().collect::<Vec<_>>(), vec![g05(), g26()]);

        let records = archive.records_for(g26());
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].epoch,
            Epoch::from_gregorian(2024, 12, 27, 23, 59, 44, 0, TimeScale::GPST)
        );
        assert_eq!(
            records[1].epoch,
            Epoch::from_gregorian(2024, 12, 28, 1, 59, 44, 0, TimeScale::GPST)
        );
        assert_eq!(archive.records_for(g05()).len(), 1);
    }

    #[test]
    fn unknown_satellite() {
        let archive = EphemerisArchive::load(&brdc_blocks());
        let sv = SV::new(crate::prelude::Constellation::GPS, 31);
        assert!(archive.records_for(sv).is_empty());
    }

    #[test]
    fn sorting_and_duplicates() {
        let blocks = vec![
            block("G26", "2024 12 28 01 59 44", 2.0),
            block("G26", "2024 12 27 23 59 44", 1.0),
            block("G26", "2024 12 28 01 59 44", 3.0),
            block("G26", "2024 12 28 03 59 44", 4.0),
        ];
        let archive = EphemerisArchive::load(&blocks);
        assert_eq!(archive.report(), ParseReport { loaded: 3, skipped: 1 });

        let iode = archive
            .records_for(g26())
            .iter()
            .map(|rec| rec.params.iode)
            .collect::<Vec<_>>();
        // first parsed wins
        assert_eq!(iode, vec![1.0, 2.0, 4.0]);

        for pair in archive.records_for(g26()).windows(2) {
            assert!(pair[0].epoch < pair[1].epoch);
        }
    }

    #[test]
    fn best_effort_ingestion() {
        let mut corrupt = block("G26", "2024 12 28 01 59 44", 2.0);
        corrupt.lines[2] = "     garbage".to_string();

        let mut truncated = block("G05", "2024 12 28 01 59 44", 2.0);
        truncated.lines.truncate(4);

        let blocks = vec![
            block("G26", "2024 12 27 23 59 44", 1.0),
            corrupt,
            truncated,
            block("G05", "2024 12 27 23 59 44", 1.0),
        ];
        let archive = EphemerisArchive::load(&blocks);
        assert_eq!(archive.report(), ParseReport { loaded: 2, skipped: 2 });
        assert_eq!(archive.records_for(g26()).len(), 1);
        assert_eq!(archive.records_for(g05()).len(), 1);
    }

    #[test]
    fn empty() {
        let archive = EphemerisArchive::load(&Vec::<RawBlock>::new());
        assert!(archive.is_empty());
        assert_eq!(archive.satellites().count(), 0);
    }
}
