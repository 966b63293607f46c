use std::str::FromStr;

use crate::{
    observation::ObservationRecord,
    prelude::{Constellation, Epoch, TimeScale, SV},
    reader::{NavigationReader, ObservationReader, RawBlock},
};


pub const BRDC_NAV: &str =
    include_str!("../../test_resources/NAV/BRDC00TST_R_20243620000_01D_GN.rnx");

pub const OBS: &str = include_str!("../../test_resources/OBS/GSDR362a30.24O");

/// G26 frame, used as template
const TEMPLATE: [&str; 8] = [
    "G26 2024 12 27 23 59 44-2.522906288505E-05-1.455191522837E-11 0.000000000000E+00",
    "     6.800000000000E+01 2.596875000000E+01 5.071639825584E-09-1.701657829267E+00",
    "     1.104548573494E-06 9.773897123523E-03 9.480863809586E-06 5.153752502441E+03",
    "     5.183840000000E+05 6.705522537231E-08 2.363421419612E+00-1.359730958939E-07",
    "     9.298234122031E-01 1.748750000000E+02 5.995726430872E-01-8.051049644248E-09",
    "    -3.396570052205E-10 1.000000000000E+00 2.346000000000E+03 0.000000000000E+00",
    "     2.000000000000E+00 0.000000000000E+00 6.519258022308E-09 6.800000000000E+01",
    "     5.183680000000E+05 4.000000000000E+00",
];

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn g05() -> SV {
    SV::new(Constellation::GPS, 5)
}

pub fn g26() -> SV {
    SV::new(Constellation::GPS, 26)
}

/// 2024-12-28T00:30:00 GPST, 520200s of week 2346
pub fn target() -> Epoch {
    Epoch::from_gregorian(2024, 12, 28, 0, 30, 0, 0, TimeScale::GPST)
}

/// Frames of the navigation test resource
pub fn brdc_blocks() -> Vec<RawBlock> {
    NavigationReader::from_str(BRDC_NAV).unwrap().into_blocks()
}

/// Records of the observation test resource
pub fn obs_records() -> Vec<ObservationRecord> {
    ObservationReader::from_str(OBS).unwrap().records().to_vec()
}

/// Builds a valid frame published at this "YYYY MM DD HH MM SS" epoch,
/// with desired IODE. Other parameters are the template ones.
pub fn block(sv: &str, epoch: &str, iode: f64) -> RawBlock {
    let mut lines = TEMPLATE.map(|line| line.to_string()).to_vec();
    lines[0] = format!("{} {}{}", sv, epoch, &TEMPLATE[0][23..]);
    lines[1] = format!(
        "{:>23}{}",
        format!("{:.12E}", iode),
        &TEMPLATE[1][23..]
    );
    RawBlock {
        sv: sv.to_string(),
        lines,
    }
}

#[test]
fn frame_builder() {
    let raw = block("G05", "2024 12 28 01 59 44", 3.0);
    assert_eq!(raw.lines.len(), 8);
    let record = crate::ephemerides::EphemerisRecord::parse(&raw.sv, &raw.lines).unwrap();
    assert_eq!(record.sv, g05());
    assert_eq!(
        record.epoch,
        Epoch::from_gregorian(2024, 12, 28, 1, 59, 44, 0, TimeScale::GPST)
    );
    assert_eq!(record.params.iode, 3.0);
    assert_eq!(record.params.crs, 25.96875);
}
