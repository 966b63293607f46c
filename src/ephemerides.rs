use std::ops::Range;
use std::str::FromStr;

use thiserror::Error;

use crate::clock::Clock;
use crate::kepler::{Keplerian, Perturbations};
use crate::prelude::{Constellation, Duration, Epoch, TimeScale, SV};
use crate::reader::RawBlock;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of lines of a GPS broadcast ephemeris frame
pub const BLOCK_LINES: usize = 8;

/// Record parsing errors. These never abort a load: the faulty
/// record is reported and skipped.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParsingError {
    #[error("incomplete ephemeris block ({0} lines)")]
    IncompleteBlock(usize),
    #[error("line too short for {0}")]
    ShortLine(&'static str),
    #[error("failed to parse {0}")]
    FloatParsing(&'static str),
    #[error("failed to parse epoch {0}")]
    IntegerParsing(&'static str),
    #[error("invalid sv identifier \"{0}\"")]
    SvParsing(String),
    #[error("{0}: only gps vehicles are supported")]
    UnsupportedConstellation(SV),
    #[error("invalid calendar epoch")]
    InvalidEpoch,
    #[error("observation prior any epoch")]
    MissingEpoch,
    #[error("missing observation token")]
    MissingToken,
}

/// One set of broadcast orbital parameters, as transmitted.
/// Units are the broadcast ones: seconds, meters and radians.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OrbitalParameterSet {
    /// Issue of data (ephemeris)
    pub iode: f64,
    /// Amplitude of sine harmonic correction term of the orbit radius [m]
    pub crs: f64,
    /// Mean motion difference from computed value [rad.s-1]
    pub delta_n: f64,
    /// Mean anomaly at reference time [rad]
    pub m0: f64,
    /// Amplitude of cosine harmonic correction term of the argument of latitude [rad]
    pub cuc: f64,
    /// Eccentricity
    pub e: f64,
    /// Amplitude of sine harmonic correction term of the argument of latitude [rad]
    pub cus: f64,
    /// Square root of the semi major axis [m^1/2]
    pub sqrt_a: f64,
    /// Time of ephemeris [s of GPS week]
    pub toe: f64,
    /// Amplitude of cosine harmonic correction term of the inclination [rad]
    pub cic: f64,
    /// Longitude of ascending node at weekly epoch [rad]
    pub omega0: f64,
    /// Amplitude of sine harmonic correction term of the inclination [rad]
    pub cis: f64,
    /// Inclination at reference time [rad]
    pub i0: f64,
    /// Amplitude of cosine harmonic correction term of the orbit radius [m]
    pub crc: f64,
    /// Argument of perigee [rad]
    pub omega: f64,
    /// Rate of right ascension [rad.s-1]
    pub omega_dot: f64,
    /// Rate of inclination [rad.s-1]
    pub idot: f64,
    /// Clock bias [s]
    pub clock_bias: f64,
    /// Clock drift [s.s-1]
    pub clock_drift: f64,
    /// Clock drift rate [s.s-2]
    pub clock_drift_rate: f64,
}

impl OrbitalParameterSet {
    /// Returns all fields by name
    pub fn fields(&self) -> [(&'static str, f64); 20] {
        [
            ("iode", self.iode),
            ("crs", self.crs),
            ("delta_n", self.delta_n),
            ("m0", self.m0),
            ("cuc", self.cuc),
            ("e", self.e),
            ("cus", self.cus),
            ("sqrt_a", self.sqrt_a),
            ("toe", self.toe),
            ("cic", self.cic),
            ("omega0", self.omega0),
            ("cis", self.cis),
            ("i0", self.i0),
            ("crc", self.crc),
            ("omega", self.omega),
            ("omega_dot", self.omega_dot),
            ("idot", self.idot),
            ("clock_bias", self.clock_bias),
            ("clock_drift", self.clock_drift),
            ("clock_drift_rate", self.clock_drift_rate),
        ]
    }
    /// Returns name of first non finite field, if any
    pub fn first_non_finite(&self) -> Option<&'static str> {
        self.fields()
            .into_iter()
            .find(|(_, value)| !value.is_finite())
            .map(|(name, _)| name)
    }
    /// Combines Self and rhs, field by field
    pub(crate) fn zip_with<F: Fn(f64, f64) -> f64>(&self, rhs: &Self, f: F) -> Self {
        Self {
            iode: f(self.iode, rhs.iode),
            crs: f(self.crs, rhs.crs),
            delta_n: f(self.delta_n, rhs.delta_n),
            m0: f(self.m0, rhs.m0),
            cuc: f(self.cuc, rhs.cuc),
            e: f(self.e, rhs.e),
            cus: f(self.cus, rhs.cus),
            sqrt_a: f(self.sqrt_a, rhs.sqrt_a),
            toe: f(self.toe, rhs.toe),
            cic: f(self.cic, rhs.cic),
            omega0: f(self.omega0, rhs.omega0),
            cis: f(self.cis, rhs.cis),
            i0: f(self.i0, rhs.i0),
            crc: f(self.crc, rhs.crc),
            omega: f(self.omega, rhs.omega),
            omega_dot: f(self.omega_dot, rhs.omega_dot),
            idot: f(self.idot, rhs.idot),
            clock_bias: f(self.clock_bias, rhs.clock_bias),
            clock_drift: f(self.clock_drift, rhs.clock_drift),
            clock_drift_rate: f(self.clock_drift_rate, rhs.clock_drift_rate),
        }
    }
    /// Returns [Keplerian] parameters
    pub fn keplerian(&self) -> Keplerian {
        Keplerian {
            a: self.sqrt_a.powi(2),
            e: self.e,
            i_0: self.i0,
            omega_0: self.omega0,
            m_0: self.m0,
            omega: self.omega,
            toe: self.toe,
        }
    }
    /// Returns orbit [Perturbations]
    pub fn perturbations(&self) -> Perturbations {
        Perturbations {
            dn: self.delta_n,
            i_dot: self.idot,
            omega_dot: self.omega_dot,
            cus: self.cus,
            cuc: self.cuc,
            cis: self.cis,
            cic: self.cic,
            crs: self.crs,
            crc: self.crc,
        }
    }
    /// Broadcast clock correction at t [s of GPS week], referenced to toe
    pub fn clock_correction(&self, t_sow: f64) -> Duration {
        Clock::from_parameters(self).correction(t_sow)
    }
}

/// Broadcast ephemeris record of one satellite
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EphemerisRecord {
    /// Satellite vehicle
    pub sv: SV,
    /// Calendar epoch of the record header (time of clock), in GPST
    pub epoch: Epoch,
    /// Orbital parameters
    pub params: OrbitalParameterSet,
    /// GPS week, when broadcast
    pub week: Option<u32>,
    /// SV health flag, when broadcast
    pub health: Option<f64>,
    /// Total group delay [s], when broadcast
    pub tgd: Option<f64>,
}

/// Returns the `[start, end)` columns of this line, tolerating
/// stripped trailing whitespace.
fn columns(line: &str, range: Range<usize>) -> Option<&str> {
    let end = range.end.min(line.len());
    if range.start >= end {
        return None;
    }
    line.get(range.start..end)
}

fn parse_f64(line: &str, range: Range<usize>, field: &'static str) -> Result<f64, ParsingError> {
    let content = columns(line, range).ok_or(ParsingError::ShortLine(field))?;
    content
        .trim()
        .replace(['D', 'd'], "E")
        .parse::<f64>()
        .map_err(|_| ParsingError::FloatParsing(field))
}

fn parse_int<T: FromStr>(
    line: &str,
    range: Range<usize>,
    field: &'static str,
) -> Result<T, ParsingError> {
    let content = columns(line, range).ok_or(ParsingError::ShortLine(field))?;
    content
        .trim()
        .parse::<T>()
        .map_err(|_| ParsingError::IntegerParsing(field))
}

/// Four 19 character wide fields per continuation line
const FIELD_0: Range<usize> = 0..23;
const FIELD_1: Range<usize> = 23..42;
const FIELD_2: Range<usize> = 42..61;
const FIELD_3: Range<usize> = 61..80;

impl EphemerisRecord {
    /// Parses a GPS SV identifier, like "G26"
    pub fn parse_sv(tag: &str) -> Result<SV, ParsingError> {
        let sv = SV::from_str(tag.trim()).map_err(|_| ParsingError::SvParsing(tag.to_string()))?;
        if sv.constellation != Constellation::GPS {
            return Err(ParsingError::UnsupportedConstellation(sv));
        }
        Ok(sv)
    }
    /// Parses one 8 line broadcast frame, tagged by satellite identifier.
    pub fn parse<S: AsRef<str>>(tag: &str, lines: &[S]) -> Result<Self, ParsingError> {
        if lines.len() != BLOCK_LINES {
            return Err(ParsingError::IncompleteBlock(lines.len()));
        }

        let sv = Self::parse_sv(tag)?;

        let line1 = lines[0].as_ref();
        let year = parse_int::<i32>(line1, 3..8, "year")?;
        let month = parse_int::<u8>(line1, 9..11, "month")?;
        let day = parse_int::<u8>(line1, 12..14, "day")?;
        let hour = parse_int::<u8>(line1, 15..17, "hour")?;
        let minute = parse_int::<u8>(line1, 18..20, "minute")?;
        let second = parse_int::<u8>(line1, 21..23, "second")?;

        let epoch =
            Epoch::maybe_from_gregorian(year, month, day, hour, minute, second, 0, TimeScale::GPST)
                .map_err(|_| ParsingError::InvalidEpoch)?;

        let (line2, line3, line4, line5, line6) = (
            lines[1].as_ref(),
            lines[2].as_ref(),
            lines[3].as_ref(),
            lines[4].as_ref(),
            lines[5].as_ref(),
        );

        let params = OrbitalParameterSet {
            clock_bias: parse_f64(line1, FIELD_1, "clock_bias")?,
            clock_drift: parse_f64(line1, FIELD_2, "clock_drift")?,
            clock_drift_rate: parse_f64(line1, FIELD_3, "clock_drift_rate")?,
            iode: parse_f64(line2, FIELD_0, "iode")?,
            crs: parse_f64(line2, FIELD_1, "crs")?,
            delta_n: parse_f64(line2, FIELD_2, "delta_n")?,
            m0: parse_f64(line2, FIELD_3, "m0")?,
            cuc: parse_f64(line3, FIELD_0, "cuc")?,
            e: parse_f64(line3, FIELD_1, "e")?,
            cus: parse_f64(line3, FIELD_2, "cus")?,
            sqrt_a: parse_f64(line3, FIELD_3, "sqrt_a")?,
            toe: parse_f64(line4, FIELD_0, "toe")?,
            cic: parse_f64(line4, FIELD_1, "cic")?,
            omega0: parse_f64(line4, FIELD_2, "omega0")?,
            cis: parse_f64(line4, FIELD_3, "cis")?,
            i0: parse_f64(line5, FIELD_0, "i0")?,
            crc: parse_f64(line5, FIELD_1, "crc")?,
            omega: parse_f64(line5, FIELD_2, "omega")?,
            omega_dot: parse_f64(line5, FIELD_3, "omega_dot")?,
            idot: parse_f64(line6, FIELD_0, "idot")?,
        };

        // auxiliary fields: best effort
        let line7 = lines[6].as_ref();
        let week = parse_f64(line6, FIELD_2, "week")
            .ok()
            .filter(|week| *week >= 0.0)
            .map(|week| week as u32);
        let health = parse_f64(line7, FIELD_1, "health").ok();
        let tgd = parse_f64(line7, FIELD_2, "tgd").ok();

        Ok(Self {
            sv,
            epoch,
            params,
            week,
            health,
            tgd,
        })
    }
    /// Returns true if this satellite was declared healthy, or did not
    /// broadcast its health
    pub fn is_healthy(&self) -> bool {
        self.health.map(|health| health == 0.0).unwrap_or(true)
    }
}

impl TryFrom<&RawBlock> for EphemerisRecord {
    type Error = crate::Error;
    fn try_from(block: &RawBlock) -> Result<Self, Self::Error> {
        Ok(Self::parse(&block.sv, &block.lines)?)
    }
}
