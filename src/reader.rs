//! RINEX text readers: header skipping, frame grouping and tokenization.
//! No orbital calculations take place here.
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use log::{debug, warn};

use crate::{
    archive::ParseReport,
    ephemerides::{ParsingError, BLOCK_LINES},
    observation::ObservationRecord,
    prelude::{Epoch, TimeScale, SV},
    solver::Error,
};

const END_OF_HEADER: &str = "END OF HEADER";

/// Raw broadcast frame, tagged by satellite identifier
#[derive(Debug, Clone, PartialEq)]
pub struct RawBlock {
    /// Satellite identifier, like "G26"
    pub sv: String,
    /// Frame content, header line included
    pub lines: Vec<String>,
}

/// True if this line opens a navigation record: letter + 2 digits
fn is_record_start(line: &str) -> bool {
    let bytes = line.as_bytes();
    bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1].is_ascii_digit()
        && bytes[2].is_ascii_digit()
}

/// Splits content into lines. Invalid UTF-8 is replaced rather than
/// reported, so a single bad byte only spoils its own line: only actual
/// I/O errors come out of this iterator.
fn lossy_lines<R: BufRead>(reader: R) -> impl Iterator<Item = std::io::Result<String>> {
    reader.split(b'\n').map(|bytes| {
        bytes.map(|bytes| {
            let content = String::from_utf8_lossy(&bytes);
            content
                .strip_suffix('\r')
                .unwrap_or(&content)
                .to_string()
        })
    })
}

/// Consumes the header, returns true if its end was found
fn skip_header<I: Iterator<Item = std::io::Result<String>>>(
    lines: &mut I,
) -> Result<bool, Error> {
    for line in lines.by_ref() {
        if line?.contains(END_OF_HEADER) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Navigation (broadcast ephemeris) RINEX reader.
/// Only GPS frames are retained, other constellations are skipped.
#[derive(Debug, Default, Clone)]
pub struct NavigationReader {
    blocks: Vec<RawBlock>,
}

impl NavigationReader {
    /// Reads the navigation file located at path
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let fd = File::open(path)?;
        Self::from_reader(BufReader::new(fd))
    }
    /// Reads navigation content from any buffered reader
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, Error> {
        let mut blocks = Vec::<RawBlock>::new();
        let mut lines = lossy_lines(reader);

        if !skip_header(&mut lines)? {
            warn!("navigation: header never terminated");
            return Ok(Self { blocks });
        }

        let mut current = Option::<RawBlock>::None;

        for line in lines {
            let line = line?;
            if is_record_start(&line) {
                if let Some(block) = current.take() {
                    // interrupted frame: the archive will reject it
                    blocks.push(block);
                }
                let sv = &line[..3];
                if line.starts_with('G') {
                    current = Some(RawBlock {
                        sv: sv.to_string(),
                        lines: vec![line],
                    });
                } else {
                    debug!("navigation: skipping {} record", sv);
                }
                continue;
            }
            if let Some(block) = current.as_mut() {
                block.lines.push(line);
                if block.lines.len() == BLOCK_LINES {
                    blocks.extend(current.take());
                }
            }
        }

        blocks.extend(current);
        Ok(Self { blocks })
    }
    /// Returns all frames, in file order
    pub fn blocks(&self) -> &[RawBlock] {
        &self.blocks
    }
    /// Converts Self into its frames
    pub fn into_blocks(self) -> Vec<RawBlock> {
        self.blocks
    }
}

impl FromStr for NavigationReader {
    type Err = Error;
    fn from_str(content: &str) -> Result<Self, Self::Err> {
        Self::from_reader(content.as_bytes())
    }
}

/// Parses the "YYYY MM DD HH MM SS.sssssss" observation epoch, in GPST
pub(crate) fn parse_observation_epoch(content: &str) -> Result<Epoch, ParsingError> {
    let items = content.split_whitespace().collect::<Vec<_>>();
    if items.len() != 6 {
        return Err(ParsingError::InvalidEpoch);
    }

    let year = items[0]
        .parse::<i32>()
        .map_err(|_| ParsingError::IntegerParsing("year"))?;
    let mut fields = [0_u8; 4];
    for (field, (item, name)) in fields
        .iter_mut()
        .zip(items[1..5].iter().zip(["month", "day", "hour", "minute"]))
    {
        *field = item
            .parse::<u8>()
            .map_err(|_| ParsingError::IntegerParsing(name))?;
    }

    let (secs, fract) = items[5].split_once('.').unwrap_or((items[5], ""));
    let second = secs
        .parse::<u8>()
        .map_err(|_| ParsingError::IntegerParsing("second"))?;

    // nanosecond resolution: pad or truncate to 9 digits
    let digits = fract.chars().take(9).collect::<String>();
    let nanos = if digits.is_empty() {
        0
    } else {
        format!("{:0<9}", digits)
            .parse::<u32>()
            .map_err(|_| ParsingError::IntegerParsing("nanoseconds"))?
    };

    Epoch::maybe_from_gregorian(
        year,
        fields[0],
        fields[1],
        fields[2],
        fields[3],
        second,
        nanos,
        TimeScale::GPST,
    )
    .map_err(|_| ParsingError::InvalidEpoch)
}

/// Parses one observation line: sv, carrier phase (4th token),
/// signal strength (last token)
fn parse_observation_line(epoch: Epoch, line: &str) -> Result<ObservationRecord, ParsingError> {
    let tokens = line.split_whitespace().collect::<Vec<_>>();
    let sv_token = tokens.first().ok_or(ParsingError::MissingToken)?;
    let sv = SV::from_str(sv_token).map_err(|_| ParsingError::SvParsing(sv_token.to_string()))?;

    let phase = tokens.get(3).ok_or(ParsingError::MissingToken)?;
    let carrier_phase = phase
        .parse::<f64>()
        .map_err(|_| ParsingError::FloatParsing("carrier phase"))?;

    let strength = tokens.last().ok_or(ParsingError::MissingToken)?;
    let signal_strength = strength
        .parse::<f64>()
        .map_err(|_| ParsingError::FloatParsing("signal strength"))?;

    Ok(ObservationRecord {
        epoch,
        sv,
        carrier_phase,
        signal_strength,
    })
}

/// Observation RINEX reader
#[derive(Debug, Default, Clone)]
pub struct ObservationReader {
    records: Vec<ObservationRecord>,
    report: ParseReport,
}

impl ObservationReader {
    /// Reads the observation file located at path
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let fd = File::open(path)?;
        Self::from_reader(BufReader::new(fd))
    }
    /// Reads observations from any buffered reader.
    /// Malformed lines are logged and skipped.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, Error> {
        let mut s = Self::default();
        let mut lines = lossy_lines(reader);

        if !skip_header(&mut lines)? {
            warn!("observation: header never terminated");
            return Ok(s);
        }

        let mut epoch = Option::<Epoch>::None;

        for line in lines {
            let line = line?;
            if line.starts_with('>') {
                let content = line.get(2..29).unwrap_or_else(|| line.get(2..).unwrap_or(""));
                epoch = match parse_observation_epoch(content) {
                    Ok(t) => Some(t),
                    Err(e) => {
                        warn!("observation: bad epoch \"{}\": {}", content.trim(), e);
                        None
                    },
                };
                continue;
            }
            if line.trim().is_empty() {
                continue;
            }
            let result = epoch
                .ok_or(ParsingError::MissingEpoch)
                .and_then(|t| parse_observation_line(t, &line));
            match result {
                Ok(record) => {
                    s.records.push(record);
                    s.report.loaded += 1;
                },
                Err(e) => {
                    warn!("observation: skipping \"{}\": {}", line.trim(), e);
                    s.report.skipped += 1;
                },
            }
        }

        debug!(
            "observation: {} records, {} skipped",
            s.report.loaded, s.report.skipped
        );
        Ok(s)
    }
    /// Returns all observations, in file order
    pub fn records(&self) -> &[ObservationRecord] {
        &self.records
    }
    /// Returns the [ParseReport]
    pub fn report(&self) -> ParseReport {
        self.report
    }
}

impl FromStr for ObservationReader {
    type Err = Error;
    fn from_str(content: &str) -> Result<Self, Self::Err> {
        Self::from_reader(content.as_bytes())
    }
}
