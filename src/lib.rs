#![doc = include_str!("../README.md")]
#![cfg_attr(docrs, feature(doc_cfg))]

extern crate gnss_rs as gnss;

// private modules
mod archive;
mod cfg;
mod clock;
mod ephemerides;
mod interp;
mod kepler;
mod observation;
mod orbit;
mod reader;
mod selection;
mod solver;

pub mod time;

// pub export
pub use solver::Error;

#[cfg(test)]
mod tests;

// prelude
pub mod prelude {
    pub use crate::archive::{EphemerisArchive, ParseReport};
    pub use crate::cfg::{Config, ObservationFallback, Strategy};
    pub use crate::clock::Clock;
    pub use crate::ephemerides::{EphemerisRecord, OrbitalParameterSet, ParsingError};
    pub use crate::interp::ParameterInterpolator;
    pub use crate::kepler::{EccentricAnomaly, Keplerian, Perturbations};
    pub use crate::observation::{EpochKey, Measurement, ObservationIndex, ObservationRecord};
    pub use crate::orbit::{OrbitPropagator, SatellitePosition};
    pub use crate::reader::{NavigationReader, ObservationReader, RawBlock};
    pub use crate::selection::{EpochSelector, Selection};
    pub use crate::solver::{SatelliteState, Solver, Source};
    // re-export
    pub use gnss::prelude::{Constellation, SV};
    pub use hifitime::{Duration, Epoch, TimeScale, Unit};
    pub use nalgebra::Vector3;
}
