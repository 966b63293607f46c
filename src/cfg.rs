//! Engine configuration
#[cfg(feature = "serde")]
use serde::Deserialize;

/// Ephemeris selection strategy
#[derive(Default, Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub enum Strategy {
    /// Select the two records surrounding the target epoch
    /// and interpolate the parameters linearly.
    #[default]
    Bracket,
    /// Select the closest record, as long as it is within
    /// [Config::nearest_max_distance].
    Nearest,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Bracket => write!(f, "bracket"),
            Self::Nearest => write!(f, "nearest"),
        }
    }
}

/// Observation lookup policy, when the exact epoch is not indexed
#[derive(Default, Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub enum ObservationFallback {
    /// Nearest indexed epoch, whatever the satellites it contains.
    /// The measurement may be missing there even though the satellite
    /// was observed at another, slightly farther, epoch.
    #[default]
    GlobalNearest,
    /// Nearest epoch at which the satellite was observed
    PerSatelliteNearest,
}

fn default_nearest_max_distance() -> f64 {
    3600.0
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Ephemeris selection [Strategy]
    pub strategy: Strategy,
    /// Maximal distance between target epoch and selected record
    /// with [Strategy::Nearest], in seconds.
    pub nearest_max_distance: f64,
    /// [ObservationFallback] policy
    pub fallback: ObservationFallback,
    /// Refuse to propagate records whose broadcast health is not nominal
    pub reject_unhealthy: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            nearest_max_distance: default_nearest_max_distance(),
            fallback: ObservationFallback::default(),
            reject_unhealthy: false,
        }
    }
}

impl Config {
    /// Returns Self with desired selection [Strategy]
    pub fn with_strategy(&self, strategy: Strategy) -> Self {
        let mut s = self.clone();
        s.strategy = strategy;
        s
    }
    /// Returns Self with desired maximal distance [s]
    /// for the nearest selection
    pub fn with_nearest_max_distance(&self, seconds: f64) -> Self {
        let mut s = self.clone();
        s.nearest_max_distance = seconds;
        s
    }
    /// Returns Self with desired [ObservationFallback]
    pub fn with_fallback(&self, fallback: ObservationFallback) -> Self {
        let mut s = self.clone();
        s.fallback = fallback;
        s
    }
    /// Returns Self rejecting unhealthy vehicles
    pub fn rejecting_unhealthy(&self) -> Self {
        let mut s = self.clone();
        s.reject_unhealthy = true;
        s
    }
}
