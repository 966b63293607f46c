#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximal number of fixed point iterations when solving Kepler's equation
pub const KEPLER_MAX_ITERATIONS: usize = 8;

/// Convergence criterion on the eccentric anomaly [rad]
pub const KEPLER_TOLERANCE: f64 = 1.0E-12;

/// Keplerian parameters
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Keplerian {
    /// Semi major axis (m)
    pub a: f64,
    /// Eccentricity (n.a)
    pub e: f64,
    /// Inclination angle at reference time (rad)
    pub i_0: f64,
    /// Longitude of ascending node at weekly epoch (rad)
    pub omega_0: f64,
    /// Mean anomaly at reference time (rad)
    pub m_0: f64,
    /// Argument of perigee (rad)
    pub omega: f64,
    /// Time of ephemeris, in seconds of GPS week
    pub toe: f64,
}

/// Keplerian perturbations
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Perturbations {
    /// Mean motion difference from computed value [rad.s-1]
    pub dn: f64,
    /// Inclination rate of change [rad.s-1]
    pub i_dot: f64,
    /// Right ascension rate of change [rad.s^-1]
    pub omega_dot: f64,
    /// Amplitude of sine harmonic correction term of the argument
    /// of latitude [rad]
    pub cus: f64,
    /// Amplitude of cosine harmonic correction term of the argument
    /// of latitude [rad]
    pub cuc: f64,
    /// Amplitude of sine harmonic correction term of the angle of inclination [rad]
    pub cis: f64,
    /// Amplitude of cosine harmonic correction term of the angle of inclination [rad]
    pub cic: f64,
    /// Amplitude of sine harmonic correction term of the orbit radius [m]
    pub crs: f64,
    /// Amplitude of cosine harmonic correction term of the orbit radius [m]
    pub crc: f64,
}

/// Eccentric anomaly, as solved from Kepler's equation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EccentricAnomaly {
    /// Last iterate [rad]
    pub e_k: f64,
    /// Number of iterations performed
    pub iterations: usize,
    /// False when the step between two iterates did not drop below
    /// [KEPLER_TOLERANCE] within [KEPLER_MAX_ITERATIONS]. Around e = 0.05
    /// this happens while the last iterate already solves the equation
    /// to the tolerance: see [EccentricAnomaly::residual].
    pub converged: bool,
    /// |E - e.sin(E) - M| for the last iterate [rad]
    pub residual: f64,
}

impl EccentricAnomaly {
    /// True when the last iterate satisfies Kepler's equation
    /// within [KEPLER_TOLERANCE], whether or not the step criterion triggered.
    pub fn is_accurate(&self) -> bool {
        self.residual < KEPLER_TOLERANCE
    }
}

/// Solves `E = M + e.sin(E)` by fixed point iteration, starting from `E = M`.
/// Iteration stops on [KEPLER_TOLERANCE] or after [KEPLER_MAX_ITERATIONS],
/// whichever comes first.
pub fn solve_kepler(m_k: f64, e: f64) -> EccentricAnomaly {
    let mut e_k = m_k;
    for iteration in 1..=KEPLER_MAX_ITERATIONS {
        let next = m_k + e * e_k.sin();
        let delta = (next - e_k).abs();
        e_k = next;
        if delta < KEPLER_TOLERANCE {
            return EccentricAnomaly {
                e_k,
                iterations: iteration,
                converged: true,
                residual: (e_k - e * e_k.sin() - m_k).abs(),
            };
        }
    }
    EccentricAnomaly {
        e_k,
        iterations: KEPLER_MAX_ITERATIONS,
        converged: false,
        residual: (e_k - e * e_k.sin() - m_k).abs(),
    }
}
