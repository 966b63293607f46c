use log::{debug, trace, warn};

use crate::{
    ephemerides::OrbitalParameterSet,
    kepler::solve_kepler,
    prelude::{Epoch, Vector3},
    solver::Error,
    time::{seconds_of_week, wrap_week_crossover},
};

/// Satellite position, in ECEF
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SatellitePosition {
    /// Instant of this position [s of GPS week]
    pub t_sow: f64,
    /// ECEF coordinates [m]
    pub position: Vector3<f64>,
    /// False when Kepler's equation did not converge.
    /// The position is then derived from the last iterate.
    pub converged: bool,
}

/// GPS broadcast orbit propagator (IS-GPS-200 user algorithm)
#[derive(Debug, Default, Clone, Copy)]
pub struct OrbitPropagator {}

impl OrbitPropagator {
    /// Earth mass * Gravitationnal field constant [m^3/s^2], GPS value
    pub const MU: f64 = 3.986005E14_f64;
    /// Earth rotation rate in WGS84 frame [rad/s]
    pub const OMEGA_E: f64 = 7.2921151467E-5;

    /// Computes the satellite position at t [s of GPS week]
    /// from one set of broadcast parameters.
    pub fn compute_position(
        &self,
        params: &OrbitalParameterSet,
        t_sow: f64,
    ) -> Result<SatellitePosition, Error> {
        if let Some(field) = params.first_non_finite() {
            return Err(Error::InvalidParameters(field));
        }
        if !t_sow.is_finite() {
            return Err(Error::InvalidParameters("t_sow"));
        }

        let keplerian = params.keplerian();
        let perturbations = params.perturbations();

        let t_k = wrap_week_crossover(t_sow - keplerian.toe);

        let n0 = (Self::MU / keplerian.a.powi(3)).sqrt();
        let n = n0 + perturbations.dn;
        let m_k = keplerian.m_0 + n * t_k;

        let anomaly = solve_kepler(m_k, keplerian.e);
        if !anomaly.converged {
            if anomaly.is_accurate() {
                debug!(
                    "kepler: step criterion not met (e={}, M={}), residual {:e}",
                    keplerian.e, m_k, anomaly.residual
                );
            } else {
                warn!(
                    "kepler: no convergence after {} iterations (e={}, M={}), residual {:e}",
                    anomaly.iterations, keplerian.e, m_k, anomaly.residual
                );
            }
        }
        let e_k = anomaly.e_k;

        let nu_k =
            ((1.0 - keplerian.e.powi(2)).sqrt() * e_k.sin()).atan2(e_k.cos() - keplerian.e);
        let phi_k = nu_k + keplerian.omega;

        let (sin_2phi, cos_2phi) = (2.0 * phi_k).sin_cos();

        let du_k = perturbations.cus * sin_2phi + perturbations.cuc * cos_2phi;
        let dr_k = perturbations.crs * sin_2phi + perturbations.crc * cos_2phi;
        let di_k = perturbations.cis * sin_2phi + perturbations.cic * cos_2phi;

        let u_k = phi_k + du_k;
        let r_k = keplerian.a * (1.0 - keplerian.e * e_k.cos()) + dr_k;
        let i_k = keplerian.i_0 + di_k + perturbations.i_dot * t_k;

        let omega_k = keplerian.omega_0 + (perturbations.omega_dot - Self::OMEGA_E) * t_k
            - Self::OMEGA_E * keplerian.toe;

        let xp_k = r_k * u_k.cos();
        let yp_k = r_k * u_k.sin();

        let x_k = xp_k * omega_k.cos() - yp_k * i_k.cos() * omega_k.sin();
        let y_k = xp_k * omega_k.sin() + yp_k * i_k.cos() * omega_k.cos();
        let z_k = yp_k * i_k.sin();

        let position = Vector3::new(x_k, y_k, z_k);
        if position.iter().any(|coord| !coord.is_finite()) {
            return Err(Error::InvalidParameters("position"));
        }

        trace!("t_sow={} (dt={}) - ecef {:?}", t_sow, t_k, position);

        Ok(SatellitePosition {
            t_sow,
            position,
            converged: anomaly.converged,
        })
    }
    /// Computes the satellite position at this calendar [Epoch],
    /// in any timescale.
    pub fn position_at(
        &self,
        params: &OrbitalParameterSet,
        t: Epoch,
    ) -> Result<SatellitePosition, Error> {
        self.compute_position(params, seconds_of_week(t))
    }
}
