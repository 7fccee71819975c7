// ─────────────────────────────────────────────────────────────────────
// SCPN Grain Core — Emissivity Table
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Thermal emission of one bin as a function of grain temperature.
//!
//! The grid is geometric from `t_min` to `t_mid` and progressively coarser
//! above. Both directions of the relation are kept as monotone splines in
//! log-log space so that heating inverts to temperature without overshoot.

use crate::optics::GrainOptics;
use grain_math::spline::MonotoneSpline;
use grain_types::config::EmissivityGridConfig;
use grain_types::constants::{FR1RYD, HPLANCK, SPEEDLIGHT, TE1RYD};
use grain_types::error::{GrainError, GrainResult};
use grain_types::state::EnergyMesh;
use std::f64::consts::PI;

#[derive(Debug, Clone)]
pub struct EmissivityTable {
    temperatures: Vec<f64>,
    /// ln of the emitted power per H at standard depletion [erg s^-1].
    ln_emission: Vec<f64>,
    to_temperature: MonotoneSpline,
    to_emission: MonotoneSpline,
}

impl EmissivityTable {
    pub fn new(
        grid: &EmissivityGridConfig,
        mesh: &EnergyMesh,
        optics: &GrainOptics,
    ) -> GrainResult<Self> {
        grid.validate()?;
        if optics.len() != mesh.len() {
            return Err(GrainError::InvariantViolation(format!(
                "optics cover {} cells, mesh has {}",
                optics.len(),
                mesh.len()
            )));
        }
        let temperatures = temperature_grid(grid);
        let ln_emission = temperatures
            .iter()
            .map(|&t| planck_integral(mesh, optics, t).map(f64::ln))
            .collect::<GrainResult<Vec<f64>>>()?;
        let ln_t: Vec<f64> = temperatures.iter().map(|t| t.ln()).collect();
        let to_temperature = MonotoneSpline::new(&ln_emission, &ln_t)?;
        let to_emission = MonotoneSpline::new(&ln_t, &ln_emission)?;
        Ok(EmissivityTable {
            temperatures,
            ln_emission,
            to_temperature,
            to_emission,
        })
    }

    pub fn temperatures(&self) -> &[f64] {
        &self.temperatures
    }

    pub fn len(&self) -> usize {
        self.temperatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.temperatures.is_empty()
    }

    pub fn t_min(&self) -> f64 {
        self.temperatures[0]
    }

    pub fn t_max(&self) -> f64 {
        self.temperatures[self.temperatures.len() - 1]
    }

    /// Emission [erg s^-1 per H] at grid point `i`.
    pub fn emission(&self, i: usize) -> f64 {
        self.ln_emission[i].exp()
    }

    /// Temperature in radiative balance with `heat` [erg s^-1 per H].
    /// `None` when the heating is not positive.
    pub fn temperature_for(&self, heat: f64) -> Option<f64> {
        if !(heat > 0.0) {
            return None;
        }
        let x = heat.max(f64::MIN_POSITIVE).ln();
        Some(self.to_temperature.eval(x).exp())
    }

    /// Emission [erg s^-1 per H] at temperature `t`.
    pub fn emission_at(&self, t: f64) -> f64 {
        self.to_emission.eval(t.ln()).exp()
    }
}

/// Fine geometric steps up to `t_mid`, then steps that grow by a constant
/// factor so the last point lands on `t_max`.
fn temperature_grid(grid: &EmissivityGridConfig) -> Vec<f64> {
    let n = grid.n_points;
    let n_top = grid.n_top();
    let n_fine = n - n_top;
    let mut fac = ((grid.t_mid / grid.t_min).ln() / n_fine as f64).exp();
    let mut temperatures = Vec::with_capacity(n);
    let mut t = grid.t_min;
    for _ in 0..n_fine {
        temperatures.push(t);
        t *= fac;
    }
    // t now equals t_mid
    let steps = ((n_top - 1) * n_top / 2) as f64;
    let fac2 = ((grid.t_max / grid.t_mid / fac.powi(n_top as i32 - 1)).ln() / steps).exp();
    for _ in 0..n_top {
        temperatures.push(t);
        fac *= fac2;
        t *= fac;
    }
    temperatures
}

/// ∫ σ_abs B_ν dν over the mesh [erg s^-1 per H] at temperature `t`.
fn planck_integral(mesh: &EnergyMesh, optics: &GrainOptics, t: f64) -> GrainResult<f64> {
    let norm = 4.0 * PI * 2.0 * HPLANCK / (SPEEDLIGHT * SPEEDLIGHT) * FR1RYD.powi(4);
    let exp_cap = 0.999 * f64::MAX.ln();
    let mut integral1 = 0.0;
    let mut integral2 = 0.0;
    for i in 0..mesh.len() {
        let anu = mesh.anu[i];
        let x = TE1RYD / t * anu;
        let expm1 = if x < 1.0e-5 {
            x * (1.0 + x / 2.0)
        } else {
            x.min(exp_cap).exp() - 1.0
        };
        let p1 = norm * anu.powi(3) / expm1 * mesh.widflx[i];
        let p2 = p1 * optics.abs_cs[i];
        if i == 0 {
            // Rayleigh-Jeans tail below the mesh: B ∝ ν², σ ∝ ν assumed
            integral1 = p1 / mesh.widflx[0] * anu / 3.0;
            integral2 = p2 / mesh.widflx[0] * anu / 5.0;
        }
        if p1 / integral1 < f64::EPSILON && p2 / integral2 < f64::EPSILON {
            break;
        }
        integral1 += p1;
        integral2 += p2;
    }
    if !(integral2 > 0.0) || !integral2.is_finite() {
        return Err(GrainError::InvariantViolation(format!(
            "Planck integral at {t} K must be finite and > 0, got {integral2:e}"
        )));
    }
    Ok(integral2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> EmissivityTable {
        let mesh = EnergyMesh::geometric(1.0e-5, 1.0e3, 300).unwrap();
        let optics = GrainOptics::analytic(&mesh, 1.0e-5, 1.0e-12).unwrap();
        EmissivityTable::new(&EmissivityGridConfig::default(), &mesh, &optics).unwrap()
    }

    #[test]
    fn test_grid_endpoints() {
        let grid = EmissivityGridConfig::default();
        let t = temperature_grid(&grid);
        assert_eq!(t.len(), grid.n_points);
        assert_eq!(t[0], grid.t_min);
        let mid = t[grid.n_points - grid.n_top()];
        assert!((mid / grid.t_mid - 1.0).abs() < 1e-10);
        assert!((t[t.len() - 1] / grid.t_max - 1.0).abs() < 1e-8);
        assert!(t.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_emission_monotone_in_temperature() {
        let table = table();
        for i in 1..table.len() {
            assert!(table.emission(i) > table.emission(i - 1), "point {i}");
        }
    }

    #[test]
    fn test_grid_heating_inverts_exactly() {
        let table = table();
        for i in [0, 37, 120, 199] {
            let t = table.temperatures()[i];
            let back = table.temperature_for(table.emission(i)).unwrap();
            assert!((back / t - 1.0).abs() < 1e-10, "point {i}: {back} vs {t}");
        }
    }

    #[test]
    fn test_nonpositive_heating_has_no_temperature() {
        let table = table();
        assert!(table.temperature_for(0.0).is_none());
        assert!(table.temperature_for(-1.0).is_none());
        assert!(table.temperature_for(f64::NAN).is_none());
    }

    #[test]
    fn test_round_trip_between_nodes() {
        let table = table();
        let t = 37.5;
        let back = table.temperature_for(table.emission_at(t)).unwrap();
        assert!((back / t - 1.0).abs() < 1e-3);
    }
}
