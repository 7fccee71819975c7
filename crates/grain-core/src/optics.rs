// ─────────────────────────────────────────────────────────────────────
// SCPN Grain Core — Grain Optics
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Optical data supplied by the host: grain cross-sections on the photon
//! mesh and subshell photo-ionization cross-sections of grain constituents.

use grain_types::constants::{LIMELM, RYD_INF};
use grain_types::error::{GrainError, GrainResult};
use grain_types::state::EnergyMesh;
use ndarray::Array1;
use std::f64::consts::PI;

/// Cross-sections per H nucleus at standard depletion [cm^2].
#[derive(Debug, Clone)]
pub struct GrainOptics {
    pub abs_cs: Array1<f64>,
    pub scat_cs: Array1<f64>,
    /// Asymmetry factor ⟨cos θ⟩ of scattering.
    pub asym: Array1<f64>,
    /// Inverse photon attenuation length in the bulk material [cm^-1]
    pub inv_att_len: Array1<f64>,
}

impl GrainOptics {
    pub fn new(
        abs_cs: Array1<f64>,
        scat_cs: Array1<f64>,
        asym: Array1<f64>,
        inv_att_len: Array1<f64>,
    ) -> GrainResult<Self> {
        let n = abs_cs.len();
        if scat_cs.len() != n || asym.len() != n || inv_att_len.len() != n {
            return Err(GrainError::ConfigError(format!(
                "optics arrays differ in length: abs {n}, scat {}, asym {}, inv_att_len {}",
                scat_cs.len(),
                asym.len(),
                inv_att_len.len()
            )));
        }
        if abs_cs.iter().chain(scat_cs.iter()).any(|&x| !x.is_finite() || x < 0.0) {
            return Err(GrainError::ConfigError(
                "grain cross-sections must be finite and >= 0".to_string(),
            ));
        }
        if asym.iter().any(|&g| !(-1.0..=1.0).contains(&g)) {
            return Err(GrainError::ConfigError(
                "asymmetry factor must lie in [-1, 1]".to_string(),
            ));
        }
        if inv_att_len.iter().any(|&x| !x.is_finite() || x <= 0.0) {
            return Err(GrainError::ConfigError(
                "inverse attenuation length must be finite and > 0".to_string(),
            ));
        }
        Ok(GrainOptics {
            abs_cs,
            scat_cs,
            asym,
            inv_att_len,
        })
    }

    /// Gray-body optics of a sphere of radius `radius` [cm]: absorption
    /// efficiency x/(1+x) and Rayleigh-limited scattering in the size
    /// parameter x = 2πa/λ.
    pub fn analytic(mesh: &EnergyMesh, radius: f64, grains_per_h: f64) -> GrainResult<Self> {
        if !(radius > 0.0 && radius.is_finite() && grains_per_h > 0.0 && grains_per_h.is_finite())
        {
            return Err(GrainError::ConfigError(format!(
                "analytic optics need a > 0 and grains_per_h > 0, got {radius}, {grains_per_h}"
            )));
        }
        let geometric = PI * radius * radius * grains_per_h;
        let x = mesh.anu.mapv(|e| 2.0 * PI * radius * e * RYD_INF);
        let q_abs = x.mapv(|x| x / (1.0 + x));
        let q_sca = x.mapv(|x| {
            let x4 = x.powi(4);
            x4 / (1.0 + x4)
        });
        let asym = x.mapv(|x| 1.0 - 0.5 * x * x / (1.0 + x * x));
        let inv_att_len = q_abs.mapv(|q| 3.0 * q / (4.0 * radius));
        GrainOptics::new(
            q_abs * geometric,
            q_sca * geometric,
            asym,
            inv_att_len,
        )
    }

    pub fn len(&self) -> usize {
        self.abs_cs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.abs_cs.is_empty()
    }

    /// Momentum-transfer cross-section σ_abs + (1 − g) σ_sca of cell `i`.
    pub fn pressure_cs(&self, i: usize) -> f64 {
        self.abs_cs[i] + self.effective_scattering(i)
    }

    /// Scattering cross-section weighted by (1 − g).
    pub fn effective_scattering(&self, i: usize) -> f64 {
        self.scat_cs[i] * (1.0 - self.asym[i])
    }
}

/// Subshell photo-ionization cross-sections [Mb] of the grain constituents,
/// innermost shell first, on the photon mesh.
#[derive(Debug, Clone)]
pub struct ElementCrossSections {
    shells: Vec<Vec<Array1<f64>>>,
    n_cells: usize,
}

impl ElementCrossSections {
    pub fn new(n_cells: usize) -> Self {
        ElementCrossSections {
            shells: vec![Vec::new(); LIMELM],
            n_cells,
        }
    }

    pub fn insert(&mut self, element: usize, shells: Vec<Array1<f64>>) -> GrainResult<()> {
        if element >= LIMELM {
            return Err(GrainError::ConfigError(format!(
                "element index {element} out of range"
            )));
        }
        if let Some(bad) = shells.iter().find(|s| s.len() != self.n_cells) {
            return Err(GrainError::ConfigError(format!(
                "element {element}: shell cross-sections have {} cells, mesh has {}",
                bad.len(),
                self.n_cells
            )));
        }
        if shells.iter().flatten().any(|&x| !x.is_finite() || x < 0.0) {
            return Err(GrainError::ConfigError(format!(
                "element {element}: cross-sections must be finite and >= 0"
            )));
        }
        self.shells[element] = shells;
        Ok(())
    }

    /// Hydrogenic σ0 (E/E_th)^-3 shells above the given thresholds [Ryd].
    pub fn insert_kramers(
        &mut self,
        mesh: &EnergyMesh,
        element: usize,
        thresholds: &[f64],
        sigma0_mb: f64,
    ) -> GrainResult<()> {
        let shells = thresholds
            .iter()
            .map(|&eth| {
                mesh.anu
                    .mapv(|e| if e >= eth { sigma0_mb * (eth / e).powi(3) } else { 0.0 })
            })
            .collect();
        self.insert(element, shells)
    }

    /// Shells of `element`, empty when no data were supplied.
    pub fn shells(&self, element: usize) -> &[Array1<f64>] {
        self.shells.get(element).map_or(&[], Vec::as_slice)
    }
}
