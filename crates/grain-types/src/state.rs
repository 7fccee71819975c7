// ─────────────────────────────────────────────────────────────────────
// SCPN Grain Core — State
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Host-facing data: photon energy mesh, radiation field, gas state and
//! per-bin equilibrium results.

use crate::constants::{BOLTZMANN, EN1RYD, FR1RYD, SPEEDLIGHT};
use crate::error::{GrainError, GrainResult};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Photon energy mesh: cell centres and widths [Ryd].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnergyMesh {
    pub anu: Array1<f64>,
    pub widflx: Array1<f64>,
}

impl EnergyMesh {
    pub fn new(anu: Array1<f64>, widflx: Array1<f64>) -> GrainResult<Self> {
        if anu.len() < 2 || anu.len() != widflx.len() {
            return Err(GrainError::ConfigError(format!(
                "energy mesh needs >= 2 cells with matching widths, got {} centres and {} widths",
                anu.len(),
                widflx.len()
            )));
        }
        if anu.iter().chain(widflx.iter()).any(|&x| !x.is_finite() || x <= 0.0) {
            return Err(GrainError::ConfigError(
                "energy mesh values must be finite and > 0".to_string(),
            ));
        }
        if anu.windows(2).into_iter().any(|w| w[1] <= w[0]) {
            return Err(GrainError::ConfigError(
                "energy mesh must be strictly increasing".to_string(),
            ));
        }
        Ok(EnergyMesh { anu, widflx })
    }

    /// Logarithmically spaced mesh from `e_min` to `e_max` [Ryd].
    pub fn geometric(e_min: f64, e_max: f64, n: usize) -> GrainResult<Self> {
        if !(e_min > 0.0 && e_max > e_min && e_max.is_finite()) || n < 2 {
            return Err(GrainError::ConfigError(format!(
                "geometric mesh needs 0 < e_min < e_max and n >= 2, got {e_min}, {e_max}, {n}"
            )));
        }
        let ratio = (e_max / e_min).powf(1.0 / n as f64);
        let edges: Vec<f64> = (0..=n).map(|i| e_min * ratio.powi(i as i32)).collect();
        let anu = Array1::from_iter(edges.windows(2).map(|w| (w[0] * w[1]).sqrt()));
        let widflx = Array1::from_iter(edges.windows(2).map(|w| w[1] - w[0]));
        EnergyMesh::new(anu, widflx)
    }

    pub fn len(&self) -> usize {
        self.anu.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anu.is_empty()
    }
}

/// Photon flux per mesh cell [photons cm^-2 s^-1].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RadiationField {
    /// Attenuated incident continuum.
    pub direct: Array1<f64>,
    /// Diffuse and scattered continuum.
    pub diffuse: Array1<f64>,
}

impl RadiationField {
    pub fn new(direct: Array1<f64>, diffuse: Array1<f64>) -> GrainResult<Self> {
        if direct.len() != diffuse.len() {
            return Err(GrainError::ConfigError(format!(
                "direct ({}) and diffuse ({}) fields differ in length",
                direct.len(),
                diffuse.len()
            )));
        }
        if direct.iter().chain(diffuse.iter()).any(|&x| !x.is_finite() || x < 0.0) {
            return Err(GrainError::ConfigError(
                "radiation field must be finite and >= 0".to_string(),
            ));
        }
        Ok(RadiationField { direct, diffuse })
    }

    pub fn dark(n: usize) -> Self {
        RadiationField {
            direct: Array1::zeros(n),
            diffuse: Array1::zeros(n),
        }
    }

    /// Diluted blackbody carried entirely in the direct component.
    pub fn diluted_blackbody(mesh: &EnergyMesh, temperature: f64, dilution: f64) -> Self {
        let direct = Array1::from_iter(mesh.anu.iter().zip(mesh.widflx.iter()).map(|(&e, &w)| {
            let x = e * EN1RYD / (BOLTZMANN * temperature);
            let nu = e * FR1RYD;
            if x > 700.0 {
                0.0
            } else {
                // π B_ν / (h ν) integrated over the cell
                dilution * 2.0 * PI * nu * nu / (SPEEDLIGHT * SPEEDLIGHT) / x.exp_m1()
                    * w
                    * FR1RYD
            }
        }));
        RadiationField {
            diffuse: Array1::zeros(direct.len()),
            direct,
        }
    }

    pub fn len(&self) -> usize {
        self.direct.len()
    }

    pub fn is_empty(&self) -> bool {
        self.direct.is_empty()
    }

    /// Total flux in cell `i`.
    pub fn summed(&self, i: usize) -> f64 {
        self.direct[i] + self.diffuse[i]
    }
}

/// Gas-phase element data needed for ion collisions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element {
    /// Element index, 0 = hydrogen; the element has `index + 2` ion stages.
    pub index: usize,
    /// Atomic weight [amu]
    pub atomic_weight: f64,
    /// `ionization_potentials[k]` ionizes stage k to k + 1 [Ryd]
    pub ionization_potentials: Vec<f64>,
}

impl Element {
    pub fn new(index: usize, atomic_weight: f64, ionization_potentials: Vec<f64>) -> GrainResult<Self> {
        let element = Element {
            index,
            atomic_weight,
            ionization_potentials,
        };
        element.validate()?;
        Ok(element)
    }

    /// Checks fields that may have bypassed [`Element::new`], e.g. when
    /// deserialized.
    pub fn validate(&self) -> GrainResult<()> {
        let index = self.index;
        if self.ionization_potentials.len() != index + 1 {
            return Err(GrainError::ConfigError(format!(
                "element {index} needs {} ionization potentials, got {}",
                index + 1,
                self.ionization_potentials.len()
            )));
        }
        if !self.atomic_weight.is_finite() || self.atomic_weight <= 0.0 {
            return Err(GrainError::ConfigError(format!(
                "element {index}: atomic weight must be finite and > 0, got {}",
                self.atomic_weight
            )));
        }
        Ok(())
    }

    /// Highest ion stage (fully stripped).
    pub fn max_stage(&self) -> usize {
        self.index + 1
    }
}

/// Local gas conditions of one zone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GasState {
    /// Electron temperature [K]
    pub temperature: f64,
    /// Electron density [cm^-3]
    pub eden: f64,
    /// Total hydrogen density [cm^-3]
    pub hden: f64,
    #[serde(default)]
    pub h2_density: f64,
    #[serde(default)]
    pub co_density: f64,
    /// Total gas cooling [erg cm^-3 s^-1]
    pub total_cooling: f64,
    /// Ion densities [cm^-3], `ion_densities[e][stage]`, parallel to the element list.
    pub ion_densities: Vec<Vec<f64>>,
}

impl GasState {
    pub fn validate(&self, elements: &[Element]) -> GrainResult<()> {
        for (name, value) in [
            ("temperature", self.temperature),
            ("hden", self.hden),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(GrainError::ConfigError(format!(
                    "gas {name} must be finite and > 0, got {value}"
                )));
            }
        }
        for (name, value) in [
            ("eden", self.eden),
            ("h2_density", self.h2_density),
            ("co_density", self.co_density),
            ("total_cooling", self.total_cooling),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(GrainError::ConfigError(format!(
                    "gas {name} must be finite and >= 0, got {value}"
                )));
            }
        }
        if self.ion_densities.len() != elements.len() {
            return Err(GrainError::ConfigError(format!(
                "ion densities given for {} elements, expected {}",
                self.ion_densities.len(),
                elements.len()
            )));
        }
        for (element, densities) in elements.iter().zip(&self.ion_densities) {
            element.validate()?;
            if densities.len() != element.max_stage() + 1 {
                return Err(GrainError::ConfigError(format!(
                    "element {} needs {} ion densities, got {}",
                    element.index,
                    element.max_stage() + 1,
                    densities.len()
                )));
            }
            if densities.iter().any(|&x| !x.is_finite() || x < 0.0) {
                return Err(GrainError::ConfigError(format!(
                    "element {} has a negative or non-finite ion density",
                    element.index
                )));
            }
        }
        Ok(())
    }

    /// Density of `stage` of the element with index `element`, 0 if absent.
    pub fn ion_density(&self, elements: &[Element], element: usize, stage: usize) -> f64 {
        elements
            .iter()
            .position(|e| e.index == element)
            .and_then(|k| self.ion_densities[k].get(stage).copied())
            .unwrap_or(0.0)
    }
}

/// Converged state of one bin in one zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquilibriumResult {
    pub mean_charge: f64,
    /// Lowest charge of the final population window.
    pub charge_low: i64,
    pub populations: Vec<f64>,
    /// Grain temperature [K]
    pub temperature: f64,
    /// Grain potential [Ryd]
    pub potential: f64,
    /// Net radiative heating of the grains [erg cm^-3 s^-1]
    pub grain_heat: f64,
    /// Collisional heating of the grains [erg cm^-3 s^-1]
    pub collisional_heat: f64,
    /// Gas cooling by grain collisions [erg cm^-3 s^-1]
    pub gas_cooling: f64,
    pub photoelectric_heating: f64,
    pub thermionic_heating: f64,
    /// Chemical energy released by recombination on the surface [erg cm^-3 s^-1]
    pub chemical_heat: f64,
    /// Electrons contributed to the gas [cm^-3]
    pub electron_density: f64,
    pub thermionic_ratio: f64,
    pub outer_iterations: usize,
    pub converged: bool,
}

/// Ion stage changes due to collisions with grains [s^-1],
/// one `(from, to)` matrix per element in element-list order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargeTransferMatrix {
    pub rates: Vec<Array2<f64>>,
}

impl ChargeTransferMatrix {
    pub fn zeros(elements: &[Element]) -> Self {
        ChargeTransferMatrix {
            rates: elements
                .iter()
                .map(|e| Array2::zeros((e.max_stage() + 1, e.max_stage() + 1)))
                .collect(),
        }
    }

    pub fn accumulate(&mut self, other: &ChargeTransferMatrix) {
        for (mine, theirs) in self.rates.iter_mut().zip(&other.rates) {
            *mine += theirs;
        }
    }

    /// Total rate out of `stage` of element `k`, excluding the diagonal.
    pub fn loss_rate(&self, k: usize, stage: usize) -> f64 {
        let m = &self.rates[k];
        (0..m.ncols())
            .filter(|&to| to != stage)
            .map(|to| m[[stage, to]])
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hydrogen() -> Element {
        Element::new(0, 1.00794, vec![1.0]).unwrap()
    }

    #[test]
    fn test_geometric_mesh_is_increasing() {
        let mesh = EnergyMesh::geometric(1.0e-5, 1.0e4, 300).unwrap();
        assert_eq!(mesh.len(), 300);
        assert!(mesh.anu[0] > 1.0e-5 && mesh.anu[299] < 1.0e4);
        let total: f64 = mesh.widflx.sum();
        assert!((total - (1.0e4 - 1.0e-5)).abs() / 1.0e4 < 1e-10);
    }

    #[test]
    fn test_mesh_rejects_unsorted() {
        let anu = Array1::from_vec(vec![1.0, 0.5]);
        let wid = Array1::from_vec(vec![0.1, 0.1]);
        assert!(EnergyMesh::new(anu, wid).is_err());
    }

    #[test]
    fn test_field_length_mismatch() {
        assert!(RadiationField::new(Array1::zeros(3), Array1::zeros(4)).is_err());
        assert!(RadiationField::new(Array1::from_elem(3, -1.0), Array1::zeros(3)).is_err());
    }

    #[test]
    fn test_blackbody_peaks_near_wien() {
        let mesh = EnergyMesh::geometric(1.0e-4, 10.0, 400).unwrap();
        let field = RadiationField::diluted_blackbody(&mesh, 5.0e4, 1.0e-14);
        let per_ryd: Vec<f64> = (0..mesh.len())
            .map(|i| field.direct[i] / mesh.widflx[i])
            .collect();
        let imax = per_ryd
            .iter()
            .enumerate()
            .fold(0, |best, (i, &v)| if v > per_ryd[best] { i } else { best });
        // photon number spectrum peaks at h nu = 1.59 kT
        let expected = 1.59 * BOLTZMANN * 5.0e4 / EN1RYD;
        assert!((mesh.anu[imax] / expected - 1.0).abs() < 0.1);
    }

    #[test]
    fn test_gas_validation_checks_stage_count() {
        let elements = vec![hydrogen()];
        let mut gas = GasState {
            temperature: 1.0e4,
            eden: 1.0,
            hden: 1.0,
            h2_density: 0.0,
            co_density: 0.0,
            total_cooling: 1.0e-24,
            ion_densities: vec![vec![0.5, 0.5]],
        };
        assert!(gas.validate(&elements).is_ok());
        assert!((gas.ion_density(&elements, 0, 1) - 0.5).abs() < 1e-15);
        assert_eq!(gas.ion_density(&elements, 1, 0), 0.0);
        gas.ion_densities = vec![vec![1.0]];
        assert!(gas.validate(&elements).is_err());
    }

    #[test]
    fn test_gas_validation_rechecks_deserialized_elements() {
        let helium: Element = serde_json::from_str(
            r#"{"index": 1, "atomic_weight": 4.0026, "ionization_potentials": [1.81]}"#,
        )
        .unwrap();
        assert!(helium.validate().is_err());
        let gas = GasState {
            temperature: 1.0e4,
            eden: 1.0,
            hden: 1.0,
            h2_density: 0.0,
            co_density: 0.0,
            total_cooling: 1.0e-24,
            ion_densities: vec![vec![0.5, 0.5], vec![0.1, 0.0, 0.0]],
        };
        let elements = vec![hydrogen(), helium];
        assert!(matches!(gas.validate(&elements), Err(GrainError::ConfigError(_))));
    }

    #[test]
    fn test_charge_transfer_loss_rate() {
        let elements = vec![hydrogen()];
        let mut m = ChargeTransferMatrix::zeros(&elements);
        m.rates[0][[1, 0]] = 2.0;
        m.rates[0][[1, 1]] = 5.0;
        let other = m.clone();
        m.accumulate(&other);
        assert!((m.loss_rate(0, 1) - 4.0).abs() < 1e-15);
        assert_eq!(m.loss_rate(0, 0), 0.0);
    }
}
