// ─────────────────────────────────────────────────────────────────────
// SCPN Grain Core — Config
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use crate::constants::{
    BRACKET_MAX, CONSERV_TOL, CT_LOOP_MAX, GRAIN_TMAX, GRAIN_TMID, GRAIN_TMIN, NCHRG_DEFAULT,
    NCHU, NDEMS, SEARCH_RELAX, T_LOOP_MAX,
};
use crate::error::{GrainError, GrainResult};
use serde::{Deserialize, Serialize};

/// Top-level grain run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrainRunConfig {
    #[serde(default)]
    pub solver: SolverConfig,
    #[serde(default)]
    pub emissivity: EmissivityGridConfig,
    /// Scale factor applied to all grain abundances (default: 1.0)
    #[serde(default = "default_unity")]
    pub metallicity: f64,
    /// Depth law used by PAH bins under the standard law.
    #[serde(default)]
    pub pah_law: PahAbundanceLaw,
    /// Auger spectra file. When absent, photoemission uses the
    /// valence-band-only yield model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auger_data: Option<String>,
    pub bins: Vec<GrainBinConfig>,
}

/// Tolerances, iteration bounds and physics switches of the equilibrium solve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Energy-conservation tolerance; the joint loop converges at conserv_tol / 10
    #[serde(default = "default_conserv_tol")]
    pub conserv_tol: f64,
    #[serde(default = "default_bracket_max")]
    pub bracket_max: usize,
    #[serde(default = "default_ct_loop_max")]
    pub ct_loop_max: usize,
    #[serde(default = "default_t_loop_max")]
    pub t_loop_max: usize,
    /// Iteration bound multiplier while the host is still searching for the
    /// first zone solution.
    #[serde(default = "default_search_relax")]
    pub search_relax: usize,
    /// Allowed relative error of the gas heating/cooling balance (default: 0.005)
    #[serde(default = "default_heat_cool_error")]
    pub heat_cool_rel_error: f64,
    /// Allowed relative error of the electron density (default: 0.01)
    #[serde(default = "default_eden_error")]
    pub eden_rel_error: f64,
    /// Continue with the best estimate when the temperature or the joint
    /// loop fails to converge.
    #[serde(default)]
    pub soft_failure: bool,
    /// Fixed grain temperature [K] replacing the radiative balance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constant_temperature: Option<f64>,
    #[serde(default = "default_true")]
    pub photoelectric_heating: bool,
    #[serde(default = "default_unity")]
    pub photoelectric_heating_scale: f64,
    /// Collisional heat exchange between grains and gas.
    #[serde(default = "default_true")]
    pub collisional_exchange: bool,
    /// Ion recombination on grain surfaces.
    #[serde(default = "default_true")]
    pub ion_recombination: bool,
    #[serde(default = "default_true")]
    pub charge_transfer: bool,
}

fn default_conserv_tol() -> f64 {
    CONSERV_TOL
}
fn default_bracket_max() -> usize {
    BRACKET_MAX
}
fn default_ct_loop_max() -> usize {
    CT_LOOP_MAX
}
fn default_t_loop_max() -> usize {
    T_LOOP_MAX
}
fn default_search_relax() -> usize {
    SEARCH_RELAX
}
fn default_heat_cool_error() -> f64 {
    0.005
}
fn default_eden_error() -> f64 {
    0.01
}
fn default_true() -> bool {
    true
}
fn default_unity() -> f64 {
    1.0
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            conserv_tol: default_conserv_tol(),
            bracket_max: default_bracket_max(),
            ct_loop_max: default_ct_loop_max(),
            t_loop_max: default_t_loop_max(),
            search_relax: default_search_relax(),
            heat_cool_rel_error: default_heat_cool_error(),
            eden_rel_error: default_eden_error(),
            soft_failure: false,
            constant_temperature: None,
            photoelectric_heating: true,
            photoelectric_heating_scale: 1.0,
            collisional_exchange: true,
            ion_recombination: true,
            charge_transfer: true,
        }
    }
}

impl SolverConfig {
    /// Convergence threshold of the joint charge/temperature loop.
    pub fn tolerance(&self) -> f64 {
        self.conserv_tol / 10.0
    }

    /// Relative tolerance on grain heating within the temperature loop.
    pub fn heat_tolerance(&self) -> f64 {
        self.heat_cool_rel_error / 3.0
    }

    /// Relative tolerance on the grain electron density.
    pub fn charge_tolerance(&self) -> f64 {
        self.eden_rel_error / 3.0
    }

    pub fn validate(&self) -> GrainResult<()> {
        for (name, value) in [
            ("conserv_tol", self.conserv_tol),
            ("heat_cool_rel_error", self.heat_cool_rel_error),
            ("eden_rel_error", self.eden_rel_error),
        ] {
            if !value.is_finite() || value <= 0.0 || value >= 1.0 {
                return Err(GrainError::ConfigError(format!(
                    "{name} must be finite and in (0, 1), got {value}"
                )));
            }
        }
        for (name, value) in [
            ("bracket_max", self.bracket_max),
            ("ct_loop_max", self.ct_loop_max),
            ("t_loop_max", self.t_loop_max),
            ("search_relax", self.search_relax),
        ] {
            if value == 0 {
                return Err(GrainError::ConfigError(format!("{name} must be >= 1")));
            }
        }
        if let Some(t) = self.constant_temperature {
            if !t.is_finite() || t <= 0.0 {
                return Err(GrainError::ConfigError(format!(
                    "constant grain temperature must be finite and > 0, got {t}"
                )));
            }
        }
        if !self.photoelectric_heating_scale.is_finite() || self.photoelectric_heating_scale < 0.0
        {
            return Err(GrainError::ConfigError(format!(
                "photoelectric heating scale must be finite and >= 0, got {}",
                self.photoelectric_heating_scale
            )));
        }
        Ok(())
    }
}

/// Temperature grid of the per-bin emissivity table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmissivityGridConfig {
    #[serde(default = "default_t_min")]
    pub t_min: f64,
    #[serde(default = "default_t_mid")]
    pub t_mid: f64,
    #[serde(default = "default_t_max")]
    pub t_max: f64,
    #[serde(default = "default_n_points")]
    pub n_points: usize,
}

fn default_t_min() -> f64 {
    GRAIN_TMIN
}
fn default_t_mid() -> f64 {
    GRAIN_TMID
}
fn default_t_max() -> f64 {
    GRAIN_TMAX
}
fn default_n_points() -> usize {
    NDEMS
}

impl Default for EmissivityGridConfig {
    fn default() -> Self {
        EmissivityGridConfig {
            t_min: GRAIN_TMIN,
            t_mid: GRAIN_TMID,
            t_max: GRAIN_TMAX,
            n_points: NDEMS,
        }
    }
}

impl EmissivityGridConfig {
    /// Number of coarse points above `t_mid`.
    pub fn n_top(&self) -> usize {
        self.n_points / 5
    }

    pub fn validate(&self) -> GrainResult<()> {
        if !(self.t_min.is_finite() && self.t_mid.is_finite() && self.t_max.is_finite()) {
            return Err(GrainError::ConfigError(
                "emissivity grid temperatures must be finite".to_string(),
            ));
        }
        if !(0.0 < self.t_min && self.t_min < self.t_mid && self.t_mid < self.t_max) {
            return Err(GrainError::ConfigError(format!(
                "emissivity grid requires 0 < t_min < t_mid < t_max, got {} / {} / {}",
                self.t_min, self.t_mid, self.t_max
            )));
        }
        if self.n_points < 10 {
            return Err(GrainError::ConfigError(format!(
                "emissivity grid needs at least 10 points, got {}",
                self.n_points
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Composition {
    Carbonaceous,
    Silicate,
    Pah,
}

impl Composition {
    /// PAHs share the carbonaceous photoemission and potential physics.
    pub fn is_carbonaceous(self) -> bool {
        matches!(self, Composition::Carbonaceous | Composition::Pah)
    }
}

/// Abundance-vs-depth law of a bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthLaw {
    #[default]
    Standard,
    /// Destroyed above the sublimation temperature.
    Sublimation,
    /// Scales with the atomic hydrogen fraction.
    AtomicFraction,
}

/// Standard depth law used for PAHs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PahAbundanceLaw {
    /// n(H0)/n(H)
    #[default]
    AtomicHydrogen,
    /// (n(H0) + 2 n(H2))/n(H)
    NeutralHydrogen,
    Constant,
}

/// Grain constituent abundance (atoms per H nucleus at standard depletion).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElementAbundance {
    /// Element index, 0 = hydrogen.
    pub element: usize,
    pub atoms_per_h: f64,
}

/// One grain population.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrainBinConfig {
    pub label: String,
    pub composition: Composition,
    /// Mean radius [cm]
    pub radius_cm: f64,
    /// Material density [g/cm^3]
    pub density: f64,
    /// Mean atomic weight of the material [amu]
    pub atom_weight: f64,
    /// Bulk work function [eV]
    pub work_function_ev: f64,
    #[serde(default)]
    pub band_gap_ev: f64,
    /// Capacitance [F]. Defaults to that of an isolated sphere.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacitance: Option<f64>,
    #[serde(default = "default_unity")]
    pub thermionic_efficiency: f64,
    /// Secondary electron yield scale.
    #[serde(default = "default_unity")]
    pub yield_coefficient: f64,
    #[serde(default = "default_unity")]
    pub depletion: f64,
    /// Grains per H nucleus at standard depletion.
    pub grains_per_h: f64,
    #[serde(default)]
    pub elements: Vec<ElementAbundance>,
    #[serde(default)]
    pub depth_law: DepthLaw,
    /// Sublimation temperature [K], required by the sublimation depth law.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sublimation_temperature: Option<f64>,
    #[serde(default = "default_n_charge_states")]
    pub n_charge_states: usize,
}

fn default_n_charge_states() -> usize {
    NCHRG_DEFAULT
}

impl GrainBinConfig {
    pub fn validate(&self) -> GrainResult<()> {
        for (name, value) in [
            ("radius_cm", self.radius_cm),
            ("density", self.density),
            ("atom_weight", self.atom_weight),
            ("work_function_ev", self.work_function_ev),
            ("thermionic_efficiency", self.thermionic_efficiency),
            ("yield_coefficient", self.yield_coefficient),
            ("depletion", self.depletion),
            ("grains_per_h", self.grains_per_h),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(GrainError::ConfigError(format!(
                    "bin {}: {name} must be finite and > 0, got {value}",
                    self.label
                )));
            }
        }
        if !self.band_gap_ev.is_finite() || self.band_gap_ev < 0.0 {
            return Err(GrainError::ConfigError(format!(
                "bin {}: band gap must be finite and >= 0, got {}",
                self.label, self.band_gap_ev
            )));
        }
        if self.band_gap_ev >= self.work_function_ev {
            return Err(GrainError::ConfigError(format!(
                "bin {}: band gap {} eV must be below the work function {} eV",
                self.label, self.band_gap_ev, self.work_function_ev
            )));
        }
        if let Some(c) = self.capacitance {
            if !c.is_finite() || c <= 0.0 {
                return Err(GrainError::ConfigError(format!(
                    "bin {}: capacitance must be finite and > 0, got {c}",
                    self.label
                )));
            }
        }
        if !(2..=NCHU).contains(&self.n_charge_states) {
            return Err(GrainError::ConfigError(format!(
                "bin {}: n_charge_states must be in 2..={NCHU}, got {}",
                self.label, self.n_charge_states
            )));
        }
        for abundance in &self.elements {
            if !abundance.atoms_per_h.is_finite() || abundance.atoms_per_h < 0.0 {
                return Err(GrainError::ConfigError(format!(
                    "bin {}: abundance of element {} must be finite and >= 0",
                    self.label, abundance.element
                )));
            }
        }
        match (self.depth_law, self.sublimation_temperature) {
            (DepthLaw::Sublimation, None) => Err(GrainError::ConfigError(format!(
                "bin {}: sublimation depth law needs a sublimation temperature",
                self.label
            ))),
            (_, Some(t)) if !t.is_finite() || t <= 0.0 => Err(GrainError::ConfigError(format!(
                "bin {}: sublimation temperature must be finite and > 0, got {t}",
                self.label
            ))),
            _ => Ok(()),
        }
    }
}

impl GrainRunConfig {
    pub fn from_file(path: &str) -> GrainResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: GrainRunConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> GrainResult<()> {
        self.solver.validate()?;
        self.emissivity.validate()?;
        if !self.metallicity.is_finite() || self.metallicity < 0.0 {
            return Err(GrainError::ConfigError(format!(
                "metallicity must be finite and >= 0, got {}",
                self.metallicity
            )));
        }
        if self.bins.is_empty() {
            return Err(GrainError::ConfigError(
                "at least one grain bin is required".to_string(),
            ));
        }
        for bin in &self.bins {
            bin.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn silicate_bin() -> GrainBinConfig {
        GrainBinConfig {
            label: "silicate 0.1um".to_string(),
            composition: Composition::Silicate,
            radius_cm: 1.0e-5,
            density: 3.3,
            atom_weight: 20.0,
            work_function_ev: 8.0,
            band_gap_ev: 5.0,
            capacitance: None,
            thermionic_efficiency: 1.0,
            yield_coefficient: 1.0,
            depletion: 1.0,
            grains_per_h: 1.0e-12,
            elements: vec![],
            depth_law: DepthLaw::Standard,
            sublimation_temperature: None,
            n_charge_states: 2,
        }
    }

    #[test]
    fn test_minimal_json_uses_defaults() {
        let json = r#"{
            "bins": [{
                "label": "graphite",
                "composition": "carbonaceous",
                "radius_cm": 1e-6,
                "density": 2.2,
                "atom_weight": 12.01,
                "work_function_ev": 4.4,
                "grains_per_h": 1e-10
            }]
        }"#;
        let cfg: GrainRunConfig = serde_json::from_str(json).unwrap();
        cfg.validate().unwrap();
        assert_eq!(cfg.solver.bracket_max, BRACKET_MAX);
        assert_eq!(cfg.emissivity.n_points, NDEMS);
        assert_eq!(cfg.bins[0].n_charge_states, NCHRG_DEFAULT);
        assert_eq!(cfg.bins[0].depth_law, DepthLaw::Standard);
        assert!(cfg.auger_data.is_none());
        assert!((cfg.solver.tolerance() - 1.0e-4).abs() < 1e-18);
    }

    #[test]
    fn test_rejects_non_positive_radius() {
        let mut bin = silicate_bin();
        bin.radius_cm = 0.0;
        assert!(matches!(bin.validate(), Err(GrainError::ConfigError(_))));
        bin.radius_cm = f64::NAN;
        assert!(bin.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_capacitance() {
        let mut bin = silicate_bin();
        bin.capacitance = Some(-1.0e-18);
        assert!(bin.validate().is_err());
        bin.capacitance = Some(1.1e-17);
        assert!(bin.validate().is_ok());
    }

    #[test]
    fn test_charge_window_bounds() {
        let mut bin = silicate_bin();
        bin.n_charge_states = 1;
        assert!(bin.validate().is_err());
        bin.n_charge_states = NCHU + 1;
        assert!(bin.validate().is_err());
        bin.n_charge_states = NCHU;
        assert!(bin.validate().is_ok());
    }

    #[test]
    fn test_sublimation_law_needs_temperature() {
        let mut bin = silicate_bin();
        bin.depth_law = DepthLaw::Sublimation;
        assert!(bin.validate().is_err());
        bin.sublimation_temperature = Some(1500.0);
        assert!(bin.validate().is_ok());
    }

    #[test]
    fn test_emissivity_grid_ordering() {
        let mut grid = EmissivityGridConfig::default();
        assert!(grid.validate().is_ok());
        assert_eq!(grid.n_top(), 40);
        grid.t_mid = grid.t_max * 2.0;
        assert!(grid.validate().is_err());
    }

    #[test]
    fn test_empty_bin_list_rejected() {
        let cfg = GrainRunConfig {
            solver: SolverConfig::default(),
            emissivity: EmissivityGridConfig::default(),
            metallicity: 1.0,
            pah_law: PahAbundanceLaw::default(),
            auger_data: None,
            bins: vec![],
        };
        assert!(cfg.validate().is_err());
    }
}
