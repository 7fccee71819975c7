// ─────────────────────────────────────────────────────────────────────
// SCPN Grain Core — Bin Properties
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Per-bin constants derived once from the bin configuration.

use crate::potential::Electrostatics;
use grain_types::config::{Composition, GrainBinConfig};
use grain_types::constants::{
    ATOMIC_MASS_UNIT, BOLTZMANN, ELECTRON_MASS, EPSILON_0, EVRYD, STICK_ELEC,
};
use grain_types::error::GrainResult;
use std::f64::consts::PI;

#[derive(Debug, Clone)]
pub struct GrainProperties {
    pub label: String,
    pub composition: Composition,
    pub electro: Electrostatics,
    /// Capacitance [F]
    pub capacitance: f64,
    /// Volume of one grain [cm^3]
    pub volume: f64,
    /// Total surface area per H at standard depletion [cm^2]
    pub int_area: f64,
    /// Grains per H at standard depletion.
    pub cnv_gr_ph: f64,
    pub cnv_h_pgr: f64,
    pub density: f64,
    pub atom_weight: f64,
    pub thermionic_efficiency: f64,
    /// Secondary electron yield scale.
    pub eyc: f64,
    /// Escape length density factor ρ^-0.85.
    pub eec: f64,
    /// Electron energy [Ryd] above which the X-ray escape length applies.
    pub le_thres: f64,
    pub lowest_charge: i64,
    pub stick_elec_pos: f64,
    pub stick_elec_neg: f64,
    /// Photoemission follows WD01 only (no Auger data configured).
    pub wd01: bool,
}

impl GrainProperties {
    pub fn new(config: &GrainBinConfig, wd01: bool) -> GrainResult<Self> {
        config.validate()?;
        let a = config.radius_cm;
        let capacitance = config
            .capacitance
            .unwrap_or(4.0 * PI * EPSILON_0 * a * 1.0e-2);
        let electro = Electrostatics::new(
            config.work_function_ev / EVRYD,
            config.band_gap_ev / EVRYD,
            a,
            capacitance,
            config.composition.is_carbonaceous(),
        );
        let volume = 4.0 / 3.0 * PI * a.powi(3);
        let le_thres = if wd01 {
            f64::INFINITY
        } else {
            (config.density.powf(0.85) / 30.0).powf(2.0 / 3.0) * 1.0e3 / EVRYD
        };

        let mut props = GrainProperties {
            label: config.label.clone(),
            composition: config.composition,
            electro,
            capacitance,
            volume,
            int_area: 4.0 * PI * a * a * config.grains_per_h,
            cnv_gr_ph: config.grains_per_h,
            cnv_h_pgr: 1.0 / config.grains_per_h,
            density: config.density,
            atom_weight: config.atom_weight,
            thermionic_efficiency: config.thermionic_efficiency,
            eyc: config.yield_coefficient,
            eec: config.density.powf(-0.85),
            le_thres,
            lowest_charge: 0,
            stick_elec_pos: 0.0,
            stick_elec_neg: 0.0,
            wd01,
        };
        props.lowest_charge = electro.lowest_charge();

        // electrons may pass through small grains; 1 - p_rad is the chance
        // of ejection before the grain settles (WD01)
        props.stick_elec_pos = STICK_ELEC * (1.0 - (-a / props.escape_length(0.0)).exp());
        let atoms = volume * config.density / ATOMIC_MASS_UNIT / config.atom_weight;
        let p_rad = 1.0 / (1.0 + (20.0 - atoms).exp());
        props.stick_elec_neg = props.stick_elec_pos * p_rad;
        Ok(props)
    }

    pub fn radius(&self) -> f64 {
        self.electro.radius
    }

    /// Mean path [cm] an electron of energy `e` [Ryd] travels inside the grain
    /// (WDB06 eq. 11).
    pub fn escape_length(&self, e: f64) -> f64 {
        if e <= self.le_thres {
            1.0e-7
        } else {
            3.0e-6 * self.eec * (e * EVRYD * 1.0e-3).powi(3).sqrt()
        }
    }

    /// Projected area per H at standard depletion [cm^2].
    pub fn projected_area(&self) -> f64 {
        self.int_area / 4.0
    }

    /// Electron sticking probability for a grain of charge `z`.
    pub fn electron_sticking(&self, z: i64) -> f64 {
        if z <= -1 {
            self.stick_elec_neg
        } else {
            self.stick_elec_pos
        }
    }

    /// Accommodation coefficient for a projectile of mass `weight` [amu].
    pub fn accommodation(&self, weight: f64) -> f64 {
        2.0 * self.atom_weight * weight / (self.atom_weight + weight).powi(2)
    }
}

/// Mean thermal speed [cm/s] of particles of mass `weight` [amu].
pub fn mean_speed(temperature: f64, weight: f64) -> f64 {
    (8.0 * BOLTZMANN * temperature / (PI * weight * ATOMIC_MASS_UNIT)).sqrt()
}

/// Mean thermal speed [cm/s] of electrons.
pub fn electron_speed(temperature: f64) -> f64 {
    (8.0 * BOLTZMANN * temperature / (PI * ELECTRON_MASS)).sqrt()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use grain_types::config::DepthLaw;

    pub(crate) fn silicate_config() -> GrainBinConfig {
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

    pub(crate) fn graphite_config() -> GrainBinConfig {
        GrainBinConfig {
            label: "graphite 5nm".to_string(),
            composition: Composition::Carbonaceous,
            radius_cm: 5.0e-7,
            density: 2.2,
            atom_weight: 12.011,
            work_function_ev: 4.4,
            band_gap_ev: 0.0,
            grains_per_h: 1.0e-9,
            ..silicate_config()
        }
    }

    #[test]
    fn test_sphere_capacitance_default() {
        let props = GrainProperties::new(&silicate_config(), true).unwrap();
        // 4 pi eps0 a = 1.11e-17 F for a = 0.1 um
        assert!((props.capacitance / 1.112_65e-17 - 1.0).abs() < 1e-4);
        assert!((props.electro.one_elec * EVRYD - 0.0144).abs() < 1e-3);
    }

    #[test]
    fn test_large_grain_sticks_fully() {
        let props = GrainProperties::new(&silicate_config(), true).unwrap();
        assert!((props.stick_elec_pos - STICK_ELEC).abs() < 1e-3);
        assert!((props.stick_elec_neg - props.stick_elec_pos).abs() < 1e-12);
        assert_eq!(props.electron_sticking(-2), props.stick_elec_neg);
    }

    #[test]
    fn test_escape_length_branches() {
        let props = GrainProperties::new(&silicate_config(), false).unwrap();
        assert_eq!(props.escape_length(0.0), 1.0e-7);
        let e = 1.0e4 / EVRYD;
        assert!(props.escape_length(e) > 1.0e-7);
        let wd01 = GrainProperties::new(&silicate_config(), true).unwrap();
        assert_eq!(wd01.escape_length(e), 1.0e-7);
    }

    #[test]
    fn test_accommodation_is_symmetric_and_bounded() {
        let props = GrainProperties::new(&graphite_config(), true).unwrap();
        let acc = props.accommodation(props.atom_weight);
        assert!((acc - 0.5).abs() < 1e-12);
        assert!(props.accommodation(1.0) < acc);
    }

    #[test]
    fn test_rejects_invalid_bin() {
        let mut cfg = silicate_config();
        cfg.radius_cm = -1.0;
        assert!(GrainProperties::new(&cfg, true).is_err());
    }
}
