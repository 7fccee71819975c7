// ─────────────────────────────────────────────────────────────────────
// SCPN Grain Core — Grain Bin
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! One grain population with its run-constant tables and the cache of
//! charge states visited by the solver.

use crate::auger::AugerTable;
use crate::charge::ChargeRates;
use crate::charge_state::ChargeState;
use crate::emissivity::EmissivityTable;
use crate::optics::{ElementCrossSections, GrainOptics};
use crate::properties::GrainProperties;
use crate::rates::RateContext;
use crate::yields::PhotoTables;
use grain_types::config::{DepthLaw, EmissivityGridConfig, GrainBinConfig};
use grain_types::constants::{DRIFT_VELOCITY_SEED, NCHS};
use grain_types::error::{GrainError, GrainResult};
use grain_types::state::{Element, EnergyMesh, EquilibriumResult, GasState, RadiationField};

/// Zone inputs seen by every bin.
#[derive(Debug, Clone, Copy)]
pub struct ZoneEnvironment<'a> {
    /// Index of the zone, used to expire direct-field heating.
    pub zone: usize,
    pub mesh: &'a EnergyMesh,
    pub field: &'a RadiationField,
    pub gas: &'a GasState,
    pub elements: &'a [Element],
}

impl ZoneEnvironment<'_> {
    pub fn validate(&self) -> GrainResult<()> {
        if self.field.len() != self.mesh.len() {
            return Err(GrainError::ConfigError(format!(
                "radiation field has {} cells, mesh has {}",
                self.field.len(),
                self.mesh.len()
            )));
        }
        self.gas.validate(self.elements)
    }

    /// Density of atomic hydrogen [cm^-3], assuming hydrogen leads the
    /// element list when present.
    pub fn atomic_hydrogen(&self) -> f64 {
        self.gas.ion_density(self.elements, 0, 0)
    }

    pub fn ionised_hydrogen(&self) -> f64 {
        self.gas.ion_density(self.elements, 0, 1)
    }
}

#[derive(Debug, Clone)]
pub struct GrainBin {
    pub props: GrainProperties,
    pub optics: GrainOptics,
    pub tables: PhotoTables,
    pub emissivity: EmissivityTable,
    pub depth_law: DepthLaw,
    pub sublimation_temperature: Option<f64>,
    /// Depletion factor relative to the standard abundance.
    pub depletion: f64,
    requested_states: usize,
    /// States in the active window; shrinks when the outer states are empty.
    pub n_states: usize,
    /// Most recently used first; the first `n_states` form the window.
    pub(crate) states: Vec<ChargeState>,
    /// Grain temperature [K]
    pub temperature: f64,
    /// Abundance relative to standard depletion, depth law included.
    pub dst_abund: f64,
    /// H nuclei locked in grains of this bin per cm^3 [cm^-3].
    pub cnv_h_pcm3: f64,
    /// H2 formation rate per H atom on this bin [s^-1].
    pub h2_formation_rate: f64,
    /// Drift velocity relative to the gas [cm/s], seed of the next update.
    pub drift_velocity: f64,
    pub last: Option<EquilibriumResult>,
    last_zone: Option<usize>,
    last_gas_temperature: Option<f64>,
}

impl GrainBin {
    pub fn new(
        config: &GrainBinConfig,
        grid: &EmissivityGridConfig,
        mesh: &EnergyMesh,
        optics: GrainOptics,
        cross_sections: &ElementCrossSections,
        auger: Option<&AugerTable>,
    ) -> GrainResult<Self> {
        let props = GrainProperties::new(config, auger.is_none())?;
        let tables = PhotoTables::new(&props, mesh, &optics, cross_sections, auger, &config.elements)?;
        let emissivity = EmissivityTable::new(grid, mesh, &optics)?;
        Ok(GrainBin {
            props,
            optics,
            tables,
            emissivity,
            depth_law: config.depth_law,
            sublimation_temperature: config.sublimation_temperature,
            depletion: config.depletion,
            requested_states: config.n_charge_states,
            n_states: config.n_charge_states,
            states: Vec::with_capacity(NCHS),
            temperature: 1.0,
            dst_abund: 1.0,
            cnv_h_pcm3: 0.0,
            h2_formation_rate: 0.0,
            drift_velocity: DRIFT_VELOCITY_SEED,
            last: None,
            last_zone: None,
            last_gas_temperature: None,
        })
    }

    /// Bin with gray-body optics and the valence-band yield model.
    pub fn analytic(
        config: &GrainBinConfig,
        grid: &EmissivityGridConfig,
        mesh: &EnergyMesh,
    ) -> GrainResult<Self> {
        let optics = GrainOptics::analytic(mesh, config.radius_cm, config.grains_per_h)?;
        let cross_sections = ElementCrossSections::new(mesh.len());
        Self::new(config, grid, mesh, optics, &cross_sections, None)
    }

    pub fn label(&self) -> &str {
        &self.props.label
    }

    pub fn requested_states(&self) -> usize {
        self.requested_states
    }

    pub fn cached_states(&self) -> usize {
        self.states.len()
    }

    /// Grains per cm^3.
    pub fn grains_pcm3(&self) -> f64 {
        self.cnv_h_pcm3 * self.props.cnv_gr_ph
    }

    pub fn invalidate_rates(&mut self) {
        self.states.iter_mut().for_each(ChargeState::invalidate_rates);
    }

    pub fn invalidate_screening(&mut self) {
        self.states.iter_mut().for_each(ChargeState::invalidate_screening);
    }

    pub fn invalidate_incident_heating(&mut self) {
        self.states
            .iter_mut()
            .for_each(ChargeState::invalidate_incident_heating);
    }

    /// Expire caches before a new solve in `env`.
    pub fn prepare(&mut self, env: &ZoneEnvironment) {
        self.invalidate_rates();
        if self.last_gas_temperature != Some(env.gas.temperature) {
            self.invalidate_screening();
            self.last_gas_temperature = Some(env.gas.temperature);
        }
        if self.last_zone != Some(env.zone) {
            self.invalidate_incident_heating();
            self.last_zone = Some(env.zone);
        }
    }

    /// Put the state of charge `z` at position `slot`, reusing a cached
    /// state when possible. Returns its index.
    pub(crate) fn locate(&mut self, z: i64, slot: usize, env: &ZoneEnvironment) -> usize {
        let searchable = self.states.len().min(NCHS - 1);
        let index = match self.states[..searchable].iter().position(|s| s.z == z) {
            Some(i) => i,
            None => {
                let fresh = ChargeState::new(
                    z,
                    &self.props,
                    &self.tables,
                    env.mesh,
                    &self.optics,
                    env.elements,
                );
                if self.states.len() < NCHS {
                    self.states.push(fresh);
                    self.states.len() - 1
                } else {
                    // the least recently used state is recycled
                    let last = self.states.len() - 1;
                    self.states[last] = fresh;
                    last
                }
            }
        };
        let state = self.states.remove(index);
        let target = slot.min(self.states.len());
        self.states.insert(target, state);
        target
    }

    pub(crate) fn window(&self) -> &[ChargeState] {
        &self.states[..self.n_states.min(self.states.len())]
    }

    /// Population-weighted thermionic and total electron emission of the
    /// window [cm^-2 s^-1].
    pub(crate) fn emission_split(
        &mut self,
        env: &ZoneEnvironment,
        populations: &[f64],
        ion_recombination: bool,
    ) -> (f64, f64) {
        let GrainBin {
            props,
            optics,
            states,
            temperature,
            ..
        } = self;
        let ctx = RateContext {
            props,
            optics,
            field: env.field,
            gas: env.gas,
            elements: env.elements,
            ion_recombination,
            grain_temperature: *temperature,
        };
        let mut thermionic = 0.0;
        let mut total = 0.0;
        for (state, &pop) in states.iter_mut().zip(populations) {
            let rate = state.emission_rate(&ctx);
            thermionic += pop * rate.thermionic;
            total += pop * rate.total();
        }
        (thermionic, total)
    }
}

/// A bin evaluated in one zone, as seen by the charge solver.
pub struct BinRates<'a, 'e> {
    pub bin: &'a mut GrainBin,
    pub env: &'a ZoneEnvironment<'e>,
    pub ion_recombination: bool,
}

impl ChargeRates for BinRates<'_, '_> {
    fn label(&self) -> &str {
        self.bin.label()
    }

    fn lowest_charge(&self) -> i64 {
        self.bin.props.lowest_charge
    }

    fn rate_pair(&mut self, z: i64, slot: usize) -> GrainResult<(f64, f64)> {
        let index = self.bin.locate(z, slot, self.env);
        let GrainBin {
            props,
            optics,
            states,
            temperature,
            ..
        } = &mut *self.bin;
        let ctx = RateContext {
            props,
            optics,
            field: self.env.field,
            gas: self.env.gas,
            elements: self.env.elements,
            ion_recombination: self.ion_recombination,
            grain_temperature: *temperature,
        };
        let state = &mut states[index];
        let up = state.emission_rate(&ctx).total();
        let dn = state.recombination_rate(&ctx);
        Ok((up, dn.electron + dn.ion))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::properties::tests::graphite_config;
    use crate::rates::tests::{hydrogen, ionised_gas};

    pub(crate) fn small_grid() -> EmissivityGridConfig {
        EmissivityGridConfig {
            n_points: 60,
            ..EmissivityGridConfig::default()
        }
    }

    pub(crate) fn mesh() -> EnergyMesh {
        EnergyMesh::geometric(1.0e-5, 1.0e3, 200).unwrap()
    }

    #[test]
    fn test_locate_reuses_and_orders_states() {
        let mesh = mesh();
        let field = RadiationField::dark(mesh.len());
        let gas = ionised_gas(1.0, 1.0e4);
        let elements = vec![hydrogen()];
        let env = ZoneEnvironment {
            zone: 0,
            mesh: &mesh,
            field: &field,
            gas: &gas,
            elements: &elements,
        };
        let mut bin = GrainBin::analytic(&graphite_config(), &small_grid(), &mesh).unwrap();
        assert_eq!(bin.locate(3, 0, &env), 0);
        assert_eq!(bin.locate(4, 1, &env), 1);
        assert_eq!(bin.cached_states(), 2);
        // revisiting 4 in slot 0 moves it to the front without rebuilding
        assert_eq!(bin.locate(4, 0, &env), 0);
        assert_eq!(bin.states[0].z, 4);
        assert_eq!(bin.states[1].z, 3);
        assert_eq!(bin.cached_states(), 2);
    }

    #[test]
    fn test_cache_is_bounded() {
        let mesh = mesh();
        let field = RadiationField::dark(mesh.len());
        let gas = ionised_gas(1.0, 1.0e4);
        let elements = vec![hydrogen()];
        let env = ZoneEnvironment {
            zone: 0,
            mesh: &mesh,
            field: &field,
            gas: &gas,
            elements: &elements,
        };
        let mut bin = GrainBin::analytic(&graphite_config(), &small_grid(), &mesh).unwrap();
        for z in 0..(NCHS as i64 + 12) {
            let index = bin.locate(z, 0, &env);
            assert_eq!(bin.states[index].z, z);
        }
        assert_eq!(bin.cached_states(), NCHS);
    }

    #[test]
    fn test_prepare_expires_screening_on_temperature_change() {
        let mesh = mesh();
        let field = RadiationField::dark(mesh.len());
        let elements = vec![hydrogen()];
        let mut bin = GrainBin::analytic(&graphite_config(), &small_grid(), &mesh).unwrap();
        let warm = ionised_gas(1.0, 1.0e4);
        let env = ZoneEnvironment {
            zone: 0,
            mesh: &mesh,
            field: &field,
            gas: &warm,
            elements: &elements,
        };
        bin.prepare(&env);
        let mut rates = BinRates {
            bin: &mut bin,
            env: &env,
            ion_recombination: true,
        };
        rates.rate_pair(0, 0).unwrap();
        assert!(!bin.states[0].screening.is_empty());
        bin.prepare(&env);
        assert!(!bin.states[0].screening.is_empty());
        let hot = ionised_gas(1.0, 2.0e4);
        let env = ZoneEnvironment { gas: &hot, ..env };
        bin.prepare(&env);
        assert!(bin.states[0].screening.is_empty());
    }
}
