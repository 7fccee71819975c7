// ─────────────────────────────────────────────────────────────────────
// SCPN Grain Core — Zone Aggregation
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! All bins of a run, solved zone by zone and aggregated into gas exchange totals.
//!
//! Each zone solve scales the bins to the local abundance, solves every
//! bin in parallel with its previous result as the starting point, and
//! sums what the grains exchange with the gas. Bins own their caches, so
//! the per-bin solves share nothing mutable.

use crate::auger::AugerTable;
use crate::bin::{GrainBin, ZoneEnvironment};
use crate::drift::DriftOutcome;
use crate::equilibrium::{solve_equilibrium, BinOutcome, EquilibriumOptions};
use crate::optics::{ElementCrossSections, GrainOptics};
use grain_types::config::{Composition, GrainRunConfig};
use grain_types::error::{GrainError, GrainResult};
use grain_types::state::{ChargeTransferMatrix, EnergyMesh, EquilibriumResult};
use ndarray::Array1;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Ionised hydrogen fraction above which PAHs are not expected to survive.
const PAH_IONISED_FRACTION: f64 = 0.5;

/// Why the grain contribution of a zone is not yet stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Unconverged {
    ElectronDensity,
    NetHeating,
    GasTemperature,
    Zone,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneConvergence {
    /// Grain electron density changed by at most the charge tolerance.
    pub eden_converged: bool,
    /// Net gas heating changed by at most the heat tolerance.
    pub heat_converged: bool,
    pub reason: Option<Unconverged>,
}

impl ZoneConvergence {
    pub fn is_converged(&self) -> bool {
        self.reason.is_none()
    }
}

/// Grain contribution to one zone [erg cm^-3 s^-1 unless noted].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GasExchange {
    /// Per-bin results in bin order.
    pub bins: Vec<EquilibriumResult>,
    /// Gas cooling by collisions with grains; negative when grains heat.
    pub gas_cooling: f64,
    pub photoelectric_heating: f64,
    pub thermionic_heating: f64,
    /// Photoelectric plus thermionic heating minus collisional cooling.
    pub net_gas_heating: f64,
    /// Net heating of all grains.
    pub grain_heating: f64,
    pub chemical_heating: f64,
    /// Electrons released by grains [cm^-3]; negative when grains absorb them.
    pub electron_density: f64,
    pub charge_transfer: ChargeTransferMatrix,
    /// Numerical d(net gas heating)/dT from the last two gas temperatures
    /// of this zone [erg cm^-3 s^-1 K^-1].
    pub dheat_dt: f64,
    pub convergence: ZoneConvergence,
    pub soft_failures: usize,
}

/// Grain opacity per H nucleus [cm^2].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrainOpacity {
    /// Absorption including photodetachment from negative grains.
    pub absorption: Array1<f64>,
    /// Scattering weighted by (1 − g).
    pub scattering: Array1<f64>,
}

#[derive(Debug, Clone, Copy)]
struct ZoneMemory {
    zone: usize,
    gas_temperature: f64,
    net_gas_heating: f64,
    electron_density: f64,
}

/// All grain bins of a run.
pub struct GrainSystem {
    config: GrainRunConfig,
    bins: Vec<GrainBin>,
    last: Option<ZoneMemory>,
    /// Point the heating derivative is taken against.
    reference: Option<ZoneMemory>,
    dheat_dt: f64,
}

impl GrainSystem {
    /// Build the bins from `config` with host-supplied optics, one entry
    /// per bin.
    pub fn new(
        config: GrainRunConfig,
        mesh: &EnergyMesh,
        optics: Vec<GrainOptics>,
        cross_sections: &ElementCrossSections,
    ) -> GrainResult<Self> {
        config.validate()?;
        if optics.len() != config.bins.len() {
            return Err(GrainError::ConfigError(format!(
                "{} bins configured but optics for {}",
                config.bins.len(),
                optics.len()
            )));
        }
        let auger = config
            .auger_data
            .as_deref()
            .map(AugerTable::from_file)
            .transpose()?;
        let bins = config
            .bins
            .iter()
            .zip(optics)
            .map(|(bin, optics)| {
                GrainBin::new(
                    bin,
                    &config.emissivity,
                    mesh,
                    optics,
                    cross_sections,
                    auger.as_ref(),
                )
            })
            .collect::<GrainResult<Vec<_>>>()?;
        debug!(bins = bins.len(), "grain system initialised");
        Ok(GrainSystem {
            config,
            bins,
            last: None,
            reference: None,
            dheat_dt: 0.0,
        })
    }

    /// Build every bin with gray-body optics.
    pub fn analytic(config: GrainRunConfig, mesh: &EnergyMesh) -> GrainResult<Self> {
        let optics = config
            .bins
            .iter()
            .map(|b| GrainOptics::analytic(mesh, b.radius_cm, b.grains_per_h))
            .collect::<GrainResult<Vec<_>>>()?;
        Self::new(config, mesh, optics, &ElementCrossSections::new(mesh.len()))
    }

    /// Analytic system from a JSON config file.
    pub fn from_file(path: &str, mesh: &EnergyMesh) -> GrainResult<Self> {
        let config = GrainRunConfig::from_file(path)?;
        Self::analytic(config, mesh)
    }

    pub fn config(&self) -> &GrainRunConfig {
        &self.config
    }

    pub fn bins(&self) -> &[GrainBin] {
        &self.bins
    }

    pub fn bins_mut(&mut self) -> &mut [GrainBin] {
        &mut self.bins
    }

    pub fn dheat_dt(&self) -> f64 {
        self.dheat_dt
    }

    /// Scale every bin to the local abundance.
    pub fn update_abundances(&mut self, env: &ZoneEnvironment) {
        let metallicity = self.config.metallicity;
        let pah_law = self.config.pah_law;
        let ionised = if env.gas.hden > 0.0 {
            env.ionised_hydrogen() / env.gas.hden
        } else {
            0.0
        };
        for bin in &mut self.bins {
            bin.dst_abund = bin.depletion * metallicity * bin.depth_factor(pah_law, env);
            bin.cnv_h_pcm3 = env.gas.hden * bin.dst_abund;
            if bin.props.composition == Composition::Pah && ionised > PAH_IONISED_FRACTION {
                warn!(
                    bin = bin.label(),
                    ionised_fraction = ionised,
                    "PAHs present in ionised gas"
                );
            }
        }
    }

    /// Solve every bin in `env` and aggregate. `search` relaxes the
    /// iteration bounds while the host looks for its first solution.
    pub fn solve_zone(&mut self, env: &ZoneEnvironment, search: bool) -> GrainResult<GasExchange> {
        env.validate()?;
        self.update_abundances(env);
        let options = EquilibriumOptions {
            solver: &self.config.solver,
            search,
            n_bins: self.bins.len(),
        };
        let outcomes = self
            .bins
            .par_iter_mut()
            .map(|bin| {
                let guess = bin.last.clone();
                solve_equilibrium(bin, env, options, guess.as_ref())
            })
            .collect::<GrainResult<Vec<BinOutcome>>>()?;
        Ok(self.aggregate(env, outcomes))
    }

    fn aggregate(&mut self, env: &ZoneEnvironment, outcomes: Vec<BinOutcome>) -> GasExchange {
        let mut charge_transfer = ChargeTransferMatrix::zeros(env.elements);
        let mut gas_cooling = 0.0;
        let mut photoelectric_heating = 0.0;
        let mut thermionic_heating = 0.0;
        let mut grain_heating = 0.0;
        let mut chemical_heating = 0.0;
        let mut electron_density = 0.0;
        let mut soft_failures = 0;
        let mut bins = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            let r = &outcome.result;
            gas_cooling += r.gas_cooling;
            photoelectric_heating += r.photoelectric_heating;
            thermionic_heating += r.thermionic_heating;
            grain_heating += r.grain_heat;
            chemical_heating += r.chemical_heat;
            electron_density += r.electron_density;
            soft_failures += outcome.soft_failures;
            charge_transfer.accumulate(&outcome.charge_transfer);
            bins.push(outcome.result);
        }
        let net_gas_heating = photoelectric_heating + thermionic_heating - gas_cooling;
        let current = ZoneMemory {
            zone: env.zone,
            gas_temperature: env.gas.temperature,
            net_gas_heating,
            electron_density,
        };
        let convergence = self.track(current, env);
        debug!(
            zone = env.zone,
            net_gas_heating,
            electron_density,
            ?convergence,
            "grain zone aggregated"
        );
        GasExchange {
            bins,
            gas_cooling,
            photoelectric_heating,
            thermionic_heating,
            net_gas_heating,
            grain_heating,
            chemical_heating,
            electron_density,
            charge_transfer,
            dheat_dt: self.dheat_dt,
            convergence,
            soft_failures,
        }
    }

    /// Update the heating derivative and compare with the previous call.
    fn track(&mut self, current: ZoneMemory, env: &ZoneEnvironment) -> ZoneConvergence {
        let solver = &self.config.solver;
        let previous = self.last.replace(current);
        if let Some(prev) = previous {
            if prev.gas_temperature != current.gas_temperature {
                self.reference = Some(prev);
            }
        }
        if let Some(reference) = self.reference {
            if reference.zone == current.zone
                && reference.gas_temperature != current.gas_temperature
            {
                self.dheat_dt = (current.net_gas_heating - reference.net_gas_heating)
                    / (current.gas_temperature - reference.gas_temperature);
            }
        }
        let Some(prev) = previous else {
            return ZoneConvergence {
                eden_converged: false,
                heat_converged: false,
                reason: Some(Unconverged::Zone),
            };
        };
        let eden_converged = (current.electron_density - prev.electron_density).abs()
            <= solver.charge_tolerance() * env.gas.eden;
        let heat_converged = (current.net_gas_heating - prev.net_gas_heating).abs()
            <= solver.heat_tolerance() * env.gas.total_cooling;
        let reason = if !eden_converged {
            Some(Unconverged::ElectronDensity)
        } else if !heat_converged {
            Some(Unconverged::NetHeating)
        } else if prev.gas_temperature != current.gas_temperature {
            Some(Unconverged::GasTemperature)
        } else if prev.zone != current.zone {
            Some(Unconverged::Zone)
        } else {
            None
        };
        ZoneConvergence {
            eden_converged,
            heat_converged,
            reason,
        }
    }

    /// Total grain opacity with the charge distributions of the last solve.
    pub fn opacity(&self) -> GrainOpacity {
        let n = self.bins.first().map_or(0, |b| b.optics.len());
        let mut absorption = Array1::zeros(n);
        let mut scattering = Array1::zeros(n);
        for bin in &self.bins {
            let dst = bin.dst_abund;
            for i in 0..n {
                absorption[i] += bin.optics.abs_cs[i] * dst;
                scattering[i] += bin.optics.effective_scattering(i) * dst;
            }
            let Some(result) = bin.last.as_ref() else {
                continue;
            };
            for (state, &pop) in bin.window().iter().zip(&result.populations) {
                if state.z > -1 {
                    continue;
                }
                for i in state.ip_thres_inf.min(n)..n {
                    absorption[i] += pop * state.cs_pdt[i] * dst;
                }
            }
        }
        GrainOpacity {
            absorption,
            scattering,
        }
    }

    /// Drift velocities of all bins in `env`.
    pub fn update_drift(&mut self, env: &ZoneEnvironment) -> Vec<DriftOutcome> {
        self.bins.iter_mut().map(|bin| bin.update_drift(env)).collect()
    }
}
