// ─────────────────────────────────────────────────────────────────────
// SCPN Grain Core — Grain Heat Budget
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Heating of one bin at fixed charge distribution, and the grain
//! temperature that radiates it away.

use crate::bin::{GrainBin, ZoneEnvironment};
use crate::collisions::{collisional_exchange, CollisionalExchange};
use crate::properties::GrainProperties;
use grain_types::config::SolverConfig;
use grain_types::constants::{BOLTZMANN, EN1RYD};
use grain_types::error::{GrainError, GrainResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Energy budget of one bin [erg cm^-3 s^-1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HeatBudget {
    /// Absorbed direct radiation.
    pub incident: f64,
    /// Absorbed diffuse radiation.
    pub diffuse: f64,
    pub collisional: CollisionalExchange,
    /// Gas heating by photoelectrons.
    pub photoelectric: f64,
    /// Gas heating by thermionic electrons.
    pub thermionic: f64,
    /// Grain cooling by thermionic emission.
    pub thermionic_cooling: f64,
    /// Net grain heating; not positive when no temperature balances it.
    pub grain_heat: f64,
    pub temperature: Option<f64>,
}

/// Evaluate the budget of the window `bin.states[..populations.len()]` at
/// the current grain temperature.
pub fn heat_budget(
    bin: &mut GrainBin,
    env: &ZoneEnvironment,
    populations: &[f64],
    solver: &SolverConfig,
) -> GrainResult<HeatBudget> {
    if !(bin.cnv_h_pcm3 > 0.0) {
        return Err(GrainError::InvariantViolation(format!(
            "bin {}: grain abundance must be > 0 before the heat budget",
            bin.label()
        )));
    }
    let td = bin.temperature;
    let mut incident = 0.0;
    let mut diffuse = 0.0;
    let mut photo = 0.0;
    let mut cool_therm = 0.0;
    let mut thermionic = 0.0;
    {
        let GrainBin {
            props,
            optics,
            states,
            cnv_h_pcm3,
            ..
        } = &mut *bin;
        let props: &GrainProperties = props;
        for (state, &pop) in states.iter_mut().zip(populations) {
            let field = env.field;
            let n = field.len();
            let cut = state.ip_thres_inf.min(n);
            let hcon1 = *state.hcon1.get_or_insert_with(|| {
                (0..cut)
                    .map(|i| field.direct[i] * optics.abs_cs[i] * env.mesh.anu[i])
                    .sum::<f64>()
                    + (cut..n).map(|i| field.direct[i] * state.fac1[i]).sum::<f64>()
            });
            if state.hots1.is_none() || state.pe1.is_none() {
                let hots1 = (0..cut)
                    .map(|i| field.diffuse[i] * optics.abs_cs[i] * env.mesh.anu[i])
                    .sum::<f64>()
                    + (cut..n).map(|i| field.diffuse[i] * state.fac1[i]).sum::<f64>();
                let pe1 = (cut..n).map(|i| field.summed(i) * state.fac2[i]).sum::<f64>();
                state.hots1 = Some(hots1);
                state.pe1 = Some(pe1);
            }
            incident += pop * hcon1;
            diffuse += pop * state.hots1.unwrap_or(0.0);
            if solver.photoelectric_heating {
                photo += pop * state.pe1.unwrap_or(0.0);
            }

            // emission scales with the full grain surface
            let rate = pop * state.thermionic_rate(props, td) * props.int_area * *cnv_h_pcm3;
            let ehat = 2.0 * BOLTZMANN * td + (state.pot.pot_surf * EN1RYD).max(0.0);
            cool_therm += rate * (ehat + state.pot.thres_surf * EN1RYD);
            thermionic += rate * (ehat - state.pot.pot_surf * EN1RYD);
        }
    }

    let norm = EN1RYD * bin.cnv_h_pcm3;
    let incident = incident * norm;
    let diffuse = diffuse * norm;
    let photoelectric = photo * norm * solver.photoelectric_heating_scale;
    let collisional = collisional_exchange(
        bin,
        env,
        populations,
        solver.ion_recombination,
        solver.collisional_exchange,
    )?;

    let mut grain_heat = incident + diffuse + collisional.heat - cool_therm;
    let temperature = match solver.constant_temperature {
        Some(t) => {
            grain_heat = bin.emissivity.emission_at(t) * bin.cnv_h_pcm3;
            Some(t)
        }
        None => bin.emissivity.temperature_for(grain_heat / bin.cnv_h_pcm3),
    };
    debug!(
        bin = bin.label(),
        incident, diffuse, collisional = collisional.heat, cool_therm, ?temperature,
        "grain heat budget"
    );
    Ok(HeatBudget {
        incident,
        diffuse,
        collisional,
        photoelectric,
        thermionic,
        thermionic_cooling: cool_therm,
        grain_heat,
        temperature,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bin::tests::{mesh, small_grid};
    use crate::bin::BinRates;
    use crate::charge::{solve_charge, ChargeSolverConfig};
    use crate::properties::tests::silicate_config;
    use crate::rates::tests::{hydrogen, ionised_gas};
    use grain_types::state::{Element, EnergyMesh, GasState, RadiationField};

    fn solved(
        bin: &mut GrainBin,
        mesh: &EnergyMesh,
        field: &RadiationField,
        gas: &GasState,
        elements: &[Element],
    ) -> Vec<f64> {
        let env = ZoneEnvironment {
            zone: 0,
            mesh,
            field,
            gas,
            elements,
        };
        bin.prepare(&env);
        let mut rates = BinRates {
            bin,
            env: &env,
            ion_recombination: true,
        };
        let cfg = ChargeSolverConfig {
            n_states: 2,
            bracket_max: 50,
        };
        solve_charge(&mut rates, cfg, None).unwrap().populations
    }

    #[test]
    fn test_starlight_heats_grain() {
        let mesh = mesh();
        let field = RadiationField::diluted_blackbody(&mesh, 2.0e4, 1.0e-14);
        let gas = ionised_gas(1.0, 1.0e4);
        let elements = vec![hydrogen()];
        let mut bin = GrainBin::analytic(&silicate_config(), &small_grid(), &mesh).unwrap();
        bin.cnv_h_pcm3 = 1.0;
        bin.temperature = 20.0;
        let pops = solved(&mut bin, &mesh, &field, &gas, &elements);
        let env = ZoneEnvironment {
            zone: 0,
            mesh: &mesh,
            field: &field,
            gas: &gas,
            elements: &elements,
        };
        let budget = heat_budget(&mut bin, &env, &pops, &SolverConfig::default()).unwrap();
        assert!(budget.incident > 0.0);
        assert_eq!(budget.diffuse, 0.0);
        assert!(budget.photoelectric > 0.0);
        let t = budget.temperature.unwrap();
        assert!(t > bin.emissivity.t_min() && t < 1.0e3);
    }

    #[test]
    fn test_photoelectric_switch_and_scale() {
        let mesh = mesh();
        let field = RadiationField::diluted_blackbody(&mesh, 2.0e4, 1.0e-14);
        let gas = ionised_gas(1.0, 1.0e4);
        let elements = vec![hydrogen()];
        let mut bin = GrainBin::analytic(&silicate_config(), &small_grid(), &mesh).unwrap();
        bin.cnv_h_pcm3 = 1.0;
        let pops = solved(&mut bin, &mesh, &field, &gas, &elements);
        let env = ZoneEnvironment {
            zone: 0,
            mesh: &mesh,
            field: &field,
            gas: &gas,
            elements: &elements,
        };
        let base = heat_budget(&mut bin, &env, &pops, &SolverConfig::default()).unwrap();
        let scaled = SolverConfig {
            photoelectric_heating_scale: 2.0,
            ..SolverConfig::default()
        };
        let twice = heat_budget(&mut bin, &env, &pops, &scaled).unwrap();
        assert!((twice.photoelectric / base.photoelectric - 2.0).abs() < 1e-12);
        let off = SolverConfig {
            photoelectric_heating: false,
            ..SolverConfig::default()
        };
        assert_eq!(heat_budget(&mut bin, &env, &pops, &off).unwrap().photoelectric, 0.0);
    }

    #[test]
    fn test_constant_temperature_overrides_balance() {
        let mesh = mesh();
        let field = RadiationField::dark(mesh.len());
        let gas = ionised_gas(1.0, 1.0e4);
        let elements = vec![hydrogen()];
        let mut bin = GrainBin::analytic(&silicate_config(), &small_grid(), &mesh).unwrap();
        bin.cnv_h_pcm3 = 2.0;
        let pops = solved(&mut bin, &mesh, &field, &gas, &elements);
        let env = ZoneEnvironment {
            zone: 0,
            mesh: &mesh,
            field: &field,
            gas: &gas,
            elements: &elements,
        };
        let solver = SolverConfig {
            constant_temperature: Some(55.0),
            ..SolverConfig::default()
        };
        let budget = heat_budget(&mut bin, &env, &pops, &solver).unwrap();
        assert_eq!(budget.temperature, Some(55.0));
        let expected = bin.emissivity.emission_at(55.0) * 2.0;
        assert!((budget.grain_heat / expected - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_thermionic_cooling_of_hot_grain() {
        let mesh = mesh();
        let field = RadiationField::dark(mesh.len());
        let gas = ionised_gas(1.0, 1.0e4);
        let elements = vec![hydrogen()];
        let mut bin = GrainBin::analytic(&silicate_config(), &small_grid(), &mesh).unwrap();
        bin.cnv_h_pcm3 = 1.0;
        bin.temperature = 2500.0;
        let pops = solved(&mut bin, &mesh, &field, &gas, &elements);
        let env = ZoneEnvironment {
            zone: 0,
            mesh: &mesh,
            field: &field,
            gas: &gas,
            elements: &elements,
        };
        let budget = heat_budget(&mut bin, &env, &pops, &SolverConfig::default()).unwrap();
        assert!(budget.thermionic_cooling > 0.0);
        assert!(budget.thermionic > 0.0);
    }

    #[test]
    fn test_missing_abundance_rejected() {
        let mesh = mesh();
        let field = RadiationField::dark(mesh.len());
        let gas = ionised_gas(1.0, 1.0e4);
        let elements = vec![hydrogen()];
        let mut bin = GrainBin::analytic(&silicate_config(), &small_grid(), &mesh).unwrap();
        let env = ZoneEnvironment {
            zone: 0,
            mesh: &mesh,
            field: &field,
            gas: &gas,
            elements: &elements,
        };
        assert!(matches!(
            heat_budget(&mut bin, &env, &[1.0], &SolverConfig::default()),
            Err(GrainError::InvariantViolation(_))
        ));
    }
}
