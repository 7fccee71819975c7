// ─────────────────────────────────────────────────────────────────────
// SCPN Grain Core — Collisional Exchange
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Energy exchanged between grains and gas particles striking them
//! (Baldwin et al. 1991, ApJ 374, 580, eqs. 29 and 32), and the ion stage
//! changes such collisions cause.
//!
//! Grain heating and gas cooling differ: recombination energy released on
//! the surface heats the grain but never came from the gas kinetic pool.

use crate::bin::{GrainBin, ZoneEnvironment};
use crate::charge_state::ChargeState;
use crate::properties::{electron_speed, mean_speed, GrainProperties};
use crate::rates::RateContext;
use grain_types::config::Composition;
use grain_types::constants::{
    ATOMIC_WEIGHT_C, ATOMIC_WEIGHT_H, ATOMIC_WEIGHT_O, BOLTZMANN, EN1EV, EN1RYD,
    H2_HEAT_CARBONACEOUS, H2_HEAT_SILICATE, STICK_ION,
};
use grain_types::error::{GrainError, GrainResult};
use grain_types::state::ChargeTransferMatrix;
use serde::{Deserialize, Serialize};

/// Collisional terms of one bin [erg cm^-3 s^-1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CollisionalExchange {
    /// Net heating of the grains.
    pub heat: f64,
    /// Cooling of the gas, zero when the exchange is switched off.
    pub cool: f64,
    /// Chemical energy of surface recombinations.
    pub chemical: f64,
    /// Heating by H2 formed on the surface.
    pub h2_formation: f64,
}

/// Per-state sums per cm^2 of projected area [erg cm^-2 s^-1].
#[derive(Debug, Clone, Copy, Default)]
struct StateExchange {
    heat: f64,
    cool: f64,
    chemical: f64,
}

/// H2 formation energy deposited in the grain [eV].
pub fn h2_formation_heat(composition: Composition) -> f64 {
    if composition.is_carbonaceous() {
        H2_HEAT_CARBONACEOUS
    } else {
        H2_HEAT_SILICATE
    }
}

pub fn collisional_exchange(
    bin: &mut GrainBin,
    env: &ZoneEnvironment,
    populations: &[f64],
    ion_recombination: bool,
    exchange_on: bool,
) -> GrainResult<CollisionalExchange> {
    let window = populations.len();
    if bin.states.len() < window {
        return Err(GrainError::InvariantViolation(format!(
            "bin {}: {window} populations but only {} cached states",
            bin.label(),
            bin.states.len()
        )));
    }
    let scale = bin.props.projected_area() * bin.cnv_h_pcm3;
    let td = bin.temperature;

    let GrainBin {
        props,
        optics,
        states,
        temperature,
        h2_formation_rate,
        ..
    } = &mut *bin;
    let props: &GrainProperties = props;
    let ctx = RateContext {
        props,
        optics,
        field: env.field,
        gas: env.gas,
        elements: env.elements,
        ion_recombination,
        grain_temperature: *temperature,
    };

    let mut heat_tot = 0.0;
    let mut cool_tot = 0.0;
    let mut chemical = 0.0;
    let mut correction = 0.0;
    for (state, &pop) in states[..window].iter_mut().zip(populations) {
        let one = state_exchange(state, props, env, td);
        heat_tot += pop * one.heat;
        cool_tot += pop * one.cool;
        chemical += pop * one.chemical;

        // the n-state model does not balance charge exactly; book the
        // residual potential energy on the grain
        let up = state.emission_rate(&ctx).total();
        let dn = state.recombination_rate(&ctx);
        let dn = dn.electron + dn.ion;
        correction += pop
            * (up * (state.pot.thres_surf + state.pot.pot_surf)
                - dn * (state.inc.thres_surf + state.inc.pot_surf))
            * EN1RYD;
    }

    // molecules are neutral: no screening, no charge dependence
    let gas = env.gas;
    let kt2 = 2.0 * BOLTZMANN * gas.temperature;
    let kt2_grain = 2.0 * BOLTZMANN * td;
    let w_h2 = 2.0 * ATOMIC_WEIGHT_H;
    let w_co = ATOMIC_WEIGHT_C + ATOMIC_WEIGHT_O;
    let mol_rate = props.accommodation(w_h2) * gas.h2_density * mean_speed(gas.temperature, w_h2)
        + props.accommodation(w_co) * gas.co_density * mean_speed(gas.temperature, w_co);
    let h2_energy = if scale > 0.0 {
        *h2_formation_rate * env.atomic_hydrogen() * h2_formation_heat(props.composition) * EN1EV
            / scale
    } else {
        0.0
    };
    let mol_cool = mol_rate * (kt2 - kt2_grain);
    heat_tot += mol_cool + h2_energy + correction;
    cool_tot += mol_cool;

    Ok(CollisionalExchange {
        heat: heat_tot * scale,
        cool: if exchange_on { cool_tot * scale } else { 0.0 },
        chemical: chemical * scale,
        h2_formation: h2_energy * scale,
    })
}

fn state_exchange(
    state: &mut ChargeState,
    props: &GrainProperties,
    env: &ZoneEnvironment,
    td: f64,
) -> StateExchange {
    let gas = env.gas;
    let t = gas.temperature;
    let kt2 = 2.0 * BOLTZMANN * t;
    let kt2_grain = 2.0 * BOLTZMANN * td;
    let highest = env.elements.iter().map(|e| e.max_stage()).max().unwrap_or(0);
    let mut sum = StateExchange::default();

    for ion in 0..=highest {
        let mut rate = 0.0;
        let mut cool_pot = 0.0;
        let mut cool_pot_gas = 0.0;
        let mut heat_rec = 0.0;
        let mut heat_chem = 0.0;
        for (k, element) in env.elements.iter().enumerate() {
            let density = gas.ion_densities[k].get(ion).copied().unwrap_or(0.0);
            if density <= 0.0 {
                continue;
            }
            let out = state.outcome(k, ion);
            let stick = if ion == out.z0 {
                props.accommodation(element.atomic_weight)
            } else {
                STICK_ION
            };
            let one = stick * density * mean_speed(t, element.atomic_weight);
            let pot = if ion >= out.z0 {
                state.pot.pot_surf
            } else {
                state.inc.pot_surf
            };
            rate += one;
            cool_pot += one * ion as f64 * pot;
            cool_pot_gas += one * out.z0 as f64 * pot;
            heat_rec += one * out.recom_energy;
            heat_chem += one * out.chem_energy;
        }
        if rate <= 0.0 {
            continue;
        }
        let s = state
            .screening
            .get_or_compute(ion as i64, state.z, props.capacitance, t);
        let heat_coll = rate * kt2 * s.xi;
        let emitted = rate * kt2_grain * s.eta;
        let to_erg = s.eta * EN1RYD;
        sum.heat += heat_coll - cool_pot * to_erg + heat_rec * to_erg - emitted;
        sum.cool += heat_coll - emitted - cool_pot_gas * to_erg;
        sum.chemical += heat_chem * to_erg;
    }

    let rate = props.electron_sticking(state.z) * gas.eden * electron_speed(t);
    if rate > 0.0 {
        let s = state.screening.get_or_compute(-1, state.z, props.capacitance, t);
        let heat_coll = rate * kt2 * s.xi;
        if state.z > props.lowest_charge {
            let cool_pot = -rate * state.inc.pot_surf * s.eta * EN1RYD;
            let heat_rec = rate * state.inc.thres_surf * s.eta * EN1RYD;
            sum.heat += heat_coll - cool_pot + heat_rec;
            sum.cool += heat_coll;
        } else {
            // captured into an autoionising state and re-emitted
            let bounce =
                (rate * (-state.inc.thres_surf - state.inc.pot_surf) * EN1RYD * s.eta).max(0.0);
            sum.heat += heat_coll - bounce;
            sum.cool += heat_coll - bounce;
        }
    }
    sum
}

/// Ion stage changes [s^-1] caused by collisions with the grains of `bin`.
pub fn charge_transfer(
    bin: &mut GrainBin,
    env: &ZoneEnvironment,
    populations: &[f64],
) -> ChargeTransferMatrix {
    let mut matrix = ChargeTransferMatrix::zeros(env.elements);
    let scale = bin.props.projected_area() * bin.cnv_h_pcm3;
    let t = env.gas.temperature;
    let capacitance = bin.props.capacitance;
    for (state, &pop) in bin.states.iter_mut().zip(populations) {
        for (k, element) in env.elements.iter().enumerate() {
            let speed = mean_speed(t, element.atomic_weight);
            for ion in 0..=element.max_stage() {
                let z0 = state.outcome(k, ion).z0;
                if z0 == ion {
                    continue;
                }
                let eta = state
                    .screening
                    .get_or_compute(ion as i64, state.z, capacitance, t)
                    .eta;
                matrix.rates[k][[ion, z0]] += eta * pop * STICK_ION * scale * speed;
            }
        }
    }
    matrix
}
