// ─────────────────────────────────────────────────────────────────────
// SCPN Grain Core — Charging Rates
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Electron emission and capture rates of a single charge state, per cm^2
//! of projected grain area. Thermionic emission scales with the full
//! surface and enters the emission rate with a factor 4.

use crate::charge_state::{ChargeState, EmissionSums, RecombinationSums, ThermionicRate};
use crate::optics::GrainOptics;
use crate::properties::{electron_speed, mean_speed, GrainProperties};
use grain_types::constants::{STICK_ION, TE1RYD, THERMCONST};
use grain_types::state::{Element, GasState, RadiationField};

/// Inputs shared by all rate evaluations of one bin in one solve.
#[derive(Debug, Clone, Copy)]
pub struct RateContext<'a> {
    pub props: &'a GrainProperties,
    pub optics: &'a GrainOptics,
    pub field: &'a RadiationField,
    pub gas: &'a GasState,
    pub elements: &'a [Element],
    pub ion_recombination: bool,
    /// Grain temperature [K]
    pub grain_temperature: f64,
}

/// Emission rate with its parts [cm^-2 s^-1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmissionRate {
    pub sums: EmissionSums,
    /// Thermionic part, 4 × the per-area rate.
    pub thermionic: f64,
}

impl EmissionRate {
    pub fn total(&self) -> f64 {
        self.sums.photo + self.sums.detachment + self.sums.ion + self.thermionic
    }
}

impl ChargeState {
    pub fn emission_rate(&mut self, ctx: &RateContext) -> EmissionRate {
        let sums = match self.emission {
            Some(sums) => sums,
            None => {
                let sums = self.emission_sums(ctx);
                self.emission = Some(sums);
                sums
            }
        };
        EmissionRate {
            sums,
            thermionic: 4.0 * self.thermionic_rate(ctx.props, ctx.grain_temperature),
        }
    }

    pub fn recombination_rate(&mut self, ctx: &RateContext) -> RecombinationSums {
        if let Some(sums) = self.recombination {
            return sums;
        }
        let gas = ctx.gas;
        let electron = if self.z > ctx.props.lowest_charge {
            let eta = self
                .screening
                .get_or_compute(-1, self.z, ctx.props.capacitance, gas.temperature)
                .eta;
            ctx.props.electron_sticking(self.z) * gas.eden * electron_speed(gas.temperature) * eta
        } else {
            0.0
        };
        let ion = if ctx.ion_recombination {
            self.ion_exchange(ctx, |ion, z0| z0.saturating_sub(ion))
        } else {
            0.0
        };
        let sums = RecombinationSums { electron, ion };
        self.recombination = Some(sums);
        sums
    }

    /// Richardson–Dushman emission per unit area [cm^-2 s^-1] at grain
    /// temperature `td`.
    pub fn thermionic_rate(&mut self, props: &GrainProperties, td: f64) -> f64 {
        if let Some(t) = self.thermionic.filter(|t| t.grain_temperature == td) {
            return t.rate;
        }
        let exponent = self.pot.thres_inf * TE1RYD / td;
        let rate = THERMCONST * props.thermionic_efficiency * td * td * (-exponent).exp();
        self.thermionic = Some(ThermionicRate {
            grain_temperature: td,
            rate,
        });
        rate
    }

    fn emission_sums(&mut self, ctx: &RateContext) -> EmissionSums {
        let n = ctx.field.len().min(self.yields.len());
        let area = ctx.props.projected_area();
        let photo = (self.ip_thres_inf_val..n)
            .map(|i| ctx.field.summed(i) * ctx.optics.abs_cs[i] * self.yields[i].yhat)
            .sum::<f64>()
            / area;
        let detachment = if self.z <= -1 {
            (self.ip_thres_inf..n)
                .map(|i| ctx.field.summed(i) * self.cs_pdt[i])
                .sum::<f64>()
                / area
        } else {
            0.0
        };
        let ion = if ctx.ion_recombination {
            self.ion_exchange(ctx, |ion, z0| ion.saturating_sub(z0))
        } else {
            0.0
        };
        EmissionSums {
            photo,
            detachment,
            ion,
        }
    }

    /// Σ_ion η(ion) Σ_elements n v̄ × electrons moved, where `moved(ion, z0)`
    /// counts the electrons transferred in the direction of interest.
    fn ion_exchange(&mut self, ctx: &RateContext, moved: impl Fn(usize, usize) -> usize) -> f64 {
        let gas = ctx.gas;
        let highest = ctx.elements.iter().map(Element::max_stage).max().unwrap_or(0);
        let mut total = 0.0;
        for ion in 0..=highest {
            let mut collisions = 0.0;
            for (k, element) in ctx.elements.iter().enumerate() {
                let Some(&density) = gas.ion_densities[k].get(ion) else {
                    continue;
                };
                if density <= 0.0 {
                    continue;
                }
                let electrons = moved(ion, self.outcome(k, ion).z0);
                if electrons > 0 {
                    collisions += STICK_ION
                        * density
                        * mean_speed(gas.temperature, element.atomic_weight)
                        * electrons as f64;
                }
            }
            if collisions > 0.0 {
                let eta = self
                    .screening
                    .get_or_compute(ion as i64, self.z, ctx.props.capacitance, gas.temperature)
                    .eta;
                total += collisions * eta;
            }
        }
        total
    }
}
