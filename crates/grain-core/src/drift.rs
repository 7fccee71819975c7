// ─────────────────────────────────────────────────────────────────────
// SCPN Grain Core — Grain Drift
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Terminal drift velocity of grains pushed by radiation pressure through
//! the gas (Draine & Salpeter 1979, ApJ 231, 77, eq. 4).

use crate::bin::{GrainBin, ZoneEnvironment};
use grain_types::constants::{BOLTZMANN, EN1RYD, SPEEDLIGHT, TE1RYD};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const MAX_ITERATIONS: usize = 50;
const PRECISION: f64 = 1.0e-3;

/// Speed scale factors s = v · k / √T of the projectiles.
const S_PROTON: f64 = 7.755e-5;
const S_ELECTRON: f64 = 1.816e-6;
const S_HELIUM: f64 = 1.551e-4;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriftOutcome {
    /// [cm/s]
    pub velocity: f64,
    /// Momentum absorbed from the radiation field [dyn per cm^2 of grain surface].
    pub momentum: f64,
    pub iterations: usize,
    /// The drag force vanished or turned negative.
    pub negative_drag: bool,
}

/// Densities and potential entering the drag force.
#[derive(Debug, Clone, Copy)]
struct DragTerms {
    kt2: f64,
    sqrt_t: f64,
    protons: f64,
    electrons: f64,
    neutrals: f64,
    helium_ions: f64,
    phi2lm: f64,
}

impl DragTerms {
    fn new(env: &ZoneEnvironment, potential: f64) -> Self {
        let gas = env.gas;
        let psi = potential * TE1RYD / gas.temperature;
        let coulomb_log = if psi > 0.0 && gas.eden > 0.0 {
            let rdust = 1.0e-6;
            (20.702 / rdust / psi * gas.temperature.sqrt() / gas.eden.sqrt()).ln()
        } else {
            0.0
        };
        let he0 = gas.ion_density(env.elements, 1, 0);
        DragTerms {
            kt2: 2.0 * BOLTZMANN * gas.temperature,
            sqrt_t: gas.temperature.sqrt(),
            protons: env.ionised_hydrogen(),
            electrons: gas.eden,
            neutrals: env.atomic_hydrogen() + 1.1 * he0,
            helium_ions: gas.ion_density(env.elements, 1, 1),
            phi2lm: psi * psi * coulomb_log,
        }
    }

    /// Drag force per unit area [dyn cm^-2] at drift velocity `v`.
    fn force(&self, v: f64) -> f64 {
        let g = |scale: f64| {
            let s = v / self.sqrt_t * scale;
            let g0 = 1.5045 * s * (1.0 + 0.4418 * s * s).sqrt();
            let g2 = s / (1.329 + s.powi(3));
            (g0, g2)
        };
        let (g0p, g2p) = g(S_PROTON);
        let (g0e, g2e) = g(S_ELECTRON);
        let (g0h, g2h) = g(S_HELIUM);
        self.kt2
            * (self.protons * (g0p + self.phi2lm * g2p)
                + self.electrons * (g0e + self.phi2lm * g2e)
                + self.neutrals * g0p
                + self.helium_ions * (g0h + self.phi2lm * g2h))
    }
}

impl GrainBin {
    /// Iterate the drift velocity to the balance of radiation pressure and
    /// gas drag, starting from the previous velocity. The grain potential of
    /// the last equilibrium solution enters the Coulomb drag.
    pub fn update_drift(&mut self, env: &ZoneEnvironment) -> DriftOutcome {
        let field = env.field;
        let momentum = (0..field.len())
            .map(|i| field.summed(i) * env.mesh.anu[i] * self.optics.pressure_cs(i))
            .sum::<f64>()
            * EN1RYD
            * 4.0
            / self.props.int_area;
        let volmom = momentum / SPEEDLIGHT;
        let potential = self.last.as_ref().map_or(0.0, |r| r.potential);
        let drag = DragTerms::new(env, potential);

        let mut corr: f64 = 2.0;
        let mut iterations = 0;
        let mut negative_drag = false;
        while iterations < MAX_ITERATIONS && (corr - 1.0).abs() > PRECISION {
            let fdrag = drag.force(self.drift_velocity);
            if fdrag > 0.0 {
                corr = (volmom / fdrag).sqrt();
                self.drift_velocity *= corr;
            } else {
                corr = 1.0;
                negative_drag = true;
                self.drift_velocity = 0.0;
            }
            iterations += 1;
        }
        if negative_drag {
            warn!(bin = self.label(), "non-positive drag force on grains, drift set to zero");
        }
        debug!(bin = self.label(), velocity = self.drift_velocity, iterations, "grain drift");
        DriftOutcome {
            velocity: self.drift_velocity,
            momentum,
            iterations,
            negative_drag,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bin::tests::{mesh, small_grid};
    use crate::properties::tests::silicate_config;
    use crate::rates::tests::{hydrogen, ionised_gas};
    use grain_types::constants::DRIFT_VELOCITY_SEED;
    use grain_types::state::RadiationField;

    fn drift(field: &RadiationField) -> (DriftOutcome, f64) {
        let mesh = mesh();
        let gas = ionised_gas(1.0, 1.0e4);
        let elements = vec![hydrogen()];
        let env = ZoneEnvironment {
            zone: 0,
            mesh: &mesh,
            field,
            gas: &gas,
            elements: &elements,
        };
        let mut bin = GrainBin::analytic(&silicate_config(), &small_grid(), &mesh).unwrap();
        let out = bin.update_drift(&env);
        let residual = DragTerms::new(&env, 0.0).force(out.velocity) * SPEEDLIGHT / out.momentum;
        (out, residual)
    }

    #[test]
    fn test_radiation_pressure_balances_drag() {
        let mesh = mesh();
        let field = RadiationField::diluted_blackbody(&mesh, 3.0e4, 1.0e-12);
        let (out, residual) = drift(&field);
        assert!(!out.negative_drag);
        assert!(out.velocity > 0.0);
        assert!(out.iterations < MAX_ITERATIONS);
        assert!((residual - 1.0).abs() < 1e-2, "drag/pressure = {residual}");
    }

    #[test]
    fn test_stronger_field_drifts_faster() {
        let mesh = mesh();
        let weak = drift(&RadiationField::diluted_blackbody(&mesh, 3.0e4, 1.0e-14)).0;
        let strong = drift(&RadiationField::diluted_blackbody(&mesh, 3.0e4, 1.0e-12)).0;
        assert!(strong.velocity > weak.velocity);
    }

    #[test]
    fn test_dark_zone_stops_drift() {
        let mesh = mesh();
        let (out, _) = drift(&RadiationField::dark(mesh.len()));
        assert_eq!(out.momentum, 0.0);
        assert_eq!(out.velocity, 0.0);
        assert!(out.negative_drag);
    }

    #[test]
    fn test_seed_velocity() {
        let mesh = mesh();
        let bin = GrainBin::analytic(&silicate_config(), &small_grid(), &mesh).unwrap();
        assert_eq!(bin.drift_velocity, DRIFT_VELOCITY_SEED);
    }
}
