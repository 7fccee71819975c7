// ─────────────────────────────────────────────────────────────────────
// SCPN Grain Core — Screening
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Coulomb and image-potential focusing factors for charged projectiles
//! hitting a charged grain (Draine & Sutin 1987, ApJ 320, 803).
//!
//! `eta` is the reduced collision rate J̃ (eqs. 3.3–3.5), `xi` is Λ̃/2, the
//! reduced energy deposition (eqs. 3.8–3.10).

use grain_types::constants::{BOLTZMANN, ELEM_CHARGE, LIMELM};
use std::f64::consts::PI;

/// Newton iteration cap for the reduced barrier position.
const THETA_NU_MAX_ITER: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Screening {
    pub eta: f64,
    pub xi: f64,
}

impl Screening {
    pub const NEUTRAL: Screening = Screening { eta: 1.0, xi: 1.0 };
}

/// Reduced height θ_ν of the potential barrier for a repelled projectile.
///
/// Solves 2ξ² − 1 = ν ξ (ξ² − 1)² for the barrier position ξ by Newton's
/// method and returns θ_ν = ν/ξ − 1/(2ξ²(ξ² − 1)). Zero for ν ≤ 0.
pub fn theta_nu(nu: f64) -> f64 {
    if nu <= 0.0 {
        return 0.0;
    }
    let rel_toler = 10.0 * f64::EPSILON;
    let mut xi = 1.0 + 1.0 / (3.0 * nu).sqrt();
    let mut xi2 = xi * xi;
    for _ in 0..THETA_NU_MAX_ITER {
        let old = xi;
        let f = 2.0 * xi2 - 1.0 - nu * xi * (xi2 - 1.0).powi(2);
        let dfdxi = 4.0 * xi - nu * ((5.0 * xi2 - 6.0) * xi2 + 1.0);
        xi -= f / dfdxi;
        xi2 = xi * xi;
        if (old - xi).abs() <= rel_toler * xi {
            break;
        }
    }
    nu / xi - 1.0 / (2.0 * xi2 * (xi2 - 1.0))
}

/// Focusing factors for a projectile of charge `ion` (−1 = electron) on a
/// grain of charge `grain_charge` with capacitance `capacitance` [F] in gas
/// at `gas_temperature` [K].
pub fn screening_factors(
    ion: i64,
    grain_charge: i64,
    capacitance: f64,
    gas_temperature: f64,
) -> Screening {
    if ion == 0 {
        return Screening::NEUTRAL;
    }
    let nu = grain_charge as f64 / ion as f64;
    let q = ion as f64 * ELEM_CHARGE;
    // k T in J over q²/C
    let tau = capacitance * BOLTZMANN * gas_temperature * 1.0e-7 / (q * q);

    if nu < 0.0 {
        Screening {
            eta: (1.0 - nu / tau) * (1.0 + (2.0 / (tau - 2.0 * nu)).sqrt()),
            xi: (1.0 - nu / (2.0 * tau)) * (1.0 + 1.0 / (tau - nu).sqrt()),
        }
    } else if nu == 0.0 {
        let s = (PI / (2.0 * tau)).sqrt();
        Screening {
            eta: 1.0 + s,
            xi: 1.0 + 0.75 * s,
        }
    } else {
        let theta = theta_nu(nu);
        let eta = (1.0 + 1.0 / (4.0 * tau + 3.0 * nu).sqrt()).powi(2) * (-theta / tau).exp();
        let s = (PI / (2.0 * tau)).sqrt();
        let r = (nu / tau).powf(0.75);
        // excess energy above the barrier, the barrier itself is added separately
        let excess = 0.25 * r / (r + ((25.0 + 3.0 * nu) / 5.0).powf(0.75))
            + (1.0 + 0.75 * s) / (1.0 + s);
        Screening {
            eta,
            xi: (excess.min(1.0) + theta / (2.0 * tau)) * eta,
        }
    }
}

/// Per-charge-state memo of screening factors, one slot per projectile
/// charge in −1..=LIMELM.
#[derive(Debug, Clone)]
pub struct ScreeningCache {
    slots: Vec<Option<Screening>>,
}

impl Default for ScreeningCache {
    fn default() -> Self {
        ScreeningCache {
            slots: vec![None; LIMELM + 2],
        }
    }
}

impl ScreeningCache {
    pub fn get_or_compute(
        &mut self,
        ion: i64,
        grain_charge: i64,
        capacitance: f64,
        gas_temperature: f64,
    ) -> Screening {
        let slot = (ion + 1) as usize;
        match self.slots.get(slot).copied().flatten() {
            Some(s) => s,
            None => {
                let s = screening_factors(ion, grain_charge, capacitance, gas_temperature);
                if let Some(cell) = self.slots.get_mut(slot) {
                    *cell = Some(s);
                }
                s
            }
        }
    }

    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|s| *s = None);
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }
}
