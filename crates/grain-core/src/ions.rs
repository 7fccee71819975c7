// ─────────────────────────────────────────────────────────────────────
// SCPN Grain Core — Grain-Ion Collisions
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Outcome of an ion striking a grain of fixed charge.
//!
//! Electrons hop one at a time between ion and grain while the transfer is
//! exothermic: the ion captures an electron when its recombination energy
//! exceeds the grain's surface threshold, the grain captures one when the
//! ionization potential lies below the threshold for an extra electron.

use crate::potential::Electrostatics;
use grain_types::state::Element;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IonOutcome {
    /// Ion stage leaving the grain.
    pub z0: usize,
    /// Energy [Ryd] deposited in the grain.
    pub recom_energy: f64,
    /// Chemical energy [Ryd] released by the transfer.
    pub chem_energy: f64,
}

/// Surface thresholds around charge `z`: `up[k]` for charge `z + k`
/// (tunneling included), `dn[k]` for charge `z - 1 - k` (incoming electron).
#[derive(Debug, Clone)]
struct SurfaceLadder {
    up: Vec<f64>,
    dn: [f64; 2],
}

impl SurfaceLadder {
    fn new(electro: &Electrostatics, z: i64, highest_stage: usize) -> Self {
        let up = (0..=highest_stage as i64)
            .map(|k| electro.values(z + k, true).thres_surf)
            .collect();
        SurfaceLadder {
            up,
            dn: [
                electro.values(z - 1, false).thres_surf,
                electro.values(z - 2, false).thres_surf,
            ],
        }
    }
}

/// Collision outcomes for every stage of every element, `[element][stage]`.
pub fn ion_outcomes(
    electro: &Electrostatics,
    z: i64,
    lowest_charge: i64,
    elements: &[Element],
) -> Vec<Vec<IonOutcome>> {
    let highest = elements.iter().map(Element::max_stage).max().unwrap_or(0);
    let ladder = SurfaceLadder::new(electro, z, highest);
    elements
        .iter()
        .map(|element| {
            (0..=element.max_stage())
                .map(|ion| collide(electro, z, lowest_charge, element, ion, &ladder))
                .collect()
        })
        .collect()
}

fn collide(
    electro: &Electrostatics,
    z: i64,
    lowest_charge: i64,
    element: &Element,
    start: usize,
    ladder: &SurfaceLadder,
) -> IonOutcome {
    let ip = &element.ionization_potentials;
    let mut ion = start;
    let mut recom_energy = 0.0;
    let mut chem_energy = 0.0;

    if ion > 0 && ip[ion - 1] > ladder.up[0] {
        // ion picks up electrons
        let mut phi_s = ladder.up[0];
        loop {
            recom_energy += ip[ion - 1] - phi_s;
            // single-electron hops overstate the binding of later electrons
            chem_energy += ip[ion - 1] - (phi_s - ladder.up[0]);
            ion -= 1;
            phi_s = ladder.up[start - ion];
            if !(ion > 0 && ip[ion - 1] > phi_s) {
                break;
            }
        }
    } else if ion <= element.index && z > lowest_charge && ip[ion] < ladder.dn[0] {
        // grain picks up electrons
        let mut zg = z;
        let mut phi_s = ladder.dn[0];
        loop {
            recom_energy += phi_s - ip[ion];
            chem_energy += -ip[ion] + (phi_s - ladder.dn[0]);
            ion += 1;
            zg -= 1;
            phi_s = match ion - start {
                k @ (0 | 1) => ladder.dn[k],
                _ => electro.values(zg - 1, false).thres_surf,
            };
            if !(ion <= element.index && zg > lowest_charge && ip[ion] < phi_s) {
                break;
            }
        }
    }

    IonOutcome {
        z0: ion,
        recom_energy,
        chem_energy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::tests::{graphite_config, silicate_config};
    use crate::properties::GrainProperties;

    fn hydrogen() -> Element {
        Element::new(0, 1.00794, vec![1.0]).unwrap()
    }

    #[test]
    fn test_proton_neutralised_on_grain() {
        let props = GrainProperties::new(&silicate_config(), true).unwrap();
        let out = ion_outcomes(&props.electro, 0, props.lowest_charge, &[hydrogen()]);
        let phi = props.electro.values(0, true).thres_surf;
        assert_eq!(out[0][1].z0, 0);
        assert!((out[0][1].recom_energy - (1.0 - phi)).abs() < 1e-12);
        assert!((out[0][1].chem_energy - 1.0).abs() < 1e-12);
        // neutral hydrogen bounces off unchanged
        assert_eq!(out[0][0], IonOutcome::default());
    }

    #[test]
    fn test_multiple_electron_transfer() {
        let props = GrainProperties::new(&silicate_config(), true).unwrap();
        let element = Element::new(2, 6.94, vec![0.5, 1.2, 1.9]).unwrap();
        let out = ion_outcomes(&props.electro, 0, props.lowest_charge, &[element]);
        // 1.9 and 1.2 Ryd exceed the ~0.6 Ryd threshold, 0.5 does not
        assert_eq!(out[0][3].z0, 1);
        assert!(out[0][3].recom_energy > 0.0);
        assert_eq!(out[0][1].z0, 1);
    }

    #[test]
    fn test_low_ionization_atom_charges_grain() {
        let props = GrainProperties::new(&graphite_config(), true).unwrap();
        let element = Element::new(2, 6.94, vec![0.1, 5.0, 9.0]).unwrap();
        let out = ion_outcomes(&props.electro, 0, props.lowest_charge, &[element]);
        assert_eq!(out[0][0].z0, 1);
        let phi_dn = props.electro.values(-1, false).thres_surf;
        assert!((out[0][0].recom_energy - (phi_dn - 0.1)).abs() < 1e-12);
        // impossible at the lowest charge
        let low = props.lowest_charge;
        let element = Element::new(2, 6.94, vec![0.1, 5.0, 9.0]).unwrap();
        let out = ion_outcomes(&props.electro, low, low, &[element]);
        assert_eq!(out[0][0].z0, 0);
    }
}
