// ─────────────────────────────────────────────────────────────────────
// SCPN Grain Core — Abundance Depth Law
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Grain abundance relative to standard depletion as a function of the
//! local conditions.

use crate::bin::{GrainBin, ZoneEnvironment};
use grain_types::config::{Composition, DepthLaw, PahAbundanceLaw};
use grain_types::constants::DEPTH_SCALE_FLOOR;

/// Depth factor of a bin with the given law, floored at [`DEPTH_SCALE_FLOOR`].
///
/// `grain_temperature` is the last known temperature of the bin; only the
/// sublimation law reads it.
pub fn depth_factor(
    law: DepthLaw,
    composition: Composition,
    pah_law: PahAbundanceLaw,
    sublimation_temperature: Option<f64>,
    grain_temperature: f64,
    env: &ZoneEnvironment,
) -> f64 {
    let hden = env.gas.hden;
    let fraction = |n: f64| if hden > 0.0 { n / hden } else { 0.0 };
    let value = match law {
        DepthLaw::Standard if composition == Composition::Pah => match pah_law {
            PahAbundanceLaw::AtomicHydrogen => fraction(env.atomic_hydrogen()),
            PahAbundanceLaw::NeutralHydrogen => {
                fraction(env.atomic_hydrogen() + 2.0 * env.gas.h2_density)
            }
            PahAbundanceLaw::Constant => 1.0,
        },
        DepthLaw::Standard => 1.0,
        DepthLaw::AtomicFraction => fraction(env.atomic_hydrogen()),
        DepthLaw::Sublimation => match sublimation_temperature {
            Some(t_sub) => (-(grain_temperature / t_sub).powi(3)).exp(),
            None => 1.0,
        },
    };
    value.max(DEPTH_SCALE_FLOOR)
}

impl GrainBin {
    /// Depth factor of this bin in `env`.
    pub fn depth_factor(&self, pah_law: PahAbundanceLaw, env: &ZoneEnvironment) -> f64 {
        depth_factor(
            self.depth_law,
            self.props.composition,
            pah_law,
            self.sublimation_temperature,
            self.temperature,
            env,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rates::tests::hydrogen;
    use grain_types::state::{EnergyMesh, GasState, RadiationField};

    fn gas(h0: f64, hplus: f64, h2: f64) -> GasState {
        GasState {
            temperature: 100.0,
            eden: hplus,
            hden: h0 + hplus + 2.0 * h2,
            h2_density: h2,
            co_density: 0.0,
            total_cooling: 1.0e-22,
            ion_densities: vec![vec![h0, hplus]],
        }
    }

    fn factor(law: DepthLaw, composition: Composition, pah_law: PahAbundanceLaw, g: &GasState) -> f64 {
        let mesh = EnergyMesh::geometric(1.0e-3, 10.0, 10).unwrap();
        let field = RadiationField::dark(mesh.len());
        let elements = vec![hydrogen()];
        let env = ZoneEnvironment {
            zone: 0,
            mesh: &mesh,
            field: &field,
            gas: g,
            elements: &elements,
        };
        depth_factor(law, composition, pah_law, Some(1500.0), 20.0, &env)
    }

    #[test]
    fn test_standard_law_is_unity_for_classical_grains() {
        let g = gas(0.0, 1.0, 0.0);
        for c in [Composition::Silicate, Composition::Carbonaceous] {
            assert_eq!(factor(DepthLaw::Standard, c, PahAbundanceLaw::AtomicHydrogen, &g), 1.0);
        }
    }

    #[test]
    fn test_pah_laws_follow_hydrogen_fractions() {
        let g = gas(0.5, 0.3, 0.1);
        let pah = Composition::Pah;
        let h0 = factor(DepthLaw::Standard, pah, PahAbundanceLaw::AtomicHydrogen, &g);
        assert!((h0 - 0.5).abs() < 1e-12);
        let neutral = factor(DepthLaw::Standard, pah, PahAbundanceLaw::NeutralHydrogen, &g);
        assert!((neutral - 0.7).abs() < 1e-12);
        assert_eq!(factor(DepthLaw::Standard, pah, PahAbundanceLaw::Constant, &g), 1.0);
    }

    #[test]
    fn test_fully_ionised_gas_hits_floor() {
        let g = gas(0.0, 1.0, 0.0);
        let f = factor(DepthLaw::AtomicFraction, Composition::Silicate, PahAbundanceLaw::Constant, &g);
        assert_eq!(f, DEPTH_SCALE_FLOOR);
        let pah = factor(DepthLaw::Standard, Composition::Pah, PahAbundanceLaw::AtomicHydrogen, &g);
        assert_eq!(pah, DEPTH_SCALE_FLOOR);
    }

    #[test]
    fn test_sublimation_law() {
        let g = gas(1.0, 0.0, 0.0);
        let f = factor(DepthLaw::Sublimation, Composition::Silicate, PahAbundanceLaw::Constant, &g);
        let expected = (-(20.0f64 / 1500.0).powi(3)).exp();
        assert!((f - expected).abs() < 1e-15);
        assert!(f < 1.0);
    }
}
