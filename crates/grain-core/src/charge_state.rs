// ─────────────────────────────────────────────────────────────────────
// SCPN Grain Core — Charge State
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Everything that depends on the charge of one grain state: thresholds,
//! photoemission yields, photodetachment and heating factors, ion collision
//! outcomes, plus the memoised rates evaluated from them.

use crate::ions::{ion_outcomes, IonOutcome};
use crate::optics::GrainOptics;
use crate::potential::PotentialValues;
use crate::properties::GrainProperties;
use crate::screening::ScreeningCache;
use crate::yields::{CellYield, PhotoTables};
use grain_math::search::first_above;
use grain_types::constants::EVRYD;
use grain_types::state::{Element, EnergyMesh};

/// Photodetachment cross-section scale [cm^2] (WD01 eq. 20).
const CS_PDT: f64 = 1.2e-17;

/// Partial sums of the electron emission rate [cm^-2 s^-1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmissionSums {
    /// Valence and inner-shell photoemission.
    pub photo: f64,
    /// Photodetachment of attached electrons.
    pub detachment: f64,
    /// Ions picking up electrons.
    pub ion: f64,
}

/// Partial sums of the electron capture rate [cm^-2 s^-1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecombinationSums {
    pub electron: f64,
    pub ion: f64,
}

/// Thermionic emission rate per unit grain area, tagged with the grain
/// temperature it was evaluated at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThermionicRate {
    pub grain_temperature: f64,
    pub rate: f64,
}

#[derive(Debug, Clone)]
pub struct ChargeState {
    pub z: i64,
    pub pot: PotentialValues,
    /// Values of charge `z - 1` without tunneling, seen by incoming electrons.
    pub inc: PotentialValues,
    pub ip_thres_inf: usize,
    pub ip_thres_inf_val: usize,
    pub yields: Vec<CellYield>,
    /// Photodetachment cross-section per H [cm^2], zero unless `z <= -1`.
    pub cs_pdt: Vec<f64>,
    /// Heating of the grain per absorbed photon flux, σ·hν minus losses.
    pub fac1: Vec<f64>,
    /// Energy carried off by photoelectrons into the gas.
    pub fac2: Vec<f64>,
    /// Ion collision outcomes, `[element][stage]`.
    pub ions: Vec<Vec<IonOutcome>>,
    pub(crate) screening: ScreeningCache,
    pub(crate) emission: Option<EmissionSums>,
    pub(crate) recombination: Option<RecombinationSums>,
    pub(crate) thermionic: Option<ThermionicRate>,
    /// Heating by the direct field, valid within one zone.
    pub(crate) hcon1: Option<f64>,
    /// Heating by the diffuse field.
    pub(crate) hots1: Option<f64>,
    pub(crate) pe1: Option<f64>,
}

impl ChargeState {
    pub fn new(
        z: i64,
        props: &GrainProperties,
        tables: &PhotoTables,
        mesh: &EnergyMesh,
        optics: &GrainOptics,
        elements: &[Element],
    ) -> Self {
        let n = mesh.len();
        let anu = &mesh.anu;
        let pot = props.electro.values(z, true);
        let inc = props.electro.values(z - 1, false);
        let grid = anu.to_vec();
        let ip_thres_inf_val = first_above(&grid, pot.thres_inf_val);
        let ip_thres_inf = first_above(&grid, pot.thres_inf);

        let mut yields = vec![CellYield::default(); n];
        for (i, y) in yields.iter_mut().enumerate().skip(ip_thres_inf_val) {
            *y = tables.cell_yield(props, anu[i], i, z, &pot);
        }

        let mut cs_pdt = vec![0.0; n];
        if z <= -1 {
            let c1 = -CS_PDT * z as f64;
            for (i, cs) in cs_pdt.iter_mut().enumerate().skip(ip_thres_inf) {
                let x = (anu[i] - pot.thres_inf) * (EVRYD / 3.0);
                let sigma = c1 * x / (1.0 + x * x / 3.0).powi(2);
                // per H at standard depletion, like the optics
                *cs = sigma.max(0.0) * props.cnv_gr_ph;
            }
        }

        let mut fac1 = vec![0.0; n];
        let mut fac2 = vec![0.0; n];
        for i in ip_thres_inf..n {
            let (cs1, ehat1, cool1) = if i >= ip_thres_inf_val {
                let ehat = yields[i].ehat;
                let thres = if z <= -1 {
                    pot.thres_surf
                } else {
                    pot.thres_surf_val
                };
                (optics.abs_cs[i] * yields[i].yhat, ehat, thres + pot.pot_surf + ehat)
            } else {
                (0.0, 0.0, 0.0)
            };
            let (cs2, ehat2, cool2) = if z <= -1 {
                (cs_pdt[i], anu[i] - pot.thres_surf - pot.pot_surf, anu[i])
            } else {
                (0.0, 0.0, 0.0)
            };
            let cs_tot = optics.abs_cs[i] + cs2;
            fac1[i] = cs_tot * anu[i] - cs1 * cool1 - cs2 * cool2;
            fac2[i] = cs1 * ehat1 + cs2 * ehat2;
        }

        ChargeState {
            z,
            pot,
            inc,
            ip_thres_inf,
            ip_thres_inf_val,
            yields,
            cs_pdt,
            fac1,
            fac2,
            ions: ion_outcomes(&props.electro, z, props.lowest_charge, elements),
            screening: ScreeningCache::default(),
            emission: None,
            recombination: None,
            thermionic: None,
            hcon1: None,
            hots1: None,
            pe1: None,
        }
    }

    /// Drop rate sums and diffuse-field heating; kept thresholds and yields
    /// stay valid for the whole run.
    pub fn invalidate_rates(&mut self) {
        self.emission = None;
        self.recombination = None;
        self.thermionic = None;
        self.hots1 = None;
        self.pe1 = None;
    }

    pub fn invalidate_screening(&mut self) {
        self.screening.clear();
    }

    pub fn invalidate_incident_heating(&mut self) {
        self.hcon1 = None;
    }

    /// Ion collision outcome, the identity for stages outside the table.
    pub fn outcome(&self, element: usize, stage: usize) -> IonOutcome {
        self.ions
            .get(element)
            .and_then(|stages| stages.get(stage))
            .copied()
            .unwrap_or(IonOutcome {
                z0: stage,
                ..IonOutcome::default()
            })
    }
}
