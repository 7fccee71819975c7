// ─────────────────────────────────────────────────────────────────────
// SCPN Grain Core — Grain Electrostatics
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Ionization thresholds and surface potentials of a charged grain
//! (Weingartner & Draine 2001, ApJS 134, 263, eqs. 2–4), including the
//! Schottky barrier lowering of negative grains and its tunneling correction.

use crate::screening::theta_nu;
use grain_types::constants::{AC0, AC1G, AC2G, ELEM_CHARGE, EVRYD};

/// Energies [Ryd] governing electron removal from a grain of fixed charge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PotentialValues {
    /// Energy to move the least bound electron to infinity.
    pub thres_inf: f64,
    /// Same for a valence-band electron.
    pub thres_inf_val: f64,
    /// Energy to move the least bound electron to the grain surface.
    pub thres_surf: f64,
    pub thres_surf_val: f64,
    /// Potential at the surface.
    pub pot_surf: f64,
    /// Barrier lowering for negative grains (≤ 0).
    pub emin: f64,
}

/// Electrostatic description of one grain bin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Electrostatics {
    /// Bulk work function [Ryd]
    pub work_function: f64,
    /// Band gap [Ryd]
    pub band_gap: f64,
    /// Grain radius [cm]
    pub radius: f64,
    /// Potential of one elementary charge, e/C [Ryd]
    pub one_elec: f64,
    pub carbonaceous: bool,
}

impl Electrostatics {
    pub fn new(
        work_function: f64,
        band_gap: f64,
        radius: f64,
        capacitance: f64,
        carbonaceous: bool,
    ) -> Self {
        Electrostatics {
            work_function,
            band_gap,
            radius,
            one_elec: ELEM_CHARGE / EVRYD / capacitance,
            carbonaceous,
        }
    }

    /// Grain potential [Ryd] seen by an electron leaving a grain of charge `z`.
    pub fn chrg2pot(&self, z: f64) -> f64 {
        (z + 1.0) * self.one_elec
    }

    pub fn values(&self, z: i64, tunnel: bool) -> PotentialValues {
        let dz = z as f64;
        let pot = self.chrg2pot(dz);
        let oe = self.one_elec;
        // O(a^-2) small-grain corrections
        let mut ip_v = self.work_function + pot - 0.5 * oe + (dz + 2.0) * AC0 / self.radius * oe;

        if z <= -1 {
            let mut ip = self.work_function - self.band_gap + pot - 0.5 * oe;
            if self.carbonaceous {
                ip -= AC1G / (self.radius + AC2G) * oe;
            }
            // valence electrons are never less bound than attached ones
            ip_v = ip_v.max(ip);
            let emin = if z < -1 {
                let help = (dz + 1.0).abs();
                let mut emin = -theta_nu(help) * oe;
                if tunnel {
                    emin *= 1.0 - 2.124e-4 / (self.radius.powf(0.45) * help.powf(0.26));
                }
                emin
            } else {
                0.0
            };
            PotentialValues {
                thres_inf: ip - emin,
                thres_inf_val: ip_v - emin,
                thres_surf: ip - emin,
                thres_surf_val: ip_v - emin,
                pot_surf: emin,
                emin,
            }
        } else {
            PotentialValues {
                thres_inf: ip_v,
                thres_inf_val: ip_v,
                thres_surf: ip_v - pot,
                thres_surf_val: ip_v - pot,
                pot_surf: pot,
                emin: 0.0,
            }
        }
    }

    /// Lowest charge a grain can hold: the autoionization limit of
    /// WD01 eqs. 23–24, raised until the thermionic exponent stays ≤ 0.
    pub fn lowest_charge(&self) -> i64 {
        let a_nm = self.radius * 1.0e7;
        let limit = if self.carbonaceous {
            -(1.2 * a_nm * a_nm + 3.9 * a_nm + 0.2) / 1.44
        } else {
            -(0.7 * a_nm * a_nm + 2.5 * a_nm + 0.8) / 1.44
        };
        let low1 = limit.ceil() as i64;

        let mut low2 = low1;
        if self.values(low2, true).thres_inf < 0.0 {
            let mut low3 = 0_i64;
            while low3 - low2 > 1 {
                let mid = (low2 + low3).div_euclid(2);
                if self.values(mid, true).thres_inf < 0.0 {
                    low2 = mid;
                } else {
                    low3 = mid;
                }
            }
            low2 = low3;
        }
        low1.max(low2)
    }
}
