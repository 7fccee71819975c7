// ─────────────────────────────────────────────────────────────────────
// SCPN Grain Core — Photoelectric Yields
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Photoelectric yield model.
//!
//! Valence-band yields follow Weingartner & Draine (2001, WD01). With Auger
//! data the X-ray treatment of Weingartner, Draine & Barr (2006, WDB06)
//! adds inner-shell primaries, Auger electrons and secondaries:
//!
//! - `y0`: bulk yield (WD01 eq. 16, WDB06 eq. 9)
//! - `y1`: small-grain geometric enhancement (WDB06 eq. 6)
//! - `y2`: fraction of electrons able to escape the grain potential
//!   (WDB06 eqs. 8, 20–21), with the mean energy at infinity

use crate::auger::AugerTable;
use crate::optics::{ElementCrossSections, GrainOptics};
use crate::potential::PotentialValues;
use crate::properties::GrainProperties;
use grain_math::search::first_above;
use grain_types::config::{Composition, ElementAbundance};
use grain_types::constants::{ETILDE, EVRYD};
use grain_types::error::{GrainError, GrainResult};
use grain_types::state::EnergyMesh;

/// 1 / ln(50/20), blending WD01 into WDB06 between 20 and 50 eV.
const INV_LOG_BLEND: f64 = 1.091_356_667_937_291_5;

/// One Auger line of an inner shell.
#[derive(Debug, Clone)]
pub struct AugerLine {
    /// Electron energy [Ryd]
    pub energy: f64,
    pub avg_number: f64,
    /// y0·y1 per photon cell, scaled by `avg_number`.
    pub y01: Vec<f64>,
}

/// Photo-absorption channel: index 0 is the valence band, the rest are
/// inner shells with Auger data.
#[derive(Debug, Clone)]
pub struct ShellData {
    /// Ionization potential [Ryd]
    pub ion_pot: f64,
    /// First photon cell able to ionize this shell.
    pub ip_lo: usize,
    /// Probability that an absorbed photon ionizes this shell.
    pub p: Vec<f64>,
    pub y01: Vec<f64>,
    pub auger: Vec<AugerLine>,
}

/// Charge-independent yield tables of one bin.
#[derive(Debug, Clone)]
pub struct PhotoTables {
    pub shells: Vec<ShellData>,
    /// WDB06 valence-band y0.
    pub y0b06: Vec<f64>,
    /// Inverse attenuation length [cm^-1], above 20 eV replaced by the
    /// shell-summed absorption in the X-ray treatment.
    pub inv_att_len: Vec<f64>,
}

/// Yields of one charge state in one photon cell.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CellYield {
    pub yhat: f64,
    pub yhat_primary: f64,
    /// Mean kinetic energy at infinity of the ejected electrons [Ryd]
    pub ehat: f64,
}

impl PhotoTables {
    pub fn new(
        props: &GrainProperties,
        mesh: &EnergyMesh,
        optics: &GrainOptics,
        cross_sections: &ElementCrossSections,
        auger: Option<&AugerTable>,
        abundances: &[ElementAbundance],
    ) -> GrainResult<Self> {
        let n = mesh.len();
        if optics.len() != n {
            return Err(GrainError::ConfigError(format!(
                "bin {}: optics have {} cells, mesh has {n}",
                props.label,
                optics.len()
            )));
        }
        let anu = mesh.anu.to_vec();

        let work_function = props.electro.work_function;
        let lowest = props.electro.values(props.lowest_charge, true);
        let mut shells = vec![ShellData {
            ion_pot: work_function,
            ip_lo: first_above(&anu, lowest.thres_inf_val),
            p: vec![0.0; n],
            y01: vec![0.0; n],
            auger: Vec::new(),
        }];

        let norm = props.cnv_h_pgr / props.volume;
        let present: Vec<&ElementAbundance> =
            abundances.iter().filter(|a| a.atoms_per_h > 0.0).collect();

        // inner shells are the subshells with Auger data, Li and up
        let mut inner: Vec<(usize, usize, f64)> = Vec::new();
        if !props.wd01 {
            let table = auger.ok_or_else(|| {
                GrainError::ConfigError(format!(
                    "bin {}: X-ray yields need Auger data",
                    props.label
                ))
            })?;
            for ab in present.iter().filter(|a| a.element >= 2) {
                let data = table.get(ab.element).ok_or_else(|| {
                    GrainError::DataFormat(format!(
                        "bin {}: no Auger data for element {}",
                        props.label, ab.element
                    ))
                })?;
                for (ns, shell) in data.shells.iter().enumerate() {
                    if cross_sections.shells(ab.element).get(ns).is_none() {
                        return Err(GrainError::ConfigError(format!(
                            "bin {}: no cross-section for element {} subshell {ns}",
                            props.label, ab.element
                        )));
                    }
                    inner.push((ab.element, ns, ab.atoms_per_h));
                    shells.push(ShellData {
                        ion_pot: shell.threshold,
                        ip_lo: first_above(&anu, shell.threshold),
                        p: vec![0.0; n],
                        y01: vec![0.0; n],
                        auger: shell
                            .energies
                            .iter()
                            .zip(&shell.avg_numbers)
                            .map(|(&energy, &avg_number)| AugerLine {
                                energy,
                                avg_number,
                                y01: vec![0.0; n],
                            })
                            .collect(),
                    });
                }
            }
        }

        let mut total = vec![0.0; n];
        if !props.wd01 {
            for ab in &present {
                let skip = auger
                    .and_then(|t| t.get(ab.element))
                    .map_or(0, |d| d.shells.len());
                for cs in cross_sections.shells(ab.element).iter().skip(skip) {
                    for i in shells[0].ip_lo..n {
                        shells[0].p[i] += norm * ab.atoms_per_h * cs[i] * 1.0e-18;
                    }
                }
            }
        }
        for i in shells[0].ip_lo..n {
            total[i] += shells[0].p[i];
        }
        for (shell, &(element, ns, abund)) in shells.iter_mut().skip(1).zip(&inner) {
            let cs = &cross_sections.shells(element)[ns];
            for i in shell.ip_lo..n {
                shell.p[i] = norm * abund * cs[i] * 1.0e-18;
                total[i] += shell.p[i];
            }
        }

        let mut inv_att_len = optics.inv_att_len.to_vec();
        if !props.wd01 {
            // WDB06 eq. 10
            for i in 0..n {
                if anu[i] > 20.0 / EVRYD && total[i] > 0.0 {
                    inv_att_len[i] = total[i];
                }
            }
        }

        for (ns, shell) in shells.iter_mut().enumerate() {
            for i in shell.ip_lo..n {
                if total[i] > 0.0 {
                    shell.p[i] /= total[i];
                } else {
                    shell.p[i] = if ns == 0 { 1.0 } else { 0.0 };
                }
            }
        }

        let mut y0b06 = vec![0.0; n];
        for (ns, shell) in shells.iter_mut().enumerate() {
            for i in shell.ip_lo..n {
                let elec_en = (anu[i] - shell.ion_pot).max(0.0);
                let y0 = y0psa(props, shell.p[i], inv_att_len[i], elec_en);
                let y1 = y1psa(props, inv_att_len[i], elec_en);
                if ns == 0 {
                    y0b06[i] = y0;
                    shell.y01[i] = y1;
                } else {
                    shell.y01[i] = y0 * y1;
                }
            }
            if ns > 0 {
                let (ip_lo, p) = (shell.ip_lo, &shell.p);
                for line in &mut shell.auger {
                    for i in ip_lo..n {
                        line.y01[i] = line.avg_number
                            * y0psa(props, p[i], inv_att_len[i], line.energy)
                            * y1psa(props, inv_att_len[i], line.energy);
                    }
                }
            }
        }

        Ok(PhotoTables {
            shells,
            y0b06,
            inv_att_len,
        })
    }

    /// Total yield and mean electron energy of a grain of charge `z` for
    /// photons in cell `i`; zero below the valence threshold.
    pub fn cell_yield(
        &self,
        props: &GrainProperties,
        anu: f64,
        i: usize,
        z: i64,
        pv: &PotentialValues,
    ) -> CellYield {
        let elo = -pv.pot_surf;
        let grain_pot = props.electro.chrg2pot(z as f64);
        let (mut yp, mut ya, mut ys) = (0.0, 0.0, 0.0);
        let (mut eyp, mut eya, mut eys) = (0.0, 0.0, 0.0);

        let band = &self.shells[0];
        let ehi_band = anu - pv.thres_inf_val - pv.emin;
        let wcorr = pv.thres_inf_val + pv.emin - grain_pot;
        let eel = anu - props.electro.work_function;
        let y0 = self.y0b(props, anu, i, pv.thres_surf_val);
        let e = escape_yields(props, z, y0 * band.y01[i], band.p[i], elo, ehi_band, eel);
        yp += e.primary;
        ys += e.secondary;
        eyp += e.primary * e.primary_energy;
        eys += e.secondary * e.secondary_energy;

        for shell in self.shells.iter().skip(1).filter(|s| i >= s.ip_lo) {
            let ehi = ehi_band + wcorr - shell.ion_pot;
            let eel = anu - shell.ion_pot;
            let e = escape_yields(props, z, shell.y01[i], shell.p[i], elo, ehi, eel);
            yp += e.primary;
            ys += e.secondary;
            eyp += e.primary * e.primary_energy;
            eys += e.secondary * e.secondary_energy;

            for line in &shell.auger {
                let max = line.avg_number * shell.p[i];
                let ehi = line.energy - grain_pot;
                let e = escape_yields(props, z, line.y01[i], max, elo, ehi, line.energy);
                ya += e.primary;
                ys += e.secondary;
                eya += e.primary * e.primary_energy;
                eys += e.secondary * e.secondary_energy;
            }
        }

        let yhat = yp + ya + ys;
        CellYield {
            yhat,
            yhat_primary: yp.min(1.0),
            ehat: if yhat > 0.0 {
                (eyp + eya + eys) / yhat
            } else {
                0.0
            },
        }
    }

    /// Valence-band y0, blending WD01 into WDB06 between 20 and 50 eV.
    fn y0b(&self, props: &GrainProperties, anu: f64, i: usize, thres_surf_val: f64) -> f64 {
        if props.wd01 || anu <= 20.0 / EVRYD {
            return y0b01(props, anu, thres_surf_val);
        }
        if anu < 50.0 / EVRYD {
            let y0a = y0b01(props, anu, thres_surf_val);
            let y0b = self.y0b06[i];
            if y0a <= 0.0 || y0b <= 0.0 {
                return 0.0;
            }
            let frac = (anu * (EVRYD / 20.0)).ln() * INV_LOG_BLEND;
            y0a * ((y0b / y0a).ln() * frac).exp()
        } else {
            self.y0b06[i]
        }
    }
}

/// WD01 eq. 16 bulk yield of band electrons; carbonaceous grains follow
/// Bakes & Tielens (1994).
pub fn y0b01(props: &GrainProperties, anu: f64, thres_surf_val: f64) -> f64 {
    let xv = ((anu - thres_surf_val) / props.electro.work_function).max(0.0);
    match props.composition {
        Composition::Carbonaceous | Composition::Pah => {
            let xv5 = xv.powi(5);
            xv5 / (1.0 / 9.0e-3 + (3.7e-2 / 9.0e-3) * xv5)
        }
        Composition::Silicate => xv / (2.0 + 10.0 * xv),
    }
}

/// WDB06 eq. 9: bulk yield of a shell with ionization probability `p`.
pub fn y0psa(props: &GrainProperties, p: f64, inv_att_len: f64, eel: f64) -> f64 {
    let leola = props.escape_length(eel) * inv_att_len;
    if leola < 1.0e4 {
        p * leola * (1.0 - leola * (1.0 + 1.0 / leola).ln())
    } else {
        let x = 1.0 / leola;
        p * (((-x / 5.0 + 0.25) * x - 1.0 / 3.0) * x + 0.5)
    }
}

fn escape_integral(u: f64) -> f64 {
    if u > 1.0e-4 {
        u * u - 2.0 * u + 2.0 - 2.0 * (-u).exp()
    } else {
        ((u / 60.0 - 1.0 / 12.0) * u + 1.0 / 3.0) * u.powi(3)
    }
}

/// WDB06 eq. 6: geometric yield enhancement of small grains.
pub fn y1psa(props: &GrainProperties, inv_att_len: f64, eel: f64) -> f64 {
    let a = props.radius();
    let beta = a * inv_att_len;
    if beta <= 0.0 {
        return 1.0;
    }
    let alpha = beta + a / props.escape_length(eel);
    (beta / alpha).powi(2) * escape_integral(alpha) / escape_integral(beta)
}

/// WDB06 eq. 8: escaping fraction of primary and Auger electrons with
/// energies in `elo..ehi`, and their mean energy at infinity.
pub fn y2pa(elo: f64, ehi: f64, z: i64) -> (f64, f64) {
    if z > -1 {
        if ehi > 0.0 {
            let x = elo / ehi;
            let ehp = 0.5 * ehi * (1.0 - 2.0 * x) / (1.0 - 3.0 * x);
            let y = if x.abs() > 1.0e-4 {
                (1.0 - 3.0 * x) / (1.0 - x).powi(3)
            } else {
                1.0 - (3.0 + 8.0 * x) * x * x
            };
            (y, ehp)
        } else {
            (0.0, 0.0)
        }
    } else if ehi > elo {
        (1.0, 0.5 * (elo + ehi))
    } else {
        (0.0, 0.0)
    }
}

/// WDB06 eqs. 20–21: escaping fraction of secondary electrons and their
/// mean energy at infinity. Series expansions replace the closed forms
/// where those cancel.
pub fn y2s(elo: f64, ehi: f64, z: i64, wd01: bool) -> (f64, f64) {
    if wd01 {
        return (0.0, 0.0);
    }
    let yl = elo / ETILDE;
    let yh = ehi / ETILDE;
    let x = yh - yl;
    if z > -1 {
        if ehi <= 0.0 {
            return (0.0, 0.0);
        }
        let (n0, e0) = if x < 0.01 {
            let (x2, x3, x4, x5) = (x * x, x.powi(3), x.powi(4), x.powi(5));
            let (yh2, yh3, yh4, yh5) = (yh * yh, yh.powi(3), yh.powi(4), yh.powi(5));
            let h1 = 2.0 * x - yh;
            let h2 = (6.0 * x3 - 15.0 * yh * x2 + 12.0 * yh2 * x - 3.0 * yh3) / 4.0;
            let h3 = (22.0 * x5 - 95.0 * yh * x4 + 164.0 * yh2 * x3 - 141.0 * yh3 * x2
                + 60.0 * yh4 * x
                - 10.0 * yh5)
                / 16.0;
            let n0 = yh * (h1 - h2 + h3) / x2;

            let h1 = (3.0 * x - yh) / 3.0;
            let h2 = (15.0 * x3 - 25.0 * yh * x2 + 15.0 * yh2 * x - 3.0 * yh3) / 20.0;
            let h3 = (1155.0 * x5 - 3325.0 * yh * x4 + 4305.0 * yh2 * x3 - 2961.0 * yh3 * x2
                + 1050.0 * yh4 * x
                - 150.0 * yh5)
                / 1680.0;
            (n0, ETILDE * yh2 * (h1 - h2 + h3) / x2)
        } else {
            let sr0 = 1.0 + yl * yl;
            let sq_r0 = sr0.sqrt();
            let sq_rh = (1.0 + x * x).sqrt();
            let alpha = sq_rh / (sq_rh - 1.0);
            if yh / sq_r0 < 0.01 {
                let zz = yh * (yh - 2.0 * yl) / sr0;
                let n0 = ((((7.0 / 256.0 * zz - 5.0 / 128.0) * zz + 1.0 / 16.0) * zz - 1.0 / 8.0)
                    * zz
                    + 0.5)
                    * zz
                    / (sq_rh - 1.0);
                let (yl2, yl3, yl4) = (yl * yl, yl.powi(3), yl.powi(4));
                let h1 = yl / 2.0;
                let h2 = (2.0 * yl2 - 1.0) / 3.0;
                let h3 = (6.0 * yl3 - 9.0 * yl) / 8.0;
                let h4 = (8.0 * yl4 - 24.0 * yl2 + 3.0) / 10.0;
                let h = yh / sr0;
                let e0 = -alpha * ehi * (((h4 * h + h3) * h + h2) * h + h1) * h / sq_r0;
                (n0, e0)
            } else {
                let n0 = alpha * (1.0 / sq_r0 - 1.0 / sq_rh);
                let e0 = alpha * ETILDE * ((x * sq_r0 + yl * sq_rh).asinh() - yh / sq_rh);
                (n0, e0)
            }
        };
        (n0, e0 / n0)
    } else if ehi > elo {
        let x2 = x * x;
        let ehs = if x > 0.025 {
            let sq_rh = (1.0 + x2).sqrt();
            let alpha = sq_rh / (sq_rh - 1.0);
            alpha * ETILDE * (x.asinh() - yh / sq_rh + yl)
        } else {
            ehi - (ehi - elo) * ((-37.0 / 840.0 * x2 + 0.1) * x2 + 1.0 / 3.0)
        };
        (1.0, ehs)
    } else {
        (0.0, 0.0)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Escaping {
    primary: f64,
    secondary: f64,
    primary_energy: f64,
    secondary_energy: f64,
}

/// Escaping primary and secondary yields of one channel; `max` caps the
/// bulk yield at the shell probability.
fn escape_yields(
    props: &GrainProperties,
    z: i64,
    y01: f64,
    max: f64,
    elo: f64,
    ehi: f64,
    eel: f64,
) -> Escaping {
    let (y2pr, ehp) = y2pa(elo, ehi, z);
    if y2pr <= 0.0 {
        return Escaping::default();
    }
    let y = y01.min(max);
    let (y2sec, ehs) = y2s(elo, ehi, z, props.wd01);
    let eps = if props.composition.is_carbonaceous() {
        117.0 / EVRYD
    } else {
        155.0 / EVRYD
    };
    // WDB06 eq. 18; eel may be negative near threshold
    let f3 = eel.max(0.0) / (eps * props.escape_length(eel) * props.eyc);
    Escaping {
        primary: y2pr * y,
        secondary: y2sec * f3 * y,
        primary_energy: ehp,
        secondary_energy: ehs,
    }
}
