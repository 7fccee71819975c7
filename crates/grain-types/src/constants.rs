// ─────────────────────────────────────────────────────────────────────
// SCPN Grain Core — Constants
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Physical constants (CGS, CODATA 2010) and grain-solver defaults.

use std::f64::consts::PI;

/// Electron mass [g]
pub const ELECTRON_MASS: f64 = 9.109_382_91e-28;

/// Boltzmann constant [erg/K]
pub const BOLTZMANN: f64 = 1.380_648_8e-16;

/// Speed of light [cm/s]
pub const SPEEDLIGHT: f64 = 2.997_924_58e10;

/// Planck constant [erg s]
pub const HPLANCK: f64 = 6.626_069_57e-27;

/// Elementary charge [C]
pub const ELEM_CHARGE: f64 = 1.602_176_565e-19;

/// Rydberg constant for infinite nuclear mass [cm^-1]
pub const RYD_INF: f64 = 1.097_373_156_853_9e5;

/// Atomic mass unit [g]
pub const ATOMIC_MASS_UNIT: f64 = 1.660_538_921e-24;

/// Vacuum permittivity [F/m]
pub const EPSILON_0: f64 = 8.854_187_817e-12;

/// One Rydberg [erg]
pub const EN1RYD: f64 = HPLANCK * SPEEDLIGHT * RYD_INF;

/// One Rydberg [K]
pub const TE1RYD: f64 = EN1RYD / BOLTZMANN;

/// One Rydberg [eV]
pub const EVRYD: f64 = HPLANCK * SPEEDLIGHT * RYD_INF / ELEM_CHARGE * 1e-7;

/// Frequency of one Rydberg [Hz]
pub const FR1RYD: f64 = SPEEDLIGHT * RYD_INF;

/// One eV [erg]
pub const EN1EV: f64 = EN1RYD / EVRYD;

/// Richardson prefactor 4π m_e k² / h³ [cm^-2 s^-1 K^-2]
pub const THERMCONST: f64 =
    4.0 * PI * ELECTRON_MASS * BOLTZMANN * BOLTZMANN / (HPLANCK * HPLANCK * HPLANCK);

/// Secondary electron energy scale 2√2 eV [Ryd]
pub const ETILDE: f64 = 2.0 * std::f64::consts::SQRT_2 / EVRYD;

/// Sticking probability of electrons on neutral grains
pub const STICK_ELEC: f64 = 0.5;

/// Sticking probability of ions
pub const STICK_ION: f64 = 1.0;

/// Image-potential corrections to the ionization potential [cm]
pub const AC0: f64 = 3.0e-9;
pub const AC1G: f64 = 4.0e-8;
pub const AC2G: f64 = 7.0e-8;

/// Number of elements tracked by the ion-collision bookkeeping
pub const LIMELM: usize = 30;

/// Atomic weights [amu] of the molecules exchanging heat with grains
pub const ATOMIC_WEIGHT_H: f64 = 1.007_94;
pub const ATOMIC_WEIGHT_C: f64 = 12.0107;
pub const ATOMIC_WEIGHT_O: f64 = 15.9994;

/// Magic number identifying the supported Auger data layout
pub const MAGIC_AUGER_DATA: i64 = 20_060_126;

/// Maximum number of cached charge states per bin
pub const NCHS: usize = 30;

/// Upper limit on the requested charge-state window
pub const NCHU: usize = NCHS / 3;

/// Default requested charge-state window
pub const NCHRG_DEFAULT: usize = 2;

/// Default emissivity grid [K]
pub const GRAIN_TMIN: f64 = 0.01;
pub const GRAIN_TMID: f64 = 1.0e4;
pub const GRAIN_TMAX: f64 = 1.0e9;

/// Default number of emissivity grid points
pub const NDEMS: usize = 200;

/// Default energy-conservation tolerance of the coupled loop
pub const CONSERV_TOL: f64 = 1.0e-3;

/// Default bound on bracketing attempts in the charge search
pub const BRACKET_MAX: usize = 50;

/// Default bound on outer charge/temperature iterations
pub const CT_LOOP_MAX: usize = 25;

/// Default bound on inner temperature iterations
pub const T_LOOP_MAX: usize = 50;

/// Iteration bound multiplier during the initial search phase
pub const SEARCH_RELAX: usize = 3;

/// Heat released per H2 formed on the grain surface [eV]
pub const H2_HEAT_SILICATE: f64 = 0.4;
pub const H2_HEAT_CARBONACEOUS: f64 = 1.72;

/// Initial drift velocity before the first radiation-pressure balance [cm/s]
pub const DRIFT_VELOCITY_SEED: f64 = 1.0e3;

/// Floor of the abundance-vs-depth scale factor
pub const DEPTH_SCALE_FLOOR: f64 = 1.0e-10;
