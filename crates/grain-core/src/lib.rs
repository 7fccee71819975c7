//! Dust-grain charge and temperature equilibrium.
//!
//! Per-state rates: screening, potential, yields, ions, rates
//! Per-bin solves: charge, temperature, equilibrium
//! Per-zone: aggregate, depth, drift

pub mod aggregate;
pub mod auger;
pub mod bin;
pub mod charge;
pub mod charge_state;
pub mod collisions;
pub mod depth;
pub mod drift;
pub mod emissivity;
pub mod equilibrium;
pub mod ions;
pub mod optics;
pub mod potential;
pub mod properties;
pub mod rates;
pub mod screening;
pub mod temperature;
pub mod yields;
