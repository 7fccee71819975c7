//! Mathematical primitives for SCPN Grain Core.

pub mod bracket;
pub mod search;
pub mod spline;
