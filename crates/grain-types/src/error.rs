// ─────────────────────────────────────────────────────────────────────
// SCPN Grain Core — Errors
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GrainError {
    #[error("Could not bracket grain charge for bin {bin}")]
    BracketingFailure { bin: String },

    #[error("Could not converge grain charge for bin {bin}: {message}")]
    PopulationConvergenceFailure { bin: String, message: String },

    #[error("Grain temperature not converged for bin {bin}, last estimate {temperature:.4e} K")]
    TemperatureConvergenceFailure { bin: String, temperature: f64 },

    #[error("Charge/temperature loop not converged for bin {bin}, delta={delta:.4e}")]
    ChargeTemperatureNotConverged { bin: String, delta: f64 },

    #[error("Data file {path} has version {found}, expected {expected}")]
    DataVersionMismatch {
        path: String,
        expected: i64,
        found: i64,
    },

    #[error("Data format error: {0}")]
    DataFormat(String),

    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type GrainResult<T> = Result<T, GrainError>;
