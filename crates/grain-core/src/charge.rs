// ─────────────────────────────────────────────────────────────────────
// SCPN Grain Core — Charge Distribution
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Steady-state charge distribution in the n-charge-state model
//! (van Hoof et al. 2004, MNRAS 350, 1330).
//!
//! A window of n states spaced by a power of n − 1 first brackets the
//! sign change of the net electron loss, then narrows until adjacent
//! states bracket it. Detailed balance over the two (n − 1)-state
//! sub-windows, combined so that the net charging rate vanishes, gives
//! non-negative populations.

use grain_types::error::{GrainError, GrainResult};
use tracing::debug;

/// Electron emission and capture rates [s^-1 per unit area] of single
/// charge states.
pub trait ChargeRates {
    /// Label used in diagnostics.
    fn label(&self) -> &str;

    fn lowest_charge(&self) -> i64;

    /// `(up, down)` rates of charge `z`, evaluated as member `slot` of the
    /// current window.
    fn rate_pair(&mut self, z: i64, slot: usize) -> GrainResult<(f64, f64)>;
}

/// Endpoints of one evaluated window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowTrace {
    pub zlo: i64,
    pub stride: i64,
    pub netloss_lo: f64,
    pub netloss_hi: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChargeSolution {
    /// Lowest charge of the populated window.
    pub zlo: i64,
    /// Number of populated states, possibly fewer than requested.
    pub n_states: usize,
    pub populations: Vec<f64>,
    pub rate_up: Vec<f64>,
    pub rate_dn: Vec<f64>,
    pub mean_charge: f64,
    /// Windows evaluated while bracketing, then while refining.
    pub windows: Vec<WindowTrace>,
    /// Strides used during refinement, in order.
    pub refinement_strides: Vec<i64>,
    pub bracket_attempts: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct ChargeSolverConfig {
    /// Requested number of charge states.
    pub n_states: usize,
    pub bracket_max: usize,
}

struct Window {
    zlo: i64,
    stride: i64,
    up: Vec<f64>,
    dn: Vec<f64>,
}

impl Window {
    fn evaluate<R: ChargeRates + ?Sized>(
        rates: &mut R,
        zlo: i64,
        stride: i64,
        n: usize,
    ) -> GrainResult<Self> {
        let mut up = Vec::with_capacity(n);
        let mut dn = Vec::with_capacity(n);
        for slot in 0..n {
            let z = zlo + slot as i64 * stride;
            let (u, d) = rates.rate_pair(z, slot)?;
            if !(u.is_finite() && d.is_finite() && u >= 0.0 && d >= 0.0) {
                return Err(GrainError::InvariantViolation(format!(
                    "bin {}: charging rates of Z={z} must be finite and >= 0, got up={u:e} down={d:e}",
                    rates.label()
                )));
            }
            up.push(u);
            dn.push(d);
        }
        Ok(Window {
            zlo,
            stride,
            up,
            dn,
        })
    }

    fn netloss(&self, k: usize) -> f64 {
        self.up[k] - self.dn[k]
    }

    fn trace(&self) -> WindowTrace {
        let last = self.up.len() - 1;
        WindowTrace {
            zlo: self.zlo,
            stride: self.stride,
            netloss_lo: self.netloss(0),
            netloss_hi: self.netloss(last),
        }
    }
}

/// Solve the charge distribution. `seed` is the lowest charge of the
/// previous solution; without one the search starts cold from the lowest
/// admissible charge. `n_states` may shrink in the returned solution.
pub fn solve_charge<R: ChargeRates + ?Sized>(
    rates: &mut R,
    config: ChargeSolverConfig,
    seed: Option<i64>,
) -> GrainResult<ChargeSolution> {
    let lowest = rates.lowest_charge();
    let n_search = config.n_states.max(3);
    let stride0 = (n_search - 1) as i64;
    let span = |stride: i64| (n_search as i64 - 1) * stride;

    let (mut zlo, mut stride) = match seed {
        Some(z) => (z.max(lowest), 1),
        None => {
            let step = (-lowest as f64).max(1.0);
            let power = ((step.ln() / (stride0 as f64).ln()).floor() as i32).max(0);
            (lowest, stride0.pow(power as u32))
        }
    };

    let mut windows = Vec::new();
    let mut window = Window::evaluate(rates, zlo, stride, n_search)?;
    windows.push(window.trace());

    let mut bracket_attempts = 0;
    let mut bracketed = false;
    for i in 0..config.bracket_max {
        bracket_attempts = i + 1;
        let nl0 = window.netloss(0);
        let nl1 = window.netloss(n_search - 1);
        if nl0 * nl1 <= 0.0 {
            bracketed = true;
            break;
        }
        if nl1 > 0.0 {
            zlo += span(stride);
        }
        if i > 0 {
            stride *= stride0;
        }
        if nl1 < 0.0 {
            zlo -= span(stride);
        }
        zlo = zlo.max(lowest);
        debug!(bin = rates.label(), zlo, stride, "charge bracket step");
        window = Window::evaluate(rates, zlo, stride, n_search)?;
        windows.push(window.trace());
    }
    if !bracketed {
        let trace = window.trace();
        bracketed = trace.netloss_lo * trace.netloss_hi <= 0.0;
    }
    if !bracketed {
        return Err(GrainError::BracketingFailure {
            bin: rates.label().to_string(),
        });
    }

    let mut refinement_strides = Vec::new();
    while stride > 1 {
        stride /= stride0;
        refinement_strides.push(stride);
        let mut nl0 = window.netloss(0);
        for k in 0..n_search - 1 {
            let nl1 = window.netloss(k + 1);
            if nl0 * nl1 <= 0.0 {
                zlo = window.zlo + k as i64 * window.stride;
                break;
            }
            nl0 = nl1;
        }
        window = Window::evaluate(rates, zlo, stride, n_search)?;
        windows.push(window.trace());
    }

    let mut n = config.n_states;
    let loop_max = if seed.is_none() { 4 * n } else { 2 * n };
    for _ in 0..loop_max {
        let step = fractional_populations(&window.up, &window.dn, n, zlo, lowest);
        n = step.n_states;
        match step.outcome {
            PopulationOutcome::Converged(populations) => {
                check_balance(rates.label(), &populations, &window.up, &window.dn)?;
                let mean_charge = populations
                    .iter()
                    .enumerate()
                    .map(|(k, p)| p * (zlo + k as i64) as f64)
                    .sum();
                debug!(bin = rates.label(), zlo, n, mean_charge, "charge converged");
                return Ok(ChargeSolution {
                    zlo,
                    n_states: n,
                    populations,
                    rate_up: window.up[..n].to_vec(),
                    rate_dn: window.dn[..n].to_vec(),
                    mean_charge,
                    windows,
                    refinement_strides,
                    bracket_attempts,
                });
            }
            PopulationOutcome::Shift(new_zlo) if new_zlo >= lowest => {
                zlo = new_zlo;
                window = Window::evaluate(rates, zlo, 1, n)?;
            }
            PopulationOutcome::Shift(_) => {
                return Err(GrainError::PopulationConvergenceFailure {
                    bin: rates.label().to_string(),
                    message: format!("window fell below the lowest charge {lowest}"),
                });
            }
        }
    }
    Err(GrainError::PopulationConvergenceFailure {
        bin: rates.label().to_string(),
        message: format!("no stable window after {loop_max} shifts"),
    })
}

enum PopulationOutcome {
    Converged(Vec<f64>),
    Shift(i64),
}

struct PopulationStep {
    n_states: usize,
    outcome: PopulationOutcome,
}

/// Detailed balance over states `i..i + n - 1` for i = 0, 1. Returns the
/// normalised chain populations and their net electron loss.
fn balance_chain(up: &[f64], dn: &[f64], n: usize, i: usize) -> (Vec<f64>, f64) {
    let big = f64::MAX.sqrt();
    let mut pop = vec![0.0; n - 1];
    pop[0] = 1.0;
    let mut sum = 1.0;
    for j in 1..n - 1 {
        let nz = i + j;
        if dn[nz] > 10.0 * up[nz - 1] / big {
            pop[j] = pop[j - 1] * up[nz - 1] / dn[nz];
            sum += pop[j];
        } else {
            pop[..j].iter_mut().for_each(|p| *p = 0.0);
            pop[j] = 1.0;
            sum = 1.0;
        }
        if pop[j] > big {
            let scale = f64::MAX / 10.0;
            pop[..=j].iter_mut().for_each(|p| *p /= scale);
            sum /= scale;
        }
    }
    let mut netloss = 0.0;
    for (j, p) in pop.iter_mut().enumerate() {
        *p /= sum;
        netloss += *p * (up[i + j] - dn[i + j]);
    }
    (pop, netloss)
}

fn fractional_populations(
    up: &[f64],
    dn: &[f64],
    mut n: usize,
    zlo: i64,
    lowest: i64,
) -> PopulationStep {
    loop {
        let (pop0, nl0) = balance_chain(up, dn, n, 0);
        let (pop1, nl1) = balance_chain(up, dn, n, 1);
        let new_zlo = if nl0 * nl1 > 0.0 {
            if nl1 > 0.0 {
                zlo + 1
            } else {
                zlo - 1
            }
        } else {
            zlo
        };

        // round-off can flip the sign of a vanishing net loss; a marginal
        // top state means the window is wider than needed
        if n > 2 && (new_zlo < lowest || (new_zlo == zlo && pop1[n - 2] < f64::EPSILON)) {
            n -= 1;
            continue;
        }
        if new_zlo != zlo {
            return PopulationStep {
                n_states: n,
                outcome: PopulationOutcome::Shift(new_zlo),
            };
        }

        let denom = nl1 - nl0;
        let (frac0, frac1) = if denom != 0.0 {
            (nl1 / denom, -nl0 / denom)
        } else {
            (1.0, 0.0)
        };
        let mut populations = vec![0.0; n];
        populations[0] = frac0 * pop0[0];
        populations[n - 1] = frac1 * pop1[n - 2];
        for k in 1..n - 1 {
            populations[k] = frac0 * pop0[k] + frac1 * pop1[k - 1];
        }
        return PopulationStep {
            n_states: n,
            outcome: PopulationOutcome::Converged(populations),
        };
    }
}

fn check_balance(label: &str, populations: &[f64], up: &[f64], dn: &[f64]) -> GrainResult<()> {
    let n = populations.len();
    if let Some(p) = populations.iter().find(|&&p| !(p >= 0.0)) {
        return Err(GrainError::InvariantViolation(format!(
            "bin {label}: negative charge population {p:e}"
        )));
    }
    let total: f64 = populations.iter().sum();
    let gain: f64 = populations.iter().zip(up).map(|(p, u)| p * u).sum();
    let net: f64 = populations
        .iter()
        .zip(up.iter().zip(dn))
        .map(|(p, (u, d))| p * (u - d))
        .sum();
    let x1 = (total - 1.0).abs();
    let x2 = if gain != 0.0 { (net / gain).abs() } else { 0.0 };
    let tol = 10.0 * (n as f64).sqrt() * f64::EPSILON;
    if x1.max(x2) >= tol {
        return Err(GrainError::InvariantViolation(format!(
            "bin {label}: charge populations unbalanced, |sum-1|={x1:e} |net/up|={x2:e}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Rates given by a closure of the charge.
    struct Synthetic<F: Fn(i64) -> (f64, f64)> {
        lowest: i64,
        f: F,
        calls: usize,
    }

    impl<F: Fn(i64) -> (f64, f64)> ChargeRates for Synthetic<F> {
        fn label(&self) -> &str {
            "synthetic"
        }
        fn lowest_charge(&self) -> i64 {
            self.lowest
        }
        fn rate_pair(&mut self, z: i64, _slot: usize) -> GrainResult<(f64, f64)> {
            self.calls += 1;
            Ok((self.f)(z))
        }
    }

    fn config(n: usize) -> ChargeSolverConfig {
        ChargeSolverConfig {
            n_states: n,
            bracket_max: 50,
        }
    }

    #[test]
    fn test_pure_recombination_pins_lowest_charge() {
        let lowest = -10;
        let mut model = Synthetic {
            lowest,
            f: move |z| (0.0, if z > lowest { 1.0 } else { 0.0 }),
            calls: 0,
        };
        let sol = solve_charge(&mut model, config(2), None).unwrap();
        assert_eq!(sol.zlo, lowest);
        assert_eq!(sol.populations.len(), 2);
        assert_eq!(sol.populations[0], 1.0);
        assert_eq!(sol.populations[1], 0.0);
        assert_eq!(sol.bracket_attempts, 1);
        assert_eq!(sol.mean_charge, lowest as f64);
    }

    #[test]
    fn test_symmetric_step_splits_evenly() {
        let z0 = 7;
        let mut model = Synthetic {
            lowest: -20,
            f: move |z| {
                let up = if z <= z0 { 1.0 } else { 0.0 };
                let dn = if z > z0 { 1.0 } else { 0.0 };
                (up, dn)
            },
            calls: 0,
        };
        let sol = solve_charge(&mut model, config(2), None).unwrap();
        assert_eq!(sol.zlo, z0);
        assert!((sol.populations[0] - 0.5).abs() < 1e-15);
        assert!((sol.populations[1] - 0.5).abs() < 1e-15);
        assert!((sol.mean_charge - (z0 as f64 + 0.5)).abs() < 1e-12);
    }

    #[test]
    fn test_wide_window_populations_balance() {
        // photoemission rising with charge, capture falling
        let mut model = Synthetic {
            lowest: -40,
            f: |z| {
                let z = z as f64;
                ((-0.3 * z).exp() * 50.0, (0.2 * z).exp())
            },
            calls: 0,
        };
        let sol = solve_charge(&mut model, config(6), None).unwrap();
        let total: f64 = sol.populations.iter().sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert!(sol.populations.iter().all(|&p| p >= 0.0));
        // ln 50 / 0.5 ≈ 7.8
        assert!(sol.mean_charge > 6.0 && sol.mean_charge < 10.0);
        for w in sol.refinement_strides.windows(2) {
            assert!(w[1] < w[0]);
        }
        assert_eq!(sol.refinement_strides.last().copied().unwrap_or(1), 1);
    }

    #[test]
    fn test_warm_start_reuses_seed() {
        let f = |z: i64| {
            let z = z as f64;
            ((-0.3 * z).exp() * 50.0, (0.2 * z).exp())
        };
        let mut cold = Synthetic {
            lowest: -40,
            f,
            calls: 0,
        };
        let first = solve_charge(&mut cold, config(3), None).unwrap();
        let mut warm = Synthetic {
            lowest: -40,
            f,
            calls: 0,
        };
        let second = solve_charge(&mut warm, config(3), Some(first.zlo)).unwrap();
        assert_eq!(second.zlo, first.zlo);
        assert_eq!(second.bracket_attempts, 1);
        assert!(second.refinement_strides.is_empty());
        assert!(warm.calls < cold.calls);
        assert!((second.mean_charge - first.mean_charge).abs() < 1e-12);
    }

    #[test]
    fn test_unbracketable_model_fails() {
        let mut model = Synthetic {
            lowest: -5,
            f: |_| (1.0, 0.0),
            calls: 0,
        };
        let cfg = ChargeSolverConfig {
            n_states: 2,
            bracket_max: 5,
        };
        assert!(matches!(
            solve_charge(&mut model, cfg, None),
            Err(GrainError::BracketingFailure { .. })
        ));
    }

    #[test]
    fn test_negative_rate_rejected() {
        let mut model = Synthetic {
            lowest: -5,
            f: |_| (-1.0, 0.0),
            calls: 0,
        };
        assert!(matches!(
            solve_charge(&mut model, config(2), None),
            Err(GrainError::InvariantViolation(_))
        ));
    }
}
