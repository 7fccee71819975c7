// ─────────────────────────────────────────────────────────────────────
// SCPN Grain Core — Charge/Temperature Equilibrium
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Joint solution of grain charge and grain temperature for one bin.
//!
//! The charge distribution depends on the temperature only through
//! thermionic emission, so the outer loop stops as soon as the change in
//! the thermionic rate implied by the last temperature update is small.
//! Both the inner temperature loop and the outer loop fall back to
//! bisection on a bracket when plain iteration oscillates.

use crate::bin::{BinRates, GrainBin, ZoneEnvironment};
use crate::charge::{solve_charge, ChargeSolution, ChargeSolverConfig};
use crate::collisions::charge_transfer;
use crate::temperature::{heat_budget, HeatBudget};
use grain_math::bracket::Bracket;
use grain_types::config::SolverConfig;
use grain_types::constants::TE1RYD;
use grain_types::error::{GrainError, GrainResult};
use grain_types::state::{ChargeTransferMatrix, EquilibriumResult};
use tracing::{debug, warn};

/// Phases of the joint solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    SolveCharge,
    SolveTemperature,
    CheckJointConvergence,
    Converged,
    Failed,
}

/// One evaluation of the heat budget at a trial temperature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureStep {
    /// Temperature balancing the heating, `None` when the heating is not positive.
    pub temperature: Option<f64>,
    pub heat: f64,
    pub cool: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureOutcome {
    pub temperature: f64,
    pub heat: f64,
    pub cool: f64,
    pub iterations: usize,
    pub bisections: usize,
    pub converged: bool,
}

/// Tolerances and bounds of [`solve_temperature`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureLoop {
    pub max_iterations: usize,
    /// Relative tolerance on the heating.
    pub heat_tolerance: f64,
    /// Absolute tolerance on the gas cooling [erg cm^-3 s^-1], floored at
    /// `heat_tolerance` relative to the cooling itself.
    pub cool_tolerance: f64,
    pub t_min: f64,
    pub t_max: f64,
}

/// Iterate `step` to a fixed point of the temperature. `previous` holds the
/// heating and cooling of the last evaluation before this loop.
pub fn solve_temperature<F>(
    initial: f64,
    previous: (f64, f64),
    bounds: TemperatureLoop,
    mut step: F,
) -> GrainResult<TemperatureOutcome>
where
    F: FnMut(f64) -> GrainResult<TemperatureStep>,
{
    let mut bracket = Bracket::new();
    let mut t = initial;
    let (mut old_heat, mut old_cool) = previous;
    let mut bisections = 0;
    for j in 0..bounds.max_iterations {
        let s = step(t)?;
        // a missing temperature never converges; it reads as "below"
        let heat = if s.temperature.is_some() { s.heat } else { -1.0 };
        // relative floor for zones without total cooling
        let cool_tolerance = bounds
            .cool_tolerance
            .max(bounds.heat_tolerance * s.cool.abs());
        if (heat - old_heat).abs() < bounds.heat_tolerance * heat
            && (s.cool - old_cool).abs() <= cool_tolerance
        {
            return Ok(TemperatureOutcome {
                temperature: s.temperature.unwrap_or(t),
                heat,
                cool: s.cool,
                iterations: j + 1,
                bisections,
                converged: true,
            });
        }
        let estimate = s.temperature.unwrap_or(-1.0);
        bracket.record(t, estimate);
        let next = bracket.propose(j, estimate);
        if next.bisected {
            bisections += 1;
        }
        t = next.value.clamp(bounds.t_min, bounds.t_max);
        old_heat = heat;
        old_cool = s.cool;
    }
    Ok(TemperatureOutcome {
        temperature: t,
        heat: old_heat,
        cool: old_cool,
        iterations: bounds.max_iterations,
        bisections,
        converged: false,
    })
}

/// Limits of [`run_joint_loop`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointLoop {
    /// Outer iterations before the loop fails.
    pub max_iterations: usize,
    /// Bound on the relative change of the thermionic rate.
    pub tolerance: f64,
    pub soft_failure: bool,
    pub t_min: f64,
    pub t_max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointOutcome {
    /// `Converged`, or `Failed` when accepted under the soft-failure policy.
    pub state: LoopState,
    pub iterations: usize,
    pub delta: f64,
    pub soft_failures: usize,
    /// Outer iterations resolved by bisection.
    pub bisections: usize,
}

/// The bin side of the joint loop.
pub trait JointSolve {
    fn label(&self) -> &str;

    fn temperature(&self) -> f64;

    fn set_temperature(&mut self, t: f64);

    /// Solve the charge distribution at the current temperature. Returns
    /// the thermionic share of the electron emission.
    fn charge_step(&mut self) -> GrainResult<f64>;

    /// Inner temperature loop started from the current temperature.
    fn temperature_step(&mut self) -> GrainResult<TemperatureOutcome>;

    /// Adopt an inner loop result: converged, or unconverged but accepted
    /// under the soft-failure policy.
    fn accept_temperature(&mut self, outcome: &TemperatureOutcome);

    /// Population-weighted ionization threshold ThresEst [Ryd].
    fn threshold_estimate(&self) -> f64;
}

/// Alternate charge and temperature solves until the thermionic rate no
/// longer moves with the temperature.
pub fn run_joint_loop<S: JointSolve + ?Sized>(
    solve: &mut S,
    limits: JointLoop,
) -> GrainResult<JointOutcome> {
    let mut outer = Bracket::new();
    let mut state = LoopState::SolveCharge;
    let mut iteration = 0;
    let mut soft_failures = 0;
    let mut bisections = 0;
    let mut delta = f64::MAX;
    let mut old_temperature = solve.temperature();
    let mut therm_ratio = 0.0;

    loop {
        debug!(bin = solve.label(), ?state, iteration, "equilibrium step");
        state = match state {
            LoopState::SolveCharge => {
                old_temperature = solve.temperature();
                therm_ratio = solve.charge_step()?;
                LoopState::SolveTemperature
            }
            LoopState::SolveTemperature => {
                let outcome = solve.temperature_step()?;
                if outcome.converged {
                    outer.record(old_temperature, outcome.temperature);
                } else if limits.soft_failure {
                    warn!(
                        bin = solve.label(),
                        temperature = outcome.temperature,
                        "grain temperature not converged, continuing"
                    );
                    soft_failures += 1;
                } else {
                    return Err(GrainError::TemperatureConvergenceFailure {
                        bin: solve.label().to_string(),
                        temperature: outcome.temperature,
                    });
                }
                solve.accept_temperature(&outcome);
                LoopState::CheckJointConvergence
            }
            LoopState::CheckJointConvergence => {
                let t = solve.temperature();
                let ratio = t / old_temperature;
                let exponent = solve.threshold_estimate() * TE1RYD / t * (ratio - 1.0);
                delta = if exponent < 0.9 * f64::MAX.ln() {
                    therm_ratio * (ratio * ratio * exponent.exp() - 1.0).abs()
                } else {
                    f64::MAX
                };
                if delta <= limits.tolerance {
                    LoopState::Converged
                } else {
                    let next = outer.propose(iteration, t);
                    if next.bisected {
                        bisections += 1;
                        solve.set_temperature(next.value.clamp(limits.t_min, limits.t_max));
                    }
                    iteration += 1;
                    if iteration >= limits.max_iterations {
                        LoopState::Failed
                    } else {
                        LoopState::SolveCharge
                    }
                }
            }
            LoopState::Failed => {
                if !limits.soft_failure {
                    return Err(GrainError::ChargeTemperatureNotConverged {
                        bin: solve.label().to_string(),
                        delta,
                    });
                }
                warn!(bin = solve.label(), delta, "grain charge and temperature not converged");
                soft_failures += 1;
                break;
            }
            LoopState::Converged => break,
        };
    }

    Ok(JointOutcome {
        state,
        iterations: (iteration + 1).min(limits.max_iterations),
        delta,
        soft_failures,
        bisections,
    })
}

/// A grain bin in one zone, driven by [`run_joint_loop`].
struct BinJoint<'b, 'e> {
    bin: &'b mut GrainBin,
    env: &'b ZoneEnvironment<'e>,
    solver: &'b SolverConfig,
    bounds: TemperatureLoop,
    seed: Option<i64>,
    /// Heating and cooling of the last accepted temperature.
    previous: (f64, f64),
    charge: Option<ChargeSolution>,
    budget: Option<HeatBudget>,
    pending: Option<HeatBudget>,
    therm_ratio: f64,
}

impl JointSolve for BinJoint<'_, '_> {
    fn label(&self) -> &str {
        self.bin.label()
    }

    fn temperature(&self) -> f64 {
        self.bin.temperature
    }

    fn set_temperature(&mut self, t: f64) {
        self.bin.temperature = t;
    }

    fn charge_step(&mut self) -> GrainResult<f64> {
        let config = ChargeSolverConfig {
            n_states: self.bin.requested_states(),
            bracket_max: self.solver.bracket_max,
        };
        let mut rates = BinRates {
            bin: &mut *self.bin,
            env: self.env,
            ion_recombination: self.solver.ion_recombination,
        };
        let solution = solve_charge(&mut rates, config, self.seed)?;
        self.bin.n_states = solution.n_states;
        self.seed = Some(solution.zlo);
        let (thermionic, total) =
            self.bin
                .emission_split(self.env, &solution.populations, self.solver.ion_recombination);
        self.therm_ratio = if total > 0.0 { thermionic / total } else { 0.0 };
        self.charge = Some(solution);
        Ok(self.therm_ratio)
    }

    fn temperature_step(&mut self) -> GrainResult<TemperatureOutcome> {
        let populations = self
            .charge
            .as_ref()
            .map(|c| c.populations.clone())
            .unwrap_or_default();
        let bin = &mut *self.bin;
        let (env, solver) = (self.env, self.solver);
        let mut last = None;
        let outcome = solve_temperature(bin.temperature, self.previous, self.bounds, |t| {
            bin.temperature = t;
            let b = heat_budget(bin, env, &populations, solver)?;
            last = Some(b);
            Ok(TemperatureStep {
                temperature: b.temperature,
                heat: b.grain_heat,
                cool: b.collisional.cool,
            })
        })?;
        self.pending = last;
        Ok(outcome)
    }

    fn accept_temperature(&mut self, outcome: &TemperatureOutcome) {
        let mut b = self.pending.take().unwrap_or_default();
        self.bin.temperature = outcome.temperature;
        if !outcome.converged {
            b.grain_heat = self.bin.emissivity.emission_at(outcome.temperature) * self.bin.cnv_h_pcm3;
            b.temperature = Some(outcome.temperature);
        }
        self.previous = (b.grain_heat, b.collisional.cool);
        self.budget = Some(b);
    }

    fn threshold_estimate(&self) -> f64 {
        let populations = self
            .charge
            .as_ref()
            .map(|c| c.populations.as_slice())
            .unwrap_or(&[]);
        self.bin
            .window()
            .iter()
            .zip(populations)
            .map(|(s, p)| p * s.pot.thres_inf)
            .sum()
    }
}

/// Everything one bin contributes to a zone.
#[derive(Debug, Clone, PartialEq)]
pub struct BinOutcome {
    pub result: EquilibriumResult,
    pub budget: HeatBudget,
    pub charge_transfer: ChargeTransferMatrix,
    /// Non-converged loops accepted under the soft-failure policy.
    pub soft_failures: usize,
    /// Outer iterations resolved by bisection.
    pub bisections: usize,
}

/// Per-solve settings supplied by the zone driver.
#[derive(Debug, Clone, Copy)]
pub struct EquilibriumOptions<'a> {
    pub solver: &'a SolverConfig,
    /// The host is still searching for its first zone solution.
    pub search: bool,
    /// Number of bins sharing the gas cooling budget.
    pub n_bins: usize,
}

/// Solve charge and temperature of `bin` in `env`. `initial_guess` seeds
/// the charge window and temperature; without it the search starts cold.
pub fn solve_equilibrium(
    bin: &mut GrainBin,
    env: &ZoneEnvironment,
    options: EquilibriumOptions,
    initial_guess: Option<&EquilibriumResult>,
) -> GrainResult<BinOutcome> {
    env.validate()?;
    let solver = options.solver;
    bin.prepare(env);

    let relax = if options.search { solver.search_relax } else { 1 };
    let bounds = TemperatureLoop {
        max_iterations: relax * solver.t_loop_max,
        heat_tolerance: solver.heat_tolerance(),
        cool_tolerance: solver.heat_tolerance() / (options.n_bins.max(1) as f64).sqrt()
            * env.gas.total_cooling,
        t_min: bin.emissivity.t_min(),
        t_max: bin.emissivity.t_max(),
    };
    let limits = JointLoop {
        max_iterations: relax * solver.ct_loop_max,
        tolerance: solver.tolerance(),
        soft_failure: solver.soft_failure,
        t_min: bounds.t_min,
        t_max: bounds.t_max,
    };
    if let Some(guess) = initial_guess {
        bin.temperature = guess.temperature.clamp(bounds.t_min, bounds.t_max);
    }

    let mut joint = BinJoint {
        bin: &mut *bin,
        env,
        solver,
        bounds,
        seed: initial_guess.map(|g| g.charge_low),
        previous: initial_guess
            .map(|g| (g.grain_heat, g.gas_cooling))
            .unwrap_or((f64::MAX / 10.0, f64::MAX / 10.0)),
        charge: None,
        budget: None,
        pending: None,
        therm_ratio: 0.0,
    };
    let outcome = run_joint_loop(&mut joint, limits)?;
    let BinJoint {
        charge,
        budget,
        therm_ratio,
        ..
    } = joint;

    let (Some(solution), Some(budget)) = (charge, budget) else {
        return Err(GrainError::InvariantViolation(format!(
            "bin {}: equilibrium loop ended without a solution",
            bin.label()
        )));
    };

    let transfer = if solver.charge_transfer && solver.ion_recombination {
        charge_transfer(bin, env, &solution.populations)
    } else {
        ChargeTransferMatrix::zeros(env.elements)
    };
    let result = EquilibriumResult {
        mean_charge: solution.mean_charge,
        charge_low: solution.zlo,
        populations: solution.populations,
        temperature: bin.temperature,
        potential: bin.props.electro.chrg2pot(solution.mean_charge),
        grain_heat: budget.grain_heat,
        collisional_heat: budget.collisional.heat,
        gas_cooling: budget.collisional.cool,
        photoelectric_heating: budget.photoelectric,
        thermionic_heating: budget.thermionic,
        chemical_heat: budget.collisional.chemical + budget.collisional.h2_formation,
        electron_density: solution.mean_charge * bin.grains_pcm3(),
        thermionic_ratio: therm_ratio,
        outer_iterations: outcome.iterations,
        converged: outcome.state == LoopState::Converged,
    };
    debug!(
        bin = bin.label(),
        mean_charge = result.mean_charge,
        temperature = result.temperature,
        outer = result.outer_iterations,
        "equilibrium found"
    );
    bin.last = Some(result.clone());
    Ok(BinOutcome {
        result,
        budget,
        charge_transfer: transfer,
        soft_failures: outcome.soft_failures,
        bisections: outcome.bisections,
    })
}
