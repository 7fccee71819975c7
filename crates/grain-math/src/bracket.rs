// ─────────────────────────────────────────────────────────────────────
// SCPN Grain Core — Bisection Bracket
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Bracket built from successive fixed-point iterates on a positive axis.
//!
//! Every iterate `old` mapped to `new` tells on which side of the fixed
//! point it lies: `new < old` puts the root below `old`, otherwise above.
//! Once both sides are known the bracket forces bisection whenever the
//! plain iteration leaves it, or from the third step on when it has a
//! positive lower bound.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket {
    lo: f64,
    hi: Option<f64>,
}

/// Next iterate chosen by [`Bracket::propose`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BracketStep {
    pub value: f64,
    pub bisected: bool,
}

impl Default for Bracket {
    fn default() -> Self {
        Self::new()
    }
}

impl Bracket {
    pub fn new() -> Self {
        Bracket { lo: 0.0, hi: None }
    }

    pub fn lo(&self) -> f64 {
        self.lo
    }

    pub fn hi(&self) -> Option<f64> {
        self.hi
    }

    /// Bracket is closed when an upper bound above the lower bound exists.
    pub fn is_closed(&self) -> bool {
        self.hi.is_some_and(|hi| hi > self.lo)
    }

    /// Narrow the bracket with the iterate `old` that mapped to `new`.
    pub fn record(&mut self, old: f64, new: f64) {
        if new < old {
            self.hi = Some(old);
        } else {
            self.lo = old;
        }
    }

    /// Accept `new` as the iterate after `step` or replace it by the midpoint.
    pub fn propose(&self, step: usize, new: f64) -> BracketStep {
        if let Some(hi) = self.hi.filter(|&hi| hi > self.lo) {
            if (step >= 2 && self.lo > 0.0) || new <= self.lo || new >= hi {
                return BracketStep {
                    value: 0.5 * (self.lo + hi),
                    bisected: true,
                };
            }
        }
        BracketStep {
            value: new,
            bisected: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_bracket_passes_through() {
        let mut b = Bracket::new();
        b.record(10.0, 20.0);
        assert_eq!(b.lo(), 10.0);
        assert!(!b.is_closed());
        let step = b.propose(5, 20.0);
        assert!(!step.bisected);
        assert_eq!(step.value, 20.0);
    }

    #[test]
    fn test_leaving_bracket_bisects() {
        let mut b = Bracket::new();
        b.record(10.0, 30.0);
        b.record(30.0, 5.0);
        assert!(b.is_closed());
        let step = b.propose(1, 5.0);
        assert!(step.bisected);
        assert_eq!(step.value, 20.0);
    }

    #[test]
    fn test_inside_bracket_early_step_kept() {
        let mut b = Bracket::new();
        b.record(30.0, 12.0);
        // lower bound still zero: no forced bisection
        let step = b.propose(4, 12.0);
        assert!(!step.bisected);
        assert_eq!(step.value, 12.0);
    }

    #[test]
    fn test_forced_after_two_steps_with_lower_bound() {
        let mut b = Bracket::new();
        b.record(10.0, 14.0);
        b.record(20.0, 15.0);
        assert!(!b.propose(1, 15.0).bisected);
        let step = b.propose(2, 15.0);
        assert!(step.bisected);
        assert_eq!(step.value, 15.0);
    }
}
