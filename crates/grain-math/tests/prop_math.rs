// ─────────────────────────────────────────────────────────────────────
// SCPN Grain Core — Property-Based Tests (proptest) for grain-math
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Property-based tests for grain-math using proptest.
//!
//! Covers: monotone spline node exactness and monotonicity, grid search
//! bounds, bracket convergence on scalar fixed points.

use grain_math::bracket::Bracket;
use grain_math::search::{first_above, interval_index};
use grain_math::spline::MonotoneSpline;
use proptest::prelude::*;

fn increasing(steps: &[f64], start: f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(steps.len() + 1);
    let mut acc = start;
    out.push(acc);
    for s in steps {
        acc += s;
        out.push(acc);
    }
    out
}

// ── Monotone Spline ──────────────────────────────────────────────────

proptest! {
    /// Monotone data give monotone interpolants.
    #[test]
    fn spline_preserves_monotonicity(
        dx in prop::collection::vec(0.01f64..2.0, 3..30),
        dy in prop::collection::vec(0.0f64..5.0, 30),
    ) {
        let x = increasing(&dx, -1.0);
        let y = increasing(&dy[..dx.len()], 0.5);
        let spline = MonotoneSpline::new(&x, &y).unwrap();
        let n = 400;
        let mut prev = f64::NEG_INFINITY;
        for k in 0..=n {
            let t = x[0] + (x[x.len() - 1] - x[0]) * k as f64 / n as f64;
            let v = spline.eval(t);
            prop_assert!(v >= prev - 1e-12, "not monotone at t={}: {} < {}", t, v, prev);
            prev = v;
        }
    }

    /// Interpolant passes through every node.
    #[test]
    fn spline_exact_at_nodes(
        dx in prop::collection::vec(0.01f64..2.0, 2..25),
        dy in prop::collection::vec(-3.0f64..3.0, 25),
    ) {
        let x = increasing(&dx, 0.0);
        let y: Vec<f64> = dy[..x.len()].to_vec();
        let spline = MonotoneSpline::new(&x, &y).unwrap();
        for (xi, yi) in x.iter().zip(y.iter()) {
            prop_assert!((spline.eval(*xi) - yi).abs() <= 1e-12 * (1.0 + yi.abs()));
        }
    }
}

// ── Grid Search ──────────────────────────────────────────────────────

proptest! {
    /// first_above splits the grid at x.
    #[test]
    fn first_above_partitions(
        dx in prop::collection::vec(0.01f64..1.0, 1..50),
        t in -2.0f64..60.0,
    ) {
        let grid = increasing(&dx, 0.0);
        let k = first_above(&grid, t);
        prop_assert!(grid[..k].iter().all(|&v| v <= t));
        prop_assert!(grid[k..].iter().all(|&v| v > t));
        let i = interval_index(&grid, t);
        prop_assert!(i + 1 < grid.len());
    }
}

// ── Bracket ──────────────────────────────────────────────────────────

proptest! {
    /// Overshooting iterations converge once the bracket closes.
    #[test]
    fn bracket_converges_on_overshoot(
        root in 1.0f64..1000.0,
        gain in 1.2f64..3.0,
        start in 0.1f64..0.9,
    ) {
        let map = |t: f64| root - gain * (t - root);
        let mut bracket = Bracket::new();
        let mut t = start * root;
        for step in 0..150 {
            let new = map(t);
            bracket.record(t, new);
            t = bracket.propose(step, new).value;
        }
        prop_assert!((t - root).abs() < 1e-6 * root, "t={} root={}", t, root);
    }
}
