// ─────────────────────────────────────────────────────────────────────
// SCPN Grain Core — Monotone Spline
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Monotone piecewise-cubic Hermite interpolation (Fritsch & Carlson 1980).
//!
//! Interpolates exactly at the nodes and never overshoots between them,
//! which keeps table inversions of monotone data monotone.

use grain_types::error::{GrainError, GrainResult};

#[derive(Debug, Clone)]
pub struct MonotoneSpline {
    x: Vec<f64>,
    y: Vec<f64>,
    slope: Vec<f64>,
}

impl MonotoneSpline {
    /// Fit through `(x[i], y[i])`. `x` must be strictly increasing.
    pub fn new(x: &[f64], y: &[f64]) -> GrainResult<Self> {
        let n = x.len();
        if n < 2 || y.len() != n {
            return Err(GrainError::InvariantViolation(format!(
                "spline needs >= 2 matching nodes, got {} x and {} y",
                n,
                y.len()
            )));
        }
        if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
            return Err(GrainError::InvariantViolation(
                "spline nodes must be finite".to_string(),
            ));
        }
        if x.windows(2).any(|w| w[1] <= w[0]) {
            return Err(GrainError::InvariantViolation(
                "spline abscissae must be strictly increasing".to_string(),
            ));
        }

        let delta: Vec<f64> = (0..n - 1)
            .map(|i| (y[i + 1] - y[i]) / (x[i + 1] - x[i]))
            .collect();

        let mut slope = vec![0.0; n];
        slope[0] = delta[0];
        slope[n - 1] = delta[n - 2];
        for i in 1..n - 1 {
            slope[i] = if delta[i - 1] * delta[i] <= 0.0 {
                0.0
            } else {
                // weighted harmonic mean (Fritsch & Butland)
                let h0 = x[i] - x[i - 1];
                let h1 = x[i + 1] - x[i];
                let w0 = 2.0 * h1 + h0;
                let w1 = h1 + 2.0 * h0;
                (w0 + w1) / (w0 / delta[i - 1] + w1 / delta[i])
            };
        }

        Ok(MonotoneSpline {
            x: x.to_vec(),
            y: y.to_vec(),
            slope,
        })
    }

    pub fn x_min(&self) -> f64 {
        self.x[0]
    }

    pub fn x_max(&self) -> f64 {
        self.x[self.x.len() - 1]
    }

    /// Evaluate at `t`; outside the node range the end slopes extrapolate linearly.
    pub fn eval(&self, t: f64) -> f64 {
        self.eval_checked(t).0
    }

    /// Evaluate at `t`, also reporting whether `t` lay outside the node range.
    pub fn eval_checked(&self, t: f64) -> (f64, bool) {
        let n = self.x.len();
        if t < self.x[0] {
            return (self.y[0] + self.slope[0] * (t - self.x[0]), true);
        }
        if t > self.x[n - 1] {
            return (
                self.y[n - 1] + self.slope[n - 1] * (t - self.x[n - 1]),
                true,
            );
        }
        let i = crate::search::interval_index(&self.x, t);
        let h = self.x[i + 1] - self.x[i];
        let s = (t - self.x[i]) / h;
        let s2 = s * s;
        let s3 = s2 * s;
        let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
        let h10 = s3 - 2.0 * s2 + s;
        let h01 = -2.0 * s3 + 3.0 * s2;
        let h11 = s3 - s2;
        (
            h00 * self.y[i]
                + h10 * h * self.slope[i]
                + h01 * self.y[i + 1]
                + h11 * h * self.slope[i + 1],
            false,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_at_nodes() {
        let x = [0.0, 1.0, 2.5, 4.0, 7.0];
        let y = [1.0, 2.0, 2.2, 5.0, 9.0];
        let spline = MonotoneSpline::new(&x, &y).unwrap();
        for (xi, yi) in x.iter().zip(y.iter()) {
            assert_eq!(spline.eval(*xi), *yi, "node {xi}");
        }
    }

    #[test]
    fn test_linear_data_reproduced() {
        let x: Vec<f64> = (0..10).map(|i| i as f64 * 0.7).collect();
        let y: Vec<f64> = x.iter().map(|v| 3.0 * v - 1.0).collect();
        let spline = MonotoneSpline::new(&x, &y).unwrap();
        for t in [0.1, 1.33, 4.9, 6.2] {
            assert!((spline.eval(t) - (3.0 * t - 1.0)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_no_overshoot_on_step() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [0.0, 0.0, 1.0, 1.0];
        let spline = MonotoneSpline::new(&x, &y).unwrap();
        for k in 0..=300 {
            let v = spline.eval(k as f64 * 0.01);
            assert!((0.0..=1.0).contains(&v), "overshoot {v}");
        }
    }

    #[test]
    fn test_extrapolation_flagged() {
        let spline = MonotoneSpline::new(&[0.0, 1.0, 2.0], &[0.0, 1.0, 2.0]).unwrap();
        let (v, out) = spline.eval_checked(3.0);
        assert!(out);
        assert!((v - 3.0).abs() < 1e-12);
        assert!(!spline.eval_checked(1.5).1);
    }

    #[test]
    fn test_rejects_unsorted_nodes() {
        assert!(MonotoneSpline::new(&[0.0, 0.0, 1.0], &[1.0, 2.0, 3.0]).is_err());
        assert!(MonotoneSpline::new(&[0.0], &[1.0]).is_err());
    }
}
