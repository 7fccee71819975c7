// ─────────────────────────────────────────────────────────────────────
// SCPN Grain Core — Grid Search
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Binary searches on sorted grids.

/// Index of the first grid point strictly above `x`; `grid.len()` if none.
pub fn first_above(grid: &[f64], x: f64) -> usize {
    grid.partition_point(|&v| v <= x)
}

/// Interval `i` with `grid[i] <= x < grid[i + 1]`, clamped to `0..=len-2`.
///
/// `grid` must hold at least two points.
pub fn interval_index(grid: &[f64], x: f64) -> usize {
    let n = grid.len();
    first_above(grid, x).saturating_sub(1).min(n - 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_above() {
        let grid = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(first_above(&grid, 0.5), 0);
        assert_eq!(first_above(&grid, 2.0), 2);
        assert_eq!(first_above(&grid, 2.5), 2);
        assert_eq!(first_above(&grid, 9.0), 4);
    }

    #[test]
    fn test_interval_index_clamps() {
        let grid = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(interval_index(&grid, -1.0), 0);
        assert_eq!(interval_index(&grid, 1.0), 0);
        assert_eq!(interval_index(&grid, 3.5), 2);
        assert_eq!(interval_index(&grid, 4.0), 2);
        assert_eq!(interval_index(&grid, 10.0), 2);
    }
}
