//! Local-maximum extraction and minimum-distance suppression.

use nvision_spec::Peak;

use crate::grid::Grid;

/// Finds interior cells above `threshold` that no 8-neighbour exceeds.
///
/// The one-cell border is never a candidate. Ties with a neighbour do not
/// disqualify a cell, so a flat-topped peak yields several adjacent
/// candidates; suppression keeps the first one scanned. Candidates are
/// returned in row-major order.
pub fn local_maxima(smoothed: &Grid, threshold: f64) -> Vec<Peak> {
    let mut candidates = Vec::new();
    if smoothed.width < 3 || smoothed.height < 3 {
        return candidates;
    }

    for row in 1..smoothed.height - 1 {
        for col in 1..smoothed.width - 1 {
            let value = smoothed.get(row, col);
            if value > threshold && is_local_max(smoothed, row, col, value) {
                candidates.push(Peak::new(row, col));
            }
        }
    }

    candidates
}

fn is_local_max(grid: &Grid, row: usize, col: usize, value: f64) -> bool {
    for r in row - 1..=row + 1 {
        for c in col - 1..=col + 1 {
            if (r, c) != (row, col) && grid.get(r, c) > value {
                return false;
            }
        }
    }
    true
}

/// Greedy minimum-distance filter.
///
/// Walks `candidates` in order and keeps a candidate only if it is at least
/// `min_distance` away from every peak already kept. Earlier candidates
/// always win regardless of intensity.
pub fn suppress_close(candidates: &[Peak], min_distance: u32) -> Vec<Peak> {
    let min_distance = f64::from(min_distance);
    let mut accepted: Vec<Peak> = Vec::new();

    for candidate in candidates {
        let clear = accepted
            .iter()
            .all(|kept| kept.distance_to(candidate) >= min_distance);
        if clear {
            accepted.push(*candidate);
        }
    }

    accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_border_never_candidate() {
        let mut grid = Grid::filled(5, 5, 0.0);
        grid.set(0, 2, 10.0);
        grid.set(4, 4, 10.0);
        assert!(local_maxima(&grid, 1.0).is_empty());
    }

    #[test]
    fn test_ties_do_not_disqualify() {
        let mut grid = Grid::filled(5, 5, 0.0);
        grid.set(2, 1, 5.0);
        grid.set(2, 2, 5.0);
        assert_eq!(
            local_maxima(&grid, 1.0),
            vec![Peak::new(2, 1), Peak::new(2, 2)]
        );
    }

    #[test]
    fn test_greater_neighbour_disqualifies() {
        let mut grid = Grid::filled(5, 5, 0.0);
        grid.set(2, 2, 5.0);
        grid.set(1, 1, 6.0);
        assert_eq!(local_maxima(&grid, 1.0), vec![Peak::new(1, 1)]);
    }

    #[test]
    fn test_threshold_is_strict() {
        let mut grid = Grid::filled(5, 5, 0.0);
        grid.set(2, 2, 5.0);
        assert!(local_maxima(&grid, 5.0).is_empty());
        assert_eq!(local_maxima(&grid, 4.9), vec![Peak::new(2, 2)]);
    }

    #[test]
    fn test_suppression_is_order_dependent() {
        let candidates = vec![Peak::new(1, 1), Peak::new(1, 4), Peak::new(5, 1)];
        assert_eq!(
            suppress_close(&candidates, 4),
            vec![Peak::new(1, 1), Peak::new(5, 1)]
        );
    }

    #[test]
    fn test_suppression_accepts_exact_distance() {
        let candidates = vec![Peak::new(0, 0), Peak::new(3, 4)];
        assert_eq!(suppress_close(&candidates, 5), candidates);
        assert_eq!(suppress_close(&candidates, 6), vec![Peak::new(0, 0)]);
    }
}
