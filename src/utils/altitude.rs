use ndarray::{Array2, ArrayView2, Axis};

/// Distance to the centre of a range gate.
pub fn gate_range(range_index: u32, gate_length: f64) -> f64 {
    (range_index as f64 + 0.5) * gate_length
}

/// Converts every (ray, gate) range index into the distance to the gate centre.
pub fn gate_range_to_altitude(range_indices: ArrayView2<u32>, gate_length: f64) -> Array2<f64> {
    range_indices.mapv(|index| gate_range(index, gate_length))
}

/// Projects per-gate ranges onto the vertical using each ray's elevation angle (degrees).
pub fn project_to_vertical(ranges: ArrayView2<f64>, elevations: &[f64]) -> Array2<f64> {
    let mut heights = ranges.to_owned();
    for (mut row, elevation) in heights.axis_iter_mut(Axis(0)).zip(elevations) {
        let factor = elevation.to_radians().sin();
        row.mapv_inplace(|r| r * factor);
    }
    heights
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn heights_are_gate_centres() {
        let indices = array![[0u32, 1, 2], [0, 1, 2]];
        let heights = gate_range_to_altitude(indices.view(), 30.0);
        assert_eq!(heights, array![[15.0, 45.0, 75.0], [15.0, 45.0, 75.0]]);
    }

    #[test]
    fn heights_strictly_increase_with_range_index() {
        for gate_length in [0.1, 3.0, 30.0, 48.0] {
            let heights: Vec<f64> = (0..500).map(|i| gate_range(i, gate_length)).collect();
            assert!(heights.windows(2).all(|w| w[1] > w[0]));
        }
    }

    #[test]
    fn vertical_projection_uses_elevation() {
        let ranges = array![[100.0, 200.0], [100.0, 200.0]];
        let heights = project_to_vertical(ranges.view(), &[90.0, 30.0]);
        assert_eq!(heights.row(0).to_vec(), vec![100.0, 200.0]);
        assert!((heights[[1, 0]] - 50.0).abs() < 1e-9);
        assert!((heights[[1, 1]] - 100.0).abs() < 1e-9);
    }
}
