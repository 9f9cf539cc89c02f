use crate::utils::constants::ANGLE_ROUNDING_DECIMALS;
use itertools::Itertools;
use std::fmt;

fn rounding_scale() -> f64 {
    10f64.powi(ANGLE_ROUNDING_DECIMALS)
}

/// Angle rounded to a tenth of a degree
pub fn round_angle(angle: f64) -> f64 {
    let scale = rounding_scale();
    (angle * scale).round() / scale
}

/// Distinct angles after rounding to a tenth of a degree, in order of first appearance.
pub fn distinct_angles(angles: &[f64]) -> Vec<f64> {
    let scale = rounding_scale();
    angles
        .iter()
        .map(|a| (a * scale).round() as i64)
        .unique()
        .map(|a| a as f64 / scale)
        .collect()
}

/// Raised (as a value, not an error) when a file holds more pointing directions than the
/// product layout expects. Only the first angle channel is populated in that case.
#[derive(Debug, Clone, PartialEq)]
pub struct AngleWarning {
    pub file_index: usize,
    pub channels: usize,
    pub azimuths: Vec<f64>,
    pub elevations: Vec<f64>,
}

impl fmt::Display for AngleWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "More than one elevation/azimuth angle ({}) in file {}, only the first is processed. \
             Azimuths: {:?}, elevations: {:?}",
            self.channels, self.file_index, self.azimuths, self.elevations
        )
    }
}
