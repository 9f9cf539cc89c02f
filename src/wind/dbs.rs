use crate::error::{ProclidarError, Result};
use crate::formats::ScanFile;
use crate::utils::constants::BEAM_ANGLE_TOLERANCE_DEG;
use crate::utils::search::{find_closest, SearchMode};
use log::debug;
use nalgebra::{Matrix3, Vector3};

/// Ray indices of the three beams of a DBS scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeamGeometry {
    /// Beam at elevation 90
    pub vertical: usize,
    /// Tilted beam at azimuth 90
    pub east: usize,
    /// Tilted beam at azimuth 0/360
    pub north: usize,
}

/// Wind components on a fixed altitude grid, one entry per altitude
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindProfile {
    pub altitude: Vec<f64>,
    pub eastward: Vec<f64>,
    pub northward: Vec<f64>,
    pub upward: Vec<f64>,
    /// Horizontal wind speed
    pub speed: Vec<f64>,
    /// Direction the wind blows from, degrees clockwise from north
    pub direction: Vec<f64>,
    /// Gate matched in the (vertical, east, north) beams for each altitude
    pub gate_indices: Vec<[usize; 3]>,
}

fn near(angle: f64, target: f64) -> bool {
    (angle - target).abs() < BEAM_ANGLE_TOLERANCE_DEG
}

fn unique_beam(candidates: &[usize], name: &str) -> Result<usize> {
    match candidates {
        [index] => Ok(*index),
        [] => Err(ProclidarError::GeometryPrecondition(format!(
            "no {name} beam found"
        ))),
        _ => Err(ProclidarError::GeometryPrecondition(format!(
            "{} candidate {name} beams (rays {candidates:?})",
            candidates.len()
        ))),
    }
}

/// Finds the vertical, azimuth-90 and azimuth-0/360 beams among the rays of a scan.
///
/// # Errors
/// Returns `GeometryPrecondition` unless each beam matches exactly one ray.
pub fn identify_beams(azimuth: &[f64], elevation: &[f64]) -> Result<BeamGeometry> {
    let rays = azimuth.len().min(elevation.len());
    let vertical_rays: Vec<usize> = (0..rays).filter(|&i| near(elevation[i], 90.0)).collect();
    let vertical = unique_beam(&vertical_rays, "vertical")?;

    let tilted = (0..rays).filter(|&i| i != vertical);
    let east_rays: Vec<usize> = tilted.clone().filter(|&i| near(azimuth[i], 90.0)).collect();
    let north_rays: Vec<usize> = tilted
        .filter(|&i| near(azimuth[i], 0.0) || near(azimuth[i], 360.0))
        .collect();

    Ok(BeamGeometry {
        vertical,
        east: unique_beam(&east_rays, "azimuth 90")?,
        north: unique_beam(&north_rays, "azimuth 0/360")?,
    })
}

/// Maps the (vertical, east, north) radial velocities onto (eastward, northward, upward) wind.
///
/// Each tilted beam sees a mix of its horizontal component and the vertical wind, weighted by
/// the tangent and secant of its elevation. The vertical beam sees the upward component alone.
#[rustfmt::skip]
pub fn inversion_matrix(east_elevation: f64, north_elevation: f64) -> Matrix3<f64> {
    let (east_el, north_el) = (east_elevation.to_radians(), north_elevation.to_radians());
    Matrix3::new(
        east_el.tan(), -1.0 / east_el.cos(), 0.0,
        north_el.tan(), 0.0, -1.0 / north_el.cos(),
        -1.0, 0.0, 0.0,
    )
}

/// Meteorological wind-from direction in degrees.
///
/// With no northward component the wind is from 270 when eastward is non-negative and from 90
/// otherwise. Otherwise the arctangent of eastward/northward is shifted by 180 for a positive
/// northward component, and by 360 for a negative northward with positive eastward component.
pub fn wind_from_direction(eastward: f64, northward: f64) -> f64 {
    if northward == 0.0 {
        return if eastward >= 0.0 { 270.0 } else { 90.0 };
    }
    let mut direction = (eastward / northward).atan().to_degrees();
    if northward > 0.0 {
        direction += 180.0;
    }
    if northward < 0.0 && eastward > 0.0 {
        direction += 360.0;
    }
    direction
}

/// Reconstructs the wind profile of a single three-beam scan.
///
/// The altitude grid is the vertical beam's gate ranges, cut at the lowest top gate height of
/// the three beams. For every grid altitude the closest gate of each beam is matched by
/// elevation-projected height.
///
/// # Errors
/// Returns `GeometryPrecondition` if the three beams cannot be identified.
pub fn calculate_3d_winds(scan: &ScanFile) -> Result<WindProfile> {
    let geometry = identify_beams(&scan.azimuth, &scan.elevation)?;
    if scan.num_gates() == 0 {
        Err(ProclidarError::GeometryPrecondition(
            "scan has no gates".to_string(),
        ))?
    }
    let heights = scan.heights();
    let beams = [geometry.vertical, geometry.east, geometry.north];
    let beam_heights: Vec<Vec<f64>> = beams.iter().map(|&b| heights.row(b).to_vec()).collect();

    let max_height = beam_heights
        .iter()
        .filter_map(|h| h.last().copied())
        .fold(f64::INFINITY, f64::min);
    let altitude: Vec<f64> = scan
        .range
        .row(geometry.vertical)
        .iter()
        .copied()
        .filter(|&a| a <= max_height)
        .collect();

    let inversion = inversion_matrix(
        scan.elevation[geometry.east],
        scan.elevation[geometry.north],
    );

    let mut profile = WindProfile {
        altitude,
        ..Default::default()
    };
    for &target in &profile.altitude {
        let mut gate_indices = [0usize; 3];
        for (slot, heights) in gate_indices.iter_mut().zip(&beam_heights) {
            *slot = find_closest(heights, target, SearchMode::Closest)
                .map(|n| n.index())
                .unwrap_or_default();
        }
        let radial = Vector3::new(
            scan.velocity[[geometry.vertical, gate_indices[0]]],
            scan.velocity[[geometry.east, gate_indices[1]]],
            scan.velocity[[geometry.north, gate_indices[2]]],
        );
        let wind = inversion * radial;
        let (eastward, northward, upward) = (wind[0], wind[1], wind[2]);

        profile.eastward.push(eastward);
        profile.northward.push(northward);
        profile.upward.push(upward);
        profile.speed.push(eastward.hypot(northward));
        profile.direction.push(wind_from_direction(eastward, northward));
        profile.gate_indices.push(gate_indices);
    }

    debug!(
        "Wind profile of {:?}: {} altitudes up to {max_height:.1} m",
        scan.path,
        profile.altitude.len()
    );
    Ok(profile)
}
