use crate::error::{ProclidarError, Result};
use crate::formats::ScanFile;
use crate::utils::time::TimeSeries;
use crate::wind::{calculate_3d_winds, WindProfile};
use log::{debug, info};
use ndarray::Array2;

/// Wind profiles of a run of three-beam scans on a shared altitude grid. Arrays are
/// (time, altitude) with one time step per file.
#[derive(Debug, Clone)]
pub struct MeanWindsProfile {
    pub altitude: Vec<f64>,
    pub eastward: Array2<f64>,
    pub northward: Array2<f64>,
    pub upward: Array2<f64>,
    pub speed: Array2<f64>,
    pub direction: Array2<f64>,
    /// Time of the first ray of each file
    pub times: TimeSeries,
    pub coverage_start: Option<f64>,
    pub coverage_end: Option<f64>,
}

impl MeanWindsProfile {
    pub fn num_times(&self) -> usize {
        self.times.len()
    }

    pub fn file_date(&self) -> Option<String> {
        self.times.file_date()
    }
}

fn stack_rows(profiles: &[WindProfile], field: fn(&WindProfile) -> &Vec<f64>) -> Array2<f64> {
    let width = profiles.first().map_or(0, |p| field(p).len());
    Array2::from_shape_fn((profiles.len(), width), |(i, j)| field(&profiles[i])[j])
}

/// Reconstructs the wind profile of every file and stacks them in input order.
///
/// # Errors
/// Returns `NoInputFiles` for an empty run, `GeometryPrecondition` for a file without the
/// three-beam pattern, and `AltitudeMismatch` when a file's altitude grid differs from the
/// first file's.
pub fn mean_winds_profile(scans: &[ScanFile]) -> Result<MeanWindsProfile> {
    let first = scans.first().ok_or(ProclidarError::NoInputFiles)?;
    let mut profiles: Vec<WindProfile> = Vec::with_capacity(scans.len());
    let mut times = TimeSeries::default();
    let mut all_times = TimeSeries::default();

    for scan in scans {
        let profile = calculate_3d_winds(scan)?;
        if let Some(reference) = profiles.first() {
            if profile.altitude != reference.altitude {
                Err(ProclidarError::AltitudeMismatch {
                    path: scan.path.clone(),
                })?
            }
        }
        debug!("{:?}: {} wind altitudes", scan.path, profile.altitude.len());
        if let Some(dt) = scan.datetimes.first() {
            times.push(*dt);
        }
        all_times.extend(&scan.time_series());
        profiles.push(profile);
    }

    let altitude = profiles
        .first()
        .map(|p| p.altitude.clone())
        .unwrap_or_default();
    info!(
        "Mean winds profile from {} files starting {:?}: {} altitudes",
        scans.len(),
        first.path,
        altitude.len()
    );

    Ok(MeanWindsProfile {
        eastward: stack_rows(&profiles, |p| &p.eastward),
        northward: stack_rows(&profiles, |p| &p.northward),
        upward: stack_rows(&profiles, |p| &p.upward),
        speed: stack_rows(&profiles, |p| &p.speed),
        direction: stack_rows(&profiles, |p| &p.direction),
        altitude,
        times,
        coverage_start: all_times.coverage_start(),
        coverage_end: all_times.coverage_end(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::testing::{ray, scan};

    fn dbs_scan(hour: f64, gate_length: f64, radial: [f64; 3]) -> ScanFile {
        let gates = |v: f64| [v; 6];
        scan(
            "dbs.hpl",
            gate_length,
            &[
                ray(hour, 0.0, 90.0, &gates(radial[0])),
                ray(hour + 0.001, 90.0, 75.0, &gates(radial[1])),
                ray(hour + 0.002, 360.0, 75.0, &gates(radial[2])),
            ],
        )
    }

    #[test]
    fn one_time_step_per_file() {
        let scans = vec![
            dbs_scan(10.0, 30.0, [-1.0, 0.0, 0.0]),
            dbs_scan(10.5, 30.0, [0.5, 0.0, 0.0]),
        ];
        let profile = mean_winds_profile(&scans).unwrap();
        assert_eq!(profile.num_times(), 2);
        assert_eq!(profile.times.minutes, vec![0, 30]);
        assert_eq!(profile.eastward.dim(), (2, profile.altitude.len()));
        assert!(profile.upward.row(0).iter().all(|&w| w == 1.0));
        assert!(profile.upward.row(1).iter().all(|&w| w == -0.5));
        assert_eq!(profile.altitude[0], 15.0);
    }

    #[test]
    fn changing_altitude_grid_is_rejected() {
        let scans = vec![
            dbs_scan(10.0, 30.0, [0.0; 3]),
            dbs_scan(10.5, 36.0, [0.0; 3]),
        ];
        assert!(matches!(
            mean_winds_profile(&scans),
            Err(ProclidarError::AltitudeMismatch { .. })
        ));
    }

    #[test]
    fn missing_beam_is_rejected() {
        let scans = vec![scan(
            "stare.hpl",
            30.0,
            &[ray(10.0, 0.0, 90.0, &[0.0; 4])],
        )];
        assert!(matches!(
            mean_winds_profile(&scans),
            Err(ProclidarError::GeometryPrecondition(_))
        ));
    }
}
