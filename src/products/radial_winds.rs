use crate::error::{ProclidarError, Result};
use crate::formats::ScanFile;
use crate::products::InstrumentAttributes;
use crate::qc::{count_flags, make_flags, QcThresholds, RangeBasis};
use crate::utils::angles::{distinct_angles, round_angle, AngleWarning};
use crate::utils::time::TimeSeries;
use log::{info, warn};
use ndarray::{s, Array2, Array3, ArrayView2};

/// How the rays of a run map onto the (time, range, angle) grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanLayout {
    /// Every ray is a time step; a single pointing direction is expected per file
    #[default]
    Stare,
    /// Every file is a time step and each of its rays is an angle channel
    Beam,
}

/// Aerosol backscatter and radial winds over a run of files. Grids are (time, range, angle).
#[derive(Debug, Clone)]
pub struct RadialWinds {
    pub layout: ScanLayout,
    pub range: Array3<f64>,
    pub velocity: Array3<f64>,
    pub intensity: Array3<f64>,
    pub backscatter: Array3<f64>,
    pub flags: Array3<u8>,
    /// Instrument-frame azimuth of each (time, angle) cell
    pub azimuth: Array2<f64>,
    /// Instrument-frame elevation of each (time, angle) cell
    pub elevation: Array2<f64>,
    /// Time of each step along the time axis
    pub times: TimeSeries,
    /// Unix time of the earliest ray of the run
    pub coverage_start: Option<f64>,
    /// Unix time of the latest ray of the run
    pub coverage_end: Option<f64>,
    pub attributes: InstrumentAttributes,
    pub warnings: Vec<AngleWarning>,
}

impl RadialWinds {
    pub fn num_times(&self) -> usize {
        self.velocity.dim().0
    }

    pub fn num_angles(&self) -> usize {
        self.velocity.dim().2
    }

    /// `YYYYMMDD` of the first time step
    pub fn file_date(&self) -> Option<String> {
        self.times.file_date()
    }
}

/// Per-file grids of the quantities stacked into the product
struct Grids {
    range: Array3<f64>,
    qc_range: Array3<f64>,
    velocity: Array3<f64>,
    intensity: Array3<f64>,
    backscatter: Array3<f64>,
}

impl Grids {
    fn new(shape: (usize, usize, usize)) -> Grids {
        Grids {
            range: Array3::from_elem(shape, f64::NAN),
            qc_range: Array3::from_elem(shape, f64::NAN),
            velocity: Array3::from_elem(shape, f64::NAN),
            intensity: Array3::from_elem(shape, f64::NAN),
            backscatter: Array3::from_elem(shape, f64::NAN),
        }
    }

    fn fields_mut(&mut self) -> [&mut Array3<f64>; 5] {
        [
            &mut self.range,
            &mut self.qc_range,
            &mut self.velocity,
            &mut self.intensity,
            &mut self.backscatter,
        ]
    }

    /// Copies every ray of `scan` into consecutive time steps from `start`, at channel `angle`
    fn fill_times<'a>(
        &mut self,
        scan: &'a ScanFile,
        qc_range: ArrayView2<'a, f64>,
        start: usize,
        angle: usize,
    ) {
        let (rays, gates) = (scan.num_rays(), scan.num_gates().min(self.velocity.dim().1));
        for (grid, source) in self.fields_mut().into_iter().zip(sources(scan, qc_range)) {
            grid.slice_mut(s![start..start + rays, ..gates, angle])
                .assign(&source.slice(s![.., ..gates]));
        }
    }

    /// Copies the first `rays` rays of `scan` into time step `time`, one angle channel each
    fn fill_angles<'a>(
        &mut self,
        scan: &'a ScanFile,
        qc_range: ArrayView2<'a, f64>,
        time: usize,
        rays: usize,
    ) {
        let gates = scan.num_gates().min(self.velocity.dim().1);
        for (grid, source) in self.fields_mut().into_iter().zip(sources(scan, qc_range)) {
            grid.slice_mut(s![time, ..gates, ..rays])
                .assign(&source.slice(s![..rays, ..gates]).t());
        }
    }
}

/// (ray, gate) arrays of a scan in the field order of [`Grids`]
fn sources<'a>(scan: &'a ScanFile, qc_range: ArrayView2<'a, f64>) -> [ArrayView2<'a, f64>; 5] {
    [
        scan.range.view(),
        qc_range,
        scan.velocity.view(),
        scan.intensity.view(),
        scan.backscatter.view(),
    ]
}

fn qc_range(scan: &ScanFile, basis: RangeBasis) -> Array2<f64> {
    match basis {
        RangeBasis::Range => scan.range.clone(),
        RangeBasis::Height => scan.heights(),
    }
}

fn stare_channels(scan: &ScanFile) -> usize {
    distinct_angles(&scan.elevation).len() * distinct_angles(&scan.azimuth).len()
}

/// Stacks a run of scan files into the aerosol-backscatter/radial-winds product and flags every
/// sample. Files keep their input order along the time axis.
///
/// # Errors
/// Returns `NoInputFiles` for an empty run.
pub fn radial_winds(
    scans: &[ScanFile],
    layout: ScanLayout,
    thresholds: &QcThresholds,
) -> Result<RadialWinds> {
    let first = scans.first().ok_or(ProclidarError::NoInputFiles)?;
    let gates = scans.iter().map(ScanFile::num_gates).max().unwrap_or_default();
    let mut warnings = vec![];
    let mut all_times = TimeSeries::default();
    for scan in scans {
        all_times.extend(&scan.time_series());
    }

    let (grids, azimuth, elevation, times) = match layout {
        ScanLayout::Stare => {
            let num_times: usize = scans.iter().map(ScanFile::num_rays).sum();
            let mut channels = 1;
            for (file_index, scan) in scans.iter().enumerate() {
                let file_channels = stare_channels(scan);
                if file_channels > 1 {
                    warnings.push(AngleWarning {
                        file_index,
                        channels: file_channels,
                        azimuths: distinct_angles(&scan.azimuth),
                        elevations: distinct_angles(&scan.elevation),
                    });
                }
                channels = channels.max(file_channels);
            }

            let mut grids = Grids::new((num_times, gates, channels));
            let mut azimuth = Array2::from_elem((num_times, 1), f64::NAN);
            let mut elevation = Array2::from_elem((num_times, 1), f64::NAN);
            let mut start = 0;
            for scan in scans {
                grids.fill_times(scan, qc_range(scan, thresholds.range_basis).view(), start, 0);
                for (ray, (az, el)) in scan.azimuth.iter().zip(&scan.elevation).enumerate() {
                    azimuth[[start + ray, 0]] = round_angle(*az);
                    elevation[[start + ray, 0]] = round_angle(*el);
                }
                start += scan.num_rays();
            }
            (grids, azimuth, elevation, all_times.clone())
        }
        ScanLayout::Beam => {
            let channels = first.num_rays();
            let mut grids = Grids::new((scans.len(), gates, channels));
            let mut azimuth = Array2::from_elem((scans.len(), channels), f64::NAN);
            let mut elevation = Array2::from_elem((scans.len(), channels), f64::NAN);
            let mut times = TimeSeries::default();
            for (file_index, scan) in scans.iter().enumerate() {
                if scan.num_rays() != channels {
                    warnings.push(AngleWarning {
                        file_index,
                        channels: scan.num_rays(),
                        azimuths: scan.azimuth.clone(),
                        elevations: scan.elevation.clone(),
                    });
                }
                let rays = scan.num_rays().min(channels);
                let qc_range = qc_range(scan, thresholds.range_basis);
                grids.fill_angles(scan, qc_range.view(), file_index, rays);
                for ray in 0..rays {
                    azimuth[[file_index, ray]] = scan.azimuth[ray];
                    elevation[[file_index, ray]] = scan.elevation[ray];
                }
                if let Some(dt) = scan.datetimes.first() {
                    times.push(*dt);
                }
            }
            (grids, azimuth, elevation, times)
        }
    };

    for warning in &warnings {
        warn!("{warning}");
    }

    let flags = make_flags(
        grids.qc_range.view(),
        grids.velocity.view(),
        grids.intensity.view(),
        grids.backscatter.view(),
        thresholds,
    );
    info!(
        "Radial winds from {} files: {:?} grid, flag counts {:?}",
        scans.len(),
        flags.dim(),
        count_flags(flags.iter())
    );

    Ok(RadialWinds {
        layout,
        range: grids.range,
        velocity: grids.velocity,
        intensity: grids.intensity,
        backscatter: grids.backscatter,
        flags,
        azimuth,
        elevation,
        times,
        coverage_start: all_times.coverage_start(),
        coverage_end: all_times.coverage_end(),
        attributes: InstrumentAttributes::from(&first.header),
        warnings,
    })
}
