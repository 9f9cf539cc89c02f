use crate::error::{ProclidarError, Result};
use crate::formats::header::{parse_header, ScanHeader};
use crate::utils::altitude::{gate_range_to_altitude, project_to_vertical};
use crate::utils::time::{correct_rollover, decimal_day, ray_datetime, TimeSeries};
use chrono::NaiveDateTime;
use log::debug;
use ndarray::Array2;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// One range bin of a ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gate {
    pub range_index: u32,
    pub radial_velocity: f64, // m/s, positive away from the instrument
    pub intensity: f64,       // SNR + 1
    pub backscatter: f64,     // m^-1 sr^-1
}

/// One sweep of range gates at a single time and pointing direction
#[derive(Debug, Clone, PartialEq)]
pub struct Ray {
    pub hour: f64, // decimal hour as written in the file
    pub azimuth: f64,
    pub elevation: f64,
    pub gates: Vec<Gate>,
}

/// A fully parsed scan file. Per-gate arrays are shaped (ray, gate).
#[derive(Debug, Clone)]
pub struct ScanFile {
    pub path: PathBuf,
    pub header: ScanHeader,
    /// Decimal hours as written in the file
    pub decimal_hours: Vec<f64>,
    /// Decimal hours after the midnight rollover correction
    pub absolute_hours: Vec<f64>,
    pub datetimes: Vec<NaiveDateTime>,
    /// Decimal-day serial number of each ray
    pub decimal_days: Vec<f64>,
    pub azimuth: Vec<f64>,
    pub elevation: Vec<f64>,
    pub range_index: Array2<u32>,
    /// Distance to each gate centre, metres
    pub range: Array2<f64>,
    pub velocity: Array2<f64>,
    pub intensity: Array2<f64>,
    pub backscatter: Array2<f64>,
}

impl ScanFile {
    /// Assembles the per-ray and per-gate arrays from parsed rays.
    ///
    /// # Errors
    /// Returns `TruncatedRay` if a ray has fewer gates than the header declares, and
    /// `InvalidRayTime` if a ray's rollover-corrected hour is not a representable time.
    pub fn from_rays(path: &Path, header: ScanHeader, rays: &[Ray]) -> Result<ScanFile> {
        let num_rays = rays.len();
        let num_gates = header.gate_number;
        let short_ray = rays
            .iter()
            .enumerate()
            .find(|(_, r)| r.gates.len() < num_gates);
        if let Some((ray, short)) = short_ray {
            Err(ProclidarError::TruncatedRay {
                path: path.to_path_buf(),
                ray,
                expected: num_gates,
                found: short.gates.len(),
            })?
        }
        let gate_field = |field: fn(&Gate) -> f64| {
            Array2::from_shape_fn((num_rays, num_gates), |(i, j)| field(&rays[i].gates[j]))
        };

        let decimal_hours: Vec<f64> = rays.iter().map(|r| r.hour).collect();
        let absolute_hours = correct_rollover(&decimal_hours);
        let datetimes = absolute_hours
            .iter()
            .enumerate()
            .map(|(ray, &hour)| {
                ray_datetime(header.start_date, hour).ok_or_else(|| {
                    ProclidarError::InvalidRayTime {
                        path: path.to_path_buf(),
                        ray,
                        hour,
                    }
                })
            })
            .collect::<Result<Vec<NaiveDateTime>>>()?;
        let decimal_days = absolute_hours
            .iter()
            .map(|&h| decimal_day(header.start_date, h))
            .collect();
        let range_index = Array2::from_shape_fn((num_rays, num_gates), |(i, j)| {
            rays[i].gates[j].range_index
        });
        let range = gate_range_to_altitude(range_index.view(), header.gate_length);

        Ok(ScanFile {
            path: path.to_path_buf(),
            decimal_hours,
            absolute_hours,
            datetimes,
            decimal_days,
            azimuth: rays.iter().map(|r| r.azimuth).collect(),
            elevation: rays.iter().map(|r| r.elevation).collect(),
            range_index,
            range,
            velocity: gate_field(|g| g.radial_velocity),
            intensity: gate_field(|g| g.intensity),
            backscatter: gate_field(|g| g.backscatter),
            header,
        })
    }

    pub fn num_rays(&self) -> usize {
        self.azimuth.len()
    }

    pub fn num_gates(&self) -> usize {
        self.header.gate_number
    }

    /// Calendar breakdown of every ray time
    pub fn time_series(&self) -> TimeSeries {
        TimeSeries::new(&self.datetimes)
    }

    /// Decimal-day serial number broadcast over every gate of every ray
    pub fn decimal_day_grid(&self) -> Array2<f64> {
        Array2::from_shape_fn((self.num_rays(), self.num_gates()), |(i, _)| {
            self.decimal_days[i]
        })
    }

    /// Gate ranges projected onto the vertical with each ray's elevation
    pub fn heights(&self) -> Array2<f64> {
        project_to_vertical(self.range.view(), &self.elevation)
    }
}

fn next_line<I>(lines: &mut I, path: &Path) -> Result<Option<(usize, String)>>
where
    I: Iterator<Item = (usize, std::io::Result<String>)>,
{
    match lines.next() {
        None => Ok(None),
        Some((index, line)) => {
            let line = line.map_err(|source| ProclidarError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            Ok(Some((index + 1, line)))
        }
    }
}

fn parse_time_line(line: &str, path: &Path, line_no: usize) -> Result<(f64, f64, f64)> {
    let malformed = |message: String| ProclidarError::MalformedRay {
        path: path.to_path_buf(),
        line: line_no,
        message,
    };
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 3 {
        Err(malformed(format!(
            "expected 'time azimuth elevation', found '{}'",
            line.trim()
        )))?
    }
    let mut values = [0.0; 3];
    for (value, field) in values.iter_mut().zip(&fields) {
        *value = field
            .parse::<f64>()
            .map_err(|_| malformed(format!("cannot parse '{field}' as a number")))?;
        if !value.is_finite() {
            Err(malformed(format!("'{field}' is not a finite number")))?
        }
    }
    Ok((values[0], values[1], values[2]))
}

fn parse_gate_line(fields: &[&str]) -> Option<Gate> {
    Some(Gate {
        range_index: fields[0].parse::<u32>().ok()?,
        radial_velocity: fields[1].parse::<f64>().ok()?,
        intensity: fields[2].parse::<f64>().ok()?,
        backscatter: fields[3].parse::<f64>().ok()?,
    })
}

/// Parses a scan from any buffered reader. `path` is only used in error messages.
///
/// # Errors
/// Returns `MalformedHeader` for a bad header, `TruncatedRay` when a ray has fewer gate lines
/// than the header declares, and `MalformedRay` for unparsable numeric fields.
pub fn parse_scan<R: BufRead>(reader: R, path: &Path) -> Result<ScanFile> {
    let mut lines = reader.lines().enumerate();
    let header = parse_header(&mut lines, path)?;
    let gate_number = header.gate_number;

    let mut rays: Vec<Ray> = vec![];
    while let Some((line_no, time_line)) = next_line(&mut lines, path)? {
        if time_line.trim().is_empty() {
            continue;
        }
        let (hour, azimuth, elevation) = parse_time_line(&time_line, path, line_no)?;
        let truncated = |found: usize| ProclidarError::TruncatedRay {
            path: path.to_path_buf(),
            ray: rays.len(),
            expected: gate_number,
            found,
        };

        let mut gates = Vec::new();
        while gates.len() < gate_number {
            let (gate_line_no, gate_line) =
                next_line(&mut lines, path)?.ok_or_else(|| truncated(gates.len()))?;
            let fields: Vec<&str> = gate_line.split_whitespace().collect();
            // anything short of four fields (a blank line or the next time line) ends the ray
            if fields.len() < 4 {
                Err(truncated(gates.len()))?
            }
            let gate = parse_gate_line(&fields).ok_or_else(|| ProclidarError::MalformedRay {
                path: path.to_path_buf(),
                line: gate_line_no,
                message: format!("cannot parse gate line '{}'", gate_line.trim()),
            })?;
            gates.push(gate);
        }
        rays.push(Ray {
            hour,
            azimuth,
            elevation,
            gates,
        });
    }

    debug!(
        "Read {} rays of {} gates from {:?}",
        rays.len(),
        gate_number,
        path
    );
    ScanFile::from_rays(path, header, &rays)
}

/// Reads and parses a single scan file.
pub fn read_scan_file(path: impl AsRef<Path>) -> Result<ScanFile> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| ProclidarError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_scan(BufReader::new(file), path)
}

/// Reads scan files one at a time, in input order. The first failure aborts the run.
pub fn read_scan_files<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<ScanFile>> {
    paths.iter().map(read_scan_file).collect()
}

/// Reads scan files in parallel. Results keep input order, and the first failure in input
/// order is returned.
pub fn par_read_scan_files<P: AsRef<Path> + Sync>(paths: &[P]) -> Result<Vec<ScanFile>> {
    let results: Vec<Result<ScanFile>> = paths.par_iter().map(read_scan_file).collect();

    let mut scans = vec![];
    for res in results {
        match res {
            Ok(x) => scans.push(x),
            Err(e) => Err(e)?,
        }
    }
    Ok(scans)
}
