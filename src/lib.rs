//! Processing of raw Doppler lidar scans into quality-controlled radial winds and
//! three-beam wind profiles.
use crate::error::Result;
use log::info;
use std::path::Path;

pub mod error;
pub mod formats;
pub mod products;
pub mod qc;
pub mod utils;
pub mod wind;

pub use crate::error::ProclidarError;
pub use crate::formats::{read_scan_file, ScanFile, ScanHeader};
pub use crate::products::{
    mean_winds_profile, radial_winds, MeanWindsProfile, Product, RadialWinds, ScanLayout,
};
pub use crate::qc::{make_flags, QcFlag, QcThresholds, RangeBasis};
pub use crate::wind::{calculate_3d_winds, WindProfile};

/// Reads a run of scan files, in parallel if requested. Results keep the input order.
pub fn load_scans<P: AsRef<Path> + Sync>(files: &[P], parallel: bool) -> Result<Vec<ScanFile>> {
    if files.is_empty() {
        Err(ProclidarError::NoInputFiles)?
    }
    info!("Reading {} scan files", files.len());
    if parallel {
        formats::par_read_scan_files(files)
    } else {
        formats::read_scan_files(files)
    }
}

/// Reads scan files and builds the aerosol-backscatter/radial-winds product.
pub fn process_radial_winds<P: AsRef<Path> + Sync>(
    files: &[P],
    layout: ScanLayout,
    thresholds: &QcThresholds,
    parallel: bool,
) -> Result<RadialWinds> {
    let scans = load_scans(files, parallel)?;
    radial_winds(&scans, layout, thresholds)
}

/// Reads three-beam scan files and builds the mean-winds profile.
pub fn process_wind_profile<P: AsRef<Path> + Sync>(
    files: &[P],
    parallel: bool,
) -> Result<MeanWindsProfile> {
    let scans = load_scans(files, parallel)?;
    mean_winds_profile(&scans)
}
