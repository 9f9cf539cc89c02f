use std::path::PathBuf;
use thiserror::Error;

/// Enum of the possible error variants that may be encountered while processing lidar scans
#[derive(Error, Debug)]
pub enum ProclidarError {
    /// Unable to open or read a scan file
    #[error("Unable to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A required header key is missing or its value cannot be parsed
    #[error("Malformed header in {path:?}: {message}")]
    MalformedHeader { path: PathBuf, message: String },

    /// A time or gate line whose numeric fields cannot be parsed
    #[error("Malformed ray in {path:?} at line {line}: {message}")]
    MalformedRay {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// Fewer gate lines than the header declares, or the file ends mid-ray
    #[error("Truncated ray {ray} in {path:?}: expected {expected} gates, found {found}")]
    TruncatedRay {
        path: PathBuf,
        ray: usize,
        expected: usize,
        found: usize,
    },

    /// A ray time that cannot be placed on the calendar
    #[error("Ray {ray} in {path:?} has an unrepresentable time of {hour} hours")]
    InvalidRayTime {
        path: PathBuf,
        ray: usize,
        hour: f64,
    },

    /// The three beams required for wind reconstruction cannot be identified
    #[error("Cannot identify three-beam geometry: {0}")]
    GeometryPrecondition(String),

    /// Profiles combined in one run do not share the same altitude grid
    #[error("Altitude grid of {path:?} differs from the first file of the run")]
    AltitudeMismatch { path: PathBuf },

    /// A product was requested with an empty file list
    #[error("No input files given")]
    NoInputFiles,

    /// Product name not recognised
    #[error("Unknown product '{0}'")]
    UnknownProduct(String),
}

pub type Result<T> = std::result::Result<T, ProclidarError>;
