pub mod header;
pub mod stare;

pub use header::ScanHeader;
pub use stare::{
    par_read_scan_files, parse_scan, read_scan_file, read_scan_files, Gate, Ray, ScanFile,
};
