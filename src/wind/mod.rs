//! Wind vector reconstruction from a three-beam (DBS) scan.
pub mod dbs;

pub use dbs::{calculate_3d_winds, identify_beams, wind_from_direction, BeamGeometry, WindProfile};
