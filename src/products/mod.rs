//! Aggregated data products built from a run of scan files.
pub mod radial_winds;
pub mod wind_profile;

pub use radial_winds::{radial_winds, RadialWinds, ScanLayout};
pub use wind_profile::{mean_winds_profile, MeanWindsProfile};

use crate::error::ProclidarError;
use crate::formats::ScanHeader;
use std::fmt;
use std::str::FromStr;

/// Data products the processing chain knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Product {
    AerosolBackscatterRadialWinds,
    MeanWindsProfile,
    DepolarisationRatio,
}

impl Product {
    pub fn name(self) -> &'static str {
        match self {
            Product::AerosolBackscatterRadialWinds => "aerosol-backscatter-radial-winds",
            Product::MeanWindsProfile => "mean-winds-profile",
            Product::DepolarisationRatio => "depolarisation-ratio",
        }
    }

    /// Whether the product can be built. Recognised products that cannot are skipped with a
    /// warning.
    pub fn is_implemented(self) -> bool {
        !matches!(self, Product::DepolarisationRatio)
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Product {
    type Err = ProclidarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "aerosol-backscatter-radial-winds" => Ok(Product::AerosolBackscatterRadialWinds),
            "mean-winds-profile" => Ok(Product::MeanWindsProfile),
            "depolarisation-ratio" => Ok(Product::DepolarisationRatio),
            other => Err(ProclidarError::UnknownProduct(other.to_string())),
        }
    }
}

/// Instrument settings reported with a product, taken from the first file of the run
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentAttributes {
    pub pulses_per_ray: u32,
    pub rays_per_point: u32,
    /// Focus range in metres, `None` when focused at infinity
    pub focus: Option<f64>,
    pub velocity_resolution: f64,
    pub number_of_gates: usize,
    pub gate_length: f64,
}

impl InstrumentAttributes {
    /// Focus as reported in product metadata, e.g. `1500m` or `Inf`
    pub fn focus_label(&self) -> String {
        match self.focus {
            Some(focus) => format!("{}m", focus as i64),
            None => "Inf".to_string(),
        }
    }
}

impl From<&ScanHeader> for InstrumentAttributes {
    fn from(header: &ScanHeader) -> Self {
        InstrumentAttributes {
            pulses_per_ray: header.pulses_per_ray,
            rays_per_point: header.rays_per_point,
            focus: header.focus(),
            velocity_resolution: header.velocity_resolution,
            number_of_gates: header.gate_number,
            gate_length: header.gate_length,
        }
    }
}
