use clap::{Parser, ValueEnum};
use log::warn;
use proclidar::qc::count_flags;
use proclidar::{
    load_scans, mean_winds_profile, radial_winds, Product, QcThresholds, RangeBasis, ScanLayout,
};
use std::path::PathBuf;

pub type BinResult<T, E = Box<dyn std::error::Error + Send + Sync>> = Result<T, E>;

fn main() {
    env_logger::init();
    if let Err(e) = bin_main() {
        eprintln!("error: {e}");
        if let Some(e) = e.source() {
            eprintln!("error: {e}")
        }
        std::process::exit(1);
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ScanType {
    /// One pointing direction, every ray is a time step
    Stare,
    /// Repeating three-beam pattern, every file is a time step
    WindProfile,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Raw lidar scan file(s)
    #[arg(num_args = 1..)]
    infiles: Vec<PathBuf>,

    /// Products to build
    #[arg(short, long, num_args = 1.., default_value = "aerosol-backscatter-radial-winds")]
    products: Vec<String>,

    /// Scan pattern of the input files
    #[arg(long, value_enum, default_value = "stare")]
    scan_type: ScanType,

    /// Read input files in parallel
    #[arg(long, action = clap::ArgAction::SetTrue)]
    parallel: bool,

    /// Maximum range in metres before data is flagged
    #[arg(long, default_value = "9000")]
    max_range: f64,

    /// Compare the elevation-projected height against the maximum range
    #[arg(long, action = clap::ArgAction::SetTrue)]
    range_as_height: bool,

    /// Minimum backscatter coefficient
    #[arg(long, default_value = "1e-7")]
    min_backscatter: f64,

    /// Maximum backscatter coefficient
    #[arg(long, default_value = "1e-3")]
    max_backscatter: f64,

    /// Largest absolute radial velocity in m/s
    #[arg(long, default_value = "19")]
    max_velocity: f64,

    /// Largest absolute velocity change between adjacent gates in m/s
    #[arg(long, default_value = "5")]
    max_shear: f64,
}

impl Args {
    fn thresholds(&self) -> QcThresholds {
        QcThresholds {
            max_range: self.max_range,
            range_basis: if self.range_as_height {
                RangeBasis::Height
            } else {
                RangeBasis::Range
            },
            min_backscatter: self.min_backscatter,
            max_backscatter: self.max_backscatter,
            velocity_bounds: (-self.max_velocity, self.max_velocity),
            shear_bounds: (-self.max_shear, self.max_shear),
            ..Default::default()
        }
    }
}

fn bin_main() -> BinResult<()> {
    let args = Args::parse();

    let mut products = vec![];
    for name in &args.products {
        match name.parse::<Product>() {
            Ok(product) if product.is_implemented() => products.push(product),
            Ok(product) => {
                warn!("{product} is not yet implemented, continuing with other products")
            }
            Err(e) => warn!("{e}, continuing with other products"),
        }
    }
    if products.is_empty() {
        return Ok(());
    }

    let scans = load_scans(&args.infiles, args.parallel)?;
    for product in products {
        match product {
            Product::AerosolBackscatterRadialWinds => {
                let layout = match args.scan_type {
                    ScanType::Stare => ScanLayout::Stare,
                    ScanType::WindProfile => ScanLayout::Beam,
                };
                let winds = radial_winds(&scans, layout, &args.thresholds())?;
                println!(
                    "{product} {}: {} times x {} gates x {} angles",
                    winds.file_date().unwrap_or_default(),
                    winds.num_times(),
                    winds.attributes.number_of_gates,
                    winds.num_angles()
                );
                for (flag, count) in count_flags(winds.flags.iter()) {
                    println!("  flag {flag}: {count}");
                }
            }
            Product::MeanWindsProfile => {
                let profile = mean_winds_profile(&scans)?;
                println!(
                    "{product} {}: {} times x {} altitudes",
                    profile.file_date().unwrap_or_default(),
                    profile.num_times(),
                    profile.altitude.len()
                );
            }
            Product::DepolarisationRatio => {}
        }
    }
    Ok(())
}
