/// Focus range value written by the instrument when the telescope is focused at infinity
pub const INFINITE_FOCUS_RANGE: f64 = 65535.0;

/// Days between the proleptic ordinal of a date and its decimal-day serial number
pub(crate) const DATENUM_EPOCH_OFFSET_DAYS: i64 = 366;

pub(crate) const HOURS_PER_DAY: f64 = 24.0;
pub(crate) const SECONDS_PER_HOUR: f64 = 3600.0;
pub(crate) const SECONDS_PER_DAY: f64 = 86_400.0;
pub(crate) const MICROSECONDS_PER_HOUR: f64 = 3.6e9;

/// Decimal hour below which a backwards step in time is treated as crossing midnight
pub(crate) const ROLLOVER_HOUR_LIMIT: f64 = 1.0;

// QC defaults
pub const DEFAULT_MAX_RANGE: f64 = 9000.0;
pub const DEFAULT_NOISE_BAND: (f64, f64) = (1.0, 1.015);
pub const DEFAULT_NOISE_SIGMA_MULTIPLIER: f64 = 1.5;
pub const DEFAULT_TAIL_WINDOW: usize = 20;
pub const DEFAULT_CURVE_FIT_MULTIPLIER: f64 = 1.2;
pub const DEFAULT_MIN_BACKSCATTER: f64 = 1e-7;
pub const DEFAULT_MAX_BACKSCATTER: f64 = 1e-3;
pub const DEFAULT_VELOCITY_BOUNDS: (f64, f64) = (-19.0, 19.0);
pub const DEFAULT_SHEAR_BOUNDS: (f64, f64) = (-5.0, 5.0);

/// Degree of the polynomial fitted to the log10 backscatter tail
pub(crate) const TAIL_FIT_DEGREE: usize = 2;

// Beam geometry
pub const BEAM_ANGLE_TOLERANCE_DEG: f64 = 0.5;
pub(crate) const ANGLE_ROUNDING_DECIMALS: i32 = 1;
