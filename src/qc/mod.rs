//! Quality control of per-gate lidar measurements.
//!
//! Every sample starts as [`QcFlag::Good`]. The rules in [`QcRule::ORDER`] are then applied one
//! after another over the whole (ray, gate) grid of an angle channel, and each rule overwrites
//! the samples it matches. The final flag is the one set by the last matching rule, so a sample
//! beyond the maximum range with an excessive velocity ends up as 4, not 2.
pub mod flags;
pub(crate) mod least_squares;
pub(crate) mod rules;

pub use flags::QcFlag;

use crate::utils::constants::{
    DEFAULT_CURVE_FIT_MULTIPLIER, DEFAULT_MAX_BACKSCATTER, DEFAULT_MAX_RANGE,
    DEFAULT_MIN_BACKSCATTER, DEFAULT_NOISE_BAND, DEFAULT_NOISE_SIGMA_MULTIPLIER,
    DEFAULT_SHEAR_BOUNDS, DEFAULT_TAIL_WINDOW, DEFAULT_VELOCITY_BOUNDS,
};
use itertools::Itertools;
use log::debug;
use ndarray::{Array2, Array3, ArrayView2, ArrayView3, ArrayViewMut2, Axis};
use std::collections::BTreeMap;

/// Which distance the range rule compares against `max_range`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RangeBasis {
    /// Distance along the beam to the gate centre
    #[default]
    Range,
    /// Range projected onto the vertical with the ray's elevation
    Height,
}

/// Thresholds used by the QC rules
#[derive(Debug, Clone, PartialEq)]
pub struct QcThresholds {
    pub max_range: f64,
    pub range_basis: RangeBasis,
    /// Open interval of intensities expected from noise alone
    pub noise_band: (f64, f64),
    pub noise_sigma_multiplier: f64,
    /// Number of gates before the last one whose mean backscatter must be positive for the
    /// tail curve-fit
    pub tail_window: usize,
    pub curve_fit_multiplier: f64,
    pub min_backscatter: f64,
    pub max_backscatter: f64,
    pub velocity_bounds: (f64, f64),
    pub shear_bounds: (f64, f64),
}

impl Default for QcThresholds {
    fn default() -> Self {
        QcThresholds {
            max_range: DEFAULT_MAX_RANGE,
            range_basis: RangeBasis::default(),
            noise_band: DEFAULT_NOISE_BAND,
            noise_sigma_multiplier: DEFAULT_NOISE_SIGMA_MULTIPLIER,
            tail_window: DEFAULT_TAIL_WINDOW,
            curve_fit_multiplier: DEFAULT_CURVE_FIT_MULTIPLIER,
            min_backscatter: DEFAULT_MIN_BACKSCATTER,
            max_backscatter: DEFAULT_MAX_BACKSCATTER,
            velocity_bounds: DEFAULT_VELOCITY_BOUNDS,
            shear_bounds: DEFAULT_SHEAR_BOUNDS,
        }
    }
}

/// The (ray, gate) measurements of one angle channel
#[derive(Debug, Clone, Copy)]
pub struct ChannelView<'a> {
    pub range: ArrayView2<'a, f64>,
    pub velocity: ArrayView2<'a, f64>,
    pub intensity: ArrayView2<'a, f64>,
    pub backscatter: ArrayView2<'a, f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QcRule {
    Range,
    Signal,
    VelocityMagnitude,
    VelocityShear,
}

impl QcRule {
    /// Evaluation order. A later rule overwrites an earlier one for the same sample.
    pub const ORDER: [QcRule; 4] = [
        QcRule::Range,
        QcRule::Signal,
        QcRule::VelocityMagnitude,
        QcRule::VelocityShear,
    ];

    /// The flag this rule assigns
    pub fn flag(self) -> QcFlag {
        match self {
            QcRule::Range => QcFlag::OutOfRange,
            QcRule::Signal => QcFlag::LowSignal,
            QcRule::VelocityMagnitude => QcFlag::VelocityOutOfBounds,
            QcRule::VelocityShear => QcFlag::ShearOutOfBounds,
        }
    }

    fn apply(self, channel: &ChannelView, flags: ArrayViewMut2<u8>, thresholds: &QcThresholds) {
        match self {
            QcRule::Range => rules::flag_out_of_range(channel.range, flags, thresholds.max_range),
            QcRule::Signal => {
                rules::flag_low_signal(channel.intensity, channel.backscatter, flags, thresholds)
            }
            QcRule::VelocityMagnitude => {
                rules::flag_velocity(channel.velocity, flags, thresholds.velocity_bounds)
            }
            QcRule::VelocityShear => {
                rules::flag_shear(channel.velocity, flags, thresholds.shear_bounds)
            }
        }
    }
}

/// Flags every (ray, gate) sample of a single angle channel.
pub fn make_channel_flags(channel: &ChannelView, thresholds: &QcThresholds) -> Array2<u8> {
    let mut flags = Array2::from_elem(channel.velocity.raw_dim(), QcFlag::Good.code());
    for rule in QcRule::ORDER {
        rule.apply(channel, flags.view_mut(), thresholds);
    }
    flags
}

/// Flags every sample of (time, range, angle) grids, each angle channel independently.
pub fn make_flags(
    range: ArrayView3<f64>,
    velocity: ArrayView3<f64>,
    intensity: ArrayView3<f64>,
    backscatter: ArrayView3<f64>,
    thresholds: &QcThresholds,
) -> Array3<u8> {
    let mut flags = Array3::from_elem(velocity.raw_dim(), QcFlag::Good.code());
    for (angle, mut channel_flags) in flags.axis_iter_mut(Axis(2)).enumerate() {
        let channel = ChannelView {
            range: range.index_axis(Axis(2), angle),
            velocity: velocity.index_axis(Axis(2), angle),
            intensity: intensity.index_axis(Axis(2), angle),
            backscatter: backscatter.index_axis(Axis(2), angle),
        };
        channel_flags.assign(&make_channel_flags(&channel, thresholds));
        debug!("QC angle channel {angle}: {:?}", count_flags(channel_flags.iter()));
    }
    flags
}

/// Number of samples carrying each flag code
pub fn count_flags<'a>(flags: impl IntoIterator<Item = &'a u8>) -> BTreeMap<u8, usize> {
    flags.into_iter().copied().counts().into_iter().collect()
}
