//! The individual QC rules. Each one overwrites only the samples it matches.
use crate::qc::flags::QcFlag;
use crate::qc::least_squares::PolynomialFit;
use crate::qc::QcThresholds;
use crate::utils::constants::TAIL_FIT_DEGREE;
use itertools::izip;
use ndarray::{s, ArrayView1, ArrayView2, ArrayViewMut1, ArrayViewMut2, Zip};

/// Flag 2: sample lies beyond the maximum range.
pub(crate) fn flag_out_of_range(ranges: ArrayView2<f64>, flags: ArrayViewMut2<u8>, max_range: f64) {
    Zip::from(flags).and(ranges).for_each(|flag, &range| {
        if range > max_range {
            *flag = QcFlag::OutOfRange.code();
        }
    });
}

/// Flag 3: signal below the instrument threshold.
///
/// Per ray, the noise-floor test and the backscatter-tail test; then the absolute backscatter
/// bounds over the whole grid.
pub(crate) fn flag_low_signal(
    intensity: ArrayView2<f64>,
    backscatter: ArrayView2<f64>,
    mut flags: ArrayViewMut2<u8>,
    thresholds: &QcThresholds,
) {
    for (intensity_row, backscatter_row, mut flag_row) in
        izip!(intensity.outer_iter(), backscatter.outer_iter(), flags.outer_iter_mut())
    {
        flag_below_noise_floor(intensity_row, flag_row.view_mut(), thresholds);
        flag_below_tail_fit(backscatter_row, flag_row.view_mut(), thresholds);
    }

    let (min_backscatter, max_backscatter) =
        (thresholds.min_backscatter, thresholds.max_backscatter);
    Zip::from(&mut flags).and(backscatter).for_each(|flag, &b| {
        if b > max_backscatter || b < min_backscatter {
            *flag = QcFlag::LowSignal.code();
        }
    });
}

/// Mean plus a multiple of the standard deviation of the intensities inside the noise band.
/// `None` when no gate of the ray falls inside the band.
pub(crate) fn noise_floor(intensity: ArrayView1<f64>, thresholds: &QcThresholds) -> Option<f64> {
    let (low, high) = thresholds.noise_band;
    let noise: Vec<f64> = intensity
        .iter()
        .copied()
        .filter(|&i| i > low && i < high)
        .collect();
    if noise.is_empty() {
        return None;
    }
    let n = noise.len() as f64;
    let mean = noise.iter().sum::<f64>() / n;
    let variance = noise.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    Some(mean + thresholds.noise_sigma_multiplier * variance.sqrt())
}

fn flag_below_noise_floor(
    intensity: ArrayView1<f64>,
    flags: ArrayViewMut1<u8>,
    thresholds: &QcThresholds,
) {
    let Some(threshold) = noise_floor(intensity, thresholds) else {
        return;
    };
    Zip::from(flags).and(intensity).for_each(|flag, &i| {
        if i < threshold {
            *flag = QcFlag::LowSignal.code();
        }
    });
}

/// Fits log10(backscatter) from the last negative gate up to the second-to-last gate.
///
/// Returns the first gate of the fit together with the fit, or `None` when the ray does not meet
/// the preconditions: a positive mean over the tail window, a negative gate, and enough finite
/// points after it.
pub(crate) fn tail_fit(
    backscatter: ArrayView1<f64>,
    thresholds: &QcThresholds,
) -> Option<(usize, PolynomialFit)> {
    let gates = backscatter.len();
    let window_end = gates.checked_sub(1)?;
    let window_start = gates.saturating_sub(thresholds.tail_window + 1);
    if window_start >= window_end {
        return None;
    }
    let window_mean = backscatter.slice(s![window_start..window_end]).mean()?;
    if !(window_mean > 0.0) {
        return None;
    }

    let last_negative = (0..gates).rev().find(|&j| backscatter[j] < 0.0)?;
    let fit_end = gates.checked_sub(2)?;
    if fit_end <= last_negative + 2 {
        return None;
    }
    let (x_vals, y_vals): (Vec<f64>, Vec<f64>) = (last_negative..fit_end)
        .filter_map(|j| {
            let log_b = backscatter[j].log10();
            log_b.is_finite().then_some((j as f64, log_b))
        })
        .unzip();
    let fit = PolynomialFit::fit(&x_vals, &y_vals, TAIL_FIT_DEGREE)?;
    Some((last_negative, fit))
}

fn flag_below_tail_fit(
    backscatter: ArrayView1<f64>,
    mut flags: ArrayViewMut1<u8>,
    thresholds: &QcThresholds,
) {
    let Some((first_gate, fit)) = tail_fit(backscatter, thresholds) else {
        return;
    };
    for j in first_gate..backscatter.len() {
        let curve = 10f64.powf(fit.eval(j as f64));
        if backscatter[j] < thresholds.curve_fit_multiplier * curve {
            flags[j] = QcFlag::LowSignal.code();
        }
    }
}

/// Flag 4: radial velocity outside the allowed bounds.
pub(crate) fn flag_velocity(
    velocity: ArrayView2<f64>,
    flags: ArrayViewMut2<u8>,
    bounds: (f64, f64),
) {
    let (min_velocity, max_velocity) = bounds;
    Zip::from(flags).and(velocity).for_each(|flag, &v| {
        if v > max_velocity || v < min_velocity {
            *flag = QcFlag::VelocityOutOfBounds.code();
        }
    });
}

/// Flag 5: gate-to-gate velocity difference outside the allowed bounds. The first gate of each
/// ray has no predecessor and is never assigned.
pub(crate) fn flag_shear(
    velocity: ArrayView2<f64>,
    mut flags: ArrayViewMut2<u8>,
    bounds: (f64, f64),
) {
    if velocity.ncols() < 2 {
        return;
    }
    let (min_shear, max_shear) = bounds;
    let shear = &velocity.slice(s![.., 1..]) - &velocity.slice(s![.., ..-1]);
    Zip::from(flags.slice_mut(s![.., 1..]))
        .and(&shear)
        .for_each(|flag, &dv| {
            if dv > max_shear || dv < min_shear {
                *flag = QcFlag::ShearOutOfBounds.code();
            }
        });
}
