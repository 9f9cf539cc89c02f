use crate::utils::constants::{
    DATENUM_EPOCH_OFFSET_DAYS, HOURS_PER_DAY, MICROSECONDS_PER_HOUR, ROLLOVER_HOUR_LIMIT,
    SECONDS_PER_DAY, SECONDS_PER_HOUR,
};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};

/// Applies the midnight rollover correction to a sequence of decimal hours.
///
/// A ray whose hour is both below 1 and below the previous ray's hour starts a new day: 24 h is
/// added to it and to every ray after it. Each crossing adds another 24 h.
pub fn correct_rollover(hours: &[f64]) -> Vec<f64> {
    let mut hours_to_add = 0.0;
    let mut corrected = Vec::with_capacity(hours.len());
    for (i, &hour) in hours.iter().enumerate() {
        if i > 0 && hour < hours[i - 1] && hour < ROLLOVER_HOUR_LIMIT {
            hours_to_add += HOURS_PER_DAY;
        }
        corrected.push(hour + hours_to_add);
    }
    corrected
}

/// Datetime of a ray given the file's start date and its (rollover corrected) decimal hour.
/// Resolution is one microsecond. `None` if the hour is not finite or the result falls outside
/// the representable calendar.
pub fn ray_datetime(start_date: NaiveDate, hour: f64) -> Option<NaiveDateTime> {
    let micros = (hour * MICROSECONDS_PER_HOUR).round();
    if !micros.is_finite() || micros.abs() >= i64::MAX as f64 {
        return None;
    }
    start_date
        .and_time(NaiveTime::MIN)
        .checked_add_signed(Duration::microseconds(micros as i64))
}

/// Continuous decimal-day serial number of a ray.
///
/// Day numbering follows the proleptic ordinal (1 January of year 1 is day 1) shifted by 366
/// days, so 1 January 2000 is 730486.
pub fn decimal_day(start_date: NaiveDate, hour: f64) -> f64 {
    let shifted = start_date + Duration::days(DATENUM_EPOCH_OFFSET_DAYS);
    shifted.num_days_from_ce() as f64 + hour / HOURS_PER_DAY
}

fn unix_epoch() -> NaiveDateTime {
    DateTime::<Utc>::UNIX_EPOCH.naive_utc()
}

/// Calendar breakdown of a sequence of ray times.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeries {
    pub datetimes: Vec<NaiveDateTime>,
    pub unix_times: Vec<f64>,
    pub years: Vec<i32>,
    pub months: Vec<u32>,
    pub days: Vec<u32>,
    pub hours: Vec<u32>,
    pub minutes: Vec<u32>,
    pub seconds: Vec<f64>,
    /// Fractional day of year, 1.0 at 00:00 on 1 January
    pub day_of_year: Vec<f64>,
}

impl TimeSeries {
    pub fn new(datetimes: &[NaiveDateTime]) -> TimeSeries {
        let mut series = TimeSeries::default();
        for dt in datetimes {
            series.push(*dt);
        }
        series
    }

    pub fn push(&mut self, dt: NaiveDateTime) {
        let since_epoch = dt.signed_duration_since(unix_epoch());
        let micros = since_epoch
            .num_microseconds()
            .unwrap_or(since_epoch.num_seconds() * 1_000_000);
        let second = dt.second() as f64 + dt.nanosecond() as f64 / 1e9;
        let seconds_of_day =
            dt.hour() as f64 * SECONDS_PER_HOUR + dt.minute() as f64 * 60.0 + second;

        self.datetimes.push(dt);
        self.unix_times.push(micros as f64 / 1e6);
        self.years.push(dt.year());
        self.months.push(dt.month());
        self.days.push(dt.day());
        self.hours.push(dt.hour());
        self.minutes.push(dt.minute());
        self.seconds.push(second);
        self.day_of_year
            .push(dt.ordinal() as f64 + seconds_of_day / SECONDS_PER_DAY);
    }

    /// Appends another series after this one, preserving order
    pub fn extend(&mut self, other: &TimeSeries) {
        for dt in &other.datetimes {
            self.push(*dt);
        }
    }

    pub fn len(&self) -> usize {
        self.datetimes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datetimes.is_empty()
    }

    /// Earliest unix time in the series
    pub fn coverage_start(&self) -> Option<f64> {
        self.unix_times.iter().copied().reduce(f64::min)
    }

    /// Latest unix time in the series
    pub fn coverage_end(&self) -> Option<f64> {
        self.unix_times.iter().copied().reduce(f64::max)
    }

    /// `YYYYMMDD` of the first entry
    pub fn file_date(&self) -> Option<String> {
        self.datetimes
            .first()
            .map(|dt| dt.format("%Y%m%d").to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use is_close::is_close;

    #[test]
    fn single_rollover_is_retained() {
        let corrected = correct_rollover(&[23.9, 0.1, 0.2]);
        assert_eq!(corrected.len(), 3);
        assert!(is_close!(corrected[0], 23.9));
        assert!(is_close!(corrected[1], 24.1));
        assert!(is_close!(corrected[2], 24.2));
    }

    #[test]
    fn small_backward_jitter_is_not_a_rollover() {
        // 5.2 drops below 5.3 but is not below one hour
        assert_eq!(correct_rollover(&[5.3, 5.2, 5.4]), vec![5.3, 5.2, 5.4]);
        // 0.5 is below one hour but does not drop
        assert_eq!(correct_rollover(&[0.2, 0.5]), vec![0.2, 0.5]);
    }

    #[test]
    fn multiple_crossings_accumulate() {
        let corrected = correct_rollover(&[23.5, 0.5, 12.0, 23.9, 0.2]);
        assert_eq!(corrected, vec![23.5, 24.5, 36.0, 47.9, 48.2]);
    }

    #[test]
    fn decimal_day_matches_serial_convention() {
        let date = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
        assert_eq!(decimal_day(date, 0.0), 730486.0);
        assert_eq!(decimal_day(date, 12.0), 730486.5);
        let date = NaiveDate::from_ymd_opt(2023, 6, 1).unwrap();
        assert_eq!(decimal_day(date, 6.0), 739038.25);
    }

    #[test]
    fn ray_datetime_crosses_into_next_day() {
        let date = NaiveDate::from_ymd_opt(2023, 6, 1).unwrap();
        let dt = ray_datetime(date, 24.5).unwrap();
        assert_eq!(
            dt,
            NaiveDate::from_ymd_opt(2023, 6, 2)
                .unwrap()
                .and_hms_opt(0, 30, 0)
                .unwrap()
        );
    }

    #[test]
    fn unrepresentable_hours_have_no_datetime() {
        let date = NaiveDate::from_ymd_opt(2023, 6, 1).unwrap();
        assert_eq!(ray_datetime(date, f64::INFINITY), None);
        assert_eq!(ray_datetime(date, f64::NAN), None);
        assert_eq!(ray_datetime(date, 1e15), None);
        assert_eq!(ray_datetime(date, -1e15), None);
    }

    #[test]
    fn time_series_calendar_fields() {
        let dt = NaiveDate::from_ymd_opt(2023, 2, 1)
            .unwrap()
            .and_hms_milli_opt(6, 0, 1, 500)
            .unwrap();
        let series = TimeSeries::new(&[dt]);
        assert_eq!(series.years, vec![2023]);
        assert_eq!(series.months, vec![2]);
        assert_eq!(series.days, vec![1]);
        assert_eq!(series.hours, vec![6]);
        assert_eq!(series.minutes, vec![0]);
        assert_eq!(series.seconds, vec![1.5]);
        assert!(is_close!(series.day_of_year[0], 32.0 + 21601.5 / 86400.0));
        assert_eq!(series.unix_times, vec![1675231201.5]);
        assert_eq!(series.file_date().as_deref(), Some("20230201"));
    }

    #[test]
    fn coverage_spans_extended_series() {
        let date = NaiveDate::from_ymd_opt(2023, 6, 1).unwrap();
        let mut first = TimeSeries::new(&[ray_datetime(date, 1.0).unwrap()]);
        let second = TimeSeries::new(&[ray_datetime(date, 2.0).unwrap()]);
        first.extend(&second);
        assert_eq!(first.len(), 2);
        assert_eq!(first.coverage_end().unwrap() - first.coverage_start().unwrap(), 3600.0);
    }
}
