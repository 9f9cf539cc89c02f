use is_close::is_close;
use ndarray::{array, Axis};
use proclidar::{
    process_radial_winds, process_wind_profile, read_scan_file, ProclidarError, QcThresholds,
    ScanLayout,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn header(gates: usize, gate_length: f64, rays: usize, start: &str) -> String {
    format!(
        "Filename:\tStare_116_{start}.hpl\n\
         System ID:\t116\n\
         Number of gates:\t{gates}\n\
         Range gate length (m):\t{gate_length}\n\
         Gate length (pts):\t10\n\
         Pulses/ray:\t10000\n\
         No. of rays in file:\t{rays}\n\
         Scan type:\tStare\n\
         Focus range:\t65535\n\
         Start time:\t{start} 00:00:00.00\n\
         Resolution (m/s):\t0.0382\n\
         Altitude of measurement (center of gate) = (range gate + 0.5) * Gate length\n\
         Data line 1: Decimal time (hours)  Azimuth (degrees)  Elevation (degrees)\n\
         ****\n"
    )
}

/// `(hour, azimuth, elevation, [(velocity, intensity, backscatter)])` per ray
type RaySpec<'a> = (f64, f64, f64, &'a [(f64, f64, f64)]);

fn write_scan(dir: &TempDir, name: &str, gate_length: f64, rays: &[RaySpec]) -> PathBuf {
    let gates = rays.first().map_or(0, |r| r.3.len());
    let mut text = header(gates, gate_length, rays.len(), "20230601");
    for (hour, azimuth, elevation, samples) in rays {
        text.push_str(&format!("{hour:.8} {azimuth:.2} {elevation:.2}\n"));
        for (gate, (velocity, intensity, backscatter)) in samples.iter().enumerate() {
            text.push_str(&format!(
                "{gate:>4} {velocity:>10} {intensity:>10} {backscatter:>12E}\n"
            ));
        }
    }
    let path = dir.path().join(name);
    fs::write(&path, text).expect("Unable to write test file");
    path
}

fn stare_samples(velocity: f64) -> Vec<(f64, f64, f64)> {
    (0..4).map(|g| (velocity + g as f64 * 0.1, 1.2, 1e-5)).collect()
}

fn dbs_file(dir: &TempDir, name: &str, hour: f64, gate_length: f64, radial: [f64; 3]) -> PathBuf {
    let beam = |v: f64| vec![(v, 1.2, 1e-5); 12];
    let (vertical, east, north) = (beam(radial[0]), beam(radial[1]), beam(radial[2]));
    write_scan(
        dir,
        name,
        gate_length,
        &[
            (hour, 0.0, 90.0, &vertical[..]),
            (hour + 0.005, 90.0, 75.0, &east[..]),
            (hour + 0.01, 0.0, 75.0, &north[..]),
        ],
    )
}

#[test]
fn single_ray_flags() {
    let dir = TempDir::new().unwrap();
    let samples = [(0.0, 1.2, 2e-7), (20.0, 1.2, 5e-7), (-3.0, 1.2, 2e-3)];
    let path = write_scan(&dir, "single.hpl", 30.0, &[(12.0, 0.0, 90.0, &samples[..])]);

    let winds =
        process_radial_winds(&[&path], ScanLayout::Stare, &QcThresholds::default(), false)
            .unwrap();
    // both velocity steps exceed the default shear bound
    assert_eq!(winds.flags.index_axis(Axis(2), 0), array![[1u8, 5, 5]]);

    let thresholds = QcThresholds {
        shear_bounds: (-50.0, 50.0),
        ..Default::default()
    };
    let winds = process_radial_winds(&[&path], ScanLayout::Stare, &thresholds, false).unwrap();
    assert_eq!(winds.flags.index_axis(Axis(2), 0), array![[1u8, 4, 3]]);
    assert_eq!(winds.range.index_axis(Axis(2), 0), array![[15.0, 45.0, 75.0]]);
}

#[test]
fn file_order_is_preserved() {
    let dir = TempDir::new().unwrap();
    let first = stare_samples(3.0);
    let second = stare_samples(1.0);
    let third = stare_samples(2.0);
    let paths = vec![
        write_scan(&dir, "c.hpl", 30.0, &[(3.0, 0.0, 90.0, &first[..])]),
        write_scan(
            &dir,
            "a.hpl",
            30.0,
            &[(1.0, 0.0, 90.0, &second[..]), (1.5, 0.0, 90.0, &second[..])],
        ),
        write_scan(&dir, "b.hpl", 30.0, &[(2.0, 0.0, 90.0, &third[..])]),
    ];

    for parallel in [false, true] {
        let winds =
            process_radial_winds(&paths, ScanLayout::Stare, &QcThresholds::default(), parallel)
                .unwrap();
        let first_gate: Vec<f64> = winds.velocity.slice(ndarray::s![.., 0, 0]).to_vec();
        assert_eq!(first_gate, vec![3.0, 1.0, 1.0, 2.0]);
        assert_eq!(winds.times.hours, vec![3, 1, 1, 2]);
        assert_eq!(winds.times.minutes, vec![0, 0, 30, 0]);
    }
}

#[test]
fn rollover_within_a_file() {
    let dir = TempDir::new().unwrap();
    let samples = stare_samples(0.5);
    let path = write_scan(
        &dir,
        "midnight.hpl",
        30.0,
        &[
            (23.9, 0.0, 90.0, &samples[..]),
            (0.1, 0.0, 90.0, &samples[..]),
            (0.2, 0.0, 90.0, &samples[..]),
        ],
    );
    let scan = read_scan_file(&path).unwrap();
    assert!(is_close!(scan.absolute_hours[1], 24.1));
    assert!(is_close!(scan.absolute_hours[2], 24.2));

    let series = scan.time_series();
    assert_eq!(series.days, vec![1, 2, 2]);
    assert_eq!(series.hours, vec![23, 0, 0]);
    assert_eq!(series.minutes, vec![54, 6, 12]);
    assert!(is_close!(scan.decimal_days[1], 739038.0 + 24.1 / 24.0));
}

#[test]
fn truncated_ray_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("truncated.hpl");
    let text = format!(
        "{}12.0 0.0 90.0\n   0 0.1 1.2 1.0E-5\n   1 0.2 1.2 1.0E-5\n",
        header(3, 30.0, 1, "20230601")
    );
    fs::write(&path, text).unwrap();
    match read_scan_file(&path) {
        Err(ProclidarError::TruncatedRay {
            ray,
            expected,
            found,
            ..
        }) => {
            assert_eq!((ray, expected, found), (0, 3, 2));
        }
        other => panic!("expected TruncatedRay, got {other:?}"),
    }
}

#[test]
fn malformed_header_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("header.hpl");
    let text = header(3, 30.0, 1, "20230601").replace("Pulses/ray:\t10000\n", "");
    fs::write(&path, text).unwrap();
    assert!(matches!(
        read_scan_file(&path),
        Err(ProclidarError::MalformedHeader { .. })
    ));
}

#[test]
fn first_bad_file_in_input_order_is_reported() {
    let dir = TempDir::new().unwrap();
    let samples = stare_samples(1.0);
    let good = write_scan(&dir, "good.hpl", 30.0, &[(1.0, 0.0, 90.0, &samples[..])]);
    let truncated = dir.path().join("truncated.hpl");
    fs::write(
        &truncated,
        format!("{}1.5 0.0 90.0\n   0 0.1 1.2 1.0E-5\n", header(3, 30.0, 1, "20230601")),
    )
    .unwrap();
    let bad_header = dir.path().join("bad_header.hpl");
    fs::write(
        &bad_header,
        header(3, 30.0, 1, "20230601").replace("Pulses/ray:\t10000\n", ""),
    )
    .unwrap();

    let paths = vec![good, truncated.clone(), bad_header];
    for parallel in [false, true] {
        match process_radial_winds(&paths, ScanLayout::Stare, &QcThresholds::default(), parallel) {
            Err(ProclidarError::TruncatedRay { path, found, .. }) => {
                assert_eq!(path, truncated);
                assert_eq!(found, 1);
            }
            other => panic!("expected TruncatedRay, got {other:?}"),
        }
    }
}

#[test]
fn missing_file_is_an_io_error() {
    let missing = Path::new("/nonexistent/scan.hpl");
    assert!(matches!(
        read_scan_file(missing),
        Err(ProclidarError::Io { .. })
    ));
    assert!(matches!(
        process_wind_profile::<PathBuf>(&[], false),
        Err(ProclidarError::NoInputFiles)
    ));
}

#[test]
fn wind_profile_from_three_beam_files() {
    let dir = TempDir::new().unwrap();
    // uniform wind of (4, -3, 0) m/s seen by 75 degree tilted beams
    let cos = 75f64.to_radians().cos();
    let radial = [0.0, -4.0 * cos, 3.0 * cos];
    let paths = vec![
        dbs_file(&dir, "dbs_1.hpl", 10.0, 30.0, radial),
        dbs_file(&dir, "dbs_2.hpl", 10.25, 30.0, radial),
    ];
    let profile = process_wind_profile(&paths, true).unwrap();
    assert_eq!(profile.num_times(), 2);
    assert_eq!(profile.times.minutes, vec![0, 15]);
    assert_eq!(profile.altitude.first(), Some(&15.0));
    for direction in profile.direction.iter() {
        assert!((direction - 306.86989764584405).abs() < 1e-6);
    }
    for speed in profile.speed.iter() {
        assert!((speed - 5.0).abs() < 1e-6);
    }

    let winds =
        process_radial_winds(&paths, ScanLayout::Beam, &QcThresholds::default(), false).unwrap();
    assert_eq!(winds.velocity.dim(), (2, 12, 3));
    assert_eq!(winds.elevation.row(0).to_vec(), vec![90.0, 75.0, 75.0]);
}

#[test]
fn wind_profile_rejects_changing_altitudes() {
    let dir = TempDir::new().unwrap();
    let paths = vec![
        dbs_file(&dir, "dbs_1.hpl", 10.0, 30.0, [0.0; 3]),
        dbs_file(&dir, "dbs_2.hpl", 10.25, 18.0, [0.0; 3]),
    ];
    match process_wind_profile(&paths, false) {
        Err(ProclidarError::AltitudeMismatch { path }) => assert_eq!(path, paths[1]),
        other => panic!("expected AltitudeMismatch, got {other:?}"),
    }
}
