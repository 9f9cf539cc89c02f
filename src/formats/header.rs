use crate::error::{ProclidarError, Result};
use crate::utils::constants::INFINITE_FOCUS_RANGE;
use chrono::NaiveDate;
use indexmap::IndexMap;
use std::path::Path;

/// Line prefix that closes the header block
pub(crate) const HEADER_TERMINATOR: &str = "****";

const START_TIME_KEY: &str = "Start time:";
const GATE_NUMBER_KEY: &str = "Number of gates:";
const GATE_LENGTH_KEY: &str = "Range gate length (m):";
const PULSES_PER_RAY_KEY: &str = "Pulses/ray:";
const RAYS_PER_POINT_KEY: &str = "No. of rays in file:";
const FOCUS_RANGE_KEY: &str = "Focus range:";
const RESOLUTION_KEY: &str = "Resolution (m/s):";

/// Fixed-schema header at the top of every scan file.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanHeader {
    pub gate_number: usize,
    pub gate_length: f64,         // metres
    pub pulses_per_ray: u32,
    pub rays_per_point: u32,
    pub focus_range: f64,         // metres, 65535 when focused at infinity
    pub velocity_resolution: f64, // m/s
    pub start_date: NaiveDate,
    /// Every `key\tvalue` line of the header in file order, interpreted or not
    pub entries: IndexMap<String, String>,
}

impl ScanHeader {
    /// Focus range in metres, or `None` when the telescope is focused at infinity
    pub fn focus(&self) -> Option<f64> {
        if self.focus_range == INFINITE_FOCUS_RANGE {
            None
        } else {
            Some(self.focus_range)
        }
    }

    /// Builds the header from its raw key/value entries.
    ///
    /// # Errors
    /// Returns `MalformedHeader` if a required key is missing or its value cannot be parsed.
    pub fn from_entries(entries: IndexMap<String, String>, path: &Path) -> Result<ScanHeader> {
        let malformed = |message: String| ProclidarError::MalformedHeader {
            path: path.to_path_buf(),
            message,
        };
        let value = |key: &str| -> Result<&str> {
            entries
                .get(key)
                .map(|v| v.trim())
                .ok_or_else(|| malformed(format!("missing required key '{key}'")))
        };
        let float = |key: &str| -> Result<f64> {
            let raw = value(key)?;
            raw.parse::<f64>()
                .map_err(|_| malformed(format!("cannot parse '{raw}' for key '{key}'")))
        };
        let count = |key: &str| -> Result<u32> {
            let parsed = float(key)?;
            if parsed.is_finite() && parsed >= 0.0 && parsed <= u32::MAX as f64 {
                Ok(parsed as u32)
            } else {
                Err(malformed(format!("'{parsed}' is not a valid count for key '{key}'")))
            }
        };

        let start_time = value(START_TIME_KEY)?;
        let date_str = start_time.get(0..8).unwrap_or(start_time);
        let start_date = NaiveDate::parse_from_str(date_str, "%Y%m%d")
            .map_err(|e| malformed(format!("cannot parse start date '{date_str}': {e}")))?;

        let gate_str = value(GATE_NUMBER_KEY)?;
        let gate_number = gate_str.parse::<usize>().map_err(|_| {
            malformed(format!("cannot parse '{gate_str}' for key '{GATE_NUMBER_KEY}'"))
        })?;
        if gate_number == 0 {
            Err(malformed("number of gates must be at least 1".to_string()))?
        }
        let gate_length = float(GATE_LENGTH_KEY)?;
        if !(gate_length > 0.0) {
            Err(malformed(format!("gate length must be positive, got {gate_length}")))?
        }

        Ok(ScanHeader {
            gate_number,
            gate_length,
            pulses_per_ray: count(PULSES_PER_RAY_KEY)?,
            rays_per_point: count(RAYS_PER_POINT_KEY)?,
            focus_range: float(FOCUS_RANGE_KEY)?,
            velocity_resolution: float(RESOLUTION_KEY)?,
            start_date,
            entries,
        })
    }
}

/// Consumes header lines up to and including the `****` terminator.
///
/// Lines are split on the first tab into key and value; lines without a tab are ignored.
pub(crate) fn parse_header<I>(lines: &mut I, path: &Path) -> Result<ScanHeader>
where
    I: Iterator<Item = (usize, std::io::Result<String>)>,
{
    let mut entries: IndexMap<String, String> = IndexMap::new();
    for (_, line) in lines.by_ref() {
        let line = line.map_err(|source| ProclidarError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if line.starts_with(HEADER_TERMINATOR) {
            return ScanHeader::from_entries(entries, path);
        }
        if let Some((key, value)) = line.split_once('\t') {
            let value = value.split('\t').next().unwrap_or(value);
            entries.insert(key.trim().to_string(), value.trim().to_string());
        }
    }
    Err(ProclidarError::MalformedHeader {
        path: path.to_path_buf(),
        message: format!("file ended before the '{HEADER_TERMINATOR}' terminator line"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, Cursor};

    const HEADER: &str = "Filename:\tStare_116_20230601_00.hpl\n\
        System ID:\t116\n\
        Number of gates:\t4\n\
        Range gate length (m):\t30.0\n\
        Gate length (pts):\t10\n\
        Pulses/ray:\t10000\n\
        No. of rays in file:\t1\n\
        Scan type:\tStare\n\
        Focus range:\t65535\n\
        Start time:\t20230601 00:00:04.62\n\
        Resolution (m/s):\t0.0382\n\
        ****\n";

    fn parse(text: &str) -> Result<ScanHeader> {
        let mut lines = Cursor::new(text.to_string()).lines().enumerate();
        parse_header(&mut lines, Path::new("test.hpl"))
    }

    #[test]
    fn parses_required_keys() {
        let header = parse(HEADER).expect("header should parse");
        assert_eq!(header.gate_number, 4);
        assert_eq!(header.gate_length, 30.0);
        assert_eq!(header.pulses_per_ray, 10000);
        assert_eq!(header.rays_per_point, 1);
        assert_eq!(header.velocity_resolution, 0.0382);
        assert_eq!(header.start_date, NaiveDate::from_ymd_opt(2023, 6, 1).unwrap());
        assert_eq!(header.focus(), None);
        assert_eq!(header.entries.get("System ID:").map(String::as_str), Some("116"));
    }

    #[test]
    fn stops_at_terminator() {
        let text = format!("{HEADER}0.5 0.0 90.0\n");
        let mut lines = Cursor::new(text).lines().enumerate();
        parse_header(&mut lines, Path::new("test.hpl")).unwrap();
        let (index, next) = lines.next().unwrap();
        assert_eq!(index, 12);
        assert_eq!(next.unwrap(), "0.5 0.0 90.0");
    }

    #[test]
    fn missing_key_is_malformed() {
        let text = HEADER.replace("Resolution (m/s):\t0.0382\n", "");
        match parse(&text) {
            Err(ProclidarError::MalformedHeader { message, .. }) => {
                assert!(message.contains("Resolution (m/s):"))
            }
            other => panic!("expected MalformedHeader, got {other:?}"),
        }
    }

    #[test]
    fn unparsable_value_is_malformed() {
        let text = HEADER.replace("Number of gates:\t4", "Number of gates:\tfour");
        assert!(matches!(parse(&text), Err(ProclidarError::MalformedHeader { .. })));
    }

    #[test]
    fn missing_terminator_is_malformed() {
        let text = HEADER.replace("****\n", "");
        assert!(matches!(parse(&text), Err(ProclidarError::MalformedHeader { .. })));
    }

    #[test]
    fn finite_focus_is_reported() {
        let text = HEADER.replace("Focus range:\t65535", "Focus range:\t1500");
        assert_eq!(parse(&text).unwrap().focus(), Some(1500.0));
    }
}
