use std::fmt;

/// Quality-control classification of a single (ray, gate) sample.
///
/// Only codes 1 to 5 are assigned by [`crate::qc::make_flags`]. Codes 6 and 7 depend on the
/// instrument's internal temperature and are added by hand; 8 and 9 describe data that is
/// rejected before it reaches the QC engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum QcFlag {
    Good = 1,
    OutOfRange = 2,
    LowSignal = 3,
    VelocityOutOfBounds = 4,
    ShearOutOfBounds = 5,
    LowInternalTemperature = 6,
    HighInternalTemperature = 7,
    GateNotInUse = 8,
    SuspectTime = 9,
}

impl QcFlag {
    pub const fn code(self) -> u8 {
        self as u8
    }

    pub fn description(self) -> &'static str {
        match self {
            QcFlag::Good => "data good",
            QcFlag::OutOfRange => "data outside measurement range",
            QcFlag::LowSignal => "signal below instrument threshold",
            QcFlag::VelocityOutOfBounds => "radial velocity magnitude too large",
            QcFlag::ShearOutOfBounds => "radial velocity shear too large",
            QcFlag::LowInternalTemperature => "internal temperature too low",
            QcFlag::HighInternalTemperature => "internal temperature too high",
            QcFlag::GateNotInUse => "gate index beyond gates in use",
            QcFlag::SuspectTime => "suspect data time",
        }
    }
}

impl TryFrom<u8> for QcFlag {
    type Error = String;
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            1 => QcFlag::Good,
            2 => QcFlag::OutOfRange,
            3 => QcFlag::LowSignal,
            4 => QcFlag::VelocityOutOfBounds,
            5 => QcFlag::ShearOutOfBounds,
            6 => QcFlag::LowInternalTemperature,
            7 => QcFlag::HighInternalTemperature,
            8 => QcFlag::GateNotInUse,
            9 => QcFlag::SuspectTime,
            x => Err(format!("Invalid QC flag {x}"))?,
        })
    }
}

impl fmt::Display for QcFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.code(), self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip_through_u8() {
        for code in 1..=9u8 {
            assert_eq!(QcFlag::try_from(code).unwrap().code(), code);
        }
        assert!(QcFlag::try_from(0).is_err());
        assert!(QcFlag::try_from(10).is_err());
    }
}
