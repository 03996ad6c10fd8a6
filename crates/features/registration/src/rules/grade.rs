use crate::error::RegistrationError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Letter grades, best first. The declaration order is the ordinal scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Grade {
    A,
    AMinus,
    BPlus,
    B,
    BMinus,
    CPlus,
    C,
    CMinus,
    DPlus,
    D,
    F,
}

impl Grade {
    /// Worst grade that still earns credit; completion clauses require at least this.
    pub const LOWEST_PASSING: Self = Self::D;

    pub const ALL: [Self; 11] = [
        Self::A,
        Self::AMinus,
        Self::BPlus,
        Self::B,
        Self::BMinus,
        Self::CPlus,
        Self::C,
        Self::CMinus,
        Self::DPlus,
        Self::D,
        Self::F,
    ];

    /// Position on the scale, 0 for the best grade.
    #[must_use]
    pub const fn ordinal(self) -> u8 {
        self as u8
    }

    /// `true` when `self` is at or better than `threshold`.
    #[must_use]
    pub const fn meets(self, threshold: Self) -> bool {
        self.ordinal() <= threshold.ordinal()
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::AMinus => "A-",
            Self::BPlus => "B+",
            Self::B => "B",
            Self::BMinus => "B-",
            Self::CPlus => "C+",
            Self::C => "C",
            Self::CMinus => "C-",
            Self::DPlus => "D+",
            Self::D => "D",
            Self::F => "F",
        }
    }
}

impl FromStr for Grade {
    type Err = RegistrationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|grade| grade.as_str().eq_ignore_ascii_case(raw))
            .ok_or_else(|| RegistrationError::malformed(format!("unknown grade '{raw}'")))
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Grade {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Grade {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_runs_best_to_worst() {
        assert_eq!(Grade::A.ordinal(), 0);
        assert_eq!(Grade::F.ordinal(), 10);
        assert!(Grade::ALL.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn meets_is_at_or_better() {
        assert!(Grade::AMinus.meets(Grade::B));
        assert!(Grade::B.meets(Grade::B));
        assert!(!Grade::CPlus.meets(Grade::B));
        assert!(Grade::D.meets(Grade::LOWEST_PASSING));
        assert!(!Grade::F.meets(Grade::LOWEST_PASSING));
    }

    #[test]
    fn parses_every_symbol() {
        for grade in Grade::ALL {
            assert_eq!(grade.as_str().parse::<Grade>().ok(), Some(grade));
        }
        assert_eq!("b+".parse::<Grade>().ok(), Some(Grade::BPlus));
        assert!("E".parse::<Grade>().is_err());
        assert!("".parse::<Grade>().is_err());
    }
}
