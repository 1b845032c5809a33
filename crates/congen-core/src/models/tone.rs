use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};

/// Narration tone requested for a generation job.
///
/// Callers send the numeric value; the job descriptor carries the name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tone {
    Casual = 0,
    Serious = 1,
    Funny = 2,
    Dramatic = 3,
    Inspirational = 4,
}

impl Tone {
    pub const ALL: [Tone; 5] = [
        Tone::Casual,
        Tone::Serious,
        Tone::Funny,
        Tone::Dramatic,
        Tone::Inspirational,
    ];

    /// Map a wire value to a tone. Anything outside the enumeration is `None`.
    pub fn from_value(value: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|tone| *tone as i64 == value)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Tone::Casual => "Casual",
            Tone::Serious => "Serious",
            Tone::Funny => "Funny",
            Tone::Dramatic => "Dramatic",
            Tone::Inspirational => "Inspirational",
        }
    }
}

impl Display for Tone {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_value_known_tones() {
        assert_eq!(Tone::from_value(0), Some(Tone::Casual));
        assert_eq!(Tone::from_value(1), Some(Tone::Serious));
        assert_eq!(Tone::from_value(4), Some(Tone::Inspirational));
    }

    #[test]
    fn test_from_value_rejects_out_of_range() {
        assert_eq!(Tone::from_value(-1), None);
        assert_eq!(Tone::from_value(5), None);
        assert_eq!(Tone::from_value(i64::MAX), None);
    }

    #[test]
    fn test_serializes_by_name() {
        assert_eq!(serde_json::to_string(&Tone::Serious).unwrap(), "\"Serious\"");
        assert_eq!(Tone::Dramatic.to_string(), "Dramatic");
    }
}
