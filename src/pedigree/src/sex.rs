use std::{fmt::{self, Formatter, Display}, str::FromStr, result::Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sex {
    Male,
    Female,
    Unknown
}

impl Sex {
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }
}

impl FromStr for Sex {
    type Err = String;

    /// Lenient parsing: anything that is neither a recognized male nor female token is `Unknown`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "male"   | "m" | "1" => Self::Male,
            "female" | "f" | "2" => Self::Female,
            _                    => Self::Unknown,
        })
    }
}

impl Display for Sex {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", match self {
            Self::Female  => "female",
            Self::Male    => "male",
            Self::Unknown => "unknown"
        })
    }
}
