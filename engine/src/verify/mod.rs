use std::fmt::{Display, Formatter};
use std::str::FromStr;

pub mod checker;

/// Temporal properties of interval objects
#[derive(Eq, PartialEq, Ord, PartialOrd, Hash, Copy, Clone, Debug)]
pub enum Property {
    /// every constructed interval has `end >= start`
    StartEndOrder,
    /// every queried time is no earlier than the start of the interval
    AfterStart,
    /// every queried time is no later than the end of the interval
    BeforeEnd,
}

impl Property {
    pub const ALL: [Property; 3] = [Self::StartEndOrder, Self::AfterStart, Self::BeforeEnd];
}

impl Display for Property {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::StartEndOrder => "START_END_ORDER",
            Self::AfterStart => "AFTER_START",
            Self::BeforeEnd => "BEFORE_END",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Property {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let property = match s.to_ascii_uppercase().replace('-', "_").as_str() {
            "START_END_ORDER" => Self::StartEndOrder,
            "AFTER_START" => Self::AfterStart,
            "BEFORE_END" => Self::BeforeEnd,
            _ => return Err(format!("unknown property: {}", s)),
        };
        Ok(property)
    }
}

/// Outcome of checking one property on a class
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum Verdict {
    Safe,
    Unsafe,
}

impl From<bool> for Verdict {
    fn from(holds: bool) -> Self {
        if holds {
            Self::Safe
        } else {
            Self::Unsafe
        }
    }
}

impl Display for Verdict {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Safe => write!(f, "SAFE"),
            Self::Unsafe => write!(f, "UNSAFE"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_names() {
        for property in Property::ALL {
            assert_eq!(property.to_string().parse::<Property>().unwrap(), property);
        }
        assert_eq!("before-end".parse::<Property>().unwrap(), Property::BeforeEnd);
        assert!("AFTER_END".parse::<Property>().is_err());
    }
}
