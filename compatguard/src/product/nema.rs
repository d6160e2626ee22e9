//! NEMA enclosure type ratings and the coverage relation between them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// NEMA 250 enclosure type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum NemaRating {
    Type1,
    Type2,
    Type3,
    Type3R,
    Type3S,
    Type3X,
    Type3RX,
    Type3SX,
    Type4,
    Type4X,
    Type5,
    Type6,
    Type6P,
    Type12,
    Type12K,
    Type13,
}

use NemaRating::*;

impl NemaRating {
    pub const ALL: [NemaRating; 16] = [
        Type1, Type2, Type3, Type3R, Type3S, Type3X, Type3RX, Type3SX, Type4, Type4X, Type5,
        Type6, Type6P, Type12, Type12K, Type13,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Type1 => "1",
            Type2 => "2",
            Type3 => "3",
            Type3R => "3R",
            Type3S => "3S",
            Type3X => "3X",
            Type3RX => "3RX",
            Type3SX => "3SX",
            Type4 => "4",
            Type4X => "4X",
            Type5 => "5",
            Type6 => "6",
            Type6P => "6P",
            Type12 => "12",
            Type12K => "12K",
            Type13 => "13",
        }
    }

    /// Requirements this rating meets, itself included
    fn covers(&self) -> &'static [NemaRating] {
        match self {
            Type1 => &[Type1],
            Type2 => &[Type2, Type1],
            Type3 => &[Type3, Type3R, Type2, Type1],
            Type3R => &[Type3R, Type2, Type1],
            Type3S => &[Type3S, Type3, Type3R, Type2, Type1],
            Type3X => &[Type3X, Type3, Type3R, Type3RX, Type2, Type1],
            Type3RX => &[Type3RX, Type3R, Type2, Type1],
            Type3SX => &[Type3SX, Type3S, Type3X, Type3RX, Type3, Type3R, Type2, Type1],
            Type4 => &[Type4, Type3, Type3R, Type12, Type5, Type2, Type1],
            Type4X => &[
                Type4X, Type4, Type3X, Type3RX, Type3, Type3R, Type12, Type5, Type2, Type1,
            ],
            Type5 => &[Type5, Type2, Type1],
            Type6 => &[Type6, Type4, Type3, Type3R, Type12, Type5, Type2, Type1],
            Type6P => &[Type6P, Type6, Type4, Type3, Type3R, Type12, Type5, Type2, Type1],
            Type12 => &[Type12, Type5, Type2, Type1],
            Type12K => &[Type12K, Type12, Type5, Type2, Type1],
            Type13 => &[Type13, Type12, Type5, Type2, Type1],
        }
    }

    /// Whether an enclosure of this type meets or exceeds `required`
    pub fn meets(&self, required: NemaRating) -> bool {
        self.covers().contains(&required)
    }

    /// Suitable for outdoor (rain) exposure
    pub fn is_outdoor(&self) -> bool {
        self.meets(Type3R)
    }
}

impl fmt::Display for NemaRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NEMA {}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown NEMA enclosure type '{0}'")]
pub struct UnknownNemaRating(pub String);

impl FromStr for NemaRating {
    type Err = UnknownNemaRating;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s
            .trim()
            .to_ascii_uppercase()
            .trim_start_matches("NEMA")
            .trim()
            .trim_start_matches("TYPE")
            .trim()
            .to_string();
        NemaRating::ALL
            .iter()
            .copied()
            .find(|rating| rating.as_str() == normalized)
            .ok_or_else(|| UnknownNemaRating(s.to_string()))
    }
}

impl TryFrom<String> for NemaRating {
    type Error = UnknownNemaRating;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<NemaRating> for String {
    fn from(rating: NemaRating) -> Self {
        rating.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_variants() {
        assert_eq!("3R".parse::<NemaRating>().unwrap(), Type3R);
        assert_eq!("3r".parse::<NemaRating>().unwrap(), Type3R);
        assert_eq!("NEMA 4X".parse::<NemaRating>().unwrap(), Type4X);
        assert_eq!("Type 12".parse::<NemaRating>().unwrap(), Type12);
        assert!("7".parse::<NemaRating>().is_err());
        assert!("14-50".parse::<NemaRating>().is_err());
    }

    #[test]
    fn test_linear_chain_from_original_hierarchy() {
        let chain = [Type1, Type3R, Type4, Type4X];
        for (i, higher) in chain.iter().enumerate() {
            for lower in &chain[..=i] {
                assert!(higher.meets(*lower), "{} should meet {}", higher, lower);
            }
            for stronger in &chain[i + 1..] {
                assert!(!higher.meets(*stronger), "{} should not meet {}", higher, stronger);
            }
        }
    }

    #[test]
    fn test_every_rating_meets_itself() {
        for rating in NemaRating::ALL {
            assert!(rating.meets(rating));
        }
    }

    #[test]
    fn test_indoor_rating_does_not_cover_outdoor() {
        assert!(!Type1.is_outdoor());
        assert!(!Type12.is_outdoor());
        assert!(Type3R.is_outdoor());
        assert!(Type4X.is_outdoor());
    }

    #[test]
    fn test_serde_as_plain_string() {
        assert_eq!(serde_json::to_string(&Type3R).unwrap(), "\"3R\"");
        let parsed: NemaRating = serde_json::from_str("\"4x\"").unwrap();
        assert_eq!(parsed, Type4X);
        assert!(serde_json::from_str::<NemaRating>("\"9Z\"").is_err());
    }
}
