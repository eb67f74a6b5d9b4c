//! Measurement vocabulary shared by every ingredient reference.
//!
//! The backend has historically accepted two spellings for the same unit:
//! the upper-snake token (`GRAMS`) and a Greek display label
//! (`γραμμάρια`). The core always sends the token and accepts either on
//! the way in.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MeasurementUnit {
    #[default]
    Grams,
    Kilograms,
    Milliliters,
    Liters,
    Cups,
    Tablespoons,
    Teaspoons,
    Pieces,
    Slices,
    Pinch,
}

impl MeasurementUnit {
    pub const ALL: [Self; 10] = [
        Self::Grams,
        Self::Kilograms,
        Self::Milliliters,
        Self::Liters,
        Self::Cups,
        Self::Tablespoons,
        Self::Teaspoons,
        Self::Pieces,
        Self::Slices,
        Self::Pinch,
    ];

    /// Unit assumed when a backend reference carries none.
    pub const FALLBACK: Self = Self::Pieces;

    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Grams => "GRAMS",
            Self::Kilograms => "KILOGRAMS",
            Self::Milliliters => "MILLILITERS",
            Self::Liters => "LITERS",
            Self::Cups => "CUPS",
            Self::Tablespoons => "TABLESPOONS",
            Self::Teaspoons => "TEASPOONS",
            Self::Pieces => "PIECES",
            Self::Slices => "SLICES",
            Self::Pinch => "PINCH",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Grams => "γραμμάρια",
            Self::Kilograms => "κιλά",
            Self::Milliliters => "ml",
            Self::Liters => "λίτρα",
            Self::Cups => "φλιτζάνια",
            Self::Tablespoons => "κουταλιές σούπας",
            Self::Teaspoons => "κουταλάκια γλυκού",
            Self::Pieces => "κομμάτια",
            Self::Slices => "φέτες",
            Self::Pinch => "πρέζα",
        }
    }

    #[must_use]
    pub const fn short_label(self) -> &'static str {
        match self {
            Self::Grams => "g",
            Self::Kilograms => "kg",
            Self::Milliliters => "ml",
            Self::Liters => "L",
            Self::Cups => "φλιτζ.",
            Self::Tablespoons => "κ.σ.",
            Self::Teaspoons => "κ.γ.",
            Self::Pieces => "τεμ.",
            Self::Slices => "φέτες",
            Self::Pinch => "πρέζα",
        }
    }

    /// Accepts the token in any case, the display label or the short label.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        let upper = raw.to_uppercase();
        let lower = raw.to_lowercase();
        Self::ALL.into_iter().find(|unit| {
            unit.token() == upper
                || unit.label().to_lowercase() == lower
                || unit.short_label().to_lowercase() == lower
        })
    }
}

impl fmt::Display for MeasurementUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl<'de> Deserialize<'de> for MeasurementUnit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown measurement unit: {raw}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_both_spellings() {
        assert_eq!(MeasurementUnit::parse("GRAMS"), Some(MeasurementUnit::Grams));
        assert_eq!(MeasurementUnit::parse("grams"), Some(MeasurementUnit::Grams));
        assert_eq!(MeasurementUnit::parse("γραμμάρια"), Some(MeasurementUnit::Grams));
        assert_eq!(
            MeasurementUnit::parse("κουταλιές σούπας"),
            Some(MeasurementUnit::Tablespoons)
        );
        assert_eq!(MeasurementUnit::parse("τεμ."), Some(MeasurementUnit::Pieces));
        assert_eq!(MeasurementUnit::parse("ounces"), None);
        assert_eq!(MeasurementUnit::parse("  "), None);
    }

    #[test]
    fn test_serializes_canonical_token() {
        let json = serde_json::to_string(&MeasurementUnit::Tablespoons).unwrap();
        assert_eq!(json, "\"TABLESPOONS\"");
    }

    #[test]
    fn test_deserializes_greek_label_into_token() {
        let unit: MeasurementUnit = serde_json::from_str("\"κιλά\"").unwrap();
        assert_eq!(unit, MeasurementUnit::Kilograms);
        assert_eq!(serde_json::to_string(&unit).unwrap(), "\"KILOGRAMS\"");
    }

    #[test]
    fn test_labels_are_distinct() {
        for a in MeasurementUnit::ALL {
            for b in MeasurementUnit::ALL {
                if a != b {
                    assert_ne!(a.token(), b.token());
                    assert_ne!(a.label(), b.label());
                }
            }
        }
    }
}
