// 🏷️ AQI Classifier - Severity bands as data
// Maps a numeric AQI value onto one of six ordinal categories

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

/// Non-negative pollution severity score. Capped at 500 by the dashboards,
/// uncapped in computation.
pub type AqiValue = f64;

// ============================================================================
// CATEGORY
// ============================================================================

/// Ordinal AQI band. Variants are declared from least to most severe, so
/// the derived `Ord` follows severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AqiCategory {
    Good,
    Satisfactory,
    Moderate,
    Poor,
    #[serde(rename = "Very Poor")]
    VeryPoor,
    Severe,
}

/// Inclusive upper bound of each band, in severity order. Anything above the
/// last bound is `Severe`.
pub const BREAKPOINTS: [(AqiValue, AqiCategory); 5] = [
    (50.0, AqiCategory::Good),
    (100.0, AqiCategory::Satisfactory),
    (200.0, AqiCategory::Moderate),
    (300.0, AqiCategory::Poor),
    (400.0, AqiCategory::VeryPoor),
];

impl AqiCategory {
    /// All categories from best to worst.
    pub const ALL: [AqiCategory; 6] = [
        AqiCategory::Good,
        AqiCategory::Satisfactory,
        AqiCategory::Moderate,
        AqiCategory::Poor,
        AqiCategory::VeryPoor,
        AqiCategory::Severe,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            AqiCategory::Good => "Good",
            AqiCategory::Satisfactory => "Satisfactory",
            AqiCategory::Moderate => "Moderate",
            AqiCategory::Poor => "Poor",
            AqiCategory::VeryPoor => "Very Poor",
            AqiCategory::Severe => "Severe",
        }
    }

    /// Display colour used by the dashboards (hex RGB).
    pub fn color_hex(&self) -> &'static str {
        match self {
            AqiCategory::Good => "#00e400",
            AqiCategory::Satisfactory => "#ffff00",
            AqiCategory::Moderate => "#ff7e00",
            AqiCategory::Poor => "#ff0000",
            AqiCategory::VeryPoor => "#8f3f97",
            AqiCategory::Severe => "#7e0023",
        }
    }

    /// Same colour as `color_hex`, as an RGB triple for terminal rendering.
    pub fn color_rgb(&self) -> (u8, u8, u8) {
        match self {
            AqiCategory::Good => (0x00, 0xe4, 0x00),
            AqiCategory::Satisfactory => (0xff, 0xff, 0x00),
            AqiCategory::Moderate => (0xff, 0x7e, 0x00),
            AqiCategory::Poor => (0xff, 0x00, 0x00),
            AqiCategory::VeryPoor => (0x8f, 0x3f, 0x97),
            AqiCategory::Severe => (0x7e, 0x00, 0x23),
        }
    }

    /// Upper bound of this band (`None` for `Severe`, which is open-ended).
    pub fn upper_bound(&self) -> Option<AqiValue> {
        BREAKPOINTS
            .iter()
            .find(|(_, category)| category == self)
            .map(|(bound, _)| *bound)
    }
}

impl fmt::Display for AqiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AqiCategory {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "good" => Ok(AqiCategory::Good),
            "satisfactory" => Ok(AqiCategory::Satisfactory),
            "moderate" => Ok(AqiCategory::Moderate),
            "poor" => Ok(AqiCategory::Poor),
            "verypoor" => Ok(AqiCategory::VeryPoor),
            "severe" => Ok(AqiCategory::Severe),
            _ => Err(ParseError::UnknownCategory(s.to_string())),
        }
    }
}

// ============================================================================
// CLASSIFIER
// ============================================================================

/// Classify an AQI value. Each band's upper bound is inclusive, so 50.0 is
/// still `Good` and 50.5 is `Satisfactory`.
///
/// Negative values are not rejected; they fall into `Good`.
pub fn classify(aqi: AqiValue) -> AqiCategory {
    for (bound, category) in BREAKPOINTS {
        if aqi <= bound {
            return category;
        }
    }
    AqiCategory::Severe
}

// ============================================================================
// TESTS
// ============================================================================
