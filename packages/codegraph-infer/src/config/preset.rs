//! Preset configurations
//!
//! Presets provide complete default configurations for common workloads.

use serde::{Deserialize, Serialize};

/// Configuration preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// Interactive prediction: small candidate lists, few passes
    ///
    /// - Local search: 4 passes, 8 candidates per list, no arc pass
    /// - Index: top-16 pairwise, top-16 factors
    /// - BP: 10 rounds
    Fast,

    /// Training and batch prediction
    ///
    /// - Local search: 16 passes, 32 candidates per list, arc pass on
    /// - Index: top-64 pairwise, top-32 factors
    /// - BP: 30 rounds
    Balanced,

    /// Offline evaluation: wide candidate lists, many passes
    ///
    /// - Local search: 64 passes, 128 candidates per list, arc pass on
    /// - Index: top-256 pairwise, top-128 factors
    /// - BP: 100 rounds
    Thorough,
}

impl Preset {
    /// Parse preset from string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "fast" => Ok(Self::Fast),
            "balanced" => Ok(Self::Balanced),
            "thorough" => Ok(Self::Thorough),
            _ => Err(format!(
                "Unknown preset '{}'. Valid presets: fast, balanced, thorough",
                s
            )),
        }
    }

    /// Convert to string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Balanced => "balanced",
            Self::Thorough => "thorough",
        }
    }
}

impl Default for Preset {
    fn default() -> Self {
        Self::Balanced
    }
}

impl std::fmt::Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
