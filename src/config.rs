//! Breeding configuration
//!
//! Thresholds and traversal limits shared by the calculators. Loaded from a
//! JSON file when one is present, otherwise the defaults apply.

use crate::error::{GeneticsError, GeneticsResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default inbreeding warning threshold, the coefficient of a half-sibling mating
pub const DEFAULT_INBREEDING_THRESHOLD: f64 = 0.125;

/// Default ancestry traversal depth in generations
pub const DEFAULT_MAX_GENERATIONS: u32 = 6;

/// Configuration for the calculators and the compatibility validator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreedingConfig {
    /// Coefficient above which a pairing receives an inbreeding warning
    pub inbreeding_threshold: f64,
    /// Maximum number of generations walked above each parent
    pub max_generations: u32,
    /// Treat an animal of unknown sex as a hard blocker
    pub block_unknown_sex: bool,
}

impl Default for BreedingConfig {
    fn default() -> Self {
        Self {
            inbreeding_threshold: DEFAULT_INBREEDING_THRESHOLD,
            max_generations: DEFAULT_MAX_GENERATIONS,
            block_unknown_sex: true,
        }
    }
}

impl BreedingConfig {
    /// Read a configuration file. Missing keys fall back to defaults.
    pub fn from_file(path: impl AsRef<Path>) -> GeneticsResult<Self> {
        let data = std::fs::read_to_string(path)?;
        let config: BreedingConfig = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Read the file if it exists, defaults otherwise
    pub fn load_or_default(path: impl AsRef<Path>) -> GeneticsResult<Self> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> GeneticsResult<()> {
        if !(0.0..=1.0).contains(&self.inbreeding_threshold) {
            return Err(GeneticsError::invalid(
                "inbreeding_threshold",
                format!("{} is outside [0, 1]", self.inbreeding_threshold),
            ));
        }
        if self.max_generations == 0 {
            return Err(GeneticsError::invalid(
                "max_generations",
                "must walk at least one generation",
            ));
        }
        Ok(())
    }
}
