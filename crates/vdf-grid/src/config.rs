//! Configuration defaults applied by the grid factory.

use crate::types::InterpolationOrder;
use serde::{Deserialize, Serialize};

/// Defaults applied to every grid built through [`crate::GridFactory`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Reconstruction method used by `value()`.
    #[serde(default)]
    pub interpolation: InterpolationOrder,

    /// Missing-data sentinel. `None` leaves missing-data handling disabled
    /// unless the grid spec supplies its own value.
    #[serde(default)]
    pub missing_value: Option<f32>,
}

impl GridConfig {
    /// Load configuration from environment variables.
    ///
    /// Reads `GRID_INTERPOLATION_ORDER` (`nearest`/`linear`/`0`/`1`) and
    /// `GRID_MISSING_VALUE` (any float). Unparsable values are ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("GRID_INTERPOLATION_ORDER") {
            config.interpolation = InterpolationOrder::from_str(&val);
        }

        if let Ok(val) = std::env::var("GRID_MISSING_VALUE") {
            if let Ok(mv) = val.trim().parse::<f32>() {
                config.missing_value = Some(mv);
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(mv) = self.missing_value {
            if mv.is_nan() {
                return Err("missing_value must not be NaN".to_string());
            }
        }

        Ok(())
    }
}
