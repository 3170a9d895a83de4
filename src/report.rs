use chrono::NaiveDateTime;

use crate::{db::NewHiveState, error::ApiError};

/// Weight of a completely full hive, in kg.
pub const CAPACITY_KG: f64 = 12.0;

/// Fill level from which the dashboard offers a harvest.
pub const HARVEST_READY_LEVEL: i32 = 50;

/// Body of a hive report, as posted by the scale firmware.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct HiveReport {
    pub hive: i64,
    pub weight_kg: f64, // kg
    #[serde(default)]
    pub extracting: bool,
}

impl HiveReport {
    /// Rejects weights that cannot be turned into a meaningful fill level.
    pub fn validate(&self) -> Result<(), ApiError> {
        if !self.weight_kg.is_finite() {
            return Err(ApiError::Validation(
                "weight_kg must be a finite number".to_string(),
            ));
        }
        if self.weight_kg < 0.0 {
            return Err(ApiError::Validation(
                "weight_kg must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    pub fn into_state(self, last_update: NaiveDateTime) -> NewHiveState {
        NewHiveState {
            hive_id: self.hive,
            weight_kg: self.weight_kg,
            level: fill_level(self.weight_kg),
            extracting: self.extracting,
            last_update,
        }
    }
}

/// Percentage of [`CAPACITY_KG`], rounded half-to-even and clamped to `0..=100`.
pub fn fill_level(weight_kg: f64) -> i32 {
    let level = (weight_kg / CAPACITY_KG * 100.0).round_ties_even();
    level.clamp(0.0, 100.0) as i32
}
