use std::time::Duration;

use crate::error::EngineError;

// ============================================================================
// Defaults
// ============================================================================

pub const COLUMNS: i32 = 10;
pub const ROWS: i32 = 20;
pub const CELL_SIZE: u32 = 40;

// Timing (in milliseconds)
const UPDATE_START_SPEED_MS: u64 = 200;
const MOVE_WAIT_TIME_MS: u64 = 200;
const ROTATE_WAIT_TIME_MS: u64 = 200;
const SOFT_DROP_MULTIPLIER: f64 = 0.3;
const LEVEL_UP_DECELERATION: f64 = 0.75;
pub const LINES_PER_LEVEL: u32 = 10;

// Scoring, indexed by lines cleared in one lock
pub const SCORE_TABLE: [u32; 5] = [0, 40, 100, 300, 1200];

// ============================================================================
// Settings
// ============================================================================

/// Immutable game configuration, built once and handed to the engine.
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub columns: i32,
    pub rows: i32,
    /// Pixel edge of one cell; only used for coordinate to pixel conversion.
    pub cell_size: u32,
    pub gravity_interval: Duration,
    /// Soft-drop gravity is `gravity_interval * soft_drop_multiplier`.
    pub soft_drop_multiplier: f64,
    pub move_cooldown: Duration,
    pub rotate_cooldown: Duration,
    pub score_table: [u32; 5],
    /// Applied to the gravity interval on every level-up.
    pub level_up_deceleration: f64,
    pub lines_per_level: u32,
    /// Added to every catalog offset when a piece spawns.
    pub spawn_offset: (i32, i32),
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            columns: COLUMNS,
            rows: ROWS,
            cell_size: CELL_SIZE,
            gravity_interval: Duration::from_millis(UPDATE_START_SPEED_MS),
            soft_drop_multiplier: SOFT_DROP_MULTIPLIER,
            move_cooldown: Duration::from_millis(MOVE_WAIT_TIME_MS),
            rotate_cooldown: Duration::from_millis(ROTATE_WAIT_TIME_MS),
            score_table: SCORE_TABLE,
            level_up_deceleration: LEVEL_UP_DECELERATION,
            lines_per_level: LINES_PER_LEVEL,
            spawn_offset: (COLUMNS / 2, -1),
        }
    }
}

impl Settings {
    /// Rejects settings the engine cannot run with.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.columns < 4 || self.rows < 4 {
            return Err(EngineError::Configuration(format!(
                "field must be at least 4x4, got {}x{}",
                self.columns, self.rows
            )));
        }
        // Catalog offsets reach one column left and one column right of the spawn column.
        let (spawn_x, _) = self.spawn_offset;
        if spawn_x < 1 || spawn_x + 1 >= self.columns {
            return Err(EngineError::Configuration(format!(
                "spawn column {} does not fit a {}-column field",
                spawn_x, self.columns
            )));
        }
        if self.gravity_interval.is_zero() {
            return Err(EngineError::Configuration(
                "gravity interval must be non-zero".to_string(),
            ));
        }
        for (name, factor) in [
            ("soft drop multiplier", self.soft_drop_multiplier),
            ("level-up deceleration", self.level_up_deceleration),
        ] {
            if !(factor > 0.0 && factor <= 1.0) {
                return Err(EngineError::Configuration(format!(
                    "{name} must be in (0, 1], got {factor}"
                )));
            }
        }
        if self.lines_per_level == 0 {
            return Err(EngineError::Configuration(
                "lines per level must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Gravity interval while soft drop is held.
    pub fn fast_interval(&self, normal: Duration) -> Duration {
        normal.mul_f64(self.soft_drop_multiplier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(Settings::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_zero_gravity() {
        let settings = Settings {
            gravity_interval: Duration::ZERO,
            ..Settings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(EngineError::Configuration(_))
        ));
    }

    #[test]
    fn rejects_spawn_outside_field() {
        let settings = Settings {
            spawn_offset: (9, -1),
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn fast_interval_scales_normal() {
        let settings = Settings::default();
        let fast = settings.fast_interval(Duration::from_millis(200));
        assert!((fast.as_secs_f64() - 0.06).abs() < 1e-6);
    }
}
