//! System configuration parameters
//!
//! All tunable parameters for the garage door controller. Values are
//! loaded from NVS at boot through [`ConfigPort`](crate::app::ports::ConfigPort)
//! and fall back to the reference deployment when nothing is stored.

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::pins;

/// Longest relay hold accepted from stored configuration.
const MAX_PULSE_HOLD_MS: u32 = 10_000;
/// Shortest relay hold the opener reliably registers as a button press.
const MIN_PULSE_HOLD_MS: u32 = 100;
/// Upper bound on the boot self-test so a bad value cannot stall startup.
const MAX_FLASH_CYCLES: u8 = 10;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoorConfig {
    // --- Limit switches ---
    /// GPIO of the lower (closed-position) reed switch
    pub lower_sensor_gpio: i32,
    /// GPIO of the upper (open-position) reed switch
    pub upper_sensor_gpio: i32,

    // --- Relays ---
    /// GPIO of the primary relay
    pub primary_actuator_gpio: i32,
    /// GPIO of the backup relay (closing assist)
    pub backup_actuator_gpio: i32,
    /// How long a relay is held active per pulse (milliseconds)
    pub pulse_hold_ms: u32,
    /// Number of both-relay flashes in the boot self-test
    pub flash_cycles: u8,

    // --- Remote control ---
    /// Requested open level above which a request means "open" (0-100)
    pub open_level_threshold: u8,

    // --- Timing ---
    /// Diagnostics flush interval of the main loop (milliseconds)
    pub diagnostics_flush_ms: u32,
}

impl Default for DoorConfig {
    fn default() -> Self {
        Self {
            // Limit switches
            lower_sensor_gpio: pins::LOWER_SENSOR_GPIO,
            upper_sensor_gpio: pins::UPPER_SENSOR_GPIO,

            // Relays
            primary_actuator_gpio: pins::PRIMARY_ACTUATOR_GPIO,
            backup_actuator_gpio: pins::BACKUP_ACTUATOR_GPIO,
            pulse_hold_ms: 1000,
            flash_cycles: 3,

            // Remote control
            open_level_threshold: 50,

            // Timing
            diagnostics_flush_ms: 100, // 10 Hz
        }
    }
}

impl DoorConfig {
    /// Range-check every field.
    ///
    /// Called before persisting and after loading; invalid values are
    /// rejected rather than clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let gpios = [
            self.lower_sensor_gpio,
            self.upper_sensor_gpio,
            self.primary_actuator_gpio,
            self.backup_actuator_gpio,
        ];
        if gpios.iter().any(|&g| g < 0) {
            return Err(ConfigError::ValidationFailed("GPIO numbers must be non-negative"));
        }
        for (i, a) in gpios.iter().enumerate() {
            if gpios[i + 1..].contains(a) {
                return Err(ConfigError::ValidationFailed("GPIO assigned twice"));
            }
        }
        if !(MIN_PULSE_HOLD_MS..=MAX_PULSE_HOLD_MS).contains(&self.pulse_hold_ms) {
            return Err(ConfigError::ValidationFailed("pulse_hold_ms out of range"));
        }
        if self.flash_cycles > MAX_FLASH_CYCLES {
            return Err(ConfigError::ValidationFailed("flash_cycles too large"));
        }
        if self.open_level_threshold > 100 {
            return Err(ConfigError::ValidationFailed("open_level_threshold above 100"));
        }
        if self.diagnostics_flush_ms == 0 {
            return Err(ConfigError::ValidationFailed("diagnostics_flush_ms must be > 0"));
        }
        Ok(())
    }
}
