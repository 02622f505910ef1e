//! Reference-deployment GPIO assignments.
//!
//! These are only the defaults baked into [`DoorConfig::default`]; the
//! running firmware takes its pins from the stored configuration so a
//! board with different wiring needs no rebuild.
//!
//! [`DoorConfig::default`]: crate::config::DoorConfig

// ---------------------------------------------------------------------------
// Limit switches (normally-closed reed switches, internal pull-up)
// ---------------------------------------------------------------------------

/// Reed switch at the bottom of the track. LOW = door fully closed.
pub const LOWER_SENSOR_GPIO: i32 = 4;
/// Reed switch at the top of the track. LOW = door fully open.
pub const UPPER_SENSOR_GPIO: i32 = 5;

// ---------------------------------------------------------------------------
// Relay outputs (active LOW)
// ---------------------------------------------------------------------------

/// Primary relay across the opener's push-button contacts.
pub const PRIMARY_ACTUATOR_GPIO: i32 = 7;
/// Backup relay, only engaged for the closing direction.
pub const BACKUP_ACTUATOR_GPIO: i32 = 0;
