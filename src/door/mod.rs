//! Door state model and the limit-switch state engine.
//!
//! ```text
//!   lower reed ──edge──▶ ┌──────────────────┐ ──▶ on_closed / on_opening
//!                        │ DoorStateEngine  │
//!   upper reed ──edge──▶ │ (atomic fields)  │ ──▶ on_open / on_closing
//!                        └──────────────────┘
//!                                 │ StatusReport (lock-free queue)
//!                                 ▼
//!                         DiagnosticsSink (main loop)
//! ```
//!
//! The door position is never measured directly: it is derived from which
//! reed switch last changed and to what level.

pub mod engine;
pub mod status;

pub use engine::{Callback, DoorStateEngine, TransitionCallbacks};
pub use status::StatusReport;

use core::fmt;

// ---------------------------------------------------------------------------
// Door state
// ---------------------------------------------------------------------------

/// Derived position of the door.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DoorState {
    Opening = 0,
    Closing = 1,
    Open = 2,
    Closed = 3,
}

impl DoorState {
    /// Decode the value stored in the engine's atomic.
    ///
    /// Only discriminants written by the engine reach this; anything else
    /// is treated as `Closed`, the conservative reading.
    pub(crate) fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Opening,
            1 => Self::Closing,
            2 => Self::Open,
            3 => Self::Closed,
            _ => {
                debug_assert!(false, "invalid door state: {raw}");
                Self::Closed
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Opening => "OPENING",
            Self::Closing => "CLOSING",
            Self::Open => "OPEN",
            Self::Closed => "CLOSED",
        }
    }
}

impl fmt::Display for DoorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Sensor level
// ---------------------------------------------------------------------------

/// Logical level of a normally-closed reed switch with pull-up.
///
/// The magnet closes the contact and pulls the pin LOW (`Actuated`); with
/// the magnet away the pull-up reads HIGH (`Separated`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SensorLevel {
    Actuated = 0,
    Separated = 1,
}

impl SensorLevel {
    /// Map a raw pin reading onto the switch level.
    pub fn from_pin_high(high: bool) -> Self {
        if high { Self::Separated } else { Self::Actuated }
    }

    pub(crate) fn from_u8(raw: u8) -> Self {
        if raw == 0 { Self::Actuated } else { Self::Separated }
    }
}

impl fmt::Display for SensorLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Actuated => f.write_str("actuated"),
            Self::Separated => f.write_str("separated"),
        }
    }
}

/// Which limit switch an edge came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sensor {
    Lower,
    Upper,
}

impl fmt::Display for Sensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lower => f.write_str("LOWER"),
            Self::Upper => f.write_str("UPPER"),
        }
    }
}

// ---------------------------------------------------------------------------
// Pure derivation
// ---------------------------------------------------------------------------

/// Derive a door state from a pair of simultaneous readings.
///
/// Lower actuated wins; otherwise upper actuated means open. Both separated
/// (mid-travel, direction unknown) is reported as `Closed`.
pub fn get_door_state(lower: SensorLevel, upper: SensorLevel) -> DoorState {
    if lower == SensorLevel::Actuated {
        return DoorState::Closed;
    }
    if upper == SensorLevel::Actuated {
        return DoorState::Open;
    }
    DoorState::Closed
}
