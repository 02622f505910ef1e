//! Inbound commands to the door controller.
//!
//! The remote layer expresses requests as an "open level" percentage and
//! reads the door back the same way. These helpers are the whole contract
//! between that layer and the [`DoorService`](super::service::DoorService).

use crate::door::DoorState;

/// Actuation requested by the outside world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorCommand {
    Open,
    Close,
}

impl DoorCommand {
    /// Interpret a requested open level (0-100). Anything strictly above
    /// `threshold` is a request to open.
    pub fn for_open_level(level: u8, threshold: u8) -> Self {
        if level > threshold {
            Self::Open
        } else {
            Self::Close
        }
    }
}

/// Open level reported for a door state.
///
/// The travelling states sit just off the ends so a client can tell which
/// way the door is moving.
pub fn open_level(state: DoorState) -> u8 {
    match state {
        DoorState::Closed => 0,
        DoorState::Opening => 2,
        DoorState::Closing => 98,
        DoorState::Open => 100,
    }
}
