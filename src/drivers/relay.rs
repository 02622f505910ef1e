//! Relay output channel (active LOW).
//!
//! The relay closes the opener's push-button contacts while its input is
//! driven LOW. Idle level is HIGH, so a floating or reset pin never
//! presses the button.

use embedded_hal::digital::OutputPin;

use crate::error::{ActuatorError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Released,
    Engaged,
}

/// One relay on an output pin.
pub struct ActuatorChannel<P> {
    pin_id: i32,
    pin: P,
    state: RelayState,
}

impl<P: OutputPin> ActuatorChannel<P> {
    /// Wrap an output pin. The pin is assumed to already idle HIGH.
    pub fn new(pin_id: i32, pin: P) -> Self {
        Self {
            pin_id,
            pin,
            state: RelayState::Released,
        }
    }

    /// Drive the relay input LOW (contacts closed).
    pub fn engage(&mut self) -> Result<()> {
        self.pin
            .set_low()
            .map_err(|_| ActuatorError::GpioWriteFailed(self.pin_id))?;
        self.state = RelayState::Engaged;
        Ok(())
    }

    /// Drive the relay input HIGH (contacts open).
    pub fn release(&mut self) -> Result<()> {
        self.pin
            .set_high()
            .map_err(|_| ActuatorError::GpioWriteFailed(self.pin_id))?;
        self.state = RelayState::Released;
        Ok(())
    }

    pub fn pin(&self) -> i32 {
        self.pin_id
    }

    /// Last level successfully written.
    pub fn state(&self) -> RelayState {
        self.state
    }
}
