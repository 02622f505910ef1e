//! Hardware adapter: concrete pins, delay and interrupt controller.
//!
//! Bridges the raw helpers in [`hw_init`] to the `embedded-hal` traits the
//! sensor and relay drivers are generic over, and to the
//! [`EdgeInterrupts`] port. This is the only module besides `hw_init` that
//! touches real hardware; on non-espidf targets `hw_init` simulates it.

use core::time::Duration;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, ErrorType, InputPin, OutputPin};

use crate::app::ports::{EdgeHandler, EdgeInterrupts};
use crate::drivers::hw_init::{self, GpioError, HwInitError};

impl digital::Error for GpioError {
    fn kind(&self) -> digital::ErrorKind {
        digital::ErrorKind::Other
    }
}

// ── Pins ──────────────────────────────────────────────────────

/// An already-configured GPIO, addressed by number.
///
/// Cheap to clone: an edge handler and the main thread can each hold one
/// for the same input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpioPin(i32);

impl GpioPin {
    pub fn new(pin: i32) -> Self {
        Self(pin)
    }

    pub fn number(self) -> i32 {
        self.0
    }
}

impl ErrorType for GpioPin {
    type Error = GpioError;
}

impl InputPin for GpioPin {
    fn is_high(&mut self) -> Result<bool, GpioError> {
        Ok(hw_init::gpio_read(self.0))
    }

    fn is_low(&mut self) -> Result<bool, GpioError> {
        Ok(!hw_init::gpio_read(self.0))
    }
}

impl OutputPin for GpioPin {
    fn set_low(&mut self) -> Result<(), GpioError> {
        hw_init::gpio_write(self.0, false)
    }

    fn set_high(&mut self) -> Result<(), GpioError> {
        hw_init::gpio_write(self.0, true)
    }
}

// ── Delay ─────────────────────────────────────────────────────

/// Blocking delay that yields the CPU to other FreeRTOS tasks.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadDelay;

impl DelayNs for ThreadDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(u64::from(ns)));
    }

    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}

// ── Edge interrupts ───────────────────────────────────────────

/// [`EdgeInterrupts`] over the ESP-IDF per-pin GPIO ISR service.
#[derive(Debug)]
pub struct EspEdgeInterrupts {
    _private: (),
}

impl EspEdgeInterrupts {
    /// Install the ISR service. Safe to call more than once.
    pub fn new() -> Result<Self, HwInitError> {
        hw_init::init_isr_service()?;
        Ok(Self { _private: () })
    }
}

impl EdgeInterrupts for EspEdgeInterrupts {
    fn subscribe_any_edge(&mut self, pin: i32, handler: EdgeHandler) -> crate::Result<()> {
        hw_init::subscribe_any_edge(pin, handler)?;
        Ok(())
    }

    fn unsubscribe(&mut self, pin: i32) {
        hw_init::unsubscribe_edge(pin);
    }
}

/// Configure the two limit-switch inputs and two relay outputs.
pub fn init_door_pins(
    config: &crate::config::DoorConfig,
) -> Result<(), HwInitError> {
    hw_init::init_outputs(&[config.primary_actuator_gpio, config.backup_actuator_gpio])?;
    hw_init::init_inputs(&[config.lower_sensor_gpio, config.upper_sensor_gpio])
}
