//! Reed limit switch reader.
//!
//! Wraps one digital input and maps its raw level onto [`SensorLevel`].
//! Edge notifications carry no payload: the registered handler re-reads
//! the pin each time it fires and passes the fresh level on. Debouncing is
//! left to the consumer, which ignores repeats of the last recorded level.

use embedded_hal::digital::InputPin;

use crate::app::ports::EdgeInterrupts;
use crate::door::SensorLevel;
use crate::error::{Result, SensorError};

/// One limit switch on a pulled-up input pin.
pub struct LimitSwitch<P> {
    pin_id: i32,
    pin: P,
}

impl<P: InputPin> LimitSwitch<P> {
    pub fn new(pin_id: i32, pin: P) -> Self {
        Self { pin_id, pin }
    }

    pub fn pin(&self) -> i32 {
        self.pin_id
    }

    /// Synchronous, non-blocking read of the current level.
    pub fn read(&mut self) -> Result<SensorLevel> {
        read_level(self.pin_id, &mut self.pin)
    }

    /// Arm `handler` on every edge of this switch.
    ///
    /// The interrupt owns its own handle to the pin, so the switch stays
    /// readable from the main thread afterwards. A read that fails inside
    /// the interrupt drops that edge.
    pub fn on_edge<I, F>(&self, irq: &mut I, mut handler: F) -> Result<()>
    where
        P: Clone + Send + 'static,
        I: EdgeInterrupts + ?Sized,
        F: FnMut(SensorLevel) + Send + 'static,
    {
        let pin_id = self.pin_id;
        let mut pin = self.pin.clone();
        irq.subscribe_any_edge(
            pin_id,
            Box::new(move || {
                if let Ok(level) = read_level(pin_id, &mut pin) {
                    handler(level);
                }
            }),
        )
    }
}

fn read_level<P: InputPin>(pin_id: i32, pin: &mut P) -> Result<SensorLevel> {
    let high = pin
        .is_high()
        .map_err(|_| SensorError::GpioReadFailed(pin_id))?;
    Ok(SensorLevel::from_pin_high(high))
}
