//! Timed relay pulse sequences.
//!
//! The opener is a single push-button: a press starts or reverses travel.
//! The sequencer "presses" it by engaging relays for one hold interval.
//!
//! - `open()`   primary relay only.
//! - `close()`  primary and backup together.
//! - `self_test_flash()`  both relays on/off a few times at boot, before
//!   any sensor interrupt is armed.
//!
//! Every pulse blocks the caller for its hold time and runs to completion.
//! A pin-write failure aborts the pulse: the sequencer makes one attempt to
//! release whatever it engaged, then returns the first error.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::{debug, info, warn};

use super::relay::ActuatorChannel;
use crate::error::Result;

/// Drives the primary and backup relays through pulse sequences.
pub struct ActuatorSequencer<P, B, D> {
    primary: ActuatorChannel<P>,
    backup: ActuatorChannel<B>,
    delay: D,
    hold_ms: u32,
}

impl<P, B, D> ActuatorSequencer<P, B, D>
where
    P: OutputPin,
    B: OutputPin,
    D: DelayNs,
{
    pub fn new(
        primary: ActuatorChannel<P>,
        backup: ActuatorChannel<B>,
        delay: D,
        hold_ms: u32,
    ) -> Self {
        Self {
            primary,
            backup,
            delay,
            hold_ms,
        }
    }

    /// Pulse the primary relay. The backup relay is not touched.
    pub fn open(&mut self) -> Result<()> {
        debug!("sequencer: open pulse ({} ms)", self.hold_ms);
        self.pulse(false)
    }

    /// Pulse both relays together.
    pub fn close(&mut self) -> Result<()> {
        debug!("sequencer: close pulse ({} ms)", self.hold_ms);
        self.pulse(true)
    }

    /// Boot-time visual/audible check: `cycles` x (both on, hold, both
    /// off, hold).
    pub fn self_test_flash(&mut self, cycles: u8) -> Result<()> {
        info!("sequencer: self-test flash x{}", cycles);
        for _ in 0..cycles {
            self.pulse(true)?;
            self.delay.delay_ms(self.hold_ms);
        }
        Ok(())
    }

    pub fn hold_ms(&self) -> u32 {
        self.hold_ms
    }

    pub fn primary(&self) -> &ActuatorChannel<P> {
        &self.primary
    }

    pub fn backup(&self) -> &ActuatorChannel<B> {
        &self.backup
    }

    fn pulse(&mut self, with_backup: bool) -> Result<()> {
        if let Err(e) = self.engage(with_backup) {
            warn!("sequencer: engage failed: {}", e);
            let _ = self.release(with_backup);
            return Err(e);
        }
        self.delay.delay_ms(self.hold_ms);
        self.release(with_backup)
    }

    fn engage(&mut self, with_backup: bool) -> Result<()> {
        self.primary.engage()?;
        if with_backup {
            self.backup.engage()?;
        }
        Ok(())
    }

    /// Release both channels even if the first one fails.
    fn release(&mut self, with_backup: bool) -> Result<()> {
        let primary = self.primary.release();
        let backup = if with_backup {
            self.backup.release()
        } else {
            Ok(())
        };
        primary.and(backup)
    }
}
