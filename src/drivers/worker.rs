//! Actuator command queue and worker.
//!
//! Requests to open or close arrive from the remote layer at arbitrary
//! times, but a pulse blocks for its whole hold interval and two pulses
//! must never overlap. Requests are therefore queued here and executed one
//! at a time by a single worker thread.
//!
//! ```text
//! ┌──────────────┐ DoorCommand ┌──────────────┐  pulse  ┌───────────┐
//! │ DoorService  │────────────▶│    worker    │────────▶│ sequencer │
//! │ (any thread) │  try_send   │  (block_on)  │         │  (relays) │
//! └──────────────┘             └──────────────┘         └───────────┘
//! ```
//!
//! A pin-write failure latches the queue as faulted. The worker returns,
//! pending commands are discarded, and every later submit is refused.

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::{error, info};

use super::sequencer::ActuatorSequencer;
use crate::app::commands::DoorCommand;
use crate::error::{ActuatorError, Error, Result};

/// Pending commands before `submit` reports busy.
pub const QUEUE_DEPTH: usize = 4;

pub struct CommandQueue {
    channel: Channel<CriticalSectionRawMutex, DoorCommand, QUEUE_DEPTH>,
    faulted: AtomicBool,
}

impl CommandQueue {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
            faulted: AtomicBool::new(false),
        }
    }

    /// Queue a command without blocking.
    pub fn submit(&self, cmd: DoorCommand) -> core::result::Result<(), ActuatorError> {
        if self.is_faulted() {
            return Err(ActuatorError::Faulted);
        }
        self.channel
            .try_send(cmd)
            .map_err(|_| ActuatorError::Busy)
    }

    pub fn try_next(&self) -> Option<DoorCommand> {
        self.channel.try_receive().ok()
    }

    /// Wait for the next command.
    pub async fn next(&self) -> DoorCommand {
        self.channel.receive().await
    }

    pub fn pending(&self) -> usize {
        self.channel.len()
    }

    pub fn is_faulted(&self) -> bool {
        self.faulted.load(Ordering::Acquire)
    }

    fn latch_fault(&self) {
        self.faulted.store(true, Ordering::Release);
        while self.channel.try_receive().is_ok() {}
    }

    /// Execute one command, latching the queue on failure.
    pub fn execute<P, B, D>(
        &self,
        sequencer: &mut ActuatorSequencer<P, B, D>,
        cmd: DoorCommand,
    ) -> Result<()>
    where
        P: OutputPin,
        B: OutputPin,
        D: DelayNs,
    {
        let result = match cmd {
            DoorCommand::Open => sequencer.open(),
            DoorCommand::Close => sequencer.close(),
        };
        if let Err(e) = result {
            error!("worker: {:?} failed: {}, actuators disabled", cmd, e);
            self.latch_fault();
        }
        result
    }

    /// Run every command already queued. Returns how many were executed.
    pub fn process_pending<P, B, D>(
        &self,
        sequencer: &mut ActuatorSequencer<P, B, D>,
    ) -> Result<usize>
    where
        P: OutputPin,
        B: OutputPin,
        D: DelayNs,
    {
        let mut done = 0;
        while let Some(cmd) = self.try_next() {
            self.execute(sequencer, cmd)?;
            done += 1;
        }
        Ok(done)
    }
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Worker loop. Executes commands as they arrive and returns only when a
/// pulse fails, with the error that latched the queue.
pub fn run_worker<P, B, D>(queue: &CommandQueue, sequencer: &mut ActuatorSequencer<P, B, D>) -> Error
where
    P: OutputPin,
    B: OutputPin,
    D: DelayNs,
{
    info!("worker: actuator worker running");
    futures_lite::future::block_on(async {
        loop {
            let cmd = queue.next().await;
            if let Err(e) = queue.execute(sequencer, cmd) {
                return e;
            }
        }
    })
}
