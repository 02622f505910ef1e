//! Door controller service: the hexagonal core.
//!
//! [`DoorService`] owns the shared [`DoorStateEngine`] handle and the
//! actuator command queue. It performs bring-up in a fixed order and then
//! exposes a small hardware-agnostic API to the main loop and the remote
//! layer.
//!
//! ```text
//!  LimitSwitch ×2 ──edge──▶ ┌────────────────────┐ ──▶ DiagnosticsSink
//!                           │    DoorService     │
//!  remote layer ──request──▶│ engine · cmd queue │ ──▶ worker ──▶ relays
//!                           └────────────────────┘
//! ```

use std::sync::Arc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use log::{info, warn};

use crate::config::DoorConfig;
use crate::door::{DoorState, DoorStateEngine, SensorLevel, TransitionCallbacks};
use crate::drivers::sequencer::ActuatorSequencer;
use crate::drivers::worker::CommandQueue;
use crate::error::Result;
use crate::sensors::LimitSwitch;

use super::commands::{DoorCommand, open_level};
use super::ports::{DiagnosticsSink, EdgeInterrupts};

// ───────────────────────────────────────────────────────────────
// DoorService
// ───────────────────────────────────────────────────────────────

pub struct DoorService {
    engine: Arc<DoorStateEngine>,
    commands: Arc<CommandQueue>,
    open_level_threshold: u8,
    /// Dropped-report count already warned about.
    reported_drops: u32,
}

impl DoorService {
    /// Bring the controller up.
    ///
    /// 0. Validate `config`.
    /// 1. Flash both relays as a self-test.
    /// 2. Read both limit switches.
    /// 3. Initialise the engine from those readings (no callback fires).
    /// 4. Arm the lower, then the upper edge handler.
    /// 5. Re-read both switches and feed any level the engine has not
    ///    seen, so an edge that landed between steps 2 and 4 is not lost.
    ///
    /// Any failure aborts bring-up and no service is returned, so no
    /// command can be accepted. A handler armed before the failure is
    /// disarmed again, so a failed start leaves no switch live.
    pub fn start<L, U, P, B, D, I>(
        config: &DoorConfig,
        sequencer: &mut ActuatorSequencer<P, B, D>,
        mut lower: LimitSwitch<L>,
        mut upper: LimitSwitch<U>,
        irq: &mut I,
        callbacks: TransitionCallbacks,
        commands: Arc<CommandQueue>,
    ) -> Result<Self>
    where
        L: InputPin + Clone + Send + 'static,
        U: InputPin + Clone + Send + 'static,
        P: OutputPin,
        B: OutputPin,
        D: DelayNs,
        I: EdgeInterrupts + ?Sized,
    {
        config.validate()?;
        sequencer.self_test_flash(config.flash_cycles)?;

        let initial_lower = lower.read()?;
        let initial_upper = upper.read()?;
        let engine = Arc::new(DoorStateEngine::initialize(
            initial_lower,
            initial_upper,
            callbacks,
        ));

        let e = engine.clone();
        lower.on_edge(&mut *irq, move |level| e.on_lower_sensor_changed(level))?;
        let e = engine.clone();
        if let Err(err) = upper.on_edge(&mut *irq, move |level| e.on_upper_sensor_changed(level)) {
            disarm(irq, &[lower.pin()]);
            return Err(err);
        }
        info!(
            "DoorService: edges armed on GPIO {} (lower) and {} (upper)",
            lower.pin(),
            upper.pin()
        );

        let settled = lower
            .read()
            .and_then(|l| upper.read().map(|u| (l, u)));
        let (now_lower, now_upper) = match settled {
            Ok(levels) => levels,
            Err(err) => {
                disarm(irq, &[lower.pin(), upper.pin()]);
                return Err(err);
            }
        };
        reconcile(&engine, now_lower, engine.lower_level(), |l| {
            engine.on_lower_sensor_changed(l);
        });
        reconcile(&engine, now_upper, engine.upper_level(), |l| {
            engine.on_upper_sensor_changed(l);
        });

        info!("DoorService started, door is {}", engine.state());
        Ok(Self {
            engine,
            commands,
            open_level_threshold: config.open_level_threshold,
            reported_drops: 0,
        })
    }

    pub fn state(&self) -> DoorState {
        self.engine.state()
    }

    /// Current state as the remote layer's open level (0-100).
    pub fn open_level(&self) -> u8 {
        open_level(self.state())
    }

    /// Queue an actuation. Never blocks.
    pub fn request(&self, cmd: DoorCommand) -> Result<()> {
        info!("DoorService: {:?} requested while {}", cmd, self.state());
        self.commands.submit(cmd).map_err(|e| {
            warn!("DoorService: {:?} refused: {}", cmd, e);
            e.into()
        })
    }

    /// Interpret a requested open level and queue the matching command.
    pub fn set_open_level(&self, level: u8) -> Result<DoorCommand> {
        let cmd = DoorCommand::for_open_level(level, self.open_level_threshold);
        self.request(cmd)?;
        Ok(cmd)
    }

    /// Forward pending status reports to `sink`. Main loop only.
    pub fn flush_diagnostics(&mut self, sink: &mut impl DiagnosticsSink) -> usize {
        let sent = self.engine.flush_status(sink);
        let dropped = self.engine.dropped_status_reports();
        if dropped != self.reported_drops {
            warn!(
                "DoorService: {} status reports dropped since boot",
                dropped
            );
            self.reported_drops = dropped;
        }
        sent
    }

    pub fn engine(&self) -> &Arc<DoorStateEngine> {
        &self.engine
    }

    pub fn commands(&self) -> &Arc<CommandQueue> {
        &self.commands
    }
}

fn disarm<I: EdgeInterrupts + ?Sized>(irq: &mut I, pins: &[i32]) {
    for &pin in pins {
        irq.unsubscribe(pin);
    }
    warn!("DoorService: bring-up aborted, GPIO {:?} disarmed", pins);
}

fn reconcile(
    engine: &DoorStateEngine,
    now: SensorLevel,
    recorded: SensorLevel,
    feed: impl FnOnce(SensorLevel),
) {
    if now != recorded {
        warn!("DoorService: switch moved during bring-up, now {}", now);
        feed(now);
        info!("DoorService: door re-derived as {}", engine.state());
    }
}
