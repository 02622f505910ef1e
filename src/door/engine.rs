//! Edge-driven door state engine.
//!
//! The engine reacts to one sensor edge at a time and never polls. Each
//! limit switch has its own recorded level; a transition callback fires
//! only when a sensor reports a level different from the one recorded for
//! it, so contact bounce and duplicate interrupt delivery are absorbed.
//!
//! | Edge source, new level | Resulting state | Callback (on change only) |
//! |------------------------|-----------------|---------------------------|
//! | lower → Actuated       | Closed          | `on_closed`               |
//! | lower → Separated      | Opening         | `on_opening`              |
//! | upper → Actuated       | Open            | `on_open`                 |
//! | upper → Separated      | Closing         | `on_closing`              |
//!
//! ## Concurrency
//!
//! Both sensor handlers run in interrupt context and may run concurrently
//! with each other. Every shared field is a single-byte atomic, so readers
//! never see a torn value. The door state is last-writer-wins: if both
//! switches change at the same instant, the final state is whichever
//! handler stored last, not necessarily the physical one.

use core::fmt;
use core::sync::atomic::{AtomicU8, Ordering};

use log::info;

use super::status::{StatusQueue, StatusReport};
use super::{DoorState, Sensor, SensorLevel, get_door_state};
use crate::app::ports::DiagnosticsSink;

/// A transition callback. Invoked from interrupt context: keep it short
/// and never block.
pub type Callback = Box<dyn Fn() + Send + Sync + 'static>;

// ---------------------------------------------------------------------------
// Callbacks
// ---------------------------------------------------------------------------

/// One optional callback per target state.
#[derive(Default)]
pub struct TransitionCallbacks {
    pub on_opening: Option<Callback>,
    pub on_closing: Option<Callback>,
    pub on_open: Option<Callback>,
    pub on_closed: Option<Callback>,
}

impl TransitionCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn on_opening(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_opening = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_closing(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_closing = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_open(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_open = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_closed(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_closed = Some(Box::new(f));
        self
    }

    fn for_state(&self, state: DoorState) -> Option<&Callback> {
        match state {
            DoorState::Opening => self.on_opening.as_ref(),
            DoorState::Closing => self.on_closing.as_ref(),
            DoorState::Open => self.on_open.as_ref(),
            DoorState::Closed => self.on_closed.as_ref(),
        }
    }
}

impl fmt::Debug for TransitionCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionCallbacks")
            .field("on_opening", &self.on_opening.is_some())
            .field("on_closing", &self.on_closing.is_some())
            .field("on_open", &self.on_open.is_some())
            .field("on_closed", &self.on_closed.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Per-sensor row of the transition table.
struct SensorRule {
    /// State entered when the switch is actuated (door at this limit).
    at_limit: DoorState,
    /// State entered when the switch separates (door leaving this limit).
    leaving: DoorState,
}

const LOWER_RULE: SensorRule = SensorRule {
    at_limit: DoorState::Closed,
    leaving: DoorState::Opening,
};

const UPPER_RULE: SensorRule = SensorRule {
    at_limit: DoorState::Open,
    leaving: DoorState::Closing,
};

/// Authoritative door state, shared between the main loop and both
/// sensor interrupt handlers.
pub struct DoorStateEngine {
    state: AtomicU8,
    lower: AtomicU8,
    upper: AtomicU8,
    callbacks: TransitionCallbacks,
    status: StatusQueue,
}

impl DoorStateEngine {
    /// Build the engine from the boot-time readings of both switches.
    ///
    /// The initial state comes from [`get_door_state`]; no callback fires
    /// for it.
    pub fn initialize(
        initial_lower: SensorLevel,
        initial_upper: SensorLevel,
        callbacks: TransitionCallbacks,
    ) -> Self {
        let state = get_door_state(initial_lower, initial_upper);
        info!(
            "Door engine: lower={} upper={} -> {}",
            initial_lower, initial_upper, state
        );
        Self {
            state: AtomicU8::new(state as u8),
            lower: AtomicU8::new(initial_lower as u8),
            upper: AtomicU8::new(initial_upper as u8),
            callbacks,
            status: StatusQueue::new(),
        }
    }

    pub fn state(&self) -> DoorState {
        DoorState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Last level recorded for the lower switch.
    pub fn lower_level(&self) -> SensorLevel {
        SensorLevel::from_u8(self.lower.load(Ordering::Acquire))
    }

    /// Last level recorded for the upper switch.
    pub fn upper_level(&self) -> SensorLevel {
        SensorLevel::from_u8(self.upper.load(Ordering::Acquire))
    }

    /// Edge handler for the lower (closed-position) switch.
    pub fn on_lower_sensor_changed(&self, new_level: SensorLevel) {
        self.apply(Sensor::Lower, new_level);
    }

    /// Edge handler for the upper (open-position) switch.
    pub fn on_upper_sensor_changed(&self, new_level: SensorLevel) {
        self.apply(Sensor::Upper, new_level);
    }

    /// Route an edge to the matching handler.
    pub fn on_sensor_changed(&self, sensor: Sensor, new_level: SensorLevel) {
        self.apply(sensor, new_level);
    }

    /// Render pending status reports into `sink`. Main-loop only.
    pub fn flush_status(&self, sink: &mut impl DiagnosticsSink) -> usize {
        self.status.drain_into(sink)
    }

    /// Status reports lost because the main loop fell behind.
    pub fn dropped_status_reports(&self) -> u32 {
        self.status.dropped()
    }

    fn apply(&self, sensor: Sensor, new_level: SensorLevel) {
        let (recorded, rule) = match sensor {
            Sensor::Lower => (&self.lower, &LOWER_RULE),
            Sensor::Upper => (&self.upper, &UPPER_RULE),
        };

        // Store the new level and get the previous one in a single step.
        let previous = SensorLevel::from_u8(recorded.swap(new_level as u8, Ordering::AcqRel));
        let changed = previous != new_level;

        match new_level {
            SensorLevel::Actuated => {
                // Reaching a limit always pins the state, even on a repeat.
                self.state.store(rule.at_limit as u8, Ordering::Release);
                if changed {
                    self.fire(rule.at_limit);
                }
            }
            SensorLevel::Separated => {
                if changed {
                    self.state.store(rule.leaving as u8, Ordering::Release);
                    self.fire(rule.leaving);
                }
            }
        }

        self.status.push(StatusReport {
            sensor,
            level: new_level,
            state: self.state(),
            level_changed: changed,
        });
    }

    fn fire(&self, target: DoorState) {
        if let Some(cb) = self.callbacks.for_state(target) {
            cb();
        }
    }
}

impl fmt::Debug for DoorStateEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DoorStateEngine")
            .field("state", &self.state())
            .field("lower", &self.lower_level())
            .field("upper", &self.upper_level())
            .field("callbacks", &self.callbacks)
            .finish_non_exhaustive()
    }
}
