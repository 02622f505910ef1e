//! Mock hardware for integration tests.
//!
//! Records every relay write, delay and interrupt registration in one
//! shared timeline so tests can assert on ordering without touching real
//! GPIO registers.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, ErrorType, InputPin, OutputPin};
use garagedoor::app::ports::{DiagnosticsSink, EdgeHandler, EdgeInterrupts};
use garagedoor::door::{SensorLevel, TransitionCallbacks};
use garagedoor::drivers::relay::ActuatorChannel;
use garagedoor::drivers::sequencer::ActuatorSequencer;
use garagedoor::{Error, Result};

// ── Timeline ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwEvent {
    Write { pin: i32, high: bool },
    Delay(u32),
    Armed(i32),
    Disarmed(i32),
}

#[derive(Clone, Default)]
pub struct Timeline(Arc<Mutex<Vec<HwEvent>>>);

#[allow(dead_code)]
impl Timeline {
    fn push(&self, ev: HwEvent) {
        self.0.lock().unwrap().push(ev);
    }

    pub fn events(&self) -> Vec<HwEvent> {
        self.0.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }

    pub fn writes(&self) -> Vec<(i32, bool)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                HwEvent::Write { pin, high } => Some((pin, high)),
                _ => None,
            })
            .collect()
    }
}

// ── Input pin ─────────────────────────────────────────────────

/// Limit switch input whose level the test controls.
#[derive(Clone)]
pub struct MockInput(Arc<AtomicBool>);

impl MockInput {
    pub fn new(level: SensorLevel) -> Self {
        Self(Arc::new(AtomicBool::new(level == SensorLevel::Separated)))
    }

    pub fn set(&self, level: SensorLevel) {
        self.0
            .store(level == SensorLevel::Separated, Ordering::SeqCst);
    }
}

impl ErrorType for MockInput {
    type Error = Infallible;
}

impl InputPin for MockInput {
    fn is_high(&mut self) -> core::result::Result<bool, Infallible> {
        Ok(self.0.load(Ordering::SeqCst))
    }

    fn is_low(&mut self) -> core::result::Result<bool, Infallible> {
        Ok(!self.0.load(Ordering::SeqCst))
    }
}

// ── Output pin ────────────────────────────────────────────────

#[derive(Debug)]
pub struct WriteFault;

impl digital::Error for WriteFault {
    fn kind(&self) -> digital::ErrorKind {
        digital::ErrorKind::Other
    }
}

/// Relay output that records writes; fails every write once `fail` is set.
#[derive(Clone)]
pub struct RecordingOutput {
    pin: i32,
    timeline: Timeline,
    pub fail: Arc<AtomicBool>,
}

impl RecordingOutput {
    pub fn new(pin: i32, timeline: &Timeline) -> Self {
        Self {
            pin,
            timeline: timeline.clone(),
            fail: Arc::new(AtomicBool::new(false)),
        }
    }

    fn write(&self, high: bool) -> core::result::Result<(), WriteFault> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(WriteFault);
        }
        self.timeline.push(HwEvent::Write {
            pin: self.pin,
            high,
        });
        Ok(())
    }
}

impl ErrorType for RecordingOutput {
    type Error = WriteFault;
}

impl OutputPin for RecordingOutput {
    fn set_low(&mut self) -> core::result::Result<(), WriteFault> {
        self.write(false)
    }

    fn set_high(&mut self) -> core::result::Result<(), WriteFault> {
        self.write(true)
    }
}

// ── Delay ─────────────────────────────────────────────────────

/// Records the requested hold instead of sleeping.
pub struct FakeDelay(Timeline);

impl DelayNs for FakeDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.0.push(HwEvent::Delay(ns / 1_000_000));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.0.push(HwEvent::Delay(ms));
    }
}

// ── Interrupt controller ──────────────────────────────────────

/// Keeps armed handlers so tests can deliver edges by pin.
pub struct MockInterrupts {
    timeline: Timeline,
    handlers: HashMap<i32, EdgeHandler>,
    /// Pin whose registration is refused.
    pub refuse: Option<i32>,
    /// Level changes applied just before a pin is armed, without an edge.
    pub move_before_arming: Vec<(i32, MockInput, SensorLevel)>,
}

#[allow(dead_code)]
impl MockInterrupts {
    pub fn new(timeline: &Timeline) -> Self {
        Self {
            timeline: timeline.clone(),
            handlers: HashMap::new(),
            refuse: None,
            move_before_arming: Vec::new(),
        }
    }

    /// Deliver one edge to the handler armed on `pin`.
    pub fn fire(&mut self, pin: i32) {
        let handler = self
            .handlers
            .get_mut(&pin)
            .unwrap_or_else(|| panic!("no handler armed on GPIO {pin}"));
        handler();
    }

    /// Deliver one edge if `pin` is armed; reports whether it was.
    pub fn deliver(&mut self, pin: i32) -> bool {
        match self.handlers.get_mut(&pin) {
            Some(handler) => {
                handler();
                true
            }
            None => false,
        }
    }

    pub fn is_armed(&self, pin: i32) -> bool {
        self.handlers.contains_key(&pin)
    }
}

impl EdgeInterrupts for MockInterrupts {
    fn subscribe_any_edge(&mut self, pin: i32, handler: EdgeHandler) -> Result<()> {
        if self.refuse == Some(pin) {
            return Err(Error::Init("ISR handler registration failed"));
        }
        for (p, input, level) in &self.move_before_arming {
            if *p == pin {
                input.set(*level);
            }
        }
        self.timeline.push(HwEvent::Armed(pin));
        self.handlers.insert(pin, handler);
        Ok(())
    }

    fn unsubscribe(&mut self, pin: i32) {
        if self.handlers.remove(&pin).is_some() {
            self.timeline.push(HwEvent::Disarmed(pin));
        }
    }
}

// ── Diagnostics ───────────────────────────────────────────────

#[derive(Default)]
pub struct Lines(pub Vec<String>);

impl DiagnosticsSink for Lines {
    fn status(&mut self, line: &str) {
        self.0.push(line.to_string());
    }
}

// ── Callback counters ─────────────────────────────────────────

#[derive(Default)]
pub struct CallbackCounts {
    pub opening: AtomicUsize,
    pub closing: AtomicUsize,
    pub open: AtomicUsize,
    pub closed: AtomicUsize,
}

impl CallbackCounts {
    /// (opening, closing, open, closed)
    pub fn snapshot(&self) -> (usize, usize, usize, usize) {
        (
            self.opening.load(Ordering::SeqCst),
            self.closing.load(Ordering::SeqCst),
            self.open.load(Ordering::SeqCst),
            self.closed.load(Ordering::SeqCst),
        )
    }

    pub fn callbacks(self: &Arc<Self>) -> TransitionCallbacks {
        let (a, b, c, d) = (self.clone(), self.clone(), self.clone(), self.clone());
        TransitionCallbacks::new()
            .on_opening(move || {
                a.opening.fetch_add(1, Ordering::SeqCst);
            })
            .on_closing(move || {
                b.closing.fetch_add(1, Ordering::SeqCst);
            })
            .on_open(move || {
                c.open.fetch_add(1, Ordering::SeqCst);
            })
            .on_closed(move || {
                d.closed.fetch_add(1, Ordering::SeqCst);
            })
    }
}

// ── Rig ───────────────────────────────────────────────────────

pub const LOWER: i32 = 4;
pub const UPPER: i32 = 5;
pub const PRIMARY: i32 = 7;
pub const BACKUP: i32 = 0;
pub const HOLD_MS: u32 = 1000;

pub type MockSequencer = ActuatorSequencer<RecordingOutput, RecordingOutput, FakeDelay>;

/// Reference wiring with every peripheral mocked.
pub struct Rig {
    pub timeline: Timeline,
    pub lower: MockInput,
    pub upper: MockInput,
    pub primary: RecordingOutput,
    pub backup: RecordingOutput,
    pub irq: MockInterrupts,
}

#[allow(dead_code)]
impl Rig {
    pub fn new(lower: SensorLevel, upper: SensorLevel) -> Self {
        let timeline = Timeline::default();
        Self {
            lower: MockInput::new(lower),
            upper: MockInput::new(upper),
            primary: RecordingOutput::new(PRIMARY, &timeline),
            backup: RecordingOutput::new(BACKUP, &timeline),
            irq: MockInterrupts::new(&timeline),
            timeline,
        }
    }

    pub fn sequencer(&self) -> MockSequencer {
        ActuatorSequencer::new(
            ActuatorChannel::new(PRIMARY, self.primary.clone()),
            ActuatorChannel::new(BACKUP, self.backup.clone()),
            FakeDelay(self.timeline.clone()),
            HOLD_MS,
        )
    }

    /// Move the lower switch and deliver the edge.
    pub fn lower_to(&mut self, level: SensorLevel) {
        self.lower.set(level);
        self.irq.fire(LOWER);
    }

    /// Move the upper switch and deliver the edge.
    pub fn upper_to(&mut self, level: SensorLevel) {
        self.upper.set(level);
        self.irq.fire(UPPER);
    }
}
