//! Human-readable status reports produced on every sensor edge.
//!
//! Edge handlers run in interrupt context, where formatting and logging are
//! off limits. They push a small `Copy` record into a lock-free MPMC queue
//! instead; the main loop drains it at its diagnostics cadence and renders
//! each record into one line for the [`DiagnosticsSink`].
//!
//! The text is for humans only. Nothing in the firmware parses it back.

use core::fmt::{self, Write};
use core::sync::atomic::{AtomicU32, Ordering};

use heapless::mpmc::Q16;

use super::{DoorState, Sensor, SensorLevel};
use crate::app::ports::DiagnosticsSink;

/// Longest rendered status line.
pub const STATUS_LINE_CAP: usize = 96;

/// One sensor edge as seen by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusReport {
    pub sensor: Sensor,
    pub level: SensorLevel,
    /// Door state after the edge was applied.
    pub state: DoorState,
    /// False when the edge repeated the previously recorded level.
    pub level_changed: bool,
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} SENSOR fired and is {} ({}), the door is {}",
            self.sensor, self.level as u8, self.level, self.state
        )?;
        if !self.level_changed {
            f.write_str(" (no change)")?;
        }
        Ok(())
    }
}

/// Bounded queue of pending reports, safe to push from both sensor ISRs.
pub struct StatusQueue {
    queue: Q16<StatusReport>,
    dropped: AtomicU32,
}

impl StatusQueue {
    pub const fn new() -> Self {
        Self {
            queue: Q16::new(),
            dropped: AtomicU32::new(0),
        }
    }

    /// Enqueue without blocking. A full queue drops the report and counts it.
    pub fn push(&self, report: StatusReport) {
        if self.queue.enqueue(report).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn pop(&self) -> Option<StatusReport> {
        self.queue.dequeue()
    }

    /// Reports lost to a full queue since boot.
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Render every pending report into `sink`. Returns how many were sent.
    pub fn drain_into(&self, sink: &mut impl DiagnosticsSink) -> usize {
        let mut sent = 0;
        let mut line: heapless::String<STATUS_LINE_CAP> = heapless::String::new();
        while let Some(report) = self.pop() {
            line.clear();
            // Overflow only truncates the human-readable text.
            let _ = write!(line, "{report}");
            sink.status(&line);
            sent += 1;
        }
        sent
    }
}

impl Default for StatusQueue {
    fn default() -> Self {
        Self::new()
    }
}
