//! Log-based diagnostics sink.
//!
//! Implements [`DiagnosticsSink`] by writing each status line to the
//! ESP-IDF logger (UART / USB-CDC in production).

use log::info;

use crate::app::ports::DiagnosticsSink;

/// Adapter that logs every status line to the serial console.
#[derive(Debug, Default)]
pub struct LogDiagnosticsSink {
    lines: u32,
}

impl LogDiagnosticsSink {
    pub fn new() -> Self {
        Self { lines: 0 }
    }

    /// Lines written since boot.
    pub fn lines(&self) -> u32 {
        self.lines
    }
}

impl DiagnosticsSink for LogDiagnosticsSink {
    fn status(&mut self, line: &str) {
        self.lines = self.lines.wrapping_add(1);
        info!("DOOR | {}", line);
    }
}
