//! Application core: door control logic with no direct I/O.
//!
//! Hardware reaches this layer only through the `embedded-hal` traits and
//! the **port traits** defined in [`ports`], so the whole service is
//! testable with mock adapters.

pub mod commands;
pub mod ports;
pub mod service;
