//! Garage door controller firmware library.
//!
//! Exposes the door logic for integration testing on the host. All
//! ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module and simulated otherwise.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod door;
pub mod drivers;
pub mod error;
pub mod pins;
pub mod sensors;

pub use error::{Error, Result};
