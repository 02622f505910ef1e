//! Sensor subsystem.
//!
//! The door carries two reed limit switches, one at each end of travel.
//! Each is a [`LimitSwitch`] over an `embedded-hal` input pin.

pub mod limit_switch;

pub use limit_switch::LimitSwitch;
