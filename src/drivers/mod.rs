//! Relay drivers, pulse sequencing, hardware initialisation, and the
//! actuator worker.

pub mod hw_init;
pub mod relay;
pub mod sequencer;
pub mod task_pin;
pub mod worker;
