//! Fuzz target: door engine edge sequences
//!
//! Each input byte is one edge: bit 0 picks the sensor, bit 1 the level.
//! Verifies:
//! - No panics for any edge order
//! - Callback count equals the number of real level changes
//! - An actuated edge always leaves the door at that sensor's limit
//!
//! cargo fuzz run fuzz_edge_sequence

#![no_main]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use garagedoor::door::{DoorState, DoorStateEngine, Sensor, SensorLevel, TransitionCallbacks};
use libfuzzer_sys::fuzz_target;

fn level(bit: u8) -> SensorLevel {
    if bit & 1 == 0 { SensorLevel::Actuated } else { SensorLevel::Separated }
}

fuzz_target!(|data: &[u8]| {
    let Some((&boot, edges)) = data.split_first() else {
        return;
    };

    let fired = Arc::new(AtomicUsize::new(0));
    let counter = || {
        let f = fired.clone();
        move || {
            f.fetch_add(1, Ordering::SeqCst);
        }
    };
    let (mut lower, mut upper) = (level(boot), level(boot >> 1));
    let engine = DoorStateEngine::initialize(
        lower,
        upper,
        TransitionCallbacks::new()
            .on_opening(counter())
            .on_closing(counter())
            .on_open(counter())
            .on_closed(counter()),
    );

    let mut changes = 0;
    for &b in edges {
        let sensor = if b & 1 == 0 { Sensor::Lower } else { Sensor::Upper };
        let new = level(b >> 1);
        let recorded = match sensor {
            Sensor::Lower => &mut lower,
            Sensor::Upper => &mut upper,
        };
        if *recorded != new {
            changes += 1;
        }
        *recorded = new;

        engine.on_sensor_changed(sensor, new);
        if new == SensorLevel::Actuated {
            let limit = match sensor {
                Sensor::Lower => DoorState::Closed,
                Sensor::Upper => DoorState::Open,
            };
            assert_eq!(engine.state(), limit);
        }
    }

    assert_eq!(fired.load(Ordering::SeqCst), changes);
});
