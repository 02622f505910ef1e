//! Full-stack tests over the simulated GPIO backend: real adapters, real
//! worker thread, no mocks.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use garagedoor::adapters::hardware::{EspEdgeInterrupts, GpioPin, ThreadDelay, init_door_pins};
use garagedoor::adapters::log_sink::LogDiagnosticsSink;
use garagedoor::app::commands::DoorCommand;
use garagedoor::app::service::DoorService;
use garagedoor::config::DoorConfig;
use garagedoor::door::{DoorState, TransitionCallbacks};
use garagedoor::Error;
use garagedoor::drivers::hw_init::{gpio_read, sim_drive_input, sim_refuse_edge};
use garagedoor::drivers::relay::ActuatorChannel;
use garagedoor::drivers::sequencer::ActuatorSequencer;
use garagedoor::drivers::task_pin::{Core, spawn_on_core};
use garagedoor::drivers::worker::{CommandQueue, run_worker};
use garagedoor::sensors::LimitSwitch;

fn wait_for(what: &str, mut cond: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !cond() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        std::thread::sleep(Duration::from_millis(2));
    }
}

#[test]
fn simulated_board_tracks_door_and_pulses_relay() {
    // Pins unique to this test binary's simulation.
    let config = DoorConfig {
        lower_sensor_gpio: 20,
        upper_sensor_gpio: 21,
        primary_actuator_gpio: 22,
        backup_actuator_gpio: 23,
        pulse_hold_ms: 100,
        flash_cycles: 0,
        ..DoorConfig::default()
    };
    init_door_pins(&config).unwrap();
    // Door closed: lower magnet present.
    sim_drive_input(config.lower_sensor_gpio, false);

    let mut seq = ActuatorSequencer::new(
        ActuatorChannel::new(22, GpioPin::new(22)),
        ActuatorChannel::new(23, GpioPin::new(23)),
        ThreadDelay,
        config.pulse_hold_ms,
    );
    let mut irq = EspEdgeInterrupts::new().unwrap();
    let queue = Arc::new(CommandQueue::new());
    let mut service = DoorService::start(
        &config,
        &mut seq,
        LimitSwitch::new(20, GpioPin::new(20)),
        LimitSwitch::new(21, GpioPin::new(21)),
        &mut irq,
        TransitionCallbacks::new(),
        queue.clone(),
    )
    .unwrap();
    assert_eq!(service.state(), DoorState::Closed);

    let worker = {
        let queue = queue.clone();
        spawn_on_core(Core::App, 5, 64, "door-act\0", move || run_worker(&queue, &mut seq))
            .unwrap()
    };

    service.request(DoorCommand::Open).unwrap();
    wait_for("primary relay engaged", || !gpio_read(22));
    assert!(gpio_read(23), "open must not touch the backup relay");
    wait_for("primary relay released", || gpio_read(22));

    sim_drive_input(20, true);
    assert_eq!(service.state(), DoorState::Opening);
    sim_drive_input(21, false);
    assert_eq!(service.state(), DoorState::Open);

    let mut sink = LogDiagnosticsSink::new();
    assert_eq!(service.flush_diagnostics(&mut sink), 2);
    assert_eq!(sink.lines(), 2);

    assert!(!worker.is_finished());
    assert!(!queue.is_faulted());
}

#[test]
fn refused_upper_interrupt_leaves_lower_switch_silent() {
    let config = DoorConfig {
        lower_sensor_gpio: 24,
        upper_sensor_gpio: 25,
        primary_actuator_gpio: 26,
        backup_actuator_gpio: 27,
        pulse_hold_ms: 100,
        flash_cycles: 0,
        ..DoorConfig::default()
    };
    init_door_pins(&config).unwrap();
    sim_drive_input(24, false);
    sim_refuse_edge(25);

    let transitions = Arc::new(AtomicUsize::new(0));
    let t = transitions.clone();
    let mut seq = ActuatorSequencer::new(
        ActuatorChannel::new(26, GpioPin::new(26)),
        ActuatorChannel::new(27, GpioPin::new(27)),
        ThreadDelay,
        config.pulse_hold_ms,
    );
    let mut irq = EspEdgeInterrupts::new().unwrap();
    let result = DoorService::start(
        &config,
        &mut seq,
        LimitSwitch::new(24, GpioPin::new(24)),
        LimitSwitch::new(25, GpioPin::new(25)),
        &mut irq,
        TransitionCallbacks::new().on_opening(move || {
            t.fetch_add(1, Ordering::SeqCst);
        }),
        Arc::new(CommandQueue::new()),
    );
    assert_eq!(
        result.err(),
        Some(Error::Init("ISR handler registration failed"))
    );

    sim_drive_input(24, true);
    assert_eq!(transitions.load(Ordering::SeqCst), 0);
}
