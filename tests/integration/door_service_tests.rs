//! DoorService integration tests with mocked switches, relays and IRQs.

use std::sync::Arc;

use garagedoor::app::commands::DoorCommand;
use garagedoor::app::service::DoorService;
use garagedoor::config::DoorConfig;
use garagedoor::door::{DoorState, SensorLevel::{Actuated, Separated}, TransitionCallbacks};
use garagedoor::drivers::worker::CommandQueue;
use garagedoor::error::{ActuatorError, Error};
use garagedoor::sensors::LimitSwitch;

use crate::mock_hw::*;

fn config() -> DoorConfig {
    DoorConfig {
        lower_sensor_gpio: LOWER,
        upper_sensor_gpio: UPPER,
        primary_actuator_gpio: PRIMARY,
        backup_actuator_gpio: BACKUP,
        pulse_hold_ms: HOLD_MS,
        ..DoorConfig::default()
    }
}

fn start(
    rig: &mut Rig,
    callbacks: TransitionCallbacks,
) -> (garagedoor::Result<DoorService>, MockSequencer, Arc<CommandQueue>) {
    let mut seq = rig.sequencer();
    let queue = Arc::new(CommandQueue::new());
    let service = DoorService::start(
        &config(),
        &mut seq,
        LimitSwitch::new(LOWER, rig.lower.clone()),
        LimitSwitch::new(UPPER, rig.upper.clone()),
        &mut rig.irq,
        callbacks,
        queue.clone(),
    );
    (service, seq, queue)
}

// ── End-to-end ────────────────────────────────────────────────

#[test]
fn closed_door_opens_and_ignores_bounce() {
    let mut rig = Rig::new(Actuated, Separated);
    let counts = Arc::new(CallbackCounts::default());
    let (service, _seq, _q) = start(&mut rig, counts.callbacks());
    let mut service = service.unwrap();

    assert_eq!(service.state(), DoorState::Closed);
    assert_eq!(counts.snapshot(), (0, 0, 0, 0));

    rig.lower_to(Separated);
    assert_eq!(service.state(), DoorState::Opening);
    assert_eq!(counts.snapshot(), (1, 0, 0, 0));

    rig.upper_to(Actuated);
    assert_eq!(service.state(), DoorState::Open);
    assert_eq!(counts.snapshot(), (1, 0, 1, 0));

    // Spurious repeat of the upper edge.
    rig.irq.fire(UPPER);
    assert_eq!(service.state(), DoorState::Open);
    assert_eq!(counts.snapshot(), (1, 0, 1, 0));

    let mut lines = Lines::default();
    assert_eq!(service.flush_diagnostics(&mut lines), 3);
    assert!(lines.0[0].starts_with("LOWER SENSOR fired and is 1"));
    assert!(lines.0[1].contains("the door is OPEN"));
    assert!(lines.0[2].ends_with("(no change)"));
}

#[test]
fn open_door_closes() {
    let mut rig = Rig::new(Separated, Actuated);
    let counts = Arc::new(CallbackCounts::default());
    let (service, _seq, _q) = start(&mut rig, counts.callbacks());
    let service = service.unwrap();
    assert_eq!(service.state(), DoorState::Open);
    assert_eq!(service.open_level(), 100);

    rig.upper_to(Separated);
    assert_eq!(service.state(), DoorState::Closing);
    assert_eq!(service.open_level(), 98);

    rig.lower_to(Actuated);
    assert_eq!(service.state(), DoorState::Closed);
    assert_eq!(service.open_level(), 0);
    assert_eq!(counts.snapshot(), (0, 1, 0, 1));
}

#[test]
fn door_stopped_mid_travel_boots_closed() {
    let mut rig = Rig::new(Separated, Separated);
    let (service, _seq, _q) = start(&mut rig, TransitionCallbacks::new());
    assert_eq!(service.unwrap().state(), DoorState::Closed);
}

// ── Bring-up ordering ─────────────────────────────────────────

#[test]
fn flash_completes_before_any_edge_is_armed() {
    let mut rig = Rig::new(Actuated, Separated);
    let (service, _seq, _q) = start(&mut rig, TransitionCallbacks::new());
    service.unwrap();

    let events = rig.timeline.events();
    let first_arm = events
        .iter()
        .position(|e| matches!(e, HwEvent::Armed(_)))
        .unwrap();
    assert!(events[..first_arm]
        .iter()
        .all(|e| !matches!(e, HwEvent::Armed(_))));
    assert!(events[first_arm..]
        .iter()
        .all(|e| matches!(e, HwEvent::Armed(_))));

    // Three cycles, both relays each time, all released at the end.
    let lows = rig.timeline.writes().iter().filter(|(_, high)| !high).count();
    assert_eq!(lows, 6);
    assert_eq!(
        &events[first_arm..],
        &[HwEvent::Armed(LOWER), HwEvent::Armed(UPPER)]
    );
}

#[test]
fn edge_lost_during_bring_up_is_recovered() {
    let mut rig = Rig::new(Actuated, Separated);
    // The door starts moving after the boot read but before arming.
    rig.irq
        .move_before_arming
        .push((LOWER, rig.lower.clone(), Separated));
    let counts = Arc::new(CallbackCounts::default());

    let (service, _seq, _q) = start(&mut rig, counts.callbacks());
    let service = service.unwrap();

    assert_eq!(service.state(), DoorState::Opening);
    assert_eq!(counts.snapshot(), (1, 0, 0, 0));
}

#[test]
fn refused_registration_aborts_start() {
    let mut rig = Rig::new(Actuated, Separated);
    rig.irq.refuse = Some(UPPER);
    let counts = Arc::new(CallbackCounts::default());
    let (service, _seq, queue) = start(&mut rig, counts.callbacks());

    assert_eq!(
        service.err(),
        Some(Error::Init("ISR handler registration failed"))
    );
    assert_eq!(queue.pending(), 0);

    // The lower switch was armed first; it must not outlive the failure.
    assert!(!rig.irq.is_armed(LOWER));
    assert!(rig.timeline.events().contains(&HwEvent::Disarmed(LOWER)));
    rig.lower.set(Separated);
    assert!(!rig.irq.deliver(LOWER));
    assert_eq!(counts.snapshot(), (0, 0, 0, 0));
}

#[test]
fn invalid_config_aborts_before_any_hardware() {
    let mut rig = Rig::new(Actuated, Separated);
    let bad = DoorConfig {
        backup_actuator_gpio: PRIMARY,
        ..config()
    };
    let mut seq = rig.sequencer();
    let service = DoorService::start(
        &bad,
        &mut seq,
        LimitSwitch::new(LOWER, rig.lower.clone()),
        LimitSwitch::new(UPPER, rig.upper.clone()),
        &mut rig.irq,
        TransitionCallbacks::new(),
        Arc::new(CommandQueue::new()),
    );

    assert_eq!(service.err(), Some(Error::Config("GPIO assigned twice")));
    assert!(rig.timeline.events().is_empty());
}

#[test]
fn relay_failure_during_flash_aborts_start() {
    let mut rig = Rig::new(Actuated, Separated);
    rig.backup
        .fail
        .store(true, std::sync::atomic::Ordering::SeqCst);
    let (service, _seq, _q) = start(&mut rig, TransitionCallbacks::new());

    assert_eq!(
        service.err(),
        Some(ActuatorError::GpioWriteFailed(BACKUP).into())
    );
    assert!(!rig.irq.is_armed(LOWER));
    assert!(!rig.irq.is_armed(UPPER));
}

// ── Requests ──────────────────────────────────────────────────

#[test]
fn open_level_request_queues_matching_command() {
    let mut rig = Rig::new(Actuated, Separated);
    let (service, mut seq, queue) = start(&mut rig, TransitionCallbacks::new());
    let service = service.unwrap();
    rig.timeline.clear();

    assert_eq!(service.set_open_level(100).unwrap(), DoorCommand::Open);
    assert_eq!(service.set_open_level(10).unwrap(), DoorCommand::Close);
    assert_eq!(queue.process_pending(&mut seq).unwrap(), 2);

    assert_eq!(
        rig.timeline.events(),
        vec![
            HwEvent::Write { pin: PRIMARY, high: false },
            HwEvent::Delay(HOLD_MS),
            HwEvent::Write { pin: PRIMARY, high: true },
            HwEvent::Write { pin: PRIMARY, high: false },
            HwEvent::Write { pin: BACKUP, high: false },
            HwEvent::Delay(HOLD_MS),
            HwEvent::Write { pin: PRIMARY, high: true },
            HwEvent::Write { pin: BACKUP, high: true },
        ]
    );
}

#[test]
fn requests_are_refused_after_relay_fault() {
    let mut rig = Rig::new(Actuated, Separated);
    let (service, mut seq, queue) = start(&mut rig, TransitionCallbacks::new());
    let service = service.unwrap();

    rig.primary
        .fail
        .store(true, std::sync::atomic::Ordering::SeqCst);
    service.request(DoorCommand::Open).unwrap();
    assert!(queue.process_pending(&mut seq).is_err());

    assert_eq!(
        service.request(DoorCommand::Close),
        Err(ActuatorError::Faulted.into())
    );
    // Sensor tracking is unaffected by the actuator fault.
    rig.lower_to(Separated);
    assert_eq!(service.state(), DoorState::Opening);
}

#[test]
fn request_burst_reports_busy() {
    let mut rig = Rig::new(Actuated, Separated);
    let (service, _seq, _q) = start(&mut rig, TransitionCallbacks::new());
    let service = service.unwrap();

    for _ in 0..garagedoor::drivers::worker::QUEUE_DEPTH {
        service.request(DoorCommand::Open).unwrap();
    }
    assert_eq!(
        service.request(DoorCommand::Open),
        Err(Error::Actuator(ActuatorError::Busy))
    );
}
