//! Garage door controller firmware: main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  GpioPin · ThreadDelay    EspEdgeInterrupts    NvsAdapter    │
//! │  (embedded-hal)           (EdgeInterrupts)     (ConfigPort)  │
//! │  LogDiagnosticsSink (DiagnosticsSink)                        │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ─────────────────      │
//! │                                                              │
//! │  ┌──────────────────────────────────────────────────────┐    │
//! │  │          DoorService (engine · command queue)        │    │
//! │  └──────────────────────────────────────────────────────┘    │
//! │                                                              │
//! │  Actuator worker thread (sequencer · relays)                 │
//! └──────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::Result;
use log::{error, info, warn};

use garagedoor::adapters::hardware::{EspEdgeInterrupts, GpioPin, ThreadDelay, init_door_pins};
use garagedoor::adapters::log_sink::LogDiagnosticsSink;
use garagedoor::adapters::nvs::NvsAdapter;
use garagedoor::app::ports::ConfigPort;
use garagedoor::app::service::DoorService;
use garagedoor::config::DoorConfig;
use garagedoor::door::TransitionCallbacks;
use garagedoor::drivers::relay::ActuatorChannel;
use garagedoor::drivers::sequencer::ActuatorSequencer;
use garagedoor::drivers::task_pin::{Core, spawn_on_core};
use garagedoor::drivers::worker::{CommandQueue, run_worker};
use garagedoor::sensors::LimitSwitch;

const WORKER_PRIORITY: u8 = 5;
const WORKER_STACK_KB: usize = 4;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  garagedoor v{}                   ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let config = match NvsAdapter::new().and_then(|nvs| nvs.load()) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("NVS config load failed ({}), using defaults", e);
            DoorConfig::default()
        }
    };
    info!(
        "Pins: lower={} upper={} primary={} backup={}",
        config.lower_sensor_gpio,
        config.upper_sensor_gpio,
        config.primary_actuator_gpio,
        config.backup_actuator_gpio
    );

    // ── 3. GPIO + relays ──────────────────────────────────────
    init_door_pins(&config)?;
    let mut sequencer = ActuatorSequencer::new(
        ActuatorChannel::new(config.primary_actuator_gpio, GpioPin::new(config.primary_actuator_gpio)),
        ActuatorChannel::new(config.backup_actuator_gpio, GpioPin::new(config.backup_actuator_gpio)),
        ThreadDelay,
        config.pulse_hold_ms,
    );
    let mut irq = EspEdgeInterrupts::new()?;

    // ── 4. Door service ───────────────────────────────────────
    // Callbacks run in interrupt context: they only raise a flag for the
    // main loop, which publishes the new state.
    let changed = Arc::new(AtomicBool::new(true));
    let flag = |f: &Arc<AtomicBool>| {
        let f = f.clone();
        move || f.store(true, Ordering::Release)
    };
    let callbacks = TransitionCallbacks::new()
        .on_opening(flag(&changed))
        .on_closing(flag(&changed))
        .on_open(flag(&changed))
        .on_closed(flag(&changed));

    let commands = Arc::new(CommandQueue::new());
    let mut service = DoorService::start(
        &config,
        &mut sequencer,
        LimitSwitch::new(config.lower_sensor_gpio, GpioPin::new(config.lower_sensor_gpio)),
        LimitSwitch::new(config.upper_sensor_gpio, GpioPin::new(config.upper_sensor_gpio)),
        &mut irq,
        callbacks,
        commands.clone(),
    )?;

    // ── 5. Actuator worker ────────────────────────────────────
    let worker = spawn_on_core(
        Core::App,
        WORKER_PRIORITY,
        WORKER_STACK_KB,
        "door-act\0",
        move || {
            let e = run_worker(&commands, &mut sequencer);
            error!("Actuator worker stopped: {}", e);
        },
    )?;

    info!("System ready. Entering main loop.");

    // ── 6. Main loop ──────────────────────────────────────────
    let mut sink = LogDiagnosticsSink::new();
    let mut worker_reported = false;
    let tick = Duration::from_millis(u64::from(config.diagnostics_flush_ms));

    loop {
        service.flush_diagnostics(&mut sink);

        if changed.swap(false, Ordering::AcqRel) {
            info!(
                "Door is {} (open level {})",
                service.state(),
                service.open_level()
            );
        }

        if !worker_reported && worker.is_finished() {
            error!("Actuator path faulted; open/close requests are refused until reboot");
            worker_reported = true;
        }

        std::thread::sleep(tick);
    }
}
