//! One-shot GPIO bring-up and raw pin access.
//!
//! Configures the limit-switch inputs and relay outputs, installs the GPIO
//! ISR service and registers per-pin edge handlers, all through raw
//! ESP-IDF sys calls. Called from `main()` before the door service starts.
//!
//! On the host, pins are simulated: levels live in a static bitmask and
//! edge handlers are kept in a table that [`sim_drive_input`] fires.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use log::info;
#[cfg(target_os = "espidf")]
use log::warn;

use crate::app::ports::EdgeHandler;

// ── Error types ───────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed { pin: i32, rc: i32 },
    IsrInstallFailed(i32),
    IsrHandlerAddFailed { pin: i32, rc: i32 },
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed { pin, rc } => write!(f, "GPIO {} config failed (rc={})", pin, rc),
            Self::IsrInstallFailed(rc)         => write!(f, "GPIO ISR service install failed (rc={})", rc),
            Self::IsrHandlerAddFailed { pin, rc } => write!(f, "GPIO {} ISR handler add failed (rc={})", pin, rc),
        }
    }
}

impl std::error::Error for HwInitError {}

impl From<HwInitError> for crate::error::Error {
    fn from(e: HwInitError) -> Self {
        match e {
            HwInitError::GpioConfigFailed { .. } => Self::Init("GPIO config failed"),
            HwInitError::IsrInstallFailed(_) => Self::Init("ISR service install failed"),
            HwInitError::IsrHandlerAddFailed { .. } => Self::Init("ISR handler registration failed"),
        }
    }
}

/// A single GPIO write failure, carrying the ESP-IDF return code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpioError {
    pub pin: i32,
    pub rc: i32,
}

impl core::fmt::Display for GpioError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "GPIO {} write failed (rc={})", self.pin, self.rc)
    }
}

// ── GPIO Inputs ───────────────────────────────────────────────

/// Configure limit-switch pins as inputs with internal pull-up and
/// any-edge interrupts (not yet enabled until a handler is added).
#[cfg(target_os = "espidf")]
pub fn init_inputs(input_pins: &[i32]) -> Result<(), HwInitError> {
    for &pin in input_pins {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_INPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_ANYEDGE,
            ..Default::default()
        };
        // SAFETY: Called once from main() before any ISR is registered.
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::GpioConfigFailed { pin, rc: ret });
        }
    }
    info!("hw_init: inputs {:?} configured (pull-up, any edge)", input_pins);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_inputs(input_pins: &[i32]) -> Result<(), HwInitError> {
    for &pin in input_pins {
        sim::set_level(pin, true);
    }
    info!("hw_init(sim): inputs {:?} pulled up", input_pins);
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: i32) -> bool {
    // SAFETY: gpio_get_level is a read-only register access on an
    // already-configured input pin; safe from ISR and task context.
    (unsafe { gpio_get_level(pin) }) != 0
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(pin: i32) -> bool {
    sim::level(pin)
}

// ── GPIO Outputs ──────────────────────────────────────────────

/// Configure relay pins as outputs, idling HIGH (relay released).
#[cfg(target_os = "espidf")]
pub fn init_outputs(output_pins: &[i32]) -> Result<(), HwInitError> {
    for &pin in output_pins {
        // Latch HIGH before switching to output so the relay never blips.
        // SAFETY: single-threaded init path; pin not yet shared.
        let ret = unsafe { gpio_set_level(pin, 1) };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::GpioConfigFailed { pin, rc: ret });
        }
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_OUTPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
            ..Default::default()
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::GpioConfigFailed { pin, rc: ret });
        }
        let ret = unsafe { gpio_set_level(pin, 1) };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::GpioConfigFailed { pin, rc: ret });
        }
    }
    info!("hw_init: outputs {:?} configured (idle high)", output_pins);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_outputs(output_pins: &[i32]) -> Result<(), HwInitError> {
    for &pin in output_pins {
        sim::set_level(pin, true);
    }
    info!("hw_init(sim): outputs {:?} idle high", output_pins);
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) -> Result<(), GpioError> {
    // SAFETY: gpio_set_level writes to an already-configured output pin.
    // Each relay pin is owned by exactly one ActuatorChannel.
    let ret = unsafe { gpio_set_level(pin, u32::from(high)) };
    if ret != ESP_OK as i32 {
        return Err(GpioError { pin, rc: ret });
    }
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(pin: i32, high: bool) -> Result<(), GpioError> {
    sim::set_level(pin, high);
    Ok(())
}

// ── GPIO ISR Service ──────────────────────────────────────────

/// Shared trampoline for every edge handler. `arg` is the leaked
/// `Box<EdgeHandler>` registered in [`subscribe_any_edge`].
#[cfg(target_os = "espidf")]
unsafe extern "C" fn edge_isr(arg: *mut core::ffi::c_void) {
    // SAFETY: arg was produced by Box::into_raw in subscribe_any_edge and is
    // only freed after the handler is removed. The platform serialises
    // handler calls for one pin.
    let handler = unsafe { &mut *arg.cast::<EdgeHandler>() };
    handler();
}

/// Install the per-pin GPIO ISR service.
#[cfg(target_os = "espidf")]
pub fn init_isr_service() -> Result<(), HwInitError> {
    // SAFETY: gpio_install_isr_service is idempotent; ESP_ERR_INVALID_STATE
    // means it was already installed (acceptable).
    let ret = unsafe { gpio_install_isr_service(0) };
    if ret != ESP_OK as i32 && ret != ESP_ERR_INVALID_STATE as i32 {
        return Err(HwInitError::IsrInstallFailed(ret));
    }
    info!("hw_init: GPIO ISR service installed");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_isr_service() -> Result<(), HwInitError> {
    info!("hw_init(sim): ISR service skipped");
    Ok(())
}

/// Handlers currently armed, as `(pin, leaked Box<EdgeHandler>)`.
#[cfg(target_os = "espidf")]
static ARMED: std::sync::Mutex<Vec<(i32, usize)>> = std::sync::Mutex::new(Vec::new());

/// Register `handler` for both edges of `pin` and enable the interrupt.
///
/// The handler lives until [`unsubscribe_edge`] removes it. Every step is
/// checked; on failure nothing stays registered for `pin`.
#[cfg(target_os = "espidf")]
pub fn subscribe_any_edge(pin: i32, handler: EdgeHandler) -> Result<(), HwInitError> {
    // SAFETY: the pin is configured as an input by init_inputs.
    let ret = unsafe { gpio_set_intr_type(pin, gpio_int_type_t_GPIO_INTR_ANYEDGE) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::IsrHandlerAddFailed { pin, rc: ret });
    }

    let arg = Box::into_raw(Box::new(handler));
    // SAFETY: the ISR service is installed. On failure the handler is
    // removed first, so nothing holds `arg` when it is reclaimed.
    unsafe {
        let ret = gpio_isr_handler_add(pin, Some(edge_isr), arg.cast());
        if ret != ESP_OK as i32 {
            drop(Box::from_raw(arg));
            return Err(HwInitError::IsrHandlerAddFailed { pin, rc: ret });
        }
        let ret = gpio_intr_enable(pin);
        if ret != ESP_OK as i32 {
            gpio_isr_handler_remove(pin);
            drop(Box::from_raw(arg));
            return Err(HwInitError::IsrHandlerAddFailed { pin, rc: ret });
        }
    }
    ARMED
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .push((pin, arg as usize));
    info!("hw_init: any-edge handler armed on GPIO {}", pin);
    Ok(())
}

/// Disable the interrupt on `pin` and free its handler. No-op if nothing
/// is armed there.
#[cfg(target_os = "espidf")]
pub fn unsubscribe_edge(pin: i32) {
    let mut armed = ARMED.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    let Some(idx) = armed.iter().position(|&(p, _)| p == pin) else {
        return;
    };
    // SAFETY: the pin has a registered handler. Called from the task that
    // installed the ISR service, so no handler call is in flight on this
    // core once removal returns.
    let ret = unsafe {
        gpio_intr_disable(pin);
        gpio_isr_handler_remove(pin)
    };
    if ret != ESP_OK as i32 {
        // Still registered: leaking the handler is the only safe option.
        warn!("hw_init: GPIO {} handler remove failed (rc={})", pin, ret);
        return;
    }
    let (_, arg) = armed.swap_remove(idx);
    // SAFETY: produced by Box::into_raw in subscribe_any_edge and no longer
    // reachable from the ISR service.
    drop(unsafe { Box::from_raw(arg as *mut EdgeHandler) });
    info!("hw_init: any-edge handler removed from GPIO {}", pin);
}

#[cfg(not(target_os = "espidf"))]
pub fn subscribe_any_edge(pin: i32, handler: EdgeHandler) -> Result<(), HwInitError> {
    if sim::is_refused(pin) {
        return Err(HwInitError::IsrHandlerAddFailed { pin, rc: -1 });
    }
    sim::add_handler(pin, handler);
    info!("hw_init(sim): any-edge handler armed on GPIO {}", pin);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn unsubscribe_edge(pin: i32) {
    if sim::remove_handler(pin) {
        info!("hw_init(sim): any-edge handler removed from GPIO {}", pin);
    }
}

/// Make every later [`subscribe_any_edge`] on `pin` fail, as a pin whose
/// interrupt cannot be enabled does on hardware.
#[cfg(not(target_os = "espidf"))]
pub fn sim_refuse_edge(pin: i32) {
    sim::refuse(pin);
}

/// Set a simulated input level and deliver one edge to its handler, if
/// any. Repeating the current level still delivers an edge, like contact
/// bounce does on real hardware.
#[cfg(not(target_os = "espidf"))]
pub fn sim_drive_input(pin: i32, high: bool) {
    sim::set_level(pin, high);
    sim::fire(pin);
}

#[cfg(not(target_os = "espidf"))]
mod sim {
    use core::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    use crate::app::ports::EdgeHandler;

    /// One bit per GPIO; pulled-up pins read HIGH until driven.
    static LEVELS: AtomicU64 = AtomicU64::new(u64::MAX);

    static HANDLERS: Mutex<Vec<(i32, EdgeHandler)>> = Mutex::new(Vec::new());

    /// One bit per GPIO whose interrupt registration fails.
    static REFUSED: AtomicU64 = AtomicU64::new(0);

    fn bit(pin: i32) -> u64 {
        1u64 << (pin as u32 % 64)
    }

    pub(super) fn level(pin: i32) -> bool {
        LEVELS.load(Ordering::Acquire) & bit(pin) != 0
    }

    pub(super) fn set_level(pin: i32, high: bool) {
        if high {
            LEVELS.fetch_or(bit(pin), Ordering::AcqRel);
        } else {
            LEVELS.fetch_and(!bit(pin), Ordering::AcqRel);
        }
    }

    pub(super) fn refuse(pin: i32) {
        REFUSED.fetch_or(bit(pin), Ordering::AcqRel);
    }

    pub(super) fn is_refused(pin: i32) -> bool {
        REFUSED.load(Ordering::Acquire) & bit(pin) != 0
    }

    pub(super) fn add_handler(pin: i32, handler: EdgeHandler) {
        let mut table = HANDLERS.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        table.retain(|(p, _)| *p != pin);
        table.push((pin, handler));
    }

    pub(super) fn remove_handler(pin: i32) -> bool {
        let mut table = HANDLERS.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let before = table.len();
        table.retain(|(p, _)| *p != pin);
        table.len() != before
    }

    pub(super) fn fire(pin: i32) {
        let mut table = HANDLERS.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        for (p, handler) in table.iter_mut() {
            if *p == pin {
                handler();
            }
        }
    }
}
