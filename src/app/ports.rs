//! Port traits: the hexagonal boundary between door logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ DoorService (domain)
//! ```
//!
//! Driven adapters (interrupt controller, diagnostics output, storage)
//! implement these traits. The [`DoorService`](super::service::DoorService)
//! consumes them via generics, so the domain core never touches hardware
//! directly. Pin-level I/O goes through the `embedded-hal` traits instead.

use crate::config::DoorConfig;

// ───────────────────────────────────────────────────────────────
// Edge interrupt port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Work run on every edge of a subscribed pin, in interrupt context.
pub type EdgeHandler = Box<dyn FnMut() + Send + 'static>;

/// Registers any-edge interrupt handlers on input pins.
pub trait EdgeInterrupts {
    /// Arm `handler` on both edges of `pin`.
    ///
    /// Fails if the pin cannot be armed; the caller treats that as fatal
    /// because the door state would silently stop tracking.
    fn subscribe_any_edge(&mut self, pin: i32, handler: EdgeHandler) -> crate::Result<()>;

    /// Disarm `pin` and drop its handler. No-op if nothing is armed there.
    fn unsubscribe(&mut self, pin: i32);
}

// ───────────────────────────────────────────────────────────────
// Diagnostics port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// Receives one rendered line per sensor edge.
///
/// Only ever called from the main loop, never from an edge handler.
pub trait DiagnosticsSink {
    fn status(&mut self, line: &str);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists the door configuration.
///
/// Implementations MUST call [`DoorConfig::validate`] before persisting.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`DoorConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<DoorConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &DoorConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage.
///
/// Write operations MUST be atomic: no partial writes on power loss.
pub trait StoragePort {
    /// Read a value. Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key. Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Underlying storage is full.
    StorageFull,
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    NotFound,
    Full,
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::StorageFull => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for crate::error::Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::Corrupted => Self::Config("stored config corrupted"),
            ConfigError::ValidationFailed(msg) => Self::Config(msg),
            ConfigError::StorageFull => Self::Config("config storage full"),
            ConfigError::IoError => Self::Config("config storage I/O error"),
        }
    }
}
impl std::error::Error for StorageError {}
