//! Fuzz target: stored configuration blob
//!
//! Writes arbitrary bytes where the config blob lives and loads it back,
//! verifying:
//! - No panics under arbitrary byte inputs
//! - A blob either loads as a config that passes validation or is
//!   reported as `Corrupted` / `ValidationFailed`
//!
//! cargo fuzz run fuzz_config_blob

#![no_main]

use garagedoor::adapters::nvs::NvsAdapter;
use garagedoor::app::ports::{ConfigError, ConfigPort, StoragePort};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(mut nvs) = NvsAdapter::new() else {
        return;
    };
    if nvs.write("garagedoor", "doorcfg", data).is_err() {
        return;
    }

    match nvs.load() {
        Ok(cfg) => {
            assert!(cfg.validate().is_ok(), "loaded config failed validation");
            // Anything that loads must also save.
            nvs.save(&cfg).expect("valid config must persist");
        }
        Err(ConfigError::Corrupted | ConfigError::ValidationFailed(_)) => {}
        Err(e) => panic!("unexpected load error: {e}"),
    }
});
