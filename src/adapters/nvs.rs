//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`ConfigPort`] for the SoftLatch controller.  The config
//! blob is postcard-encoded under a single key; manufacturing writes the
//! tuned thresholds once, and every boot loads them back.
//!
//! - Config validation: all fields are range-checked before persistence
//!   **and** after load, so a bad blob can never invert the thresholds.
//! - Atomic writes: ESP-IDF NVS commits are atomic per nvs_commit(); the
//!   in-memory simulation achieves this trivially.

use log::info;
#[cfg(target_os = "espidf")]
use log::warn;

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::SystemConfig;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
const CONFIG_KEY: &core::ffi::CStr = c"syscfg";
#[cfg(target_os = "espidf")]
const CONFIG_NAMESPACE: &core::ffi::CStr = c"softlatch";

/// Largest accepted config blob.  The encoded struct is a few dozen
/// bytes; anything bigger is garbage.
const MAX_BLOB_SIZE: usize = 256;

pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    store: std::cell::RefCell<Option<Vec<u8>>>,
}

impl Default for NvsAdapter {
    fn default() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            store: std::cell::RefCell::new(None),
        }
    }
}

impl NvsAdapter {
    /// Create a new NvsAdapter and initialise NVS flash.
    ///
    /// On first boot or after a partition-layout change the NVS partition
    /// is erased and re-initialised automatically.
    #[cfg(target_os = "espidf")]
    pub fn new() -> Result<Self, ConfigError> {
        // SAFETY: nvs_flash_init / nvs_flash_erase are called from the
        // single main-task context before any concurrent NVS access.
        let ret = unsafe { nvs_flash_init() };
        if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
            warn!("NVS: erasing and re-initialising flash partition");
            if unsafe { nvs_flash_erase() } != ESP_OK {
                return Err(ConfigError::IoError);
            }
            if unsafe { nvs_flash_init() } != ESP_OK {
                return Err(ConfigError::IoError);
            }
        } else if ret != ESP_OK {
            return Err(ConfigError::IoError);
        }
        info!("NVS: flash initialised");
        Ok(Self {})
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Result<Self, ConfigError> {
        info!("NVS(sim): in-memory store");
        Ok(Self::default())
    }

    #[cfg(target_os = "espidf")]
    fn with_handle<T>(
        &self,
        write: bool,
        f: impl FnOnce(nvs_handle_t) -> Result<T, ConfigError>,
    ) -> Result<T, ConfigError> {
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };
        let mut handle: nvs_handle_t = 0;
        // SAFETY: namespace is a valid C string; handle is closed below.
        let ret = unsafe { nvs_open(CONFIG_NAMESPACE.as_ptr(), mode, &mut handle) };
        if ret == ESP_ERR_NVS_NOT_FOUND {
            return Err(ConfigError::NotFound);
        }
        if ret != ESP_OK {
            return Err(ConfigError::IoError);
        }
        let result = f(handle);
        unsafe { nvs_close(handle) };
        result
    }
}

impl ConfigPort for NvsAdapter {
    #[cfg(target_os = "espidf")]
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        self.with_handle(false, |handle| {
            let mut buf = [0u8; MAX_BLOB_SIZE];
            let mut len = buf.len();
            // SAFETY: buf outlives the call; len is in/out.
            let ret = unsafe {
                nvs_get_blob(
                    handle,
                    CONFIG_KEY.as_ptr(),
                    buf.as_mut_ptr().cast(),
                    &mut len,
                )
            };
            if ret == ESP_ERR_NVS_NOT_FOUND {
                return Err(ConfigError::NotFound);
            }
            if ret != ESP_OK {
                return Err(ConfigError::IoError);
            }
            decode_and_validate(&buf[..len])
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        match self.store.borrow().as_deref() {
            Some(blob) => decode_and_validate(blob),
            None => Err(ConfigError::NotFound),
        }
    }

    #[cfg(target_os = "espidf")]
    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        config
            .validate()
            .map_err(ConfigError::ValidationFailed)?;
        let blob = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;

        self.with_handle(true, |handle| {
            // SAFETY: blob outlives both calls.
            let ret = unsafe {
                nvs_set_blob(
                    handle,
                    CONFIG_KEY.as_ptr(),
                    blob.as_ptr().cast(),
                    blob.len(),
                )
            };
            if ret == ESP_ERR_NVS_NOT_ENOUGH_SPACE {
                return Err(ConfigError::StorageFull);
            }
            if ret != ESP_OK {
                return Err(ConfigError::IoError);
            }
            if unsafe { nvs_commit(handle) } != ESP_OK {
                return Err(ConfigError::IoError);
            }
            info!("NVS: config saved ({} bytes)", blob.len());
            Ok(())
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        config
            .validate()
            .map_err(ConfigError::ValidationFailed)?;
        let blob = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
        if blob.len() > MAX_BLOB_SIZE {
            return Err(ConfigError::StorageFull);
        }
        *self.store.borrow_mut() = Some(blob);
        info!("NVS(sim): config saved");
        Ok(())
    }
}

/// Shared decode path: postcard, then range validation.
fn decode_and_validate(blob: &[u8]) -> Result<SystemConfig, ConfigError> {
    let config: SystemConfig =
        postcard::from_bytes(blob).map_err(|_| ConfigError::Corrupted)?;
    config
        .validate()
        .map_err(ConfigError::ValidationFailed)?;
    Ok(config)
}

#[cfg(all(test, not(target_os = "espidf")))]
mod tests {
    use super::*;

    #[test]
    fn load_before_save_is_not_found() {
        let nvs = NvsAdapter::new().unwrap();
        assert!(matches!(nvs.load(), Err(ConfigError::NotFound)));
    }

    #[test]
    fn save_then_load_roundtrips() {
        let nvs = NvsAdapter::new().unwrap();
        let config = SystemConfig {
            power_down_hold_ms: 3000,
            ..Default::default()
        };
        nvs.save(&config).unwrap();
        let loaded = nvs.load().unwrap();
        assert_eq!(loaded.power_down_hold_ms, 3000);
    }

    #[test]
    fn invalid_config_is_rejected_before_persisting() {
        let nvs = NvsAdapter::new().unwrap();
        let bad = SystemConfig {
            power_on_confirm_ms: 5000, // above the hold threshold
            ..Default::default()
        };
        assert!(matches!(
            nvs.save(&bad),
            Err(ConfigError::ValidationFailed(_))
        ));
        assert!(matches!(nvs.load(), Err(ConfigError::NotFound)));
    }

    #[test]
    fn corrupted_blob_is_rejected_on_load() {
        let nvs = NvsAdapter::new().unwrap();
        *nvs.store.borrow_mut() = Some(vec![0xFF; 40]);
        assert!(matches!(nvs.load(), Err(ConfigError::Corrupted)));
    }
}
