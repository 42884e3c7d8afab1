//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`ConfigPort`]: the whole [`SystemConfig`] is one `postcard`
//! blob under namespace `doorwatch`, key `syscfg`.
//!
//! - Validation runs before every write and after every read; an invalid
//!   config is never persisted and never handed to the application.
//! - ESP-IDF NVS commits are atomic per `nvs_commit()`, which
//!   `EspNvs::set_raw` performs.
//! - The simulation backend keeps blobs in memory.

use log::info;
#[cfg(target_os = "espidf")]
use log::warn;

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::SystemConfig;

#[cfg(target_os = "espidf")]
use esp_idf_svc::nvs::{EspDefaultNvsPartition, EspNvs, NvsDefault};

#[cfg(not(target_os = "espidf"))]
use std::cell::RefCell;

#[cfg(target_os = "espidf")]
const CONFIG_NAMESPACE: &str = "doorwatch";
#[cfg(target_os = "espidf")]
const CONFIG_KEY: &str = "syscfg";

/// Upper bound for the stored blob; the encoded config is well below this.
const MAX_BLOB_SIZE: usize = 1024;

pub struct NvsAdapter {
    #[cfg(target_os = "espidf")]
    partition: EspDefaultNvsPartition,
    #[cfg(not(target_os = "espidf"))]
    blob: RefCell<Option<Vec<u8>>>,
}

impl NvsAdapter {
    /// Wrap the default NVS partition (shared with the WiFi driver).
    #[cfg(target_os = "espidf")]
    pub fn new(partition: EspDefaultNvsPartition) -> Self {
        info!("NvsAdapter: ESP-IDF NVS namespace '{}'", CONFIG_NAMESPACE);
        Self { partition }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        info!("NvsAdapter: simulation backend");
        Self {
            blob: RefCell::new(None),
        }
    }

    /// Overwrite the stored blob with arbitrary bytes (simulation only).
    #[cfg(not(target_os = "espidf"))]
    pub fn write_raw(&self, bytes: &[u8]) {
        *self.blob.borrow_mut() = Some(bytes.to_vec());
    }

    #[cfg(target_os = "espidf")]
    fn open(&self) -> Result<EspNvs<NvsDefault>, ConfigError> {
        EspNvs::new(self.partition.clone(), CONFIG_NAMESPACE, true).map_err(|e| {
            warn!("NvsAdapter: open '{}' failed: {}", CONFIG_NAMESPACE, e);
            ConfigError::IoError
        })
    }

    #[cfg(target_os = "espidf")]
    fn read_blob(&self, buf: &mut [u8]) -> Result<Option<usize>, ConfigError> {
        let nvs = self.open()?;
        match nvs.get_raw(CONFIG_KEY, buf) {
            Ok(Some(bytes)) => Ok(Some(bytes.len())),
            Ok(None) => Ok(None),
            Err(e) => {
                warn!("NvsAdapter: read error {}", e);
                Err(ConfigError::IoError)
            }
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_blob(&self, buf: &mut [u8]) -> Result<Option<usize>, ConfigError> {
        match self.blob.borrow().as_deref() {
            Some(bytes) if bytes.len() > buf.len() => Err(ConfigError::Corrupted),
            Some(bytes) => {
                buf[..bytes.len()].copy_from_slice(bytes);
                Ok(Some(bytes.len()))
            }
            None => Ok(None),
        }
    }

    #[cfg(target_os = "espidf")]
    fn write_blob(&self, bytes: &[u8]) -> Result<(), ConfigError> {
        let mut nvs = self.open()?;
        nvs.set_raw(CONFIG_KEY, bytes).map(|_| ()).map_err(|e| {
            warn!("NvsAdapter: write error {}", e);
            if e.code() == esp_idf_svc::sys::ESP_ERR_NVS_NOT_ENOUGH_SPACE as i32 {
                ConfigError::StorageFull
            } else {
                ConfigError::IoError
            }
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn write_blob(&self, bytes: &[u8]) -> Result<(), ConfigError> {
        *self.blob.borrow_mut() = Some(bytes.to_vec());
        Ok(())
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for NvsAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        let mut buf = [0u8; MAX_BLOB_SIZE];
        let Some(len) = self.read_blob(&mut buf)? else {
            info!("NvsAdapter: no stored config");
            return Err(ConfigError::NotFound);
        };

        let cfg: SystemConfig =
            postcard::from_bytes(&buf[..len]).map_err(|_| ConfigError::Corrupted)?;
        cfg.validate()?;
        info!("NvsAdapter: loaded config ({} bytes)", len);
        Ok(cfg)
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
        if bytes.len() > MAX_BLOB_SIZE {
            return Err(ConfigError::StorageFull);
        }
        self.write_blob(&bytes)?;
        info!("NvsAdapter: config saved ({} bytes)", bytes.len());
        Ok(())
    }
}
