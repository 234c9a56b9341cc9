//! Configuration file store.
//!
//! Implements [`ConfigStore`] for the persisted `KEY=VALUE` document.
//!
//! - [`FileConfigStore`] reads and writes a file through `std::fs`.  On
//!   the device the file lives on the SPIFFS partition mounted by
//!   [`mount_flash_fs`]; backups are sibling files named
//!   `<name><suffix>`.
//! - [`MemoryConfigStore`] keeps the document and its backups in memory
//!   for host tests.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::app::ports::ConfigStore;
use crate::error::StorageError;

/// Mount point of the flash filesystem on the device.
pub const FLASH_ROOT: &str = "/spiffs";

/// Mount the SPIFFS data partition at [`FLASH_ROOT`].
#[cfg(target_os = "espidf")]
pub fn mount_flash_fs() -> Result<(), crate::error::Error> {
    use esp_idf_svc::sys::{ESP_OK, esp_vfs_spiffs_conf_t, esp_vfs_spiffs_register};

    let conf = esp_vfs_spiffs_conf_t {
        base_path: c"/spiffs".as_ptr(),
        partition_label: core::ptr::null(),
        max_files: 4,
        format_if_mount_failed: false,
    };
    // SAFETY: called once from the main task before any file access; the
    // configuration only borrows static strings.
    let ret = unsafe { esp_vfs_spiffs_register(&conf) };
    if ret != ESP_OK {
        return Err(crate::error::Error::Init("flash filesystem"));
    }
    info!("store: flash filesystem mounted at {}", FLASH_ROOT);
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// File-backed store
// ───────────────────────────────────────────────────────────────

pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `<path><suffix>`
    pub fn backup_path(&self, suffix: &str) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(suffix);
        PathBuf::from(name)
    }
}

impl ConfigStore for FileConfigStore {
    fn read_lines(&self) -> Result<Vec<String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(text.lines().map(str::to_string).collect()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound),
            Err(e) => {
                debug!("store: read {:?} failed: {}", self.path, e);
                Err(StorageError::ReadFailed)
            }
        }
    }

    fn backup(&mut self, suffix: &str) -> Result<(), StorageError> {
        let target = self.backup_path(suffix);
        fs::copy(&self.path, &target).map_err(|e| {
            debug!("store: backup to {:?} failed: {}", target, e);
            StorageError::BackupFailed
        })?;
        info!("store: backed up to {:?}", target);
        Ok(())
    }

    fn write_lines(&mut self, lines: &[String]) -> Result<(), StorageError> {
        let mut text = lines.join("\n");
        text.push('\n');
        fs::write(&self.path, text).map_err(|e| {
            debug!("store: write {:?} failed: {}", self.path, e);
            StorageError::WriteFailed
        })
    }
}

// ───────────────────────────────────────────────────────────────
// In-memory store
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct MemoryConfigStore {
    current: Option<Vec<String>>,
    backups: BTreeMap<String, Vec<String>>,
    writes: u32,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lines<S: AsRef<str>>(lines: &[S]) -> Self {
        Self {
            current: Some(lines.iter().map(|l| l.as_ref().to_string()).collect()),
            ..Self::default()
        }
    }

    /// Backups keyed by suffix.
    pub fn backups(&self) -> &BTreeMap<String, Vec<String>> {
        &self.backups
    }

    pub fn writes(&self) -> u32 {
        self.writes
    }
}

impl ConfigStore for MemoryConfigStore {
    fn read_lines(&self) -> Result<Vec<String>, StorageError> {
        self.current.clone().ok_or(StorageError::NotFound)
    }

    fn backup(&mut self, suffix: &str) -> Result<(), StorageError> {
        let lines = self.current.clone().ok_or(StorageError::BackupFailed)?;
        self.backups.insert(suffix.to_string(), lines);
        Ok(())
    }

    fn write_lines(&mut self, lines: &[String]) -> Result<(), StorageError> {
        self.current = Some(lines.to_vec());
        self.writes += 1;
        Ok(())
    }
}
