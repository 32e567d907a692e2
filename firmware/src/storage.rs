use std::ffi::CString;
use std::path::PathBuf;

use anyhow::{Context, Result};
use esp_idf_svc::sys;
use log::info;

/// Where the SPIFFS data partition lands in the VFS. Everything below is
/// reachable through plain `std::fs`.
pub const MOUNT_POINT: &str = "/spiffs";

/// Persisted wlan config file.
pub fn config_path() -> PathBuf {
    PathBuf::from(MOUNT_POINT).join("wlan.json")
}

/// Mount the SPIFFS data partition (config file + static web assets).
pub fn mount_spiffs() -> Result<()> {
    let base_path = CString::new(MOUNT_POINT)?;
    let conf = sys::esp_vfs_spiffs_conf_t {
        base_path: base_path.as_ptr(),
        partition_label: std::ptr::null(),
        max_files: 8,
        format_if_mount_failed: true,
    };
    sys::esp!(unsafe { sys::esp_vfs_spiffs_register(&conf) })
        .context("SPIFFS mount failed")?;
    info!("SPIFFS mounted at {}", MOUNT_POINT);
    Ok(())
}
