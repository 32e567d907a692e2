use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;

use super::Credentials;

/// Persists [`Credentials`] as a JSON document on the flash filesystem.
///
/// Load failures (missing file, structural parse errors) leave the caller's
/// in-memory credentials untouched, so built-in defaults survive a corrupt
/// or absent config file.
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted document into `creds`.
    ///
    /// Individual missing fields fall back to their defaults; a document
    /// that fails to parse structurally is an error and `creds` is left
    /// unchanged.
    pub fn load(&self, creds: &mut Credentials) -> Result<()> {
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("could not open {} for reading", self.path.display()))?;
        let loaded: Credentials = serde_json::from_str(&text)
            .with_context(|| format!("could not parse {}", self.path.display()))?;
        *creds = loaded;
        info!("Loaded wlan config from {}", self.path.display());
        Ok(())
    }

    /// Serialize `creds` and overwrite any prior record.
    pub fn save(&self, creds: &Credentials) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("could not create {}", dir.display()))?;
        }
        let text = serde_json::to_string(creds).context("could not serialize wlan config")?;
        fs::write(&self.path, &text)
            .with_context(|| format!("could not open {} for writing", self.path.display()))?;
        info!(
            "Saved wlan config to {} ({} bytes)",
            self.path.display(),
            text.len()
        );
        Ok(())
    }

    /// Restore `creds` to the built-in defaults and delete the persisted
    /// record. The in-memory reset happens even when the deletion fails.
    pub fn reset(&self, creds: &mut Credentials) -> Result<()> {
        *creds = Credentials::default();
        fs::remove_file(&self.path)
            .with_context(|| format!("could not remove {}", self.path.display()))?;
        info!("Removed wlan config {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn temp_store(tag: &str) -> ConfigStore {
        static COUNTER: AtomicU32 = AtomicU32::new(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        let path = std::env::temp_dir().join(format!(
            "zeroconf-wifi-test-{}-{}-{}.json",
            tag,
            std::process::id(),
            n
        ));
        let _ = fs::remove_file(&path);
        ConfigStore::new(path)
    }

    fn sample() -> Credentials {
        Credentials {
            ssid: "attic-net".into(),
            password: "hunter22".into(),
            hostname: "attic".into(),
            ap_network: "attic-setup".into(),
            ap_ip: Ipv4Addr::new(192, 168, 4, 1),
            ap_gateway: Ipv4Addr::new(192, 168, 4, 1),
            ap_netmask: Ipv4Addr::new(255, 255, 255, 0),
        }
    }

    #[test]
    fn load_missing_file_fails_and_keeps_defaults() {
        let store = temp_store("missing");
        let mut creds = Credentials::default();
        assert!(store.load(&mut creds).is_err());
        assert_eq!(creds, Credentials::default());
    }

    #[test]
    fn load_malformed_json_fails_and_keeps_credentials() {
        let store = temp_store("malformed");
        fs::write(store.path(), "{not json at all").unwrap();
        let mut creds = sample();
        assert!(store.load(&mut creds).is_err());
        assert_eq!(creds, sample());
        let _ = fs::remove_file(store.path());
    }

    #[test]
    fn save_then_load_round_trips_all_fields() {
        let store = temp_store("roundtrip");
        let saved = sample();
        store.save(&saved).unwrap();

        let mut loaded = Credentials::default();
        store.load(&mut loaded).unwrap();
        assert_eq!(loaded, saved);
        let _ = fs::remove_file(store.path());
    }

    #[test]
    fn load_with_partial_document_falls_back_per_field() {
        let store = temp_store("partial");
        fs::write(store.path(), r#"{"ssid":"only-ssid","ap-ip":"10.0.0.1"}"#).unwrap();
        let mut creds = Credentials::default();
        store.load(&mut creds).unwrap();
        assert_eq!(creds.ssid, "only-ssid");
        assert_eq!(creds.ap_ip, Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(creds.password, Credentials::default().password);
        assert_eq!(creds.hostname, Credentials::default().hostname);
        let _ = fs::remove_file(store.path());
    }

    #[test]
    fn reset_restores_defaults_and_deletes_record() {
        let store = temp_store("reset");
        store.save(&sample()).unwrap();

        let mut creds = sample();
        store.reset(&mut creds).unwrap();
        assert_eq!(creds, Credentials::default());

        // a subsequent load must fail: nothing persisted anymore
        let mut reloaded = Credentials::default();
        assert!(store.load(&mut reloaded).is_err());
    }

    #[test]
    fn reset_without_record_fails_but_resets_memory() {
        let store = temp_store("reset-absent");
        let mut creds = sample();
        assert!(store.reset(&mut creds).is_err());
        assert_eq!(creds, Credentials::default());
    }
}
