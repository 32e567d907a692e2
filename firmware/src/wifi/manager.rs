use std::net::Ipv4Addr;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use log::{info, warn};

use super::{Mode, Radio};
use crate::config::{ConfigStore, Credentials};
use crate::discovery::Discovery;

/// Connection poll attempts before giving up on station mode.
pub const RETRY_MAX: u32 = 10;
/// Interval between connection polls.
pub const RETRY_INTERVAL: Duration = Duration::from_secs(1);
/// Delay used by the web routes that schedule a reboot after a config change,
/// long enough for the redirect response to reach the client.
pub const REBOOT_DELAY: Duration = Duration::from_secs(5);

/// Owns the connectivity mode state machine, the credentials and the reboot
/// deadline.
///
/// `start()` runs the bring-up sequence once at boot; afterwards `update()`
/// must be called every main-loop tick to poll the active discovery
/// responder and fire a scheduled restart.
pub struct ZeroConfWifi<R: Radio, D: Discovery> {
    radio: R,
    discovery: D,
    store: ConfigStore,
    credentials: Credentials,
    mode: Mode,
    reboot_at: Option<Instant>,
    max_retries: u32,
    retry_interval: Duration,
}

impl<R: Radio, D: Discovery> ZeroConfWifi<R, D> {
    pub fn new(radio: R, discovery: D, store: ConfigStore) -> Self {
        Self {
            radio,
            discovery,
            store,
            credentials: Credentials::default(),
            mode: Mode::Idle,
            reboot_at: None,
            max_retries: RETRY_MAX,
            retry_interval: RETRY_INTERVAL,
        }
    }

    /// Override the station retry budget. Tests use a zero interval.
    pub fn with_retry_policy(mut self, max_retries: u32, retry_interval: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_interval = retry_interval;
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Station address while connected in station mode.
    pub fn sta_ip(&self) -> Option<Ipv4Addr> {
        match self.mode {
            Mode::Station => self.radio.sta_ip(),
            _ => None,
        }
    }

    /// Full bring-up: load config, try station mode, fall back to access
    /// point, then start the matching discovery responder.
    ///
    /// Without a loadable config there is nothing worth a station attempt,
    /// so the setup access point comes up immediately instead of burning
    /// the retry budget on placeholder credentials. A station timeout is
    /// expected and silently drives the fallback; an access point failure
    /// after that is terminal for this call and leaves the device without
    /// a network path.
    pub fn start(&mut self) -> Result<Mode> {
        match self.store.load(&mut self.credentials) {
            Ok(()) => match self.start_station() {
                Ok(true) => {
                    self.discovery
                        .start_mdns(&self.credentials.hostname)
                        .context("mDNS responder failed to start")?;
                    return Ok(Mode::Station);
                }
                Ok(false) => {
                    info!("Station connect timed out; falling back to access point");
                }
                Err(e) => {
                    warn!("Station bring-up failed ({e:#}); falling back to access point");
                }
            },
            Err(e) => {
                warn!("Could not load wlan config ({e:#}); opening the setup access point");
            }
        }

        self.start_access_point()?;
        self.discovery
            .start_captive_dns(self.credentials.ap_ip)
            .context("captive DNS responder failed to start")?;
        Ok(Mode::AccessPoint)
    }

    /// Request a connection to the configured network and poll once per
    /// retry interval until connected or the retry budget is exhausted.
    ///
    /// `Ok(false)` means the budget ran out — not an error, the caller falls
    /// back. `Err` means the radio could not even start the attempt.
    pub fn start_station(&mut self) -> Result<bool> {
        info!(
            "Starting wifi in station mode, connecting to {:?}...",
            self.credentials.ssid
        );
        self.radio.begin_station(&self.credentials)?;

        let mut retries = self.max_retries;
        while !self.radio.is_connected() && retries > 0 {
            thread::sleep(self.retry_interval);
            retries -= 1;
        }

        if self.radio.is_connected() {
            self.mode = Mode::Station;
            match self.radio.sta_ip() {
                Some(ip) => info!("Station connected, IP: {ip}"),
                None => info!("Station connected"),
            }
            Ok(true)
        } else {
            warn!(
                "No connection after {} attempts, giving up on station mode",
                self.max_retries
            );
            Ok(false)
        }
    }

    /// Configure and start the isolated network.
    pub fn start_access_point(&mut self) -> Result<()> {
        info!(
            "Starting wifi in access point mode: {:?} at {}",
            self.credentials.ap_network, self.credentials.ap_ip
        );
        self.radio
            .begin_access_point(&self.credentials)
            .context("access point bring-up failed")?;
        self.mode = Mode::AccessPoint;
        Ok(())
    }

    /// Arm the reboot deadline at now + `delay`. Last call wins.
    pub fn schedule_reboot(&mut self, delay: Duration) {
        info!("Reboot scheduled in {} ms", delay.as_millis());
        self.reboot_at = Some(Instant::now() + delay);
    }

    /// Per-tick work: poll the active discovery responder and fire the
    /// reboot deadline. On hardware the restart does not return.
    pub fn update(&mut self) {
        if self.mode != Mode::Idle {
            if let Err(e) = self.discovery.poll() {
                warn!("Discovery poll failed: {e:#}");
            }
        }

        if let Some(at) = self.reboot_at {
            if Instant::now() >= at {
                info!("Reboot deadline reached, restarting");
                let _ = self.radio.stop();
                self.radio.restart();
            }
        }
    }

    /// Apply submitted config form values and persist. Fields that were not
    /// submitted keep their current value.
    pub fn save_config(
        &mut self,
        ssid: Option<String>,
        password: Option<String>,
        hostname: Option<String>,
    ) -> Result<()> {
        if let Some(ssid) = ssid {
            self.credentials.ssid = ssid;
        }
        if let Some(password) = password {
            self.credentials.password = password;
        }
        if let Some(hostname) = hostname {
            self.credentials.hostname = hostname;
        }
        self.store.save(&self.credentials)
    }

    /// Restore built-in defaults and delete the persisted record.
    pub fn reset_config(&mut self) -> Result<()> {
        self.store.reset(&mut self.credentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct RadioState {
        polls: u32,
        /// `Some(n)`: report connected from the nth `is_connected` poll on.
        connect_after: Option<u32>,
        station_begun: bool,
        ap_begun: bool,
        fail_station: bool,
        fail_ap: bool,
        stopped: bool,
        restarted: bool,
    }

    #[derive(Clone, Default)]
    struct MockRadio(Rc<RefCell<RadioState>>);

    impl Radio for MockRadio {
        fn begin_station(&mut self, _creds: &Credentials) -> Result<()> {
            let mut s = self.0.borrow_mut();
            if s.fail_station {
                anyhow::bail!("radio refused station mode");
            }
            s.station_begun = true;
            Ok(())
        }

        fn is_connected(&self) -> bool {
            let mut s = self.0.borrow_mut();
            s.polls += 1;
            match s.connect_after {
                Some(n) => s.polls >= n,
                None => false,
            }
        }

        fn begin_access_point(&mut self, _creds: &Credentials) -> Result<()> {
            let mut s = self.0.borrow_mut();
            if s.fail_ap {
                anyhow::bail!("radio refused access point mode");
            }
            s.ap_begun = true;
            Ok(())
        }

        fn sta_ip(&self) -> Option<Ipv4Addr> {
            Some(Ipv4Addr::new(192, 168, 1, 23))
        }

        fn stop(&mut self) -> Result<()> {
            self.0.borrow_mut().stopped = true;
            Ok(())
        }

        fn restart(&mut self) {
            self.0.borrow_mut().restarted = true;
        }
    }

    #[derive(Default)]
    struct DiscoveryState {
        mdns_hostname: Option<String>,
        captive_addr: Option<Ipv4Addr>,
        polls: u32,
    }

    #[derive(Clone, Default)]
    struct MockDiscovery(Rc<RefCell<DiscoveryState>>);

    impl Discovery for MockDiscovery {
        fn start_mdns(&mut self, hostname: &str) -> Result<()> {
            self.0.borrow_mut().mdns_hostname = Some(hostname.to_string());
            Ok(())
        }

        fn start_captive_dns(&mut self, addr: Ipv4Addr) -> Result<()> {
            self.0.borrow_mut().captive_addr = Some(addr);
            Ok(())
        }

        fn poll(&mut self) -> Result<()> {
            self.0.borrow_mut().polls += 1;
            Ok(())
        }
    }

    fn scratch_store(tag: &str) -> ConfigStore {
        static COUNTER: AtomicU32 = AtomicU32::new(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        ConfigStore::new(std::env::temp_dir().join(format!(
            "zeroconf-wifi-mgr-{}-{}-{}.json",
            tag,
            std::process::id(),
            n
        )))
    }

    fn manager(
        tag: &str,
        radio: MockRadio,
        discovery: MockDiscovery,
    ) -> ZeroConfWifi<MockRadio, MockDiscovery> {
        let store = scratch_store(tag);
        // bring-up only attempts station mode with a loadable config
        store.save(&Credentials::default()).unwrap();
        ZeroConfWifi::new(radio, discovery, store).with_retry_policy(RETRY_MAX, Duration::ZERO)
    }

    #[test]
    fn station_success_skips_access_point() {
        let radio = MockRadio::default();
        radio.0.borrow_mut().connect_after = Some(1);
        let discovery = MockDiscovery::default();
        let mut mgr = manager("sta-ok", radio.clone(), discovery.clone());

        assert!(matches!(mgr.start(), Ok(Mode::Station)));
        assert_eq!(mgr.mode(), Mode::Station);
        assert!(!radio.0.borrow().ap_begun);
        assert_eq!(discovery.0.borrow().mdns_hostname.as_deref(), Some("esp32"));
        assert!(discovery.0.borrow().captive_addr.is_none());
        assert_eq!(mgr.sta_ip(), Some(Ipv4Addr::new(192, 168, 1, 23)));
    }

    #[test]
    fn station_success_on_last_attempt_still_counts() {
        let radio = MockRadio::default();
        // connected only on the final post-sleep poll
        radio.0.borrow_mut().connect_after = Some(RETRY_MAX + 1);
        let discovery = MockDiscovery::default();
        let mut mgr = manager("sta-late", radio.clone(), discovery);

        assert!(matches!(mgr.start(), Ok(Mode::Station)));
        assert!(!radio.0.borrow().ap_begun);
    }

    #[test]
    fn station_timeout_falls_back_to_access_point() {
        let radio = MockRadio::default();
        let discovery = MockDiscovery::default();
        let mut mgr = manager("sta-timeout", radio.clone(), discovery.clone());

        assert!(matches!(mgr.start(), Ok(Mode::AccessPoint)));
        assert_eq!(mgr.mode(), Mode::AccessPoint);
        assert_ne!(mgr.mode(), Mode::Idle);
        assert!(radio.0.borrow().station_begun);
        assert!(radio.0.borrow().ap_begun);
        // captive DNS answers with the AP's own address
        assert_eq!(
            discovery.0.borrow().captive_addr,
            Some(Credentials::default().ap_ip)
        );
        assert!(discovery.0.borrow().mdns_hostname.is_none());
        // no station address reported in AP mode
        assert_eq!(mgr.sta_ip(), None);
    }

    #[test]
    fn missing_config_skips_station_and_opens_access_point() {
        let radio = MockRadio::default();
        let discovery = MockDiscovery::default();
        // factory-fresh device: no persisted config at all
        let mut mgr =
            ZeroConfWifi::new(radio.clone(), discovery.clone(), scratch_store("no-config"))
                .with_retry_policy(RETRY_MAX, Duration::ZERO);

        assert!(matches!(mgr.start(), Ok(Mode::AccessPoint)));
        assert!(!radio.0.borrow().station_begun);
        assert_eq!(radio.0.borrow().polls, 0);
        assert!(radio.0.borrow().ap_begun);
        assert_eq!(
            discovery.0.borrow().captive_addr,
            Some(Credentials::default().ap_ip)
        );
    }

    #[test]
    fn corrupt_config_skips_station_and_opens_access_point() {
        let radio = MockRadio::default();
        let store = scratch_store("corrupt-config");
        std::fs::write(store.path(), "{definitely not json").unwrap();
        let path = store.path().to_path_buf();
        let mut mgr = ZeroConfWifi::new(radio.clone(), MockDiscovery::default(), store)
            .with_retry_policy(RETRY_MAX, Duration::ZERO);

        assert!(matches!(mgr.start(), Ok(Mode::AccessPoint)));
        assert!(!radio.0.borrow().station_begun);
        assert!(radio.0.borrow().ap_begun);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn station_radio_error_also_falls_back() {
        let radio = MockRadio::default();
        radio.0.borrow_mut().fail_station = true;
        let discovery = MockDiscovery::default();
        let mut mgr = manager("sta-err", radio.clone(), discovery);

        assert!(matches!(mgr.start(), Ok(Mode::AccessPoint)));
        assert!(radio.0.borrow().ap_begun);
    }

    #[test]
    fn both_modes_failing_is_terminal() {
        let radio = MockRadio::default();
        radio.0.borrow_mut().fail_ap = true;
        let discovery = MockDiscovery::default();
        let mut mgr = manager("both-fail", radio, discovery.clone());

        assert!(mgr.start().is_err());
        assert_eq!(mgr.mode(), Mode::Idle);
        assert!(discovery.0.borrow().captive_addr.is_none());
    }

    #[test]
    fn update_polls_discovery_once_a_mode_is_active() {
        let radio = MockRadio::default();
        let discovery = MockDiscovery::default();
        let mut mgr = manager("poll", radio, discovery.clone());

        // idle: nothing to poll yet
        mgr.update();
        assert_eq!(discovery.0.borrow().polls, 0);

        mgr.start().unwrap();
        mgr.update();
        mgr.update();
        assert_eq!(discovery.0.borrow().polls, 2);
    }

    #[test]
    fn reboot_fires_only_after_deadline() {
        let radio = MockRadio::default();
        radio.0.borrow_mut().connect_after = Some(1);
        let mut mgr = manager("reboot", radio.clone(), MockDiscovery::default());
        mgr.start().unwrap();

        mgr.schedule_reboot(Duration::from_secs(3600));
        mgr.update();
        assert!(!radio.0.borrow().restarted);

        // last call wins: an elapsed deadline replaces the distant one
        mgr.schedule_reboot(Duration::ZERO);
        mgr.update();
        assert!(radio.0.borrow().stopped);
        assert!(radio.0.borrow().restarted);
    }

    #[test]
    fn no_reboot_without_schedule() {
        let radio = MockRadio::default();
        let mut mgr = manager("no-reboot", radio.clone(), MockDiscovery::default());
        mgr.start().unwrap();
        for _ in 0..5 {
            mgr.update();
        }
        assert!(!radio.0.borrow().restarted);
    }

    #[test]
    fn save_config_applies_submitted_values_and_persists() {
        let radio = MockRadio::default();
        let mut mgr = manager("save", radio, MockDiscovery::default());

        mgr.save_config(
            Some("new-net".into()),
            Some("new-pass".into()),
            Some("new-host".into()),
        )
        .unwrap();
        assert_eq!(mgr.credentials().ssid, "new-net");

        // round-trip through the store
        let mut reloaded = Credentials::default();
        ConfigStore::new(mgr.store.path().to_path_buf())
            .load(&mut reloaded)
            .unwrap();
        assert_eq!(reloaded.ssid, "new-net");
        assert_eq!(reloaded.password, "new-pass");
        assert_eq!(reloaded.hostname, "new-host");

        // partial update keeps the rest
        mgr.save_config(None, None, Some("renamed".into())).unwrap();
        assert_eq!(mgr.credentials().ssid, "new-net");
        assert_eq!(mgr.credentials().hostname, "renamed");

        let _ = std::fs::remove_file(mgr.store.path());
    }

    #[test]
    fn reset_config_restores_defaults() {
        let radio = MockRadio::default();
        let mut mgr = manager("reset", radio, MockDiscovery::default());
        mgr.save_config(Some("temp".into()), None, None).unwrap();

        mgr.reset_config().unwrap();
        assert_eq!(*mgr.credentials(), Credentials::default());
    }
}
