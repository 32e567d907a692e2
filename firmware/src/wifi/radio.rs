use std::net::Ipv4Addr;

use anyhow::Result;

use crate::config::Credentials;

/// Vendor radio driver abstraction.
///
/// The manager only needs to kick off a mode and poll for the link state;
/// everything below (radio stack, DHCP, event loop) is the platform's
/// business. Implemented by [`EspRadio`](super::EspRadio) on hardware and by
/// a mock in the manager tests.
pub trait Radio {
    /// Begin a station-mode association attempt against `creds.ssid`.
    /// Returns once the attempt is underway; it does not wait for the link.
    fn begin_station(&mut self, creds: &Credentials) -> Result<()>;

    /// Whether the station link is up with an address assigned.
    fn is_connected(&self) -> bool;

    /// Configure `ap_ip`/`ap_gateway`/`ap_netmask` and start an isolated
    /// network advertised as `creds.ap_network`.
    fn begin_access_point(&mut self, creds: &Credentials) -> Result<()>;

    /// Station address, once connected.
    fn sta_ip(&self) -> Option<Ipv4Addr>;

    /// Tear down whatever mode is active.
    fn stop(&mut self) -> Result<()>;

    /// Hard device restart. Never returns on hardware; mocks record the
    /// call and return so tests can observe it.
    fn restart(&mut self);
}
