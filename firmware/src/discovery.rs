//! Name-resolution responders, one per connectivity mode.
//!
//! Station mode advertises `<hostname>.local` via mDNS; access-point mode
//! runs a catch-all DNS responder so every name leads to the device's own
//! UI. Only one variant is active per boot.

use std::net::Ipv4Addr;

use anyhow::Result;

#[cfg(feature = "esp32")]
use crate::dns::CaptiveDns;

/// Discovery responder abstraction, polled from the main loop.
pub trait Discovery {
    /// Advertise `<hostname>.local` with an HTTP service record on port 80.
    fn start_mdns(&mut self, hostname: &str) -> Result<()>;

    /// Answer every DNS query with `addr` on the standard DNS port.
    fn start_captive_dns(&mut self, addr: Ipv4Addr) -> Result<()>;

    /// Per-tick service work for whichever responder is active.
    fn poll(&mut self) -> Result<()>;
}

/// On-device discovery: IDF mDNS responder or the captive DNS socket.
#[cfg(feature = "esp32")]
#[derive(Default)]
pub struct EspDiscovery {
    mdns: Option<esp_idf_svc::mdns::EspMdns>,
    dns: Option<CaptiveDns>,
}

#[cfg(feature = "esp32")]
impl EspDiscovery {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(feature = "esp32")]
impl Discovery for EspDiscovery {
    fn start_mdns(&mut self, hostname: &str) -> Result<()> {
        self.mdns = Some(crate::mdns::start_mdns(hostname)?);
        Ok(())
    }

    fn start_captive_dns(&mut self, addr: Ipv4Addr) -> Result<()> {
        self.dns = Some(CaptiveDns::bind(addr)?);
        Ok(())
    }

    fn poll(&mut self) -> Result<()> {
        // The IDF mDNS responder answers queries from its own task; only the
        // captive DNS socket needs draining here.
        if let Some(dns) = &mut self.dns {
            dns.poll()?;
        }
        Ok(())
    }
}
