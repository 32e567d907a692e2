use std::net::Ipv4Addr;

use anyhow::{anyhow, ensure, Context, Result};
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::modem::Modem;
use esp_idf_svc::ipv4;
use esp_idf_svc::netif::{EspNetif, NetifConfiguration};
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{AccessPointConfiguration, ClientConfiguration, Configuration, EspWifi};
use log::info;

use super::Radio;
use crate::config::{netmask_prefix, Credentials};

/// AP channel; fixed, clients scan anyway.
const AP_CHANNEL: u8 = 6;
const AP_MAX_CONNECTIONS: u16 = 4;

/// ESP-IDF WiFi driver behind the [`Radio`] trait.
///
/// Uses the non-blocking `EspWifi` so the manager's retry loop does the
/// connection polling, mirroring the bounded bring-up policy instead of the
/// driver's own wait primitives.
pub struct EspRadio {
    wifi: EspWifi<'static>,
}

impl EspRadio {
    pub fn new(
        modem: Modem,
        sys_loop: EspSystemEventLoop,
        nvs: EspDefaultNvsPartition,
    ) -> Result<Self> {
        let wifi = EspWifi::new(modem, sys_loop, Some(nvs)).context("failed to create EspWifi")?;
        Ok(Self { wifi })
    }
}

impl Radio for EspRadio {
    fn begin_station(&mut self, creds: &Credentials) -> Result<()> {
        ensure!(creds.ssid.len() <= 32, "SSID too long (max 32 bytes)");
        ensure!(
            creds.password.len() <= 64,
            "password too long (max 64 bytes)"
        );

        let config = Configuration::Client(ClientConfiguration {
            ssid: creds
                .ssid
                .as_str()
                .try_into()
                .map_err(|_| anyhow!("invalid SSID"))?,
            password: creds
                .password
                .as_str()
                .try_into()
                .map_err(|_| anyhow!("invalid password"))?,
            ..Default::default()
        });
        self.wifi.set_configuration(&config)?;
        self.wifi.start().context("WiFi start failed")?;
        self.wifi.connect().context("WiFi connect failed")?;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        if !self.wifi.is_connected().unwrap_or(false) {
            return false;
        }
        // the link counts once DHCP handed out an address
        self.wifi
            .sta_netif()
            .get_ip_info()
            .map(|info| !info.ip.is_unspecified())
            .unwrap_or(false)
    }

    fn begin_access_point(&mut self, creds: &Credentials) -> Result<()> {
        let prefix = netmask_prefix(creds.ap_netmask)
            .ok_or_else(|| anyhow!("non-contiguous AP netmask {}", creds.ap_netmask))?;

        // Replace the default AP netif with one carrying the configured
        // addressing; DHCP hands out the device itself as DNS server so the
        // captive responder sees every lookup.
        let mut netif_conf = NetifConfiguration::wifi_default_router();
        netif_conf.ip_configuration = Some(ipv4::Configuration::Router(
            ipv4::RouterConfiguration {
                subnet: ipv4::Subnet {
                    gateway: creds.ap_ip,
                    mask: ipv4::Mask(prefix),
                },
                dhcp_enabled: true,
                dns: Some(creds.ap_ip),
                secondary_dns: None,
            },
        ));
        let netif =
            EspNetif::new_with_conf(&netif_conf).context("AP address configuration failed")?;
        self.wifi
            .swap_netif_ap(netif)
            .context("AP netif swap failed")?;

        let config = Configuration::AccessPoint(AccessPointConfiguration {
            ssid: creds
                .ap_network
                .as_str()
                .try_into()
                .map_err(|_| anyhow!("invalid AP network name"))?,
            password: "".try_into().unwrap_or_default(), // open network
            channel: AP_CHANNEL,
            max_connections: AP_MAX_CONNECTIONS,
            ..Default::default()
        });
        self.wifi.set_configuration(&config)?;
        self.wifi.start().context("AP start failed")?;

        info!(
            "Access point '{}' up at {}",
            creds.ap_network, creds.ap_ip
        );
        Ok(())
    }

    fn sta_ip(&self) -> Option<Ipv4Addr> {
        self.wifi
            .sta_netif()
            .get_ip_info()
            .ok()
            .map(|info| info.ip)
            .filter(|ip| !ip.is_unspecified())
    }

    fn stop(&mut self) -> Result<()> {
        let _ = self.wifi.disconnect();
        self.wifi.stop().context("WiFi stop failed")?;
        Ok(())
    }

    fn restart(&mut self) {
        unsafe { esp_idf_svc::sys::esp_restart() };
    }
}
