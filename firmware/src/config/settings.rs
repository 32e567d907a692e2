use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

/// Default SSID of the network to connect to.
pub const DEFAULT_SSID: &str = "my-wlan-ssid";
/// Default password of the network to connect to.
pub const DEFAULT_PASSWORD: &str = "my-wlan-password";
/// Default mDNS hostname (without `.local`).
pub const DEFAULT_HOSTNAME: &str = "esp32";
/// Default network name when spawning an access point.
pub const DEFAULT_AP_NETWORK: &str = "esp32-net";
/// Default access point address. A well-known address, so clients with a
/// hardcoded DNS fallback still end up at the captive responder.
pub const DEFAULT_AP_IP: Ipv4Addr = Ipv4Addr::new(8, 8, 8, 8);
/// Default gateway address when spawning an access point.
pub const DEFAULT_AP_GATEWAY: Ipv4Addr = Ipv4Addr::new(8, 8, 8, 8);
/// Default netmask when spawning an access point.
pub const DEFAULT_AP_NETMASK: Ipv4Addr = Ipv4Addr::new(255, 255, 255, 0);

/// Network credentials persisted as a JSON document on flash.
///
/// Every field falls back to its built-in default when absent from the
/// stored document, so the struct is never partially initialized at runtime.
/// IP fields are dotted-quad strings on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default = "default_ssid")]
    pub ssid: String,
    #[serde(default = "default_password")]
    pub password: String,
    #[serde(default = "default_hostname")]
    pub hostname: String,
    #[serde(rename = "ap-network", default = "default_ap_network")]
    pub ap_network: String,
    #[serde(rename = "ap-ip", default = "default_ap_ip")]
    pub ap_ip: Ipv4Addr,
    #[serde(rename = "ap-gw", default = "default_ap_gateway")]
    pub ap_gateway: Ipv4Addr,
    #[serde(rename = "ap-netmask", default = "default_ap_netmask")]
    pub ap_netmask: Ipv4Addr,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            ssid: default_ssid(),
            password: default_password(),
            hostname: default_hostname(),
            ap_network: default_ap_network(),
            ap_ip: DEFAULT_AP_IP,
            ap_gateway: DEFAULT_AP_GATEWAY,
            ap_netmask: DEFAULT_AP_NETMASK,
        }
    }
}

impl Credentials {
    /// The canonical mDNS name, e.g. `esp32.local`.
    pub fn mdns_name(&self) -> String {
        format!("{}.local", self.hostname)
    }
}

fn default_ssid() -> String {
    DEFAULT_SSID.to_string()
}

fn default_password() -> String {
    DEFAULT_PASSWORD.to_string()
}

fn default_hostname() -> String {
    DEFAULT_HOSTNAME.to_string()
}

fn default_ap_network() -> String {
    DEFAULT_AP_NETWORK.to_string()
}

fn default_ap_ip() -> Ipv4Addr {
    DEFAULT_AP_IP
}

fn default_ap_gateway() -> Ipv4Addr {
    DEFAULT_AP_GATEWAY
}

fn default_ap_netmask() -> Ipv4Addr {
    DEFAULT_AP_NETMASK
}

/// Convert a dotted-quad netmask into a prefix length.
///
/// Returns `None` for non-contiguous masks, which the IDF subnet
/// configuration cannot express.
pub fn netmask_prefix(mask: Ipv4Addr) -> Option<u8> {
    let bits = u32::from(mask);
    if bits.leading_ones() == bits.count_ones() {
        Some(bits.count_ones() as u8)
    } else {
        None
    }
}
