use anyhow::Result;
use esp_idf_svc::mdns::EspMdns;
use log::info;

/// Advertise the device on the local network via mDNS.
///
/// After this the device is reachable at `{hostname}.local`. The returned
/// `EspMdns` must be kept alive for the advertisement to persist; the IDF
/// responder answers queries from its own task.
pub fn start_mdns(hostname: &str) -> Result<EspMdns> {
    let mut mdns = EspMdns::take()?;
    mdns.set_hostname(hostname)?;
    mdns.set_instance_name(&format!("Zero-conf wifi ({hostname})"))?;
    mdns.add_service(None, "_http", "_tcp", 80, &[])?;
    info!("mDNS: advertising {}.local:80", hostname);
    Ok(mdns)
}
