use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use esp_idf_svc::http::server::EspHttpServer;
use esp_idf_svc::http::Method;
use esp_idf_svc::io::{Read, Write};
use esp_idf_svc::ota::EspOta;
use log::info;

use crate::web::server::EspManager;

const OTA_CHUNK: usize = 4096;

/// Register `POST /ota`: stream a firmware image into the inactive slot and
/// schedule a restart into it.
///
/// ```text
/// curl -X POST --data-binary @firmware.bin http://esp32.local/ota
/// ```
pub fn register_ota_route(
    http: &mut EspHttpServer<'static>,
    manager: Arc<Mutex<EspManager>>,
) -> Result<()> {
    http.fn_handler::<anyhow::Error, _>("/ota", Method::Post, move |mut request| {
        info!("OTA upload started");
        let mut ota = EspOta::new()?;
        let mut update = ota.initiate_update()?;
        let mut buf = [0u8; OTA_CHUNK];
        let mut total = 0usize;
        loop {
            let n = request.read(&mut buf).map_err(|e| anyhow!("{e}"))?;
            if n == 0 {
                break;
            }
            update.write_all(&buf[..n])?;
            total += n;
        }
        update.complete()?;
        info!("OTA image accepted ({total} bytes), restarting into new firmware");
        manager.lock().unwrap().schedule_reboot(Duration::from_secs(2));
        request
            .into_response(200, Some("OK"), &[("Content-Type", "text/plain")])?
            .write_all(b"update accepted, rebooting\n")?;
        Ok(())
    })?;
    Ok(())
}
