//! HTTP front end: the station-mode index page with LED controls, and the
//! AP-mode config portal with captive redirects.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use esp_idf_svc::http::server::{Configuration as HttpConfig, EspHttpConnection, EspHttpServer, Request};
use esp_idf_svc::http::Method;
use esp_idf_svc::io::{Read, Write};
use log::{info, warn};

use crate::discovery::EspDiscovery;
use crate::leds::{Led, LedState, Leds};
use crate::web::forms;
use crate::web::template::{render, PageContext};
use crate::wifi::{EspRadio, Mode, ZeroConfWifi, REBOOT_DELAY};

/// Manager type as wired on the device.
pub type EspManager = ZeroConfWifi<EspRadio, EspDiscovery>;

/// Config form bodies are tiny; anything larger is not ours.
const MAX_FORM_BODY: usize = 1024;

pub fn start_web_server(
    manager: Arc<Mutex<EspManager>>,
    leds: Arc<Mutex<Leds>>,
    led_state: Arc<LedState>,
    assets_root: PathBuf,
) -> Result<EspHttpServer<'static>> {
    let config = HttpConfig {
        http_port: 80,
        stack_size: 10240,
        max_uri_handlers: 12,
        uri_match_wildcard: true,
        ..Default::default()
    };
    let mut http = EspHttpServer::new(&config)?;

    // Landing page. In AP mode everything funnels into the config portal.
    {
        let manager = manager.clone();
        let led_state = led_state.clone();
        let root = assets_root.clone();
        http.fn_handler::<anyhow::Error, _>("/", Method::Get, move |request| {
            let mgr = manager.lock().unwrap();
            if mgr.mode() == Mode::AccessPoint {
                drop(mgr);
                return redirect(request, "/www-ap/index.html");
            }
            let ctx = page_context(&mgr, &led_state);
            drop(mgr);
            serve_page(request, &root.join("www/index.html"), &ctx)
        })?;
    }

    for (route, led) in [("/toggle-green", Led::Green), ("/toggle-red", Led::Red)] {
        let manager = manager.clone();
        let leds = leds.clone();
        http.fn_handler::<anyhow::Error, _>(route, Method::Post, move |request| {
            if manager.lock().unwrap().mode() != Mode::Station {
                return not_found(request);
            }
            let on = leds.lock().unwrap().toggle(led)?;
            info!("{:?} LED now {}", led, if on { "on" } else { "off" });
            redirect(request, "/")
        })?;
    }

    // Wipe the stored credentials and reboot into the config portal.
    {
        let manager = manager.clone();
        http.fn_handler::<anyhow::Error, _>("/reset-config", Method::Post, move |request| {
            let mut mgr = manager.lock().unwrap();
            if let Err(e) = mgr.reset_config() {
                warn!("Config reset incomplete: {e:#}");
            }
            mgr.schedule_reboot(REBOOT_DELAY);
            drop(mgr);
            redirect(request, "/www-ap/reset.html")
        })?;
    }

    {
        let manager = manager.clone();
        http.fn_handler::<anyhow::Error, _>(
            "/www-ap/save-config",
            Method::Post,
            move |mut request| {
                let body = read_body(&mut request)?;
                let form = forms::parse_config_form(std::str::from_utf8(&body).unwrap_or(""));
                let mut mgr = manager.lock().unwrap();
                match mgr.save_config(form.ssid, form.password, form.hostname) {
                    Ok(()) => {
                        mgr.schedule_reboot(REBOOT_DELAY);
                        drop(mgr);
                        redirect(request, "/www-ap/saved.html")
                    }
                    Err(e) => {
                        drop(mgr);
                        warn!("Saving config failed: {e:#}");
                        redirect(request, "/www-ap/index.html")
                    }
                }
            },
        )?;
    }

    // Portal assets, available in both modes so the station UI can link to
    // the config pages.
    {
        let manager = manager.clone();
        let led_state = led_state.clone();
        let root = assets_root.clone();
        http.fn_handler::<anyhow::Error, _>("/www-ap/*", Method::Get, move |request| {
            let uri = request.uri().to_string();
            let Some(path) = asset_path(&root, &uri) else {
                return not_found(request);
            };
            let mgr = manager.lock().unwrap();
            let ctx = page_context(&mgr, &led_state);
            drop(mgr);
            serve_page(request, &path, &ctx)
        })?;
    }

    // Catch-all, registered last. Captive behavior: in AP mode any stray
    // request is redirected to the canonical hostname so the portal comes up
    // no matter what URL the client tried.
    {
        let manager = manager.clone();
        http.fn_handler::<anyhow::Error, _>("/*", Method::Get, move |request| {
            let mgr = manager.lock().unwrap();
            if mgr.mode() != Mode::AccessPoint {
                drop(mgr);
                return not_found(request);
            }
            let canonical = mgr.credentials().mdns_name();
            drop(mgr);
            let host = request.header("Host").unwrap_or("").to_string();
            let already_canonical = host
                .split(':')
                .next()
                .map(|h| h.eq_ignore_ascii_case(&canonical))
                .unwrap_or(false);
            if already_canonical {
                not_found(request)
            } else {
                redirect(request, &format!("http://{canonical}/"))
            }
        })?;
    }

    info!("Web front end listening on port 80");
    Ok(http)
}

fn page_context(mgr: &EspManager, leds: &LedState) -> PageContext {
    let creds = mgr.credentials();
    PageContext {
        sta_ip: mgr.sta_ip(),
        ap_ip: Some(creds.ap_ip),
        ssid: creds.ssid.clone(),
        password: creds.password.clone(),
        hostname: creds.hostname.clone(),
        green_led: leds.get(Led::Green),
        red_led: leds.get(Led::Red),
    }
}

fn read_body(request: &mut Request<&mut EspHttpConnection>) -> Result<Vec<u8>> {
    let mut buf = [0u8; 256];
    let mut body = Vec::new();
    loop {
        let n = request.read(&mut buf).map_err(|e| anyhow!("{e}"))?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&buf[..n]);
        if body.len() > MAX_FORM_BODY {
            return Err(anyhow!("form body too large"));
        }
    }
    Ok(body)
}

/// Map a request URI onto the assets tree, refusing parent traversal.
fn asset_path(root: &Path, uri: &str) -> Option<PathBuf> {
    let path = uri.split(['?', '#']).next().unwrap_or(uri);
    if path.contains("..") {
        return None;
    }
    Some(root.join(path.trim_start_matches('/')))
}

fn is_templated(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("html" | "htm" | "css" | "js" | "txt" | "svg")
    )
}

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("ico") => "image/x-icon",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Send a file from flash, running text assets through the placeholder
/// renderer on the way out.
fn serve_page(
    request: Request<&mut EspHttpConnection>,
    path: &Path,
    ctx: &PageContext,
) -> Result<()> {
    if is_templated(path) {
        match fs::read_to_string(path) {
            Ok(tpl) => {
                let body = render(&tpl, ctx);
                request
                    .into_response(200, Some("OK"), &[("Content-Type", content_type(path))])?
                    .write_all(body.as_bytes())?;
                Ok(())
            }
            Err(e) => {
                warn!("Asset {} unavailable: {}", path.display(), e);
                not_found(request)
            }
        }
    } else {
        match fs::read(path) {
            Ok(bytes) => {
                request
                    .into_response(200, Some("OK"), &[("Content-Type", content_type(path))])?
                    .write_all(&bytes)?;
                Ok(())
            }
            Err(e) => {
                warn!("Asset {} unavailable: {}", path.display(), e);
                not_found(request)
            }
        }
    }
}

fn not_found(request: Request<&mut EspHttpConnection>) -> Result<()> {
    request
        .into_response(404, Some("Not Found"), &[("Content-Type", "text/plain")])?
        .write_all(b"not found")?;
    Ok(())
}

fn redirect(request: Request<&mut EspHttpConnection>, location: &str) -> Result<()> {
    request.into_response(302, Some("Found"), &[("Location", location)])?;
    Ok(())
}
