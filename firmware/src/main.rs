#[cfg(feature = "esp32")]
fn main() -> anyhow::Result<()> {
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::Duration;

    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::hal::gpio::OutputPin;
    use esp_idf_svc::hal::peripherals::Peripherals;
    use esp_idf_svc::log::EspLogger;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use log::{error, info};

    use zeroconf_wifi::config::ConfigStore;
    use zeroconf_wifi::discovery::EspDiscovery;
    use zeroconf_wifi::leds::{Led, LedState, Leds};
    use zeroconf_wifi::wifi::{EspRadio, ZeroConfWifi};
    use zeroconf_wifi::{ota, storage, web};

    // Step 1: ESP-IDF patches and logging
    esp_idf_svc::sys::link_patches();
    EspLogger::initialize_default();

    info!("=== Zero-Conf WiFi Firmware v{} ===", env!("CARGO_PKG_VERSION"));

    // Step 2: Take hardware peripherals and system services
    let peripherals = Peripherals::take()?;
    let sys_loop = EspSystemEventLoop::take()?;
    let nvs_partition = EspDefaultNvsPartition::take()?;

    // Step 3: Mount the flash filesystem (persisted config + web assets)
    storage::mount_spiffs()?;

    // Step 4: Indicator LEDs — red stays on while bring-up is in progress
    let led_state = Arc::new(LedState::new());
    let mut leds = Leds::new(
        peripherals.pins.gpio4.downgrade_output(),
        peripherals.pins.gpio5.downgrade_output(),
        led_state.clone(),
    )?;
    leds.set(Led::Red, true)?;

    // Step 5: Connectivity — station mode with AP fallback
    let store = ConfigStore::new(storage::config_path());
    let radio = EspRadio::new(peripherals.modem, sys_loop, nvs_partition)?;
    let mut manager = ZeroConfWifi::new(radio, EspDiscovery::new(), store);
    match manager.start() {
        Ok(mode) => info!("Connectivity up in {mode:?} mode"),
        Err(e) => error!("No network path available: {e:#}"),
    }

    let manager = Arc::new(Mutex::new(manager));
    let leds = Arc::new(Mutex::new(leds));

    // Step 6: Web front end and OTA endpoint
    let mut http = web::start_web_server(
        manager.clone(),
        leds.clone(),
        led_state,
        PathBuf::from(storage::MOUNT_POINT),
    )?;
    ota::register_ota_route(&mut http, manager.clone())?;

    // Step 7: Green on, red off — boot complete
    {
        let mut leds = leds.lock().unwrap();
        leds.set(Led::Red, false)?;
        leds.set(Led::Green, true)?;
    }

    // Step 8: Main loop — discovery polling and the reboot deadline
    info!("Firmware ready. Entering main loop.");
    loop {
        manager.lock().unwrap().update();
        thread::sleep(Duration::from_millis(50));
    }
}

#[cfg(not(feature = "esp32"))]
fn main() {
    eprintln!("built without the `esp32` feature; this binary only runs on the device");
}
