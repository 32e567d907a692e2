//! Zero-configuration WiFi example firmware.
//!
//! Connects to an existing wireless network (station mode) or falls back to
//! hosting its own access point with a captive-style DNS responder, persists
//! the network credentials as JSON on flash, and serves a small web UI for
//! LED control and reconfiguration.
//!
//! The platform-independent core (connectivity state machine, config store,
//! DNS answering, templating) always compiles so it can be tested on the
//! host; everything touching ESP-IDF is gated behind the `esp32` feature.

pub mod config;
pub mod discovery;
pub mod dns;
pub mod leds;
#[cfg(feature = "esp32")]
pub mod mdns;
#[cfg(feature = "esp32")]
pub mod ota;
#[cfg(feature = "esp32")]
pub mod storage;
pub mod web;
pub mod wifi;

pub use config::{ConfigStore, Credentials};
pub use wifi::{Mode, Radio, ZeroConfWifi};
