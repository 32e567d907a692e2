//! Connectivity bring-up: station mode with bounded retries, access point
//! fallback, deferred reboot scheduling.
//!
//! The [`ZeroConfWifi`] manager owns the mode state machine and is generic
//! over a [`Radio`] (vendor radio driver) and a
//! [`Discovery`](crate::discovery::Discovery) responder, so the policy is
//! testable without hardware.

#[cfg(feature = "esp32")]
mod esp;
mod manager;
mod radio;

#[cfg(feature = "esp32")]
pub use esp::EspRadio;
pub use manager::{ZeroConfWifi, REBOOT_DELAY, RETRY_INTERVAL, RETRY_MAX};
pub use radio::Radio;

/// Active connectivity mode. Exactly one is active at a time and transitions
/// only move forward through the startup sequence; switching modes afterwards
/// requires a restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Radio inactive.
    Idle,
    /// Joined an existing wireless network as a client.
    Station,
    /// Hosting an isolated network for clients to join.
    AccessPoint,
}
