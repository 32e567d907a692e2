//! The two indicator LEDs.
//!
//! The logical on/off state lives in [`LedState`], shared with the web layer
//! for `%GREEN_LED_STATE%`/`%RED_LED_STATE%` template values; the GPIO pin
//! drivers behind it exist only on the device build.

use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Led {
    Green,
    Red,
}

/// Logical LED state, shared between the pin drivers and the page renderer.
#[derive(Debug, Default)]
pub struct LedState {
    green: AtomicBool,
    red: AtomicBool,
}

impl LedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, led: Led) -> bool {
        self.cell(led).load(Ordering::Relaxed)
    }

    pub fn set(&self, led: Led, on: bool) {
        self.cell(led).store(on, Ordering::Relaxed);
    }

    /// Flip the state, returning the new value.
    pub fn toggle(&self, led: Led) -> bool {
        !self.cell(led).fetch_xor(true, Ordering::Relaxed)
    }

    fn cell(&self, led: Led) -> &AtomicBool {
        match led {
            Led::Green => &self.green,
            Led::Red => &self.red,
        }
    }
}

#[cfg(feature = "esp32")]
pub use esp::Leds;

#[cfg(feature = "esp32")]
mod esp {
    use std::sync::Arc;

    use anyhow::Result;
    use esp_idf_hal::gpio::{AnyOutputPin, Output, PinDriver};

    use super::{Led, LedState};

    /// GPIO drivers for the green and red LEDs, kept in lockstep with the
    /// shared logical state.
    pub struct Leds {
        green: PinDriver<'static, AnyOutputPin, Output>,
        red: PinDriver<'static, AnyOutputPin, Output>,
        state: Arc<LedState>,
    }

    impl Leds {
        pub fn new(green: AnyOutputPin, red: AnyOutputPin, state: Arc<LedState>) -> Result<Self> {
            let mut leds = Self {
                green: PinDriver::output(green)?,
                red: PinDriver::output(red)?,
                state,
            };
            leds.set(Led::Green, false)?;
            leds.set(Led::Red, false)?;
            Ok(leds)
        }

        pub fn set(&mut self, led: Led, on: bool) -> Result<()> {
            let pin = match led {
                Led::Green => &mut self.green,
                Led::Red => &mut self.red,
            };
            if on {
                pin.set_high()?;
            } else {
                pin.set_low()?;
            }
            self.state.set(led, on);
            Ok(())
        }

        /// Flip a LED, returning the new state.
        pub fn toggle(&mut self, led: Led) -> Result<bool> {
            let on = !self.state.get(led);
            self.set(led, on)?;
            Ok(on)
        }
    }
}
