//! Web front end: placeholder templating, form decoding, and (on device)
//! the HTTP route table.

pub mod forms;
#[cfg(feature = "esp32")]
pub mod server;
pub mod template;

#[cfg(feature = "esp32")]
pub use server::start_web_server;
pub use template::{render, PageContext};
