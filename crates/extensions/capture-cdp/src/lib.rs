//! Screenshot capture over the Chrome DevTools Protocol.
//!
//! Each capture opens a fresh tab through the browser's HTTP endpoint,
//! drives it over the tab's WebSocket and closes it afterwards.
//!
//! Start Chrome with remote debugging before use:
//!
//! ```bash
//! chrome --headless --remote-debugging-port=9222
//! ```

mod browser;
mod client;
mod error;
mod protocol;
mod service;

pub use error::CdpError;
pub use service::CdpScreenshots;
