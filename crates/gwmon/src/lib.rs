//! Default-route presence monitor for Linux gateway boxes.
//!
//! This crate watches the kernel routing table over rtnetlink and reports,
//! with debouncing, whether a given interface currently carries the IPv4
//! default route in the main table. State changes are forwarded to an
//! [`AlertSink`](alert::AlertSink) (LED and PC speaker drivers included).
//!
//! # Example
//!
//! ```ignore
//! use gwmon::alert::LogAlert;
//! use gwmon::monitor::{MonitorConfig, run};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> gwmon::Result<()> {
//!     let config = MonitorConfig::new("wan0");
//!     run(&config, LogAlert, std::future::pending()).await
//! }
//! ```
//!
//! # Layout
//!
//! - [`netlink`] - socket, message framing, attribute iteration and the
//!   route parsers
//! - [`monitor`] - debounce/state machine, configuration and the reactor
//! - [`alert`] - alert collaborators (indicator and tone player)
//! - [`util`] - interface name/index helpers

pub mod alert;
pub mod monitor;
pub mod netlink;
pub mod util;

// Re-export common types at crate root for convenience
pub use netlink::{Error, Result};
