//! Default-route monitor.
//!
//! Route-change notifications for the target interface arm a debounce timer.
//! When it fires, the whole IPv4 table is dumped and scanned for a default
//! route in the main table leaving through the target. The result of a
//! completed dump is the only thing that changes [`PresenceState`]; a change
//! is reported once to the [`AlertSink`](crate::alert::AlertSink).
//!
//! ```text
//!            relevant change              timer
//!   Idle ──────────────────▶ DebounceArmed ─────▶ DumpInFlight
//!    ▲                                                 │
//!    └──────────── end of dump / kernel error ─────────┘
//! ```
//!
//! [`MonitorContext`] holds the machine and never touches a socket or a
//! clock; [`drive`] runs it on the tokio reactor and [`run`] wires it to a
//! real route socket.

mod config;
mod context;
mod reactor;

pub use config::{
    DEFAULT_DEBOUNCE_MS, DEFAULT_LED_PATH, DEFAULT_SPEAKER_PATH, DEFAULT_TONE_STEP_MS,
    DebouncePolicy, MonitorConfig,
};
pub use context::{DumpSession, Event, MonitorContext, Phase, PresenceState, Step};
pub use reactor::{drive, run};
