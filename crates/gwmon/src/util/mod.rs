//! Shared utilities.

pub mod ifname;

pub use ifname::{InterfaceResolver, SysfsResolver};
