//! Interface name and index utilities.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::netlink::{Error, Result};

/// Maximum interface name length (including null terminator).
pub const IFNAMSIZ: usize = 16;

const SYS_CLASS_NET: &str = "/sys/class/net";

/// Validate an interface name.
pub fn validate(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidInterfaceName("empty name".to_string()));
    }

    if name.len() >= IFNAMSIZ {
        return Err(Error::InvalidInterfaceName(format!(
            "name too long (max {} chars)",
            IFNAMSIZ - 1
        )));
    }

    if name.contains('/') || name.contains('\0') {
        return Err(Error::InvalidInterfaceName(
            "name contains invalid characters".to_string(),
        ));
    }

    // Check for whitespace
    if name.chars().any(|c| c.is_whitespace()) {
        return Err(Error::InvalidInterfaceName(
            "name contains whitespace".to_string(),
        ));
    }

    Ok(())
}

/// Maps interface indices to names.
///
/// Lookups happen at decision time; an index that no longer resolves means
/// the interface is gone.
pub trait InterfaceResolver {
    /// Resolve `index` to the current interface name.
    fn index_to_name(&self, index: u32) -> Option<String>;
}

impl InterfaceResolver for HashMap<u32, String> {
    fn index_to_name(&self, index: u32) -> Option<String> {
        self.get(&index).cloned()
    }
}

impl<R: InterfaceResolver + ?Sized> InterfaceResolver for &R {
    fn index_to_name(&self, index: u32) -> Option<String> {
        (**self).index_to_name(index)
    }
}

/// Resolver backed by `/sys/class/net`.
#[derive(Debug, Clone)]
pub struct SysfsResolver {
    root: PathBuf,
}

impl Default for SysfsResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SysfsResolver {
    /// Resolver for the running system.
    pub fn new() -> Self {
        Self::with_root(SYS_CLASS_NET)
    }

    /// Resolver reading from another directory laid out like `/sys/class/net`.
    pub fn with_root(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl InterfaceResolver for SysfsResolver {
    fn index_to_name(&self, index: u32) -> Option<String> {
        if index == 0 {
            return None;
        }

        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!(root = %self.root.display(), error = %e, "cannot list interfaces");
                return None;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path().join("ifindex");
            if let Ok(content) = std::fs::read_to_string(&path)
                && let Ok(idx) = content.trim().parse::<u32>()
                && idx == index
            {
                return Some(entry.file_name().to_string_lossy().to_string());
            }
        }

        None
    }
}
