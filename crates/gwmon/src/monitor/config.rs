//! Monitor configuration.
//!
//! Every field has a default, so a JSON file only needs the keys it changes:
//!
//! ```json
//! { "interface": "wan0", "debounce_ms": 5000, "debounce_policy": "restart" }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::netlink::Result;
use crate::util::ifname;

/// Default settling window after a relevant route change.
pub const DEFAULT_DEBOUNCE_MS: u64 = 2000;
/// Default LED brightness file.
pub const DEFAULT_LED_PATH: &str = "/sys/class/leds/apu2:1/brightness";
/// Default PC speaker event device.
pub const DEFAULT_SPEAKER_PATH: &str = "/dev/input/by-path/platform-pcspkr-event-spkr";
/// Default duration of each tone in a cue.
pub const DEFAULT_TONE_STEP_MS: u64 = 300;

/// How further relevant changes affect an armed debounce timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebouncePolicy {
    /// The window runs from the first change; later changes don't extend it.
    #[default]
    Fixed,
    /// Every relevant change restarts the window.
    Restart,
}

/// Monitor settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Interface expected to carry the default route.
    pub interface: String,
    /// Debounce window in milliseconds.
    pub debounce_ms: u64,
    /// Debounce restart behaviour.
    pub debounce_policy: DebouncePolicy,
    /// LED brightness file.
    pub led_path: PathBuf,
    /// Speaker event device.
    pub speaker_path: PathBuf,
    /// Duration of each tone in milliseconds.
    pub tone_step_ms: u64,
    /// Whether to play cues at all.
    pub sound: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interface: String::new(),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            debounce_policy: DebouncePolicy::default(),
            led_path: PathBuf::from(DEFAULT_LED_PATH),
            speaker_path: PathBuf::from(DEFAULT_SPEAKER_PATH),
            tone_step_ms: DEFAULT_TONE_STEP_MS,
            sound: true,
        }
    }
}

impl MonitorConfig {
    /// Configuration for `interface` with all other settings at their defaults.
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            ..Default::default()
        }
    }

    /// Load from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Load from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the monitored interface.
    pub fn with_interface(mut self, interface: impl Into<String>) -> Self {
        self.interface = interface.into();
        self
    }

    /// Set the debounce window.
    pub fn with_debounce(mut self, window: Duration) -> Self {
        self.debounce_ms = window.as_millis() as u64;
        self
    }

    /// Set the debounce policy.
    pub fn with_debounce_policy(mut self, policy: DebouncePolicy) -> Self {
        self.debounce_policy = policy;
        self
    }

    /// Set the LED brightness file.
    pub fn with_led_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.led_path = path.into();
        self
    }

    /// Set the speaker event device.
    pub fn with_speaker_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.speaker_path = path.into();
        self
    }

    /// Set the duration of each tone.
    pub fn with_tone_step(mut self, step: Duration) -> Self {
        self.tone_step_ms = step.as_millis() as u64;
        self
    }

    /// Enable or disable cues.
    pub fn with_sound(mut self, enabled: bool) -> Self {
        self.sound = enabled;
        self
    }

    /// Debounce window as a duration.
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Tone duration as a duration.
    pub fn tone_step(&self) -> Duration {
        Duration::from_millis(self.tone_step_ms)
    }

    /// Check that the interface name is usable.
    pub fn validate(&self) -> Result<()> {
        ifname::validate(&self.interface)
    }
}
