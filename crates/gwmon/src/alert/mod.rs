//! Alert collaborators notified on confirmed state transitions.
//!
//! The monitor calls [`AlertSink::set_indicator`] followed by
//! [`AlertSink::play_transition_cue`] exactly once per transition. Drivers
//! never fail the monitor: device errors are logged and swallowed.

mod led;
mod speaker;

pub use led::LedIndicator;
pub use speaker::{InputEvent, ToneSpeaker};

use std::fmt;

use crate::monitor::MonitorConfig;

/// Direction of a presence transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Default route appeared on the interface.
    Up,
    /// Default route went away.
    Down,
}

impl Direction {
    /// Direction of a transition into `present`.
    pub fn towards(present: bool) -> Self {
        if present {
            Direction::Up
        } else {
            Direction::Down
        }
    }

    /// Tone frequencies (Hz) of the cue, without the closing silence.
    pub fn tones(self) -> &'static [i32] {
        match self {
            Direction::Up => &[440, 554, 659],
            Direction::Down => &[659, 554, 440],
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// Receiver of transition notifications.
pub trait AlertSink {
    /// Switch the visual indicator.
    fn set_indicator(&mut self, on: bool);

    /// Start the audible cue for a transition.
    fn play_transition_cue(&mut self, direction: Direction);
}

impl<A: AlertSink + ?Sized> AlertSink for &mut A {
    fn set_indicator(&mut self, on: bool) {
        (**self).set_indicator(on)
    }

    fn play_transition_cue(&mut self, direction: Direction) {
        (**self).play_transition_cue(direction)
    }
}

impl<A: AlertSink + ?Sized> AlertSink for Box<A> {
    fn set_indicator(&mut self, on: bool) {
        (**self).set_indicator(on)
    }

    fn play_transition_cue(&mut self, direction: Direction) {
        (**self).play_transition_cue(direction)
    }
}

/// Sink that only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAlert;

impl AlertSink for LogAlert {
    fn set_indicator(&mut self, on: bool) {
        tracing::debug!(on, "indicator");
    }

    fn play_transition_cue(&mut self, direction: Direction) {
        tracing::debug!(%direction, "transition cue");
    }
}

/// LED plus optional speaker, as wired on the gateway box.
#[derive(Debug)]
pub struct Alerts {
    led: LedIndicator,
    speaker: Option<ToneSpeaker>,
}

impl Alerts {
    /// Combine an LED with an optional speaker.
    pub fn new(led: LedIndicator, speaker: Option<ToneSpeaker>) -> Self {
        Self { led, speaker }
    }

    /// Outputs as configured; the speaker is left out when sound is off.
    pub fn from_config(config: &MonitorConfig) -> Self {
        let speaker = config
            .sound
            .then(|| ToneSpeaker::new(&config.speaker_path, config.tone_step()));
        Self::new(LedIndicator::new(&config.led_path), speaker)
    }

    /// Put the outputs into their idle state: LED off, speaker silent.
    pub fn reset(&mut self) {
        self.led.set(false);
        if let Some(speaker) = &mut self.speaker {
            speaker.silence();
        }
    }
}

impl AlertSink for Alerts {
    fn set_indicator(&mut self, on: bool) {
        self.led.set(on);
    }

    fn play_transition_cue(&mut self, direction: Direction) {
        if let Some(speaker) = &mut self.speaker {
            speaker.play(direction);
        }
    }
}
