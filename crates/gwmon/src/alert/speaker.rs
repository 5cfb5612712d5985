//! PC speaker tone cues through the Linux input event interface.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::task::JoinHandle;
use zerocopy::{Immutable, IntoBytes};

use super::Direction;

/// Event type for sound (EV_SND).
pub const EV_SND: u16 = 0x12;
/// Sound code for a tone of a given frequency (SND_TONE).
pub const SND_TONE: u16 = 0x02;

/// Input event (mirrors struct input_event).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, IntoBytes, Immutable)]
pub struct InputEvent {
    /// Timestamp seconds; ignored by the kernel on write.
    pub tv_sec: libc::time_t,
    /// Timestamp microseconds.
    pub tv_usec: libc::suseconds_t,
    /// Event type.
    pub type_: u16,
    /// Event code.
    pub code: u16,
    /// Event value; the frequency in Hz for SND_TONE, 0 for silence.
    pub value: i32,
}

impl InputEvent {
    /// A tone event; `0` silences the speaker.
    pub fn tone(frequency: i32) -> Self {
        Self {
            type_: EV_SND,
            code: SND_TONE,
            value: frequency,
            ..Default::default()
        }
    }
}

/// Plays transition cues on a speaker event device.
///
/// Each cue runs as a task on the current tokio runtime. Starting a cue
/// cancels the one in progress.
#[derive(Debug)]
pub struct ToneSpeaker {
    path: PathBuf,
    step: Duration,
    task: Option<JoinHandle<()>>,
}

impl ToneSpeaker {
    /// Create a speaker for `path`, holding each tone for `step`.
    pub fn new(path: impl AsRef<Path>, step: Duration) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            step,
            task: None,
        }
    }

    /// Check whether a cue is still playing.
    pub fn is_playing(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Start the cue for `direction`, replacing any cue in progress.
    ///
    /// Must be called from within a tokio runtime.
    pub fn play(&mut self, direction: Direction) {
        if let Some(task) = self.task.take() {
            task.abort();
        }

        let path = self.path.clone();
        let step = self.step;
        self.task = Some(tokio::spawn(async move {
            if let Err(e) = play_sequence(&path, direction.tones(), step).await {
                tracing::warn!(path = %path.display(), error = %e, "failed to play cue");
            }
        }));
    }

    /// Wait for the current cue to finish.
    pub async fn wait(&mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    /// Cancel any cue and silence the speaker.
    pub fn silence(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }

        let result = std::fs::OpenOptions::new()
            .write(true)
            .open(&self.path)
            .and_then(|mut file| {
                std::io::Write::write_all(&mut file, InputEvent::tone(0).as_bytes())
            });
        if let Err(e) = result {
            tracing::debug!(path = %self.path.display(), error = %e, "failed to silence speaker");
        }
    }
}

/// Write each tone, hold it for `step`, then write silence.
async fn play_sequence(path: &Path, tones: &[i32], step: Duration) -> std::io::Result<()> {
    let mut device = tokio::fs::OpenOptions::new().write(true).open(path).await?;

    for &frequency in tones {
        device.write_all(InputEvent::tone(frequency).as_bytes()).await?;
        device.flush().await?;
        tokio::time::sleep(step).await;
    }

    device.write_all(InputEvent::tone(0).as_bytes()).await?;
    device.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(data: &[u8]) -> Vec<i32> {
        let size = std::mem::size_of::<InputEvent>();
        assert_eq!(data.len() % size, 0);
        data.chunks(size)
            .map(|event| {
                let at = size - 4;
                i32::from_ne_bytes([event[at], event[at + 1], event[at + 2], event[at + 3]])
            })
            .collect()
    }

    fn device(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("gwmon-spkr-{}-{}", name, std::process::id()));
        std::fs::write(&path, b"").unwrap();
        path
    }

    #[test]
    fn test_event_layout() {
        let ev = InputEvent::tone(440);
        let bytes = ev.as_bytes();
        assert_eq!(bytes.len(), std::mem::size_of::<InputEvent>());

        let off = 2 * std::mem::size_of::<libc::time_t>();
        assert_eq!(&bytes[off..off + 2], &EV_SND.to_ne_bytes());
        assert_eq!(&bytes[off + 2..off + 4], &SND_TONE.to_ne_bytes());
        assert_eq!(&bytes[off + 4..off + 8], &440i32.to_ne_bytes());
    }

    #[tokio::test(start_paused = true)]
    async fn test_up_cue_ends_in_silence() {
        let path = device("up");
        let mut speaker = ToneSpeaker::new(&path, Duration::from_millis(300));

        speaker.play(Direction::Up);
        assert!(speaker.is_playing());
        speaker.wait().await;

        assert_eq!(values(&std::fs::read(&path).unwrap()), vec![440, 554, 659, 0]);
        assert!(!speaker.is_playing());
        std::fs::remove_file(path).unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_down_cue() {
        let path = device("down");
        let mut speaker = ToneSpeaker::new(&path, Duration::from_millis(300));

        speaker.play(Direction::Down);
        speaker.wait().await;

        assert_eq!(values(&std::fs::read(&path).unwrap()), vec![659, 554, 440, 0]);
        std::fs::remove_file(path).unwrap();
    }

    #[tokio::test]
    async fn test_missing_device_is_logged() {
        let mut speaker = ToneSpeaker::new("/nonexistent/gwmon-spkr", Duration::from_millis(1));
        speaker.play(Direction::Up);
        speaker.wait().await;
        speaker.silence();
    }

    #[tokio::test]
    async fn test_silence_writes_zero_tone() {
        let path = device("silence");
        let mut speaker = ToneSpeaker::new(&path, Duration::from_secs(60));
        speaker.silence();

        assert_eq!(values(&std::fs::read(&path).unwrap()), vec![0]);
        std::fs::remove_file(path).unwrap();
    }
}
