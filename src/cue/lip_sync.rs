//! Lip-sync pulse: a timed speaking indicator for replies without audio.
//!
//! Speaking time is approximated as word count × a per-word constant. Only
//! the most recent pulse may end the speaking state: starting a new one
//! cancels the previous end-signal.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub const DEFAULT_MS_PER_WORD: u64 = 300;

struct PulseState {
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

struct Shared {
    state: Mutex<PulseState>,
    speaking: watch::Sender<bool>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, PulseState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn cancel(&self, state: &mut PulseState) {
        state.generation = state.generation.wrapping_add(1);
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
    }

    fn set_speaking(&self, speaking: bool) {
        self.speaking.send_if_modified(|current| {
            let changed = *current != speaking;
            *current = speaking;
            changed
        });
    }

    fn on_pulse_end(&self, generation: u64) {
        let mut state = self.lock();
        if state.generation != generation {
            return;
        }
        state.timer = None;
        self.set_speaking(false);
        tracing::trace!(target: "cue", "[LipSync] Speaking ended");
    }
}

/// Cancellable speaking-indicator toggle. Must be used within a Tokio runtime.
pub struct LipSync {
    ms_per_word: u64,
    shared: Arc<Shared>,
}

impl Default for LipSync {
    fn default() -> Self {
        Self::new(DEFAULT_MS_PER_WORD)
    }
}

impl LipSync {
    pub fn new(ms_per_word: u64) -> Self {
        let (speaking, _) = watch::channel(false);
        Self {
            ms_per_word,
            shared: Arc::new(Shared {
                state: Mutex::new(PulseState {
                    generation: 0,
                    timer: None,
                }),
                speaking,
            }),
        }
    }

    /// Approximate speaking time for `text`. Saturates instead of
    /// overflowing for very large per-word settings.
    pub fn estimate(&self, text: &str) -> Duration {
        let words = text.split_whitespace().count() as u64;
        Duration::from_millis(words.saturating_mul(self.ms_per_word))
    }

    /// Signal speaking for the estimated duration of `text`, replacing any
    /// pulse still in flight. Returns the scheduled duration.
    pub fn speak(&self, text: &str) -> Duration {
        let duration = self.estimate(text);
        let mut state = self.shared.lock();
        self.shared.cancel(&mut state);

        if duration.is_zero() {
            self.shared.set_speaking(false);
            return duration;
        }

        let generation = state.generation;
        let shared = Arc::clone(&self.shared);
        self.shared.set_speaking(true);
        state.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            shared.on_pulse_end(generation);
        }));
        tracing::trace!(target: "cue", "[LipSync] Speaking for {:?}", duration);
        duration
    }

    /// End the current pulse immediately.
    pub fn stop(&self) {
        let mut state = self.shared.lock();
        self.shared.cancel(&mut state);
        self.shared.set_speaking(false);
    }

    pub fn is_speaking(&self) -> bool {
        *self.shared.speaking.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.shared.speaking.subscribe()
    }
}

impl Drop for LipSync {
    fn drop(&mut self) {
        let mut state = self.shared.lock();
        self.shared.cancel(&mut state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn wait_ms(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[test]
    fn estimate_counts_words() {
        let lip = LipSync::new(300);
        assert_eq!(lip.estimate("one two  three"), Duration::from_millis(900));
        assert_eq!(lip.estimate("   "), Duration::ZERO);
    }

    #[test]
    fn estimate_saturates_on_huge_per_word_setting() {
        let lip = LipSync::new(u64::MAX / 2);
        assert_eq!(lip.estimate("a b c"), Duration::from_millis(u64::MAX));
        assert_eq!(lip.estimate("a"), Duration::from_millis(u64::MAX / 2));
    }

    #[tokio::test(start_paused = true)]
    async fn huge_pulse_still_speaks_and_stops() {
        let lip = LipSync::new(u64::MAX);
        lip.speak("far too many words");
        assert!(lip.is_speaking());
        lip.stop();
        assert!(!lip.is_speaking());
    }

    #[tokio::test(start_paused = true)]
    async fn pulse_ends_after_estimate() {
        let lip = LipSync::default();
        let duration = lip.speak("hello there friend");
        assert_eq!(duration, Duration::from_millis(900));
        assert!(lip.is_speaking());

        wait_ms(899).await;
        assert!(lip.is_speaking());
        wait_ms(2).await;
        assert!(!lip.is_speaking());
    }

    #[tokio::test(start_paused = true)]
    async fn new_pulse_cancels_the_old_end_signal() {
        let lip = LipSync::default();
        lip.speak("a b"); // would end at 600
        wait_ms(400).await;
        lip.speak("c d e f"); // ends at 400 + 1200

        wait_ms(300).await; // t = 700, past the first pulse
        assert!(lip.is_speaking());
        wait_ms(899).await; // t = 1599
        assert!(lip.is_speaking());
        wait_ms(2).await;
        assert!(!lip.is_speaking());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_is_immediate_and_final() {
        let lip = LipSync::default();
        let mut rx = lip.subscribe();
        lip.speak("one two three four");
        assert!(rx.has_changed().unwrap());
        assert!(*rx.borrow_and_update());

        lip.stop();
        assert!(!lip.is_speaking());
        wait_ms(5000).await;
        assert!(!lip.is_speaking());
    }

    #[tokio::test(start_paused = true)]
    async fn empty_text_does_not_start_speaking() {
        let lip = LipSync::default();
        lip.speak("one two");
        assert_eq!(lip.speak(""), Duration::ZERO);
        assert!(!lip.is_speaking());
    }
}
