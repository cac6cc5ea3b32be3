//! Hold durations: minimum time each cue stays on screen.

use super::Cue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

pub const DEFAULT_HOLD_MS: u64 = 2000;

/// Per-cue hold durations in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationTable {
    entries: BTreeMap<Cue, u64>,
    default_ms: u64,
}

impl Default for DurationTable {
    fn default() -> Self {
        let entries = [
            (Cue::Idle, 2000),
            (Cue::Talking, 3000),
            (Cue::Happy, 2500),
            (Cue::Sad, 3000),
            (Cue::Excited, 2000),
            (Cue::Thinking, 3500),
            (Cue::Wave, 2000),
            (Cue::Dance, 4000),
            (Cue::Laugh, 2500),
            (Cue::Angry, 2500),
            (Cue::Surprised, 2000),
            (Cue::Flirty, 2500),
        ]
        .into_iter()
        .collect();

        Self {
            entries,
            default_ms: DEFAULT_HOLD_MS,
        }
    }
}

impl DurationTable {
    /// Build a table from explicit entries. Cues without an entry use `default_ms`.
    pub fn new(entries: BTreeMap<Cue, u64>, default_ms: u64) -> Self {
        Self {
            entries,
            default_ms,
        }
    }

    pub fn hold_ms(&self, cue: Cue) -> u64 {
        self.entries.get(&cue).copied().unwrap_or(self.default_ms)
    }

    pub fn hold(&self, cue: Cue) -> Duration {
        Duration::from_millis(self.hold_ms(cue))
    }

    pub fn default_ms(&self) -> u64 {
        self.default_ms
    }

    /// Total hold time of a sequence, i.e. how long it takes to drain.
    pub fn total(&self, cues: &[Cue]) -> Duration {
        Duration::from_millis(cues.iter().map(|c| self.hold_ms(*c)).sum())
    }
}
