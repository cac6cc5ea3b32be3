//! Cue Engine: maps chat text to avatar animation cues and plays them back.
//!
//! The classifier picks one cue per message, the sequencer holds each cue
//! for its configured duration in strict FIFO order, and the lip-sync pulse
//! approximates a speaking indicator when no synthesized audio is available.

pub mod classifier;
pub mod config;
pub mod durations;
pub mod emotion;
pub mod lip_sync;
pub mod sentiment;
pub mod sequencer;

pub use classifier::{Classifier, KeywordRule, TieBreak};
pub use config::{CueConfig, RuleConfig};
pub use durations::DurationTable;
pub use emotion::{tag_reply_emotion, AvatarEmotion};
pub use lip_sync::LipSync;
pub use sentiment::{analyze_sentiment, Sentiment};
pub use sequencer::{CueSequencer, SequencerSnapshot};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A symbolic animation tag the avatar renderer can display.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Cue {
    #[default]
    Idle,
    Talking,
    Happy,
    Sad,
    Excited,
    Thinking,
    Wave,
    Dance,
    Laugh,
    Angry,
    Surprised,
    Flirty,
}

impl Cue {
    pub const ALL: [Cue; 12] = [
        Cue::Idle,
        Cue::Talking,
        Cue::Happy,
        Cue::Sad,
        Cue::Excited,
        Cue::Thinking,
        Cue::Wave,
        Cue::Dance,
        Cue::Laugh,
        Cue::Angry,
        Cue::Surprised,
        Cue::Flirty,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Cue::Idle => "idle",
            Cue::Talking => "talking",
            Cue::Happy => "happy",
            Cue::Sad => "sad",
            Cue::Excited => "excited",
            Cue::Thinking => "thinking",
            Cue::Wave => "wave",
            Cue::Dance => "dance",
            Cue::Laugh => "laugh",
            Cue::Angry => "angry",
            Cue::Surprised => "surprised",
            Cue::Flirty => "flirty",
        }
    }
}

impl fmt::Display for Cue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Cue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        Cue::ALL
            .iter()
            .copied()
            .find(|cue| cue.as_str() == name)
            .ok_or_else(|| format!("Unknown cue: {}", s))
    }
}
