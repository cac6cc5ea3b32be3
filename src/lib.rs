pub mod config;
pub mod cue;
pub mod metrics;
pub mod session;

pub use config::ConfigError;
pub use cue::{
    analyze_sentiment, tag_reply_emotion, AvatarEmotion, Classifier, Cue, CueConfig,
    CueSequencer, DurationTable, KeywordRule, LipSync, Sentiment, TieBreak,
};
pub use metrics::{CompanionMetrics, MetricsSnapshot};
pub use session::{ChatEvent, CompanionSession};
