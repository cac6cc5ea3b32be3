//! Avatar emotion tag for a generated reply.
//!
//! The renderer pairs this coarse tag with the active cue when it pushes an
//! avatar-state update alongside the companion's message.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvatarEmotion {
    Thankful,
    Excited,
    Happy,
    Surprised,
    #[default]
    Neutral,
}

impl fmt::Display for AvatarEmotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AvatarEmotion::Thankful => "thankful",
            AvatarEmotion::Excited => "excited",
            AvatarEmotion::Happy => "happy",
            AvatarEmotion::Surprised => "surprised",
            AvatarEmotion::Neutral => "neutral",
        };
        f.write_str(name)
    }
}

/// First matching check wins, in this order.
pub fn tag_reply_emotion(text: &str) -> AvatarEmotion {
    let lower = text.to_lowercase();
    let has = |kw: &str| lower.contains(kw);

    if has("thank") || has("grateful") || has("tip") {
        AvatarEmotion::Thankful
    } else if has("!") && (has("wow") || has("amazing")) {
        AvatarEmotion::Excited
    } else if has("happy") || has("😊") || has("💖") {
        AvatarEmotion::Happy
    } else if has("?") && has("really") {
        AvatarEmotion::Surprised
    } else {
        AvatarEmotion::Neutral
    }
}
