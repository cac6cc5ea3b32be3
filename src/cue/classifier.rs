//! Cue Classifier: keyword rules ranked by priority.
//!
//! Every rule whose trigger appears anywhere in the lowered text fires
//! (plain substring containment, so "this" fires the `hi` greeting).
//! The winner is chosen by an explicit reduction over the rule table and
//! a cue is drawn from the winner's candidates with an injected RNG.

use super::Cue;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// How two firing rules with the same priority are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// The rule declared later in the table wins the tie.
    #[default]
    LastDeclared,
    /// The rule declared earlier in the table wins the tie.
    FirstDeclared,
}

/// A keyword-to-cue mapping with a priority.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordRule {
    keywords: Vec<String>,
    cues: Vec<Cue>,
    priority: i32,
}

impl KeywordRule {
    /// Keywords are lowered here so matching stays case-insensitive.
    pub fn new<I, S>(keywords: I, cues: Vec<Cue>, priority: i32) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.into().to_lowercase())
                .collect(),
            cues,
            priority,
        }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// `lowered` must already be lowercase.
    pub fn fires_on(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|kw| lowered.contains(kw.as_str()))
    }

    /// Uniform pick among the candidates.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Cue {
        self.cues.choose(rng).copied().unwrap_or(Cue::Talking)
    }
}

/// Built-in rule table.
pub fn default_rules() -> Vec<KeywordRule> {
    vec![
        KeywordRule::new(
            ["hello", "hi", "hey", "greetings", "good morning", "good evening"],
            vec![Cue::Wave],
            10,
        ),
        KeywordRule::new(
            ["happy", "glad", "joy", "awesome", "great", "wonderful", "amazing", "😊", "😄", "💕"],
            vec![Cue::Happy, Cue::Excited],
            8,
        ),
        KeywordRule::new(
            ["sad", "sorry", "disappointed", "unfortunate", "😢", "😔"],
            vec![Cue::Sad],
            8,
        ),
        KeywordRule::new(
            ["think", "hmm", "consider", "maybe", "perhaps", "wondering"],
            vec![Cue::Thinking],
            6,
        ),
        KeywordRule::new(
            ["love", "kiss", "cute", "beautiful", "sweet", "💖", "😘", "💕"],
            vec![Cue::Flirty, Cue::Happy],
            9,
        ),
        KeywordRule::new(
            ["dance", "party", "celebrate", "fun"],
            vec![Cue::Dance],
            10,
        ),
        KeywordRule::new(
            ["laugh", "haha", "lol", "funny", "😂", "🤣"],
            vec![Cue::Laugh],
            9,
        ),
        KeywordRule::new(
            ["angry", "mad", "upset", "frustrated", "😠", "😡"],
            vec![Cue::Angry],
            8,
        ),
        KeywordRule::new(
            ["wow", "omg", "surprised", "shock", "unexpected", "😮", "😱"],
            vec![Cue::Surprised],
            9,
        ),
    ]
}

/// Maps a line of text to a single cue.
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<KeywordRule>,
    tie_break: TieBreak,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(default_rules(), TieBreak::default())
    }
}

impl Classifier {
    pub fn new(rules: Vec<KeywordRule>, tie_break: TieBreak) -> Self {
        Self { rules, tie_break }
    }

    pub fn rules(&self) -> &[KeywordRule] {
        &self.rules
    }

    pub fn tie_break(&self) -> TieBreak {
        self.tie_break
    }

    /// The winning rule for `text`, if any rule fires.
    pub fn best_rule(&self, text: &str) -> Option<&KeywordRule> {
        let lowered = text.to_lowercase();
        self.rules
            .iter()
            .filter(|rule| rule.fires_on(&lowered))
            .reduce(|best, rule| if self.outranks(rule, best) { rule } else { best })
    }

    /// `challenger` is always declared after `incumbent`.
    fn outranks(&self, challenger: &KeywordRule, incumbent: &KeywordRule) -> bool {
        match challenger.priority.cmp(&incumbent.priority) {
            Ordering::Greater => true,
            Ordering::Less => false,
            Ordering::Equal => self.tie_break == TieBreak::LastDeclared,
        }
    }

    /// Classify `text`. Total over all inputs.
    pub fn classify<R: Rng + ?Sized>(&self, text: &str, rng: &mut R) -> Cue {
        match self.best_rule(text) {
            Some(rule) => rule.pick(rng),
            None if text.is_empty() => Cue::Idle,
            None => Cue::Talking,
        }
    }
}
