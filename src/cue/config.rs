//! Cue configuration: keyword rules and hold durations, persisted as JSON.

use super::classifier::{default_rules, Classifier, KeywordRule, TieBreak};
use super::durations::{DurationTable, DEFAULT_HOLD_MS};
use super::lip_sync::DEFAULT_MS_PER_WORD;
use super::Cue;
use crate::config::{read_json_config, ConfigError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

// ── Rule Config ────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    pub keywords: Vec<String>,
    pub cues: Vec<Cue>,
    pub priority: i32,
}

impl From<&KeywordRule> for RuleConfig {
    fn from(rule: &KeywordRule) -> Self {
        Self {
            keywords: rule.keywords().to_vec(),
            cues: rule.cues().to_vec(),
            priority: rule.priority(),
        }
    }
}

// ── Cue Config ─────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CueConfig {
    #[serde(default = "default_rule_configs")]
    pub rules: Vec<RuleConfig>,
    #[serde(default = "default_durations")]
    pub durations: BTreeMap<Cue, u64>,
    #[serde(default = "default_hold_ms")]
    pub default_duration_ms: u64,
    #[serde(default)]
    pub tie_break: TieBreak,
    #[serde(default = "default_ms_per_word")]
    pub lip_sync_ms_per_word: u64,
}

fn default_rule_configs() -> Vec<RuleConfig> {
    default_rules().iter().map(RuleConfig::from).collect()
}

fn default_durations() -> BTreeMap<Cue, u64> {
    let table = DurationTable::default();
    Cue::ALL.iter().map(|c| (*c, table.hold_ms(*c))).collect()
}

fn default_hold_ms() -> u64 {
    DEFAULT_HOLD_MS
}

fn default_ms_per_word() -> u64 {
    DEFAULT_MS_PER_WORD
}

impl Default for CueConfig {
    fn default() -> Self {
        Self {
            rules: default_rule_configs(),
            durations: default_durations(),
            default_duration_ms: DEFAULT_HOLD_MS,
            tie_break: TieBreak::default(),
            lip_sync_ms_per_word: DEFAULT_MS_PER_WORD,
        }
    }
}

impl CueConfig {
    /// Strict load: the file must exist, parse and validate.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config: Self = read_json_config(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (index, rule) in self.rules.iter().enumerate() {
            if rule.keywords.is_empty() {
                return Err(ConfigError::Invalid(format!("rule {} has no keywords", index)));
            }
            if rule.keywords.iter().any(|kw| kw.is_empty()) {
                return Err(ConfigError::Invalid(format!(
                    "rule {} has an empty keyword",
                    index
                )));
            }
            if rule.cues.is_empty() {
                return Err(ConfigError::Invalid(format!("rule {} has no cues", index)));
            }
        }
        Ok(())
    }

    pub fn classifier(&self) -> Classifier {
        let rules = self
            .rules
            .iter()
            .map(|r| KeywordRule::new(r.keywords.iter().cloned(), r.cues.clone(), r.priority))
            .collect();
        Classifier::new(rules, self.tie_break)
    }

    pub fn duration_table(&self) -> DurationTable {
        DurationTable::new(self.durations.clone(), self.default_duration_ms)
    }
}
