//! Sentiment helper: coarse positive/negative tone of a message.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

const POSITIVE_KW: &[&str] = &[
    "happy",
    "good",
    "great",
    "love",
    "awesome",
    "wonderful",
    "excellent",
];

const NEGATIVE_KW: &[&str] = &[
    "sad",
    "bad",
    "hate",
    "terrible",
    "awful",
    "horrible",
    "disappointed",
];

/// Count distinct positive vs negative keywords; ties are neutral.
pub fn analyze_sentiment(text: &str) -> Sentiment {
    let lower = text.to_lowercase();
    let positive = POSITIVE_KW.iter().filter(|kw| lower.contains(*kw)).count();
    let negative = NEGATIVE_KW.iter().filter(|kw| lower.contains(*kw)).count();

    match positive.cmp(&negative) {
        std::cmp::Ordering::Greater => Sentiment::Positive,
        std::cmp::Ordering::Less => Sentiment::Negative,
        std::cmp::Ordering::Equal => Sentiment::Neutral,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_words_win() {
        assert_eq!(analyze_sentiment("What a GREAT and wonderful day"), Sentiment::Positive);
    }

    #[test]
    fn negative_words_win() {
        assert_eq!(analyze_sentiment("That was awful, I hate it"), Sentiment::Negative);
    }

    #[test]
    fn balanced_or_empty_is_neutral() {
        assert_eq!(analyze_sentiment(""), Sentiment::Neutral);
        assert_eq!(analyze_sentiment("good but sad"), Sentiment::Neutral);
        assert_eq!(analyze_sentiment("the bus is late"), Sentiment::Neutral);
    }

    #[test]
    fn repeats_count_once() {
        // "love love love" is one positive keyword, "bad" and "awful" are two negatives.
        assert_eq!(analyze_sentiment("love love love, bad awful"), Sentiment::Negative);
    }
}
