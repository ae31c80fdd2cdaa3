use std::collections::HashMap;

use chrono::NaiveDateTime;
use regex::Regex;

use crate::error::Result;
use crate::models::{RawMessage, ScoreRecord};

/// Lowest score the analyzer produces
pub const MIN_SCORE: f64 = -1.0;
/// Highest score the analyzer produces
pub const MAX_SCORE: f64 = 1.0;

/// Score deltas for words that carry sentiment in winter-activity posts
const LEXICON: &[(&str, f64)] = &[
    // positive
    ("loved", 0.6),
    ("love", 0.6),
    ("enjoyed", 0.5),
    ("enjoy", 0.5),
    ("amazing", 0.6),
    ("wonderful", 0.6),
    ("perfect", 0.6),
    ("great", 0.5),
    ("awesome", 0.5),
    ("beautiful", 0.5),
    ("magical", 0.5),
    ("invigorating", 0.5),
    ("festive", 0.4),
    ("cozy", 0.4),
    ("fun", 0.4),
    ("happy", 0.4),
    ("good", 0.3),
    ("fresh", 0.2),
    ("crisp", 0.2),
    // negative
    ("hated", -0.6),
    ("hate", -0.6),
    ("awful", -0.6),
    ("terrible", -0.6),
    ("miserable", -0.6),
    ("disappointing", -0.5),
    ("frigid", -0.4),
    ("freezing", -0.4),
    ("boring", -0.4),
    ("bad", -0.4),
    ("sad", -0.4),
    ("crowded", -0.3),
    ("slushy", -0.3),
    ("canceled", -0.3),
    ("cold", -0.2),
    ("icy", -0.2),
];

/// Intensifiers that scale the next sentiment word
const INTENSIFIERS: &[(&str, f64)] = &[
    ("very", 1.5),
    ("extremely", 2.0),
    ("incredibly", 2.0),
    ("absolutely", 2.0),
    ("totally", 1.8),
    ("really", 1.3),
    ("so", 1.2),
    ("quite", 1.2),
    ("somewhat", 0.8),
    ("slightly", 0.7),
    ("barely", 0.5),
];

/// Negation words that flip sentiment one or two tokens later
const NEGATIONS: &[&str] = &[
    "not", "no", "never", "nothing", "didn't", "wasn't", "isn't", "don't", "hardly",
];

/// Keyword-table sentiment scorer
///
/// Stateless between calls: the same text always yields the same score.
pub struct SentimentAnalyzer {
    word_regex: Regex,
    lexicon: HashMap<&'static str, f64>,
    intensifiers: HashMap<&'static str, f64>,
}

impl SentimentAnalyzer {
    /// Build the analyzer and compile its tokenizer
    pub fn new() -> Result<Self> {
        Ok(Self {
            word_regex: Regex::new(r"[a-z]+(?:'[a-z]+)?")?,
            lexicon: LEXICON.iter().copied().collect(),
            intensifiers: INTENSIFIERS.iter().copied().collect(),
        })
    }

    /// Lowercase word tokens of `text`, punctuation dropped
    #[must_use]
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let lower = text.to_lowercase();
        self.word_regex
            .find_iter(&lower)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// Sum the deltas of every known word, clamped to `[MIN_SCORE, MAX_SCORE]`
    #[must_use]
    pub fn score(&self, text: &str) -> f64 {
        let tokens = self.tokenize(text);
        let mut total = 0.0;

        for (i, token) in tokens.iter().enumerate() {
            let Some(&weight) = self.lexicon.get(token.as_str()) else {
                continue;
            };
            let mut sentiment = weight;

            if i > 0 {
                if let Some(&intensity) = self.intensifiers.get(tokens[i - 1].as_str()) {
                    sentiment *= intensity;
                }
            }

            let negated = tokens[i.saturating_sub(2)..i]
                .iter()
                .any(|t| NEGATIONS.contains(&t.as_str()));
            if negated {
                sentiment = -sentiment * 0.8;
            }

            total += sentiment;
        }

        total.clamp(MIN_SCORE, MAX_SCORE)
    }

    /// Derive the score record for one message
    ///
    /// `now` stamps messages that arrived without a timestamp.
    #[must_use]
    pub fn analyze(&self, message: &RawMessage, now: NaiveDateTime) -> ScoreRecord {
        ScoreRecord {
            author: message.author.clone(),
            category: message.category,
            sentiment_score: self.score(&message.text),
            timestamp: message.timestamp.unwrap_or(now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use chrono::NaiveDate;

    #[test]
    fn test_tokenize() {
        let analyzer = SentimentAnalyzer::new().unwrap();
        let tokens = analyzer.tokenize("I just LOVED ice-skating! It wasn't cold.");
        assert_eq!(tokens, vec!["i", "just", "loved", "ice", "skating", "it", "wasn't", "cold"]);
    }

    #[test]
    fn test_sentiment_analysis() {
        let analyzer = SentimentAnalyzer::new().unwrap();

        assert!(analyzer.score("loved the fresh powder") > 0.0);
        assert!(analyzer.score("It was frigid and crowded") < 0.0);
        assert_eq!(analyzer.score("I just tried sledding in Minneapolis"), 0.0);
    }

    #[test]
    fn test_intensifier_and_negation() {
        let analyzer = SentimentAnalyzer::new().unwrap();

        let plain = analyzer.score("it was fun");
        let boosted = analyzer.score("it was very fun");
        assert!(boosted > plain);

        let negated = analyzer.score("it was not fun");
        assert!((negated + 0.4 * 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_score_is_clamped() {
        let analyzer = SentimentAnalyzer::new().unwrap();
        let gushing = "loved loved loved amazing wonderful perfect";
        assert_eq!(analyzer.score(gushing), MAX_SCORE);
        let ranting = "hated awful terrible miserable";
        assert_eq!(analyzer.score(ranting), MIN_SCORE);
    }

    #[test]
    fn test_analyze_falls_back_to_processing_time() {
        let analyzer = SentimentAnalyzer::new().unwrap();
        let now = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap().and_hms_opt(8, 0, 0).unwrap();
        let message = RawMessage::new("sam", Category::Skiing, "loved the fresh powder");

        let record = analyzer.analyze(&message, now);
        assert_eq!(record.author, "sam");
        assert_eq!(record.category, Category::Skiing);
        assert_eq!(record.timestamp, now);
        assert!(record.sentiment_score > 0.0);
    }
}
