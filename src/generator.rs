//! Synthetic winter-activity messages for Minneapolis.

use chrono::{Local, NaiveDateTime, Timelike};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::models::{Category, RawMessage};

const ADJECTIVES: &[&str] = &["snowy", "frigid", "invigorating", "festive", "cozy"];
const ACTIONS: &[&str] = &["tried", "enjoyed", "experienced", "participated in", "loved"];
const AUTHORS: &[&str] = &["Prince", "Bob", "Walter", "Judy"];
const TOPICS: &[(&str, Category)] = &[
    ("ice skating", Category::Skating),
    ("cross-country skiing", Category::Skiing),
    ("snowshoeing", Category::Snowshoeing),
    ("ice fishing", Category::IceFishing),
    ("sledding", Category::Sledding),
    ("St. Paul Winter Carnival", Category::Carnival),
    ("Great Northern Festival", Category::Festival),
    ("Minneapolis Boat Show", Category::BoatShow),
    ("winter photography", Category::Photography),
    ("indoor museum visit", Category::Museum),
];

/// Endless stream of generated messages
pub struct MessageGenerator {
    rng: StdRng,
}

impl MessageGenerator {
    /// A seeded generator repeats the same sequence of texts and authors
    #[must_use]
    pub fn new(seed: Option<u64>) -> Self {
        let rng = seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        Self { rng }
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.gen_range(0..items.len())]
    }

    /// Build one message stamped with `timestamp`
    pub fn generate_at(&mut self, timestamp: NaiveDateTime) -> RawMessage {
        let adjective = self.pick(ADJECTIVES);
        let action = self.pick(ACTIONS);
        let author = self.pick(AUTHORS);
        let (topic, category) = TOPICS[self.rng.gen_range(0..TOPICS.len())];

        let text = format!("I just {action} {topic} in Minneapolis! It was {adjective}.");
        let sentiment_hint = (self.rng.gen::<f64>() * 100.0).round() / 100.0;
        let temperature: u8 = self.rng.gen_range(9..=29);

        RawMessage {
            author: author.to_string(),
            category,
            message_length: Some(text.chars().count()),
            text,
            timestamp: Some(timestamp),
            sentiment_hint: Some(sentiment_hint),
            keyword_mentioned: Some(category.keyword().to_string()),
            season: Some("Winter".to_string()),
            average_temp: Some(format!("{temperature}°F")),
        }
    }
}

impl Iterator for MessageGenerator {
    type Item = RawMessage;

    fn next(&mut self) -> Option<RawMessage> {
        let now = Local::now().naive_local();
        // Log lines carry whole seconds
        let now = now.with_nanosecond(0).unwrap_or(now);
        Some(self.generate_at(now))
    }
}
