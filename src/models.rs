//! Data models for the winter-activity pipeline
//!
//! Raw messages travel through the log file and the broker topic as one JSON
//! object per line. Score records are what the consumer derives from them and
//! stores, and category summaries are what the report aggregates.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{Result, UnknownCategory};

/// Timestamp layout used in log lines, e.g. `2025-01-29 14:35:20`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Winter activity a message talks about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Ice skating
    Skating,
    /// Cross-country skiing
    Skiing,
    /// Snowshoeing
    Snowshoeing,
    /// Ice fishing
    IceFishing,
    /// Sledding
    Sledding,
    /// St. Paul Winter Carnival
    Carnival,
    /// Great Northern Festival
    Festival,
    /// Minneapolis Boat Show
    BoatShow,
    /// Winter photography
    Photography,
    /// Indoor museum visit
    Museum,
}

impl Category {
    /// Every category, in display order
    pub const ALL: [Self; 10] = [
        Self::Skating,
        Self::Skiing,
        Self::Snowshoeing,
        Self::IceFishing,
        Self::Sledding,
        Self::Carnival,
        Self::Festival,
        Self::BoatShow,
        Self::Photography,
        Self::Museum,
    ];

    /// Wire and storage name of the category
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Skating => "skating",
            Self::Skiing => "skiing",
            Self::Snowshoeing => "snowshoeing",
            Self::IceFishing => "ice_fishing",
            Self::Sledding => "sledding",
            Self::Carnival => "carnival",
            Self::Festival => "festival",
            Self::BoatShow => "boat_show",
            Self::Photography => "photography",
            Self::Museum => "museum",
        }
    }

    /// Keyword the generator reports as mentioned in the text
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Skating => "skating",
            Self::Skiing => "skiing",
            Self::Snowshoeing => "snowshoeing",
            Self::IceFishing => "fishing",
            Self::Sledding => "sledding",
            Self::Carnival => "Carnival",
            Self::Festival => "Festival",
            Self::BoatShow => "Boat Show",
            Self::Photography => "photography",
            Self::Museum => "museum",
        }
    }

    /// Broader activity group the category belongs to
    #[must_use]
    pub const fn group(self) -> &'static str {
        match self {
            Self::Skating | Self::Skiing | Self::Snowshoeing | Self::Sledding => "winter sports",
            Self::IceFishing => "outdoor recreation",
            Self::Carnival | Self::Festival | Self::BoatShow => "events",
            Self::Photography => "arts",
            Self::Museum => "indoor activities",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// A message as written by the producer, one per log line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMessage {
    /// Name of the person posting
    pub author: String,
    /// Activity the message is about
    pub category: Category,
    /// Free text of the message
    #[serde(alias = "message")]
    pub text: String,
    /// When the message was produced
    #[serde(default, with = "timestamp_format", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<NaiveDateTime>,
    /// Producer-side sentiment guess in `[0, 1]`
    #[serde(default, alias = "sentiment", skip_serializing_if = "Option::is_none")]
    pub sentiment_hint: Option<f64>,
    /// Keyword that selected the category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword_mentioned: Option<String>,
    /// Length of `text` in characters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_length: Option<usize>,
    /// Season label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<String>,
    /// Average temperature, e.g. `17°F`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_temp: Option<String>,
}

impl RawMessage {
    /// Create a message with only the required fields set
    #[must_use]
    pub fn new(author: impl Into<String>, category: Category, text: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            category,
            text: text.into(),
            timestamp: None,
            sentiment_hint: None,
            keyword_mentioned: None,
            message_length: None,
            season: None,
            average_temp: None,
        }
    }

    /// Parse one log line or broker payload
    pub fn from_json_line(line: &str) -> Result<Self> {
        Ok(serde_json::from_str(line.trim())?)
    }

    /// Serialize to a single line without a trailing newline
    pub fn to_json_line(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Sentiment derived from one raw message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    /// Name of the person posting
    pub author: String,
    /// Activity the message is about
    pub category: Category,
    /// Keyword score in `[-1, 1]`
    pub sentiment_score: f64,
    /// Message timestamp, or processing time when the message had none
    pub timestamp: NaiveDateTime,
}

/// A score record as read back from the store
#[derive(Debug, Clone, PartialEq)]
pub struct StoredScore {
    /// Auto-generated row id
    pub id: i64,
    /// The stored record
    pub record: ScoreRecord,
}

/// Aggregated scores for one category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySummary {
    /// Category the row aggregates
    pub category: Category,
    /// Number of stored scores
    pub count: u64,
    /// Mean score
    pub average_score: f64,
    /// Lowest score
    pub min_score: f64,
    /// Highest score
    pub max_score: f64,
}

mod timestamp_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::TIMESTAMP_FORMAT;

    pub(super) fn serialize<S: Serializer>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(ts) => serializer.serialize_str(&ts.format(TIMESTAMP_FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|s| NaiveDateTime::parse_from_str(&s, TIMESTAMP_FORMAT).map_err(serde::de::Error::custom))
            .transpose()
    }
}
