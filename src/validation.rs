use crate::error::{PipelineError, Result};
use crate::models::RawMessage;

/// Longest accepted author name
pub const MAX_AUTHOR_LEN: usize = 100;
/// Longest accepted message text
pub const MAX_TEXT_LEN: usize = 2000;

/// Validation utilities for parsed messages and connection settings
#[derive(Debug, Copy, Clone)]
pub struct InputValidator;

impl InputValidator {
    /// Check every field of a parsed message
    pub fn validate_message(message: &RawMessage) -> Result<()> {
        Self::validate_author(&message.author)?;
        Self::validate_text(&message.text)?;
        if let Some(hint) = message.sentiment_hint {
            Self::validate_sentiment_hint(hint)?;
        }
        Ok(())
    }

    /// Validate author name
    pub fn validate_author(author: &str) -> Result<()> {
        if author.trim().is_empty() {
            return Err(invalid("author cannot be empty"));
        }

        if author.chars().count() > MAX_AUTHOR_LEN {
            return Err(invalid(format!("author too long (max {MAX_AUTHOR_LEN} characters)")));
        }

        if author.chars().any(char::is_control) {
            return Err(invalid("author contains control characters"));
        }

        Ok(())
    }

    /// Validate message text
    pub fn validate_text(text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Err(invalid("text cannot be empty"));
        }

        if text.chars().count() > MAX_TEXT_LEN {
            return Err(invalid(format!("text too long (max {MAX_TEXT_LEN} characters)")));
        }

        Ok(())
    }

    /// Producer hints live in `[0, 1]`
    pub fn validate_sentiment_hint(hint: f64) -> Result<()> {
        if !hint.is_finite() || !(0.0..=1.0).contains(&hint) {
            return Err(invalid(format!("sentiment hint {hint} outside [0, 1]")));
        }
        Ok(())
    }

    /// Validate a `host:port` broker address
    pub fn validate_broker_address(address: &str) -> Result<()> {
        let Some((host, port)) = address.trim().rsplit_once(':') else {
            return Err(PipelineError::InvalidConfig(format!(
                "broker address {address:?} must be host:port"
            )));
        };

        if host.is_empty() {
            return Err(PipelineError::InvalidConfig(format!("broker address {address:?} has no host")));
        }

        match port.parse::<u16>() {
            Ok(p) if p > 0 => Ok(()),
            _ => Err(PipelineError::InvalidConfig(format!("broker address {address:?} has an invalid port"))),
        }
    }

    /// Validate a Kafka topic name
    pub fn validate_topic(topic: &str) -> Result<()> {
        if topic.is_empty() || topic.len() > 249 {
            return Err(PipelineError::InvalidConfig("topic must be 1-249 characters".to_string()));
        }

        if !topic
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_')
        {
            return Err(PipelineError::InvalidConfig(format!("topic {topic:?} contains invalid characters")));
        }

        Ok(())
    }
}

fn invalid(reason: impl Into<String>) -> PipelineError {
    PipelineError::InvalidMessage(reason.into())
}
