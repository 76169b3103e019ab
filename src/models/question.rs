use chrono::{DateTime, Duration, Utc};
use nanoid::nanoid;
use serde::{Deserialize, Serialize};

use crate::errors::StoreError;

/// Hard cap on question and choice text, matching the schema's column width.
pub const MAX_TEXT_LEN: usize = 200;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Question {
    #[serde(rename = "_id")]
    pub id: String,
    pub question_text: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub pub_date: DateTime<Utc>,
}

impl Question {
    pub fn new(question_text: String, pub_date: DateTime<Utc>) -> Self {
        Question {
            id: nanoid!(),
            question_text,
            pub_date,
        }
    }

    /// True when the question was published within the last day. Future
    /// publication dates do not count as recent.
    pub fn was_published_recently(&self) -> bool {
        let now = Utc::now();
        now - Duration::days(1) <= self.pub_date && self.pub_date <= now
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Choice {
    #[serde(rename = "_id")]
    pub id: String,
    pub question_id: String,
    pub choice_text: String,
    pub votes: i64,
    /// When the choice was added; choice listings sort on this.
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub inserted_at: DateTime<Utc>,
}

impl Choice {
    pub fn new(question_id: &str, choice_text: String) -> Self {
        Choice {
            id: nanoid!(),
            question_id: question_id.to_string(),
            choice_text,
            votes: 0,
            inserted_at: Utc::now(),
        }
    }
}

/// Key under which uniqueness is decided. Both store backends and the
/// request-batch check must agree on this, so it lives here.
pub fn uniqueness_key(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Trims the text and rejects it when blank or wider than the column cap.
/// Returns the cleaned text that should actually be stored.
pub fn clean_text(label: &str, raw: &str) -> Result<String, StoreError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(StoreError::InvalidText(format!(
            "{} must not be empty",
            label
        )));
    }
    if text.chars().count() > MAX_TEXT_LEN {
        return Err(StoreError::InvalidText(format!(
            "{} must be at most {} characters",
            label, MAX_TEXT_LEN
        )));
    }
    Ok(text.to_string())
}
