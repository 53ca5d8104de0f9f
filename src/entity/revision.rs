use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Prompt;

/// Snapshot of a prompt's editable fields, taken before an update.
///
/// Revisions live only as long as the session that recorded them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Revision {
    pub number: u32,
    pub title: String,
    pub content: String,
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub prompt_type: Option<String>,
    pub tags: Vec<String>,
    pub recorded_at: DateTime<Utc>,
}

impl Revision {
    pub fn of(prompt: &Prompt, number: u32) -> Self {
        Self {
            number,
            title: prompt.title.clone(),
            content: prompt.content.clone(),
            category: prompt.category.clone(),
            prompt_type: prompt.prompt_type.clone(),
            tags: prompt.tags.clone(),
            recorded_at: Utc::now(),
        }
    }
}
