// src/entity/prompt.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::template;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prompt {
    pub id: Uuid,
    pub sequence_number: u32,
    pub title: String,
    /// Prompt text, may contain {{variable}} placeholders
    pub content: String,
    /// Category name
    pub category: Option<String>,
    /// Prompt type name (system prompt, template, ...)
    #[serde(rename = "type")]
    pub prompt_type: Option<String>,
    pub tags: Vec<String>,
    #[serde(default)]
    pub favorite: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Option<String>,
}

impl Prompt {
    pub fn new(title: String, content: String, sequence_number: u32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            sequence_number,
            title,
            content,
            category: None,
            prompt_type: None,
            tags: Vec::new(),
            favorite: false,
            created_at: now,
            updated_at: now,
            created_by: None,
        }
    }

    /// Variables referenced by the content, recomputed on every call.
    pub fn variables(&self) -> Vec<String> {
        template::extract_variables(self.content.as_str())
    }

    pub fn has_variables(&self) -> bool {
        !self.variables().is_empty()
    }

    /// First 7 characters of the UUID, used in listings.
    pub fn short_id(&self) -> String {
        self.id.to_string()[..7].to_string()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

/// Input for creating a prompt. References are resolved by the session.
#[derive(Debug, Clone, Default)]
pub struct NewPrompt {
    pub title: String,
    pub content: String,
    pub category: Option<String>,
    pub prompt_type: Option<String>,
    pub tags: Vec<String>,
    pub favorite: bool,
    pub created_by: Option<String>,
}
