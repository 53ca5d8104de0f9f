//! MCP tool types and helpers.
//!
//! Parameter types, response types and conversion helpers for MCP tools. The
//! tool implementations are in mod.rs within the #[tool_router] impl block.

use std::collections::BTreeMap;

use rmcp::model::{CallToolResult, Content};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::entity::{Color, Prompt, Revision, COLOR_PALETTE, TaxonomyKind};
use crate::mcp::error::{validation, McpError};
use crate::template::Bindings;

// ============================================================================
// Parameter Types
// ============================================================================

/// Parameters for prompt_create tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PromptCreateParams {
    /// Title (required, 1-500 characters)
    pub title: String,
    /// Prompt text; {{name}} marks a variable
    pub content: String,
    /// Existing category name
    pub category: Option<String>,
    /// Existing prompt type name
    #[serde(rename = "type")]
    pub prompt_type: Option<String>,
    /// Tags; unknown tags are created
    pub tags: Option<Vec<String>>,
    /// Mark as favorite
    pub favorite: Option<bool>,
}

/// Parameters for tools addressing a single prompt
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PromptIdParams {
    /// Prompt ID (sequence number like "1" or UUID prefix like "abc123")
    pub id: String,
}

/// Parameters for prompt_list tool
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct PromptListParams {
    /// Filter by category ("all" for no filter)
    pub category: Option<String>,
    /// Filter by prompt type ("all" for no filter)
    #[serde(rename = "type")]
    pub prompt_type: Option<String>,
    /// Only prompts having all of these tags
    pub tags: Option<Vec<String>>,
    /// Only favorites
    pub favorites_only: Option<bool>,
    /// Maximum results (default 50, max 100)
    pub limit: Option<u32>,
    /// Offset for pagination
    pub offset: Option<u32>,
}

/// Parameters for prompt_update tool
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct PromptUpdateParams {
    /// Prompt ID to update
    pub id: String,
    /// New title
    pub title: Option<String>,
    /// New content
    pub content: Option<String>,
    /// New category; an empty string clears it
    pub category: Option<String>,
    /// New prompt type; an empty string clears it
    #[serde(rename = "type")]
    pub prompt_type: Option<String>,
    /// Tags to add
    pub add_tags: Option<Vec<String>>,
    /// Tags to remove
    pub remove_tags: Option<Vec<String>>,
    /// Set the favorite flag
    pub favorite: Option<bool>,
}

/// Parameters for prompt_variables tool. Give either `id` or `content`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct PromptVariablesParams {
    /// Stored prompt ID
    pub id: Option<String>,
    /// Raw prompt text to inspect instead of a stored prompt
    pub content: Option<String>,
}

/// Parameters for prompt_compile tool. Give either `id` or `content`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct PromptCompileParams {
    /// Stored prompt ID
    pub id: Option<String>,
    /// Raw prompt text to compile instead of a stored prompt
    pub content: Option<String>,
    /// Variable values; variables left out are replaced with nothing
    pub values: Option<BTreeMap<String, String>>,
}

/// Parameters for prompt_copy_text tool
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct PromptCopyTextParams {
    /// Prompt ID
    pub id: String,
    /// Variable values. Without values, a legend of the variables is
    /// prepended instead.
    pub values: Option<BTreeMap<String, String>>,
}

/// Parameters for prompt_restore tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PromptRestoreParams {
    /// Prompt ID
    pub id: String,
    /// Revision number from prompt_history
    pub revision: u32,
}

/// Parameters for taxonomy_list tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TaxonomyListParams {
    /// category, type or tag
    pub kind: String,
}

/// Parameters for taxonomy_create tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TaxonomyCreateParams {
    /// category, type or tag
    pub kind: String,
    /// Name, unique within its kind (case-insensitive)
    pub name: String,
    /// Palette color (default slate)
    pub color: Option<String>,
}

/// Parameters for taxonomy_update tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TaxonomyUpdateParams {
    /// category, type or tag
    pub kind: String,
    /// Current name or ID prefix
    pub id: String,
    /// New name; prompts using the old name are updated
    pub name: Option<String>,
    /// New palette color
    pub color: Option<String>,
}

/// Parameters for taxonomy_delete tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TaxonomyDeleteParams {
    /// category, type or tag
    pub kind: String,
    /// Name or ID prefix
    pub id: String,
}

/// Parameters for search_fulltext tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchFulltextParams {
    /// Search query. Supports category:, type:, tag:, is:favorite,
    /// created:>DATE and created:<DATE filters.
    pub query: String,
    /// Maximum results (default 50, max 100)
    pub limit: Option<u32>,
}

// ============================================================================
// Response Types
// ============================================================================

/// A prompt together with its derived variables.
#[derive(Debug, Clone, Serialize)]
pub struct PromptResponse {
    #[serde(flatten)]
    pub prompt: Prompt,
    pub variables: Vec<String>,
}

impl From<Prompt> for PromptResponse {
    fn from(prompt: Prompt) -> Self {
        let variables = prompt.variables();
        Self { prompt, variables }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryResponse {
    pub id: String,
    pub sequence_number: u32,
    pub title: String,
    pub revisions: Vec<Revision>,
}

// ============================================================================
// Helpers
// ============================================================================

pub fn parse_kind(kind: &str) -> Result<TaxonomyKind, McpError> {
    kind.parse().map_err(|_| McpError::InvalidEnumValue {
        field: "kind".to_string(),
        value: kind.to_string(),
        valid: TaxonomyKind::ALL.iter().map(|k| k.to_string()).collect(),
    })
}

pub fn parse_color(color: &str) -> Result<Color, McpError> {
    color.parse().map_err(|_| McpError::InvalidEnumValue {
        field: "color".to_string(),
        value: color.to_string(),
        valid: COLOR_PALETTE.iter().map(|c| c.to_string()).collect(),
    })
}

pub fn to_bindings(values: Option<BTreeMap<String, String>>) -> Option<Bindings> {
    values.map(|v| v.into_iter().collect())
}

/// `Some("")` clears a reference, `Some(name)` sets it, `None` leaves it.
pub fn optional_reference(value: Option<String>) -> Option<Option<String>> {
    value.map(|v| {
        let v = v.trim().to_string();
        if v.is_empty() {
            None
        } else {
            Some(v)
        }
    })
}

pub fn clamp_limit(limit: Option<u32>) -> usize {
    limit
        .map(|l| l as usize)
        .unwrap_or(validation::DEFAULT_LIMIT)
        .clamp(1, validation::MAX_LIMIT)
}

/// Serialize a response as pretty JSON text content.
pub fn json_result<T: Serialize>(response: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(response).map_err(|e| McpError::InternalError {
        message: format!("Failed to serialize response: {}", e),
    })?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kind() {
        assert_eq!(parse_kind("tags").unwrap(), TaxonomyKind::Tag);
        let err = parse_kind("folder").unwrap_err();
        assert!(matches!(err, McpError::InvalidEnumValue { ref valid, .. } if valid.len() == 3));
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("indigo").unwrap(), Color::Indigo);
        assert!(matches!(
            parse_color("magenta"),
            Err(McpError::InvalidEnumValue { .. })
        ));
    }

    #[test]
    fn test_optional_reference() {
        assert_eq!(optional_reference(None), None);
        assert_eq!(optional_reference(Some("  ".to_string())), Some(None));
        assert_eq!(
            optional_reference(Some("Coding".to_string())),
            Some(Some("Coding".to_string()))
        );
    }

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None), validation::DEFAULT_LIMIT);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(1000)), validation::MAX_LIMIT);
    }

    #[test]
    fn test_prompt_response_includes_variables() {
        let prompt = Prompt::new("t".to_string(), "{{a}} and {{b}}".to_string(), 1);
        let json = serde_json::to_value(PromptResponse::from(prompt)).unwrap();
        assert_eq!(json["variables"], serde_json::json!(["a", "b"]));
        assert_eq!(json["title"], "t");
    }
}
