//! Prompt filtering and search query parsing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::Prompt;

/// Value that means "no filter" for category and type.
pub const ALL: &str = "all";

/// Constraints a prompt must satisfy to be listed.
///
/// Used both by `list` and by the inline filters of a search query:
/// - `category:marketing` - Filter by category
/// - `type:system_prompt` - Filter by type (underscores stand for spaces)
/// - `tag:seo` - Filter by tag (can specify multiple, all must match)
/// - `is:favorite` - Only favorites
/// - `created:>2025-01-01` - Created after date
/// - `created:<2025-12-31` - Created before date
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptFilter {
    pub category: Option<String>,
    pub prompt_type: Option<String>,
    /// Prompt must have all of these tags
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub favorites_only: bool,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
}

impl PromptFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the category constraint; `"all"` or blank clears it.
    pub fn with_category(mut self, category: Option<&str>) -> Self {
        self.category = normalize(category);
        self
    }

    /// Set the type constraint; `"all"` or blank clears it.
    pub fn with_type(mut self, prompt_type: Option<&str>) -> Self {
        self.prompt_type = normalize(prompt_type);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(
            tags.into_iter()
                .map(Into::into)
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
        );
        self
    }

    pub fn favorites(mut self, favorites_only: bool) -> Self {
        self.favorites_only = favorites_only;
        self
    }

    /// Check if filter has any constraints.
    pub fn is_empty(&self) -> bool {
        self.category.is_none()
            && self.prompt_type.is_none()
            && self.tags.is_empty()
            && !self.favorites_only
            && self.created_after.is_none()
            && self.created_before.is_none()
    }

    /// Names are compared case-insensitively.
    pub fn matches(&self, prompt: &Prompt) -> bool {
        if let Some(ref category) = self.category {
            match prompt.category {
                Some(ref c) if c.eq_ignore_ascii_case(category) => {}
                _ => return false,
            }
        }
        if let Some(ref prompt_type) = self.prompt_type {
            match prompt.prompt_type {
                Some(ref t) if t.eq_ignore_ascii_case(prompt_type) => {}
                _ => return false,
            }
        }
        if !self.tags.iter().all(|tag| prompt.has_tag(tag)) {
            return false;
        }
        if self.favorites_only && !prompt.favorite {
            return false;
        }
        if let Some(after) = self.created_after {
            if prompt.created_at <= after {
                return false;
            }
        }
        if let Some(before) = self.created_before {
            if prompt.created_at >= before {
                return false;
            }
        }
        true
    }
}

fn normalize(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case(ALL))
        .map(str::to_string)
}

/// Parse a raw query string into (remaining query text, filters).
///
/// # Examples
///
/// ```
/// use promptshelf::search::parse_query;
///
/// let (query, filter) = parse_query("category:marketing is:favorite youtube titles");
/// assert_eq!(query, "youtube titles");
/// assert_eq!(filter.category, Some("marketing".to_string()));
/// assert!(filter.favorites_only);
/// ```
pub fn parse_query(raw: &str) -> (String, PromptFilter) {
    let mut filter = PromptFilter::default();
    let mut remaining = Vec::new();

    for token in raw.split_whitespace() {
        if let Some(value) = token.strip_prefix("category:") {
            filter.category = normalize(Some(&value.replace('_', " ")));
        } else if let Some(value) = token.strip_prefix("type:") {
            filter.prompt_type = normalize(Some(&value.replace('_', " ")));
        } else if let Some(value) = token.strip_prefix("tag:") {
            if !value.is_empty() {
                filter.tags.push(value.to_string());
            }
        } else if token.eq_ignore_ascii_case("is:favorite") || token.eq_ignore_ascii_case("is:fav") {
            filter.favorites_only = true;
        } else if let Some(value) = token.strip_prefix("created:>") {
            filter.created_after = parse_date(value);
        } else if let Some(value) = token.strip_prefix("created:<") {
            filter.created_before = parse_date(value);
        } else {
            remaining.push(token);
        }
    }

    (remaining.join(" "), filter)
}

/// Turn free text into an FTS5 MATCH expression.
///
/// Every word becomes a quoted string so FTS5 operators and punctuation in
/// user input are matched as text. Words are ANDed. Returns `None` when
/// nothing searchable is left.
pub fn fts_query(text: &str) -> Option<String> {
    let terms: Vec<String> = text
        .split_whitespace()
        .map(|word| word.replace('"', "\"\""))
        .filter(|word| word.chars().any(char::is_alphanumeric))
        .map(|word| format!("\"{}\"", word))
        .collect();

    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" "))
    }
}

/// Parse a date string into DateTime<Utc>.
/// Supports ISO 8601 date format (YYYY-MM-DD) or full datetime.
fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    // Date only, midnight UTC
    if let Ok(date) = chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        let datetime = date.and_hms_opt(0, 0, 0)?;
        return Some(DateTime::from_naive_utc_and_offset(datetime, Utc));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    fn prompt_with(category: Option<&str>, tags: &[&str], favorite: bool) -> Prompt {
        let mut p = Prompt::new("t".to_string(), "c".to_string(), 1);
        p.category = category.map(str::to_string);
        p.tags = tags.iter().map(|t| t.to_string()).collect();
        p.favorite = favorite;
        p
    }

    #[test]
    fn test_parse_query_no_filters() {
        let (query, filter) = parse_query("hello world");
        assert_eq!(query, "hello world");
        assert!(filter.is_empty());
    }

    #[test]
    fn test_parse_query_category_and_type() {
        let (query, filter) = parse_query("category:Marketing type:prompt_template titles");
        assert_eq!(query, "titles");
        assert_eq!(filter.category, Some("Marketing".to_string()));
        assert_eq!(filter.prompt_type, Some("prompt template".to_string()));
    }

    #[test]
    fn test_parse_query_all_means_no_filter() {
        let (_, filter) = parse_query("category:all type:ALL");
        assert!(filter.is_empty());
    }

    #[test]
    fn test_parse_query_multiple_tags_and_favorite() {
        let (query, filter) = parse_query("tag:seo tag:youtube is:favorite search term");
        assert_eq!(query, "search term");
        assert_eq!(filter.tags, vec!["seo".to_string(), "youtube".to_string()]);
        assert!(filter.favorites_only);
    }

    #[test]
    fn test_parse_query_date_filters() {
        let (query, filter) = parse_query("created:>2025-01-01 created:<2025-12-31 test");
        assert_eq!(query, "test");
        assert!(filter.created_after.is_some());
        assert!(filter.created_before.is_some());
    }

    #[test]
    fn test_parse_query_only_filters() {
        let (query, filter) = parse_query("tag:seo");
        assert_eq!(query, "");
        assert!(!filter.is_empty());
    }

    #[test]
    fn test_parse_date_iso() {
        let dt = parse_date("2025-06-15").unwrap();
        assert_eq!(dt.year(), 2025);
        assert_eq!(dt.month(), 6);
        assert_eq!(dt.day(), 15);
    }

    #[test]
    fn test_parse_date_invalid() {
        assert!(parse_date("not-a-date").is_none());
    }

    #[test]
    fn test_filter_matches_category_case_insensitive() {
        let filter = PromptFilter::new().with_category(Some("marketing"));
        assert!(filter.matches(&prompt_with(Some("Marketing"), &[], false)));
        assert!(!filter.matches(&prompt_with(Some("Coding"), &[], false)));
        assert!(!filter.matches(&prompt_with(None, &[], false)));
    }

    #[test]
    fn test_filter_requires_all_tags() {
        let filter = PromptFilter::new().with_tags(["seo", "youtube"]);
        assert!(filter.matches(&prompt_with(None, &["YouTube", "seo", "extra"], false)));
        assert!(!filter.matches(&prompt_with(None, &["seo"], false)));
    }

    #[test]
    fn test_filter_favorites() {
        let filter = PromptFilter::new().favorites(true);
        assert!(filter.matches(&prompt_with(None, &[], true)));
        assert!(!filter.matches(&prompt_with(None, &[], false)));
    }

    #[test]
    fn test_filter_created_window() {
        let p = prompt_with(None, &[], false);
        let (_, past) = parse_query("created:>2000-01-01");
        assert!(past.matches(&p));
        let (_, before_past) = parse_query("created:<2000-01-01");
        assert!(!before_past.matches(&p));
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        assert!(PromptFilter::new()
            .with_category(Some("all"))
            .matches(&prompt_with(Some("Coding"), &["x"], true)));
    }

    #[test]
    fn test_fts_query_quotes_terms() {
        assert_eq!(fts_query("youtube titles").unwrap(), "\"youtube\" \"titles\"");
        assert_eq!(fts_query("say \"hi\"").unwrap(), "\"say\" \"\"\"hi\"\"\"");
        assert_eq!(fts_query("NOT AND").unwrap(), "\"NOT\" \"AND\"");
    }

    #[test]
    fn test_fts_query_empty() {
        assert!(fts_query("").is_none());
        assert!(fts_query("  - * ").is_none());
    }
}
