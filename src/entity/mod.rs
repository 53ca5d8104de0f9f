mod prompt;
mod revision;
mod taxonomy;

pub use prompt::{NewPrompt, Prompt};
pub use revision::Revision;
pub use taxonomy::{Color, TaxonomyItem, TaxonomyKind, COLOR_PALETTE};

/// Limits applied where data enters the library.
pub mod validation {
    pub const MAX_TITLE_LENGTH: usize = 500;
    pub const MAX_CONTENT_SIZE: usize = 102_400; // 100KB
    pub const MAX_NAME_LENGTH: usize = 100;
    pub const MAX_TAGS_COUNT: usize = 50;
    pub const MIN_ID_PREFIX_LENGTH: usize = 4;
}

use crate::error::{PromptshelfError, Result};

/// Trim and check a prompt title.
pub fn validate_title(title: &str) -> Result<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(PromptshelfError::Validation("title is required".to_string()));
    }
    let len = title.chars().count();
    if len > validation::MAX_TITLE_LENGTH {
        return Err(PromptshelfError::Validation(format!(
            "title too long: {} characters (max {})",
            len,
            validation::MAX_TITLE_LENGTH
        )));
    }
    Ok(title.to_string())
}

/// Check prompt content. Content is kept verbatim, but must not be blank.
pub fn validate_content(content: &str) -> Result<()> {
    if content.trim().is_empty() {
        return Err(PromptshelfError::Validation("content is required".to_string()));
    }
    if content.len() > validation::MAX_CONTENT_SIZE {
        return Err(PromptshelfError::Validation(format!(
            "content too large: {} bytes (max {})",
            content.len(),
            validation::MAX_CONTENT_SIZE
        )));
    }
    Ok(())
}

/// Trim and check a category, type or tag name.
pub fn validate_name(kind: TaxonomyKind, name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(PromptshelfError::Validation(format!("{} name is required", kind)));
    }
    if name.chars().count() > validation::MAX_NAME_LENGTH {
        return Err(PromptshelfError::Validation(format!(
            "{} name too long (max {} characters)",
            kind,
            validation::MAX_NAME_LENGTH
        )));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_title_trims() {
        assert_eq!(validate_title("  Hello  ").unwrap(), "Hello");
    }

    #[test]
    fn test_validate_title_rejects_blank_and_long() {
        assert!(validate_title("   ").is_err());
        let long = "x".repeat(validation::MAX_TITLE_LENGTH + 1);
        assert!(validate_title(&long).is_err());
    }

    #[test]
    fn test_validate_content() {
        assert!(validate_content("Summarize {{text}}").is_ok());
        assert!(validate_content(" \n ").is_err());
        let big = "x".repeat(validation::MAX_CONTENT_SIZE + 1);
        assert!(validate_content(&big).is_err());
    }

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name(TaxonomyKind::Tag, " seo ").unwrap(), "seo");
        let err = validate_name(TaxonomyKind::Category, "").unwrap_err();
        assert!(err.to_string().contains("category name is required"));
    }
}
