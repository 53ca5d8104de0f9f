//! Storage capability for the prompt catalog.
//!
//! Everything above this module talks to a [`PromptStore`]. The concrete
//! backend is picked once, by [`open_store`], when a session starts.

mod loro_store;
mod memory_store;

pub use loro_store::LoroStore;
pub use memory_store::{default_taxonomy, MemoryStore};

use std::path::Path;

use uuid::Uuid;

use crate::config::BackendChoice;
use crate::entity::{validation, Color, Prompt, TaxonomyItem, TaxonomyKind};
use crate::error::{PromptshelfError, Result};

pub const SHELF_DIR: &str = ".promptshelf";

/// Which backend a store is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Loro,
    Memory,
}

impl StoreBackend {
    /// Whether writes survive the process.
    pub fn is_persistent(&self) -> bool {
        matches!(self, StoreBackend::Loro)
    }
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreBackend::Loro => write!(f, "loro"),
            StoreBackend::Memory => write!(f, "memory"),
        }
    }
}

/// Update payload for a prompt
#[derive(Debug, Default, Clone)]
pub struct PromptUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<Option<String>>, // Some(None) to clear
    pub prompt_type: Option<Option<String>>, // Some(None) to clear
    pub favorite: Option<bool>,
    /// Replace the whole tag list before add/remove are applied
    pub set_tags: Option<Vec<String>>,
    pub add_tags: Vec<String>,
    pub remove_tags: Vec<String>,
}

impl PromptUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.category.is_none()
            && self.prompt_type.is_none()
            && self.favorite.is_none()
            && self.set_tags.is_none()
            && self.add_tags.is_empty()
            && self.remove_tags.is_empty()
    }

    pub fn touches_tags(&self) -> bool {
        self.set_tags.is_some() || !self.add_tags.is_empty() || !self.remove_tags.is_empty()
    }

    /// Compute the tag list after this update: replace, then remove, then add.
    pub fn apply_tags(&self, existing: &[String]) -> Vec<String> {
        let base = self.set_tags.as_deref().unwrap_or(existing);
        let mut tags: Vec<String> = base
            .iter()
            .filter(|t| !self.remove_tags.iter().any(|r| r.eq_ignore_ascii_case(t)))
            .cloned()
            .collect();
        for tag in &self.add_tags {
            if !tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
                tags.push(tag.clone());
            }
        }
        tags
    }

    /// Apply this update to an in-memory prompt.
    pub fn apply_to(&self, prompt: &mut Prompt) {
        if let Some(ref title) = self.title {
            prompt.title = title.clone();
        }
        if let Some(ref content) = self.content {
            prompt.content = content.clone();
        }
        if let Some(ref category) = self.category {
            prompt.category = category.clone();
        }
        if let Some(ref prompt_type) = self.prompt_type {
            prompt.prompt_type = prompt_type.clone();
        }
        if let Some(favorite) = self.favorite {
            prompt.favorite = favorite;
        }
        if self.touches_tags() {
            prompt.tags = self.apply_tags(&prompt.tags);
        }
        prompt.updated_at = chrono::Utc::now();
    }
}

/// Update payload for a category, type or tag
#[derive(Debug, Default, Clone)]
pub struct TaxonomyUpdate {
    pub name: Option<String>,
    pub color: Option<Color>,
}

/// Persistence for prompts and their taxonomy.
pub trait PromptStore: Send {
    fn backend(&self) -> StoreBackend;

    /// Persist pending changes. A no-op for stores that keep nothing.
    fn save(&self) -> Result<()>;

    /// Opaque token that changes whenever the stored data changes
    fn version_hash(&self) -> String;

    fn next_sequence_number(&self) -> u32;

    fn add_prompt(&mut self, prompt: &Prompt) -> Result<()>;

    fn get_prompt(&self, id: &Uuid) -> Result<Option<Prompt>>;

    /// All prompts, ordered by sequence number
    fn list_prompts(&self) -> Result<Vec<Prompt>>;

    fn update_prompt(&mut self, id: &Uuid, updates: PromptUpdate) -> Result<Prompt>;

    fn delete_prompt(&mut self, id: &Uuid) -> Result<()>;

    fn add_taxonomy(&mut self, item: &TaxonomyItem) -> Result<()>;

    /// All items of a kind, ordered by name
    fn list_taxonomy(&self, kind: TaxonomyKind) -> Result<Vec<TaxonomyItem>>;

    fn update_taxonomy(
        &mut self,
        kind: TaxonomyKind,
        id: &Uuid,
        updates: TaxonomyUpdate,
    ) -> Result<TaxonomyItem>;

    fn delete_taxonomy(&mut self, kind: TaxonomyKind, id: &Uuid) -> Result<()>;

    /// Find a prompt by sequence number ("3") or UUID prefix ("a1b2c").
    fn resolve_prompt(&self, id: &str) -> Result<Prompt> {
        let id = id.trim();
        let prompts = self.list_prompts()?;

        if let Ok(seq) = id.parse::<u32>() {
            if let Some(p) = prompts.iter().find(|p| p.sequence_number == seq) {
                return Ok(p.clone());
            }
        }

        if id.len() < validation::MIN_ID_PREFIX_LENGTH {
            return Err(PromptshelfError::PromptNotFound(id.to_string()));
        }

        let needle = id.to_lowercase();
        let mut matches = prompts
            .into_iter()
            .filter(|p| p.id.to_string().starts_with(&needle));
        match (matches.next(), matches.next()) {
            (Some(p), None) => Ok(p),
            (Some(_), Some(_)) => Err(PromptshelfError::Validation(format!(
                "ID prefix '{}' is ambiguous",
                id
            ))),
            _ => Err(PromptshelfError::PromptNotFound(id.to_string())),
        }
    }

    /// Find a taxonomy item by name (case-insensitive) or UUID prefix.
    fn resolve_taxonomy(&self, kind: TaxonomyKind, id_or_name: &str) -> Result<TaxonomyItem> {
        let items = self.list_taxonomy(kind)?;
        if let Some(item) = items.iter().find(|i| i.matches_name(id_or_name)) {
            return Ok(item.clone());
        }

        let not_found = || PromptshelfError::TaxonomyNotFound {
            kind: kind.to_string(),
            id: id_or_name.to_string(),
        };

        let needle = id_or_name.trim().to_lowercase();
        if needle.len() < validation::MIN_ID_PREFIX_LENGTH {
            return Err(not_found());
        }

        let mut matches = items
            .into_iter()
            .filter(|i| i.id.to_string().starts_with(&needle));
        match (matches.next(), matches.next()) {
            (Some(item), None) => Ok(item),
            (Some(_), Some(_)) => Err(PromptshelfError::Validation(format!(
                "ID prefix '{}' is ambiguous",
                id_or_name
            ))),
            _ => Err(not_found()),
        }
    }
}

/// Open the store selected by `choice` for the library rooted at `root`.
pub fn open_store(root: &Path, choice: BackendChoice) -> Result<Box<dyn PromptStore>> {
    match choice {
        BackendChoice::Loro => Ok(Box::new(LoroStore::open(root)?)),
        BackendChoice::Memory => {
            tracing::debug!("using in-memory sample library");
            Ok(Box::new(MemoryStore::with_sample_data()))
        }
        BackendChoice::Auto => {
            if LoroStore::exists(root) {
                Ok(Box::new(LoroStore::open(root)?))
            } else {
                tracing::warn!(
                    root = %root.display(),
                    "no prompt library found, using in-memory sample data; changes will not be saved"
                );
                Ok(Box::new(MemoryStore::with_sample_data()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_apply_tags_add_remove() {
        let update = PromptUpdate {
            add_tags: tags(&["new", "SEO"]),
            remove_tags: tags(&["old"]),
            ..Default::default()
        };
        let result = update.apply_tags(&tags(&["seo", "old", "keep"]));
        assert_eq!(result, tags(&["seo", "keep", "new"]));
    }

    #[test]
    fn test_apply_tags_replace_first() {
        let update = PromptUpdate {
            set_tags: Some(tags(&["a", "b"])),
            remove_tags: tags(&["b"]),
            add_tags: tags(&["c"]),
            ..Default::default()
        };
        assert_eq!(update.apply_tags(&tags(&["x"])), tags(&["a", "c"]));
    }

    #[test]
    fn test_update_is_empty() {
        assert!(PromptUpdate::default().is_empty());
        let update = PromptUpdate {
            favorite: Some(true),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }

    #[test]
    fn test_resolve_prompt_by_sequence_and_prefix() {
        let mut store = MemoryStore::new();
        let prompt = Prompt::new("One".to_string(), "c".to_string(), 1);
        store.add_prompt(&prompt).unwrap();

        assert_eq!(store.resolve_prompt("1").unwrap().id, prompt.id);
        assert_eq!(store.resolve_prompt(&prompt.short_id()).unwrap().id, prompt.id);
        assert!(matches!(
            store.resolve_prompt("2"),
            Err(PromptshelfError::PromptNotFound(_))
        ));
        assert!(store.resolve_prompt("ab").is_err());
    }

    #[test]
    fn test_resolve_taxonomy_by_name() {
        let mut store = MemoryStore::new();
        let item = TaxonomyItem::new(TaxonomyKind::Category, "Coding".to_string(), Color::Blue);
        store.add_taxonomy(&item).unwrap();

        let found = store.resolve_taxonomy(TaxonomyKind::Category, "coding").unwrap();
        assert_eq!(found.id, item.id);
        assert!(store.resolve_taxonomy(TaxonomyKind::Type, "coding").is_err());
    }

    #[test]
    fn test_resolve_taxonomy_rejects_ambiguous_prefix() {
        let mut store = MemoryStore::new();
        for (id, name) in [
            ("aaaa0000-0000-4000-8000-000000000001", "first"),
            ("aaaa1111-0000-4000-8000-000000000002", "second"),
        ] {
            let mut item = TaxonomyItem::new(TaxonomyKind::Tag, name.to_string(), Color::Slate);
            item.id = Uuid::parse_str(id).unwrap();
            store.add_taxonomy(&item).unwrap();
        }

        assert!(matches!(
            store.resolve_taxonomy(TaxonomyKind::Tag, "aaaa"),
            Err(PromptshelfError::Validation(_))
        ));
        let found = store.resolve_taxonomy(TaxonomyKind::Tag, "aaaa1").unwrap();
        assert_eq!(found.name, "second");
        assert!(matches!(
            store.resolve_taxonomy(TaxonomyKind::Tag, "bbbb"),
            Err(PromptshelfError::TaxonomyNotFound { .. })
        ));
    }

    #[test]
    fn test_open_store_auto_falls_back_to_memory() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(tmp.path(), BackendChoice::Auto).unwrap();
        assert_eq!(store.backend(), StoreBackend::Memory);
        assert!(!store.list_prompts().unwrap().is_empty());
    }

    #[test]
    fn test_open_store_auto_prefers_loro() {
        let tmp = TempDir::new().unwrap();
        LoroStore::init(tmp.path()).unwrap();
        let store = open_store(tmp.path(), BackendChoice::Auto).unwrap();
        assert_eq!(store.backend(), StoreBackend::Loro);
    }

    #[test]
    fn test_open_store_loro_requires_init() {
        let tmp = TempDir::new().unwrap();
        let result = open_store(tmp.path(), BackendChoice::Loro);
        assert!(matches!(result, Err(PromptshelfError::NotInitialized)));
    }
}
