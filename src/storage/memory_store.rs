//! In-memory store.
//!
//! Used when no library has been initialized. Nothing written here survives
//! the process.

use std::collections::BTreeMap;

use uuid::Uuid;

use super::{PromptStore, PromptUpdate, StoreBackend, TaxonomyUpdate};
use crate::entity::{Color, Prompt, TaxonomyItem, TaxonomyKind};
use crate::error::{PromptshelfError, Result};

/// Categories offered by a fresh library.
pub const DEFAULT_CATEGORIES: &[(&str, Color)] = &[
    ("Psychology", Color::Purple),
    ("Marketing", Color::Orange),
    ("Business", Color::Blue),
    ("Copywriting", Color::Pink),
    ("Coding", Color::Green),
];

/// Prompt types offered by a fresh library.
pub const DEFAULT_TYPES: &[(&str, Color)] = &[
    ("Partial prompt", Color::Slate),
    ("Prompt template", Color::Teal),
    ("System prompt", Color::Indigo),
];

struct SamplePrompt {
    title: &'static str,
    content: &'static str,
    category: &'static str,
    prompt_type: &'static str,
    tags: &'static [&'static str],
}

const SAMPLE_PROMPTS: &[SamplePrompt] = &[
    SamplePrompt {
        title: "YouTube title generator",
        content: "Act as a YouTube expert. Generate 10 clickbait but honest titles for a video about {{topic}}. Titles must stay under 60 characters and include emotional keywords.",
        category: "Marketing",
        prompt_type: "Prompt template",
        tags: &["youtube"],
    },
    SamplePrompt {
        title: "Review sentiment analysis",
        content: "Analyze the following reviews and sort them into Positive, Negative or Neutral. For each group, extract the recurring themes.\n\nReviews:\n{{reviews}}",
        category: "Business",
        prompt_type: "System prompt",
        tags: &[],
    },
    SamplePrompt {
        title: "Explain complex concepts",
        content: "Explain {{concept}} as if I were 5 years old. Use simple analogies from everyday life.",
        category: "Psychology",
        prompt_type: "Partial prompt",
        tags: &["teaching"],
    },
];

/// Taxonomy records a fresh library starts with.
pub fn default_taxonomy() -> Vec<TaxonomyItem> {
    let categories = DEFAULT_CATEGORIES
        .iter()
        .map(|(name, color)| TaxonomyItem::new(TaxonomyKind::Category, name.to_string(), *color));
    let types = DEFAULT_TYPES
        .iter()
        .map(|(name, color)| TaxonomyItem::new(TaxonomyKind::Type, name.to_string(), *color));
    categories.chain(types).collect()
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    prompts: BTreeMap<Uuid, Prompt>,
    taxonomy: BTreeMap<Uuid, TaxonomyItem>,
    sequence: u32,
    revision: u64,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store preloaded with default taxonomy and a few example prompts.
    pub fn with_sample_data() -> Self {
        let mut store = Self::new();
        for item in default_taxonomy() {
            store.taxonomy.insert(item.id, item);
        }

        let mut tag_names: Vec<&str> = Vec::new();
        for sample in SAMPLE_PROMPTS {
            let seq = store.next_sequence_number();
            let mut prompt = Prompt::new(sample.title.to_string(), sample.content.to_string(), seq);
            prompt.category = Some(sample.category.to_string());
            prompt.prompt_type = Some(sample.prompt_type.to_string());
            prompt.tags = sample.tags.iter().map(|t| t.to_string()).collect();
            tag_names.extend(sample.tags.iter().copied());
            store.sequence = seq;
            store.prompts.insert(prompt.id, prompt);
        }
        for name in tag_names {
            let tag = TaxonomyItem::new(TaxonomyKind::Tag, name.to_string(), Color::default());
            store.taxonomy.insert(tag.id, tag);
        }

        store
    }

    fn bump(&mut self) {
        self.revision += 1;
    }
}

impl PromptStore for MemoryStore {
    fn backend(&self) -> StoreBackend {
        StoreBackend::Memory
    }

    fn save(&self) -> Result<()> {
        Ok(())
    }

    fn version_hash(&self) -> String {
        format!("memory:{}", self.revision)
    }

    fn next_sequence_number(&self) -> u32 {
        self.sequence + 1
    }

    fn add_prompt(&mut self, prompt: &Prompt) -> Result<()> {
        self.sequence = self.sequence.max(prompt.sequence_number);
        self.prompts.insert(prompt.id, prompt.clone());
        self.bump();
        Ok(())
    }

    fn get_prompt(&self, id: &Uuid) -> Result<Option<Prompt>> {
        Ok(self.prompts.get(id).cloned())
    }

    fn list_prompts(&self) -> Result<Vec<Prompt>> {
        let mut prompts: Vec<Prompt> = self.prompts.values().cloned().collect();
        prompts.sort_by_key(|p| p.sequence_number);
        Ok(prompts)
    }

    fn update_prompt(&mut self, id: &Uuid, updates: PromptUpdate) -> Result<Prompt> {
        let prompt = self
            .prompts
            .get_mut(id)
            .ok_or_else(|| PromptshelfError::PromptNotFound(id.to_string()))?;
        updates.apply_to(prompt);
        let updated = prompt.clone();
        self.bump();
        Ok(updated)
    }

    fn delete_prompt(&mut self, id: &Uuid) -> Result<()> {
        if self.prompts.remove(id).is_none() {
            return Err(PromptshelfError::PromptNotFound(id.to_string()));
        }
        self.bump();
        Ok(())
    }

    fn add_taxonomy(&mut self, item: &TaxonomyItem) -> Result<()> {
        self.taxonomy.insert(item.id, item.clone());
        self.bump();
        Ok(())
    }

    fn list_taxonomy(&self, kind: TaxonomyKind) -> Result<Vec<TaxonomyItem>> {
        let mut items: Vec<TaxonomyItem> = self
            .taxonomy
            .values()
            .filter(|i| i.kind == kind)
            .cloned()
            .collect();
        items.sort_by_key(|i| i.name.to_lowercase());
        Ok(items)
    }

    fn update_taxonomy(
        &mut self,
        kind: TaxonomyKind,
        id: &Uuid,
        updates: TaxonomyUpdate,
    ) -> Result<TaxonomyItem> {
        let item = self
            .taxonomy
            .get_mut(id)
            .filter(|i| i.kind == kind)
            .ok_or_else(|| PromptshelfError::TaxonomyNotFound {
                kind: kind.to_string(),
                id: id.to_string(),
            })?;
        if let Some(name) = updates.name {
            item.name = name;
        }
        if let Some(color) = updates.color {
            item.color = color;
        }
        let updated = item.clone();
        self.bump();
        Ok(updated)
    }

    fn delete_taxonomy(&mut self, kind: TaxonomyKind, id: &Uuid) -> Result<()> {
        match self.taxonomy.get(id) {
            Some(item) if item.kind == kind => {
                self.taxonomy.remove(id);
                self.bump();
                Ok(())
            }
            _ => Err(PromptshelfError::TaxonomyNotFound {
                kind: kind.to_string(),
                id: id.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_data_is_consistent() {
        let store = MemoryStore::with_sample_data();
        let prompts = store.list_prompts().unwrap();
        assert_eq!(prompts.len(), SAMPLE_PROMPTS.len());
        assert_eq!(store.next_sequence_number(), prompts.len() as u32 + 1);

        let categories = store.list_taxonomy(TaxonomyKind::Category).unwrap();
        let types = store.list_taxonomy(TaxonomyKind::Type).unwrap();
        for prompt in &prompts {
            assert!(prompt.has_variables());
            let category = prompt.category.as_deref().unwrap();
            assert!(categories.iter().any(|c| c.name == category));
            let prompt_type = prompt.prompt_type.as_deref().unwrap();
            assert!(types.iter().any(|t| t.name == prompt_type));
        }
    }

    #[test]
    fn test_version_changes_on_write() {
        let mut store = MemoryStore::new();
        let before = store.version_hash();
        let prompt = Prompt::new("t".to_string(), "c".to_string(), 1);
        store.add_prompt(&prompt).unwrap();
        assert_ne!(store.version_hash(), before);
    }

    #[test]
    fn test_update_and_delete_prompt() {
        let mut store = MemoryStore::new();
        let prompt = Prompt::new("t".to_string(), "c".to_string(), 1);
        store.add_prompt(&prompt).unwrap();

        let updated = store
            .update_prompt(
                &prompt.id,
                PromptUpdate {
                    title: Some("new".to_string()),
                    favorite: Some(true),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.title, "new");
        assert!(updated.favorite);

        store.delete_prompt(&prompt.id).unwrap();
        assert!(store.get_prompt(&prompt.id).unwrap().is_none());
        assert!(store.delete_prompt(&prompt.id).is_err());
    }

    #[test]
    fn test_taxonomy_kind_is_checked() {
        let mut store = MemoryStore::new();
        let tag = TaxonomyItem::new(TaxonomyKind::Tag, "seo".to_string(), Color::Red);
        store.add_taxonomy(&tag).unwrap();

        assert!(store.delete_taxonomy(TaxonomyKind::Category, &tag.id).is_err());
        assert!(store
            .update_taxonomy(TaxonomyKind::Type, &tag.id, TaxonomyUpdate::default())
            .is_err());
        store.delete_taxonomy(TaxonomyKind::Tag, &tag.id).unwrap();
        assert!(store.list_taxonomy(TaxonomyKind::Tag).unwrap().is_empty());
    }
}
