//! The catalog as seen by the CLI and the MCP server.
//!
//! A [`Session`] owns the store, the search cache, the configuration and the
//! revision log. Nothing here is global: each process builds one session and
//! passes it where it is needed.

mod history;

pub use history::RevisionLog;

use std::path::Path;

use serde::Serialize;
use uuid::Uuid;

use crate::cache::SqliteCache;
use crate::clipboard::Clipboard;
use crate::config::ShelfConfig;
use crate::entity::{
    validate_content, validate_name, validate_title, validation, Color, NewPrompt, Prompt,
    Revision, TaxonomyItem, TaxonomyKind,
};
use crate::error::{PromptshelfError, Result};
use crate::search::{fts_query, parse_query, PromptFilter};
use crate::storage::{
    default_taxonomy, open_store, LoroStore, MemoryStore, PromptStore, PromptUpdate,
    StoreBackend, TaxonomyUpdate, SHELF_DIR,
};
use crate::template::{self, Bindings};

/// Rows fetched from the FTS index before inline filters are applied.
const SEARCH_CANDIDATES: usize = 500;

/// A taxonomy change and how many prompts it touched.
#[derive(Debug, Clone, Serialize)]
pub struct Cascade {
    pub item: TaxonomyItem,
    pub prompts_affected: usize,
}

/// One search hit.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub prompt: Prompt,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_highlight: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_snippet: Option<String>,
}

pub struct Session {
    store: Box<dyn PromptStore>,
    cache: SqliteCache,
    revisions: RevisionLog,
    config: ShelfConfig,
}

impl Session {
    /// Open the library rooted at `root`, honouring its config and the
    /// `PROMPTSHELF_BACKEND` override.
    pub fn open(root: &Path) -> Result<Self> {
        let shelf_dir = root.join(SHELF_DIR);
        let mut config = ShelfConfig::load(&shelf_dir)?;
        config.apply_env()?;

        let store = open_store(root, config.storage.backend)?;
        let cache = if store.backend().is_persistent() {
            SqliteCache::open(&shelf_dir)?
        } else {
            SqliteCache::open_in_memory()?
        };

        tracing::debug!(backend = %store.backend(), "session opened");
        Ok(Self::from_parts(store, cache, config))
    }

    /// Create a new library at `root`, optionally seeded with the default
    /// categories and types.
    pub fn init(root: &Path, with_defaults: bool) -> Result<Self> {
        let mut store = LoroStore::init(root)?;
        let shelf_dir = store.shelf_dir().to_path_buf();

        let config = ShelfConfig::default();
        config.write(&shelf_dir)?;

        if with_defaults {
            for item in default_taxonomy() {
                store.add_taxonomy(&item)?;
            }
            store.save()?;
        }

        let cache = SqliteCache::open(&shelf_dir)?;
        tracing::info!(root = %root.display(), with_defaults, "initialized prompt library");
        Ok(Self::from_parts(Box::new(store), cache, config))
    }

    /// Session over an arbitrary store, with a throwaway cache.
    pub fn with_store(store: Box<dyn PromptStore>, config: ShelfConfig) -> Result<Self> {
        let cache = SqliteCache::open_in_memory()?;
        Ok(Self::from_parts(store, cache, config))
    }

    /// Session over the in-memory sample library.
    pub fn sample() -> Result<Self> {
        Self::with_store(Box::new(MemoryStore::with_sample_data()), ShelfConfig::default())
    }

    fn from_parts(store: Box<dyn PromptStore>, cache: SqliteCache, config: ShelfConfig) -> Self {
        let revisions = RevisionLog::new(config.history.max_revisions);
        Self {
            store,
            cache,
            revisions,
            config,
        }
    }

    pub fn backend(&self) -> StoreBackend {
        self.store.backend()
    }

    pub fn is_persistent(&self) -> bool {
        self.store.backend().is_persistent()
    }

    pub fn config(&self) -> &ShelfConfig {
        &self.config
    }

    // Prompts

    pub fn create_prompt(&mut self, input: NewPrompt) -> Result<Prompt> {
        let title = validate_title(&input.title)?;
        validate_content(&input.content)?;

        let category = input
            .category
            .as_deref()
            .map(|name| self.canonical_name(TaxonomyKind::Category, name))
            .transpose()?;
        let prompt_type = input
            .prompt_type
            .as_deref()
            .map(|name| self.canonical_name(TaxonomyKind::Type, name))
            .transpose()?;
        let tags = self.register_tags(&input.tags)?;

        let seq = self.store.next_sequence_number();
        let mut prompt = Prompt::new(title, input.content, seq);
        prompt.category = category;
        prompt.prompt_type = prompt_type;
        prompt.tags = tags;
        prompt.favorite = input.favorite;
        prompt.created_by = input.created_by;

        self.store.add_prompt(&prompt)?;
        self.store.save()?;

        tracing::info!(id = %prompt.id, seq = prompt.sequence_number, "created prompt");
        Ok(prompt)
    }

    /// Look up a prompt by sequence number or UUID prefix.
    pub fn get_prompt(&self, id: &str) -> Result<Prompt> {
        self.store.resolve_prompt(id)
    }

    pub fn list_prompts(&self, filter: &PromptFilter) -> Result<Vec<Prompt>> {
        Ok(self
            .store
            .list_prompts()?
            .into_iter()
            .filter(|p| filter.matches(p))
            .collect())
    }

    /// Apply `updates`, recording the previous state as a revision first.
    pub fn update_prompt(&mut self, id: &str, updates: PromptUpdate) -> Result<Prompt> {
        if updates.is_empty() {
            return Err(PromptshelfError::Validation(
                "no changes specified".to_string(),
            ));
        }
        let existing = self.store.resolve_prompt(id)?;
        let updates = self.check_update(&existing, updates)?;
        self.apply_update(&existing, updates)
    }

    pub fn toggle_favorite(&mut self, id: &str) -> Result<Prompt> {
        let existing = self.store.resolve_prompt(id)?;
        let updated = self.store.update_prompt(
            &existing.id,
            PromptUpdate {
                favorite: Some(!existing.favorite),
                ..Default::default()
            },
        )?;
        self.store.save()?;
        Ok(updated)
    }

    /// Delete permanently. Returns the prompt as it was.
    pub fn delete_prompt(&mut self, id: &str) -> Result<Prompt> {
        let prompt = self.store.resolve_prompt(id)?;
        self.store.delete_prompt(&prompt.id)?;
        self.store.save()?;
        self.revisions.forget(&prompt.id);

        tracing::info!(id = %prompt.id, "deleted prompt");
        Ok(prompt)
    }

    /// Revisions recorded this session, oldest first.
    pub fn history(&self, id: &str) -> Result<(Prompt, Vec<Revision>)> {
        let prompt = self.store.resolve_prompt(id)?;
        let revisions = self.revisions.list(&prompt.id).to_vec();
        Ok((prompt, revisions))
    }

    /// Bring back an earlier revision. The current state is itself recorded,
    /// so a restore can be undone.
    pub fn restore_revision(&mut self, id: &str, number: u32) -> Result<Prompt> {
        let prompt = self.store.resolve_prompt(id)?;
        let revision = self
            .revisions
            .get(&prompt.id, number)
            .cloned()
            .ok_or_else(|| PromptshelfError::RevisionNotFound {
                prompt: id.to_string(),
                revision: number,
            })?;

        let category = self.restorable_reference(TaxonomyKind::Category, revision.category);
        let prompt_type = self.restorable_reference(TaxonomyKind::Type, revision.prompt_type);
        let tags = self.register_tags(&revision.tags)?;

        let updates = PromptUpdate {
            title: Some(revision.title),
            content: Some(revision.content),
            category: Some(category),
            prompt_type: Some(prompt_type),
            set_tags: Some(tags),
            ..Default::default()
        };
        tracing::info!(id = %prompt.id, revision = number, "restoring revision");
        self.apply_update(&prompt, updates)
    }

    // Variables

    pub fn variables(&self, id: &str) -> Result<Vec<String>> {
        Ok(self.store.resolve_prompt(id)?.variables())
    }

    /// Compile a stored prompt. Variables without a supplied value are
    /// cleared.
    pub fn compile(&self, id: &str, values: &Bindings) -> Result<String> {
        let prompt = self.store.resolve_prompt(id)?;
        Self::fill(&prompt.content, values)
    }

    /// Compile arbitrary content the same way stored prompts are compiled:
    /// every placeholder is resolved, to its value or to nothing. Values for
    /// names the content does not use are ignored.
    pub fn fill(content: &str, values: &Bindings) -> Result<String> {
        let variables = template::extract_variables(content);

        let unused: Vec<&str> = values
            .names()
            .filter(|name| !variables.iter().any(|v| v.as_str() == *name))
            .collect();
        if !unused.is_empty() {
            tracing::warn!(names = %unused.join(", "), "ignoring values for unused variables");
        }

        let mut bindings = Bindings::blank(&variables);
        bindings.merge(values);
        Ok(template::compile(content, &bindings))
    }

    /// The text a copy of this prompt produces: compiled when values are
    /// given, otherwise the legend preview (or raw content when the legend is
    /// turned off).
    pub fn copy_text(&self, id: &str, values: Option<&Bindings>) -> Result<String> {
        let prompt = self.store.resolve_prompt(id)?;
        match values {
            Some(values) => Self::fill(&prompt.content, values),
            None if self.config.copy.legend => Ok(template::copy_preview(&prompt.content)),
            None => Ok(prompt.content),
        }
    }

    /// Produce the copy text and hand it to `clipboard`.
    pub fn copy_prompt(
        &self,
        id: &str,
        values: Option<&Bindings>,
        clipboard: &mut dyn Clipboard,
    ) -> Result<String> {
        let text = self.copy_text(id, values)?;
        clipboard.write(&text)?;
        tracing::debug!(destination = clipboard.target(), bytes = text.len(), "copied prompt");
        Ok(text)
    }

    // Taxonomy

    pub fn list_taxonomy(&self, kind: TaxonomyKind) -> Result<Vec<TaxonomyItem>> {
        self.store.list_taxonomy(kind)
    }

    pub fn add_taxonomy(&mut self, kind: TaxonomyKind, name: &str, color: Color) -> Result<TaxonomyItem> {
        let name = validate_name(kind, name)?;
        self.ensure_unique_name(kind, &name, None)?;

        let item = TaxonomyItem::new(kind, name, color);
        self.store.add_taxonomy(&item)?;
        self.store.save()?;

        tracing::info!(kind = %kind, name = %item.name, "added taxonomy item");
        Ok(item)
    }

    /// Rename and/or recolor. A rename is carried into every prompt that
    /// referenced the old name.
    pub fn update_taxonomy(
        &mut self,
        kind: TaxonomyKind,
        id_or_name: &str,
        mut updates: TaxonomyUpdate,
    ) -> Result<Cascade> {
        if updates.name.is_none() && updates.color.is_none() {
            return Err(PromptshelfError::Validation(
                "no changes specified".to_string(),
            ));
        }
        let existing = self.store.resolve_taxonomy(kind, id_or_name)?;

        if let Some(ref name) = updates.name {
            let name = validate_name(kind, name)?;
            self.ensure_unique_name(kind, &name, Some(&existing.id))?;
            updates.name = Some(name);
        }

        let item = self.store.update_taxonomy(kind, &existing.id, updates)?;

        let mut affected = 0;
        if item.name != existing.name {
            for prompt in self.referencing(kind, &existing.name)? {
                let update = rename_reference(kind, &prompt, &existing.name, &item.name);
                self.store.update_prompt(&prompt.id, update)?;
                affected += 1;
            }
        }
        self.store.save()?;

        tracing::info!(kind = %kind, name = %item.name, affected, "updated taxonomy item");
        Ok(Cascade {
            item,
            prompts_affected: affected,
        })
    }

    /// Delete an item and drop it from every prompt that referenced it.
    pub fn delete_taxonomy(&mut self, kind: TaxonomyKind, id_or_name: &str) -> Result<Cascade> {
        let item = self.store.resolve_taxonomy(kind, id_or_name)?;
        self.store.delete_taxonomy(kind, &item.id)?;

        let mut affected = 0;
        for prompt in self.referencing(kind, &item.name)? {
            let update = clear_reference(kind, &item.name);
            self.store.update_prompt(&prompt.id, update)?;
            affected += 1;
        }
        self.store.save()?;

        tracing::info!(kind = %kind, name = %item.name, affected, "deleted taxonomy item");
        Ok(Cascade {
            item,
            prompts_affected: affected,
        })
    }

    // Search

    /// Full-text search with inline filters (`category:`, `type:`, `tag:`,
    /// `is:favorite`, `created:>`, `created:<`). A query made only of
    /// filters lists the matching prompts.
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        let (text, filter) = parse_query(query);

        let Some(expr) = fts_query(&text) else {
            return Ok(self
                .list_prompts(&filter)?
                .into_iter()
                .take(limit)
                .map(|prompt| SearchHit {
                    prompt,
                    title_highlight: None,
                    content_snippet: None,
                })
                .collect());
        };

        let prompts = self.store.list_prompts()?;
        self.cache.sync_from_store(&prompts, &self.store.version_hash())?;

        let mut hits = Vec::new();
        for result in self.cache.search_prompts(&expr, SEARCH_CANDIDATES)? {
            let Ok(id) = result.id.parse::<Uuid>() else {
                continue;
            };
            let Some(prompt) = prompts.iter().find(|p| p.id == id) else {
                continue;
            };
            if !filter.matches(prompt) {
                continue;
            }
            hits.push(SearchHit {
                prompt: prompt.clone(),
                title_highlight: result.title_highlight,
                content_snippet: result.content_snippet,
            });
            if hits.len() >= limit {
                break;
            }
        }
        Ok(hits)
    }

    // Internals

    /// The previous state is recorded only once the update has been stored.
    fn apply_update(&mut self, existing: &Prompt, updates: PromptUpdate) -> Result<Prompt> {
        let record = records_revision(&updates);
        let updated = self.store.update_prompt(&existing.id, updates)?;
        self.store.save()?;
        if record {
            let number = self.revisions.record(existing);
            tracing::debug!(id = %existing.id, revision = number, "recorded revision");
        }
        Ok(updated)
    }

    /// Validate an update and swap names for their canonical spelling.
    fn check_update(&mut self, existing: &Prompt, mut updates: PromptUpdate) -> Result<PromptUpdate> {
        if let Some(ref title) = updates.title {
            updates.title = Some(validate_title(title)?);
        }
        if let Some(ref content) = updates.content {
            validate_content(content)?;
        }
        if let Some(Some(ref name)) = updates.category {
            updates.category = Some(Some(self.canonical_name(TaxonomyKind::Category, name)?));
        }
        if let Some(Some(ref name)) = updates.prompt_type {
            updates.prompt_type = Some(Some(self.canonical_name(TaxonomyKind::Type, name)?));
        }
        if updates.touches_tags() {
            check_tag_count(updates.apply_tags(&existing.tags).len())?;
        }
        if let Some(ref tags) = updates.set_tags {
            updates.set_tags = Some(self.register_tags(tags)?);
        }
        if !updates.add_tags.is_empty() {
            updates.add_tags = self.register_tags(&updates.add_tags)?;
        }
        Ok(updates)
    }

    /// Stored spelling of a category or type, which must already exist.
    fn canonical_name(&self, kind: TaxonomyKind, name: &str) -> Result<String> {
        self.store
            .list_taxonomy(kind)?
            .into_iter()
            .find(|i| i.matches_name(name))
            .map(|i| i.name)
            .ok_or_else(|| PromptshelfError::UnknownReference {
                kind: kind.to_string(),
                name: name.trim().to_string(),
            })
    }

    /// A reference from an old revision, or nothing if it has since been
    /// deleted.
    fn restorable_reference(&self, kind: TaxonomyKind, name: Option<String>) -> Option<String> {
        let name = name?;
        match self.canonical_name(kind, &name) {
            Ok(canonical) => Some(canonical),
            Err(_) => {
                tracing::warn!(kind = %kind, name = %name, "reference no longer exists, clearing it");
                None
            }
        }
    }

    /// Canonical tag names, registering any that do not exist yet. Nothing
    /// is registered unless the whole list is valid.
    fn register_tags(&mut self, tags: &[String]) -> Result<Vec<String>> {
        let known = self.store.list_taxonomy(TaxonomyKind::Tag)?;
        let mut created: Vec<TaxonomyItem> = Vec::new();
        let mut result: Vec<String> = Vec::new();

        for tag in tags {
            let name = validate_name(TaxonomyKind::Tag, tag)?;
            let found = known
                .iter()
                .chain(created.iter())
                .find(|t| t.matches_name(&name))
                .map(|t| t.name.clone());
            let canonical = match found {
                Some(existing) => existing,
                None => {
                    let item = TaxonomyItem::new(TaxonomyKind::Tag, name, Color::default());
                    let name = item.name.clone();
                    created.push(item);
                    name
                }
            };
            if !result.iter().any(|t| t.eq_ignore_ascii_case(&canonical)) {
                result.push(canonical);
            }
        }
        check_tag_count(result.len())?;

        for item in &created {
            self.store.add_taxonomy(item)?;
            tracing::debug!(tag = %item.name, "registered new tag");
        }
        Ok(result)
    }

    fn ensure_unique_name(&self, kind: TaxonomyKind, name: &str, except: Option<&Uuid>) -> Result<()> {
        let taken = self
            .store
            .list_taxonomy(kind)?
            .iter()
            .any(|i| i.matches_name(name) && Some(&i.id) != except);
        if taken {
            return Err(PromptshelfError::DuplicateName {
                kind: kind.to_string(),
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn referencing(&self, kind: TaxonomyKind, name: &str) -> Result<Vec<Prompt>> {
        let filter = match kind {
            TaxonomyKind::Category => PromptFilter::new().with_category(Some(name)),
            TaxonomyKind::Type => PromptFilter::new().with_type(Some(name)),
            TaxonomyKind::Tag => PromptFilter::new().with_tags([name]),
        };
        // "all" is a legal item name but means no filter, so match by hand
        if filter.is_empty() {
            return Ok(self
                .store
                .list_prompts()?
                .into_iter()
                .filter(|p| references(kind, p, name))
                .collect());
        }
        self.list_prompts(&filter)
    }
}

/// Favorite toggles are not worth a revision.
fn records_revision(updates: &PromptUpdate) -> bool {
    updates.title.is_some()
        || updates.content.is_some()
        || updates.category.is_some()
        || updates.prompt_type.is_some()
        || updates.touches_tags()
}

fn references(kind: TaxonomyKind, prompt: &Prompt, name: &str) -> bool {
    let same = |v: &Option<String>| v.as_deref().is_some_and(|v| v.eq_ignore_ascii_case(name));
    match kind {
        TaxonomyKind::Category => same(&prompt.category),
        TaxonomyKind::Type => same(&prompt.prompt_type),
        TaxonomyKind::Tag => prompt.has_tag(name),
    }
}

fn rename_reference(kind: TaxonomyKind, prompt: &Prompt, old: &str, new: &str) -> PromptUpdate {
    match kind {
        TaxonomyKind::Category => PromptUpdate {
            category: Some(Some(new.to_string())),
            ..Default::default()
        },
        TaxonomyKind::Type => PromptUpdate {
            prompt_type: Some(Some(new.to_string())),
            ..Default::default()
        },
        TaxonomyKind::Tag => PromptUpdate {
            set_tags: Some(
                prompt
                    .tags
                    .iter()
                    .map(|t| {
                        if t.eq_ignore_ascii_case(old) {
                            new.to_string()
                        } else {
                            t.clone()
                        }
                    })
                    .collect(),
            ),
            ..Default::default()
        },
    }
}

fn check_tag_count(count: usize) -> Result<()> {
    if count > validation::MAX_TAGS_COUNT {
        return Err(PromptshelfError::Validation(format!(
            "too many tags: {} (max {})",
            count,
            validation::MAX_TAGS_COUNT
        )));
    }
    Ok(())
}

fn clear_reference(kind: TaxonomyKind, name: &str) -> PromptUpdate {
    match kind {
        TaxonomyKind::Category => PromptUpdate {
            category: Some(None),
            ..Default::default()
        },
        TaxonomyKind::Type => PromptUpdate {
            prompt_type: Some(None),
            ..Default::default()
        },
        TaxonomyKind::Tag => PromptUpdate {
            remove_tags: vec![name.to_string()],
            ..Default::default()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::MemoryClipboard;
    use tempfile::TempDir;

    fn session() -> Session {
        let mut store = MemoryStore::new();
        for item in default_taxonomy() {
            store.add_taxonomy(&item).unwrap();
        }
        Session::with_store(Box::new(store), ShelfConfig::default()).unwrap()
    }

    fn new_prompt(title: &str, content: &str) -> NewPrompt {
        NewPrompt {
            title: title.to_string(),
            content: content.to_string(),
            ..Default::default()
        }
    }

    fn bind(pairs: &[(&str, &str)]) -> Bindings {
        pairs.iter().map(|(k, v)| (*k, *v)).collect()
    }

    #[test]
    fn test_create_resolves_canonical_names() {
        let mut s = session();
        let prompt = s
            .create_prompt(NewPrompt {
                category: Some("marketing".to_string()),
                prompt_type: Some("SYSTEM PROMPT".to_string()),
                tags: vec!["seo".to_string(), "SEO".to_string()],
                ..new_prompt("  Titles  ", "Titles for {{topic}}")
            })
            .unwrap();

        assert_eq!(prompt.title, "Titles");
        assert_eq!(prompt.sequence_number, 1);
        assert_eq!(prompt.category.as_deref(), Some("Marketing"));
        assert_eq!(prompt.prompt_type.as_deref(), Some("System prompt"));
        assert_eq!(prompt.tags, vec!["seo"]);

        // Unknown tags are registered on the fly
        let tags = s.list_taxonomy(TaxonomyKind::Tag).unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].color, Color::Slate);
    }

    #[test]
    fn test_create_rejects_unknown_category() {
        let mut s = session();
        let result = s.create_prompt(NewPrompt {
            category: Some("Astrology".to_string()),
            ..new_prompt("t", "c")
        });
        assert!(matches!(result, Err(PromptshelfError::UnknownReference { .. })));
    }

    #[test]
    fn test_create_rejects_blank_fields() {
        let mut s = session();
        assert!(s.create_prompt(new_prompt("   ", "c")).is_err());
        assert!(s.create_prompt(new_prompt("t", "  ")).is_err());
    }

    #[test]
    fn test_list_with_filter() {
        let mut s = session();
        s.create_prompt(NewPrompt {
            category: Some("Coding".to_string()),
            ..new_prompt("a", "c")
        })
        .unwrap();
        s.create_prompt(NewPrompt {
            favorite: true,
            ..new_prompt("b", "c")
        })
        .unwrap();

        let all = s.list_prompts(&PromptFilter::new().with_category(Some("all"))).unwrap();
        assert_eq!(all.len(), 2);

        let coding = s.list_prompts(&PromptFilter::new().with_category(Some("coding"))).unwrap();
        assert_eq!(coding.len(), 1);
        assert_eq!(coding[0].title, "a");

        let favorites = s.list_prompts(&PromptFilter::new().favorites(true)).unwrap();
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].title, "b");
    }

    #[test]
    fn test_update_records_revision_and_restore() {
        let mut s = session();
        s.create_prompt(new_prompt("Draft", "v1 {{a}}")).unwrap();

        s.update_prompt(
            "1",
            PromptUpdate {
                content: Some("v2 {{b}}".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

        let (prompt, revisions) = s.history("1").unwrap();
        assert_eq!(prompt.content, "v2 {{b}}");
        assert_eq!(revisions.len(), 1);
        assert_eq!(revisions[0].number, 1);
        assert_eq!(revisions[0].content, "v1 {{a}}");

        let restored = s.restore_revision("1", 1).unwrap();
        assert_eq!(restored.content, "v1 {{a}}");
        assert_eq!(restored.variables(), vec!["a"]);

        // The restore itself is undoable
        let (_, revisions) = s.history("1").unwrap();
        assert_eq!(revisions.len(), 2);
        assert_eq!(revisions[1].content, "v2 {{b}}");
    }

    #[test]
    fn test_restore_unknown_revision() {
        let mut s = session();
        s.create_prompt(new_prompt("t", "c")).unwrap();
        assert!(matches!(
            s.restore_revision("1", 7),
            Err(PromptshelfError::RevisionNotFound { revision: 7, .. })
        ));
    }

    #[test]
    fn test_revision_cap() {
        let mut config = ShelfConfig::default();
        config.history.max_revisions = 2;
        let mut s = Session::with_store(Box::new(MemoryStore::new()), config).unwrap();
        s.create_prompt(new_prompt("t", "c0")).unwrap();

        for i in 1..=4 {
            s.update_prompt(
                "1",
                PromptUpdate {
                    content: Some(format!("c{}", i)),
                    ..Default::default()
                },
            )
            .unwrap();
        }

        let (_, revisions) = s.history("1").unwrap();
        let numbers: Vec<u32> = revisions.iter().map(|r| r.number).collect();
        assert_eq!(numbers, vec![3, 4]);
    }

    #[test]
    fn test_favorite_toggle_skips_history() {
        let mut s = session();
        s.create_prompt(new_prompt("t", "c")).unwrap();

        assert!(s.toggle_favorite("1").unwrap().favorite);
        assert!(!s.toggle_favorite("1").unwrap().favorite);
        assert!(s.history("1").unwrap().1.is_empty());
    }

    #[test]
    fn test_empty_update_rejected() {
        let mut s = session();
        s.create_prompt(new_prompt("t", "c")).unwrap();
        assert!(matches!(
            s.update_prompt("1", PromptUpdate::default()),
            Err(PromptshelfError::Validation(_))
        ));
    }

    #[test]
    fn test_delete_drops_history() {
        let mut s = session();
        let p = s.create_prompt(new_prompt("t", "c")).unwrap();
        s.update_prompt(
            "1",
            PromptUpdate {
                title: Some("t2".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

        let deleted = s.delete_prompt("1").unwrap();
        assert_eq!(deleted.id, p.id);
        assert!(s.get_prompt("1").is_err());
        assert!(s.revisions.list(&p.id).is_empty());
    }

    #[test]
    fn test_compile_clears_unbound_variables() {
        let mut s = session();
        s.create_prompt(new_prompt("t", "Hi {{ name }}, from {{city}}")).unwrap();

        let text = s.compile("1", &bind(&[("name", "Ada")])).unwrap();
        assert_eq!(text, "Hi Ada, from ");

        // Stored prompt is unchanged
        assert_eq!(s.get_prompt("1").unwrap().content, "Hi {{ name }}, from {{city}}");
    }

    #[test]
    fn test_compile_ignores_unused_values() {
        let mut s = session();
        s.create_prompt(new_prompt("t", "Hi {{name}}")).unwrap();
        let text = s.compile("1", &bind(&[("nmae", "Ada")])).unwrap();
        assert_eq!(text, "Hi ");

        let text = Session::fill("plain text", &bind(&[("x", "1")])).unwrap();
        assert_eq!(text, "plain text");
    }

    #[test]
    fn test_rejected_tag_update_changes_nothing() {
        let mut s = session();
        s.create_prompt(NewPrompt {
            tags: vec!["seo".to_string()],
            ..new_prompt("t", "c")
        })
        .unwrap();
        let tags_before = s.list_taxonomy(TaxonomyKind::Tag).unwrap();

        let too_many: Vec<String> = (0..validation::MAX_TAGS_COUNT).map(|i| format!("tag{}", i)).collect();
        let result = s.update_prompt(
            "1",
            PromptUpdate {
                add_tags: too_many,
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(PromptshelfError::Validation(_))));

        assert_eq!(s.list_taxonomy(TaxonomyKind::Tag).unwrap(), tags_before);
        assert!(s.history("1").unwrap().1.is_empty());
        assert_eq!(s.get_prompt("1").unwrap().tags, vec!["seo"]);
    }

    #[test]
    fn test_register_tags_checks_count_before_registering() {
        let mut s = session();
        let too_many: Vec<String> = (0..=validation::MAX_TAGS_COUNT).map(|i| format!("new{}", i)).collect();

        let result = s.create_prompt(NewPrompt {
            tags: too_many,
            ..new_prompt("t", "c")
        });
        assert!(result.is_err());
        assert!(s.list_taxonomy(TaxonomyKind::Tag).unwrap().is_empty());
    }

    #[test]
    fn test_copy_uses_legend_without_values() {
        let mut s = session();
        s.create_prompt(new_prompt("t", "Explain {{concept}}")).unwrap();
        s.create_prompt(new_prompt("plain", "No variables here")).unwrap();

        let mut clipboard = MemoryClipboard::new();
        let text = s.copy_prompt("1", None, &mut clipboard).unwrap();
        assert_eq!(text, "• concept: ____\n\nExplain {{concept}}");
        assert_eq!(clipboard.contents(), Some(text.as_str()));

        let text = s.copy_prompt("2", None, &mut clipboard).unwrap();
        assert_eq!(text, "No variables here");

        let values = bind(&[("concept", "entropy")]);
        let text = s.copy_prompt("1", Some(&values), &mut clipboard).unwrap();
        assert_eq!(text, "Explain entropy");
    }

    #[test]
    fn test_copy_without_legend() {
        let mut config = ShelfConfig::default();
        config.copy.legend = false;
        let mut s = Session::with_store(Box::new(MemoryStore::new()), config).unwrap();
        s.create_prompt(new_prompt("t", "Explain {{concept}}")).unwrap();

        assert_eq!(s.copy_text("1", None).unwrap(), "Explain {{concept}}");
    }

    #[test]
    fn test_add_taxonomy_rejects_duplicates() {
        let mut s = session();
        let result = s.add_taxonomy(TaxonomyKind::Category, " coding ", Color::Red);
        assert!(matches!(result, Err(PromptshelfError::DuplicateName { .. })));

        let item = s.add_taxonomy(TaxonomyKind::Category, " Legal ", Color::Red).unwrap();
        assert_eq!(item.name, "Legal");
        assert!(s.add_taxonomy(TaxonomyKind::Tag, "   ", Color::Red).is_err());
    }

    #[test]
    fn test_rename_category_cascades() {
        let mut s = session();
        s.create_prompt(NewPrompt {
            category: Some("Coding".to_string()),
            ..new_prompt("a", "c")
        })
        .unwrap();

        let cascade = s
            .update_taxonomy(
                TaxonomyKind::Category,
                "coding",
                TaxonomyUpdate {
                    name: Some("Engineering".to_string()),
                    color: None,
                },
            )
            .unwrap();
        assert_eq!(cascade.item.name, "Engineering");
        assert_eq!(cascade.prompts_affected, 1);
        assert_eq!(s.get_prompt("1").unwrap().category.as_deref(), Some("Engineering"));

        // Cascades are not revisions
        assert!(s.history("1").unwrap().1.is_empty());
    }

    #[test]
    fn test_rename_to_existing_name_rejected() {
        let mut s = session();
        let result = s.update_taxonomy(
            TaxonomyKind::Category,
            "Coding",
            TaxonomyUpdate {
                name: Some("marketing".to_string()),
                color: None,
            },
        );
        assert!(matches!(result, Err(PromptshelfError::DuplicateName { .. })));

        // Changing only the case of its own name is fine
        let cascade = s
            .update_taxonomy(
                TaxonomyKind::Category,
                "Coding",
                TaxonomyUpdate {
                    name: Some("coding".to_string()),
                    color: Some(Color::Teal),
                },
            )
            .unwrap();
        assert_eq!(cascade.item.color, Color::Teal);
    }

    #[test]
    fn test_rename_and_delete_tag_cascades() {
        let mut s = session();
        s.create_prompt(NewPrompt {
            tags: vec!["seo".to_string(), "ads".to_string()],
            ..new_prompt("a", "c")
        })
        .unwrap();

        s.update_taxonomy(
            TaxonomyKind::Tag,
            "seo",
            TaxonomyUpdate {
                name: Some("search".to_string()),
                color: None,
            },
        )
        .unwrap();
        assert_eq!(s.get_prompt("1").unwrap().tags, vec!["search", "ads"]);

        let cascade = s.delete_taxonomy(TaxonomyKind::Tag, "ads").unwrap();
        assert_eq!(cascade.prompts_affected, 1);
        assert_eq!(s.get_prompt("1").unwrap().tags, vec!["search"]);
    }

    #[test]
    fn test_delete_type_clears_reference() {
        let mut s = session();
        s.create_prompt(NewPrompt {
            prompt_type: Some("Partial prompt".to_string()),
            ..new_prompt("a", "c")
        })
        .unwrap();

        s.delete_taxonomy(TaxonomyKind::Type, "partial prompt").unwrap();
        assert!(s.get_prompt("1").unwrap().prompt_type.is_none());
        assert_eq!(s.list_taxonomy(TaxonomyKind::Type).unwrap().len(), 2);
    }

    #[test]
    fn test_restore_clears_deleted_category() {
        let mut s = session();
        s.create_prompt(NewPrompt {
            category: Some("Coding".to_string()),
            ..new_prompt("a", "c")
        })
        .unwrap();
        s.update_prompt(
            "1",
            PromptUpdate {
                title: Some("b".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        s.delete_taxonomy(TaxonomyKind::Category, "Coding").unwrap();

        let restored = s.restore_revision("1", 1).unwrap();
        assert_eq!(restored.title, "a");
        assert!(restored.category.is_none());
    }

    #[test]
    fn test_search_text_and_filters() {
        let mut s = session();
        s.create_prompt(NewPrompt {
            category: Some("Marketing".to_string()),
            tags: vec!["youtube".to_string()],
            ..new_prompt("YouTube titles", "Titles for {{topic}}")
        })
        .unwrap();
        s.create_prompt(NewPrompt {
            category: Some("Coding".to_string()),
            ..new_prompt("Code review", "Review this code for titles of functions")
        })
        .unwrap();

        assert_eq!(s.search("titles", 10).unwrap().len(), 2);

        let hits = s.search("titles category:marketing", 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].prompt.title, "YouTube titles");

        // Filters alone list matching prompts
        let hits = s.search("tag:youtube", 10).unwrap();
        assert_eq!(hits.len(), 1);

        assert!(s.search("nonexistent", 10).unwrap().is_empty());
        assert_eq!(s.search("titles", 1).unwrap().len(), 1);
    }

    #[test]
    fn test_search_sees_later_writes() {
        let mut s = session();
        s.create_prompt(new_prompt("First", "alpha")).unwrap();
        assert_eq!(s.search("alpha", 10).unwrap().len(), 1);

        s.update_prompt(
            "1",
            PromptUpdate {
                content: Some("beta".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(s.search("alpha", 10).unwrap().is_empty());
        assert_eq!(s.search("beta", 10).unwrap().len(), 1);
    }

    #[test]
    fn test_search_survives_fts_syntax() {
        let s = Session::sample().unwrap();
        assert!(s.search("\"unbalanced AND (", 10).is_ok());
    }

    #[test]
    fn test_init_and_reopen() {
        let tmp = TempDir::new().unwrap();
        {
            let mut s = Session::init(tmp.path(), true).unwrap();
            assert!(s.is_persistent());
            s.create_prompt(NewPrompt {
                category: Some("Business".to_string()),
                ..new_prompt("Persisted", "Hello {{who}}")
            })
            .unwrap();
        }

        assert!(tmp.path().join(".promptshelf/config.yaml").exists());

        let s = Session::open(tmp.path()).unwrap();
        assert_eq!(s.backend(), StoreBackend::Loro);
        let prompt = s.get_prompt("1").unwrap();
        assert_eq!(prompt.title, "Persisted");
        assert_eq!(prompt.category.as_deref(), Some("Business"));
        assert_eq!(s.list_taxonomy(TaxonomyKind::Type).unwrap().len(), 3);
        assert_eq!(s.search("hello", 10).unwrap().len(), 1);
    }

    #[test]
    fn test_init_without_defaults() {
        let tmp = TempDir::new().unwrap();
        let s = Session::init(tmp.path(), false).unwrap();
        assert!(s.list_taxonomy(TaxonomyKind::Category).unwrap().is_empty());
        assert!(Session::init(tmp.path(), false).is_err());
    }

    #[test]
    fn test_sample_session() {
        let s = Session::sample().unwrap();
        assert!(!s.is_persistent());
        assert!(!s.list_prompts(&PromptFilter::new()).unwrap().is_empty());
    }
}
