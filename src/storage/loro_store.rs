use std::fs;
use std::path::{Path, PathBuf};

use loro::{LoroDoc, LoroList, LoroMap, LoroValue, ValueOrContainer};
use uuid::Uuid;

use super::{PromptStore, PromptUpdate, StoreBackend, TaxonomyUpdate, SHELF_DIR};
use crate::entity::{Color, Prompt, TaxonomyItem, TaxonomyKind};
use crate::error::{PromptshelfError, Result};

const LORO_DB: &str = "loro.db";
const PROMPTS: &str = "prompts";

pub struct LoroStore {
    doc: LoroDoc,
    path: PathBuf,
}

impl LoroStore {
    /// Whether a library has been initialized under `root`
    pub fn exists(root: &Path) -> bool {
        root.join(SHELF_DIR).join(LORO_DB).exists()
    }

    /// Initialize a new library
    pub fn init(root: &Path) -> Result<Self> {
        let shelf_dir = root.join(SHELF_DIR);

        if shelf_dir.join(LORO_DB).exists() {
            return Err(PromptshelfError::AlreadyInitialized);
        }

        fs::create_dir_all(&shelf_dir)?;

        let doc = LoroDoc::new();
        let path = shelf_dir.join(LORO_DB);

        let store = Self { doc, path };
        store.save()?;

        Ok(store)
    }

    /// Open an existing library
    pub fn open(root: &Path) -> Result<Self> {
        let path = root.join(SHELF_DIR).join(LORO_DB);

        if !path.exists() {
            return Err(PromptshelfError::NotInitialized);
        }

        let bytes = fs::read(&path)?;
        let doc = LoroDoc::new();
        doc.import(&bytes)?;

        tracing::debug!(path = %path.display(), "opened prompt library");
        Ok(Self { doc, path })
    }

    /// Get the .promptshelf directory path
    pub fn shelf_dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(SHELF_DIR))
    }

    fn entity_map(&self, collection: &str, id: &Uuid) -> Option<LoroMap> {
        match self.doc.get_map(collection).get(&id.to_string()) {
            Some(ValueOrContainer::Container(loro::Container::Map(map))) => Some(map),
            _ => None,
        }
    }

    fn write_tags(entity_map: &LoroMap, tags: &[String]) -> Result<()> {
        let tags_list = entity_map.get_or_create_container("tags", LoroList::new())?;
        while !tags_list.is_empty() {
            tags_list.delete(0, 1)?;
        }
        for tag in tags {
            tags_list.push(tag.clone())?;
        }
        Ok(())
    }

    fn write_optional(entity_map: &LoroMap, key: &str, value: &Option<String>) -> Result<()> {
        match value {
            Some(v) => entity_map.insert(key, v.clone())?,
            None => {
                if entity_map.get(key).is_some() {
                    entity_map.delete(key)?;
                }
            }
        }
        Ok(())
    }

    fn parse_prompt_from_map(&self, map: &loro::LoroMapValue) -> Option<Prompt> {
        let id = match map.get("id")? {
            LoroValue::String(s) => s.parse().ok()?,
            _ => return None,
        };
        let title = string_field(map, "title")?;
        let content = string_field(map, "content").unwrap_or_default();
        let sequence_number = match map.get("sequence_number")? {
            LoroValue::I64(n) => *n as u32,
            _ => return None,
        };
        let created_at = timestamp_field(map, "created_at")?;
        let updated_at = timestamp_field(map, "updated_at")?;
        let favorite = matches!(map.get("favorite"), Some(LoroValue::Bool(true)));

        Some(Prompt {
            id,
            sequence_number,
            title,
            content,
            category: string_field(map, "category"),
            prompt_type: string_field(map, "prompt_type"),
            tags: string_list(map, "tags"),
            favorite,
            created_at,
            updated_at,
            created_by: string_field(map, "created_by"),
        })
    }

    fn parse_taxonomy_from_map(
        &self,
        kind: TaxonomyKind,
        map: &loro::LoroMapValue,
    ) -> Option<TaxonomyItem> {
        let id = match map.get("id")? {
            LoroValue::String(s) => s.parse().ok()?,
            _ => return None,
        };
        let name = string_field(map, "name")?;
        let color = string_field(map, "color")
            .map(|c| Color::from_stored(&c))
            .unwrap_or_default();
        let created_at = timestamp_field(map, "created_at")?;

        Some(TaxonomyItem {
            id,
            kind,
            name,
            color,
            created_at,
        })
    }
}

impl PromptStore for LoroStore {
    fn backend(&self) -> StoreBackend {
        StoreBackend::Loro
    }

    /// Save the document to disk
    fn save(&self) -> Result<()> {
        let bytes = self.doc.export(loro::ExportMode::Snapshot)?;
        fs::write(&self.path, bytes)?;
        Ok(())
    }

    /// Version vector of the oplog, used for cache invalidation
    fn version_hash(&self) -> String {
        let vv = self.doc.oplog_vv();
        format!("{:?}", vv)
    }

    fn next_sequence_number(&self) -> u32 {
        let meta = self.doc.get_map("_meta");
        let current = match meta.get("type_sequences") {
            Some(ValueOrContainer::Container(loro::Container::Map(sequences))) => {
                match sequences.get(PROMPTS) {
                    Some(ValueOrContainer::Value(LoroValue::I64(n))) => n as u32,
                    _ => 0,
                }
            }
            _ => 0,
        };

        current + 1
    }

    fn add_prompt(&mut self, prompt: &Prompt) -> Result<()> {
        let prompts = self.doc.get_map(PROMPTS);
        let id_str = prompt.id.to_string();

        let entity_map = prompts.get_or_create_container(&id_str, LoroMap::new())?;

        entity_map.insert("id", id_str.clone())?;
        entity_map.insert("sequence_number", prompt.sequence_number as i64)?;
        entity_map.insert("title", prompt.title.clone())?;
        entity_map.insert("content", prompt.content.clone())?;
        entity_map.insert("favorite", prompt.favorite)?;
        entity_map.insert("created_at", prompt.created_at.to_rfc3339())?;
        entity_map.insert("updated_at", prompt.updated_at.to_rfc3339())?;

        Self::write_optional(&entity_map, "category", &prompt.category)?;
        Self::write_optional(&entity_map, "prompt_type", &prompt.prompt_type)?;
        Self::write_optional(&entity_map, "created_by", &prompt.created_by)?;
        Self::write_tags(&entity_map, &prompt.tags)?;

        let meta = self.doc.get_map("_meta");
        let sequences = meta.get_or_create_container("type_sequences", LoroMap::new())?;
        sequences.insert(PROMPTS, prompt.sequence_number as i64)?;

        self.doc.commit();
        Ok(())
    }

    fn get_prompt(&self, id: &Uuid) -> Result<Option<Prompt>> {
        let json = self.doc.get_map(PROMPTS).get_deep_value();
        if let LoroValue::Map(map) = json {
            if let Some(LoroValue::Map(entity_map)) = map.get(&id.to_string()) {
                return Ok(self.parse_prompt_from_map(entity_map));
            }
        }
        Ok(None)
    }

    fn list_prompts(&self) -> Result<Vec<Prompt>> {
        let mut prompts = Vec::new();

        let json = self.doc.get_map(PROMPTS).get_deep_value();
        if let LoroValue::Map(map) = json {
            for (_, entity_value) in map.iter() {
                if let LoroValue::Map(entity_map) = entity_value {
                    if let Some(prompt) = self.parse_prompt_from_map(entity_map) {
                        prompts.push(prompt);
                    }
                }
            }
        }

        prompts.sort_by_key(|p| p.sequence_number);
        Ok(prompts)
    }

    fn update_prompt(&mut self, id: &Uuid, updates: PromptUpdate) -> Result<Prompt> {
        let entity_map = self
            .entity_map(PROMPTS, id)
            .ok_or_else(|| PromptshelfError::PromptNotFound(id.to_string()))?;

        let existing = self
            .get_prompt(id)?
            .ok_or_else(|| PromptshelfError::PromptNotFound(id.to_string()))?;

        let now = chrono::Utc::now();
        entity_map.insert("updated_at", now.to_rfc3339())?;

        if let Some(ref title) = updates.title {
            entity_map.insert("title", title.clone())?;
        }
        if let Some(ref content) = updates.content {
            entity_map.insert("content", content.clone())?;
        }
        if let Some(ref category) = updates.category {
            Self::write_optional(&entity_map, "category", category)?;
        }
        if let Some(ref prompt_type) = updates.prompt_type {
            Self::write_optional(&entity_map, "prompt_type", prompt_type)?;
        }
        if let Some(favorite) = updates.favorite {
            entity_map.insert("favorite", favorite)?;
        }
        if updates.touches_tags() {
            let new_tags = updates.apply_tags(&existing.tags);
            Self::write_tags(&entity_map, &new_tags)?;
        }

        self.doc.commit();

        self.get_prompt(id)?.ok_or_else(|| {
            PromptshelfError::Storage("Failed to retrieve updated prompt".to_string())
        })
    }

    fn delete_prompt(&mut self, id: &Uuid) -> Result<()> {
        let prompts_map = self.doc.get_map(PROMPTS);
        let id_str = id.to_string();

        if prompts_map.get(&id_str).is_none() {
            return Err(PromptshelfError::PromptNotFound(id_str));
        }

        prompts_map.delete(&id_str)?;
        self.doc.commit();
        Ok(())
    }

    fn add_taxonomy(&mut self, item: &TaxonomyItem) -> Result<()> {
        let collection = self.doc.get_map(item.kind.collection());
        let id_str = item.id.to_string();

        let entity_map = collection.get_or_create_container(&id_str, LoroMap::new())?;
        entity_map.insert("id", id_str.clone())?;
        entity_map.insert("name", item.name.clone())?;
        entity_map.insert("color", item.color.to_string())?;
        entity_map.insert("created_at", item.created_at.to_rfc3339())?;

        self.doc.commit();
        Ok(())
    }

    fn list_taxonomy(&self, kind: TaxonomyKind) -> Result<Vec<TaxonomyItem>> {
        let mut items = Vec::new();

        let json = self.doc.get_map(kind.collection()).get_deep_value();
        if let LoroValue::Map(map) = json {
            for (_, entity_value) in map.iter() {
                if let LoroValue::Map(entity_map) = entity_value {
                    if let Some(item) = self.parse_taxonomy_from_map(kind, entity_map) {
                        items.push(item);
                    }
                }
            }
        }

        items.sort_by_key(|i| i.name.to_lowercase());
        Ok(items)
    }

    fn update_taxonomy(
        &mut self,
        kind: TaxonomyKind,
        id: &Uuid,
        updates: TaxonomyUpdate,
    ) -> Result<TaxonomyItem> {
        let not_found = || PromptshelfError::TaxonomyNotFound {
            kind: kind.to_string(),
            id: id.to_string(),
        };
        let entity_map = self.entity_map(kind.collection(), id).ok_or_else(not_found)?;

        if let Some(name) = updates.name {
            entity_map.insert("name", name)?;
        }
        if let Some(color) = updates.color {
            entity_map.insert("color", color.to_string())?;
        }
        self.doc.commit();

        self.list_taxonomy(kind)?
            .into_iter()
            .find(|i| i.id == *id)
            .ok_or_else(not_found)
    }

    fn delete_taxonomy(&mut self, kind: TaxonomyKind, id: &Uuid) -> Result<()> {
        let collection = self.doc.get_map(kind.collection());
        let id_str = id.to_string();

        if collection.get(&id_str).is_none() {
            return Err(PromptshelfError::TaxonomyNotFound {
                kind: kind.to_string(),
                id: id_str,
            });
        }

        collection.delete(&id_str)?;
        self.doc.commit();
        Ok(())
    }
}

fn string_field(map: &loro::LoroMapValue, key: &str) -> Option<String> {
    match map.get(key) {
        Some(LoroValue::String(s)) => Some(s.to_string()),
        _ => None,
    }
}

fn timestamp_field(map: &loro::LoroMapValue, key: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    match map.get(key)? {
        LoroValue::String(s) => chrono::DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&chrono::Utc)),
        _ => None,
    }
}

fn string_list(map: &loro::LoroMapValue, key: &str) -> Vec<String> {
    match map.get(key) {
        Some(LoroValue::List(list)) => list
            .iter()
            .filter_map(|item| match item {
                LoroValue::String(s) => Some(s.to_string()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}
