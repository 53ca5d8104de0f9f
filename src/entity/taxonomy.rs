use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The three kinds of catalog metadata a prompt can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaxonomyKind {
    Category,
    Type,
    Tag,
}

impl TaxonomyKind {
    pub const ALL: [TaxonomyKind; 3] = [TaxonomyKind::Category, TaxonomyKind::Type, TaxonomyKind::Tag];

    /// Name of the collection holding items of this kind.
    pub fn collection(&self) -> &'static str {
        match self {
            TaxonomyKind::Category => "categories",
            TaxonomyKind::Type => "types",
            TaxonomyKind::Tag => "tags",
        }
    }
}

impl std::fmt::Display for TaxonomyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaxonomyKind::Category => write!(f, "category"),
            TaxonomyKind::Type => write!(f, "type"),
            TaxonomyKind::Tag => write!(f, "tag"),
        }
    }
}

impl std::str::FromStr for TaxonomyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "category" | "categories" => Ok(TaxonomyKind::Category),
            "type" | "types" => Ok(TaxonomyKind::Type),
            "tag" | "tags" => Ok(TaxonomyKind::Tag),
            _ => Err(format!("Invalid kind: {} (expected category, type or tag)", s)),
        }
    }
}

/// Display color of a taxonomy item, from a fixed palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    #[default]
    Slate,
    Red,
    Orange,
    Amber,
    Green,
    Teal,
    Blue,
    Indigo,
    Purple,
    Pink,
}

pub const COLOR_PALETTE: [Color; 10] = [
    Color::Slate,
    Color::Red,
    Color::Orange,
    Color::Amber,
    Color::Green,
    Color::Teal,
    Color::Blue,
    Color::Indigo,
    Color::Purple,
    Color::Pink,
];

impl Color {
    /// Human-readable name.
    pub fn label(&self) -> &'static str {
        match self {
            Color::Slate => "Grey",
            Color::Red => "Red",
            Color::Orange => "Orange",
            Color::Amber => "Yellow",
            Color::Green => "Green",
            Color::Teal => "Teal",
            Color::Blue => "Blue",
            Color::Indigo => "Indigo",
            Color::Purple => "Purple",
            Color::Pink => "Pink",
        }
    }

    /// Parse a stored color id, falling back to the default for anything
    /// unrecognised.
    pub fn from_stored(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let id = match self {
            Color::Slate => "slate",
            Color::Red => "red",
            Color::Orange => "orange",
            Color::Amber => "amber",
            Color::Green => "green",
            Color::Teal => "teal",
            Color::Blue => "blue",
            Color::Indigo => "indigo",
            Color::Purple => "purple",
            Color::Pink => "pink",
        };
        write!(f, "{}", id)
    }
}

impl std::str::FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        COLOR_PALETTE
            .iter()
            .copied()
            .find(|c| c.to_string() == wanted || c.label().to_lowercase() == wanted)
            .ok_or_else(|| {
                let valid: Vec<String> = COLOR_PALETTE.iter().map(|c| c.to_string()).collect();
                format!("Invalid color: {} (valid: {})", s, valid.join(", "))
            })
    }
}

/// A category, type or tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyItem {
    pub id: Uuid,
    pub kind: TaxonomyKind,
    pub name: String,
    pub color: Color,
    pub created_at: DateTime<Utc>,
}

impl TaxonomyItem {
    pub fn new(kind: TaxonomyKind, name: String, color: Color) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            name,
            color,
            created_at: Utc::now(),
        }
    }

    pub fn short_id(&self) -> String {
        self.id.to_string()[..7].to_string()
    }

    pub fn matches_name(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_parse_by_id_and_label() {
        assert_eq!("teal".parse::<Color>().unwrap(), Color::Teal);
        assert_eq!("Yellow".parse::<Color>().unwrap(), Color::Amber);
        assert!("magenta".parse::<Color>().is_err());
    }

    #[test]
    fn test_color_from_stored_falls_back() {
        assert_eq!(Color::from_stored("purple"), Color::Purple);
        assert_eq!(Color::from_stored("bg-purple-100"), Color::Slate);
    }

    #[test]
    fn test_color_serde_uses_ids() {
        let json = serde_json::to_string(&Color::Indigo).unwrap();
        assert_eq!(json, "\"indigo\"");
    }

    #[test]
    fn test_kind_parse_accepts_plurals() {
        assert_eq!("categories".parse::<TaxonomyKind>().unwrap(), TaxonomyKind::Category);
        assert_eq!("Type".parse::<TaxonomyKind>().unwrap(), TaxonomyKind::Type);
        assert!("folder".parse::<TaxonomyKind>().is_err());
    }

    #[test]
    fn test_matches_name_is_case_insensitive() {
        let item = TaxonomyItem::new(TaxonomyKind::Category, "Marketing".to_string(), Color::Red);
        assert!(item.matches_name(" marketing "));
        assert!(!item.matches_name("market"));
    }
}
