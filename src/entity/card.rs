// src/entity/card.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Tag assigned when a card is created with no usable tag text.
pub const DEFAULT_TAG: &str = "uncategorized";

const DEFAULT_ICON: &str = "fas fa-link";
const DEFAULT_ICON_BG: &str = "bg-blue-100";
const DEFAULT_ICON_COLOR: &str = "text-blue-600";

/// One navigable resource entry with display metadata, categorization,
/// and favorite status. Wire format uses camelCase keys and RFC 3339
/// timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: Uuid,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub icon_bg: String,
    #[serde(default)]
    pub icon_color: String,
    #[serde(default, deserialize_with = "string_or_seq")]
    pub categories: Vec<String>,
    #[serde(default, deserialize_with = "string_or_seq")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_favorite: bool,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

impl Card {
    /// Build a new card from a draft: fresh id, both timestamps stamped now,
    /// defaults applied for absent fields.
    pub fn from_draft(draft: CardDraft) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: draft.title.unwrap_or_default(),
            description: draft.description.unwrap_or_default(),
            url: draft.url.unwrap_or_default(),
            icon: draft.icon.unwrap_or_else(|| DEFAULT_ICON.to_string()),
            icon_bg: draft.icon_bg.unwrap_or_else(|| DEFAULT_ICON_BG.to_string()),
            icon_color: draft
                .icon_color
                .unwrap_or_else(|| DEFAULT_ICON_COLOR.to_string()),
            categories: normalize_labels(draft.categories.unwrap_or_default()),
            tags: normalize_tags(draft.tags),
            is_favorite: draft.is_favorite.unwrap_or(false),
            create_time: now,
            update_time: now,
        }
    }

    /// Overwrite every field except id and create_time, re-stamping
    /// update_time. Absent draft fields fall back to their defaults, not to
    /// the previous values.
    pub fn apply_draft(&mut self, draft: CardDraft) {
        let fresh = Card::from_draft(draft);
        self.title = fresh.title;
        self.description = fresh.description;
        self.url = fresh.url;
        self.icon = fresh.icon;
        self.icon_bg = fresh.icon_bg;
        self.icon_color = fresh.icon_color;
        self.categories = fresh.categories;
        self.tags = fresh.tags;
        self.is_favorite = fresh.is_favorite;
        self.update_time = Utc::now();
    }

    /// Draft carrying this card's current content, used to seed partial
    /// updates.
    pub fn to_draft(&self) -> CardDraft {
        CardDraft {
            title: Some(self.title.clone()),
            description: Some(self.description.clone()),
            url: Some(self.url.clone()),
            icon: Some(self.icon.clone()),
            icon_bg: Some(self.icon_bg.clone()),
            icon_color: Some(self.icon_color.clone()),
            categories: Some(self.categories.clone()),
            tags: Some(self.tags.clone()),
            is_favorite: Some(self.is_favorite),
        }
    }
}

/// Optional card fields as supplied by a caller. Defaults are applied once,
/// in `Card::from_draft`, never re-checked downstream.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CardDraft {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub icon: Option<String>,
    pub icon_bg: Option<String>,
    pub icon_color: Option<String>,
    #[serde(deserialize_with = "opt_string_or_seq")]
    pub categories: Option<Vec<String>>,
    #[serde(deserialize_with = "opt_string_or_seq")]
    pub tags: Option<Vec<String>>,
    pub is_favorite: Option<bool>,
}

/// Split comma-separated entries, trim whitespace, drop blanks.
fn normalize_labels(raw: Vec<String>) -> Vec<String> {
    raw.iter()
        .flat_map(|s| s.split(','))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Tags are never empty: blank input collapses to the default tag.
fn normalize_tags(raw: Option<Vec<String>>) -> Vec<String> {
    let tags = normalize_labels(raw.unwrap_or_default());
    if tags.is_empty() {
        vec![DEFAULT_TAG.to_string()]
    } else {
        tags
    }
}

/// Accept either a JSON array of strings or a single comma-separated
/// string, so documents written by hand round-trip as sequences.
fn string_or_seq<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Seq(Vec<String>),
        One(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Seq(v) => Ok(normalize_labels(v)),
        Raw::One(s) => Ok(normalize_labels(vec![s])),
    }
}

fn opt_string_or_seq<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    string_or_seq(deserializer).map(Some)
}

/// Check a Font Awesome class string, e.g. "fas fa-code".
pub fn validate_icon(icon: &str) -> bool {
    let mut parts = icon.split_whitespace();
    let (Some(style), Some(name), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    let name_ok = name
        .strip_prefix("fa-")
        .is_some_and(|rest| {
            !rest.is_empty()
                && rest
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        });
    matches!(style, "fa" | "fab" | "fas" | "far" | "fal") && name_ok
}

/// Check a Tailwind text color class, e.g. "text-blue-600".
pub fn validate_color(color: &str) -> bool {
    const NAMES: [&str; 8] = [
        "red", "blue", "green", "yellow", "purple", "pink", "indigo", "gray",
    ];
    const WEIGHTS: [&str; 9] = [
        "100", "200", "300", "400", "500", "600", "700", "800", "900",
    ];

    let Some(rest) = color.strip_prefix("text-") else {
        return false;
    };
    let Some((name, weight)) = rest.rsplit_once('-') else {
        return false;
    };
    NAMES.contains(&name) && WEIGHTS.contains(&weight)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_draft_applies_defaults() {
        let card = Card::from_draft(CardDraft::default());
        assert_eq!(card.title, "");
        assert_eq!(card.icon, "fas fa-link");
        assert_eq!(card.icon_bg, "bg-blue-100");
        assert_eq!(card.icon_color, "text-blue-600");
        assert!(card.categories.is_empty());
        assert_eq!(card.tags, vec![DEFAULT_TAG.to_string()]);
        assert!(!card.is_favorite);
        assert_eq!(card.create_time, card.update_time);
    }

    #[test]
    fn test_tags_never_empty() {
        let draft = CardDraft {
            tags: Some(vec!["  ".to_string(), "".to_string()]),
            ..Default::default()
        };
        let card = Card::from_draft(draft);
        assert_eq!(card.tags, vec![DEFAULT_TAG.to_string()]);
    }

    #[test]
    fn test_comma_separated_tags_split() {
        let draft = CardDraft {
            tags: Some(vec!["docs, web ,reference".to_string()]),
            ..Default::default()
        };
        let card = Card::from_draft(draft);
        assert_eq!(card.tags, vec!["docs", "web", "reference"]);
    }

    #[test]
    fn test_apply_draft_preserves_identity() {
        let mut card = Card::from_draft(CardDraft {
            title: Some("Before".to_string()),
            ..Default::default()
        });
        let id = card.id;
        let created = card.create_time;

        card.apply_draft(CardDraft {
            title: Some("After".to_string()),
            is_favorite: Some(true),
            ..Default::default()
        });

        assert_eq!(card.id, id);
        assert_eq!(card.create_time, created);
        assert_eq!(card.title, "After");
        assert!(card.is_favorite);
        assert!(card.create_time <= card.update_time);
    }

    #[test]
    fn test_deserialize_tags_from_string() {
        let json = r#"{
            "id": "b9bdbd22-5a52-4a72-9e0a-7e31c2f6e3a1",
            "title": "MDN",
            "tags": "docs, web",
            "categories": ["frontend"],
            "createTime": "2025-01-01T00:00:00Z",
            "updateTime": "2025-01-02T00:00:00Z"
        }"#;
        let card: Card = serde_json::from_str(json).unwrap();
        assert_eq!(card.tags, vec!["docs", "web"]);
        assert_eq!(card.categories, vec!["frontend"]);
        assert!(!card.is_favorite);
    }

    #[test]
    fn test_serialize_camel_case_wire_keys() {
        let card = Card::from_draft(CardDraft {
            is_favorite: Some(true),
            ..Default::default()
        });
        let json = serde_json::to_string(&card).unwrap();
        assert!(json.contains("\"isFavorite\":true"));
        assert!(json.contains("\"iconBg\""));
        assert!(json.contains("\"createTime\""));
    }

    #[test]
    fn test_validate_icon() {
        assert!(validate_icon("fas fa-code"));
        assert!(validate_icon("fab fa-github"));
        assert!(validate_icon("fa fa-star"));
        assert!(!validate_icon("fas"));
        assert!(!validate_icon("fax fa-code"));
        assert!(!validate_icon("fas code"));
        assert!(!validate_icon("fas fa-Code"));
        assert!(!validate_icon("fas fa-code extra"));
    }

    #[test]
    fn test_validate_color() {
        assert!(validate_color("text-blue-600"));
        assert!(validate_color("text-gray-100"));
        assert!(!validate_color("text-blue-650"));
        assert!(!validate_color("text-teal-600"));
        assert!(!validate_color("bg-blue-600"));
        assert!(!validate_color("text-blue"));
    }
}
