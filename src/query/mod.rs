//! Pure, stateless views over a card collection: category/text filtering
//! and selectable ordering. Nothing here mutates or caches; callers re-run
//! these over the latest store contents.

use std::cmp::Ordering;
use std::str::FromStr;

use icu_collator::{Collator, CollatorOptions};

use crate::entity::Card;

/// Category filter value meaning "no category restriction".
pub const ALL_CATEGORIES: &str = "all";

/// Selectable orderings for the main card view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    /// Favorites first, then most recently updated
    Hot,
    /// Most recently created first
    Newest,
    /// Title ascending, locale-aware
    Alphabet,
    /// Keep the collection's own order
    #[default]
    Unsorted,
}

impl FromStr for SortKey {
    type Err = std::convert::Infallible;

    // Unknown keys mean "no reordering", they are not an error.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "hot" => SortKey::Hot,
            "newest" => SortKey::Newest,
            "alphabet" => SortKey::Alphabet,
            _ => SortKey::Unsorted,
        })
    }
}

/// The main view: category filter, then text filter, then sort.
///
/// The category must match an element of `card.categories` exactly
/// (case-sensitive); `"all"` disables it. The search text is matched
/// case-insensitively as a substring of title, description, any tag, or any
/// category; blank search means no filter. Sorting is stable, so ties keep
/// the input order.
pub fn filter_cards(cards: &[Card], category: &str, search: &str, sort: SortKey) -> Vec<Card> {
    let needle = search.trim().to_lowercase();

    let mut result: Vec<Card> = cards
        .iter()
        .filter(|card| category == ALL_CATEGORIES || card.categories.iter().any(|c| c == category))
        .filter(|card| needle.is_empty() || matches_wide(card, &needle))
        .cloned()
        .collect();

    sort_cards(&mut result, sort);
    result
}

/// The drawer view: favorites only, text filter over title/description.
pub fn drawer_favorites(cards: &[Card], search: &str) -> Vec<Card> {
    let needle = search.trim().to_lowercase();
    cards
        .iter()
        .filter(|card| card.is_favorite)
        .filter(|card| needle.is_empty() || matches_narrow(card, &needle))
        .cloned()
        .collect()
}

/// The full-collection search view: text filter over title/description,
/// no category or favorite restriction.
pub fn search_all(cards: &[Card], search: &str) -> Vec<Card> {
    let needle = search.trim().to_lowercase();
    cards
        .iter()
        .filter(|card| needle.is_empty() || matches_narrow(card, &needle))
        .cloned()
        .collect()
}

fn matches_wide(card: &Card, needle: &str) -> bool {
    card.title.to_lowercase().contains(needle)
        || card.description.to_lowercase().contains(needle)
        || card.tags.iter().any(|t| t.to_lowercase().contains(needle))
        || card
            .categories
            .iter()
            .any(|c| c.to_lowercase().contains(needle))
}

fn matches_narrow(card: &Card, needle: &str) -> bool {
    card.title.to_lowercase().contains(needle)
        || card.description.to_lowercase().contains(needle)
}

fn sort_cards(cards: &mut [Card], sort: SortKey) {
    match sort {
        SortKey::Hot => {
            cards.sort_by(|a, b| {
                b.is_favorite
                    .cmp(&a.is_favorite)
                    .then(b.update_time.cmp(&a.update_time))
            });
        }
        SortKey::Newest => {
            cards.sort_by(|a, b| b.create_time.cmp(&a.create_time));
        }
        SortKey::Alphabet => {
            // Root-locale collation orders mixed-script titles correctly
            // where byte comparison would not.
            let collator = Collator::try_new(&Default::default(), CollatorOptions::new()).ok();
            cards.sort_by(|a, b| compare_titles(collator.as_ref(), &a.title, &b.title));
        }
        SortKey::Unsorted => {}
    }
}

fn compare_titles(collator: Option<&Collator>, a: &str, b: &str) -> Ordering {
    match collator {
        Some(c) => c.compare(a, b),
        None => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::CardDraft;
    use chrono::Duration;

    fn card(title: &str, categories: &[&str], tags: &[&str]) -> Card {
        Card::from_draft(CardDraft {
            title: Some(title.to_string()),
            description: Some(format!("{} description", title)),
            categories: Some(categories.iter().map(|s| s.to_string()).collect()),
            tags: Some(tags.iter().map(|s| s.to_string()).collect()),
            ..Default::default()
        })
    }

    fn alpha_beta() -> Vec<Card> {
        vec![
            card("Alpha", &["docs"], &["reference"]),
            card("Beta", &["tools"], &["editor"]),
        ]
    }

    #[test]
    fn test_category_filter_keeps_members_only() {
        let cards = alpha_beta();
        let result = filter_cards(&cards, "docs", "", SortKey::Unsorted);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].title, "Alpha");
    }

    #[test]
    fn test_category_filter_is_case_sensitive() {
        let cards = alpha_beta();
        assert!(filter_cards(&cards, "Docs", "", SortKey::Unsorted).is_empty());
    }

    #[test]
    fn test_all_category_disables_filter() {
        let cards = alpha_beta();
        assert_eq!(filter_cards(&cards, "all", "", SortKey::Unsorted).len(), 2);
    }

    #[test]
    fn test_search_matches_title_any_case() {
        let cards = alpha_beta();
        let result = filter_cards(&cards, "all", "BETA", SortKey::Unsorted);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].title, "Beta");
    }

    #[test]
    fn test_search_matches_tags_and_categories() {
        let cards = alpha_beta();
        let by_tag = filter_cards(&cards, "all", "editor", SortKey::Unsorted);
        assert_eq!(by_tag.len(), 1);
        assert_eq!(by_tag[0].title, "Beta");

        let by_category = filter_cards(&cards, "all", "doc", SortKey::Unsorted);
        assert_eq!(by_category.len(), 1);
        assert_eq!(by_category[0].title, "Alpha");
    }

    #[test]
    fn test_blank_search_is_no_filter() {
        let cards = alpha_beta();
        assert_eq!(filter_cards(&cards, "all", "   ", SortKey::Unsorted).len(), 2);
    }

    #[test]
    fn test_filtering_is_idempotent() {
        let cards = alpha_beta();
        let once = filter_cards(&cards, "docs", "alpha", SortKey::Unsorted);
        let twice = filter_cards(&once, "docs", "alpha", SortKey::Unsorted);
        assert_eq!(once.len(), twice.len());
        assert_eq!(once[0].id, twice[0].id);
    }

    #[test]
    fn test_newest_orders_by_create_time_desc() {
        let mut cards = alpha_beta();
        cards.push(card("Gamma", &[], &[]));
        // Force distinct, known creation times
        cards[0].create_time = cards[0].create_time - Duration::seconds(30);
        cards[1].create_time = cards[1].create_time - Duration::seconds(20);
        cards[2].create_time = cards[2].create_time - Duration::seconds(10);

        let result = filter_cards(&cards, "all", "", SortKey::Newest);
        let titles: Vec<&str> = result.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Gamma", "Beta", "Alpha"]);
    }

    #[test]
    fn test_hot_puts_favorites_first() {
        let mut cards = alpha_beta();
        // Beta is older, but favorited
        cards[1].is_favorite = true;
        cards[1].update_time = cards[1].update_time - Duration::seconds(60);

        let result = filter_cards(&cards, "all", "", SortKey::Hot);
        assert_eq!(result[0].title, "Beta");
        assert_eq!(result[1].title, "Alpha");
    }

    #[test]
    fn test_alphabet_sorts_titles_ascending() {
        let cards = vec![card("zsh", &[], &[]), card("Bash", &[], &[]), card("fish", &[], &[])];
        let result = filter_cards(&cards, "all", "", SortKey::Alphabet);
        let titles: Vec<&str> = result.iter().map(|c| c.title.as_str()).collect();
        // Case-insensitive collation, not byte order
        assert_eq!(titles, vec!["Bash", "fish", "zsh"]);
    }

    #[test]
    fn test_unsorted_preserves_input_order() {
        let cards = alpha_beta();
        let result = filter_cards(&cards, "all", "", SortKey::Unsorted);
        assert_eq!(result[0].title, "Alpha");
        assert_eq!(result[1].title, "Beta");
    }

    #[test]
    fn test_drawer_view_restricts_to_favorites() {
        let mut cards = alpha_beta();
        cards[0].is_favorite = true;

        let all = drawer_favorites(&cards, "");
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title, "Alpha");

        // Narrow search ignores tags
        assert!(drawer_favorites(&cards, "reference").is_empty());
        assert_eq!(drawer_favorites(&cards, "alpha").len(), 1);
    }

    #[test]
    fn test_search_all_ignores_favorite_flag() {
        let cards = alpha_beta();
        assert_eq!(search_all(&cards, "description").len(), 2);
        assert_eq!(search_all(&cards, "beta").len(), 1);
    }

    #[test]
    fn test_sort_key_from_str() {
        assert_eq!("hot".parse::<SortKey>().unwrap(), SortKey::Hot);
        assert_eq!("NEWEST".parse::<SortKey>().unwrap(), SortKey::Newest);
        assert_eq!("alphabet".parse::<SortKey>().unwrap(), SortKey::Alphabet);
        assert_eq!("whatever".parse::<SortKey>().unwrap(), SortKey::Unsorted);
    }
}
