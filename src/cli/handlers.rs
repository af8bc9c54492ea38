use std::env;
use std::fs;
use std::io;
use std::path::PathBuf;

use chrono::Utc;
use uuid::Uuid;

use crate::entity::{validate_color, validate_icon, Card, CardDraft};
use crate::error::{DevnavError, Result};
use crate::query::{self, SortKey};
use crate::storage::CardStore;
use crate::sync::{GithubSync, SyncConfig};
use crate::transfer;

/// Find the project root by looking for .devnav/ or .git/
fn find_project_root() -> PathBuf {
    let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    let mut current = cwd.as_path();
    loop {
        if current.join(".devnav").exists() || current.join(".git").exists() {
            return current.to_path_buf();
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return cwd,
        }
    }
}

fn open_store() -> Result<CardStore> {
    CardStore::open(&find_project_root())
}

fn short_id(card: &Card) -> String {
    card.id.to_string()[..8].to_string()
}

/// Resolve "id or title" input: a full uuid, a uuid prefix, or an exact
/// title, in that order.
fn resolve_card(store: &CardStore, id: &str) -> Result<Card> {
    if let Ok(uuid) = Uuid::parse_str(id) {
        if let Some(card) = store.get(&uuid)? {
            return Ok(card);
        }
        return Err(DevnavError::CardNotFound(id.to_string()));
    }

    let all = store.get_all()?;
    let mut prefixed = all.iter().filter(|c| c.id.to_string().starts_with(id));
    if let Some(card) = prefixed.next() {
        if prefixed.next().is_some() {
            return Err(DevnavError::AmbiguousId(format!(
                "'{}' matches more than one card; give more characters",
                id
            )));
        }
        return Ok(card.clone());
    }

    let by_title = store.find_by_title(id)?;
    match by_title.into_iter().next() {
        Some(card) => Ok(card),
        None => Err(DevnavError::CardNotFound(id.to_string())),
    }
}

fn print_card_line(card: &Card) {
    let marker = if card.is_favorite { "*" } else { " " };
    println!("  ({}) {} {}", short_id(card), marker, card.title);
    if !card.url.is_empty() {
        println!("             {}", card.url);
    }
}

fn confirm_or_bail(prompt: &str, non_interactive_hint: &str) -> Result<bool> {
    eprintln!("{} [y/N] ", prompt);

    if atty::is(atty::Stream::Stdin) {
        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Cancelled.");
            return Ok(false);
        }
        Ok(true)
    } else {
        Err(DevnavError::NonInteractive(non_interactive_hint.to_string()))
    }
}

/// The original ships with a handful of well-known developer resources.
fn starter_cards() -> Vec<CardDraft> {
    let card = |title: &str,
                description: &str,
                icon: &str,
                icon_bg: &str,
                icon_color: &str,
                categories: &[&str],
                tags: &[&str],
                url: &str| CardDraft {
        title: Some(title.to_string()),
        description: Some(description.to_string()),
        url: Some(url.to_string()),
        icon: Some(icon.to_string()),
        icon_bg: Some(icon_bg.to_string()),
        icon_color: Some(icon_color.to_string()),
        categories: Some(categories.iter().map(|s| s.to_string()).collect()),
        tags: Some(tags.iter().map(|s| s.to_string()).collect()),
        is_favorite: Some(false),
    };

    vec![
        card(
            "MDN Web Docs",
            "Authoritative web technology documentation for HTML, CSS and JavaScript",
            "fas fa-book",
            "bg-green-100",
            "text-green-600",
            &["docs", "frontend"],
            &["docs", "frontend", "web"],
            "https://developer.mozilla.org",
        ),
        card(
            "GitHub",
            "The world's largest code hosting platform",
            "fab fa-github",
            "bg-gray-100",
            "text-gray-600",
            &["tools", "devops"],
            &["hosting", "open-source", "vcs"],
            "https://github.com",
        ),
        card(
            "Stack Overflow",
            "The most popular programmer Q&A community",
            "fab fa-stack-overflow",
            "bg-orange-100",
            "text-orange-600",
            &["community", "learn"],
            &["q&a", "community", "programming"],
            "https://stackoverflow.com",
        ),
        card(
            "VS Code",
            "Microsoft's powerful code editor",
            "fas fa-code",
            "bg-blue-100",
            "text-blue-600",
            &["tools", "frontend", "backend"],
            &["editor", "ide", "tooling"],
            "https://code.visualstudio.com",
        ),
    ]
}

pub fn handle_init(empty: bool) -> Result<()> {
    let root = env::current_dir()?;
    let store = CardStore::init(&root)?;

    if !empty {
        for draft in starter_cards() {
            store.create(draft)?;
        }
    }

    println!("Initialized devnav store in {}", root.display());
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn handle_add(
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    icon: Option<String>,
    icon_bg: Option<String>,
    icon_color: Option<String>,
    categories: Vec<String>,
    tags: Vec<String>,
    favorite: bool,
    json: bool,
) -> Result<()> {
    // Syntax checks happen before any mutation
    if let Some(ref icon) = icon {
        if !validate_icon(icon) {
            return Err(DevnavError::Validation(format!(
                "invalid icon '{}'; expected a Font Awesome class like 'fas fa-code'",
                icon
            )));
        }
    }
    if let Some(ref color) = icon_color {
        if !validate_color(color) {
            return Err(DevnavError::Validation(format!(
                "invalid color '{}'; expected a Tailwind class like 'text-blue-600'",
                color
            )));
        }
    }

    let store = open_store()?;
    let card = store.create(CardDraft {
        title,
        description,
        url,
        icon,
        icon_bg,
        icon_color,
        categories: Some(categories),
        tags: if tags.is_empty() { None } else { Some(tags) },
        is_favorite: Some(favorite),
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&card)?);
    } else {
        println!("Created card ({}) - {}", short_id(&card), card.title);
    }

    Ok(())
}

pub fn handle_list(category: String, search: Option<String>, sort: Option<String>, json: bool) -> Result<()> {
    let store = open_store()?;

    let sort: SortKey = sort.as_deref().unwrap_or_default().parse().unwrap_or_default();
    let cards = query::filter_cards(
        &store.get_all()?,
        &category,
        search.as_deref().unwrap_or(""),
        sort,
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&cards)?);
    } else if cards.is_empty() {
        println!("No cards.");
    } else {
        for card in &cards {
            print_card_line(card);
        }
    }

    Ok(())
}

pub fn handle_get(id: String, json: bool) -> Result<()> {
    let store = open_store()?;
    let card = resolve_card(&store, &id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&card)?);
    } else {
        println!("Card {} ({})", card.title, short_id(&card));
        if !card.description.is_empty() {
            println!("Description: {}", card.description);
        }
        if !card.url.is_empty() {
            println!("URL: {}", card.url);
        }
        if !card.categories.is_empty() {
            println!("Categories: {}", card.categories.join(", "));
        }
        println!("Tags: {}", card.tags.join(", "));
        println!("Favorite: {}", card.is_favorite);
        println!("Created: {}", card.create_time.to_rfc3339());
        println!("Updated: {}", card.update_time.to_rfc3339());
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn handle_update(
    id: String,
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    icon: Option<String>,
    icon_bg: Option<String>,
    icon_color: Option<String>,
    categories: Vec<String>,
    tags: Vec<String>,
    favorite: Option<bool>,
    json: bool,
) -> Result<()> {
    if let Some(ref icon) = icon {
        if !validate_icon(icon) {
            return Err(DevnavError::Validation(format!(
                "invalid icon '{}'; expected a Font Awesome class like 'fas fa-code'",
                icon
            )));
        }
    }
    if let Some(ref color) = icon_color {
        if !validate_color(color) {
            return Err(DevnavError::Validation(format!(
                "invalid color '{}'; expected a Tailwind class like 'text-blue-600'",
                color
            )));
        }
    }

    let store = open_store()?;
    let card = resolve_card(&store, &id)?;

    // Seed the draft with current content, then overlay the given flags;
    // the store overwrites all fields from the final draft.
    let mut draft = card.to_draft();
    if title.is_some() {
        draft.title = title;
    }
    if description.is_some() {
        draft.description = description;
    }
    if url.is_some() {
        draft.url = url;
    }
    if icon.is_some() {
        draft.icon = icon;
    }
    if icon_bg.is_some() {
        draft.icon_bg = icon_bg;
    }
    if icon_color.is_some() {
        draft.icon_color = icon_color;
    }
    if !categories.is_empty() {
        draft.categories = Some(categories);
    }
    if !tags.is_empty() {
        draft.tags = Some(tags);
    }
    if favorite.is_some() {
        draft.is_favorite = favorite;
    }

    let updated = store.update(&card.id, draft)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&updated)?);
    } else {
        println!("Updated card ({}) - {}", short_id(&updated), updated.title);
    }

    Ok(())
}

pub fn handle_favorite(id: String, json: bool) -> Result<()> {
    let store = open_store()?;
    let card = resolve_card(&store, &id)?;
    let toggled = store.toggle_favorite(&card.id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&toggled)?);
    } else {
        let state = if toggled.is_favorite {
            "favorited"
        } else {
            "unfavorited"
        };
        println!("{} ({}) - {}", state, short_id(&toggled), toggled.title);
    }

    Ok(())
}

pub fn handle_delete(id: String, force: bool) -> Result<()> {
    let store = open_store()?;
    let card = resolve_card(&store, &id)?;

    if !force {
        let prompt = format!("Delete card ({}) - {}?", short_id(&card), card.title);
        if !confirm_or_bail(&prompt, "Use --force to delete in non-interactive mode")? {
            return Ok(());
        }
    }

    store.delete(&card.id)?;
    println!("Deleted card ({}) - {}", short_id(&card), card.title);
    Ok(())
}

pub fn handle_search(query_text: String, json: bool) -> Result<()> {
    let store = open_store()?;
    let results = query::search_all(&store.get_all()?, &query_text);

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else if results.is_empty() {
        println!("No results found for '{}'.", query_text);
    } else {
        println!("Search results for '{}':\n", query_text);
        for card in &results {
            print_card_line(card);
        }
    }

    Ok(())
}

pub fn handle_favorites(search: Option<String>, json: bool) -> Result<()> {
    let store = open_store()?;
    let favorites = store.list_favorites()?;
    let results = query::drawer_favorites(&favorites, search.as_deref().unwrap_or(""));

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else if results.is_empty() {
        println!("No favorites.");
    } else {
        for card in &results {
            print_card_line(card);
        }
    }

    Ok(())
}

pub fn handle_categories(json: bool) -> Result<()> {
    let store = open_store()?;
    let counts = store.category_counts()?;

    if json {
        let entries: Vec<serde_json::Value> = counts
            .iter()
            .map(|(name, count)| serde_json::json!({ "category": name, "count": count }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else if counts.is_empty() {
        println!("No categories.");
    } else {
        for (name, count) in &counts {
            println!("  {} ({})", name, count);
        }
    }

    Ok(())
}

pub fn handle_export(output: Option<PathBuf>) -> Result<()> {
    let store = open_store()?;
    let cards = store.get_all()?;

    let path = output.unwrap_or_else(|| {
        PathBuf::from(format!("devnav-cards-{}.json", Utc::now().format("%Y-%m-%d")))
    });

    let json = transfer::to_json(&transfer::export_document(&cards))?;
    fs::write(&path, json)?;

    println!("Exported {} cards to {}", cards.len(), path.display());
    Ok(())
}

pub fn handle_import(file: PathBuf) -> Result<()> {
    let store = open_store()?;
    let raw = fs::read_to_string(&file)?;

    let report = transfer::import_document(&store, &raw)?;
    println!(
        "Import complete: {} succeeded, {} failed",
        report.succeeded, report.failed
    );
    Ok(())
}

pub fn handle_template(output: Option<PathBuf>) -> Result<()> {
    let path = output.unwrap_or_else(|| PathBuf::from("devnav-template.json"));
    let json = transfer::to_json(&transfer::template_document())?;
    fs::write(&path, json)?;

    println!("Wrote template to {}", path.display());
    Ok(())
}

pub fn handle_sync_push() -> Result<()> {
    let store = open_store()?;
    let sync = GithubSync::new(SyncConfig::from_env())?;

    let cards = store.get_all()?;
    sync.push(&cards)?;

    println!("Pushed {} cards", cards.len());
    Ok(())
}

pub fn handle_sync_pull(force: bool) -> Result<()> {
    let store = open_store()?;
    let sync = GithubSync::new(SyncConfig::from_env())?;

    // Fetch and validate the whole document before touching local state
    let remote = sync.pull()?;

    if !force {
        let local = store.get_all()?.len();
        let prompt = format!(
            "Replace {} local cards with {} remote cards?",
            local,
            remote.len()
        );
        if !confirm_or_bail(&prompt, "Use --force to pull in non-interactive mode")? {
            return Ok(());
        }
    }

    store.replace_all(&remote)?;
    println!("Pulled {} cards", remote.len());
    Ok(())
}
