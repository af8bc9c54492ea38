use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::entity::{Card, CardDraft};
use crate::error::{DevnavError, Result};

const DEVNAV_DIR: &str = ".devnav";
const CARDS_DB: &str = "cards.db";

/// Persistent card store. Sole owner of card identity: every create assigns
/// a fresh id and stamps both timestamps, every mutation re-stamps
/// update_time. Secondary lookups (category membership, favorite flag,
/// title) are served by indexes.
pub struct CardStore {
    conn: Connection,
    #[allow(dead_code)]
    path: PathBuf,
}

impl CardStore {
    /// Initialize a new devnav project
    pub fn init(root: &Path) -> Result<Self> {
        let devnav_dir = root.join(DEVNAV_DIR);

        if devnav_dir.exists() {
            return Err(DevnavError::AlreadyInitialized);
        }

        fs::create_dir_all(&devnav_dir)?;

        let path = devnav_dir.join(CARDS_DB);
        let conn = Connection::open(&path)?;

        let store = Self { conn, path };
        store.init_schema()?;
        Ok(store)
    }

    /// Open an existing devnav project
    pub fn open(root: &Path) -> Result<Self> {
        let path = root.join(DEVNAV_DIR).join(CARDS_DB);

        if !path.exists() {
            return Err(DevnavError::NotInitialized);
        }

        let conn = Connection::open(&path)?;
        let store = Self { conn, path };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS cards (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                url TEXT NOT NULL,
                icon TEXT NOT NULL,
                icon_bg TEXT NOT NULL,
                icon_color TEXT NOT NULL,
                categories TEXT NOT NULL,
                tags TEXT NOT NULL,
                is_favorite INTEGER NOT NULL,
                create_time TEXT NOT NULL,
                update_time TEXT NOT NULL
            )",
            [],
        )?;

        // Multi-valued category membership lookup
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS card_categories (
                card_id TEXT NOT NULL,
                category TEXT NOT NULL,
                PRIMARY KEY (card_id, category)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_card_categories_category
             ON card_categories(category)",
            [],
        )?;
        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_cards_favorite ON cards(is_favorite)",
            [],
        )?;
        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_cards_title ON cards(title)",
            [],
        )?;

        Ok(())
    }

    /// Create a new card from a draft. Assigns a fresh id and stamps both
    /// timestamps; on write failure no record is visible.
    pub fn create(&self, draft: CardDraft) -> Result<Card> {
        let card = Card::from_draft(draft);
        let tx = self.conn.unchecked_transaction()?;
        write_card(&tx, &card)?;
        tx.commit()?;
        Ok(card)
    }

    /// Overwrite all fields of an existing card except id and create_time.
    pub fn update(&self, id: &Uuid, draft: CardDraft) -> Result<Card> {
        let tx = self.conn.unchecked_transaction()?;
        let mut card = read_card(&tx, id)?.ok_or_else(|| DevnavError::CardNotFound(id.to_string()))?;
        card.apply_draft(draft);
        write_card(&tx, &card)?;
        tx.commit()?;
        Ok(card)
    }

    /// Flip the favorite flag. Read and write share one transaction so the
    /// flip cannot lose an interleaved edit.
    pub fn toggle_favorite(&self, id: &Uuid) -> Result<Card> {
        let tx = self.conn.unchecked_transaction()?;
        let mut card = read_card(&tx, id)?.ok_or_else(|| DevnavError::CardNotFound(id.to_string()))?;
        card.is_favorite = !card.is_favorite;
        card.update_time = Utc::now();
        write_card(&tx, &card)?;
        tx.commit()?;
        Ok(card)
    }

    /// Hard-delete a card. Deleting a nonexistent id is not an error.
    pub fn delete(&self, id: &Uuid) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM cards WHERE id = ?1", [id.to_string()])?;
        tx.execute(
            "DELETE FROM card_categories WHERE card_id = ?1",
            [id.to_string()],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Get a single card by id
    pub fn get(&self, id: &Uuid) -> Result<Option<Card>> {
        read_card(&self.conn, id)
    }

    /// Every live card, in insertion order. Ordering for display is the
    /// query module's job.
    pub fn get_all(&self) -> Result<Vec<Card>> {
        let mut stmt = self.conn.prepare(&select_cards("ORDER BY rowid"))?;
        let cards = stmt
            .query_map([], row_to_card)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(cards)
    }

    /// Remove all cards
    pub fn clear(&self) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM cards", [])?;
        tx.execute("DELETE FROM card_categories", [])?;
        tx.commit()?;
        Ok(())
    }

    /// Replace the entire store contents in a single transaction, trusting
    /// the supplied ids and timestamps. Either every card lands or the
    /// previous contents survive untouched.
    pub fn replace_all(&self, cards: &[Card]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM cards", [])?;
        tx.execute("DELETE FROM card_categories", [])?;
        for card in cards {
            write_card(&tx, card)?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Cards whose categories contain `category` (exact match)
    pub fn list_by_category(&self, category: &str) -> Result<Vec<Card>> {
        let mut stmt = self.conn.prepare(&select_cards(
            "WHERE id IN (SELECT card_id FROM card_categories WHERE category = ?1)
             ORDER BY rowid",
        ))?;
        let cards = stmt
            .query_map([category], row_to_card)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(cards)
    }

    /// Cards with the favorite flag set
    pub fn list_favorites(&self) -> Result<Vec<Card>> {
        let mut stmt = self
            .conn
            .prepare(&select_cards("WHERE is_favorite = 1 ORDER BY rowid"))?;
        let cards = stmt
            .query_map([], row_to_card)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(cards)
    }

    /// Cards with an exact title
    pub fn find_by_title(&self, title: &str) -> Result<Vec<Card>> {
        let mut stmt = self
            .conn
            .prepare(&select_cards("WHERE title = ?1 ORDER BY rowid"))?;
        let cards = stmt
            .query_map([title], row_to_card)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(cards)
    }

    /// Distinct categories with their card counts, alphabetically
    pub fn category_counts(&self) -> Result<Vec<(String, usize)>> {
        let mut stmt = self.conn.prepare(
            "SELECT category, COUNT(*) FROM card_categories
             GROUP BY category ORDER BY category",
        )?;
        let counts = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get::<_, i64>(1)? as usize)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(counts)
    }
}

const CARD_COLUMNS: &str = "id, title, description, url, icon, icon_bg, icon_color,
             categories, tags, is_favorite, create_time, update_time";

fn select_cards(clause: &str) -> String {
    format!("SELECT {} FROM cards {}", CARD_COLUMNS, clause)
}

fn read_card(conn: &Connection, id: &Uuid) -> Result<Option<Card>> {
    let card = conn
        .query_row(
            &select_cards("WHERE id = ?1"),
            [id.to_string()],
            row_to_card,
        )
        .optional()?;
    Ok(card)
}

/// Upsert one card row and its category membership rows. The conflict
/// clause keeps the existing rowid, so updating a card does not move it
/// in the unsorted listing order.
fn write_card(conn: &Connection, card: &Card) -> Result<()> {
    conn.execute(
        "INSERT INTO cards
         (id, title, description, url, icon, icon_bg, icon_color,
          categories, tags, is_favorite, create_time, update_time)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
         ON CONFLICT(id) DO UPDATE SET
             title = excluded.title,
             description = excluded.description,
             url = excluded.url,
             icon = excluded.icon,
             icon_bg = excluded.icon_bg,
             icon_color = excluded.icon_color,
             categories = excluded.categories,
             tags = excluded.tags,
             is_favorite = excluded.is_favorite,
             create_time = excluded.create_time,
             update_time = excluded.update_time",
        params![
            card.id.to_string(),
            card.title,
            card.description,
            card.url,
            card.icon,
            card.icon_bg,
            card.icon_color,
            serde_json::to_string(&card.categories)?,
            serde_json::to_string(&card.tags)?,
            card.is_favorite,
            card.create_time.to_rfc3339(),
            card.update_time.to_rfc3339(),
        ],
    )?;

    conn.execute(
        "DELETE FROM card_categories WHERE card_id = ?1",
        [card.id.to_string()],
    )?;
    for category in &card.categories {
        conn.execute(
            "INSERT OR IGNORE INTO card_categories (card_id, category) VALUES (?1, ?2)",
            params![card.id.to_string(), category],
        )?;
    }

    Ok(())
}

fn row_to_card(row: &Row<'_>) -> rusqlite::Result<Card> {
    let id: String = row.get(0)?;
    let categories: String = row.get(7)?;
    let tags: String = row.get(8)?;
    let create_time: String = row.get(10)?;
    let update_time: String = row.get(11)?;

    Ok(Card {
        id: Uuid::parse_str(&id).map_err(|e| column_error(0, e))?,
        title: row.get(1)?,
        description: row.get(2)?,
        url: row.get(3)?,
        icon: row.get(4)?,
        icon_bg: row.get(5)?,
        icon_color: row.get(6)?,
        categories: serde_json::from_str(&categories).map_err(|e| column_error(7, e))?,
        tags: serde_json::from_str(&tags).map_err(|e| column_error(8, e))?,
        is_favorite: row.get(9)?,
        create_time: parse_timestamp(&create_time, 10)?,
        update_time: parse_timestamp(&update_time, 11)?,
    })
}

fn parse_timestamp(raw: &str, column: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| column_error(column, e))
}

fn column_error(
    column: usize,
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
}
