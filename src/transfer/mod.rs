//! Conversion between the in-memory card collection and the versioned
//! Sync Document wire format, shared by file export/import and remote sync.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{Card, CardDraft};
use crate::error::{DevnavError, Result};
use crate::storage::CardStore;

/// Version stamped into every exported document.
pub const DOCUMENT_VERSION: &str = "1.0";

/// The versioned JSON envelope wrapping a card collection. Transient: it is
/// produced on demand, never persisted by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncDocument {
    pub version: String,
    pub export_date: DateTime<Utc>,
    pub cards: Vec<Card>,
}

/// Outcome of an import: per-card successes and failures, never a rollback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportReport {
    pub succeeded: usize,
    pub failed: usize,
}

/// Wrap the collection for export, stamping version and export date.
pub fn export_document(cards: &[Card]) -> SyncDocument {
    SyncDocument {
        version: DOCUMENT_VERSION.to_string(),
        export_date: Utc::now(),
        cards: cards.to_vec(),
    }
}

/// Serialize a document the way the original files are written: pretty,
/// UTF-8, camelCase keys, RFC 3339 timestamps.
pub fn to_json(doc: &SyncDocument) -> Result<String> {
    Ok(serde_json::to_string_pretty(doc)?)
}

/// Parse a full document, requiring every card to carry id and timestamps.
/// This is the remote-pull entry point: the document is authoritative, so
/// it must be completely valid before any local state is touched.
pub fn parse_document(raw: &str) -> Result<SyncDocument> {
    serde_json::from_str(raw)
        .map_err(|e| DevnavError::Format(format!("invalid sync document: {}", e)))
}

/// Import cards from a document, creating a fresh record per element.
/// Imported identity and timestamps are never trusted; each element gets a
/// new id and new timestamps through `CardStore::create`. Elements succeed
/// or fail independently.
pub fn import_document(store: &CardStore, raw: &str) -> Result<ImportReport> {
    // Elements stay raw JSON so one malformed card fails alone.
    #[derive(Deserialize)]
    struct LooseDocument {
        cards: Vec<serde_json::Value>,
    }

    let doc: LooseDocument = serde_json::from_str(raw)
        .map_err(|e| DevnavError::Format(format!("invalid import data: {}", e)))?;

    let mut report = ImportReport {
        succeeded: 0,
        failed: 0,
    };

    for element in doc.cards {
        let outcome = serde_json::from_value::<CardDraft>(element)
            .map_err(DevnavError::from)
            .and_then(|draft| store.create(draft));
        match outcome {
            Ok(_) => report.succeeded += 1,
            Err(e) => {
                tracing::warn!("skipping card during import: {}", e);
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

/// A fixed one-card example document showing users the expected shape.
pub fn template_document() -> SyncDocument {
    let example = Card::from_draft(CardDraft {
        title: Some("Example Card".to_string()),
        description: Some("Shows the structure of a card entry".to_string()),
        url: Some("https://example.com".to_string()),
        icon: Some("fas fa-star".to_string()),
        icon_bg: Some("bg-yellow-100".to_string()),
        icon_color: Some("text-yellow-600".to_string()),
        categories: Some(vec!["docs".to_string(), "frontend".to_string()]),
        tags: Some(vec!["example".to_string(), "template".to_string()]),
        is_favorite: Some(false),
    });
    export_document(&[example])
}
