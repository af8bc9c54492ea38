mod card;

pub use card::{validate_color, validate_icon, Card, CardDraft, DEFAULT_TAG};
