pub mod cli;
pub mod entity;
pub mod error;
pub mod query;
pub mod storage;
pub mod sync;
pub mod transfer;

pub use error::{DevnavError, Result};
pub use storage::CardStore;
