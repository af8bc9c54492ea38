mod commands;
mod handlers;

pub use commands::{Cli, Commands, SyncAction, SyncCommand};
pub use handlers::{
    handle_add, handle_categories, handle_delete, handle_export, handle_favorite,
    handle_favorites, handle_get, handle_import, handle_init, handle_list, handle_search,
    handle_sync_pull, handle_sync_push, handle_template, handle_update,
};
