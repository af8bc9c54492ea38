use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "devnav")]
#[command(version, about = "A local-first developer bookmark manager")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new devnav store in the current directory
    Init {
        /// Skip seeding the starter cards
        #[arg(long)]
        empty: bool,
    },

    /// Add a new card
    Add {
        /// Card title
        title: Option<String>,

        /// Card description
        #[arg(long, short = 'd')]
        description: Option<String>,

        /// Resource URL
        #[arg(long, short = 'u')]
        url: Option<String>,

        /// Font Awesome icon class, e.g. "fas fa-code"
        #[arg(long)]
        icon: Option<String>,

        /// Icon background class, e.g. "bg-blue-100"
        #[arg(long)]
        icon_bg: Option<String>,

        /// Icon color class, e.g. "text-blue-600"
        #[arg(long)]
        icon_color: Option<String>,

        /// Categories (can be specified multiple times)
        #[arg(long = "category", short = 'c')]
        categories: Vec<String>,

        /// Tags, comma-separated or repeated
        #[arg(long = "tag", short = 't')]
        tags: Vec<String>,

        /// Mark as favorite
        #[arg(long)]
        favorite: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List cards, filtered and sorted
    List {
        /// Category filter ("all" disables it)
        #[arg(long, short = 'c', default_value = "all")]
        category: String,

        /// Search text matched against title, description, tags, categories
        #[arg(long, short = 's')]
        search: Option<String>,

        /// Sort order: hot, newest, alphabet
        #[arg(long)]
        sort: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Get a single card by id prefix or exact title
    Get {
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Update a card's fields
    Update {
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long, short = 'd')]
        description: Option<String>,

        #[arg(long, short = 'u')]
        url: Option<String>,

        #[arg(long)]
        icon: Option<String>,

        #[arg(long)]
        icon_bg: Option<String>,

        #[arg(long)]
        icon_color: Option<String>,

        /// Replacement categories (can be specified multiple times)
        #[arg(long = "category", short = 'c')]
        categories: Vec<String>,

        /// Replacement tags, comma-separated or repeated
        #[arg(long = "tag", short = 't')]
        tags: Vec<String>,

        /// Set the favorite flag explicitly
        #[arg(long)]
        favorite: Option<bool>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Toggle a card's favorite flag
    Favorite {
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a card
    Delete {
        id: String,

        /// Skip the confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
    },

    /// Search all cards by title or description
    Search {
        query: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List favorite cards (the drawer view)
    Favorites {
        /// Search text matched against title and description
        #[arg(long, short = 's')]
        search: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List categories with card counts
    Categories {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export all cards to a JSON file
    Export {
        /// Output file (default: devnav-cards-<date>.json)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Import cards from a JSON file
    Import { file: PathBuf },

    /// Write an example import file
    Template {
        /// Output file (default: devnav-template.json)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Sync with the configured GitHub repository
    Sync(SyncCommand),
}

#[derive(Args, Debug)]
pub struct SyncCommand {
    #[command(subcommand)]
    pub action: SyncAction,
}

#[derive(Subcommand, Debug)]
pub enum SyncAction {
    /// Upload the local collection, replacing the remote document
    Push,

    /// Replace the local collection with the remote document
    Pull {
        /// Skip the confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
    },
}
