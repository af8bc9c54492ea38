use clap::Parser;
use devnav::cli::{
    handle_add, handle_categories, handle_delete, handle_export, handle_favorite,
    handle_favorites, handle_get, handle_import, handle_init, handle_list, handle_search,
    handle_sync_pull, handle_sync_push, handle_template, handle_update, Cli, Commands, SyncAction,
};

fn main() {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { empty } => handle_init(empty),
        Commands::Add {
            title,
            description,
            url,
            icon,
            icon_bg,
            icon_color,
            categories,
            tags,
            favorite,
            json,
        } => handle_add(
            title, description, url, icon, icon_bg, icon_color, categories, tags, favorite, json,
        ),
        Commands::List {
            category,
            search,
            sort,
            json,
        } => handle_list(category, search, sort, json),
        Commands::Get { id, json } => handle_get(id, json),
        Commands::Update {
            id,
            title,
            description,
            url,
            icon,
            icon_bg,
            icon_color,
            categories,
            tags,
            favorite,
            json,
        } => handle_update(
            id, title, description, url, icon, icon_bg, icon_color, categories, tags, favorite,
            json,
        ),
        Commands::Favorite { id, json } => handle_favorite(id, json),
        Commands::Delete { id, force } => handle_delete(id, force),
        Commands::Search { query, json } => handle_search(query, json),
        Commands::Favorites { search, json } => handle_favorites(search, json),
        Commands::Categories { json } => handle_categories(json),
        Commands::Export { output } => handle_export(output),
        Commands::Import { file } => handle_import(file),
        Commands::Template { output } => handle_template(output),
        Commands::Sync(sync_cmd) => match sync_cmd.action {
            SyncAction::Push => handle_sync_push(),
            SyncAction::Pull { force } => handle_sync_pull(force),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
