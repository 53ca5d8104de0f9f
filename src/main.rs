use clap::Parser;
use promptshelf::cli::{
    handle_add, handle_compile, handle_copy, handle_delete, handle_favorite, handle_get,
    handle_init, handle_list, handle_search, handle_serve, handle_taxonomy, handle_update,
    handle_vars, Cli, Commands,
};
use promptshelf::config::LOG_ENV;
use promptshelf::entity::TaxonomyKind;

/// Logs go to stderr; stdout carries command output and the MCP stream.
fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { no_defaults } => handle_init(no_defaults),
        Commands::Add(args) => handle_add(args),
        Commands::List {
            category,
            prompt_type,
            tags,
            favorites,
            json,
        } => handle_list(category, prompt_type, tags, favorites, json),
        Commands::Get { id, json } => handle_get(id, json),
        Commands::Update(args) => handle_update(args),
        Commands::Delete { id, force } => handle_delete(id, force),
        Commands::Favorite { id, json } => handle_favorite(id, json),
        Commands::Vars { id, json } => handle_vars(id, json),
        Commands::Compile { id, vars, json } => handle_compile(id, vars, json),
        Commands::Copy {
            id,
            vars,
            interactive,
            stdout,
        } => handle_copy(id, vars, interactive, stdout),
        Commands::Search { query, limit, json } => handle_search(query, limit, json),
        Commands::Category(cmd) => handle_taxonomy(TaxonomyKind::Category, cmd.action),
        Commands::Type(cmd) => handle_taxonomy(TaxonomyKind::Type, cmd.action),
        Commands::Tag(cmd) => handle_taxonomy(TaxonomyKind::Tag, cmd.action),
        Commands::Serve => handle_serve(),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
