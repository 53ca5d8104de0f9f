use std::env;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use crate::clipboard::{self, Clipboard, StdoutClipboard};
use crate::config::ClipboardChoice;
use crate::entity::{NewPrompt, Prompt, TaxonomyItem, TaxonomyKind};
use crate::error::{PromptshelfError, Result};
use crate::mcp::PromptshelfServer;
use crate::search::PromptFilter;
use crate::session::Session;
use crate::storage::{PromptUpdate, TaxonomyUpdate, SHELF_DIR};
use crate::template::Bindings;

use super::commands::{AddArgs, TaxonomyAction, UpdateArgs};

/// Find the library root by looking for .promptshelf/ or .git/
fn find_project_root() -> PathBuf {
    let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    let mut current = cwd.as_path();
    loop {
        if current.join(SHELF_DIR).exists() || current.join(".git").exists() {
            return current.to_path_buf();
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return cwd,
        }
    }
}

fn open_session() -> Result<Session> {
    Session::open(&find_project_root())
}

/// Remind the user that the sample library forgets everything.
fn note_if_ephemeral(session: &Session) {
    if !session.is_persistent() {
        eprintln!("Note: no library found, using sample data. Changes are not saved; run 'promptshelf init' to create one.");
    }
}

fn get_git_author() -> Option<String> {
    std::process::Command::new("git")
        .args(["config", "user.name"])
        .output()
        .ok()
        .and_then(|output| {
            if output.status.success() {
                String::from_utf8(output.stdout)
                    .ok()
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
            } else {
                None
            }
        })
}

fn read_stdin() -> Result<String> {
    let mut content = String::new();
    io::stdin().read_to_string(&mut content)?;
    Ok(content)
}

/// Ask a yes/no question on a terminal. Fails when stdin is not a terminal.
fn confirm(question: &str) -> Result<bool> {
    eprintln!("{} [y/N] ", question);

    if !atty::is(atty::Stream::Stdin) {
        return Err(PromptshelfError::Validation(
            "Use --force to delete in non-interactive mode".to_string(),
        ));
    }

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

fn prompt_line(p: &Prompt) -> String {
    let mut flags = String::new();
    if p.favorite {
        flags.push_str(" ★");
    }
    let meta: Vec<&str> = [p.category.as_deref(), p.prompt_type.as_deref()]
        .into_iter()
        .flatten()
        .collect();
    let meta = if meta.is_empty() {
        String::new()
    } else {
        format!(" [{}]", meta.join(" | "))
    };
    format!(
        "  {:03} ({}){}{} {}",
        p.sequence_number,
        p.short_id(),
        flags,
        meta,
        p.title
    )
}

pub fn handle_init(no_defaults: bool) -> Result<()> {
    let root = env::current_dir()?;

    let session = Session::init(&root, !no_defaults)?;

    println!("Initialized prompt library in {}", root.display());
    if !no_defaults {
        let categories = session.list_taxonomy(TaxonomyKind::Category)?.len();
        let types = session.list_taxonomy(TaxonomyKind::Type)?.len();
        println!("  {} categories and {} types added", categories, types);
    }

    Ok(())
}

pub fn handle_add(args: AddArgs) -> Result<()> {
    let mut session = open_session()?;

    let content = if args.stdin {
        read_stdin()?
    } else {
        args.content.unwrap_or_default()
    };

    let prompt = session.create_prompt(NewPrompt {
        title: args.title,
        content,
        category: args.category,
        prompt_type: args.prompt_type,
        tags: args.tags,
        favorite: args.favorite,
        created_by: get_git_author(),
    })?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&prompt)?);
    } else {
        println!(
            "Created prompt {:03} ({}) - {}",
            prompt.sequence_number,
            prompt.short_id(),
            prompt.title
        );
        let vars = prompt.variables();
        if !vars.is_empty() {
            println!("  variables: {}", vars.join(", "));
        }
    }
    note_if_ephemeral(&session);

    Ok(())
}

pub fn handle_list(
    category: Option<String>,
    prompt_type: Option<String>,
    tags: Vec<String>,
    favorites: bool,
    json: bool,
) -> Result<()> {
    let session = open_session()?;

    let filter = PromptFilter::new()
        .with_category(category.as_deref())
        .with_type(prompt_type.as_deref())
        .with_tags(tags)
        .favorites(favorites);
    let prompts = session.list_prompts(&filter)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&prompts)?);
    } else if prompts.is_empty() {
        println!("No prompts found.");
    } else {
        println!("Prompts:\n");
        for p in prompts {
            println!("{}", prompt_line(&p));
            if !p.tags.is_empty() {
                println!("      tags: {}", p.tags.join(", "));
            }
        }
    }

    Ok(())
}

pub fn handle_get(id: String, json: bool) -> Result<()> {
    let session = open_session()?;
    let p = session.get_prompt(&id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&p)?);
    } else {
        println!("Prompt {:03} ({})", p.sequence_number, p.id);
        println!("Title: {}", p.title);
        if let Some(ref category) = p.category {
            println!("Category: {}", category);
        }
        if let Some(ref prompt_type) = p.prompt_type {
            println!("Type: {}", prompt_type);
        }
        if !p.tags.is_empty() {
            println!("Tags: {}", p.tags.join(", "));
        }
        if p.favorite {
            println!("Favorite: yes");
        }
        let vars = p.variables();
        if !vars.is_empty() {
            println!("Variables: {}", vars.join(", "));
        }
        println!("Created: {}", p.created_at.format("%Y-%m-%d %H:%M"));
        if let Some(ref author) = p.created_by {
            println!("Author: {}", author);
        }
        println!("\n{}", p.content);
    }

    Ok(())
}

pub fn handle_update(args: UpdateArgs) -> Result<()> {
    let mut session = open_session()?;

    let content = if args.stdin {
        Some(read_stdin()?)
    } else {
        args.content
    };

    let category = if args.clear_category {
        Some(None)
    } else {
        args.category.map(Some)
    };
    let prompt_type = if args.clear_type {
        Some(None)
    } else {
        args.prompt_type.map(Some)
    };

    let updates = PromptUpdate {
        title: args.title,
        content,
        category,
        prompt_type,
        add_tags: args.tags,
        remove_tags: args.remove_tags,
        ..Default::default()
    };

    let prompt = session.update_prompt(&args.id, updates)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&prompt)?);
    } else {
        println!(
            "Updated prompt {:03} ({}) - {}",
            prompt.sequence_number,
            prompt.short_id(),
            prompt.title
        );
    }
    note_if_ephemeral(&session);

    Ok(())
}

pub fn handle_delete(id: String, force: bool) -> Result<()> {
    let mut session = open_session()?;
    let prompt = session.get_prompt(&id)?;

    if !force {
        let question = format!(
            "Delete prompt {:03} ({}) - {}?",
            prompt.sequence_number,
            prompt.short_id(),
            prompt.title
        );
        if !confirm(&question)? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let deleted = session.delete_prompt(&prompt.id.to_string())?;

    println!(
        "Deleted prompt {:03} ({}) - {}",
        deleted.sequence_number,
        deleted.short_id(),
        deleted.title
    );
    note_if_ephemeral(&session);

    Ok(())
}

pub fn handle_favorite(id: String, json: bool) -> Result<()> {
    let mut session = open_session()?;
    let prompt = session.toggle_favorite(&id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&prompt)?);
    } else {
        let state = if prompt.favorite { "Favorited" } else { "Unfavorited" };
        println!(
            "{} prompt {:03} ({}) - {}",
            state,
            prompt.sequence_number,
            prompt.short_id(),
            prompt.title
        );
    }
    note_if_ephemeral(&session);

    Ok(())
}

pub fn handle_vars(id: String, json: bool) -> Result<()> {
    let session = open_session()?;
    let vars = session.variables(&id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&vars)?);
    } else if vars.is_empty() {
        println!("No variables.");
    } else {
        for v in vars {
            println!("{}", v);
        }
    }

    Ok(())
}

pub fn handle_compile(id: String, vars: Vec<(String, String)>, json: bool) -> Result<()> {
    let session = open_session()?;
    let values: Bindings = vars.into_iter().collect();
    let text = session.compile(&id, &values)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "text": text }))?);
    } else {
        println!("{}", text);
    }

    Ok(())
}

/// Ask for every variable on the terminal. An empty answer leaves it blank.
fn ask_values(names: &[String]) -> Result<Bindings> {
    if !atty::is(atty::Stream::Stdin) {
        return Err(PromptshelfError::Validation(
            "--interactive needs a terminal; use --var name=value instead".to_string(),
        ));
    }

    let mut values = Bindings::new();
    for name in names {
        eprint!("{}: ", name);
        io::stderr().flush()?;
        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        values.insert(name, input.trim_end_matches(['\r', '\n']));
    }
    Ok(values)
}

pub fn handle_copy(
    id: String,
    vars: Vec<(String, String)>,
    interactive: bool,
    stdout: bool,
) -> Result<()> {
    let session = open_session()?;

    let values = if interactive {
        let names = session.variables(&id)?;
        Some(ask_values(&names)?)
    } else if vars.is_empty() {
        None
    } else {
        Some(vars.into_iter().collect::<Bindings>())
    };

    let mut target: Box<dyn Clipboard> = if stdout {
        Box::new(StdoutClipboard)
    } else {
        clipboard::for_choice(session.config().copy.clipboard)
    };

    let prompt = session.get_prompt(&id)?;
    session.copy_prompt(&id, values.as_ref(), target.as_mut())?;

    if !stdout && session.config().copy.clipboard != ClipboardChoice::Stdout {
        eprintln!(
            "Copied prompt {:03} ({}) to {}",
            prompt.sequence_number,
            prompt.short_id(),
            target.target()
        );
    }

    Ok(())
}

pub fn handle_search(query: String, limit: usize, json: bool) -> Result<()> {
    let session = open_session()?;
    let results = session.search(&query, limit)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else if results.is_empty() {
        println!("No results found for '{}'.", query);
    } else {
        println!("Search results for '{}':\n", query);
        for hit in results {
            println!("{}", prompt_line(&hit.prompt));
            if let Some(snippet) = hit.content_snippet {
                // FTS5 marks matches with <mark>
                let clean_snippet = snippet
                    .replace("<mark>", "\x1b[1m")
                    .replace("</mark>", "\x1b[0m");
                println!("      {}", clean_snippet);
            }
        }
    }

    Ok(())
}

fn taxonomy_line(item: &TaxonomyItem) -> String {
    format!("  ({}) {} [{}]", item.short_id(), item.name, item.color)
}

fn plural(kind: TaxonomyKind) -> &'static str {
    match kind {
        TaxonomyKind::Category => "Categories",
        TaxonomyKind::Type => "Types",
        TaxonomyKind::Tag => "Tags",
    }
}

pub fn handle_taxonomy(kind: TaxonomyKind, action: TaxonomyAction) -> Result<()> {
    let mut session = open_session()?;

    match action {
        TaxonomyAction::List { json } => {
            let items = session.list_taxonomy(kind)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else if items.is_empty() {
                println!("No {} found.", plural(kind).to_lowercase());
            } else {
                println!("{}:\n", plural(kind));
                for item in &items {
                    println!("{}", taxonomy_line(item));
                }
            }
        }
        TaxonomyAction::Add { name, color, json } => {
            let item = session.add_taxonomy(kind, &name, color)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&item)?);
            } else {
                println!("Created {} {} ({})", kind, item.name, item.short_id());
            }
            note_if_ephemeral(&session);
        }
        TaxonomyAction::Update {
            id,
            name,
            color,
            json,
        } => {
            let cascade = session.update_taxonomy(kind, &id, TaxonomyUpdate { name, color })?;
            if json {
                println!("{}", serde_json::to_string_pretty(&cascade)?);
            } else {
                println!(
                    "Updated {} {} ({})",
                    kind,
                    cascade.item.name,
                    cascade.item.short_id()
                );
                if cascade.prompts_affected > 0 {
                    println!("  {} prompt(s) updated", cascade.prompts_affected);
                }
            }
            note_if_ephemeral(&session);
        }
        TaxonomyAction::Delete { id, force } => {
            if !force {
                let question = format!("Delete {} '{}'? Prompts using it will lose it.", kind, id);
                if !confirm(&question)? {
                    println!("Cancelled.");
                    return Ok(());
                }
            }
            let cascade = session.delete_taxonomy(kind, &id)?;
            println!("Deleted {} {}", kind, cascade.item.name);
            if cascade.prompts_affected > 0 {
                println!("  removed from {} prompt(s)", cascade.prompts_affected);
            }
            note_if_ephemeral(&session);
        }
    }

    Ok(())
}

pub fn handle_serve() -> Result<()> {
    let session = open_session()?;
    tracing::info!(backend = %session.backend(), "starting MCP server on stdio");

    let runtime = tokio::runtime::Runtime::new()?;
    runtime
        .block_on(async {
            PromptshelfServer::new(session)
                .serve(rmcp::transport::stdio())
                .await
        })
        .map_err(|e| PromptshelfError::Storage(format!("MCP server error: {}", e)))
}
