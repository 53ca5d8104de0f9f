use clap::{Args, Parser, Subcommand};

use crate::entity::Color;

#[derive(Parser, Debug)]
#[command(name = "promptshelf")]
#[command(version, about = "A local library of reusable AI prompts with {{variable}} templates")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new prompt library in the current directory
    Init {
        /// Start without the default categories and types
        #[arg(long)]
        no_defaults: bool,
    },

    /// Add a new prompt
    Add(AddArgs),

    /// List prompts
    List {
        /// Only prompts in this category ("all" for every category)
        #[arg(long)]
        category: Option<String>,

        /// Only prompts of this type ("all" for every type)
        #[arg(long = "type")]
        prompt_type: Option<String>,

        /// Only prompts with this tag (repeatable, all must match)
        #[arg(long = "tag", short = 't')]
        tags: Vec<String>,

        /// Only favorites
        #[arg(long, short = 'f')]
        favorites: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a single prompt
    Get {
        /// Prompt ID (sequence number like "3" or UUID prefix like "a1b2c")
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Update a prompt
    Update(UpdateArgs),

    /// Delete a prompt
    Delete {
        /// Prompt ID (sequence number or UUID prefix)
        id: String,

        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
    },

    /// Toggle a prompt's favorite flag
    Favorite {
        /// Prompt ID (sequence number or UUID prefix)
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the variables a prompt uses
    Vars {
        /// Prompt ID (sequence number or UUID prefix)
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print a prompt with its variables filled in
    Compile {
        /// Prompt ID (sequence number or UUID prefix)
        id: String,

        /// Variable value as name=value (repeatable). Unset variables are left empty.
        #[arg(long = "var", value_parser = parse_var)]
        vars: Vec<(String, String)>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Copy a prompt to the clipboard
    Copy {
        /// Prompt ID (sequence number or UUID prefix)
        id: String,

        /// Variable value as name=value (repeatable)
        #[arg(long = "var", value_parser = parse_var)]
        vars: Vec<(String, String)>,

        /// Ask for each variable's value
        #[arg(long, short = 'i', conflicts_with = "vars")]
        interactive: bool,

        /// Print instead of copying
        #[arg(long)]
        stdout: bool,
    },

    /// Full-text search across prompts
    ///
    /// Supports inline filters: category:NAME type:NAME tag:NAME is:favorite
    /// created:>YYYY-MM-DD created:<YYYY-MM-DD
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(long, default_value = "20")]
        limit: usize,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage categories
    Category(TaxonomyCommand),

    /// Manage prompt types
    Type(TaxonomyCommand),

    /// Manage tags
    Tag(TaxonomyCommand),

    /// Start the MCP server on stdio
    Serve,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Prompt title
    pub title: String,

    /// Prompt text; may contain {{variable}} placeholders
    #[arg(long, short = 'c', conflicts_with = "stdin")]
    pub content: Option<String>,

    /// Read content from stdin
    #[arg(long)]
    pub stdin: bool,

    /// Category name
    #[arg(long)]
    pub category: Option<String>,

    /// Prompt type name
    #[arg(long = "type")]
    pub prompt_type: Option<String>,

    /// Tags (can be specified multiple times)
    #[arg(long = "tag", short = 't')]
    pub tags: Vec<String>,

    /// Mark as favorite
    #[arg(long)]
    pub favorite: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Prompt ID (sequence number or UUID prefix)
    pub id: String,

    /// New title
    #[arg(long)]
    pub title: Option<String>,

    /// New content
    #[arg(long, short = 'c', conflicts_with = "stdin")]
    pub content: Option<String>,

    /// Read new content from stdin
    #[arg(long)]
    pub stdin: bool,

    /// New category
    #[arg(long, conflicts_with = "clear_category")]
    pub category: Option<String>,

    /// Remove the category
    #[arg(long)]
    pub clear_category: bool,

    /// New prompt type
    #[arg(long = "type", conflicts_with = "clear_type")]
    pub prompt_type: Option<String>,

    /// Remove the prompt type
    #[arg(long)]
    pub clear_type: bool,

    /// Tags to add (can be specified multiple times)
    #[arg(long = "tag", short = 't')]
    pub tags: Vec<String>,

    /// Tags to remove (can be specified multiple times)
    #[arg(long = "remove-tag")]
    pub remove_tags: Vec<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct TaxonomyCommand {
    #[command(subcommand)]
    pub action: TaxonomyAction,
}

#[derive(Subcommand, Debug)]
pub enum TaxonomyAction {
    /// List all entries
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add an entry
    Add {
        name: String,

        /// Color: slate, red, orange, amber, green, teal, blue, indigo, purple, pink
        #[arg(long, default_value = "slate")]
        color: Color,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rename or recolor an entry; a rename updates every prompt using it
    Update {
        /// Current name or ID prefix
        id: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New color
        #[arg(long)]
        color: Option<Color>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete an entry and remove it from every prompt using it
    Delete {
        /// Name or ID prefix
        id: String,

        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
    },
}

/// Parse a `name=value` pair. The value may itself contain `=`.
pub fn parse_var(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid variable '{}': expected name=value", s))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("invalid variable '{}': name is empty", s));
    }
    Ok((name.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_var() {
        assert_eq!(
            parse_var("topic=rust").unwrap(),
            ("topic".to_string(), "rust".to_string())
        );
        assert_eq!(
            parse_var(" eq = a=b").unwrap(),
            ("eq".to_string(), " a=b".to_string())
        );
        assert_eq!(parse_var("empty=").unwrap().1, "");
        assert!(parse_var("novalue").is_err());
        assert!(parse_var("=x").is_err());
    }

    #[test]
    fn test_cli_parses_copy_with_vars() {
        let cli = Cli::try_parse_from([
            "promptshelf", "copy", "3", "--var", "topic=rust", "--var", "tone=dry", "--stdout",
        ])
        .unwrap();
        match cli.command {
            Commands::Copy { id, vars, stdout, interactive } => {
                assert_eq!(id, "3");
                assert_eq!(vars.len(), 2);
                assert!(stdout);
                assert!(!interactive);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_parses_taxonomy_color() {
        let cli = Cli::try_parse_from(["promptshelf", "category", "add", "Legal", "--color", "teal"])
            .unwrap();
        match cli.command {
            Commands::Category(TaxonomyCommand {
                action: TaxonomyAction::Add { name, color, .. },
            }) => {
                assert_eq!(name, "Legal");
                assert_eq!(color, Color::Teal);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_rejects_interactive_with_vars() {
        let result =
            Cli::try_parse_from(["promptshelf", "copy", "1", "-i", "--var", "a=b"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
