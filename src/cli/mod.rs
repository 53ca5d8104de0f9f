mod commands;
mod handlers;

pub use commands::{parse_var, AddArgs, Cli, Commands, TaxonomyAction, TaxonomyCommand, UpdateArgs};
pub use handlers::{
    handle_add, handle_compile, handle_copy, handle_delete, handle_favorite, handle_get,
    handle_init, handle_list, handle_search, handle_serve, handle_taxonomy, handle_update,
    handle_vars,
};
