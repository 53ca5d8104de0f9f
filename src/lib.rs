pub mod cache;
pub mod cli;
pub mod clipboard;
pub mod config;
pub mod entity;
pub mod error;
pub mod mcp;
pub mod search;
pub mod session;
pub mod storage;
pub mod template;

pub use cache::SqliteCache;
pub use error::{PromptshelfError, Result};
pub use mcp::PromptshelfServer;
pub use session::Session;
pub use template::{compile, extract_variables, Bindings};
