//! MCP (Model Context Protocol) server for promptshelf.
//!
//! Exposes the prompt library to AI tools over stdio: prompt management,
//! template variables and compilation, taxonomy and full-text search.

pub mod error;
pub mod tools;

use std::sync::Arc;

use rmcp::{
    handler::server::wrapper::Parameters,
    model::*,
    service::RoleServer,
    tool, tool_handler, tool_router, ErrorData as McpErrorData, ServerHandler,
};
use serde_json::json;
use tokio::sync::Mutex;

use crate::entity::{validation as limits, NewPrompt};
use crate::search::PromptFilter;
use crate::session::Session;
use crate::storage::{PromptUpdate, TaxonomyUpdate};
use crate::template::{self, Bindings};
use error::McpError;
use tools::*;

/// The MCP server.
///
/// Every tool call locks the shared session for its whole duration, so calls
/// are applied one at a time.
#[derive(Clone)]
pub struct PromptshelfServer {
    pub session: Arc<Mutex<Session>>,
    /// Tool router for MCP tool handling.
    pub tool_router: rmcp::handler::server::tool::ToolRouter<Self>,
}

#[tool_router]
impl PromptshelfServer {
    pub fn new(session: Session) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            tool_router: Self::tool_router(),
        }
    }

    /// Start the MCP server on the given transport.
    ///
    /// This method runs the server until the transport is closed or an error occurs.
    pub async fn serve<T, E, A>(self, transport: T) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
    where
        T: rmcp::transport::IntoTransport<RoleServer, E, A>,
        E: std::error::Error + Send + Sync + 'static,
    {
        use rmcp::service::ServiceExt;
        let running = ServiceExt::serve(self, transport).await.map_err(|e| -> Box<dyn std::error::Error + Send + Sync> { Box::new(e) })?;
        running.waiting().await.map_err(|e| -> Box<dyn std::error::Error + Send + Sync> { Box::new(e) })?;
        Ok(())
    }

    /// Ping tool for health checks.
    #[tool(description = "Check if the server is running")]
    async fn ping(&self) -> Result<CallToolResult, McpErrorData> {
        Ok(CallToolResult::success(vec![Content::text("pong")]))
    }

    // ========================================================================
    // Prompts
    // ========================================================================

    #[tool(description = "Create a prompt. Content may contain {{name}} variables. Category and type must already exist; new tags are created.")]
    pub async fn prompt_create(
        &self,
        Parameters(params): Parameters<PromptCreateParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        let tags = params.tags.unwrap_or_default();
        if tags.len() > limits::MAX_TAGS_COUNT {
            return Err(McpError::ValidationFailed {
                field: "tags".to_string(),
                message: format!("Too many tags (max {})", limits::MAX_TAGS_COUNT),
            }
            .into());
        }

        let mut session = self.session.lock().await;
        let prompt = session
            .create_prompt(NewPrompt {
                title: params.title,
                content: params.content,
                category: params.category,
                prompt_type: params.prompt_type,
                tags,
                favorite: params.favorite.unwrap_or(false),
                created_by: None,
            })
            .map_err(McpError::from)?;

        Ok(json_result(&PromptResponse::from(prompt))?)
    }

    #[tool(description = "Get a prompt by sequence number or UUID prefix")]
    pub async fn prompt_get(
        &self,
        Parameters(params): Parameters<PromptIdParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        let session = self.session.lock().await;
        let prompt = session.get_prompt(&params.id).map_err(McpError::from)?;
        Ok(json_result(&PromptResponse::from(prompt))?)
    }

    #[tool(description = "List prompts, optionally filtered by category, type, tags or favorites")]
    pub async fn prompt_list(
        &self,
        Parameters(params): Parameters<PromptListParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        let filter = PromptFilter::new()
            .with_category(params.category.as_deref())
            .with_type(params.prompt_type.as_deref())
            .with_tags(params.tags.unwrap_or_default())
            .favorites(params.favorites_only.unwrap_or(false));
        let limit = clamp_limit(params.limit);
        let offset = params.offset.unwrap_or(0) as usize;

        let session = self.session.lock().await;
        let prompts = session.list_prompts(&filter).map_err(McpError::from)?;
        let total = prompts.len();
        let page: Vec<PromptResponse> = prompts
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(PromptResponse::from)
            .collect();

        Ok(json_result(&json!({
            "prompts": page,
            "total": total,
            "offset": offset,
            "limit": limit,
        }))?)
    }

    #[tool(description = "Update a prompt. The previous version is kept in the session history and can be restored with prompt_restore.")]
    pub async fn prompt_update(
        &self,
        Parameters(params): Parameters<PromptUpdateParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        let updates = PromptUpdate {
            title: params.title,
            content: params.content,
            category: optional_reference(params.category),
            prompt_type: optional_reference(params.prompt_type),
            favorite: params.favorite,
            set_tags: None,
            add_tags: params.add_tags.unwrap_or_default(),
            remove_tags: params.remove_tags.unwrap_or_default(),
        };

        let mut session = self.session.lock().await;
        let prompt = session
            .update_prompt(&params.id, updates)
            .map_err(McpError::from)?;
        Ok(json_result(&PromptResponse::from(prompt))?)
    }

    #[tool(description = "Delete a prompt")]
    pub async fn prompt_delete(
        &self,
        Parameters(params): Parameters<PromptIdParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        let mut session = self.session.lock().await;
        let prompt = session.delete_prompt(&params.id).map_err(McpError::from)?;
        Ok(json_result(&json!({
            "deleted": true,
            "id": prompt.id,
            "sequence_number": prompt.sequence_number,
            "title": prompt.title,
        }))?)
    }

    #[tool(description = "Toggle a prompt's favorite flag")]
    pub async fn prompt_favorite(
        &self,
        Parameters(params): Parameters<PromptIdParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        let mut session = self.session.lock().await;
        let prompt = session.toggle_favorite(&params.id).map_err(McpError::from)?;
        Ok(json_result(&PromptResponse::from(prompt))?)
    }

    // ========================================================================
    // Templates
    // ========================================================================

    #[tool(description = "List the {{variables}} used by a stored prompt (id) or by raw text (content), in order of first appearance")]
    pub async fn prompt_variables(
        &self,
        Parameters(params): Parameters<PromptVariablesParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        let session = self.session.lock().await;
        let content = resolve_source(&session, params.id, params.content)?;
        let variables = template::extract_variables(content.as_str());
        Ok(json_result(&json!({
            "count": variables.len(),
            "variables": variables,
        }))?)
    }

    #[tool(description = "Replace every {{variable}} in a stored prompt (id) or raw text (content) with the given values. Variables without a value become empty; values for unused names are ignored.")]
    pub async fn prompt_compile(
        &self,
        Parameters(params): Parameters<PromptCompileParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        let session = self.session.lock().await;
        let content = resolve_source(&session, params.id, params.content)?;
        let values = to_bindings(params.values).unwrap_or_else(Bindings::new);
        let text = Session::fill(&content, &values).map_err(McpError::from)?;
        Ok(json_result(&json!({
            "text": text,
            "variables": template::extract_variables(content.as_str()),
        }))?)
    }

    #[tool(description = "Get the text a clipboard copy of a prompt would produce. With values the prompt is compiled; without, a legend of its variables is prepended.")]
    pub async fn prompt_copy_text(
        &self,
        Parameters(params): Parameters<PromptCopyTextParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        let session = self.session.lock().await;
        let values = to_bindings(params.values);
        let text = session
            .copy_text(&params.id, values.as_ref())
            .map_err(McpError::from)?;
        Ok(json_result(&json!({ "text": text }))?)
    }

    #[tool(description = "List the revisions recorded for a prompt during this server session, oldest first")]
    pub async fn prompt_history(
        &self,
        Parameters(params): Parameters<PromptIdParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        let session = self.session.lock().await;
        let (prompt, revisions) = session.history(&params.id).map_err(McpError::from)?;
        Ok(json_result(&HistoryResponse {
            id: prompt.id.to_string(),
            sequence_number: prompt.sequence_number,
            title: prompt.title,
            revisions,
        })?)
    }

    #[tool(description = "Restore a prompt to a revision from prompt_history. The current version is recorded first, so a restore can itself be undone.")]
    pub async fn prompt_restore(
        &self,
        Parameters(params): Parameters<PromptRestoreParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        let mut session = self.session.lock().await;
        let prompt = session
            .restore_revision(&params.id, params.revision)
            .map_err(McpError::from)?;
        Ok(json_result(&PromptResponse::from(prompt))?)
    }

    // ========================================================================
    // Taxonomy
    // ========================================================================

    #[tool(description = "List categories, types or tags (kind: category, type or tag)")]
    pub async fn taxonomy_list(
        &self,
        Parameters(params): Parameters<TaxonomyListParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        let kind = parse_kind(&params.kind)?;
        let session = self.session.lock().await;
        let items = session.list_taxonomy(kind).map_err(McpError::from)?;
        Ok(json_result(&json!({
            "kind": kind,
            "items": items,
            "count": items.len(),
        }))?)
    }

    #[tool(description = "Create a category, type or tag. Names are unique per kind, ignoring case.")]
    pub async fn taxonomy_create(
        &self,
        Parameters(params): Parameters<TaxonomyCreateParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        let kind = parse_kind(&params.kind)?;
        let color = match params.color {
            Some(ref c) => parse_color(c)?,
            None => Default::default(),
        };
        let mut session = self.session.lock().await;
        let item = session
            .add_taxonomy(kind, &params.name, color)
            .map_err(McpError::from)?;
        Ok(json_result(&item)?)
    }

    #[tool(description = "Rename or recolor a category, type or tag. A rename is applied to every prompt using the old name.")]
    pub async fn taxonomy_update(
        &self,
        Parameters(params): Parameters<TaxonomyUpdateParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        let kind = parse_kind(&params.kind)?;
        let color = params.color.as_deref().map(parse_color).transpose()?;
        let mut session = self.session.lock().await;
        let cascade = session
            .update_taxonomy(
                kind,
                &params.id,
                TaxonomyUpdate {
                    name: params.name,
                    color,
                },
            )
            .map_err(McpError::from)?;
        Ok(json_result(&cascade)?)
    }

    #[tool(description = "Delete a category, type or tag and remove it from every prompt using it")]
    pub async fn taxonomy_delete(
        &self,
        Parameters(params): Parameters<TaxonomyDeleteParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        let kind = parse_kind(&params.kind)?;
        let mut session = self.session.lock().await;
        let cascade = session
            .delete_taxonomy(kind, &params.id)
            .map_err(McpError::from)?;
        Ok(json_result(&cascade)?)
    }

    // ========================================================================
    // Search
    // ========================================================================

    #[tool(description = "Full-text search over prompt titles and content. Inline filters: category:NAME type:NAME tag:NAME is:favorite created:>YYYY-MM-DD created:<YYYY-MM-DD")]
    pub async fn search_fulltext(
        &self,
        Parameters(params): Parameters<SearchFulltextParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        if params.query.trim().is_empty() {
            return Err(McpError::ValidationFailed {
                field: "query".to_string(),
                message: "Query cannot be empty".to_string(),
            }
            .into());
        }
        let limit = clamp_limit(params.limit);
        let session = self.session.lock().await;
        let hits = session
            .search(&params.query, limit)
            .map_err(McpError::from)?;
        Ok(json_result(&json!({
            "query": params.query,
            "count": hits.len(),
            "results": hits,
        }))?)
    }
}

/// The text a template tool works on: a stored prompt's content or raw text.
fn resolve_source(
    session: &Session,
    id: Option<String>,
    content: Option<String>,
) -> Result<String, McpError> {
    match (id, content) {
        (Some(id), None) => Ok(session.get_prompt(&id)?.content),
        (None, Some(content)) => Ok(content),
        _ => Err(McpError::ValidationFailed {
            field: "id".to_string(),
            message: "Provide exactly one of 'id' or 'content'".to_string(),
        }),
    }
}

#[tool_handler]
impl ServerHandler for PromptshelfServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "promptshelf is a library of reusable AI prompts. \
                 Use prompt tools to create, find and edit prompts. \
                 {{name}} in a prompt marks a variable: prompt_variables lists them \
                 and prompt_compile fills them in. Use taxonomy tools to manage \
                 categories, types and tags, and search_fulltext to search."
                    .to_string(),
            ),
        }
    }
}
