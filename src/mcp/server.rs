//! Foodgram MCP Server Implementation
//!
//! Exposes browsing, favorites and the shopping list as MCP tools. Every call
//! acts on behalf of the user resolved at startup.

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};

use crate::build_info::BuildInfo;
use crate::config::Config;
use crate::db::Database;
use crate::error::AppError;
use crate::models::RecipeList;
use crate::services::recipes::{self, RecipeQuery};
use crate::services::{ingredients, tags, user_recipes, PageRequest, RequestUser};
use crate::shopping_list;

/// Foodgram MCP Service
#[derive(Clone)]
pub struct FoodgramService {
    database: Database,
    config: Config,
    user: RequestUser,
    tool_router: ToolRouter<FoodgramService>,
}

impl FoodgramService {
    pub fn new(database: Database, config: Config, user: RequestUser) -> Self {
        Self {
            database,
            config,
            user,
            tool_router: Self::tool_router(),
        }
    }
}

// ============================================================================
// Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListRecipesParams {
    /// 1-based page number
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// Only recipes by this author id
    pub author: Option<i64>,
    /// Tag slugs; a recipe matches if it has any of them
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_favorited: bool,
    #[serde(default)]
    pub is_in_shopping_cart: bool,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RecipeIdParams {
    pub recipe_id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchIngredientsParams {
    /// Name prefix, case-insensitive
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ExportShoppingListParams {
    /// Where to write the PDF
    pub output_path: String,
    /// Overrides the configured document title
    pub title: Option<String>,
}

#[derive(Debug, Serialize)]
struct RemovedResponse {
    success: bool,
    recipe_id: i64,
    message: String,
}

// ============================================================================
// Helpers
// ============================================================================

fn to_mcp(err: AppError) -> McpError {
    if err.http_status().is_server_error() {
        McpError::internal_error(err.message, None)
    } else {
        McpError::invalid_params(err.to_string(), None)
    }
}

fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(e.to_string(), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

// ============================================================================
// Tools
// ============================================================================

#[tool_router]
impl FoodgramService {
    #[tool(description = "List recipes, newest first. Filter by author id, tag slugs, or the current user's favorites/shopping cart. Paginated with page and limit.")]
    fn list_recipes(&self, Parameters(p): Parameters<ListRecipesParams>) -> Result<CallToolResult, McpError> {
        let query = RecipeQuery {
            author: p.author,
            tags: p.tags,
            is_favorited: p.is_favorited,
            is_in_shopping_cart: p.is_in_shopping_cart,
        };
        let page = PageRequest::new(p.page, p.limit);
        let result = recipes::list_recipes(
            &self.database,
            Some(self.user),
            query,
            page,
            self.config.page_size,
        )
        .map_err(to_mcp)?;
        json_result(&result)
    }

    #[tool(description = "Get a recipe with its tags, author, ingredients and amounts")]
    fn get_recipe(&self, Parameters(p): Parameters<RecipeIdParams>) -> Result<CallToolResult, McpError> {
        let recipe = recipes::get_recipe(&self.database, Some(self.user), p.recipe_id)
            .map_err(to_mcp)?;
        json_result(&recipe)
    }

    #[tool(description = "Search ingredients by name prefix. Returns id, name and measurement_unit.")]
    fn search_ingredients(&self, Parameters(p): Parameters<SearchIngredientsParams>) -> Result<CallToolResult, McpError> {
        let result = ingredients::list_ingredients(&self.database, p.name.as_deref())
            .map_err(to_mcp)?;
        json_result(&result)
    }

    #[tool(description = "Get server name, version, build number and build timestamp")]
    fn get_build_info(&self) -> Result<CallToolResult, McpError> {
        json_result(&BuildInfo::current())
    }

    #[tool(description = "List all tags with their color and slug")]
    fn list_tags(&self) -> Result<CallToolResult, McpError> {
        let result = tags::list_tags(&self.database).map_err(to_mcp)?;
        json_result(&result)
    }

    #[tool(description = "Add a recipe to the shopping cart. Fails if it is already there.")]
    fn add_to_shopping_cart(&self, Parameters(p): Parameters<RecipeIdParams>) -> Result<CallToolResult, McpError> {
        let recipe = user_recipes::add(&self.database, self.user, RecipeList::ShoppingCart, p.recipe_id)
            .map_err(to_mcp)?;
        json_result(&recipe)
    }

    #[tool(description = "Remove a recipe from the shopping cart")]
    fn remove_from_shopping_cart(&self, Parameters(p): Parameters<RecipeIdParams>) -> Result<CallToolResult, McpError> {
        user_recipes::remove(&self.database, self.user, RecipeList::ShoppingCart, p.recipe_id)
            .map_err(to_mcp)?;
        json_result(&RemovedResponse {
            success: true,
            recipe_id: p.recipe_id,
            message: "Removed from shopping cart".to_string(),
        })
    }

    #[tool(description = "Get the shopping list: ingredients of every recipe in the cart, summed per ingredient and ordered by name")]
    fn get_shopping_list(&self) -> Result<CallToolResult, McpError> {
        let items = shopping_list::for_user(&self.database, self.user).map_err(to_mcp)?;
        json_result(&items)
    }

    #[tool(description = "Render the shopping list as a PDF and write it to output_path")]
    fn export_shopping_list(&self, Parameters(p): Parameters<ExportShoppingListParams>) -> Result<CallToolResult, McpError> {
        let title = p
            .title
            .unwrap_or_else(|| self.config.shopping_list_title.clone());
        let summary = shopping_list::export_to_file(&self.database, self.user, &title, &p.output_path)
            .map_err(to_mcp)?;
        json_result(&summary)
    }

    #[tool(description = "Add a recipe to favorites. Fails if it is already a favorite.")]
    fn add_favorite(&self, Parameters(p): Parameters<RecipeIdParams>) -> Result<CallToolResult, McpError> {
        let recipe = user_recipes::add(&self.database, self.user, RecipeList::Favorites, p.recipe_id)
            .map_err(to_mcp)?;
        json_result(&recipe)
    }

    #[tool(description = "Remove a recipe from favorites")]
    fn remove_favorite(&self, Parameters(p): Parameters<RecipeIdParams>) -> Result<CallToolResult, McpError> {
        user_recipes::remove(&self.database, self.user, RecipeList::Favorites, p.recipe_id)
            .map_err(to_mcp)?;
        json_result(&RemovedResponse {
            success: true,
            recipe_id: p.recipe_id,
            message: "Removed from favorites".to_string(),
        })
    }
}

// ============================================================================
// Server Handler
// ============================================================================

#[tool_handler]
impl ServerHandler for FoodgramService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "foodgram".into(),
                version: BuildInfo::current().version.into(),
                title: Some("Foodgram".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Foodgram - recipes, favorites and shopping lists. \
                 Browse: list_recipes, get_recipe, search_ingredients, list_tags. \
                 Favorites: add_favorite/remove_favorite. \
                 Shopping: add_to_shopping_cart/remove_from_shopping_cart, get_shopping_list, \
                 export_shopping_list writes the aggregated list as a PDF. \
                 get_build_info reports the running build."
                    .into(),
            ),
        }
    }
}
