//! Index query options.

use serde::{Deserialize, Serialize};

/// Query syntax the index should parse the search term with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    /// Plain keyword syntax.
    #[default]
    Simple,
    /// Full query syntax (fuzzy, proximity, regex).
    Full,
}

/// Everything the index needs besides the search term.
///
/// Built by the orchestrator from a [`SearchConfig`](crate::SearchConfig);
/// callers may adjust it through an options override before it is sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Filter expression; empty for none.
    #[serde(default)]
    pub filter: String,

    /// Facet declarations.
    #[serde(default)]
    pub facets: Vec<String>,

    /// Ordering directives, `"{field} asc"` or `"{field} desc"`.
    #[serde(default)]
    pub order_by: Vec<String>,

    /// Fields to return; empty for all.
    #[serde(default)]
    pub select: Vec<String>,

    /// Fields to search in; empty for all searchable fields.
    #[serde(default)]
    pub search_fields: Vec<String>,

    /// Ask the index for the total match count.
    #[serde(default)]
    pub include_total_count: bool,

    /// Page size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<u32>,

    /// Results to skip.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<u64>,

    /// Query syntax.
    #[serde(default)]
    pub query_type: QueryType,
}
