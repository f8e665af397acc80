//! Facetry Query: filters, facets and search orchestration.
//!
//! Builds index requests from a client-editable [`SearchConfig`] and folds
//! responses back into it. Depends on `facetry-core` for schemas, values and
//! errors.
//!
//! # Modules
//!
//! - [`filter`]: Field filters and filter-expression rendering
//! - [`facets`]: Facet sets, facet values and the facet filter
//! - [`declaration`]: Facet declarations and runtime range overrides
//! - [`reconcile`]: Building and reconciling facet sets from index buckets
//! - [`model`]: The round-tripped search config and its selectors
//! - [`options`]: Options sent to the index
//! - [`index`]: The [`SearchIndex`] trait and response types
//! - [`search`]: The [`Searcher`] orchestrator

#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]

pub mod declaration;
pub mod facets;
pub mod filter;
pub mod fingerprint;
pub mod index;
pub mod model;
pub mod options;
pub mod reconcile;
pub mod search;

mod proptests;

// Re-export key types at crate root for convenience
pub use declaration::{FacetDeclarationBuilder, RangeOverride, RuntimeFacetSpec};
pub use facets::{build_facet_filter, FacetRangeType, FacetSet, FacetType, FacetValue};
pub use filter::{FieldFilter, FilterBuilder, FilterOperation, FilterValue, LogicalOperator};
pub use index::{Bucket, FacetBuckets, IndexResponse, SearchIndex};
pub use model::{
    page_count, OrderingSelector, ResultFieldSelector, SearchConfig, SearchFieldSelector,
    SortOrder,
};
pub use options::{QueryType, SearchOptions};
pub use reconcile::{merge_facet_sets, FacetReconciler};
pub use search::{OptionsOverride, SearchOutcome, SearchRequest, Searcher, TermTransform};
