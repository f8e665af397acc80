//! Search index abstraction.
//!
//! Facetry never talks to a search service directly. Applications implement
//! [`SearchIndex`] for their backend; the orchestrator hands it the search
//! term and the generated [`SearchOptions`] and expects documents, an
//! optional total count and the facet buckets back.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use facetry_core::{FacetScalar, Result};
use serde::{Deserialize, Serialize};

use crate::options::SearchOptions;

/// One facet bucket as reported by the index.
///
/// Value facets and interval facets report `value`; marker facets report
/// `from`/`to`, either of which may be open.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    /// Discrete value, or the start of an interval bucket.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<FacetScalar>,

    /// Inclusive lower bound of a range bucket.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<FacetScalar>,

    /// Exclusive upper bound of a range bucket.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<FacetScalar>,

    /// Matching documents, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
}

impl Bucket {
    /// Value (or interval-start) bucket.
    pub fn value(value: impl Into<FacetScalar>, count: u64) -> Self {
        Self {
            value: Some(value.into()),
            count: Some(count),
            ..Self::default()
        }
    }

    /// Range bucket with optional open ends.
    pub fn range(from: Option<FacetScalar>, to: Option<FacetScalar>, count: u64) -> Self {
        Self {
            from,
            to,
            count: Some(count),
            ..Self::default()
        }
    }

    /// True when the bucket is reported by bounds rather than by value.
    pub fn is_range_shaped(&self) -> bool {
        self.value.is_none() && (self.from.is_some() || self.to.is_some())
    }
}

/// Facet buckets keyed by facet (wire) name, in index order within a facet.
pub type FacetBuckets = BTreeMap<String, Vec<Bucket>>;

/// What the index returns for one query.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexResponse<D> {
    /// Matching documents for the requested page.
    pub documents: Vec<D>,

    /// Total matches, when requested.
    pub total_count: Option<u64>,

    /// Buckets for the declared facets.
    pub facets: FacetBuckets,
}

impl<D> Default for IndexResponse<D> {
    fn default() -> Self {
        Self {
            documents: Vec::new(),
            total_count: None,
            facets: FacetBuckets::new(),
        }
    }
}

impl<D> IndexResponse<D> {
    /// Response carrying only documents.
    pub fn new(documents: Vec<D>) -> Self {
        Self {
            documents,
            ..Self::default()
        }
    }

    /// Set the total count.
    pub fn with_total_count(mut self, total: u64) -> Self {
        self.total_count = Some(total);
        self
    }

    /// Set the buckets for one facet.
    pub fn with_facet(mut self, name: impl Into<String>, buckets: Vec<Bucket>) -> Self {
        self.facets.insert(name.into(), buckets);
        self
    }
}

/// A full-text index able to run a faceted query.
///
/// Implementations report their own failures as
/// [`Error::Index`](facetry_core::Error::Index); the orchestrator passes
/// them through unchanged.
#[async_trait]
pub trait SearchIndex<D: Send + 'static>: Send + Sync {
    /// Run one query.
    async fn execute(
        &self,
        search_term: Option<&str>,
        options: &SearchOptions,
    ) -> Result<IndexResponse<D>>;

    /// Backend name for logging.
    fn name(&self) -> &str {
        "index"
    }
}

#[async_trait]
impl<D, I> SearchIndex<D> for Arc<I>
where
    D: Send + 'static,
    I: SearchIndex<D> + ?Sized,
{
    async fn execute(
        &self,
        search_term: Option<&str>,
        options: &SearchOptions,
    ) -> Result<IndexResponse<D>> {
        (**self).execute(search_term, options).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

// ============================================================================
// Tests
// ============================================================================
