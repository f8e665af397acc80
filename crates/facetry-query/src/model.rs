//! The search config round-tripped with UI clients, and its selectors.
//!
//! A [`SearchConfig`] is the only state that crosses the client boundary.
//! Clients edit selectors, filters and facet selections, send the config
//! back, and receive it updated with fresh counts and fingerprints.

use facetry_core::{
    DateTimeDisplayFormat, Error, FieldDescriptor, Result, Schema, ValueKind, DEFAULT_PAGE_SIZE,
};
use serde::{Deserialize, Serialize};

use crate::facets::FacetSet;
use crate::filter::{FieldFilter, LogicalOperator};
use crate::index::IndexResponse;
use crate::reconcile::FacetReconciler;

// ============================================================================
// Selectors
// ============================================================================

/// Sort direction of an ordering selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Largest first.
    Descending,
    /// Not ordered by this field.
    #[default]
    None,
    /// Smallest first.
    Ascending,
}

/// A field that can be returned in results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultFieldSelector {
    /// Wire name.
    pub field_name: String,
    /// Display name.
    pub display_name: String,
    /// Include the field in results.
    #[serde(default = "default_true")]
    pub selected: bool,
    /// Number format hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_format: Option<String>,
    /// Date-time format hint.
    #[serde(default)]
    pub date_time_format: DateTimeDisplayFormat,
    /// Field value kind.
    #[serde(default)]
    pub value_kind: ValueKind,
}

fn default_true() -> bool {
    true
}

impl ResultFieldSelector {
    /// Selected selector for `field`.
    pub fn for_field(field: &FieldDescriptor) -> Self {
        Self {
            field_name: field.wire_name.clone(),
            display_name: field.display_name(),
            selected: true,
            number_format: field.number_format().map(str::to_string),
            date_time_format: field.date_time_format(),
            value_kind: field.value_kind,
        }
    }
}

/// A searchable field the term can be restricted to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFieldSelector {
    /// Wire name.
    pub field_name: String,
    /// Display name.
    pub display_name: String,
    /// Restrict the search to this field.
    #[serde(default)]
    pub selected: bool,
}

impl SearchFieldSelector {
    /// Unselected selector for `field`.
    pub fn for_field(field: &FieldDescriptor) -> Self {
        Self {
            field_name: field.wire_name.clone(),
            display_name: field.display_name(),
            selected: false,
        }
    }
}

/// A sortable field and its requested direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderingSelector {
    /// Wire name.
    pub field_name: String,
    /// Display name.
    pub display_name: String,
    /// Requested direction.
    #[serde(default)]
    pub order: SortOrder,
}

impl OrderingSelector {
    /// Unordered selector for `field`.
    pub fn for_field(field: &FieldDescriptor) -> Self {
        Self {
            field_name: field.wire_name.clone(),
            display_name: field.display_name(),
            order: SortOrder::None,
        }
    }
}

// ============================================================================
// SearchConfig
// ============================================================================

/// Client-visible search state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Free-text search term.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,

    /// Fields returned in results.
    #[serde(default)]
    pub select_fields: Vec<ResultFieldSelector>,

    /// Fields the term is searched in.
    #[serde(default)]
    pub search_fields: Vec<SearchFieldSelector>,

    /// Sortable fields and their directions.
    #[serde(default)]
    pub ordering_fields: Vec<OrderingSelector>,

    /// Filters on numeric fields.
    #[serde(default)]
    pub numeric_field_filters: Vec<FieldFilter>,

    /// Filters on string fields.
    #[serde(default)]
    pub string_field_filters: Vec<FieldFilter>,

    /// Filters on boolean fields.
    #[serde(default)]
    pub bool_field_filters: Vec<FieldFilter>,

    /// Filters on date-time fields.
    #[serde(default)]
    pub date_time_field_filters: Vec<FieldFilter>,

    /// Facet sets; `None` until the first search returns buckets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facets: Option<Vec<FacetSet>>,

    /// Operator between selected facets.
    #[serde(default = "default_combine_facets")]
    pub combine_facets: LogicalOperator,

    /// Operator between selected values of one facet.
    #[serde(default = "default_combine_facet_values")]
    pub combine_facet_values: LogicalOperator,

    /// 1-based page number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,

    /// Page size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results_per_page: Option<u32>,

    /// Cached total match count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_results: Option<u64>,

    /// Cached page count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u64>,

    /// Fingerprint of the filter the cached state was computed with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_hash: Option<String>,

    /// Fingerprint of the search term the cached state was computed with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_hash: Option<String>,
}

fn default_combine_facets() -> LogicalOperator {
    LogicalOperator::And
}

fn default_combine_facet_values() -> LogicalOperator {
    LogicalOperator::Or
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            search: None,
            select_fields: Vec::new(),
            search_fields: Vec::new(),
            ordering_fields: Vec::new(),
            numeric_field_filters: Vec::new(),
            string_field_filters: Vec::new(),
            bool_field_filters: Vec::new(),
            date_time_field_filters: Vec::new(),
            facets: None,
            combine_facets: default_combine_facets(),
            combine_facet_values: default_combine_facet_values(),
            page: None,
            results_per_page: None,
            total_results: None,
            total_pages: None,
            filter_hash: None,
            search_hash: None,
        }
    }
}

impl SearchConfig {
    /// Fresh config for `schema`: every selector, an unset filter per
    /// filterable field, page 1 of the default page size.
    pub fn empty(schema: &Schema) -> Self {
        let mut config = Self {
            page: Some(1),
            results_per_page: Some(DEFAULT_PAGE_SIZE),
            ..Self::default()
        };
        config.hydrate(schema);
        config
    }

    /// Fresh config carrying the facets and totals of an initial response.
    pub fn with_initial_facets<D>(schema: &Schema, response: &IndexResponse<D>) -> Result<Self> {
        let mut config = Self::empty(schema);
        config.hydrate_facets(schema, response)?;
        Ok(config)
    }

    /// Set the page size.
    pub fn with_page_size(mut self, results_per_page: u32) -> Self {
        self.results_per_page = Some(results_per_page);
        self
    }

    /// Set the search term.
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Fill whatever a client left out: selectors, filter lists, paging.
    /// Parts already present are kept as they are.
    pub fn hydrate(&mut self, schema: &Schema) {
        if self.select_fields.is_empty() {
            self.select_fields = schema
                .fields()
                .iter()
                .map(ResultFieldSelector::for_field)
                .collect();
        }
        if self.search_fields.is_empty() {
            self.search_fields = schema
                .searchable()
                .map(SearchFieldSelector::for_field)
                .collect();
        }
        if self.ordering_fields.is_empty() {
            self.ordering_fields = schema.sortable().map(OrderingSelector::for_field).collect();
        }

        let filters_of = |kind: ValueKind| -> Vec<FieldFilter> {
            schema
                .filterable()
                .filter(|f| f.value_kind == kind)
                .map(FieldFilter::for_field)
                .collect()
        };
        if self.numeric_field_filters.is_empty() {
            self.numeric_field_filters = filters_of(ValueKind::Numeric);
        }
        if self.string_field_filters.is_empty() {
            self.string_field_filters = filters_of(ValueKind::String);
        }
        if self.bool_field_filters.is_empty() {
            self.bool_field_filters = filters_of(ValueKind::Boolean);
        }
        if self.date_time_field_filters.is_empty() {
            self.date_time_field_filters = filters_of(ValueKind::DateTime);
        }

        self.page.get_or_insert(1);
        self.results_per_page.get_or_insert(DEFAULT_PAGE_SIZE);
    }

    /// Fill facets and totals from an initial response where unset.
    pub fn hydrate_facets<D>(&mut self, schema: &Schema, response: &IndexResponse<D>) -> Result<()> {
        if self.facets.is_none() {
            self.facets = Some(FacetReconciler::new(schema).build_initial(&response.facets)?);
        }
        if self.total_results.is_none() {
            self.total_results = Some(response.total_count.unwrap_or(0));
        }
        if self.total_pages.is_none() {
            let per_page = self.results_per_page.unwrap_or(DEFAULT_PAGE_SIZE);
            self.total_pages = self.total_results.map(|total| page_count(total, per_page));
        }
        Ok(())
    }

    /// All field filters, numeric first, then string, boolean, date-time.
    pub fn field_filters(&self) -> impl Iterator<Item = &FieldFilter> {
        self.numeric_field_filters
            .iter()
            .chain(&self.string_field_filters)
            .chain(&self.bool_field_filters)
            .chain(&self.date_time_field_filters)
    }

    /// First filter on `field_name`, for editing.
    pub fn filter_mut(&mut self, field_name: &str) -> Option<&mut FieldFilter> {
        self.numeric_field_filters
            .iter_mut()
            .chain(&mut self.string_field_filters)
            .chain(&mut self.bool_field_filters)
            .chain(&mut self.date_time_field_filters)
            .find(|f| f.field_name == field_name)
    }

    /// Facet set for `facet_name`, for editing selections.
    pub fn facet_mut(&mut self, facet_name: &str) -> Option<&mut FacetSet> {
        self.facets
            .as_mut()?
            .iter_mut()
            .find(|f| f.facet_name == facet_name)
    }

    /// Drop every cached count and facet and return to page 1.
    pub(crate) fn invalidate(&mut self) {
        self.total_results = None;
        self.total_pages = None;
        self.facets = None;
        self.page = Some(1);
    }

    /// Check that every field the config refers to exists in `schema`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the first unknown field, or a facet
    /// set whose field is not facetable.
    pub fn validate_field_names(&self, schema: &Schema) -> Result<()> {
        let names = self
            .select_fields
            .iter()
            .map(|s| s.field_name.as_str())
            .chain(self.search_fields.iter().map(|s| s.field_name.as_str()))
            .chain(self.ordering_fields.iter().map(|s| s.field_name.as_str()))
            .chain(self.field_filters().map(|f| f.field_name.as_str()));
        for name in names {
            schema.require(name)?;
        }

        for facet in self.facets.iter().flatten() {
            let field = schema.require(&facet.facet_name)?;
            if !field.capabilities.facetable {
                return Err(Error::config_field(&field.wire_name, "is not facetable"));
            }
        }
        Ok(())
    }
}

/// Pages needed for `total` results, rounding up. One page when the page
/// size is zero.
pub fn page_count(total: u64, results_per_page: u32) -> u64 {
    if results_per_page == 0 {
        return 1;
    }
    total.div_ceil(u64::from(results_per_page))
}

// ============================================================================
// Tests
// ============================================================================
