//! Search orchestration.
//!
//! [`Searcher`] turns a [`SearchConfig`] into index options, runs the query
//! through a [`SearchIndex`], and folds the response back into the config:
//!
//! 1. default the page and page size
//! 2. a changed search term invalidates totals, facets and paging
//! 3. build filter, facet declarations, ordering and selection, then apply
//!    the caller's options override
//! 4. a changed filter forces a fresh total count and returns to page 1
//! 5. compute the offset
//! 6. call the index once with the (optionally transformed) term
//! 7. store fingerprints and fill unset totals
//! 8. build or reconcile the facet sets

use std::marker::PhantomData;

use facetry_core::{schema_of, Error, Result, Schema, SearchSettings, Searchable};

use crate::declaration::{FacetDeclarationBuilder, RuntimeFacetSpec};
use crate::filter::FilterBuilder;
use crate::fingerprint::{fingerprint, fingerprint_opt};
use crate::index::{IndexResponse, SearchIndex};
use crate::model::{page_count, SearchConfig, SortOrder};
use crate::options::SearchOptions;
use crate::reconcile::FacetReconciler;

/// Caller hook run on the generated options before the query is sent.
pub type OptionsOverride = Box<dyn FnOnce(&mut SearchOptions) + Send>;

/// Caller hook producing the term actually sent to the index.
pub type TermTransform = Box<dyn FnOnce(&SearchConfig, &SearchOptions) -> Option<String> + Send>;

/// One search round trip.
pub struct SearchRequest {
    config: SearchConfig,
    options_override: Option<OptionsOverride>,
    term_transform: Option<TermTransform>,
    runtime_specs: Vec<RuntimeFacetSpec>,
}

impl SearchRequest {
    /// Request for `config` with no hooks.
    pub fn new(config: SearchConfig) -> Self {
        Self {
            config,
            options_override: None,
            term_transform: None,
            runtime_specs: Vec::new(),
        }
    }

    /// Adjust the generated options. Runs after every default is applied.
    pub fn with_options<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&mut SearchOptions) + Send + 'static,
    {
        self.options_override = Some(Box::new(f));
        self
    }

    /// Replace the term sent to the index, e.g. to append fuzzy syntax.
    /// The config keeps the original term.
    pub fn with_term_transform<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&SearchConfig, &SearchOptions) -> Option<String> + Send + 'static,
    {
        self.term_transform = Some(Box::new(f));
        self
    }

    /// Supply range data for a runtime range facet.
    pub fn with_runtime_spec(mut self, spec: RuntimeFacetSpec) -> Self {
        self.runtime_specs.push(spec);
        self
    }

    /// Supply several runtime range facet specs.
    pub fn with_runtime_specs(mut self, specs: impl IntoIterator<Item = RuntimeFacetSpec>) -> Self {
        self.runtime_specs.extend(specs);
        self
    }
}

impl std::fmt::Debug for SearchRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchRequest")
            .field("config", &self.config)
            .field("options_override", &self.options_override.is_some())
            .field("term_transform", &self.term_transform.is_some())
            .field("runtime_specs", &self.runtime_specs)
            .finish()
    }
}

/// Result of a search round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome<D> {
    /// Config updated with totals, fingerprints and facets.
    pub config: SearchConfig,
    /// Documents of the requested page.
    pub documents: Vec<D>,
}

/// Runs searches for document type `D` against index `I`.
pub struct Searcher<'s, D, I> {
    schema: &'s Schema,
    index: I,
    settings: SearchSettings,
    _documents: PhantomData<fn() -> D>,
}

impl<D, I> Searcher<'static, D, I>
where
    D: Searchable + Send,
    I: SearchIndex<D>,
{
    /// Searcher using the registered schema of `D`.
    pub fn for_type(index: I) -> Result<Self> {
        Ok(Self::new(schema_of::<D>()?, index))
    }
}

impl<'s, D, I> Searcher<'s, D, I>
where
    D: Send + 'static,
    I: SearchIndex<D>,
{
    /// Searcher over an explicit schema.
    pub fn new(schema: &'s Schema, index: I) -> Self {
        Self {
            schema,
            index,
            settings: SearchSettings::default(),
            _documents: PhantomData,
        }
    }

    /// Use `settings` for defaults.
    pub fn with_settings(mut self, settings: SearchSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Schema searches are built against.
    pub fn schema(&self) -> &'s Schema {
        self.schema
    }

    /// The wrapped index.
    pub fn index(&self) -> &I {
        &self.index
    }

    /// Search with a fresh config built from the schema.
    pub async fn initial_search(&self) -> Result<SearchOutcome<D>> {
        let config =
            SearchConfig::empty(self.schema).with_page_size(self.settings.default_page_size);
        self.execute(SearchRequest::new(config)).await
    }

    /// Search with `config` and no hooks.
    pub async fn search(&self, config: SearchConfig) -> Result<SearchOutcome<D>> {
        self.execute(SearchRequest::new(config)).await
    }

    /// Run one search round trip.
    ///
    /// # Errors
    ///
    /// Configuration and type-mismatch errors are raised before the index
    /// is called. Index failures are returned unchanged.
    pub async fn execute(&self, request: SearchRequest) -> Result<SearchOutcome<D>> {
        let SearchRequest {
            mut config,
            options_override,
            term_transform,
            runtime_specs,
        } = request;

        let options = self.prepare(&mut config, options_override, &runtime_specs)?;

        let term = match term_transform {
            Some(transform) => transform(&config, &options),
            None => config.search.clone(),
        };

        log::debug!(
            "Querying {} with term {:?} and filter {:?}",
            self.index.name(),
            term,
            options.filter
        );
        let response = self.index.execute(term.as_deref(), &options).await?;

        self.apply_response(&mut config, &options, &runtime_specs, &response)?;
        Ok(SearchOutcome {
            config,
            documents: response.documents,
        })
    }

    /// Steps 1-5: normalise `config` and build the options that would be
    /// sent to the index.
    pub fn prepare(
        &self,
        config: &mut SearchConfig,
        options_override: Option<OptionsOverride>,
        runtime_specs: &[RuntimeFacetSpec],
    ) -> Result<SearchOptions> {
        config.page.get_or_insert(1);
        config
            .results_per_page
            .get_or_insert(self.settings.default_page_size);
        config.hydrate(self.schema);

        let search_hash = fingerprint_opt(config.search.as_deref());
        if config.search_hash.as_deref() != Some(search_hash.as_str()) {
            log::debug!("Search term changed; discarding totals and facets");
            config.invalidate();
        }

        let mut options = self.build_options(config, runtime_specs)?;
        if let Some(apply) = options_override {
            apply(&mut options);
        }

        let filter_hash = fingerprint(&options.filter);
        if config.filter_hash.as_deref() != Some(filter_hash.as_str()) {
            log::debug!("Filter changed; requesting a fresh total count");
            options.include_total_count = true;
            config.total_results = None;
            config.total_pages = None;
            config.page = Some(1);
        }

        let page = config.page.unwrap_or(1);
        if page > 1 {
            let per_page = u64::from(config.results_per_page.unwrap_or(0));
            options.skip = Some(u64::from(page - 1) * per_page);
        }

        Ok(options)
    }

    /// Index options derived from `config`, before any caller override.
    pub fn build_options(
        &self,
        config: &SearchConfig,
        runtime_specs: &[RuntimeFacetSpec],
    ) -> Result<SearchOptions> {
        let filter = FilterBuilder::new(self.schema).generate(config)?;
        let facets = FacetDeclarationBuilder::new(self.schema).declare(runtime_specs)?;

        let mut order_by = Vec::new();
        for selector in &config.ordering_fields {
            let direction = match selector.order {
                SortOrder::None => continue,
                SortOrder::Ascending => "asc",
                SortOrder::Descending => "desc",
            };
            let field = self.schema.require(&selector.field_name)?;
            if !field.capabilities.sortable {
                return Err(Error::config_field(&field.wire_name, "is not sortable"));
            }
            order_by.push(format!("{} {direction}", field.wire_name));
        }

        let mut search_fields = Vec::new();
        for selector in config.search_fields.iter().filter(|s| s.selected) {
            let field = self.schema.require(&selector.field_name)?;
            if !field.capabilities.searchable {
                return Err(Error::config_field(&field.wire_name, "is not searchable"));
            }
            search_fields.push(field.wire_name.clone());
        }

        let select = if config.select_fields.iter().all(|s| s.selected) {
            Vec::new()
        } else {
            config
                .select_fields
                .iter()
                .filter(|s| s.selected)
                .map(|s| s.field_name.clone())
                .collect()
        };

        log::debug!("Built filter {filter:?} with facets {facets:?}");
        Ok(SearchOptions {
            filter,
            facets,
            order_by,
            select,
            search_fields,
            include_total_count: config.total_results.is_none(),
            top: config.results_per_page,
            ..SearchOptions::default()
        })
    }

    /// Steps 7-8: fold the index response into `config`.
    fn apply_response(
        &self,
        config: &mut SearchConfig,
        options: &SearchOptions,
        runtime_specs: &[RuntimeFacetSpec],
        response: &IndexResponse<D>,
    ) -> Result<()> {
        config.filter_hash = Some(fingerprint(&options.filter));
        config.search_hash = Some(fingerprint_opt(config.search.as_deref()));

        if config.total_results.is_none() {
            config.total_results = response.total_count;
        }
        if config.total_pages.is_none() {
            let per_page = config.results_per_page.unwrap_or(0);
            config.total_pages = config.total_results.map(|total| page_count(total, per_page));
        }

        let reconciler = FacetReconciler::new(self.schema).with_overrides(runtime_specs);
        if let Some(previous) = config.facets.as_mut() {
            reconciler.reconcile(previous, &response.facets)?;
        } else {
            config.facets = Some(reconciler.build_initial(&response.facets)?);
        }
        Ok(())
    }
}
