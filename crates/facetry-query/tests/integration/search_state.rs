//! Paging, fingerprint and hook behaviour across search round trips.

use facetry_core::{Error, SearchSettings};
use facetry_query::{
    FieldFilter, IndexResponse, QueryType, SearchConfig, SearchRequest, Searcher, SortOrder,
};

use crate::common::{RecordingIndex, User};

type UserSearcher = Searcher<'static, User, RecordingIndex>;

fn searcher(index: RecordingIndex) -> UserSearcher {
    Searcher::for_type(index).unwrap()
}

#[tokio::test]
async fn test_initial_search_builds_everything() {
    let searcher = searcher(RecordingIndex::new());

    let outcome = searcher.initial_search().await.unwrap();

    let call = searcher.index().last_call();
    assert_eq!(call.term, None);
    assert!(call.options.include_total_count);
    assert_eq!(call.options.filter, "");
    assert_eq!(call.options.top, Some(50));
    assert_eq!(call.options.skip, None);
    assert!(call.options.order_by.is_empty());
    assert!(call.options.select.is_empty());
    assert!(call.options.search_fields.is_empty());
    assert_eq!(
        call.options.facets,
        vec![
            "Role,count:10",
            "Tags,count:5",
            "Balance,values:10000|50000|100000",
            "JoinedDate,interval:month",
        ]
    );

    let config = outcome.config;
    assert_eq!(outcome.documents.len(), 2);
    assert_eq!(config.total_results, Some(120));
    assert_eq!(config.total_pages, Some(3));
    assert_eq!(config.page, Some(1));
    assert!(config.filter_hash.is_some());
    assert!(config.search_hash.is_some());
    assert_eq!(config.facets.as_ref().unwrap().len(), 3);
}

#[tokio::test]
async fn test_settings_page_size() {
    let searcher = searcher(RecordingIndex::new()).with_settings(SearchSettings {
        default_page_size: 25,
    });

    let outcome = searcher.initial_search().await.unwrap();

    assert_eq!(searcher.index().last_call().options.top, Some(25));
    assert_eq!(outcome.config.total_pages, Some(5));
}

#[tokio::test]
async fn test_unchanged_config_reuses_cached_totals_and_pages() {
    let searcher = searcher(RecordingIndex::new());
    let mut config = searcher.initial_search().await.unwrap().config;
    config.page = Some(3);

    let outcome = searcher.search(config).await.unwrap();

    let call = searcher.index().last_call();
    assert!(!call.options.include_total_count);
    assert_eq!(call.options.skip, Some(100));
    assert_eq!(outcome.config.page, Some(3));
    assert_eq!(outcome.config.total_results, Some(120));
    assert_eq!(outcome.config.total_pages, Some(3));
}

#[tokio::test]
async fn test_config_survives_client_round_trip() {
    let searcher = searcher(RecordingIndex::new());
    let config = searcher.initial_search().await.unwrap().config;

    let json = serde_json::to_string(&config).unwrap();
    let returned: SearchConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(returned, config);

    searcher.search(returned).await.unwrap();
    assert!(!searcher.index().last_call().options.include_total_count);
}

#[tokio::test]
async fn test_changed_search_term_resets_state() {
    let searcher = searcher(RecordingIndex::new());
    let mut config = searcher
        .search(SearchConfig::default().with_search("alice"))
        .await
        .unwrap()
        .config;

    config
        .facet_mut("Role")
        .unwrap()
        .select_where(|v| v.value == Some("admin".into()));
    config.page = Some(2);
    config.total_results = Some(999);
    config.total_pages = Some(7);
    config.search = Some("bob".to_string());

    let outcome = searcher.search(config).await.unwrap();

    let call = searcher.index().last_call();
    assert_eq!(call.term.as_deref(), Some("bob"));
    assert!(call.options.include_total_count);
    assert_eq!(call.options.filter, "");
    assert_eq!(call.options.skip, None);

    let config = outcome.config;
    assert_eq!(config.page, Some(1));
    assert_eq!(config.total_results, Some(120));
    assert_eq!(config.total_pages, Some(3));
    let role = config.facets.as_ref().unwrap().iter().find(|f| f.facet_name == "Role").unwrap();
    assert!(!role.is_selected());
}

#[tokio::test]
async fn test_changed_filter_forces_count_and_first_page() {
    let searcher = searcher(RecordingIndex::new());
    let mut config = searcher.initial_search().await.unwrap().config;
    config.page = Some(2);
    config.bool_field_filters = vec![FieldFilter::boolean("Enabled", true)];

    let outcome = searcher.search(config).await.unwrap();

    let call = searcher.index().last_call();
    assert_eq!(call.options.filter, "Enabled eq true");
    assert!(call.options.include_total_count);
    assert_eq!(call.options.skip, None);
    assert_eq!(outcome.config.page, Some(1));
    assert_eq!(outcome.config.total_results, Some(120));
}

#[tokio::test]
async fn test_zero_page_size_yields_one_page() {
    let index = RecordingIndex::with_responses([Ok(IndexResponse::default().with_total_count(0))]);
    let searcher = searcher(index);
    let config = SearchConfig::default().with_page_size(0);

    let outcome = searcher.search(config).await.unwrap();

    assert_eq!(outcome.config.total_results, Some(0));
    assert_eq!(outcome.config.total_pages, Some(1));
    assert_eq!(searcher.index().last_call().options.top, Some(0));
}

#[tokio::test]
async fn test_ordering_selection_and_search_fields() {
    let searcher = searcher(RecordingIndex::new());
    let mut config = searcher.initial_search().await.unwrap().config;

    for selector in &mut config.ordering_fields {
        selector.order = match selector.field_name.as_str() {
            "Balance" => SortOrder::Descending,
            "last_name" => SortOrder::Ascending,
            _ => SortOrder::None,
        };
    }
    for selector in &mut config.select_fields {
        selector.selected = matches!(selector.field_name.as_str(), "Id" | "last_name");
    }
    for selector in &mut config.search_fields {
        selector.selected = selector.field_name == "FirstName";
    }

    searcher.search(config).await.unwrap();

    let options = searcher.index().last_call().options;
    assert_eq!(options.order_by, vec!["last_name asc", "Balance desc"]);
    assert_eq!(options.select, vec!["Id", "last_name"]);
    assert_eq!(options.search_fields, vec!["FirstName"]);
}

#[tokio::test]
async fn test_options_override_runs_last() {
    let searcher = searcher(RecordingIndex::new());
    let request = SearchRequest::new(SearchConfig::default().with_search("alice"))
        .with_options(|options| {
            options.query_type = QueryType::Full;
            options.top = Some(5);
            options.facets.clear();
        })
        .with_term_transform(|config, _options| config.search.as_ref().map(|s| format!("{s}~")));

    let outcome = searcher.execute(request).await.unwrap();

    let call = searcher.index().last_call();
    assert_eq!(call.term.as_deref(), Some("alice~"));
    assert_eq!(call.options.query_type, QueryType::Full);
    assert_eq!(call.options.top, Some(5));
    assert!(call.options.facets.is_empty());
    assert_eq!(outcome.config.search.as_deref(), Some("alice"));
}

#[tokio::test]
async fn test_override_changing_filter_is_fingerprinted() {
    let searcher = searcher(RecordingIndex::new());
    let config = searcher.initial_search().await.unwrap().config;
    let request = SearchRequest::new(config).with_options(|options| {
        options.filter = "Enabled eq true".to_string();
    });

    let outcome = searcher.execute(request).await.unwrap();

    assert!(searcher.index().last_call().options.include_total_count);
    assert_eq!(
        outcome.config.filter_hash,
        Some(facetry_query::fingerprint::fingerprint("Enabled eq true"))
    );
}

#[tokio::test]
async fn test_index_failure_is_passed_through() {
    let failure = Error::index(std::io::Error::other("index unavailable"));
    let searcher = searcher(RecordingIndex::with_responses([Err(failure)]));

    let err = searcher.initial_search().await.unwrap_err();

    assert!(matches!(err, Error::Index(_)));
    assert_eq!(err.to_string(), "index unavailable");
}

#[tokio::test]
async fn test_unknown_field_fails_before_the_index_is_called() {
    let searcher = searcher(RecordingIndex::new());
    let mut config = SearchConfig::empty(searcher.schema());
    config.select_fields[0].field_name = "Salary".to_string();

    let err = searcher.search(config).await.unwrap_err();

    assert!(err.is_configuration());
    assert!(err.to_string().contains("Salary"));
    assert!(searcher.index().calls().is_empty());
}

#[tokio::test]
async fn test_filter_on_non_filterable_field_is_rejected() {
    let searcher = searcher(RecordingIndex::new());
    let config = SearchConfig {
        string_field_filters: vec![FieldFilter::string("FirstName", "Alice")],
        ..SearchConfig::default()
    };

    let err = searcher.search(config).await.unwrap_err();

    assert!(err.to_string().contains("not filterable"));
    assert!(searcher.index().calls().is_empty());
}
