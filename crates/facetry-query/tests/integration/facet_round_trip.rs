//! Facet building, selection and reconciliation through the orchestrator.

use facetry_core::{FacetScalar, TimeInterval};
use facetry_query::{
    Bucket, FacetRangeType, FacetSet, FacetType, FieldFilter, IndexResponse, LogicalOperator,
    RuntimeFacetSpec, SearchConfig, SearchRequest, Searcher,
};

use crate::common::{standard_response, ts, RecordingIndex, User};

fn searcher(index: RecordingIndex) -> Searcher<'static, User, RecordingIndex> {
    Searcher::for_type(index).unwrap()
}

fn facet<'c>(config: &'c SearchConfig, name: &str) -> &'c FacetSet {
    config
        .facets
        .as_ref()
        .unwrap()
        .iter()
        .find(|f| f.facet_name == name)
        .unwrap()
}

fn number(n: f64) -> Option<FacetScalar> {
    Some(FacetScalar::Number(n))
}

#[tokio::test]
async fn test_value_facet_from_first_response() {
    let searcher = searcher(RecordingIndex::new());
    let config = searcher.initial_search().await.unwrap().config;

    let role = facet(&config, "Role");
    assert_eq!(role.facet_type, FacetType::Value);
    assert_eq!(role.facet_range_type, FacetRangeType::Value);
    assert_eq!(role.values.len(), 2);
    assert!(!role.is_selected());
    let counts: Vec<_> = role.values.iter().map(|v| v.count).collect();
    assert_eq!(counts, vec![12, 340]);
}

#[tokio::test]
async fn test_marker_facet_from_first_response() {
    let searcher = searcher(RecordingIndex::new());
    let config = searcher.initial_search().await.unwrap().config;

    let balance = facet(&config, "Balance");
    assert_eq!(balance.facet_type, FacetType::Range);
    assert_eq!(balance.facet_range_type, FacetRangeType::Range);
    let bounds: Vec<_> = balance
        .values
        .iter()
        .map(|v| (v.value.clone(), v.value_to.clone()))
        .collect();
    assert_eq!(
        bounds,
        vec![
            (None, number(10000.0)),
            (number(10000.0), number(50000.0)),
            (number(50000.0), number(100000.0)),
            (number(100000.0), None),
        ]
    );
}

#[tokio::test]
async fn test_interval_facet_from_first_response() {
    let searcher = searcher(RecordingIndex::new());
    let config = searcher.initial_search().await.unwrap().config;

    let joined = facet(&config, "JoinedDate");
    assert_eq!(joined.facet_range_type, FacetRangeType::Interval);
    assert_eq!(joined.display_name, "Joined Date");
    assert_eq!(
        joined.values[1].value_to,
        Some(FacetScalar::Timestamp(ts(2021, 3, 1)))
    );
}

#[tokio::test]
async fn test_drill_down_keeps_selection_and_tracks_counts() {
    let narrowed = IndexResponse::new(vec![User::new("1", "Alice", "admin")])
        .with_total_count(12)
        .with_facet("Role", vec![Bucket::value("admin", 12)])
        .with_facet(
            "Balance",
            vec![Bucket::range(Some(10000.0.into()), Some(50000.0.into()), 7)],
        );
    let index = RecordingIndex::with_responses([Ok(standard_response(352)), Ok(narrowed)]);
    let searcher = searcher(index);

    let mut config = searcher.initial_search().await.unwrap().config;
    config
        .facet_mut("Role")
        .unwrap()
        .select_where(|v| v.value == Some("admin".into()));

    let outcome = searcher.search(config).await.unwrap();

    let call = searcher.index().last_call();
    assert_eq!(call.options.filter, "(Role eq 'admin')");
    assert!(call.options.include_total_count);

    let config = outcome.config;
    assert_eq!(config.total_results, Some(12));

    let role = facet(&config, "Role");
    assert!(role.values[0].selected);
    assert_eq!(role.values[0].filtered_count, 12);
    assert_eq!(role.values[1].filtered_count, 0);
    assert_eq!(role.values[1].count, 340);

    let balance = facet(&config, "Balance");
    assert_eq!(balance.values.len(), 4);
    assert_eq!(balance.values[1].filtered_count, 7);
    assert_eq!(balance.values[1].count, 20);
    assert_eq!(balance.values[0].filtered_count, 0);

    let joined = facet(&config, "JoinedDate");
    assert!(joined.values.iter().all(|v| v.filtered_count == 0));
}

#[tokio::test]
async fn test_new_buckets_are_appended_unselected() {
    let widened = standard_response(400).with_facet(
        "Role",
        vec![
            Bucket::value("guest", 48),
            Bucket::value("admin", 12),
            Bucket::value("user", 340),
        ],
    );
    let index = RecordingIndex::with_responses([Ok(standard_response(352)), Ok(widened)]);
    let searcher = searcher(index);

    let mut config = searcher.initial_search().await.unwrap().config;
    config.facet_mut("Role").unwrap().values[1].selected = true;

    let config = searcher.search(config).await.unwrap().config;

    let role = facet(&config, "Role");
    let names: Vec<_> = role
        .values
        .iter()
        .map(|v| v.value.as_ref().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["admin", "user", "guest"]);
    assert!(role.values[1].selected);
    assert!(!role.values[2].selected);
}

#[tokio::test]
async fn test_field_filter_and_multi_value_facet_keep_precedence() {
    let searcher = searcher(RecordingIndex::new());
    let mut config = searcher.initial_search().await.unwrap().config;
    config.string_field_filters = vec![FieldFilter::string("Id", "7")];
    config.facet_mut("Role").unwrap().select_where(|_| true);

    searcher.search(config).await.unwrap();

    assert_eq!(
        searcher.index().last_call().options.filter,
        "Id eq '7' and ((Role eq 'admin') or (Role eq 'user'))"
    );
}

#[tokio::test]
async fn test_multiple_facets_combine_with_configured_operators() {
    let searcher = searcher(RecordingIndex::new());
    let mut config = searcher.initial_search().await.unwrap().config;
    config.combine_facets = LogicalOperator::Or;
    config.combine_facet_values = LogicalOperator::And;
    config.facet_mut("Role").unwrap().values[0].selected = true;
    config
        .facet_mut("Balance")
        .unwrap()
        .select_where(|v| v.value.is_none() || v.value_to.is_none());

    searcher.search(config).await.unwrap();

    assert_eq!(
        searcher.index().last_call().options.filter,
        "((Balance lt 10000) and (Balance ge 100000)) or ((Role eq 'admin'))"
    );
}

#[tokio::test]
async fn test_or_combined_facets_stay_under_field_filters() {
    let searcher = searcher(RecordingIndex::new());
    let mut config = searcher.initial_search().await.unwrap().config;
    config.string_field_filters = vec![FieldFilter::string("Id", "7")];
    config.combine_facets = LogicalOperator::Or;
    config.facet_mut("Role").unwrap().values[0].selected = true;
    config.facet_mut("Balance").unwrap().values[0].selected = true;

    searcher.search(config).await.unwrap();

    assert_eq!(
        searcher.index().last_call().options.filter,
        "Id eq '7' and (((Balance lt 10000)) or ((Role eq 'admin')))"
    );
}

#[tokio::test]
async fn test_collection_facet_selection() {
    let tagged = standard_response(10).with_facet(
        "Tags",
        vec![Bucket::value("rust", 4), Bucket::value("go", 2)],
    );
    let index = RecordingIndex::with_responses([Ok(tagged)]);
    let searcher = searcher(index);

    let mut config = searcher.initial_search().await.unwrap().config;
    let tags = config.facet_mut("Tags").unwrap();
    assert!(tags.is_collection);
    tags.values[0].selected = true;

    searcher.search(config).await.unwrap();

    assert_eq!(
        searcher.index().last_call().options.filter,
        "(Tags/any(t: t eq 'rust'))"
    );
}

#[tokio::test]
async fn test_runtime_markers_are_declared_and_reconciled() {
    let modified = standard_response(120).with_facet(
        "LastModifiedDate",
        vec![
            Bucket::range(None, Some(ts(2020, 1, 1).into()), 3),
            Bucket::range(Some(ts(2020, 1, 1).into()), Some(ts(2021, 1, 1).into()), 9),
            Bucket::range(Some(ts(2021, 1, 1).into()), None, 1),
        ],
    );
    let index = RecordingIndex::with_responses([Ok(modified)]);
    let searcher = searcher(index);

    let request = SearchRequest::new(SearchConfig::default()).with_runtime_spec(
        RuntimeFacetSpec::date_time_values("LastModifiedDate", [ts(2020, 1, 1), ts(2021, 1, 1)]),
    );
    let config = searcher.execute(request).await.unwrap().config;

    let call = searcher.index().last_call();
    assert!(call.options.facets.contains(
        &"LastModifiedDate,values:2020-01-01T00:00:00Z|2021-01-01T00:00:00Z".to_string()
    ));

    let modified = facet(&config, "LastModifiedDate");
    assert_eq!(modified.facet_range_type, FacetRangeType::Range);
    assert_eq!(modified.values.len(), 3);
    assert_eq!(modified.values[1].count, 9);
}

#[tokio::test]
async fn test_runtime_interval_override_drives_derived_bounds() {
    let index = RecordingIndex::with_responses([Ok(standard_response(120))]);
    let searcher = searcher(index);

    let request = SearchRequest::new(SearchConfig::default())
        .with_runtime_spec(RuntimeFacetSpec::time_interval("JoinedDate", TimeInterval::Year));
    let config = searcher.execute(request).await.unwrap().config;

    assert!(searcher
        .index()
        .last_call()
        .options
        .facets
        .contains(&"JoinedDate,interval:year".to_string()));
    let joined = facet(&config, "JoinedDate");
    assert_eq!(
        joined.values[0].value_to,
        Some(FacetScalar::Timestamp(ts(2022, 1, 1)))
    );
}

#[tokio::test]
async fn test_mismatched_runtime_spec_is_rejected() {
    let searcher = searcher(RecordingIndex::new());
    let request = SearchRequest::new(SearchConfig::default())
        .with_runtime_spec(RuntimeFacetSpec::numeric_values("LastModifiedDate", [1.0, 2.0]));

    let err = searcher.execute(request).await.unwrap_err();

    assert!(matches!(err, facetry_core::Error::TypeMismatch { .. }));
    assert!(searcher.index().calls().is_empty());
}

#[tokio::test]
async fn test_first_response_without_facets() {
    let index = RecordingIndex::with_responses([Ok(
        IndexResponse::new(Vec::new()).with_total_count(0)
    )]);
    let searcher = searcher(index);

    let config = searcher.initial_search().await.unwrap().config;

    assert_eq!(config.facets, Some(Vec::new()));
    assert_eq!(config.total_pages, Some(0));
}
