//! Error messages name the offending field or operator.

use facetry_core::{DateTimeDisplayFormat, Error, FacetSpec, FieldDescriptor, Schema, ValueKind};
use facetry_query::{
    FacetDeclarationBuilder, FacetRangeType, FacetSet, FacetType, FacetValue, FieldFilter,
    FilterBuilder, FilterOperation, RuntimeFacetSpec, SearchConfig,
};

fn schema() -> Schema {
    Schema::new(vec![
        FieldDescriptor::new("Role", ValueKind::String)
            .filterable()
            .facetable(),
        FieldDescriptor::new("Balance", ValueKind::Numeric)
            .filterable()
            .facetable()
            .with_facet(FacetSpec::numeric_values([1.0, 2.0])),
        FieldDescriptor::new("Note", ValueKind::String).searchable(),
    ])
    .unwrap()
}

#[test]
fn test_between_on_boolean_names_operation() {
    let schema = Schema::new(vec![
        FieldDescriptor::new("Enabled", ValueKind::Boolean).filterable(),
    ])
    .unwrap();
    let filter = FieldFilter::boolean("Enabled", true).with_operation(FilterOperation::Between);

    let err = FilterBuilder::new(&schema).render_filter(&filter).unwrap_err();

    let Error::Config { field, message } = err else {
        unreachable!("Expected Config error variant");
    };
    assert_eq!(field.as_deref(), Some("Enabled"));
    assert!(message.contains("Between"));
}

#[test]
fn test_unused_between_is_skipped_in_lists() {
    let schema = schema();
    let filters = [FieldFilter::numeric("Balance", FilterOperation::Between, 5.0)];

    let rendered = FilterBuilder::new(&schema).render(&filters).unwrap();

    assert_eq!(rendered, "");
}

#[test]
fn test_tampered_filter_field_name_is_rejected() {
    let schema = schema();
    let mut config = SearchConfig::empty(&schema);
    config.facets = Some(Vec::new());
    config.string_field_filters[0].field_name = "Rolle".to_string();

    let err = FilterBuilder::new(&schema).generate(&config).unwrap_err();

    assert!(err.is_configuration());
    assert!(err.to_string().contains("Rolle"));
}

fn facet_named(name: &str) -> FacetSet {
    FacetSet {
        facet_name: name.to_string(),
        display_name: name.to_string(),
        facet_type: FacetType::Value,
        facet_range_type: FacetRangeType::Value,
        value_kind: ValueKind::String,
        is_collection: false,
        number_format: None,
        date_time_format: DateTimeDisplayFormat::default(),
        values: vec![FacetValue::new(Some("x') or (true".into()), None, ValueKind::String, 1)
            .with_selected(true)],
    }
}

#[test]
fn test_tampered_facet_name_is_rejected() {
    let schema = schema();
    let mut config = SearchConfig::empty(&schema);
    config.facets = Some(vec![facet_named("Role eq 'a') or (Role")]);

    let err = FilterBuilder::new(&schema).generate(&config).unwrap_err();

    assert!(err.is_configuration());
    assert!(err.to_string().contains("Role eq 'a') or (Role"));
}

#[test]
fn test_facet_on_non_facetable_field_is_rejected() {
    let schema = schema();
    let mut config = SearchConfig::empty(&schema);
    config.facets = Some(vec![facet_named("Note")]);

    let err = FilterBuilder::new(&schema).generate(&config).unwrap_err();

    let Error::Config { field, message } = err else {
        unreachable!("Expected Config error variant");
    };
    assert_eq!(field.as_deref(), Some("Note"));
    assert!(message.contains("not facetable"));
}

#[test]
fn test_type_mismatch_display() {
    let schema = schema();
    let overrides = [RuntimeFacetSpec::time_interval(
        "Balance",
        facetry_core::TimeInterval::Day,
    )];

    let err = FacetDeclarationBuilder::new(&schema)
        .declare(&overrides)
        .unwrap_err();

    assert!(err.to_string().starts_with("Type mismatch"));
    assert!(err.to_string().contains("Balance"));
}
