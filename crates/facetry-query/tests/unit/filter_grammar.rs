//! Filter grammar details through the public API.

use facetry_core::{FieldDescriptor, Schema, Timestamp, ValueKind};
use facetry_query::{FieldFilter, FilterBuilder, FilterOperation, FilterValue};

fn schema() -> Schema {
    Schema::new(vec![
        FieldDescriptor::new("LastName", ValueKind::String)
            .with_wire_name("last_name")
            .filterable(),
        FieldDescriptor::new("Balance", ValueKind::Numeric).filterable(),
        FieldDescriptor::new("Scores", ValueKind::Numeric)
            .collection()
            .filterable(),
        FieldDescriptor::new("JoinedDate", ValueKind::DateTime).filterable(),
    ])
    .unwrap()
}

#[test]
fn test_wire_names_are_rendered() {
    let schema = schema();
    let filter = FieldFilter::string("last_name", "O'Brien");

    let rendered = FilterBuilder::new(&schema).render_filter(&filter).unwrap();

    assert_eq!(rendered, "last_name eq 'O''Brien'");
}

#[test]
fn test_non_finite_numbers_use_keywords() {
    let schema = schema();
    let builder = FilterBuilder::new(&schema);

    let lt = FieldFilter::numeric("Balance", FilterOperation::LessThan, f64::INFINITY);
    let gt = FieldFilter::numeric("Balance", FilterOperation::GreaterThan, f64::NEG_INFINITY);

    assert_eq!(builder.render_filter(&lt).unwrap(), "Balance lt INF");
    assert_eq!(builder.render_filter(&gt).unwrap(), "Balance gt -INF");
}

#[test]
fn test_timestamps_keep_offset() {
    let schema = schema();
    let joined: Timestamp = Timestamp::parse_from_rfc3339("2021-06-01T09:30:00+02:00").unwrap();
    let filter = FieldFilter::date_time("JoinedDate", FilterOperation::GreaterThanOrEqual, joined);

    let rendered = FilterBuilder::new(&schema).render_filter(&filter).unwrap();

    assert_eq!(rendered, "JoinedDate ge 2021-06-01T09:30:00+02:00");
}

#[test]
fn test_collection_between_swaps_bounds() {
    let schema = schema();
    let filter = FieldFilter::numeric_between("Scores", 9.0, 1.5);

    let rendered = FilterBuilder::new(&schema).render_filter(&filter).unwrap();

    assert_eq!(rendered, "Scores/any(t: t ge 1.5 and t lt 9)");
}

#[test]
fn test_single_bound_uses_lower_of_inverted_bounds() {
    let schema = schema();
    let filter = FieldFilter::new(
        "Balance",
        FilterValue::Numeric {
            value: Some(10.0),
            value_to: Some(1.0),
        },
    )
    .with_operation(FilterOperation::GreaterThan);

    let rendered = FilterBuilder::new(&schema).render_filter(&filter).unwrap();

    assert_eq!(rendered, "Balance gt 1");
}

#[test]
fn test_filters_deserialized_from_client_json() {
    let schema = schema();
    let json = r#"[
        {"field_name": "Balance", "operation": "between", "kind": "numeric", "value": 100, "value_to": 10},
        {"field_name": "last_name", "kind": "string", "value": "Smith"},
        {"field_name": "JoinedDate", "operation": "less_than", "kind": "date_time", "value": null}
    ]"#;
    let filters: Vec<FieldFilter> = serde_json::from_str(json).unwrap();

    let rendered = FilterBuilder::new(&schema).render(&filters).unwrap();

    assert_eq!(rendered, "Balance ge 10 and Balance lt 100 and last_name eq 'Smith'");
}
