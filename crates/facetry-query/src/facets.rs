//! Facet model: the client-visible facet sets carried in a search config,
//! and the filter built from their selected values.

use facetry_core::{DateTimeDisplayFormat, FacetScalar, ValueKind};
use serde::{Deserialize, Serialize};

use crate::filter::LogicalOperator;

/// Whether a facet buckets by value or by range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacetType {
    /// Discrete values.
    #[default]
    Value,
    /// Ranges.
    Range,
}

/// Shape of the values in a facet set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacetRangeType {
    /// Not a range facet.
    #[default]
    Value,
    /// Buckets reported by their start value; the upper bound is derived
    /// from the interval.
    Interval,
    /// Buckets reported with explicit bounds.
    Range,
}

/// One bucket of a facet, as shown to and selected by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetValue {
    /// Bucket value, or lower bound of a range bucket. `None` for an open
    /// lower end.
    #[serde(default)]
    pub value: Option<FacetScalar>,

    /// Exclusive upper bound of a range bucket. `None` for an open upper end.
    #[serde(default)]
    pub value_to: Option<FacetScalar>,

    /// Selected by the user.
    #[serde(default)]
    pub selected: bool,

    /// Largest count ever observed for this bucket.
    #[serde(default)]
    pub count: u64,

    /// Count under the current filter.
    #[serde(default)]
    pub filtered_count: u64,
}

impl FacetValue {
    /// Unselected bucket with both counts set to `count`. Bounds are coerced
    /// to `kind`.
    pub fn new(
        value: Option<FacetScalar>,
        value_to: Option<FacetScalar>,
        kind: ValueKind,
        count: u64,
    ) -> Self {
        Self {
            value: value.map(|v| v.coerce(kind)),
            value_to: value_to.map(|v| v.coerce(kind)),
            selected: false,
            count,
            filtered_count: count,
        }
    }

    /// Set the selection flag.
    pub fn with_selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    /// Bucket identity: same bounds, regardless of counts or selection.
    pub fn same_bucket(&self, other: &FacetValue) -> bool {
        same_bound(&self.value, &other.value) && same_bound(&self.value_to, &other.value_to)
    }

    /// Filter predicate for this bucket, or `None` when it has no bounds.
    fn predicate(&self, field: &str, is_collection: bool, facet_type: FacetType) -> Option<String> {
        let subject = if is_collection { "t" } else { field };
        let body = match facet_type {
            FacetType::Range => match (&self.value, &self.value_to) {
                (None, Some(hi)) => format!("{subject} lt {}", hi.to_literal()),
                (Some(lo), None) => format!("{subject} ge {}", lo.to_literal()),
                (Some(lo), Some(hi)) => format!(
                    "{subject} ge {} and {subject} lt {}",
                    lo.to_literal(),
                    hi.to_literal()
                ),
                (None, None) => return None,
            },
            FacetType::Value => {
                let value = self.value.as_ref()?;
                format!("{subject} eq {}", value.to_literal())
            }
        };
        if is_collection {
            Some(format!("({field}/any(t: {body}))"))
        } else {
            Some(format!("({body})"))
        }
    }
}

/// Bound equality where a NaN bound matches another NaN bound.
fn same_bound(a: &Option<FacetScalar>, b: &Option<FacetScalar>) -> bool {
    match (a, b) {
        (Some(FacetScalar::Number(x)), Some(FacetScalar::Number(y))) => {
            x == y || (x.is_nan() && y.is_nan())
        }
        _ => a == b,
    }
}

/// A facet as carried in a search config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetSet {
    /// Wire name of the faceted field.
    pub facet_name: String,

    /// Display name for UIs.
    pub display_name: String,

    /// Value or range facet.
    #[serde(default)]
    pub facet_type: FacetType,

    /// Shape of the values.
    #[serde(default)]
    pub facet_range_type: FacetRangeType,

    /// Kind of the faceted field.
    #[serde(default)]
    pub value_kind: ValueKind,

    /// The faceted field is multi-valued.
    #[serde(default)]
    pub is_collection: bool,

    /// Number format hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_format: Option<String>,

    /// Date-time format hint.
    #[serde(default)]
    pub date_time_format: DateTimeDisplayFormat,

    /// Buckets, in the order the index first reported them.
    #[serde(default)]
    pub values: Vec<FacetValue>,
}

impl FacetSet {
    /// True when any value is selected.
    pub fn is_selected(&self) -> bool {
        self.values.iter().any(|v| v.selected)
    }

    /// Selected values.
    pub fn selected_values(&self) -> impl Iterator<Item = &FacetValue> {
        self.values.iter().filter(|v| v.selected)
    }

    /// Mutable access to the value matching `bucket`.
    pub fn value_mut(&mut self, bucket: &FacetValue) -> Option<&mut FacetValue> {
        self.values.iter_mut().find(|v| v.same_bucket(bucket))
    }

    /// Select every value for which `pred` holds. Returns how many matched.
    pub fn select_where(&mut self, mut pred: impl FnMut(&FacetValue) -> bool) -> usize {
        let mut matched = 0;
        for value in &mut self.values {
            if pred(value) {
                value.selected = true;
                matched += 1;
            }
        }
        matched
    }

    /// Filter fragment for the selected values, joined with `op`.
    ///
    /// Each value renders as a parenthesised predicate; selected values with
    /// no bounds contribute nothing. Empty when nothing applies.
    pub fn build_facet_query(&self, op: LogicalOperator) -> String {
        self.predicates(self.is_collection, self.facet_type)
            .join(&format!(" {op} "))
    }

    /// One parenthesised predicate per selected value with bounds, rendered
    /// with the given shape rather than the flags stored on the set.
    pub(crate) fn predicates(&self, is_collection: bool, facet_type: FacetType) -> Vec<String> {
        self.selected_values()
            .filter_map(|v| v.predicate(&self.facet_name, is_collection, facet_type))
            .collect()
    }
}

/// Facet part of the filter.
///
/// With one selected facet this is that facet's query; with several, each
/// facet's query is parenthesised and joined with `facet_op`. Empty when no
/// value is selected. Uses the flags stored on each set;
/// [`FilterBuilder::generate`](crate::filter::FilterBuilder::generate)
/// resolves them from the schema instead.
pub fn build_facet_filter(
    facets: &[FacetSet],
    facet_op: LogicalOperator,
    value_op: LogicalOperator,
) -> String {
    let queries: Vec<String> = facets
        .iter()
        .filter(|f| f.is_selected())
        .map(|f| f.build_facet_query(value_op))
        .filter(|q| !q.is_empty())
        .collect();
    join_facet_queries(&queries, facet_op)
}

/// Join per-facet queries: one stays as is, several are parenthesised and
/// joined with `facet_op`.
pub(crate) fn join_facet_queries(queries: &[String], facet_op: LogicalOperator) -> String {
    match queries {
        [] => String::new(),
        [only] => only.clone(),
        many => format!("({})", many.join(&format!(") {facet_op} ("))),
    }
}

// ============================================================================
// Tests
// ============================================================================
