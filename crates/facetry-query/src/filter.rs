//! Filter expression building.
//!
//! Renders user-editable [`FieldFilter`]s and selected facet values into the
//! index's OData-style filter grammar:
//!
//! | Operation | Scalar field | Collection field |
//! |-----------|--------------|------------------|
//! | `Equal` | `f eq V` | `f/any(t: t eq V)` |
//! | `GreaterThan` … | `f gt V` | `f/any(t: t gt V)` |
//! | `Between` | `f ge V and f lt V2` | `f/any(t: t ge V and t lt V2)` |
//!
//! Field names are always taken from the resolved [`Schema`], and every
//! literal goes through [`FacetScalar::to_literal`], so user input can only
//! ever appear inside a quoted or numeric literal.

use std::cmp::Ordering;
use std::fmt;

use facetry_core::{Error, FacetScalar, FieldDescriptor, Result, Schema, Timestamp, ValueKind};
use serde::{Deserialize, Serialize};

use crate::facets::{join_facet_queries, FacetType};
use crate::model::SearchConfig;

// ============================================================================
// Operators
// ============================================================================

/// Comparison applied by a field filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperation {
    /// `eq`
    #[default]
    Equal,
    /// `gt`
    GreaterThan,
    /// `lt`
    LessThan,
    /// `ge`
    GreaterThanOrEqual,
    /// `le`
    LessThanOrEqual,
    /// Half-open range: `ge V and lt V2`.
    Between,
}

impl FilterOperation {
    /// Grammar keyword for single-bound operations.
    fn keyword(self) -> &'static str {
        match self {
            Self::Equal => "eq",
            Self::GreaterThan => "gt",
            Self::LessThan => "lt",
            Self::GreaterThanOrEqual | Self::Between => "ge",
            Self::LessThanOrEqual => "le",
        }
    }
}

impl fmt::Display for FilterOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Equal => "Equal",
            Self::GreaterThan => "GreaterThan",
            Self::LessThan => "LessThan",
            Self::GreaterThanOrEqual => "GreaterThanOrEqual",
            Self::LessThanOrEqual => "LessThanOrEqual",
            Self::Between => "Between",
        };
        f.write_str(name)
    }
}

/// How facet groups, or values within a group, are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalOperator {
    /// Every operand must match.
    And,
    /// Any operand may match.
    Or,
}

impl LogicalOperator {
    /// Lower-case grammar keyword.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
        }
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// FieldFilter
// ============================================================================

/// Typed payload of a field filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FilterValue {
    /// String comparison.
    String {
        /// Value compared against.
        #[serde(default)]
        value: Option<String>,
    },
    /// Numeric comparison or range.
    Numeric {
        /// Value, or lower bound for `Between`.
        #[serde(default)]
        value: Option<f64>,
        /// Exclusive upper bound for `Between`.
        #[serde(default)]
        value_to: Option<f64>,
    },
    /// Boolean comparison.
    Boolean {
        /// Value compared against.
        #[serde(default)]
        value: Option<bool>,
    },
    /// Date-time comparison or range.
    DateTime {
        /// Value, or lower bound for `Between`.
        #[serde(default)]
        value: Option<Timestamp>,
        /// Exclusive upper bound for `Between`.
        #[serde(default)]
        value_to: Option<Timestamp>,
    },
}

impl FilterValue {
    /// Unset payload for a field of the given kind.
    pub fn empty(kind: ValueKind) -> Self {
        match kind {
            ValueKind::String => Self::String { value: None },
            ValueKind::Numeric => Self::Numeric {
                value: None,
                value_to: None,
            },
            ValueKind::Boolean => Self::Boolean { value: None },
            ValueKind::DateTime => Self::DateTime {
                value: None,
                value_to: None,
            },
        }
    }

    /// Field kind this payload applies to.
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::String { .. } => ValueKind::String,
            Self::Numeric { .. } => ValueKind::Numeric,
            Self::Boolean { .. } => ValueKind::Boolean,
            Self::DateTime { .. } => ValueKind::DateTime,
        }
    }

    fn has_value(&self) -> bool {
        match self {
            Self::String { value } => value.as_deref().is_some_and(|v| !v.trim().is_empty()),
            Self::Numeric { value, .. } => value.is_some(),
            Self::Boolean { value } => value.is_some(),
            Self::DateTime { value, .. } => value.is_some(),
        }
    }

    fn has_value_to(&self) -> bool {
        match self {
            Self::Numeric { value_to, .. } => value_to.is_some(),
            Self::DateTime { value_to, .. } => value_to.is_some(),
            Self::String { .. } | Self::Boolean { .. } => false,
        }
    }

    /// Lower and upper bound as scalars, with inverted comparable bounds
    /// swapped whatever the operation.
    fn bounds(&self) -> (Option<FacetScalar>, Option<FacetScalar>) {
        match self {
            Self::String { value } => (value.clone().map(FacetScalar::Text), None),
            Self::Boolean { value } => (value.map(FacetScalar::Boolean), None),
            Self::Numeric { value, value_to } => {
                let (mut lo, mut hi) = (*value, *value_to);
                if let (Some(a), Some(b)) = (lo, hi) {
                    match a.partial_cmp(&b) {
                        Some(Ordering::Greater) => (lo, hi) = (hi, lo),
                        None => {
                            log::debug!("Bounds {a} and {b} are not comparable; keeping order")
                        }
                        _ => {}
                    }
                }
                (lo.map(FacetScalar::Number), hi.map(FacetScalar::Number))
            }
            Self::DateTime { value, value_to } => {
                let (mut lo, mut hi) = (*value, *value_to);
                if let (Some(a), Some(b)) = (lo, hi)
                    && a > b
                {
                    (lo, hi) = (hi, lo);
                }
                (lo.map(FacetScalar::Timestamp), hi.map(FacetScalar::Timestamp))
            }
        }
    }
}

/// One user-editable predicate on a filterable field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldFilter {
    /// Wire name of the field.
    pub field_name: String,

    /// Display name for UIs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Comparison to apply.
    #[serde(default)]
    pub operation: FilterOperation,

    /// Mirrors the field; the schema is authoritative when rendering.
    #[serde(default)]
    pub is_collection: bool,

    /// Typed value(s).
    #[serde(flatten)]
    pub value: FilterValue,
}

impl FieldFilter {
    /// Filter on `field_name` with the given payload and `Equal` operation.
    pub fn new(field_name: impl Into<String>, value: FilterValue) -> Self {
        Self {
            field_name: field_name.into(),
            display_name: None,
            operation: FilterOperation::Equal,
            is_collection: false,
            value,
        }
    }

    /// Unset filter for a schema field.
    pub fn for_field(field: &FieldDescriptor) -> Self {
        Self {
            field_name: field.wire_name.clone(),
            display_name: Some(field.display_name()),
            operation: FilterOperation::Equal,
            is_collection: field.is_collection,
            value: FilterValue::empty(field.value_kind),
        }
    }

    /// String equality filter.
    pub fn string(field_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(
            field_name,
            FilterValue::String {
                value: Some(value.into()),
            },
        )
    }

    /// Boolean equality filter.
    pub fn boolean(field_name: impl Into<String>, value: bool) -> Self {
        Self::new(field_name, FilterValue::Boolean { value: Some(value) })
    }

    /// Single-bound numeric filter.
    pub fn numeric(field_name: impl Into<String>, operation: FilterOperation, value: f64) -> Self {
        Self::new(
            field_name,
            FilterValue::Numeric {
                value: Some(value),
                value_to: None,
            },
        )
        .with_operation(operation)
    }

    /// Half-open numeric range `[from, to)`.
    pub fn numeric_between(field_name: impl Into<String>, from: f64, to: f64) -> Self {
        Self::new(
            field_name,
            FilterValue::Numeric {
                value: Some(from),
                value_to: Some(to),
            },
        )
        .with_operation(FilterOperation::Between)
    }

    /// Single-bound date-time filter.
    pub fn date_time(
        field_name: impl Into<String>,
        operation: FilterOperation,
        value: Timestamp,
    ) -> Self {
        Self::new(
            field_name,
            FilterValue::DateTime {
                value: Some(value),
                value_to: None,
            },
        )
        .with_operation(operation)
    }

    /// Half-open date-time range `[from, to)`.
    pub fn date_time_between(field_name: impl Into<String>, from: Timestamp, to: Timestamp) -> Self {
        Self::new(
            field_name,
            FilterValue::DateTime {
                value: Some(from),
                value_to: Some(to),
            },
        )
        .with_operation(FilterOperation::Between)
    }

    /// Set the operation.
    pub fn with_operation(mut self, operation: FilterOperation) -> Self {
        self.operation = operation;
        self
    }

    /// Mark the filter as targeting a collection field.
    pub fn collection(mut self) -> Self {
        self.is_collection = true;
        self
    }

    /// A filter is used when it has a non-blank value and, for `Between`, an
    /// upper bound as well.
    pub fn is_used(&self) -> bool {
        self.value.has_value()
            && (self.operation != FilterOperation::Between || self.value.has_value_to())
    }
}

// ============================================================================
// FilterBuilder
// ============================================================================

/// Renders filters against a resolved schema.
#[derive(Debug, Clone, Copy)]
pub struct FilterBuilder<'a> {
    schema: &'a Schema,
}

impl<'a> FilterBuilder<'a> {
    /// Create a builder for `schema`.
    pub fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    /// Render every used filter, in order, joined with `" and "`.
    /// Unused filters are skipped.
    pub fn render<'f>(&self, filters: impl IntoIterator<Item = &'f FieldFilter>) -> Result<String> {
        let mut fragments = Vec::new();
        for filter in filters.into_iter().filter(|f| f.is_used()) {
            fragments.push(self.render_filter(filter)?);
        }
        Ok(fragments.join(" and "))
    }

    /// Render a single filter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the field is unknown or not filterable,
    /// when the payload kind does not match the field, when `Between` is
    /// used on a string or boolean payload, or when the filter has no value
    /// (or no upper bound for `Between`).
    pub fn render_filter(&self, filter: &FieldFilter) -> Result<String> {
        let field = self.check_field(filter)?;

        if filter.operation == FilterOperation::Between
            && matches!(
                filter.value,
                FilterValue::String { .. } | FilterValue::Boolean { .. }
            )
        {
            return Err(Error::config_field(
                &field.wire_name,
                format!(
                    "operation {} is not supported for {} filters",
                    filter.operation,
                    filter.value.kind()
                ),
            ));
        }

        let between = filter.operation == FilterOperation::Between;
        let (lo, hi) = filter.value.bounds();
        let Some(lo) = lo.filter(|_| filter.value.has_value()) else {
            return Err(Error::config_field(
                &field.wire_name,
                format!("operation {} has no value to compare", filter.operation),
            ));
        };

        let subject = if field.is_collection {
            "t"
        } else {
            field.wire_name.as_str()
        };
        let predicate = if between {
            let Some(hi) = hi else {
                return Err(Error::config_field(
                    &field.wire_name,
                    "operation Between requires both a value and a value_to",
                ));
            };
            format!(
                "{subject} ge {} and {subject} lt {}",
                lo.to_literal(),
                hi.to_literal()
            )
        } else {
            format!("{subject} {} {}", filter.operation.keyword(), lo.to_literal())
        };

        if field.is_collection {
            Ok(format!("{}/any(t: {predicate})", field.wire_name))
        } else {
            Ok(predicate)
        }
    }

    /// Complete filter for a search config: used field filters, then the
    /// selected facet values.
    ///
    /// Validates every field name referenced by the config first.
    pub fn generate(&self, config: &SearchConfig) -> Result<String> {
        config.validate_field_names(self.schema)?;

        let field_filter = self.render(config.field_filters())?;

        let mut groups = Vec::new();
        for facet in config.facets.iter().flatten().filter(|f| f.is_selected()) {
            let field = self.schema.require(&facet.facet_name)?;
            let facet_type = match self.schema.facet_spec(field) {
                Some(spec) if spec.is_range() => FacetType::Range,
                _ => FacetType::Value,
            };
            let predicates = facet.predicates(field.is_collection, facet_type);
            if !predicates.is_empty() {
                groups.push(predicates);
            }
        }
        let single_predicate = matches!(groups.as_slice(), [only] if only.len() == 1);
        let value_separator = format!(" {} ", config.combine_facet_values);
        let queries: Vec<String> = groups.iter().map(|g| g.join(&value_separator)).collect();
        let facet_filter = join_facet_queries(&queries, config.combine_facets);

        if field_filter.is_empty() {
            return Ok(facet_filter);
        }
        if facet_filter.is_empty() {
            return Ok(field_filter);
        }
        // An operator inside the facet part would otherwise escape the
        // leading field filters.
        if single_predicate {
            Ok(format!("{field_filter} and {facet_filter}"))
        } else {
            Ok(format!("{field_filter} and ({facet_filter})"))
        }
    }

    fn check_field(&self, filter: &FieldFilter) -> Result<&'a FieldDescriptor> {
        let field = self.schema.require(&filter.field_name)?;
        if !field.capabilities.filterable {
            return Err(Error::config_field(&field.wire_name, "is not filterable"));
        }
        if field.value_kind != filter.value.kind() {
            return Err(Error::config_field(
                &field.wire_name,
                format!(
                    "{} filter applied to a {} field",
                    filter.value.kind(),
                    field.value_kind
                ),
            ));
        }
        Ok(field)
    }
}

// ============================================================================
// Tests
// ============================================================================
