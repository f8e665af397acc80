//! Facet declarations sent to the index.
//!
//! Every facetable field yields one declaration string:
//!
//! - value facets: `"{field},count:{n}"`
//! - interval facets: `"{field},interval:{step}"` (calendar units in lower case)
//! - marker facets: `"{field},values:{m1}|{m2}|…"`
//!
//! Range facets may take their interval or markers from a
//! [`RuntimeFacetSpec`] supplied with the request. A range facet without
//! static data and without an override is not declared.

use facetry_core::{
    Error, FacetInterval, FacetSpec, FieldDescriptor, RangeMarkers, RangeValueKind, Result, Schema,
    Timestamp, TimeInterval,
};

/// Interval or markers supplied for one request.
#[derive(Debug, Clone, PartialEq)]
pub enum RangeOverride {
    /// Fixed bucket width.
    Interval(FacetInterval),
    /// Explicit boundaries.
    Markers(RangeMarkers),
}

impl RangeOverride {
    /// Range value kind the override applies to.
    pub fn range_value_kind(&self) -> RangeValueKind {
        match self {
            Self::Interval(interval) => interval.range_value_kind(),
            Self::Markers(markers) => markers.range_value_kind(),
        }
    }

    /// Interval, when this is an interval override.
    pub fn interval(&self) -> Option<FacetInterval> {
        match self {
            Self::Interval(interval) => Some(*interval),
            Self::Markers(_) => None,
        }
    }

    fn is_empty(&self) -> bool {
        matches!(self, Self::Markers(markers) if markers.is_empty())
    }

    fn declaration(&self, wire_name: &str) -> String {
        match self {
            Self::Interval(interval) => format!("{wire_name},interval:{interval}"),
            Self::Markers(markers) => format!("{wire_name},values:{markers}"),
        }
    }
}

/// Per-request range data for one facetable field.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeFacetSpec {
    /// Wire name of the field.
    pub field: String,
    /// Range data to use instead of the field's static spec.
    pub range: RangeOverride,
}

impl RuntimeFacetSpec {
    /// Override with an explicit range.
    pub fn new(field: impl Into<String>, range: RangeOverride) -> Self {
        Self {
            field: field.into(),
            range,
        }
    }

    /// Numeric interval override.
    pub fn numeric_interval(field: impl Into<String>, step: f64) -> Self {
        Self::new(field, RangeOverride::Interval(FacetInterval::Numeric(step)))
    }

    /// Calendar interval override.
    pub fn time_interval(field: impl Into<String>, unit: TimeInterval) -> Self {
        Self::new(field, RangeOverride::Interval(FacetInterval::Time(unit)))
    }

    /// Numeric markers override.
    pub fn numeric_values(field: impl Into<String>, markers: impl IntoIterator<Item = f64>) -> Self {
        Self::new(
            field,
            RangeOverride::Markers(RangeMarkers::Numeric(markers.into_iter().collect())),
        )
    }

    /// Date-time markers override.
    pub fn date_time_values(
        field: impl Into<String>,
        markers: impl IntoIterator<Item = Timestamp>,
    ) -> Self {
        Self::new(
            field,
            RangeOverride::Markers(RangeMarkers::DateTime(markers.into_iter().collect())),
        )
    }
}

/// First non-empty override for `field`.
pub(crate) fn find_override<'o>(
    overrides: &'o [RuntimeFacetSpec],
    field: &FieldDescriptor,
) -> Option<&'o RangeOverride> {
    overrides
        .iter()
        .find(|o| o.field == field.wire_name && !o.range.is_empty())
        .map(|o| &o.range)
}

/// Range data in effect for a range facet: the override when there is one,
/// else the static interval, else non-empty static markers.
pub(crate) fn effective_range(
    spec: &FacetSpec,
    override_range: Option<&RangeOverride>,
) -> Option<RangeOverride> {
    if let Some(range) = override_range {
        return Some(range.clone());
    }
    if let Some(interval) = spec.interval {
        return Some(RangeOverride::Interval(interval));
    }
    spec.markers
        .as_ref()
        .filter(|m| !m.is_empty())
        .map(|m| RangeOverride::Markers(m.clone()))
}

/// Check overrides against the schema.
///
/// # Errors
///
/// Returns [`Error::Config`] when an override names an unknown field or a
/// field that is not a range facet, and [`Error::TypeMismatch`] when its
/// range kind differs from the field's.
pub fn validate_overrides(schema: &Schema, overrides: &[RuntimeFacetSpec]) -> Result<()> {
    for entry in overrides {
        let field = schema.require(&entry.field)?;
        let Some(spec) = schema.facet_spec(field).filter(FacetSpec::is_range) else {
            return Err(Error::config_field(
                &field.wire_name,
                "runtime facet spec given for a field that is not a range facet",
            ));
        };
        let expected = spec
            .range_value_kind
            .ok_or_else(|| Error::config_field(&field.wire_name, "range facet has no range kind"))?;
        let found = entry.range.range_value_kind();
        if expected != found {
            return Err(Error::type_mismatch(
                format!("{expected} range for {}", field.wire_name),
                format!("{found} range"),
            ));
        }
    }
    Ok(())
}

/// Builds facet declarations for a schema.
#[derive(Debug, Clone, Copy)]
pub struct FacetDeclarationBuilder<'a> {
    schema: &'a Schema,
}

impl<'a> FacetDeclarationBuilder<'a> {
    /// Create a builder for `schema`.
    pub fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    /// One declaration per declarable facetable field, in schema order.
    ///
    /// The first non-empty override per field wins.
    pub fn declare(&self, overrides: &[RuntimeFacetSpec]) -> Result<Vec<String>> {
        validate_overrides(self.schema, overrides)?;

        let mut declarations = Vec::new();
        for (field, spec) in self.schema.facet_fields() {
            if !spec.is_range() {
                declarations.push(format!("{},count:{}", field.wire_name, spec.count));
                continue;
            }
            match effective_range(&spec, find_override(overrides, field)) {
                Some(range) => declarations.push(range.declaration(&field.wire_name)),
                None => log::debug!(
                    "Range facet {} has no interval or markers; not declared",
                    field.wire_name
                ),
            }
        }
        Ok(declarations)
    }
}

// ============================================================================
// Tests
// ============================================================================
