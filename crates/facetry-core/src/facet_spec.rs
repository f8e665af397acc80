//! Facet bucketing specifications.
//!
//! A [`FacetSpec`] tells the index how to bucket a facetable field: by
//! discrete value, by a fixed interval, or by an explicit list of boundary
//! markers. Range specs may also leave the interval/markers empty so that a
//! caller can supply them per request.

use std::fmt;

use chrono::{Months, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::value::{number_literal, timestamp_literal, FacetScalar, Timestamp, ValueKind};

/// Bucket count requested from the index when a spec does not set one.
pub const DEFAULT_FACET_COUNT: u32 = 10;

/// How a facet is bucketed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacetKind {
    /// One bucket per distinct value.
    #[default]
    Value,
    /// Half-open buckets of a fixed width.
    RangeInterval,
    /// Buckets bounded by explicit markers.
    RangeValues,
}

/// Kind of value a range facet buckets over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeValueKind {
    /// Numeric ranges.
    Numeric,
    /// Date-time ranges.
    DateTime,
}

impl RangeValueKind {
    /// Field value kind this range kind applies to.
    pub fn value_kind(self) -> ValueKind {
        match self {
            Self::Numeric => ValueKind::Numeric,
            Self::DateTime => ValueKind::DateTime,
        }
    }
}

impl fmt::Display for RangeValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value_kind().fmt(f)
    }
}

/// Calendar unit for date-time interval facets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeInterval {
    /// One minute.
    Minute,
    /// One hour.
    Hour,
    /// One calendar day.
    Day,
    /// Seven days.
    Week,
    /// One calendar month.
    Month,
    /// Three calendar months.
    Quarter,
    /// Twelve calendar months.
    Year,
}

impl TimeInterval {
    /// Lower-case unit name used in facet declarations.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Minute => "minute",
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Quarter => "quarter",
            Self::Year => "year",
        }
    }

    /// Advance `ts` by one unit. Month-based units clamp to the end of the
    /// target month. Returns `None` on overflow.
    pub fn add_to(self, ts: &Timestamp) -> Option<Timestamp> {
        match self {
            Self::Minute => ts.checked_add_signed(TimeDelta::minutes(1)),
            Self::Hour => ts.checked_add_signed(TimeDelta::hours(1)),
            Self::Day => ts.checked_add_signed(TimeDelta::days(1)),
            Self::Week => ts.checked_add_signed(TimeDelta::days(7)),
            Self::Month => ts.checked_add_months(Months::new(1)),
            Self::Quarter => ts.checked_add_months(Months::new(3)),
            Self::Year => ts.checked_add_months(Months::new(12)),
        }
    }
}

impl fmt::Display for TimeInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Intervals and markers
// ============================================================================

/// Fixed bucket width for an interval facet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacetInterval {
    /// Numeric step.
    Numeric(f64),
    /// Calendar unit.
    Time(TimeInterval),
}

impl FacetInterval {
    /// Range value kind this interval applies to.
    pub fn range_value_kind(&self) -> RangeValueKind {
        match self {
            Self::Numeric(_) => RangeValueKind::Numeric,
            Self::Time(_) => RangeValueKind::DateTime,
        }
    }

    /// Compute the exclusive upper bound of the bucket starting at `value`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] when `value` is not of the kind the
    /// interval applies to.
    pub fn add(&self, value: &FacetScalar) -> Result<FacetScalar> {
        match (self, value) {
            (Self::Numeric(step), FacetScalar::Number(n)) => Ok(FacetScalar::Number(n + step)),
            (Self::Time(unit), FacetScalar::Timestamp(ts)) => unit
                .add_to(ts)
                .map(FacetScalar::Timestamp)
                .ok_or_else(|| {
                    Error::config(format!("adding one {unit} to {ts} overflows the calendar"))
                }),
            (Self::Numeric(_), other) => Err(Error::type_mismatch("number", other.kind_name())),
            (Self::Time(_), other) => Err(Error::type_mismatch("timestamp", other.kind_name())),
        }
    }
}

impl fmt::Display for FacetInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(step) => f.write_str(&number_literal(*step)),
            Self::Time(unit) => unit.fmt(f),
        }
    }
}

/// Explicit, ascending bucket boundaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeMarkers {
    /// Numeric boundaries.
    Numeric(Vec<f64>),
    /// Date-time boundaries.
    DateTime(Vec<Timestamp>),
}

impl RangeMarkers {
    /// Range value kind the markers apply to.
    pub fn range_value_kind(&self) -> RangeValueKind {
        match self {
            Self::Numeric(_) => RangeValueKind::Numeric,
            Self::DateTime(_) => RangeValueKind::DateTime,
        }
    }

    /// Number of markers.
    pub fn len(&self) -> usize {
        match self {
            Self::Numeric(m) => m.len(),
            Self::DateTime(m) => m.len(),
        }
    }

    /// True when no markers are present.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when every marker is strictly greater than the one before it.
    pub fn is_ascending(&self) -> bool {
        match self {
            Self::Numeric(m) => m.windows(2).all(|w| w[0] < w[1]),
            Self::DateTime(m) => m.windows(2).all(|w| w[0] < w[1]),
        }
    }
}

/// Pipe-separated marker list, as used in `values:` declarations.
impl fmt::Display for RangeMarkers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = match self {
            Self::Numeric(m) => m.iter().map(|v| number_literal(*v)).collect(),
            Self::DateTime(m) => m.iter().map(timestamp_literal).collect(),
        };
        f.write_str(&rendered.join("|"))
    }
}

/// Range facet declared without static range data; the interval or markers
/// are supplied per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeSpecType {
    /// Numeric markers supplied at runtime.
    NumericValues,
    /// Date-time markers supplied at runtime.
    DateTimeValues,
    /// Numeric interval supplied at runtime.
    NumericInterval,
    /// Calendar interval supplied at runtime.
    DateTimeInterval,
}

// ============================================================================
// FacetSpec
// ============================================================================

/// How a facetable field is bucketed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetSpec {
    /// Bucketing strategy.
    pub kind: FacetKind,

    /// Value kind for range facets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_value_kind: Option<RangeValueKind>,

    /// Fixed interval (`RangeInterval`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<FacetInterval>,

    /// Explicit markers (`RangeValues`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markers: Option<RangeMarkers>,

    /// Requested bucket count for value facets.
    #[serde(default = "default_count")]
    pub count: u32,
}

fn default_count() -> u32 {
    DEFAULT_FACET_COUNT
}

impl Default for FacetSpec {
    fn default() -> Self {
        Self::value()
    }
}

impl FacetSpec {
    /// Discrete value facet with the default bucket count.
    pub fn value() -> Self {
        Self {
            kind: FacetKind::Value,
            range_value_kind: None,
            interval: None,
            markers: None,
            count: DEFAULT_FACET_COUNT,
        }
    }

    /// Numeric interval facet.
    pub fn numeric_interval(step: f64) -> Self {
        Self::interval(FacetInterval::Numeric(step))
    }

    /// Calendar interval facet.
    pub fn time_interval(unit: TimeInterval) -> Self {
        Self::interval(FacetInterval::Time(unit))
    }

    /// Interval facet of either kind.
    pub fn interval(interval: FacetInterval) -> Self {
        Self {
            kind: FacetKind::RangeInterval,
            range_value_kind: Some(interval.range_value_kind()),
            interval: Some(interval),
            ..Self::value()
        }
    }

    /// Numeric range facet bounded by the given markers.
    pub fn numeric_values(markers: impl IntoIterator<Item = f64>) -> Self {
        Self::values(RangeMarkers::Numeric(markers.into_iter().collect()))
    }

    /// Date-time range facet bounded by the given markers.
    pub fn date_time_values(markers: impl IntoIterator<Item = Timestamp>) -> Self {
        Self::values(RangeMarkers::DateTime(markers.into_iter().collect()))
    }

    /// Marker facet of either kind.
    pub fn values(markers: RangeMarkers) -> Self {
        Self {
            kind: FacetKind::RangeValues,
            range_value_kind: Some(markers.range_value_kind()),
            markers: Some(markers),
            ..Self::value()
        }
    }

    /// Range facet whose interval or markers arrive with each request.
    pub fn runtime(spec_type: RuntimeSpecType) -> Self {
        let (kind, range_value_kind) = match spec_type {
            RuntimeSpecType::NumericValues => (FacetKind::RangeValues, RangeValueKind::Numeric),
            RuntimeSpecType::DateTimeValues => (FacetKind::RangeValues, RangeValueKind::DateTime),
            RuntimeSpecType::NumericInterval => {
                (FacetKind::RangeInterval, RangeValueKind::Numeric)
            }
            RuntimeSpecType::DateTimeInterval => {
                (FacetKind::RangeInterval, RangeValueKind::DateTime)
            }
        };
        Self {
            kind,
            range_value_kind: Some(range_value_kind),
            ..Self::value()
        }
    }

    /// Set the requested bucket count.
    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    /// True for interval and marker facets.
    pub fn is_range(&self) -> bool {
        !matches!(self.kind, FacetKind::Value)
    }

    /// True when the spec carries an interval or a non-empty marker list.
    pub fn has_range_data(&self) -> bool {
        self.interval.is_some() || self.markers.as_ref().is_some_and(|m| !m.is_empty())
    }

    /// Check the spec against the field it is declared on.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the field when the spec is internally
    /// inconsistent or does not fit the field's value kind.
    pub fn validate(&self, field: &str, field_kind: ValueKind) -> Result<()> {
        if !self.is_range() {
            if self.interval.is_some() || self.markers.is_some() {
                return Err(Error::config_field(
                    field,
                    "value facets cannot carry an interval or range markers",
                ));
            }
            return Ok(());
        }

        let Some(range_kind) = self.range_value_kind else {
            return Err(Error::config_field(
                field,
                "range facets must declare a numeric or datetime range kind",
            ));
        };

        if range_kind.value_kind() != field_kind {
            return Err(Error::config_field(
                field,
                format!("{range_kind} range facet declared on a {field_kind} field"),
            ));
        }

        if let Some(interval) = &self.interval {
            if interval.range_value_kind() != range_kind {
                return Err(Error::config_field(
                    field,
                    format!("interval {interval} does not match {range_kind} range kind"),
                ));
            }
            if let FacetInterval::Numeric(step) = interval {
                if !step.is_finite() || *step <= 0.0 {
                    return Err(Error::config_field(
                        field,
                        format!("numeric interval must be a positive finite number, got {step}"),
                    ));
                }
            }
        }

        if let Some(markers) = &self.markers {
            if markers.range_value_kind() != range_kind {
                return Err(Error::config_field(
                    field,
                    format!("range markers do not match {range_kind} range kind"),
                ));
            }
            if !markers.is_ascending() {
                return Err(Error::config_field(
                    field,
                    format!("range markers must be strictly ascending: {markers}"),
                ));
            }
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
