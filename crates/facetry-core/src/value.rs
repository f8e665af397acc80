//! Scalar values and filter-literal rendering.
//!
//! Facet buckets, range markers and filter bounds all travel as
//! [`FacetScalar`], a tagged union coerced once when it is written. Reading a
//! value never needs to inspect its runtime type again.

use std::fmt;

use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp representation used throughout Facetry.
///
/// The original offset is preserved; equality compares instants.
pub type Timestamp = DateTime<FixedOffset>;

/// Kind of value a document field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    /// Free text or keyword.
    #[default]
    String,
    /// Integer or floating point number.
    Numeric,
    /// `true` / `false`.
    Boolean,
    /// Date and time with offset.
    DateTime,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Numeric => write!(f, "numeric"),
            Self::Boolean => write!(f, "boolean"),
            Self::DateTime => write!(f, "datetime"),
        }
    }
}

// ============================================================================
// FacetScalar
// ============================================================================

/// A single value as stored in a facet bucket, range marker or filter bound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacetScalar {
    /// Boolean value.
    Boolean(bool),
    /// Any numeric value, widened to `f64`.
    Number(f64),
    /// Timestamp with offset.
    Timestamp(Timestamp),
    /// Anything else.
    Text(String),
}

impl FacetScalar {
    /// Short name of the variant, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Boolean(_) => "boolean",
            Self::Number(_) => "number",
            Self::Timestamp(_) => "timestamp",
            Self::Text(_) => "text",
        }
    }

    /// Coerce this value into the canonical representation for `kind`.
    ///
    /// Numeric-like text becomes a number on numeric fields, RFC 3339 text
    /// becomes a timestamp on date-time fields. Values that cannot be coerced
    /// are returned unchanged.
    pub fn coerce(self, kind: ValueKind) -> Self {
        match (kind, self) {
            (ValueKind::Numeric, Self::Text(text)) => match text.trim().parse::<f64>() {
                Ok(number) => Self::Number(number),
                Err(_) => Self::Text(text),
            },
            (ValueKind::DateTime, Self::Text(text)) => {
                match DateTime::parse_from_rfc3339(text.trim()) {
                    Ok(ts) => Self::Timestamp(ts),
                    Err(_) => Self::Text(text),
                }
            }
            (ValueKind::Boolean, Self::Text(text)) => match text.trim() {
                "true" => Self::Boolean(true),
                "false" => Self::Boolean(false),
                _ => Self::Text(text),
            },
            (_, other) => other,
        }
    }

    /// Convert a JSON value reported by an index into a scalar for a field
    /// of the given kind. `null` maps to `None`.
    pub fn from_json(value: &serde_json::Value, kind: ValueKind) -> Option<Self> {
        let scalar = match value {
            serde_json::Value::Null => return None,
            serde_json::Value::Bool(b) => Self::Boolean(*b),
            serde_json::Value::Number(n) => Self::Number(n.as_f64()?),
            serde_json::Value::String(s) => Self::Text(s.clone()),
            other => Self::Text(other.to_string()),
        };
        Some(scalar.coerce(kind))
    }

    /// Numeric payload, if this is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Timestamp payload, if this is a timestamp.
    pub fn as_timestamp(&self) -> Option<&Timestamp> {
        match self {
            Self::Timestamp(ts) => Some(ts),
            _ => None,
        }
    }

    /// Render as a literal in the index's filter grammar.
    pub fn to_literal(&self) -> String {
        match self {
            Self::Boolean(b) => b.to_string(),
            Self::Number(n) => number_literal(*n),
            Self::Timestamp(ts) => timestamp_literal(ts),
            Self::Text(s) => string_literal(s),
        }
    }
}

/// Plain rendering, used for facet declarations and display.
impl fmt::Display for FacetScalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{}", number_literal(*n)),
            Self::Timestamp(ts) => write!(f, "{}", timestamp_literal(ts)),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for FacetScalar {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<f64> for FacetScalar {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for FacetScalar {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<i32> for FacetScalar {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<Timestamp> for FacetScalar {
    fn from(value: Timestamp) -> Self {
        Self::Timestamp(value)
    }
}

impl From<DateTime<Utc>> for FacetScalar {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value.fixed_offset())
    }
}

impl From<&str> for FacetScalar {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FacetScalar {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

// ============================================================================
// Literals
// ============================================================================

/// Single-quoted string literal with embedded quotes doubled.
pub fn string_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Unquoted numeric literal. Non-finite values use the grammar's keywords.
pub fn number_literal(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "INF".to_string()
    } else if value == f64::NEG_INFINITY {
        "-INF".to_string()
    } else {
        format!("{value}")
    }
}

/// Unquoted RFC 3339 timestamp literal.
pub fn timestamp_literal(value: &Timestamp) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

// ============================================================================
// Tests
// ============================================================================
