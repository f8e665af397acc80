//! Field descriptors and the resolved per-document-type schema.
//!
//! A schema-resolution collaborator (derive macro, code generation, or manual
//! registration) produces an ordered list of [`FieldDescriptor`]s. [`Schema`]
//! validates that list once and is read-only afterwards; every other Facetry
//! component takes field names and capabilities from it, never from user
//! input.
//!
//! # Example
//!
//! ```rust
//! use facetry_core::{FacetSpec, FieldDescriptor, Schema, ValueKind};
//!
//! let schema = Schema::new(vec![
//!     FieldDescriptor::new("Role", ValueKind::String)
//!         .searchable()
//!         .filterable()
//!         .facetable(),
//!     FieldDescriptor::new("Balance", ValueKind::Numeric)
//!         .filterable()
//!         .sortable()
//!         .facetable()
//!         .with_facet(FacetSpec::numeric_values([10000.0, 50000.0])),
//! ])?;
//!
//! assert!(schema.field("Balance").is_some());
//! # Ok::<(), facetry_core::Error>(())
//! ```

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::facet_spec::{FacetSpec, DEFAULT_FACET_COUNT};
use crate::value::ValueKind;

// ============================================================================
// Capabilities and display
// ============================================================================

/// What the index allows for a field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Participates in full-text search.
    pub searchable: bool,
    /// Can appear in a filter expression.
    pub filterable: bool,
    /// Can appear in an ordering directive.
    pub sortable: bool,
    /// Can be requested as a facet.
    pub facetable: bool,
}

/// How date-time values should be shown by a UI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateTimeDisplayFormat {
    /// Date and time.
    #[default]
    DateTime,
    /// Date only.
    Date,
    /// Time only.
    Time,
}

/// Display hints carried through to selectors and facet sets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayFormat {
    /// Explicit display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Number format hint, e.g. `"$0.00"`. The number of zeroes after the
    /// point is the number of decimal places wanted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_format: Option<String>,

    /// Date-time display hint.
    #[serde(default)]
    pub date_time_format: DateTimeDisplayFormat,

    /// Insert spaces at PascalCase boundaries. Defaults to true when no
    /// explicit display name is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_out_pascal_case: Option<bool>,
}

impl DisplayFormat {
    /// Whether PascalCase spacing applies.
    pub fn spaces_pascal_case(&self) -> bool {
        self.space_out_pascal_case
            .unwrap_or(self.display_name.is_none())
    }
}

// ============================================================================
// FieldDescriptor
// ============================================================================

/// One field of a document type, as resolved from its declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Logical (declared) name.
    pub name: String,

    /// Name of the field in the index.
    pub wire_name: String,

    /// Kind of value held.
    pub value_kind: ValueKind,

    /// Multi-valued field.
    #[serde(default)]
    pub is_collection: bool,

    /// Index capabilities.
    #[serde(default)]
    pub capabilities: Capabilities,

    /// Bucketing for facetable fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facet_spec: Option<FacetSpec>,

    /// Display hints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<DisplayFormat>,
}

impl FieldDescriptor {
    /// Create a descriptor with no capabilities whose wire name equals its
    /// logical name.
    pub fn new(name: impl Into<String>, value_kind: ValueKind) -> Self {
        let name = name.into();
        Self {
            wire_name: name.clone(),
            name,
            value_kind,
            is_collection: false,
            capabilities: Capabilities::default(),
            facet_spec: None,
            display: None,
        }
    }

    /// Use a different name in the index.
    pub fn with_wire_name(mut self, wire_name: impl Into<String>) -> Self {
        self.wire_name = wire_name.into();
        self
    }

    /// Mark as multi-valued.
    pub fn collection(mut self) -> Self {
        self.is_collection = true;
        self
    }

    /// Enable full-text search.
    pub fn searchable(mut self) -> Self {
        self.capabilities.searchable = true;
        self
    }

    /// Enable filtering.
    pub fn filterable(mut self) -> Self {
        self.capabilities.filterable = true;
        self
    }

    /// Enable ordering.
    pub fn sortable(mut self) -> Self {
        self.capabilities.sortable = true;
        self
    }

    /// Enable faceting.
    pub fn facetable(mut self) -> Self {
        self.capabilities.facetable = true;
        self
    }

    /// Attach a facet spec. The field must also be [`facetable`](Self::facetable).
    pub fn with_facet(mut self, spec: FacetSpec) -> Self {
        self.facet_spec = Some(spec);
        self
    }

    /// Attach display hints.
    pub fn with_display(mut self, display: DisplayFormat) -> Self {
        self.display = Some(display);
        self
    }

    /// Set an explicit display name.
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display.get_or_insert_with(DisplayFormat::default).display_name =
            Some(display_name.into());
        self
    }

    /// Human-readable name for UIs.
    ///
    /// Uses the explicit display name when set, and spaces out PascalCase
    /// (`JoinedDate` → `Joined Date`) unless spacing is turned off.
    pub fn display_name(&self) -> String {
        let display = self.display.as_ref();
        let base = display
            .and_then(|d| d.display_name.as_deref())
            .unwrap_or(&self.name);
        if display.is_none_or(|d| d.spaces_pascal_case()) {
            space_out_pascal_case(base)
        } else {
            base.to_string()
        }
    }

    /// Number format hint.
    pub fn number_format(&self) -> Option<&str> {
        self.display.as_ref().and_then(|d| d.number_format.as_deref())
    }

    /// Date-time format hint.
    pub fn date_time_format(&self) -> DateTimeDisplayFormat {
        self.display
            .as_ref()
            .map(|d| d.date_time_format)
            .unwrap_or_default()
    }
}

fn pascal_case_patterns() -> Option<&'static (Regex, Regex)> {
    static PATTERNS: OnceLock<Option<(Regex, Regex)>> = OnceLock::new();
    PATTERNS
        .get_or_init(|| {
            let lower_upper = Regex::new("([a-z0-9])([A-Z])").ok()?;
            let letter_digit = Regex::new("([a-zA-Z])([0-9])").ok()?;
            Some((lower_upper, letter_digit))
        })
        .as_ref()
}

/// Insert a space at every lower→upper and letter→digit boundary.
pub fn space_out_pascal_case(name: &str) -> String {
    match pascal_case_patterns() {
        Some((lower_upper, letter_digit)) => {
            let spaced = lower_upper.replace_all(name, "$1 $2");
            letter_digit.replace_all(&spaced, "$1 $2").into_owned()
        }
        None => name.to_string(),
    }
}

// ============================================================================
// Schema
// ============================================================================

/// Validated, immutable field table for one document type.
#[derive(Debug, Clone)]
pub struct Schema {
    fields: Vec<FieldDescriptor>,
    default_facet_count: u32,
}

impl Schema {
    /// Validate and build a schema with the default facet bucket count.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when two fields share a wire name, when a
    /// facet spec is attached to a field that is not facetable, or when a
    /// facet spec does not fit its field.
    pub fn new(fields: Vec<FieldDescriptor>) -> Result<Self> {
        Self::with_default_facet_count(fields, DEFAULT_FACET_COUNT)
    }

    /// Validate and build a schema; facetable fields without a spec request
    /// `default_facet_count` buckets.
    pub fn with_default_facet_count(
        fields: Vec<FieldDescriptor>,
        default_facet_count: u32,
    ) -> Result<Self> {
        let mut seen = HashSet::new();
        for field in &fields {
            if !seen.insert(field.wire_name.as_str()) {
                return Err(Error::config_field(
                    &field.wire_name,
                    "declared more than once",
                ));
            }
            if let Some(spec) = &field.facet_spec {
                if !field.capabilities.facetable {
                    return Err(Error::config_field(
                        &field.name,
                        "has a facet spec but the field is not facetable",
                    ));
                }
                spec.validate(&field.name, field.value_kind)?;
            }
        }

        log::debug!("Resolved schema with {} fields", fields.len());
        Ok(Self {
            fields,
            default_facet_count,
        })
    }

    /// All fields in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Look up a field by its index (wire) name.
    pub fn field(&self, wire_name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.wire_name == wire_name)
    }

    /// Look up a field by its logical name.
    pub fn field_by_name(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Look up a field by wire name, failing with a configuration error.
    pub fn require(&self, wire_name: &str) -> Result<&FieldDescriptor> {
        self.field(wire_name).ok_or_else(|| {
            Error::config_field(wire_name, "is not a valid field name in the schema")
        })
    }

    /// Effective facet spec for a field, or `None` when it is not facetable.
    pub fn facet_spec(&self, field: &FieldDescriptor) -> Option<FacetSpec> {
        if !field.capabilities.facetable {
            return None;
        }
        Some(
            field
                .facet_spec
                .clone()
                .unwrap_or_else(|| FacetSpec::value().with_count(self.default_facet_count)),
        )
    }

    /// Facetable fields with their effective specs, in declaration order.
    pub fn facet_fields(&self) -> impl Iterator<Item = (&FieldDescriptor, FacetSpec)> {
        self.fields
            .iter()
            .filter_map(|f| self.facet_spec(f).map(|spec| (f, spec)))
    }

    /// Filterable fields.
    pub fn filterable(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.capabilities.filterable)
    }

    /// Sortable fields.
    pub fn sortable(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.capabilities.sortable)
    }

    /// Searchable fields.
    pub fn searchable(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.capabilities.searchable)
    }
}

// ============================================================================
// Tests
// ============================================================================
