//! Facetry Core: scalar values, schema resolution, errors, and settings.
//!
//! This crate provides the foundational types shared by all Facetry crates.
//! It has no internal Facetry dependencies (dependency level 0).
//!
//! # Modules
//!
//! - [`error`]: Error taxonomy and Result alias
//! - [`value`]: Tagged scalar values and filter literals
//! - [`facet_spec`]: Facet bucketing specifications and interval arithmetic
//! - [`schema`]: Field descriptors and the validated per-type schema
//! - [`registry`]: Process-wide, once-per-type schema cache
//! - [`settings`]: Tunable defaults loadable from TOML

#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]

pub mod error;
pub mod facet_spec;
pub mod registry;
pub mod schema;
pub mod settings;
pub mod value;

// Re-export key types at crate root for convenience
pub use error::{Error, Result};
pub use facet_spec::{
    FacetInterval, FacetKind, FacetSpec, RangeMarkers, RangeValueKind, RuntimeSpecType,
    TimeInterval, DEFAULT_FACET_COUNT,
};
pub use registry::{schema_of, Searchable};
pub use schema::{Capabilities, DateTimeDisplayFormat, DisplayFormat, FieldDescriptor, Schema};
pub use settings::{SearchSettings, DEFAULT_PAGE_SIZE};
pub use value::{FacetScalar, Timestamp, ValueKind};
