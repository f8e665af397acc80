//! Facetry faceted-search query controller, umbrella crate.
//!
//! This crate re-exports all Facetry components for convenience.
//! The `query` feature (on by default) adds filter building and search
//! orchestration on top of the core schema types.

#![doc = include_str!("../README.md")]

pub use facetry_core as core;

#[cfg(feature = "query")]
pub use facetry_query as query;

pub use facetry_core::{schema_of, Error, FieldDescriptor, Result, Schema, Searchable};

#[cfg(feature = "query")]
pub use facetry_query::{SearchConfig, SearchIndex, SearchRequest, Searcher};
