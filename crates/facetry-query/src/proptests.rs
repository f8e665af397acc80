//! Property-based tests for filter rendering and facet reconciliation.
