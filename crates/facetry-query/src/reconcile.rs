//! Facet model reconciliation.
//!
//! The first search builds the facet sets from the returned buckets. Later
//! searches merge fresh buckets into the sets the client sent back:
//!
//! - existing values keep their position and selection
//! - `filtered_count` tracks the current filter, dropping to zero when a
//!   bucket vanishes
//! - `count` only ever grows
//! - values new to a facet are appended, unselected
//!
//! Reconciling the same response twice leaves the sets unchanged.

use facetry_core::{Error, FacetKind, FacetSpec, FieldDescriptor, Result, Schema};

use crate::declaration::{effective_range, find_override, validate_overrides, RuntimeFacetSpec};
use crate::facets::{FacetRangeType, FacetSet, FacetType, FacetValue};
use crate::index::{Bucket, FacetBuckets};

/// Builds and updates facet sets from index buckets.
#[derive(Debug, Clone, Copy)]
pub struct FacetReconciler<'a> {
    schema: &'a Schema,
    overrides: &'a [RuntimeFacetSpec],
}

impl<'a> FacetReconciler<'a> {
    /// Reconciler for `schema` with no runtime overrides.
    pub fn new(schema: &'a Schema) -> Self {
        Self {
            schema,
            overrides: &[],
        }
    }

    /// Use the overrides the request was declared with, so interval
    /// arithmetic matches what the index bucketed by.
    pub fn with_overrides(mut self, overrides: &'a [RuntimeFacetSpec]) -> Self {
        self.overrides = overrides;
        self
    }

    /// Facet sets for a first search, ordered by facet name.
    ///
    /// Groups naming a field that is not facetable in the schema are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] when interval arithmetic meets a
    /// bucket of the wrong kind, and [`Error::Config`] when the index
    /// reports interval buckets for a facet with no interval.
    pub fn build_initial(&self, buckets: &FacetBuckets) -> Result<Vec<FacetSet>> {
        validate_overrides(self.schema, self.overrides)?;

        let mut sets = Vec::with_capacity(buckets.len());
        for (name, group) in buckets {
            let Some(field) = self.schema.field(name) else {
                log::warn!("Index returned facet {name}, which is not in the schema; skipping");
                continue;
            };
            let Some(spec) = self.schema.facet_spec(field) else {
                log::warn!("Index returned facet {name}, which is not facetable; skipping");
                continue;
            };
            sets.push(self.build_facet_set(field, &spec, group)?);
        }
        Ok(sets)
    }

    /// Merge fresh buckets into `previous` in place.
    pub fn reconcile(&self, previous: &mut [FacetSet], buckets: &FacetBuckets) -> Result<()> {
        let fresh = self.build_initial(buckets)?;
        merge_facet_sets(previous, &fresh);
        Ok(())
    }

    fn build_facet_set(
        &self,
        field: &FieldDescriptor,
        spec: &FacetSpec,
        group: &[Bucket],
    ) -> Result<FacetSet> {
        let kind = field.value_kind;
        let (facet_type, facet_range_type) = if spec.is_range() {
            (FacetType::Range, range_type(spec, group.first()))
        } else {
            (FacetType::Value, FacetRangeType::Value)
        };

        let values = match facet_range_type {
            FacetRangeType::Value => group
                .iter()
                .map(|b| FacetValue::new(b.value.clone(), None, kind, bucket_count(b)))
                .collect(),
            FacetRangeType::Range => group
                .iter()
                .map(|b| FacetValue::new(b.from.clone(), b.to.clone(), kind, bucket_count(b)))
                .collect(),
            FacetRangeType::Interval => {
                let interval = effective_range(spec, find_override(self.overrides, field))
                    .and_then(|r| r.interval());
                let mut values = Vec::with_capacity(group.len());
                for bucket in group {
                    let start = bucket.value.clone().map(|v| v.coerce(kind));
                    let end = match (&start, interval) {
                        (Some(start), Some(interval)) => Some(interval.add(start)?),
                        (Some(_), None) => {
                            return Err(Error::config_field(
                                &field.wire_name,
                                "index returned interval buckets but no interval is configured",
                            ));
                        }
                        (None, _) => None,
                    };
                    values.push(FacetValue::new(start, end, kind, bucket_count(bucket)));
                }
                values
            }
        };

        Ok(FacetSet {
            facet_name: field.wire_name.clone(),
            display_name: field.display_name(),
            facet_type,
            facet_range_type,
            value_kind: kind,
            is_collection: field.is_collection,
            number_format: field.number_format().map(str::to_string),
            date_time_format: field.date_time_format(),
            values,
        })
    }
}

/// Range facets are shaped by what the index sent: a bucket reported by
/// value means interval bucketing, bounds mean marker ranges. Without
/// buckets the spec decides.
fn range_type(spec: &FacetSpec, first: Option<&Bucket>) -> FacetRangeType {
    match first {
        Some(bucket) if bucket.is_range_shaped() => FacetRangeType::Range,
        Some(_) => FacetRangeType::Interval,
        None => match spec.kind {
            FacetKind::RangeInterval => FacetRangeType::Interval,
            FacetKind::RangeValues => FacetRangeType::Range,
            FacetKind::Value => FacetRangeType::Value,
        },
    }
}

fn bucket_count(bucket: &Bucket) -> u64 {
    bucket.count.unwrap_or(0)
}

/// Merge `fresh` facet sets into `previous`.
///
/// Facets present only in `fresh` are not added; facets missing from
/// `fresh` keep their values with `filtered_count` zeroed.
pub fn merge_facet_sets(previous: &mut [FacetSet], fresh: &[FacetSet]) {
    for facet in previous.iter_mut() {
        let Some(updated) = fresh.iter().find(|f| f.facet_name == facet.facet_name) else {
            for value in &mut facet.values {
                value.filtered_count = 0;
            }
            continue;
        };

        for value in &mut facet.values {
            match updated.values.iter().find(|u| u.same_bucket(value)) {
                Some(current) => {
                    value.filtered_count = current.count;
                    value.count = value.count.max(current.count);
                }
                None => value.filtered_count = 0,
            }
        }

        let appended: Vec<FacetValue> = updated
            .values
            .iter()
            .filter(|u| !facet.values.iter().any(|v| v.same_bucket(u)))
            .map(|u| u.clone().with_selected(false))
            .collect();
        if !appended.is_empty() {
            log::debug!(
                "Facet {} gained {} new values",
                facet.facet_name,
                appended.len()
            );
        }
        facet.values.extend(appended);
    }
}

// ============================================================================
// Tests
// ============================================================================
