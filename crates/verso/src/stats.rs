//! Observable snapshots of registry state.
//!
//! [`StoreStats`] captures arena occupancy and value-variant counts at a
//! point in time; [`StoreStats::diff`] compares two captures. Useful for
//! watching what a traced region created and for asserting in tests that a
//! sequence of operations allocated exactly what it should have.

use std::collections::BTreeMap;

use crate::{registry::Registry, tracer::StoreTracer};

/// Snapshot of registry state at a point in time.
///
/// The `values_by_variant` map uses `BTreeMap` for deterministic iteration
/// order, making snapshots suitable for display and comparison without sort
/// overhead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    /// Live fields in the field arena.
    pub live_fields: usize,
    /// Live attributes in the attribute arena.
    pub live_attributes: usize,
    /// Live values in the value arena.
    pub live_values: usize,
    /// Freed (reusable) slots across all three arenas.
    pub free_slots: usize,
    /// Total slots across all three arenas (live + free).
    pub total_slots: usize,
    /// Breakdown of live values by `Value` variant name.
    ///
    /// Keys are static variant names (e.g. "Number", "List", "Tensor").
    pub values_by_variant: BTreeMap<&'static str, usize>,
    /// Distinct attribute names interned this trace.
    pub interned_names: usize,
    /// Distinct commit ids recorded this trace.
    pub recorded_commits: usize,
}

/// Difference between two registry snapshots.
///
/// Computed via [`StoreStats::diff`]. Positive deltas mean growth from the
/// "before" snapshot to the "after" one. Only variants present in at least
/// one of the two snapshots appear in `values_by_variant_delta`; variants
/// exclusive to "after" are listed in `new_variants`, exclusive to "before"
/// in `removed_variants`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreDiff {
    /// Change in live field count (`after - before`).
    pub live_fields_delta: isize,
    /// Change in live attribute count.
    pub live_attributes_delta: isize,
    /// Change in live value count.
    pub live_values_delta: isize,
    /// Change in total slot count.
    pub total_slots_delta: isize,
    /// Per-variant deltas. Only includes variants present in either
    /// snapshot.
    pub values_by_variant_delta: BTreeMap<&'static str, isize>,
    /// Variants that appeared in "after" but not "before".
    pub new_variants: Vec<&'static str>,
    /// Variants that appeared in "before" but not "after".
    pub removed_variants: Vec<&'static str>,
    /// Change in interned name count.
    pub interned_names_delta: isize,
    /// Change in recorded commit count.
    pub recorded_commits_delta: isize,
}

impl StoreStats {
    /// Computes the difference between `self` ("before") and `other`
    /// ("after").
    ///
    /// # Example
    ///
    /// ```
    /// use verso::{Registry, Value};
    /// let mut reg = Registry::new();
    /// let before = reg.stats();
    /// reg.new_value(Value::int(1));
    /// let diff = before.diff(&reg.stats());
    /// assert_eq!(diff.live_values_delta, 1);
    /// ```
    #[must_use]
    pub fn diff(&self, other: &Self) -> StoreDiff {
        let (values_by_variant_delta, new_variants, removed_variants) =
            variant_deltas(&self.values_by_variant, &other.values_by_variant);
        StoreDiff {
            live_fields_delta: isize_delta(self.live_fields, other.live_fields),
            live_attributes_delta: isize_delta(self.live_attributes, other.live_attributes),
            live_values_delta: isize_delta(self.live_values, other.live_values),
            total_slots_delta: isize_delta(self.total_slots, other.total_slots),
            values_by_variant_delta,
            new_variants,
            removed_variants,
            interned_names_delta: isize_delta(self.interned_names, other.interned_names),
            recorded_commits_delta: isize_delta(self.recorded_commits, other.recorded_commits),
        }
    }
}

impl StoreDiff {
    /// Returns `true` when all deltas are zero and no variants were added or
    /// removed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live_fields_delta == 0
            && self.live_attributes_delta == 0
            && self.live_values_delta == 0
            && self.total_slots_delta == 0
            && self.interned_names_delta == 0
            && self.recorded_commits_delta == 0
            && self.new_variants.is_empty()
            && self.removed_variants.is_empty()
            && self.values_by_variant_delta.values().all(|&delta| delta == 0)
    }
}

impl std::fmt::Display for StoreDiff {
    /// Produces a human-readable summary of what changed between two
    /// registry snapshots. Example output:
    ///
    /// ```text
    /// StoreDiff: +3 values, +1 attributes, +0 fields
    ///   Number: +2
    ///   Str: +1
    ///   New variants: Str
    /// ```
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "StoreDiff: no changes");
        }

        write!(
            f,
            "StoreDiff: {:+} values, {:+} attributes, {:+} fields",
            self.live_values_delta, self.live_attributes_delta, self.live_fields_delta
        )?;

        // Per-variant deltas (skip zero deltas for conciseness).
        for (&variant, &delta) in &self.values_by_variant_delta {
            if delta != 0 {
                write!(f, "\n  {variant}: {delta:+}")?;
            }
        }

        if !self.new_variants.is_empty() {
            write!(f, "\n  New variants: {}", self.new_variants.join(", "))?;
        }
        if !self.removed_variants.is_empty() {
            write!(f, "\n  Removed variants: {}", self.removed_variants.join(", "))?;
        }

        if self.interned_names_delta != 0 {
            write!(f, "\n  Interned names: {:+}", self.interned_names_delta)?;
        }
        if self.recorded_commits_delta != 0 {
            write!(f, "\n  Recorded commits: {:+}", self.recorded_commits_delta)?;
        }
        Ok(())
    }
}

fn isize_delta(before: usize, after: usize) -> isize {
    let before = isize::try_from(before).expect("count out of isize range");
    let after = isize::try_from(after).expect("count out of isize range");
    after - before
}

fn variant_deltas(
    before: &BTreeMap<&'static str, usize>,
    after: &BTreeMap<&'static str, usize>,
) -> (BTreeMap<&'static str, isize>, Vec<&'static str>, Vec<&'static str>) {
    let mut deltas = BTreeMap::new();
    let mut new_variants = Vec::new();
    let mut removed_variants = Vec::new();

    for (&variant, &count) in before {
        let after_count = after.get(variant).copied().unwrap_or(0);
        deltas.insert(variant, isize_delta(count, after_count));
        if !after.contains_key(variant) {
            removed_variants.push(variant);
        }
    }

    for (&variant, &count) in after {
        if !before.contains_key(variant) {
            deltas.insert(variant, isize_delta(0, count));
            new_variants.push(variant);
        }
    }

    (deltas, new_variants, removed_variants)
}

impl<Tr: StoreTracer> Registry<Tr> {
    /// Captures current arena occupancy and value-variant counts.
    #[must_use]
    pub fn stats(&self) -> StoreStats {
        let (fields, attributes, values) = self.arena_counts();

        let mut values_by_variant: BTreeMap<&'static str, usize> = BTreeMap::new();
        for cell in values.iter_live() {
            *values_by_variant.entry(cell.data().variant_name()).or_insert(0) += 1;
        }

        StoreStats {
            live_fields: fields.live_count(),
            live_attributes: attributes.live_count(),
            live_values: values.live_count(),
            free_slots: fields.free_count() + attributes.free_count() + values.free_count(),
            total_slots: fields.total_count() + attributes.total_count() + values.total_count(),
            values_by_variant,
            interned_names: self.interner().name_count(),
            recorded_commits: self.interner().commit_count(),
        }
    }
}
