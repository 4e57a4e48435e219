//! Tests for `StoreStats` and `StoreStats::diff()`.
//!
//! Verifies that registry snapshots capture arena occupancy and per-variant
//! value counts, and that diffs between two snapshots report growth,
//! shrinkage, and variant changes.

use pretty_assertions::assert_eq;
use verso::{Registry, Value};

// =============================================================================
// 1. Identical Snapshots Produce Empty Diff
// =============================================================================

/// Diffing a snapshot against itself is empty, with all deltas zero.
#[test]
fn diff_of_identical_stats_is_empty() {
    let mut reg = Registry::new();
    let scope = reg.new_field(None, None);
    let x = reg.get_attribute(scope, "x");
    let one = reg.new_value(Value::int(1));
    reg.revise(x, one);

    let stats = reg.stats();
    let diff = stats.diff(&stats);
    assert!(diff.is_empty(), "diff of identical stats should be empty, got: {diff:?}");
    assert_eq!(format!("{diff}"), "StoreDiff: no changes");
}

// =============================================================================
// 2. Growth Shows as Positive Deltas
// =============================================================================

/// Creating entities between two snapshots shows positive deltas in the
/// before-to-after direction.
#[test]
fn growth_is_positive() {
    let mut reg = Registry::new();
    let before = reg.stats();

    let scope = reg.new_field(None, None);
    let x = reg.get_attribute(scope, "x");
    let one = reg.new_value(Value::int(1));
    reg.revise(x, one);
    reg.commit("p");

    let diff = before.diff(&reg.stats());
    assert_eq!(diff.live_fields_delta, 1);
    assert_eq!(diff.live_attributes_delta, 1);
    assert_eq!(diff.live_values_delta, 1);
    assert_eq!(diff.interned_names_delta, 1);
    assert_eq!(diff.recorded_commits_delta, 1);
}

// =============================================================================
// 3. Per-Variant Counts
// =============================================================================

/// Variant counts break down live values by their static variant name, and
/// variants appearing for the first time land in `new_variants`.
#[test]
fn variant_counts_and_new_variants() {
    let mut reg = Registry::new();
    let before = reg.stats();

    reg.new_value(Value::int(1));
    reg.new_value(Value::int(2));
    reg.new_value(Value::str("s"));

    let after = reg.stats();
    assert_eq!(after.values_by_variant.get("Number"), Some(&2));
    assert_eq!(after.values_by_variant.get("Str"), Some(&1));

    let diff = before.diff(&after);
    assert_eq!(diff.values_by_variant_delta.get("Number"), Some(&2));
    assert!(diff.new_variants.contains(&"Number"));
    assert!(diff.new_variants.contains(&"Str"));
    assert!(diff.removed_variants.is_empty());
}

/// A list allocation counts the list, its bound append function, the
/// private field and the "append" attribute.
#[test]
fn list_allocation_footprint() {
    let mut reg = Registry::new();
    let before = reg.stats();
    reg.new_list();
    let diff = before.diff(&reg.stats());

    assert_eq!(diff.live_fields_delta, 1);
    assert_eq!(diff.live_attributes_delta, 1);
    assert_eq!(diff.live_values_delta, 2);
    assert_eq!(diff.values_by_variant_delta.get("List"), Some(&1));
    assert_eq!(diff.values_by_variant_delta.get("Function"), Some(&1));
}

/// Only commits record commit ids; a checkout of a never-committed id does
/// not inflate the count.
#[test]
fn checkout_does_not_record_commit_ids() {
    let mut reg = Registry::new();
    reg.new_value(Value::int(1));
    reg.commit("p");
    let before = reg.stats();

    reg.checkout("never-committed");
    let after = reg.stats();
    assert_eq!(after.recorded_commits, before.recorded_commits);
    assert_eq!(before.diff(&after).recorded_commits_delta, 0);
}

// =============================================================================
// 4. Release and Shrinkage
// =============================================================================

/// Releasing a value frees its slot: live count drops, free count rises,
/// total slots stay.
#[test]
fn release_shows_as_shrinkage() {
    let mut reg = Registry::new();
    let v = reg.new_value(Value::int(1));
    let before = reg.stats();

    reg.release_value(v);
    let after = reg.stats();
    assert_eq!(after.live_values, before.live_values - 1);
    assert_eq!(after.free_slots, before.free_slots + 1);
    assert_eq!(after.total_slots, before.total_slots);

    let diff = before.diff(&after);
    assert_eq!(diff.live_values_delta, -1);
    assert_eq!(diff.total_slots_delta, 0);
    assert!(diff.removed_variants.contains(&"Number"));
}
