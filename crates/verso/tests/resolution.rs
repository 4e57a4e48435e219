//! Attribute resolution: local map, parent chain, module root, and
//! materialize-on-read.

use pretty_assertions::assert_eq;
use verso::{Num, Registry, Value};

// =============================================================================
// 1. Materialize-on-Read
// =============================================================================

/// Looking up a nonexistent attribute creates exactly one empty attribute,
/// and repeated lookups return the same one.
#[test]
fn missing_attribute_is_materialized_once() {
    let mut reg = Registry::new();
    let scope = reg.new_field(None, None);

    assert!(!reg.has_attribute(scope, "x"));
    let first = reg.get_attribute(scope, "x");
    let second = reg.get_attribute(scope, "x");

    assert_eq!(first, second);
    assert!(!reg.has_value(first), "materialized attribute starts with empty history");
    assert_eq!(reg.field(scope).locals().count(), 1);
    assert!(reg.has_attribute(scope, "x"));
    assert_eq!(reg.attribute_name(first), "x");
}

/// `has_attribute` asks about the local map only; resolvability through the
/// parent chain is a different question.
#[test]
fn has_attribute_does_not_walk_parents() {
    let mut reg = Registry::new();
    let root = reg.new_field(None, None);
    let child = reg.new_field(Some(root), None);
    reg.get_attribute(root, "w");

    assert!(reg.has_attribute(root, "w"));
    assert!(!reg.has_attribute(child, "w"));

    // Resolving through the parent caches the binding but still does not
    // make it a local definition.
    let resolved = reg.get_attribute(child, "w");
    assert!(!reg.has_attribute(child, "w"));
    assert_eq!(reg.field(child).parent_resolved(), &[resolved]);
}

// =============================================================================
// 2. Parent Chain and Module Fallback
// =============================================================================

/// Resolution walks the whole parent chain, not just the immediate parent.
#[test]
fn resolution_walks_the_parent_chain() {
    let mut reg = Registry::new();
    let grandparent = reg.new_field(None, None);
    let parent = reg.new_field(Some(grandparent), None);
    let child = reg.new_field(Some(parent), None);
    let w = reg.get_attribute(grandparent, "w");

    assert_eq!(reg.get_attribute(child, "w"), w);
    assert_eq!(reg.field(child).parent_resolved(), &[w]);
}

/// With no parent hit, resolution falls back to the module root; module hits
/// are not cached in the parent-resolved cache.
#[test]
fn module_root_is_the_last_fallback() {
    let mut reg = Registry::new();
    let module = reg.new_field(None, None);
    let scope = reg.new_field(None, Some(module));
    let g = reg.get_attribute(module, "g");

    assert_eq!(reg.get_attribute(scope, "g"), g);
    assert_eq!(reg.field(scope).parent_resolved(), &[]);
    assert!(!reg.has_attribute(scope, "g"));
}

/// A local binding shadows both the parent chain and the module root.
#[test]
fn local_binding_shadows_outer_scopes() {
    let mut reg = Registry::new();
    let module = reg.new_field(None, None);
    let parent = reg.new_field(None, Some(module));
    let child = reg.new_field(Some(parent), Some(module));
    let outer = reg.get_attribute(parent, "x");
    let module_x = reg.get_attribute(module, "x");
    assert_ne!(outer, module_x);

    // Miss everywhere except the parent: parent wins over module.
    assert_eq!(reg.get_attribute(child, "x"), outer);
}

// =============================================================================
// 3. Parent Resolution Across Commits
// =============================================================================

/// A child's cached parent binding survives its own checkout even when the
/// parent scope was reset under a different branch id in between.
#[test]
fn parent_binding_survives_child_checkout() {
    let mut reg = Registry::new();
    let root = reg.new_field(None, None);
    let child = reg.new_field(Some(root), None);

    let w = reg.get_attribute(root, "w");
    let one = reg.new_value(Value::int(1));
    reg.revise(w, one);

    let resolved = reg.get_attribute(child, "w");
    assert_eq!(resolved, w, "child resolves the root's attribute, not its own");

    reg.commit_field(child, "b1");
    reg.checkout_field(root, "other-branch");
    assert_eq!(reg.field(root).locals().count(), 0, "root was reset");

    reg.checkout_field(child, "b1");
    assert_eq!(reg.field(child).parent_resolved(), &[w]);
    assert_eq!(reg.attribute_name(w), "w");
    let current = reg.peek_value(w).unwrap();
    assert!(matches!(reg.value(current).data(), Value::Number(Num::Int(1))));
}
