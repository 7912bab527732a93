// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

// --- iter_session_id / iter_suffix ---

#[yare::parameterized(
    check_iter_zero = { "2.1", 0, Role::Check, "2.1-0-check" },
    do_iter_one     = { "2.1", 1, Role::Do,    "2.1-1-do" },
    root_loop       = { "0",   2, Role::Check, "0-2-check" },
)]
fn iter_session_id_formats(loop_id: &str, iteration: u32, role: Role, expected: &str) {
    assert_eq!(iter_session_id(loop_id, iteration, role), expected);
}

#[test]
fn iter_suffix_roundtrip() {
    let id = iter_session_id("2.1", 3, Role::Do);
    assert_eq!(iter_suffix(&id), Some(("2.1", 3, Role::Do)));
}

#[test]
fn iter_suffix_rejects_plain_ids() {
    assert_eq!(iter_suffix("2.1"), None);
    assert_eq!(iter_suffix("0"), None);
}

#[test]
fn iter_suffix_rejects_unknown_role() {
    assert_eq!(iter_suffix("2.1-0-verify"), None);
}

#[test]
fn iter_suffix_rejects_non_numeric_iteration() {
    assert_eq!(iter_suffix("2.1-x-do"), None);
}

// --- parent_of ---

#[yare::parameterized(
    iter_check  = { "2.1-0-check", "2.1" },
    iter_do     = { "2.1-1-do",    "2.1" },
    dotted      = { "2.1",         "2" },
    deep_dotted = { "0.1.2",       "0.1" },
    root        = { "0",           "" },
    root_iter   = { "0-0-check",   "0" },
)]
fn parent_of_cases(id: &str, expected: &str) {
    assert_eq!(parent_of(id), expected);
}

// --- sort_key ---

#[test]
fn sort_key_orders_plain_before_iteration_children() {
    let ids = ["2.1-1-check", "2.1-0-check", "2.1", "2.1-1-do"];
    let mut sorted = ids.to_vec();
    sorted.sort_by_key(|id| sort_key(id));
    assert_eq!(sorted, ["2.1", "2.1-0-check", "2.1-1-check", "2.1-1-do"]);
}

#[test]
fn sort_key_check_before_do_within_iteration() {
    assert!(sort_key("2.1-0-check") < sort_key("2.1-0-do"));
}

#[test]
fn sort_key_numeric_not_lexicographic() {
    assert!(sort_key("2") < sort_key("10"));
    assert!(sort_key("0.2") < sort_key("0.10"));
}

#[test]
fn sort_key_spec_chain() {
    assert!(sort_key("2.1") < sort_key("2.1-0-check"));
    assert!(sort_key("2.1-0-check") < sort_key("2.1-0-do"));
    assert!(sort_key("2.1-0-do") < sort_key("2.1-1-check"));
}

// --- depth / is_descendant_of ---

#[yare::parameterized(
    root       = { "0",          0 },
    child      = { "0.1",        1 },
    grandchild = { "0.1.2",      2 },
    iter_child = { "0.1-0-do",   2 },
)]
fn depth_cases(id: &str, expected: usize) {
    assert_eq!(depth(id), expected);
}

#[test]
fn descendants_cross_both_layers() {
    assert!(is_descendant_of("0.1-0-do", "0"));
    assert!(is_descendant_of("0.1.2", "0.1"));
    assert!(!is_descendant_of("1.0", "0"));
    assert!(!is_descendant_of("0", "0"));
}

// --- properties ---

proptest::proptest! {
    #[test]
    fn parent_is_prefix_or_empty(segs in proptest::collection::vec(0u64..40, 1..5)) {
        let id = segs.iter().map(u64::to_string).collect::<Vec<_>>().join(".");
        let parent = parent_of(&id);
        let parent_prefix = format!("{}.", parent);
        proptest::prop_assert!(parent.is_empty() || id.starts_with(&parent_prefix));
    }

    #[test]
    fn iteration_children_sort_after_base(iter in 0u32..50) {
        let base = "3.2";
        proptest::prop_assert!(sort_key(base) < sort_key(&iter_session_id(base, iter, Role::Check)));
    }
}
