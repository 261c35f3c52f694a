//! Property-based tests using proptest
//!
//! These tests generate random sequences of operations and verify
//! that the forest invariants are always maintained.

use proptest::prelude::*;
use priority_forest::{DecreaseKeyHeap, ForestHeap, Heap};

use std::collections::HashMap;

/// Push and pop maintain the minimum against a flat model
fn check_push_pop_invariant(ops: Vec<(bool, i32)>) -> Result<(), TestCaseError> {
    let mut heap = ForestHeap::new();
    let mut inserted = Vec::new();

    for (should_pop, value) in ops {
        if should_pop && !heap.is_empty() {
            if let Some((priority, _item)) = heap.pop() {
                if let Some(pos) = inserted.iter().position(|&p| p == priority) {
                    inserted.remove(pos);
                }
            }
        } else {
            heap.push(value, value);
            inserted.push(value);
        }

        if let Some((min_priority, _)) = heap.peek() {
            let model_min = inserted.iter().min().copied();
            prop_assert_eq!(Some(*min_priority), model_min);
        } else {
            prop_assert!(inserted.is_empty());
        }
    }

    Ok(())
}

/// decrease_key maintains the minimum against a flat model
fn check_decrease_key_invariant(
    initial: Vec<i32>,
    decreases: Vec<(usize, i32)>,
) -> Result<(), TestCaseError> {
    let mut heap = ForestHeap::new();
    let mut handles = Vec::new();
    let mut priorities: HashMap<usize, i32> = HashMap::new();

    for (i, priority) in initial.iter().enumerate() {
        handles.push(heap.push_with_handle(*priority, *priority));
        priorities.insert(i, *priority);
    }

    for (handle_idx, new_priority) in decreases {
        if handle_idx < handles.len() {
            let old_priority = priorities[&handle_idx];
            if new_priority < old_priority {
                prop_assert!(heap
                    .decrease_key(&handles[handle_idx], new_priority)
                    .is_ok());
                priorities.insert(handle_idx, new_priority);
            }
        }

        let model_min = priorities.values().min().copied();
        prop_assert_eq!(heap.peek().map(|(p, _)| *p), model_min);
    }

    Ok(())
}

/// All popped elements come out in non-decreasing order
fn check_pop_order_invariant(values: Vec<i32>) -> Result<(), TestCaseError> {
    let mut heap = ForestHeap::new();

    for val in &values {
        heap.push(*val, *val);
    }

    let mut last_priority = i32::MIN;
    let mut popped = 0;
    while let Some((priority, _item)) = heap.pop() {
        prop_assert!(
            priority >= last_priority,
            "popped priority {} is less than previous {}",
            priority,
            last_priority
        );
        last_priority = priority;
        popped += 1;
    }
    prop_assert_eq!(popped, values.len());

    Ok(())
}

/// Draining a merged heap yields the sorted union of both inputs
fn check_merge_invariant(
    heap1_values: Vec<i32>,
    heap2_values: Vec<i32>,
) -> Result<(), TestCaseError> {
    let mut heap1 = ForestHeap::new();
    let mut heap2 = ForestHeap::new();

    for &val in &heap1_values {
        heap1.push(val, val);
    }
    for &val in &heap2_values {
        heap2.push(val, val);
    }

    let mut expected: Vec<i32> = heap1_values
        .iter()
        .chain(heap2_values.iter())
        .copied()
        .collect();
    expected.sort_unstable();

    heap1.merge(heap2);
    prop_assert_eq!(heap1.len(), expected.len());

    let mut drained = Vec::new();
    while let Some((priority, _)) = heap1.pop() {
        drained.push(priority);
    }
    prop_assert_eq!(drained, expected);

    Ok(())
}

/// len() always matches the number of live elements
fn check_len_invariant(ops: Vec<(bool, i32)>) -> Result<(), TestCaseError> {
    let mut heap = ForestHeap::new();
    let mut expected_len = 0;

    for (should_pop, value) in ops {
        if should_pop && !heap.is_empty() {
            heap.pop();
            expected_len -= 1;
        } else {
            heap.push(value, value);
            expected_len += 1;
        }

        prop_assert_eq!(heap.len(), expected_len);
        prop_assert_eq!(heap.is_empty(), expected_len == 0);
    }

    Ok(())
}

/// Random deletes leave exactly the undeleted elements behind
fn check_delete_invariant(
    initial: Vec<i32>,
    delete_order: Vec<usize>,
) -> Result<(), TestCaseError> {
    let mut heap = ForestHeap::new();
    let mut handles = Vec::new();
    let mut live: Vec<Option<i32>> = Vec::new();

    for &priority in &initial {
        handles.push(heap.push_with_handle(priority, priority));
        live.push(Some(priority));
    }

    for idx in delete_order {
        if idx < handles.len() && live[idx].is_some() {
            let expected = live[idx].take().unwrap();
            prop_assert_eq!(heap.delete(&handles[idx]), Ok((expected, expected)));
        }
    }

    let mut expected: Vec<i32> = live.into_iter().flatten().collect();
    expected.sort_unstable();

    let mut drained = Vec::new();
    while let Some((priority, _)) = heap.pop() {
        drained.push(priority);
    }
    prop_assert_eq!(drained, expected);

    Ok(())
}

proptest! {
    #[test]
    fn push_pop_invariant(ops in prop::collection::vec((prop::bool::ANY, -100i32..100), 0..100)) {
        check_push_pop_invariant(ops)?;
    }

    #[test]
    fn decrease_key_invariant(
        initial in prop::collection::vec(-100i32..100, 1..50),
        decreases in prop::collection::vec((0usize..50, -100i32..100), 0..20)
    ) {
        check_decrease_key_invariant(initial, decreases)?;
    }

    #[test]
    fn pop_order_invariant(values in prop::collection::vec(-100i32..100, 1..100)) {
        check_pop_order_invariant(values)?;
    }

    #[test]
    fn merge_invariant(
        heap1 in prop::collection::vec(-100i32..100, 0..50),
        heap2 in prop::collection::vec(-100i32..100, 0..50)
    ) {
        check_merge_invariant(heap1, heap2)?;
    }

    #[test]
    fn len_invariant(ops in prop::collection::vec((prop::bool::ANY, -100i32..100), 0..100)) {
        check_len_invariant(ops)?;
    }

    #[test]
    fn delete_invariant(
        initial in prop::collection::vec(-100i32..100, 1..50),
        delete_order in prop::collection::vec(0usize..50, 0..30)
    ) {
        check_delete_invariant(initial, delete_order)?;
    }
}
