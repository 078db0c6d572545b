// SPDX-License-Identifier: PMPL-1.0-or-later
//! Property-based tests for in-memory evaluation

use proptest::prelude::*;
use serde_json::json;

use sieve_core::{Query, QueryBuilder, Value};
use sieve_memory::MemoryBackend;

/// Records with an optional integer score and a short name
fn arb_records() -> impl Strategy<Value = Vec<Value>> {
    prop::collection::vec(
        (prop::option::of(-50i64..50), "[a-c]{0,3}"),
        0..20,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .map(|(score, name)| Value::from(json!({"score": score, "name": name})))
            .collect()
    })
}

fn count(backend: &MemoryBackend, query: &Query, records: &[Value]) -> usize {
    backend
        .search_values(Some(query), records)
        .map(|found| found.len())
        .unwrap_or(usize::MAX)
}

proptest! {
    /// A query without groups returns every record in input order
    #[test]
    fn test_empty_query_is_identity(records in arb_records()) {
        let backend = MemoryBackend::new();
        let found = backend.search_values(Some(&Query::new()), &records).unwrap();
        prop_assert_eq!(found.len(), records.len());
        for (a, b) in found.iter().zip(records.iter()) {
            prop_assert!(std::ptr::eq(*a, b));
        }
    }

    /// `=` and `!=` partition the records
    #[test]
    fn test_equal_and_not_equal_partition(records in arb_records(), target in -50i64..50) {
        let backend = MemoryBackend::new();
        let eq = QueryBuilder::new().add_condition("score", "=", target).build();
        let ne = QueryBuilder::new().add_condition("score", "!=", target).build();
        prop_assert_eq!(count(&backend, &eq, &records) + count(&backend, &ne, &records), records.len());
    }

    /// `between` and `not_between` partition the non-null records
    #[test]
    fn test_between_complement(records in arb_records(), low in -50i64..0, high in 0i64..50) {
        let backend = MemoryBackend::new();
        let inside = QueryBuilder::new().add_condition("score", "between", vec![low, high]).build();
        let outside = QueryBuilder::new().add_condition("score", "not_between", vec![low, high]).build();
        let non_null = records
            .iter()
            .filter(|r| r.as_map().and_then(|m| m.get("score")).is_some_and(|s| !s.is_null()))
            .count();
        prop_assert_eq!(count(&backend, &inside, &records) + count(&backend, &outside, &records), non_null);
    }

    /// NOT over a single condition is its complement
    #[test]
    fn test_not_group_complement(records in arb_records(), target in -50i64..50) {
        let backend = MemoryBackend::new();
        let plain = QueryBuilder::new().add_condition("score", ">", target).build();
        let negated = QueryBuilder::new()
            .add_group(sieve_core::GroupOperator::Not)
            .add_condition("score", ">", target)
            .build();
        prop_assert_eq!(count(&backend, &plain, &records) + count(&backend, &negated, &records), records.len());
    }

    /// Sorting places every null after every non-null, both directions
    #[test]
    fn test_sort_nulls_last(records in arb_records(), descending in any::<bool>()) {
        let backend = MemoryBackend::new();
        let key = if descending { "-score" } else { "score" };
        let query = QueryBuilder::new().order_by([key]).build();
        let found = backend.search_values(Some(&query), &records).unwrap();

        let scores: Vec<Option<i64>> = found
            .iter()
            .map(|r| match r.as_map().and_then(|m| m.get("score")) {
                Some(Value::Int(i)) => Some(*i),
                _ => None,
            })
            .collect();
        let first_null = scores.iter().position(Option::is_none).unwrap_or(scores.len());
        prop_assert!(scores[first_null..].iter().all(Option::is_none));

        let present = &scores[..first_null];
        for pair in present.windows(2) {
            if descending {
                prop_assert!(pair[0] >= pair[1]);
            } else {
                prop_assert!(pair[0] <= pair[1]);
            }
        }
    }

    /// Pagination returns a window of the unpaginated result
    #[test]
    fn test_pagination_window(records in arb_records(), offset in 0i64..10, limit in 1i64..10) {
        let backend = MemoryBackend::new();
        let all = backend.search_values(Some(&Query::new()), &records).unwrap();
        let page_query = QueryBuilder::new().offset(offset).limit(limit).build();
        let page = backend.search_values(Some(&page_query), &records).unwrap();

        let expected: Vec<_> = all.into_iter().skip(offset as usize).take(limit as usize).collect();
        prop_assert_eq!(page, expected);
    }
}
