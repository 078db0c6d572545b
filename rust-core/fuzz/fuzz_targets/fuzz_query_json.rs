// SPDX-License-Identifier: PMPL-1.0-or-later
//
// Fuzz target for the query wire decoder.
// Run with: cargo +nightly fuzz run fuzz_query_json
//
// Arbitrary input must either decode into a query or be rejected with an
// error. A decoded query must re-encode to a document that decodes back to
// the same encoding (NaN values rule out comparing queries directly), and
// validation must never panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sieve_core::{validate_query, Query};

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    if input.len() > 8192 {
        return;
    }
    if let Ok(query) = Query::from_json_str(input) {
        let _ = validate_query(Some(&query));
        let encoded = query.to_json();
        let reencoded = Query::from_json(&encoded).map(|again| again.to_json());
        assert_eq!(reencoded.ok(), Some(encoded));
    }
});
