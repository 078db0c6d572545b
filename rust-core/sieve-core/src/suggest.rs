// SPDX-License-Identifier: PMPL-1.0-or-later
//! Near-match suggestions for unknown operator and field names.

/// Edit distance between two strings, counted in chars.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Similarity in `[0, 1]`, where 1 means identical.
pub fn similarity(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein_distance(a, b) as f64 / longest as f64
}

/// Up to `n` candidates whose similarity to `word` is at least `cutoff`,
/// best first. Ties keep candidate order.
pub fn close_matches<'a, I>(word: &str, candidates: I, n: usize, cutoff: f64) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut scored: Vec<(f64, &str)> = candidates
        .into_iter()
        .map(|c| (similarity(word, c), c))
        .filter(|(score, _)| *score >= cutoff)
        .collect();

    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored.into_iter().take(n).map(|(_, c)| c.to_string()).collect()
}

/// Suggestions for an unknown operator name.
pub fn suggest_operators<'a, I>(operator: &str, valid: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    close_matches(operator, valid, 3, 0.6)
}

/// Suggestions for an unknown field name, compared case-insensitively.
pub fn suggest_fields<'a, I>(field: &str, available: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let lowered = field.to_lowercase();
    let originals: Vec<&str> = available.into_iter().collect();
    let lowered_candidates: Vec<String> = originals.iter().map(|c| c.to_lowercase()).collect();

    let matches = close_matches(&lowered, lowered_candidates.iter().map(String::as_str), 3, 0.6);
    matches
        .into_iter()
        .filter_map(|m| {
            lowered_candidates
                .iter()
                .position(|c| *c == m)
                .map(|i| originals[i].to_string())
        })
        .collect()
}
