//! Small string utilities shared by the DSL parser and the join guard.

use crate::error::Suggestions;

/// Maximum number of "did you mean" candidates reported.
pub const MAX_SUGGESTIONS: usize = 3;

/// Simple edit distance for fuzzy matching (Levenshtein).
///
/// Tuned for identifiers and field names, not large strings.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a_len = a.chars().count();
    let b_len = b.chars().count();

    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0; b_len + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.chars().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_len]
}

/// Distance bound scaled to the length of the misspelled name (1..=3).
pub fn max_distance_for(name: &str) -> usize {
    (name.chars().count() / 3).clamp(1, 3)
}

/// Closest candidates within the distance bound, nearest first.
///
/// Ties keep candidate order, so results are deterministic.
pub fn suggest<'a, I>(name: &str, candidates: I) -> Suggestions
where
    I: IntoIterator<Item = &'a str>,
{
    let bound = max_distance_for(name);
    let lowered = name.to_ascii_lowercase();
    let mut scored: Vec<(usize, usize, &str)> = candidates
        .into_iter()
        .enumerate()
        .map(|(i, c)| (edit_distance(&lowered, &c.to_ascii_lowercase()), i, c))
        .filter(|(d, _, _)| *d <= bound)
        .collect();
    scored.sort_by_key(|(d, i, _)| (*d, *i));
    Suggestions(
        scored
            .into_iter()
            .take(MAX_SUGGESTIONS)
            .map(|(_, _, c)| c.to_owned())
            .collect(),
    )
}
