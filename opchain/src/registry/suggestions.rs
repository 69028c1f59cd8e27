//! Fuzzy "did you mean" matching for unknown operation names.
//!
//! Similarity is the Ratcliff/Obershelp ratio: twice the number of characters
//! in matching blocks over the combined length, where matching blocks are
//! found by taking the longest common run and recursing on either side.

/// Maximum number of suggestions returned.
pub const MAX_SUGGESTIONS: usize = 3;

/// Minimum similarity ratio for a name to be suggested.
pub const SIMILARITY_CUTOFF: f64 = 0.5;

fn longest_common_block(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    let mut prev = vec![0usize; b.len() + 1];
    for i in 0..a.len() {
        let mut row = vec![0usize; b.len() + 1];
        for j in 0..b.len() {
            if a[i] == b[j] {
                row[j + 1] = prev[j] + 1;
                if row[j + 1] > best.2 {
                    best = (i + 1 - row[j + 1], j + 1 - row[j + 1], row[j + 1]);
                }
            }
        }
        prev = row;
    }
    best
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    let (i, j, len) = longest_common_block(a, b);
    if len == 0 {
        return 0;
    }
    len + matching_chars(&a[..i], &b[..j]) + matching_chars(&a[i + len..], &b[j + len..])
}

/// Returns the similarity of `a` and `b` in `[0.0, 1.0]`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    (2 * matching_chars(&a, &b)) as f64 / total as f64
}

/// Returns up to [`MAX_SUGGESTIONS`] names close to `name`, best first.
///
/// Comparison is case-insensitive; ties keep the candidates' input order.
#[must_use]
pub fn close_matches<'a>(name: &str, candidates: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let needle = name.to_lowercase();
    let mut scored: Vec<(f64, &str)> = candidates
        .into_iter()
        .map(|candidate| (similarity(&needle, &candidate.to_lowercase()), candidate))
        .filter(|(score, _)| *score >= SIMILARITY_CUTOFF)
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|(_, candidate)| candidate.to_string())
        .collect()
}
