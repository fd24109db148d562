//! Entry matching for `find` and `item` lookups.

use super::Entry;

/// Similarity of two names on a 0-100 scale, case-insensitive.
pub fn similarity(query: &str, name: &str) -> u8 {
    let query = query.trim().to_lowercase();
    let name = name.trim().to_lowercase();
    let ratio = strsim::normalized_levenshtein(&query, &name);
    (ratio * 100.0).round() as u8
}

/// Index of the highest-scoring entry at or above `threshold`.
/// Ties go to the entry that comes first.
pub fn best_match(query: &str, entries: &[Entry], threshold: u8) -> Option<usize> {
    let mut best: Option<(usize, u8)> = None;
    for (idx, entry) in entries.iter().enumerate() {
        let score = similarity(query, &entry.name);
        if score < threshold {
            continue;
        }
        match best {
            Some((_, top)) if top >= score => {}
            _ => best = Some((idx, score)),
        }
    }
    best.map(|(idx, _)| idx)
}

/// True when `query` appears in the entry's name or any detail value.
pub fn matches(query: &str, entry: &Entry) -> bool {
    let needle = query.to_lowercase();
    entry.name.to_lowercase().contains(&needle)
        || entry
            .details
            .values()
            .any(|value| value.to_lowercase().contains(&needle))
}
