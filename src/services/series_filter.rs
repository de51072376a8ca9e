use std::collections::HashSet;

use crate::models::CatalogEntry;

use super::fuzzy::partial_ratio;

/// Partial-ratio score above which two core names count as one series
pub const SERIES_MATCH_THRESHOLD: f64 = 75.0;

/// Whether two core names belong to the same series.
///
/// Empty core names never match; otherwise equality, containment either
/// way, or a partial ratio above the threshold all count.
pub fn is_same_series(a: &str, b: &str) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a == b || a.contains(b) || b.contains(a) || partial_ratio(a, b) > SERIES_MATCH_THRESHOLD
}

/// Drops candidates of the query's own series, preserving order.
pub fn filter_same_series(candidates: &[usize], query_row: usize, entries: &[CatalogEntry]) -> Vec<usize> {
    let Some(query) = entries.get(query_row) else {
        return candidates.to_vec();
    };

    candidates
        .iter()
        .copied()
        .filter(|&row| {
            entries
                .get(row)
                .is_some_and(|entry| !is_same_series(&query.core_name, &entry.core_name))
        })
        .collect()
}

/// Keeps only the first candidate of each core name, so sibling seasons of
/// another show do not crowd the list.
pub fn collapse_duplicate_cores(candidates: &[usize], entries: &[CatalogEntry]) -> Vec<usize> {
    let mut seen: HashSet<&str> = HashSet::new();
    candidates
        .iter()
        .copied()
        .filter(|&row| match entries.get(row) {
            Some(entry) if entry.core_name.is_empty() => true,
            Some(entry) => seen.insert(entry.core_name.as_str()),
            None => false,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(names: &[&str]) -> Vec<CatalogEntry> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| CatalogEntry::new(i as i64 + 1, *name))
            .collect()
    }

    #[test]
    fn test_same_series_rules() {
        assert!(is_same_series("naruto", "naruto"));
        assert!(is_same_series("naruto", "naruto shippuden"));
        assert!(is_same_series("gintama", "gintamax"));
        assert!(!is_same_series("naruto", "bleach"));
        assert!(!is_same_series("", "bleach"));
        assert!(!is_same_series("", ""));
    }

    #[test]
    fn test_filter_removes_sequels_and_keeps_order() {
        let entries = catalog(&[
            "Naruto",
            "Bleach",
            "Naruto: Shippuuden",
            "Naruto Shippuden Movie 2",
            "One Piece",
        ]);
        let filtered = filter_same_series(&[1, 2, 3, 4], 0, &entries);
        assert_eq!(filtered, vec![1, 4]);
    }

    #[test]
    fn test_filter_can_empty_the_pool() {
        let entries = catalog(&["Gintama", "Gintama'", "Gintama Season 2"]);
        assert!(filter_same_series(&[1, 2], 0, &entries).is_empty());
    }

    #[test]
    fn test_collapse_duplicate_cores() {
        let entries = catalog(&["Naruto", "Bleach", "Bleach: Thousand-Year Blood War", "Monster"]);
        assert_eq!(collapse_duplicate_cores(&[1, 2, 3], &entries), vec![1, 3]);
    }
}
