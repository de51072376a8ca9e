use std::collections::HashMap;

use crate::models::CatalogEntry;

use super::sparse::{cosine_similarity_with_magnitude, SparseVector};

/// Maximal marginal relevance re-ranking.
///
/// Greedily picks the candidate maximizing
/// `lambda * sim(candidate, query) - (1 - lambda) * max sim(candidate, selected)`
/// until `top_n` are chosen or candidates run out. Returns positions into
/// `candidates`; equal scores keep the earlier candidate.
pub fn mmr_rerank(
    candidates: &[&SparseVector],
    query: &SparseVector,
    lambda_mult: f64,
    top_n: usize,
) -> Vec<usize> {
    let query_magnitude = query.magnitude();
    let magnitudes: Vec<f64> = candidates.iter().map(|v| v.magnitude()).collect();
    let relevance: Vec<f64> = candidates
        .iter()
        .zip(&magnitudes)
        .map(|(v, &m)| cosine_similarity_with_magnitude(v, query, m, query_magnitude))
        .collect();

    let target = top_n.min(candidates.len());
    let mut selected: Vec<usize> = Vec::with_capacity(target);
    let mut remaining: Vec<usize> = (0..candidates.len()).collect();
    // highest similarity of each candidate to anything selected so far
    let mut redundancy = vec![0.0f64; candidates.len()];

    while selected.len() < target {
        let mut best: Option<(usize, f64)> = None;
        for (slot, &cand) in remaining.iter().enumerate() {
            let penalty = if selected.is_empty() { 0.0 } else { redundancy[cand] };
            let score = lambda_mult * relevance[cand] - (1.0 - lambda_mult) * penalty;
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((slot, score));
            }
        }

        let Some((slot, _)) = best else {
            break;
        };
        let chosen = remaining.remove(slot);
        selected.push(chosen);

        for &cand in &remaining {
            let sim = cosine_similarity_with_magnitude(
                candidates[cand],
                candidates[chosen],
                magnitudes[cand],
                magnitudes[chosen],
            );
            if selected.len() == 1 || sim > redundancy[cand] {
                redundancy[cand] = sim;
            }
        }
    }

    selected
}

/// Keeps rows in order while no genre exceeds `max_per_genre` kept entries.
/// A row is admitted only if every one of its genres is still below the cap;
/// rows without genres are always admitted.
pub fn diversify_by_genre(rows: &[usize], entries: &[CatalogEntry], max_per_genre: usize) -> Vec<usize> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut kept = Vec::with_capacity(rows.len());

    for &row in rows {
        let Some(entry) = entries.get(row) else {
            continue;
        };
        let genres: Vec<&str> = entry.genre_tags().collect();
        if genres
            .iter()
            .any(|g| counts.get(g).copied().unwrap_or(0) >= max_per_genre)
        {
            continue;
        }
        for genre in genres {
            *counts.entry(genre).or_insert(0) += 1;
        }
        kept.push(row);
    }

    kept
}
