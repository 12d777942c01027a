//! Maximal marginal relevance re-ranking.

use crate::types::cosine_similarity;

/// Balance between relevance (1.0) and diversity (0.0).
pub const MMR_LAMBDA: f32 = 0.5;

/// Select up to `k` candidate indices by maximal marginal relevance.
///
/// The first pick is the candidate most similar to the query. Each later pick
/// maximizes `lambda * sim(query, c) - (1 - lambda) * max sim(c, picked)`.
/// Similarities are cosine regardless of the store metric. Ties go to the
/// earlier candidate, so a pool already sorted by relevance stays stable.
pub fn maximal_marginal_relevance(
    query: &[f32],
    candidates: &[&[f32]],
    k: usize,
    lambda: f32,
) -> Vec<usize> {
    let limit = k.min(candidates.len());
    if limit == 0 {
        return Vec::new();
    }

    let relevance: Vec<f32> = candidates
        .iter()
        .map(|c| cosine_similarity(query, c))
        .collect();

    // Highest similarity to anything selected so far
    let mut redundancy = vec![f32::NEG_INFINITY; candidates.len()];
    let mut picked = vec![false; candidates.len()];
    let mut selected = Vec::with_capacity(limit);

    while selected.len() < limit {
        let mut best: Option<(usize, f32)> = None;
        for idx in 0..candidates.len() {
            if picked[idx] {
                continue;
            }
            let score = if selected.is_empty() {
                relevance[idx]
            } else {
                lambda * relevance[idx] - (1.0 - lambda) * redundancy[idx]
            };
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((idx, score));
            }
        }

        let Some((chosen, _)) = best else { break };
        picked[chosen] = true;
        selected.push(chosen);

        for idx in 0..candidates.len() {
            if !picked[idx] {
                let sim = cosine_similarity(candidates[idx], candidates[chosen]);
                if sim > redundancy[idx] {
                    redundancy[idx] = sim;
                }
            }
        }
    }

    selected
}
