use std::collections::HashMap;

use crate::types::{FaqDocument, ScoredCandidate};

/// Merge the lexical and semantic top-K sides into one ranked list.
///
/// Full outer join on document: a document missing from one side contributes
/// score 0 for that side. Fused score is the convex combination
/// `alpha*semantic + (1-alpha)*lexical`. Ties on the fused score are broken
/// by ascending document id so rankings are stable across runs.
pub fn fuse(
    docs: &[FaqDocument],
    lexical: &[(usize, f64)],
    semantic: &[(usize, f64)],
    alpha: f64,
    topk: usize,
) -> Vec<ScoredCandidate> {
    let mut sides: HashMap<usize, (f64, f64)> = HashMap::new();
    for (i, score) in lexical {
        sides.entry(*i).or_insert((0.0, 0.0)).0 = *score;
    }
    for (i, score) in semantic {
        sides.entry(*i).or_insert((0.0, 0.0)).1 = *score;
    }

    let mut fused: Vec<ScoredCandidate> = sides
        .into_iter()
        .map(|(doc_index, (lexical_score, semantic_score))| ScoredCandidate {
            doc_index,
            lexical_score,
            semantic_score,
            fused_score: alpha * semantic_score + (1.0 - alpha) * lexical_score,
        })
        .collect();

    fused.sort_by(|a, b| {
        b.fused_score
            .partial_cmp(&a.fused_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| docs[a.doc_index].id.cmp(&docs[b.doc_index].id))
    });
    fused.truncate(topk);
    fused
}
