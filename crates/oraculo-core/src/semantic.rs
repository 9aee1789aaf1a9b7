use crate::types::FaqDocument;

/// Brute-force cosine top-K over corpus embeddings. Fine for FAQ-scale
/// corpora (well under 10K entries); swap in an ANN index if that changes.
///
/// `pool` restricts the search to a subset of document indices (the
/// intent-scoped pool); `language` restricts to documents in that language.
/// Documents without an embedding are skipped on this side only.
pub fn semantic_top(
    docs: &[FaqDocument],
    pool: Option<&[usize]>,
    query: &[f32],
    language: Option<&str>,
    top_k: usize,
) -> Vec<(usize, f64)> {
    let candidates: Box<dyn Iterator<Item = usize> + '_> = match pool {
        Some(indices) => Box::new(indices.iter().copied()),
        None => Box::new(0..docs.len()),
    };

    let mut scored: Vec<(usize, f64)> = candidates
        .filter_map(|i| {
            let doc = &docs[i];
            if let Some(lang) = language {
                if doc.language != lang {
                    return None;
                }
            }
            let embedding = doc.embedding.as_ref()?;
            Some((i, f64::from(cosine_similarity(query, embedding))))
        })
        .collect();

    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| docs[a.0].id.cmp(&docs[b.0].id))
    });
    scored.truncate(top_k);
    scored
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if !norm_a.is_finite() || !norm_b.is_finite() || norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let sim = dot / (norm_a * norm_b);
    if sim.is_finite() {
        sim
    } else {
        0.0
    }
}

/// Scale a vector to unit L2 norm in place. Embedding providers are expected
/// to hand the corpus unit-norm vectors so cosine reduces to a dot product
/// bounded by [-1, 1].
pub fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm.is_finite() && norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, language: &str, embedding: Option<Vec<f32>>) -> FaqDocument {
        FaqDocument {
            id: id.to_string(),
            question: format!("q-{id}"),
            answer: format!("a-{id}"),
            intent: "general".to_string(),
            tags: vec![],
            language: language.to_string(),
            source_link: None,
            is_active: true,
            embedding,
        }
    }

    #[test]
    fn test_cosine_of_identical_vectors_is_one() {
        let v = vec![0.6, 0.8];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_of_orthogonal_vectors_is_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn test_cosine_zero_or_mismatched_vectors() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_l2_normalize_produces_unit_vector() {
        let mut v = vec![3.0, 4.0];
        l2_normalize(&mut v);
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
        assert!((v[0] - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_top_k_ranks_closest_first() {
        let docs = vec![
            doc("a", "es", Some(vec![1.0, 0.0])),
            doc("b", "es", Some(vec![0.0, 1.0])),
            doc("c", "es", Some(vec![0.7, 0.7])),
        ];
        let results = semantic_top(&docs, None, &[1.0, 0.0], None, 2);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, 0);
        assert_eq!(results[1].0, 2);
    }

    #[test]
    fn test_language_filter_excludes_other_languages() {
        let docs = vec![
            doc("a", "en", Some(vec![1.0, 0.0])),
            doc("b", "es", Some(vec![0.9, 0.1])),
        ];
        let results = semantic_top(&docs, None, &[1.0, 0.0], Some("es"), 5);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, 1);
    }

    #[test]
    fn test_missing_embeddings_are_skipped() {
        let docs = vec![
            doc("a", "es", None),
            doc("b", "es", Some(vec![1.0, 0.0])),
        ];
        let results = semantic_top(&docs, None, &[1.0, 0.0], None, 5);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, 1);
    }

    #[test]
    fn test_pool_restriction() {
        let docs = vec![
            doc("a", "es", Some(vec![1.0, 0.0])),
            doc("b", "es", Some(vec![1.0, 0.0])),
            doc("c", "es", Some(vec![1.0, 0.0])),
        ];
        let pool = vec![1, 2];
        let results = semantic_top(&docs, Some(&pool), &[1.0, 0.0], None, 5);
        let indices: Vec<usize> = results.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, vec![1, 2]);
    }
}
