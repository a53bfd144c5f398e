//! Pathway and disease component normalisation.

/// `min(1, count / cap)`; a zero cap yields 0.
pub fn capped_ratio(count: usize, cap: usize) -> f64 {
    if cap == 0 {
        return 0.0;
    }
    (count as f64 / cap as f64).min(1.0)
}

/// Pathway involvement: number of resolved pathways containing the protein.
pub fn pathway_score(pathway_count: usize, cap: usize) -> f64 {
    capped_ratio(pathway_count, cap)
}

/// Associations mentioning any of the lower-cased relevance `terms`.
pub fn count_disease_matches(associations: &[String], terms: &[String]) -> usize {
    associations
        .iter()
        .filter(|a| {
            let a = a.to_lowercase();
            terms.iter().any(|t| a.contains(t.as_str()))
        })
        .count()
}

pub fn disease_score(matching: usize, cap: usize) -> f64 {
    capped_ratio(matching, cap)
}
