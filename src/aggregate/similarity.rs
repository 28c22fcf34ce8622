use std::collections::HashSet;
use std::hash::Hash;

use itertools::Itertools;

use super::DocumentProfile;
use crate::model::{round_to, SimilarityEntry};

/// |A ∩ B| / |A ∪ B|, 0.0 when both sets are empty.
pub fn jaccard<T: Eq + Hash>(a: &HashSet<T>, b: &HashSet<T>) -> f64 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let intersection = small.iter().filter(|t| large.contains(*t)).count();
    let union = a.len() + b.len() - intersection;
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

/// Every unordered pair, in profile order, rounded to 6 decimals.
pub fn pairwise(profiles: &[DocumentProfile]) -> Vec<SimilarityEntry> {
    profiles
        .iter()
        .tuple_combinations()
        .map(|(a, b)| SimilarityEntry {
            doc1: a.name.clone(),
            doc2: b.name.clone(),
            similarity: round_to(jaccard(&a.terms, &b.terms), 6),
        })
        .collect()
}
