use std::collections::HashMap;

use itertools::Itertools;

/// Contiguous `n`-token windows of one document, joined by a space.
pub fn ngrams(tokens: &[String], n: usize) -> impl Iterator<Item = String> + '_ {
    // windows(0) panics
    let tokens: &[String] = if n == 0 { &[] } else { tokens };
    tokens.windows(n.max(1)).map(|w| w.join(" "))
}

pub fn count_into(counts: &mut HashMap<String, usize>, items: impl Iterator<Item = String>) {
    for item in items {
        *counts.entry(item).or_insert(0) += 1;
    }
}

/// The `k` largest counts, count descending then key ascending.
pub fn top_k(counts: &HashMap<String, usize>, k: usize) -> Vec<(&str, usize)> {
    counts
        .iter()
        .map(|(key, &count)| (key.as_str(), count))
        .sorted_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)))
        .take(k)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(s: &str) -> Vec<String> {
        s.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn sliding_windows() {
        let t = toks("a b c d");
        assert_eq!(ngrams(&t, 2).collect::<Vec<_>>(), vec!["a b", "b c", "c d"]);
        assert_eq!(ngrams(&t, 3).collect::<Vec<_>>(), vec!["a b c", "b c d"]);
    }

    #[test]
    fn short_documents_yield_nothing() {
        assert_eq!(ngrams(&toks("solo"), 2).count(), 0);
        assert_eq!(ngrams(&toks("two words"), 3).count(), 0);
        assert_eq!(ngrams(&toks("a b"), 0).count(), 0);
    }

    #[test]
    fn ties_break_lexicographically() {
        let mut counts = HashMap::new();
        count_into(&mut counts, toks("pear apple zebra apple pear mango").into_iter());
        let top = top_k(&counts, 3);
        assert_eq!(top, vec![("apple", 2), ("pear", 2), ("mango", 1)]);
    }

    #[test]
    fn top_k_larger_than_table() {
        let mut counts = HashMap::new();
        count_into(&mut counts, toks("x y").into_iter());
        assert_eq!(top_k(&counts, 50).len(), 2);
        assert!(top_k(&HashMap::new(), 50).is_empty());
    }
}
