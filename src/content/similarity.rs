use std::collections::BTreeSet;

use super::vocab::{NON_WORK_CONCEPTS, WORK_CONCEPTS};

const EXACT_MATCH: f64 = 1.0;
const SUBSTRING_MATCH: f64 = 0.7;
/// Words this short carry too little character information to compare.
const SHORT_WORD_LEN: usize = 4;
const SHORT_WORD_SIMILARITY: f64 = 0.2;

/// Lexical similarity between a label and a concept in `[0, 1]`.
///
/// Exact match scores 1.0 and substring containment (either way) 0.7.
/// Otherwise the Jaccard index of the two character sets, scaled by the
/// shorter/longer length ratio.
pub fn similarity(word: &str, concept: &str) -> f64 {
    let word = word.to_lowercase();
    let concept = concept.to_lowercase();

    if word == concept {
        return EXACT_MATCH;
    }
    if word.contains(&concept) || concept.contains(&word) {
        return SUBSTRING_MATCH;
    }

    let word_len = word.chars().count();
    let concept_len = concept.chars().count();
    if word_len < SHORT_WORD_LEN || concept_len < SHORT_WORD_LEN {
        return SHORT_WORD_SIMILARITY;
    }

    let word_chars: BTreeSet<char> = word.chars().collect();
    let concept_chars: BTreeSet<char> = concept.chars().collect();
    let intersection = word_chars.intersection(&concept_chars).count() as f64;
    let union = word_chars.union(&concept_chars).count() as f64;

    let length_ratio = word_len.min(concept_len) as f64 / word_len.max(concept_len) as f64;
    (intersection / union) * length_ratio
}

/// Best similarity of `word` against a vocabulary.
pub fn best_similarity(word: &str, vocabulary: &[&str]) -> f64 {
    vocabulary
        .iter()
        .map(|concept| similarity(word, concept))
        .fold(0.0, f64::max)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConceptSimilarity {
    pub work: f64,
    pub non_work: f64,
}

pub fn concept_similarity(word: &str) -> ConceptSimilarity {
    ConceptSimilarity {
        work: best_similarity(word, WORK_CONCEPTS),
        non_work: best_similarity(word, NON_WORK_CONCEPTS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_and_substring_matches() {
        assert_eq!(similarity("Terminal", "terminal"), 1.0);
        assert_eq!(similarity("code editor", "editor"), 0.7);
        assert_eq!(similarity("tv", "apple tv"), 0.7);
    }

    #[test]
    fn short_words_get_a_low_baseline() {
        assert_eq!(similarity("cat", "code"), 0.2);
    }

    #[test]
    fn jaccard_is_penalised_by_length_mismatch() {
        // {c,o,d,e,' ',i,t,r} vs {t,e,x,' ',d,i,o,r}: 7 shared of 9, equal length.
        let sim = similarity("code editor", "text editor");
        assert!((sim - 7.0 / 9.0).abs() < 1e-9);

        // Same characters, different lengths.
        let sim = similarity("abcd", "abcdabcd");
        assert_eq!(sim, 0.7); // substring wins
        let sim = similarity("dcba", "abcdabcdx");
        assert!((sim - (4.0 / 5.0) * (4.0 / 9.0)).abs() < 1e-9);
    }

    #[test]
    fn concept_similarity_prefers_the_right_side() {
        let keyboard = concept_similarity("keyboard");
        assert_eq!(keyboard.work, 1.0);
        assert!(keyboard.non_work < 0.5);

        let netflix = concept_similarity("netflix");
        assert_eq!(netflix.non_work, 1.0);
        assert!(netflix.work < netflix.non_work);
    }
}
