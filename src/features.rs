//! Bag-of-n-grams featurization of subject lines.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use ndarray::Array2;

/// Extracts word unigrams, word bigrams and per-word character trigrams.
///
/// Text is lowercased and split on anything that is not alphanumeric. Words
/// are padded with `<` and `>` before taking trigrams so that prefixes and
/// suffixes (e.g. `c=<in`, `c=ce>`) become features of their own.
pub fn extract_features(subject: &str) -> HashSet<String> {
    let subject = subject.to_lowercase();
    let words: Vec<&str> = subject
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    let mut features = HashSet::new();
    for word in &words {
        features.insert(format!("w={}", word));

        let padded: Vec<char> = std::iter::once('<')
            .chain(word.chars())
            .chain(std::iter::once('>'))
            .collect();
        for tri in padded.windows(3) {
            features.insert(format!("c={}", tri.iter().collect::<String>()));
        }
    }
    for pair in words.windows(2) {
        features.insert(format!("b={} {}", pair[0], pair[1]));
    }

    features
}

/// Maps feature strings to column indices.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    index: BTreeMap<String, usize>,
}

impl Vocabulary {
    /// Builds a vocabulary covering every feature of the given subjects.
    pub fn fit<'a>(subjects: impl IntoIterator<Item = &'a str>) -> Self {
        let features: BTreeSet<String> = subjects.into_iter().flat_map(extract_features).collect();
        let index = features
            .into_iter()
            .enumerate()
            .map(|(i, f)| (f, i))
            .collect();
        Vocabulary { index }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// One binary row per subject. Features outside the vocabulary are dropped.
    pub fn vectorize<'a>(&self, subjects: impl ExactSizeIterator<Item = &'a str>) -> Array2<f64> {
        let mut x = Array2::zeros((subjects.len(), self.len()));
        for (row, subject) in subjects.enumerate() {
            for feat in extract_features(subject) {
                if let Some(&col) = self.index.get(&feat) {
                    x[[row, col]] = 1.0;
                }
            }
        }
        x
    }

    pub fn vectorize_one(&self, subject: &str) -> Array2<f64> {
        self.vectorize(std::iter::once(subject))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_words_bigrams_and_trigrams() {
        let feats = extract_features("Invoice for March");

        for expected in ["w=invoice", "w=for", "w=march", "b=invoice for", "b=for march", "c=<in", "c=ice", "c=ce>", "c=<fo"] {
            assert!(feats.contains(expected), "missing {expected}");
        }
        assert!(!feats.contains("b=invoice march"));
    }

    #[test]
    fn ignores_case_and_punctuation() {
        assert_eq!(extract_features("INVOICE #123!"), extract_features("invoice 123"));
    }

    #[test]
    fn blank_subject_has_no_features() {
        assert!(extract_features("  -- ").is_empty());
    }

    #[test]
    fn vectorize_marks_known_features_only() {
        let vocab = Vocabulary::fit(["invoice", "lunch"]);
        let x = vocab.vectorize(["invoice", "dinner"].into_iter());

        assert_eq!(x.shape(), &[2, vocab.len()]);
        assert_eq!(x.row(0).sum(), extract_features("invoice").len() as f64);
        assert_eq!(x.row(1).sum(), 0.0);
    }
}
