//! Invoice / not-invoice classification over featurized subjects.
//!
//! The interactive loop only sees the [`Train`] and [`Classify`] traits, so a
//! backend can be swapped without touching orchestration. Two backends ship:
//! boosted decision trees (the default) and multinomial naive Bayes.

use linfa::prelude::*;
use linfa_bayes::MultinomialNb;
use linfa_trees::{DecisionTree, SplitQuality};
use ndarray::{Array1, Array2, Axis};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::error::ClassifierError;
use crate::features::Vocabulary;
use crate::store::Record;

const NOT_INVOICE: usize = 0;
const INVOICE: usize = 1;

/// Weighted error below which a learner counts as perfect.
const MIN_ERROR: f64 = 1e-10;

/// A fitted model able to label subjects.
pub trait Classify {
    /// `true` when `subject` looks like an invoice.
    fn predict(&self, subject: &str) -> bool;

    /// Fraction of `records` whose label matches the prediction.
    fn evaluate(&self, records: &[Record]) -> f64 {
        if records.is_empty() {
            tracing::warn!("evaluating on an empty test set; reporting zero accuracy");
            return 0.0;
        }
        let correct = records
            .iter()
            .filter(|r| self.predict(&r.subject) == r.is_invoice)
            .count();
        correct as f64 / records.len() as f64
    }
}

/// Fits a fresh model from labelled records.
pub trait Train {
    type Model: Classify;

    fn train(&self, records: &[Record]) -> Result<Self::Model, ClassifierError>;
}

impl<T: Train + ?Sized> Train for &T {
    type Model = T::Model;

    fn train(&self, records: &[Record]) -> Result<Self::Model, ClassifierError> {
        (**self).train(records)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Backend {
    #[default]
    BoostedTrees,
    NaiveBayes,
}

/// Hyperparameters for [`InvoiceClassifier`].
#[derive(Debug, Clone)]
pub struct ClassifierParams {
    pub backend: Backend,
    pub num_trees: usize,
    pub num_leaves: usize,
    pub min_datapoints_in_leaf: usize,
    pub seed: u64,
}

impl Default for ClassifierParams {
    fn default() -> Self {
        ClassifierParams {
            backend: Backend::BoostedTrees,
            num_trees: 50,
            num_leaves: 50,
            min_datapoints_in_leaf: 1,
            seed: 42,
        }
    }
}

impl ClassifierParams {
    /// Smallest depth whose full binary tree has at least `num_leaves` leaves.
    pub fn max_depth(&self) -> usize {
        let mut depth = 1;
        while (1usize << depth) < self.num_leaves {
            depth += 1;
        }
        depth
    }
}

impl Train for ClassifierParams {
    type Model = InvoiceClassifier;

    fn train(&self, records: &[Record]) -> Result<InvoiceClassifier, ClassifierError> {
        if records.is_empty() {
            return Err(ClassifierError::EmptyTrainingSet);
        }

        let vocab = Vocabulary::fit(records.iter().map(|r| r.subject.as_str()));
        if vocab.is_empty() {
            return Err(ClassifierError::EmptyVocabulary);
        }

        let x = vocab.vectorize(records.iter().map(|r| r.subject.as_str()));
        let y: Array1<usize> = records
            .iter()
            .map(|r| if r.is_invoice { INVOICE } else { NOT_INVOICE })
            .collect();

        let model = match self.backend {
            Backend::BoostedTrees => Model::Boosted(BoostedTrees::fit(self, &x, &y)?),
            Backend::NaiveBayes => {
                let nb = MultinomialNb::<f64, usize>::params()
                    .fit(&Dataset::new(x, y))
                    .map_err(ClassifierError::NaiveBayes)?;
                Model::Bayes(nb)
            }
        };

        tracing::info!(
            backend = ?self.backend,
            records = records.len(),
            features = vocab.len(),
            "trained classifier"
        );

        Ok(InvoiceClassifier { vocab, model })
    }
}

enum Model {
    Boosted(BoostedTrees),
    Bayes(MultinomialNb<f64, usize>),
}

/// Trained subject classifier and its feature vocabulary.
pub struct InvoiceClassifier {
    vocab: Vocabulary,
    model: Model,
}

impl Classify for InvoiceClassifier {
    fn predict(&self, subject: &str) -> bool {
        let input = self.vocab.vectorize_one(subject);
        match &self.model {
            Model::Boosted(trees) => trees.decision(&input) > 0.0,
            Model::Bayes(nb) => {
                let pred: Array1<usize> = nb.predict(&input);
                pred[0] == INVOICE
            }
        }
    }
}

impl InvoiceClassifier {
    /// Number of boosting rounds kept; always 0 for naive Bayes.
    pub fn num_learners(&self) -> usize {
        match &self.model {
            Model::Boosted(trees) => trees.learners.len(),
            Model::Bayes(_) => 0,
        }
    }
}

/// Discrete AdaBoost over depth-limited decision trees.
///
/// Every round fits a tree on the full training set carrying the current
/// example weights, then shifts weight toward the examples it missed. Each
/// tree sees the feature columns in its own shuffled order, so splits of equal
/// quality are spread across the ensemble instead of always landing on the
/// first such column.
struct BoostedTrees {
    learners: Vec<Learner>,
}

struct Learner {
    tree: DecisionTree<f64, usize>,
    columns: Vec<usize>,
    alpha: f64,
}

impl BoostedTrees {
    fn fit(
        params: &ClassifierParams,
        x: &Array2<f64>,
        y: &Array1<usize>,
    ) -> Result<Self, ClassifierError> {
        let n = x.nrows();
        let mut rng = StdRng::seed_from_u64(params.seed);
        let mut columns: Vec<usize> = (0..x.ncols()).collect();
        let mut weights = vec![1.0 / n as f64; n];

        let mut learners = Vec::with_capacity(params.num_trees);
        for round in 0..params.num_trees {
            columns.shuffle(&mut rng);

            // Scaled to mean 1 so a single example weighs about one datapoint.
            let scaled: Array1<f32> = weights.iter().map(|w| (w * n as f64) as f32).collect();
            let lightest = scaled.iter().copied().fold(f32::INFINITY, f32::min);
            let min_leaf = params.min_datapoints_in_leaf as f32 * lightest;
            let tree_params = DecisionTree::<f64, usize>::params()
                .split_quality(SplitQuality::Gini)
                .max_depth(Some(params.max_depth()))
                .min_weight_split(2.0 * min_leaf)
                .min_weight_leaf(min_leaf);

            let shuffled = x.select(Axis(1), &columns);
            let dataset = Dataset::new(shuffled, y.clone()).with_weights(scaled);
            let tree = tree_params.fit(&dataset).map_err(ClassifierError::Fit)?;

            let pred: Array1<usize> = tree.predict(dataset.records());
            let missed: Vec<bool> = pred.iter().zip(y.iter()).map(|(p, t)| p != t).collect();
            let error: f64 = weights
                .iter()
                .zip(&missed)
                .filter(|(_, m)| **m)
                .map(|(w, _)| w)
                .sum();

            if error >= 0.5 {
                tracing::debug!(round, error, "learner no better than chance; skipped");
                continue;
            }

            let alpha = 0.5 * ((1.0 - error) / error.max(MIN_ERROR)).ln();
            learners.push(Learner {
                tree,
                columns: columns.clone(),
                alpha,
            });

            if error > MIN_ERROR {
                for (w, m) in weights.iter_mut().zip(&missed) {
                    *w *= if *m { alpha.exp() } else { (-alpha).exp() };
                }
                let total: f64 = weights.iter().sum();
                weights.iter_mut().for_each(|w| *w /= total);
            }
        }

        if learners.is_empty() {
            tracing::warn!("no tree beat chance; every subject will be predicted as not an invoice");
        }
        Ok(BoostedTrees { learners })
    }

    /// Alpha-weighted vote; positive means invoice.
    fn decision(&self, input: &Array2<f64>) -> f64 {
        self.learners
            .iter()
            .map(|learner| {
                let row = input.select(Axis(1), &learner.columns);
                let pred: Array1<usize> = learner.tree.predict(&row);
                if pred[0] == INVOICE { learner.alpha } else { -learner.alpha }
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<Record> {
        [
            ("Invoice for March", true),
            ("Invoice 2231 attached", true),
            ("Your invoice from Acme Corp", true),
            ("Payment due: invoice 77", true),
            ("Invoice reminder", true),
            ("Team lunch", false),
            ("Team lunch on Friday", false),
            ("Weekly sync notes", false),
            ("Holiday party", false),
            ("Team dinner plans", false),
        ]
        .into_iter()
        .map(|(s, b)| Record::new(s, b))
        .collect()
    }

    #[test]
    fn default_hyperparameters() {
        let params = ClassifierParams::default();
        assert_eq!(params.num_trees, 50);
        assert_eq!(params.num_leaves, 50);
        assert_eq!(params.min_datapoints_in_leaf, 1);
        assert_eq!(params.max_depth(), 6);
    }

    #[test]
    fn max_depth_covers_leaf_budget() {
        let depth = |num_leaves| {
            ClassifierParams {
                num_leaves,
                ..ClassifierParams::default()
            }
            .max_depth()
        };
        assert_eq!(depth(0), 1);
        assert_eq!(depth(2), 1);
        assert_eq!(depth(3), 2);
        assert_eq!(depth(64), 6);
        assert_eq!(depth(65), 7);
    }

    #[test]
    fn empty_training_set_is_rejected() {
        let err = ClassifierParams::default().train(&[]).err().unwrap();
        assert!(matches!(err, ClassifierError::EmptyTrainingSet));
    }

    #[test]
    fn featureless_training_set_is_rejected() {
        let err = ClassifierParams::default()
            .train(&[Record::new("", true), Record::new("--", false)])
            .err()
            .unwrap();
        assert!(matches!(err, ClassifierError::EmptyVocabulary));
    }

    #[test]
    fn boosted_trees_separate_obvious_subjects() {
        let model = ClassifierParams::default().train(&corpus()).unwrap();

        assert!(model.num_learners() >= 1);
        assert!(model.num_learners() <= 50);
        assert!(model.evaluate(&corpus()) >= 0.8);
        assert!(model.predict("Invoice for April"));
        assert!(!model.predict("Holiday party planning"));
    }

    #[test]
    fn naive_bayes_backend_separates_obvious_subjects() {
        let params = ClassifierParams {
            backend: Backend::NaiveBayes,
            ..ClassifierParams::default()
        };
        let model = params.train(&corpus()).unwrap();

        assert_eq!(model.num_learners(), 0);
        assert!(model.predict("Invoice for April"));
        assert!(!model.predict("Team lunch next week"));
    }

    #[test]
    fn training_is_reproducible_for_a_seed() {
        let a = ClassifierParams::default().train(&corpus()).unwrap();
        let b = ClassifierParams::default().train(&corpus()).unwrap();
        for subject in ["Invoice for April", "Team offsite", "Acme payment", "notes"] {
            assert_eq!(a.predict(subject), b.predict(subject));
        }
    }

    #[test]
    fn single_class_corpus_predicts_that_class() {
        let records = vec![Record::new("Invoice 1", true), Record::new("Invoice 2", true)];
        let model = ClassifierParams::default().train(&records).unwrap();
        assert!(model.predict("anything at all"));
    }

    #[test]
    fn evaluate_counts_matches() {
        struct Always(bool);
        impl Classify for Always {
            fn predict(&self, _: &str) -> bool {
                self.0
            }
        }

        let records = corpus();
        assert_eq!(Always(true).evaluate(&records), 0.5);
        assert_eq!(Always(false).evaluate(&records[..6]), 1.0 / 6.0);
        assert_eq!(Always(true).evaluate(&[]), 0.0);
    }

    #[test]
    fn two_record_corpus_generalizes_to_unseen_subjects() {
        let records = vec![
            Record::new("Invoice for March", true),
            Record::new("Team lunch", false),
        ];
        let model = ClassifierParams::default().train(&records).unwrap();

        assert_eq!(model.evaluate(&records), 1.0);
        assert!(model.predict("Invoice for April"));
        assert!(!model.predict("Team dinner"));
    }

    #[test]
    fn two_record_corpus_fits_for_every_seed() {
        let records = vec![
            Record::new("Invoice for March", true),
            Record::new("Team lunch", false),
        ];
        for seed in 0..20 {
            let params = ClassifierParams {
                seed,
                ..ClassifierParams::default()
            };
            let model = params.train(&records).unwrap();
            assert_eq!(model.evaluate(&records), 1.0, "seed {seed}");
        }
    }

    #[test]
    fn indistinguishable_subjects_fall_back_to_not_invoice() {
        let records = vec![Record::new("Hello", true), Record::new("hello", false)];
        let model = ClassifierParams::default().train(&records).unwrap();

        assert_eq!(model.num_learners(), 0);
        assert!(!model.predict("Hello"));
    }
}
