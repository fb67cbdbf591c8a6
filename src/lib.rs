//! # invoice_subject 🧾
//!
//! Tell invoice emails apart from everything else by their subject line.
//!
//! Subjects are featurized into word and character n-grams and fed to a
//! boosted ensemble of [`linfa-trees`](https://crates.io/crates/linfa-trees)
//! decision trees (or a [`linfa-bayes`](https://crates.io/crates/linfa-bayes)
//! naive Bayes model). An interactive session reports accuracy on a held-out
//! file, predicts subjects typed by the user and appends the corrected label to
//! the training file so that the next cycle learns from it.
//!
//! ## Features
//! - Pipe-delimited `subject|Yes` / `subject|No` corpora, read with `csv`
//! - Word unigram, bigram and char trigram features
//! - AdaBoost over decision trees (50 trees, 50 leaves, 1 datapoint per leaf by default)
//! - Retrain from scratch on every correction
//! - Benchmarkable with [Criterion](https://crates.io/crates/criterion)
//!
//! ## Example
//! ```no_run
//! use std::path::Path;
//! use invoice_subject::{ClassifierParams, Classify, Train, load_records};
//!
//! let training = load_records(Path::new("data/training.txt"))?;
//! let test = load_records(Path::new("data/test.txt"))?;
//! let model = ClassifierParams::default().train(&training)?;
//! println!("accuracy: {:.2}", model.evaluate(&test));
//! println!("invoice? {}", model.predict("Invoice #4411 from Acme"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod classifier;
pub mod cli;
pub mod error;
pub mod features;
pub mod session;
pub mod store;

pub use classifier::{Backend, Classify, ClassifierParams, InvoiceClassifier, Train};
pub use error::{ClassifierError, SessionError, StoreError};
pub use session::{Outcome, Session, corrected_label, format_accuracy};
pub use store::{Record, append_record, load_records};
