use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures reading or appending the pipe-delimited subject files.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot access '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed record at {}:{line}: missing '|' separator in {content:?}", .path.display())]
    MalformedRecord {
        path: PathBuf,
        line: u64,
        content: String,
    },
    #[error("subject {subject:?} cannot be stored: it contains '|' or a line break")]
    InvalidSubject { subject: String },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failures fitting a classifier.
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("training set is empty")]
    EmptyTrainingSet,
    #[error("no features could be extracted from the training subjects")]
    EmptyVocabulary,
    #[error("decision tree fit failed: {0}")]
    Fit(#[from] linfa::Error),
    #[error("naive Bayes fit failed: {0}")]
    NaiveBayes(#[from] linfa_bayes::NaiveBayesError),
}

/// Anything that stops the interactive loop.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Classifier(#[from] ClassifierError),
    #[error("console I/O failed: {0}")]
    Console(#[from] io::Error),
}
