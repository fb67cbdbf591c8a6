use std::path::PathBuf;

use clap::Parser;

use crate::classifier::{Backend, ClassifierParams};

/// Command-line options. Every option has a default, so a bare invocation
/// runs against `data/training.txt` and `data/test.txt`.
#[derive(Parser, Debug)]
#[command(
    name = "invoice-subject",
    version,
    about = "Classify email subjects as invoices, learning from your corrections."
)]
pub struct Cli {
    /// Training corpus; corrections are appended here
    #[arg(long, default_value = "data/training.txt")]
    pub training_data: PathBuf,

    /// Held-out corpus used to report accuracy
    #[arg(long, default_value = "data/test.txt")]
    pub test_data: PathBuf,

    #[arg(long, value_enum, default_value_t = Backend::BoostedTrees)]
    pub backend: Backend,

    /// Boosting rounds
    #[arg(long, default_value_t = 50)]
    pub trees: usize,

    /// Leaf budget per tree
    #[arg(long, default_value_t = 50)]
    pub leaves: usize,

    /// Minimum datapoints per leaf
    #[arg(long, default_value_t = 1)]
    pub min_leaf: usize,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

impl Cli {
    pub fn classifier_params(&self) -> ClassifierParams {
        ClassifierParams {
            backend: self.backend,
            num_trees: self.trees,
            num_leaves: self.leaves,
            min_datapoints_in_leaf: self.min_leaf,
            seed: self.seed,
        }
    }
}
