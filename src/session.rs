//! The train / evaluate / predict / correct loop.
//!
//! Every cycle reloads both files and trains a new model, so corrections
//! appended in one cycle take effect in the next.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use crate::classifier::{Classify, Train};
use crate::error::{SessionError, StoreError};
use crate::store::{append_record, label_token, load_records};

static PROMPT: &str = "Enter an Email Subject or Enter Exit to Terminate Program : ";
static CONFIRM: &str = "Was the prediction correct Y/N?";
static IS_INVOICE: &str = "This is an Invoice";
static NOT_INVOICE: &str = "This is NOT an Invoice";
static COMPLETED: &str = "Completed Execution.....";

/// Label to persist after the user confirms or rejects a prediction.
///
/// A confirmation keeps the predicted label, anything else flips it.
pub fn corrected_label(predicted: bool, confirmed: bool) -> bool {
    if confirmed { predicted } else { !predicted }
}

/// Formats an accuracy in `[0, 1]` as a whole percentage, e.g. `67%`.
pub fn format_accuracy(accuracy: f64) -> String {
    format!("{}%", (accuracy.clamp(0.0, 1.0) * 100.0).round() as u32)
}

/// Summary of a finished session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outcome {
    /// Records appended to the training file.
    pub corrections: usize,
    /// Accuracy reported by the final training cycle.
    pub last_accuracy: f64,
}

/// Interactive classification session over a training and a test file.
pub struct Session<T> {
    training_path: PathBuf,
    test_path: PathBuf,
    trainer: T,
}

impl<T: Train> Session<T> {
    pub fn new(training_path: impl Into<PathBuf>, test_path: impl Into<PathBuf>, trainer: T) -> Self {
        Session {
            training_path: training_path.into(),
            test_path: test_path.into(),
            trainer,
        }
    }

    pub fn training_path(&self) -> &Path {
        &self.training_path
    }

    /// Runs until the user types `exit` (any casing) or input ends.
    ///
    /// Load, training and append I/O failures end the session with an error;
    /// nothing is retried. A subject the training file cannot hold is reported
    /// on `output` and the loop carries on.
    pub fn run<R: BufRead, W: Write>(&self, mut input: R, mut output: W) -> Result<Outcome, SessionError> {
        let mut outcome = Outcome::default();

        loop {
            let training = load_records(&self.training_path)?;
            let test = load_records(&self.test_path)?;
            tracing::info!(training = training.len(), test = test.len(), "starting training cycle");

            let model = self.trainer.train(&training)?;
            let accuracy = model.evaluate(&test);
            outcome.last_accuracy = accuracy;
            tracing::info!(accuracy, "evaluated model");
            writeln!(output, "Accuracy of the Model = {}", format_accuracy(accuracy))?;

            let Some(subject) = prompt_subject(&mut input, &mut output)? else {
                break;
            };

            let predicted = model.predict(&subject);
            writeln!(output, "{}", if predicted { IS_INVOICE } else { NOT_INVOICE })?;
            writeln!(output, "{}", CONFIRM)?;
            output.flush()?;

            let Some(response) = read_trimmed(&mut input)? else {
                tracing::warn!(subject = %subject, "input closed before confirmation; nothing recorded");
                break;
            };
            writeln!(output)?;

            let label = corrected_label(predicted, response.eq_ignore_ascii_case("y"));
            tracing::debug!(subject = %subject, predicted, label = label_token(label), "recording correction");
            match append_record(&self.training_path, &subject, label) {
                Ok(()) => outcome.corrections += 1,
                Err(err @ StoreError::InvalidSubject { .. }) => {
                    tracing::warn!(error = %err, "correction not recorded");
                    writeln!(output, "{}", err)?;
                }
                Err(err) => return Err(err.into()),
            }
        }

        writeln!(output, "{}", COMPLETED)?;
        output.flush()?;
        Ok(outcome)
    }
}

/// `None` means stop: the user typed `exit` or input ended.
fn prompt_subject<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> io::Result<Option<String>> {
    writeln!(output, "{}", PROMPT)?;
    output.flush()?;

    Ok(read_trimmed(input)?.filter(|line| !line.eq_ignore_ascii_case("exit")))
}

fn read_trimmed<R: BufRead>(input: &mut R) -> io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}
