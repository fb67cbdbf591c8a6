//! Flat-file storage for labelled subject lines.
//!
//! Each line holds `subject|Yes` or `subject|No`. The label token is compared
//! case-insensitively against `yes`; anything else reads as "not an invoice".

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use csv::{QuoteStyle, ReaderBuilder, Terminator, WriterBuilder};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

static LABEL_YES: &str = "Yes";
static LABEL_NO: &str = "No";

/// One email subject and whether it is an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub subject: String,
    pub is_invoice: bool,
}

impl Record {
    pub fn new(subject: impl Into<String>, is_invoice: bool) -> Self {
        Record {
            subject: subject.into(),
            is_invoice,
        }
    }
}

/// Row layout written back to the training file.
#[derive(Serialize)]
struct Row<'a> {
    subject: &'a str,
    label: &'static str,
}

/// The on-disk label token for a boolean label.
pub fn label_token(is_invoice: bool) -> &'static str {
    if is_invoice { LABEL_YES } else { LABEL_NO }
}

/// Reads a label token; only a case-insensitive `yes` is an invoice.
pub fn parse_label(token: &str) -> bool {
    token.trim().eq_ignore_ascii_case(LABEL_YES)
}

/// Loads every record from `path`, in file order.
///
/// Blank lines are skipped. A non-blank line without a `|` separator aborts
/// the whole load with [`StoreError::MalformedRecord`].
pub fn load_records(path: &Path) -> Result<Vec<Record>, StoreError> {
    let file = File::open(path).map_err(|e| StoreError::io(path, e))?;
    let mut rdr = ReaderBuilder::new()
        .delimiter(b'|')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(file);

    let mut records = Vec::new();
    for row in rdr.records() {
        let row = row.map_err(|e| StoreError::io(path, io::Error::from(e)))?;
        let line = row.position().map(|p| p.line()).unwrap_or_default();

        let subject = row.get(0).unwrap_or_default();
        let Some(label) = row.get(1) else {
            if subject.trim().is_empty() {
                continue;
            }
            return Err(StoreError::MalformedRecord {
                path: path.to_path_buf(),
                line,
                content: subject.to_string(),
            });
        };
        records.push(Record::new(subject, parse_label(label)));
    }

    tracing::debug!(path = %path.display(), count = records.len(), "loaded records");
    Ok(records)
}

/// Appends `subject|Yes` or `subject|No` plus a newline to `path`.
///
/// The file is created when missing and closed again before returning. If the
/// current last line lacks a terminator one is written first, so the new
/// record always starts on its own line.
pub fn append_record(path: &Path, subject: &str, is_invoice: bool) -> Result<(), StoreError> {
    if subject.contains(['|', '\r', '\n']) {
        return Err(StoreError::InvalidSubject {
            subject: subject.to_string(),
        });
    }

    let mut file = OpenOptions::new()
        .read(true)
        .append(true)
        .create(true)
        .open(path)
        .map_err(|e| StoreError::io(path, e))?;

    if !ends_with_newline(&mut file).map_err(|e| StoreError::io(path, e))? {
        file.write_all(b"\n").map_err(|e| StoreError::io(path, e))?;
    }

    let mut wtr = WriterBuilder::new()
        .delimiter(b'|')
        .has_headers(false)
        .quote_style(QuoteStyle::Never)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(file);
    wtr.serialize(Row {
        subject,
        label: label_token(is_invoice),
    })
    .map_err(|e| StoreError::io(path, io::Error::from(e)))?;
    wtr.flush().map_err(|e| StoreError::io(path, e))?;

    tracing::info!(path = %path.display(), subject, label = label_token(is_invoice), "appended record");
    Ok(())
}

/// Empty files count as terminated.
fn ends_with_newline(file: &mut File) -> io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}
