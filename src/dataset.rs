//! Labelled samples read from CSV.
//!
//! Supported format:
//! - UTF-8, comma-separated
//! - Optional header row (auto-detected: the first row is a header if it
//!   contains any non-numeric, non-empty cell)
//! - Lines starting with `#` and blank lines are skipped
//! - Every row holds the features followed by an integer class index
//!   (0-based) in the last column. When the feature count is known up front
//!   (`parse_csv_for`), the class index may be left out of every row.

use std::path::Path;

use crate::error::{Error, Result};

/// Samples flattened into one buffer, ready for `train_loop`.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub input_size: usize,
    /// `len() * input_size` values, one sample after another.
    pub inputs: Vec<f64>,
    /// One class index per sample, or empty when the rows carry no labels.
    pub labels: Vec<usize>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.inputs.len().checked_div(self.input_size).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether every sample has a class index.
    pub fn is_labelled(&self) -> bool {
        !self.is_empty() && self.labels.len() == self.len()
    }

    /// Features of sample `index`, or `None` past the last sample.
    pub fn sample(&self, index: usize) -> Option<&[f64]> {
        let start = index.checked_mul(self.input_size)?;
        let end = start.checked_add(self.input_size)?;
        self.inputs.get(start..end)
    }

    /// Largest label plus one; the smallest output layer that fits the data.
    pub fn class_count(&self) -> usize {
        self.labels.iter().max().map_or(0, |&m| m + 1)
    }

    /// Reads labelled samples; the last column of every row is the class index.
    pub fn load_csv(path: impl AsRef<Path>) -> Result<Dataset> {
        let (text, origin) = read_csv(path.as_ref())?;
        Dataset::parse_csv(&text, &origin)
    }

    /// Reads samples of `input_size` features, with or without a trailing
    /// class index.
    pub fn load_csv_for(path: impl AsRef<Path>, input_size: usize) -> Result<Dataset> {
        let (text, origin) = read_csv(path.as_ref())?;
        Dataset::parse_csv_for(&text, &origin, input_size)
    }

    /// Parses CSV text; `origin` names the source in error messages.
    pub fn parse_csv(text: &str, origin: &str) -> Result<Dataset> {
        parse_rows(text, origin, None)
    }

    /// Parses CSV text whose rows hold exactly `input_size` features, optionally
    /// followed by a class index. Either every row is labelled or none is.
    pub fn parse_csv_for(text: &str, origin: &str, input_size: usize) -> Result<Dataset> {
        if input_size == 0 {
            return Err(Error::invalid("input size must be positive"));
        }
        parse_rows(text, origin, Some(input_size))
    }
}

fn read_csv(path: &Path) -> Result<(String, String)> {
    let text = std::fs::read_to_string(path).map_err(|source| Error::Construction {
        path: path.to_path_buf(),
        source,
    })?;
    Ok((text, path.display().to_string()))
}

/// With `width` unknown every row ends in a label. With a known width a row of
/// `width` cells is unlabelled and a row of `width + 1` cells is labelled.
fn parse_rows(text: &str, origin: &str, width: Option<usize>) -> Result<Dataset> {
    let mut rows = text
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .peekable();

    if let Some((_, first)) = rows.peek() {
        if is_header(first) {
            rows.next();
        }
    }

    let mut input_size = width;
    let mut labelled = None;
    let mut inputs = Vec::new();
    let mut labels = Vec::new();
    let mut samples = 0usize;

    for (line_no, line) in rows {
        let cells: Vec<&str> = line.split(',').map(str::trim).collect();
        let has_label = match width {
            Some(w) if cells.len() == w => false,
            Some(w) if cells.len() == w + 1 => true,
            Some(w) => {
                return Err(Error::parse(
                    origin,
                    format!("line {line_no}: expected {w} features and an optional class index, got {} column(s)", cells.len()),
                ));
            }
            None if cells.len() < 2 => {
                return Err(Error::parse(
                    origin,
                    format!("line {line_no}: expected features and a class index, got {} column(s)", cells.len()),
                ));
            }
            None => true,
        };
        if *labelled.get_or_insert(has_label) != has_label {
            return Err(Error::parse(
                origin,
                format!("line {line_no}: labelled and unlabelled rows are mixed"),
            ));
        }
        let (features, label) = if has_label {
            cells.split_at(cells.len() - 1)
        } else {
            (&cells[..], &[][..])
        };

        let expected = *input_size.get_or_insert(features.len());
        if features.len() != expected {
            return Err(Error::parse(
                origin,
                format!("line {line_no}: {} features, earlier rows have {expected}", features.len()),
            ));
        }
        for cell in features {
            let v = cell.parse::<f64>().map_err(|_| {
                Error::parse(origin, format!("line {line_no}: '{cell}' is not a valid number"))
            })?;
            inputs.push(v);
        }
        if let Some(cell) = label.first() {
            let label = cell.parse::<usize>().map_err(|_| {
                Error::parse(
                    origin,
                    format!("line {line_no}: class index '{cell}' is not a non-negative integer"),
                )
            })?;
            labels.push(label);
        }
        samples += 1;
    }

    match input_size {
        Some(input_size) if samples > 0 => Ok(Dataset { input_size, inputs, labels }),
        _ => Err(Error::parse(origin, "CSV contains no data rows")),
    }
}

/// Returns `true` if the row looks like a header (any cell non-numeric).
fn is_header(line: &str) -> bool {
    line.split(',').any(|c| {
        let t = c.trim();
        !t.is_empty() && t.parse::<f64>().is_err()
    })
}
