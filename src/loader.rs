//! SpecsLab Prodigy `.xy` import.
//!
//! The files are plain text. Metadata lines start with a comment prefix
//! (`#` by default). One of them, `# ColumnLabels: energy counts/s ...`,
//! names the numeric columns of the data rows that follow.
//!
//! ```text
//! # Separate Scan Data: no
//! # ColumnLabels: energy counts/s
//! 280.00  1523.1
//! 280.05  1530.8
//! ```
//!
//! Files exported with separate scan or channel data are not supported.

use std::path::Path;

use ndarray::Array1;
use nom::{
    bytes::complete::{is_not, tag, take_until},
    character::complete::{char, space0, space1},
    multi::{separated_list0, separated_list1},
    number::complete::double,
    sequence::{delimited, preceded},
    IResult, Parser,
};

use crate::error::{PeakFitError, Result};

const LABELS_DIRECTIVE: &str = "ColumnLabels:";
const ENERGY_COLUMN: &str = "energy";
const COUNTS_COLUMN: &str = "counts/s";
const TRANSMISSION_COLUMN: &str = "transmission";
const ERROR_BAR_COLUMN: &str = "ErrorBar";

/// Export layouts that are rejected.
const UNSUPPORTED_FLAGS: [&str; 2] = ["Separate Scan Data", "Separate Channel Data"];

/// How to read a data file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Lines starting with this prefix are metadata. Default `#`
    pub comment_prefix: String,
    /// Column separator; `None` splits on runs of whitespace
    pub delimiter: Option<char>,
    /// Multiply counts by the `transmission` column when present
    pub apply_transmission: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            comment_prefix: "#".to_string(),
            delimiter: None,
            apply_transmission: false,
        }
    }
}

impl LoadOptions {
    /// Set the comment prefix.
    pub fn with_comment_prefix(mut self, prefix: &str) -> Self {
        self.comment_prefix = prefix.to_string();
        self
    }

    /// Set the column delimiter.
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    /// Enable or disable the transmission correction.
    pub fn with_transmission(mut self, apply: bool) -> Self {
        self.apply_transmission = apply;
        self
    }
}

/// What to do when the `ErrorBar` column is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorBars {
    /// Use zeros
    ZeroIfMissing,
    /// Fail with `MissingColumn`
    Required,
}

/// Columns read from a data file.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumData {
    /// Energy axis
    pub energy: Array1<f64>,
    /// Count rate, transmission-corrected if requested
    pub intensity: Array1<f64>,
    /// Error bars, when the file has them
    pub error_bar: Option<Array1<f64>>,
}

fn column_labels(input: &str) -> IResult<&str, Vec<&str>> {
    preceded(
        (take_until(LABELS_DIRECTIVE), tag(LABELS_DIRECTIVE), space0),
        separated_list0(space1, is_not(" \t\r\n")),
    )
    .parse(input)
}

fn whitespace_row(input: &str) -> IResult<&str, Vec<f64>> {
    delimited(space0, separated_list1(space1, double), space0).parse(input)
}

fn delimited_row(input: &str, delimiter: char) -> IResult<&str, Vec<f64>> {
    delimited(
        space0,
        separated_list1(delimited(space0, char(delimiter), space0), double),
        space0,
    )
    .parse(input)
}

fn parse_row(line: &str, line_no: usize, delimiter: Option<char>) -> Result<Vec<f64>> {
    let parsed = match delimiter {
        Some(d) => delimited_row(line, d),
        None => whitespace_row(line),
    };
    match parsed {
        Ok(("", values)) => Ok(values),
        Ok((rest, _)) => Err(PeakFitError::Parse {
            line: line_no,
            message: format!("unexpected trailing input {:?}", rest),
        }),
        Err(e) => Err(PeakFitError::Parse {
            line: line_no,
            message: format!("not a numeric row: {}", e),
        }),
    }
}

fn column(labels: &[&str], name: &str) -> Option<usize> {
    labels.iter().position(|l| *l == name)
}

/// Parse `.xy` content held in memory.
///
/// # Examples
///
/// ```
/// use xpsfit_rs::loader::{parse_str, LoadOptions};
///
/// let content = "# ColumnLabels: energy counts/s\n284.0 10\n284.1 12\n";
/// let data = parse_str(content, &LoadOptions::default()).unwrap();
/// assert_eq!(data.energy.to_vec(), vec![284.0, 284.1]);
/// assert_eq!(data.intensity.to_vec(), vec![10.0, 12.0]);
/// ```
pub fn parse_str(content: &str, options: &LoadOptions) -> Result<SpectrumData> {
    let prefix = options.comment_prefix.as_str();
    let is_comment = |line: &str| !prefix.is_empty() && line.trim_start().starts_with(prefix);

    for line in content.lines().filter(|l| is_comment(l)) {
        let lower = line.to_lowercase();
        if let Some(flag) = UNSUPPORTED_FLAGS
            .iter()
            .find(|flag| line.contains(*flag) && lower.contains("yes"))
        {
            return Err(PeakFitError::NotImplemented(format!(
                "files with '{}' set to 'yes'",
                flag
            )));
        }
    }

    let labels = content
        .lines()
        .filter(|l| is_comment(l))
        .find_map(|l| column_labels(l).ok().map(|(_, labels)| labels))
        .ok_or_else(|| PeakFitError::MissingMetadata(LABELS_DIRECTIVE.to_string()))?;

    let energy_col = column(&labels, ENERGY_COLUMN)
        .ok_or_else(|| PeakFitError::MissingColumn(ENERGY_COLUMN.to_string()))?;
    let counts_col = column(&labels, COUNTS_COLUMN)
        .ok_or_else(|| PeakFitError::MissingColumn(COUNTS_COLUMN.to_string()))?;
    let transmission_col = column(&labels, TRANSMISSION_COLUMN).filter(|_| options.apply_transmission);
    let error_col = column(&labels, ERROR_BAR_COLUMN);

    let needed = [Some(energy_col), Some(counts_col), transmission_col, error_col]
        .iter()
        .flatten()
        .max()
        .map_or(0, |c| c + 1);

    let mut energy = Vec::new();
    let mut intensity = Vec::new();
    let mut error_bar = Vec::new();
    let mut width = None;

    for (i, raw) in content.lines().enumerate() {
        if is_comment(raw) {
            continue;
        }
        // inline comments end the row
        let line = if prefix.is_empty() {
            raw
        } else {
            raw.split(prefix).next().unwrap_or("")
        };
        if line.trim().is_empty() {
            continue;
        }

        let row = parse_row(line.trim(), i + 1, options.delimiter)?;
        match width {
            None => width = Some(row.len()),
            Some(w) if w != row.len() => {
                return Err(PeakFitError::Parse {
                    line: i + 1,
                    message: format!("expected {} columns, found {}", w, row.len()),
                })
            }
            _ => {}
        }
        if row.len() < needed {
            return Err(PeakFitError::Parse {
                line: i + 1,
                message: format!("expected at least {} columns, found {}", needed, row.len()),
            });
        }

        let scale = transmission_col.map_or(1.0, |c| row[c]);
        energy.push(row[energy_col]);
        intensity.push(row[counts_col] * scale);
        if let Some(c) = error_col {
            error_bar.push(row[c]);
        }
    }

    log::debug!("parsed {} rows with columns {:?}", energy.len(), labels);

    Ok(SpectrumData {
        energy: Array1::from_vec(energy),
        intensity: Array1::from_vec(intensity),
        error_bar: error_col.map(|_| Array1::from_vec(error_bar)),
    })
}

/// Load energy and intensity from a `.xy` file.
pub fn load<P: AsRef<Path>>(path: P, options: &LoadOptions) -> Result<SpectrumData> {
    let content = std::fs::read_to_string(path.as_ref())?;
    parse_str(&content, options)
}

/// Load a `.xy` file together with its error bars.
pub fn load_with_error_bars<P: AsRef<Path>>(
    path: P,
    options: &LoadOptions,
    policy: ErrorBars,
) -> Result<(SpectrumData, Array1<f64>)> {
    let data = load(path, options)?;
    let error_bar = match (&data.error_bar, policy) {
        (Some(e), _) => e.clone(),
        (None, ErrorBars::ZeroIfMissing) => Array1::zeros(data.energy.len()),
        (None, ErrorBars::Required) => {
            return Err(PeakFitError::MissingColumn(ERROR_BAR_COLUMN.to_string()))
        }
    };
    Ok((data, error_bar))
}
