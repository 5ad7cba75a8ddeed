//! Rendering of finalized results

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use crate::{aggregate::MatchResult, error::OutputError};

/// Line format for emitted results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// The bare matched value
    #[default]
    Text,
    /// One `{"url": ..., "value": ...}` object per line
    Json,
}

/// Render a single record as one output line, without the newline
pub fn render_line(record: &MatchResult, format: OutputFormat) -> Result<String, OutputError> {
    match format {
        OutputFormat::Text => Ok(record.value.clone()),
        OutputFormat::Json => Ok(serde_json::to_string(record)?),
    }
}

/// Write every record to `writer`, one per line
pub fn write_results<W: Write>(
    writer: &mut W,
    records: &[MatchResult],
    format: OutputFormat,
) -> Result<(), OutputError> {
    for record in records {
        writeln!(writer, "{}", render_line(record, format)?)?;
    }
    writer.flush()?;
    Ok(())
}

/// Create (or truncate) the file at `path` and write every record to it
pub fn write_results_to_file(
    path: &Path,
    records: &[MatchResult],
    format: OutputFormat,
) -> Result<(), OutputError> {
    let file = File::create(path).map_err(|source| OutputError::Create {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    write_results(&mut writer, records, format)
}
