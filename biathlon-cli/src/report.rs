//! Results table output
//!
//! Writes the final table either as text lines or as a JSON array.

use anyhow::Result;
use biathlon_core::CompetitorResult;
use clap::ValueEnum;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Txt,
    Json,
}

/// Write the results table in the requested format
pub fn write_results<W: Write>(
    mut out: W,
    results: &[CompetitorResult],
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Txt => {
            for result in results {
                writeln!(out, "{}", result)?;
            }
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, results)?;
            writeln!(out)?;
        }
    }
    out.flush()?;
    Ok(())
}
