//! Output formatting.

use serde::Serialize;

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Render `value` to stdout in the requested format.
pub fn print<T: Serialize>(value: &T, format: OutputFormat) -> Result<(), CliError> {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::JsonCompact => serde_json::to_string(value)?,
    };
    println!("{rendered}");
    Ok(())
}
