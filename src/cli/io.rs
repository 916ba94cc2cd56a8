//! JSON output for CLI commands
//!
//! One JSON object per command on stdout, `{"status":"ok","data":...}`.
//! Log records go through the observability logger.

use std::io::{self, Write};

use serde::Serialize;
use serde_json::json;

use super::errors::CliResult;

/// Wrap `data` in the response envelope and write it to stdout
pub fn write_response<T: Serialize>(data: &T) -> CliResult<()> {
    let mut stdout = io::stdout();
    write_response_to(&mut stdout, data)
}

fn write_response_to<W: Write, T: Serialize>(writer: &mut W, data: &T) -> CliResult<()> {
    let data = serde_json::to_value(data)?;
    let response = json!({
        "status": "ok",
        "data": data,
    });
    serde_json::to_writer(&mut *writer, &response)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
