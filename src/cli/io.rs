//! JSON output for one-shot commands: one JSON document per line on
//! stdout, UTF-8 only.

use std::io::{self, Write};

use serde::Serialize;

use super::errors::CliResult;

/// Write a value as a single JSON line to stdout
pub fn write_json<T: Serialize>(value: &T) -> CliResult<()> {
    let mut stdout = io::stdout().lock();
    write_json_to(value, &mut stdout)
}

pub(super) fn write_json_to<T: Serialize, W: Write>(value: &T, writer: &mut W) -> CliResult<()> {
    serde_json::to_writer(&mut *writer, value)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
