//! CSV output of TTC records.
//!
//! One row per matched object pair and frame. Unavailable TTCs are written
//! as empty cells.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use csv::Writer;

use crate::pipeline::TtcRecord;

pub fn write_records<P: AsRef<Path>>(path: P, records: &[TtcRecord]) -> Result<()> {
    let path = path.as_ref();
    let writer = Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    write_csv(writer, records).with_context(|| format!("Failed to write {}", path.display()))
}

pub fn write_records_to<W: Write>(out: W, records: &[TtcRecord]) -> Result<()> {
    write_csv(Writer::from_writer(out), records)
}

fn write_csv<W: Write>(mut writer: Writer<W>, records: &[TtcRecord]) -> Result<()> {
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}
