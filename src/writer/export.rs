use std::io::Write;
use crate::core::error::{Error, ErrorKind, Result};
use crate::storage::record_store::RecordStore;

/// Writes the given records as JSON Lines, one compact object per line, in
/// the order the indices arrive. Returns the number of lines written.
pub fn export_jsonl<W, I>(store: &RecordStore, indices: I, mut writer: W) -> Result<usize>
where
    W: Write,
    I: IntoIterator<Item = usize>,
{
    let mut written = 0;
    for index in indices {
        let record = store
            .get(index)
            .ok_or_else(|| Error::new(ErrorKind::NotFound, format!("no record at index {}", index)))?;
        serde_json::to_writer(&mut writer, &record.value)?;
        writer.write_all(b"\n")?;
        written += 1;
    }
    writer.flush()?;
    Ok(written)
}
