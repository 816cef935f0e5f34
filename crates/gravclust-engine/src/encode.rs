//! Merge sequence encodings.
//!
//! Two stable encodings, both one row per record in sequence order:
//!
//! - a tab-separated merge table with a header row
//! - JSON lines, one serialized [`MergeRecord`] per line

use std::io::{self, BufRead, Write};

use thiserror::Error;

use crate::engine::MergeRecord;

/// Column names of the merge table.
pub const MERGE_TABLE_COLUMNS: [&str; 15] = [
    "sequence",
    "left_id",
    "left_lon",
    "left_lat",
    "left_weight",
    "right_id",
    "right_lon",
    "right_lat",
    "right_weight",
    "composite_id",
    "composite_lon",
    "composite_lat",
    "composite_weight",
    "member_count",
    "value",
];

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error on line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("record {found} out of order, expected {expected}")]
    OutOfOrder { expected: u64, found: u64 },
}

/// Writes records as a tab-separated table.
///
/// ```
/// use gravclust_engine::encode::write_merge_table;
///
/// let mut out = Vec::new();
/// write_merge_table(&[], &mut out).unwrap();
/// assert!(String::from_utf8(out).unwrap().starts_with("sequence\tleft_id\t"));
/// ```
pub fn write_merge_table<W: Write>(records: &[MergeRecord], mut out: W) -> Result<(), EncodeError> {
    writeln!(out, "{}", MERGE_TABLE_COLUMNS.join("\t"))?;
    for r in records {
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            r.sequence,
            r.left.id,
            r.left.position.lon,
            r.left.position.lat,
            r.left.weight,
            r.right.id,
            r.right.position.lon,
            r.right.position.lat,
            r.right.weight,
            r.composite.id,
            r.composite.position.lon,
            r.composite.position.lat,
            r.composite.weight,
            r.composite.member_count,
            r.value,
        )?;
    }
    out.flush()?;
    Ok(())
}

/// Writes records as JSON lines.
pub fn write_json_lines<W: Write>(records: &[MergeRecord], mut out: W) -> Result<(), EncodeError> {
    for (i, record) in records.iter().enumerate() {
        serde_json::to_writer(&mut out, record)
            .map_err(|source| EncodeError::Json { line: i + 1, source })?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}

/// Reads JSON lines written by [`write_json_lines`], checking sequence order.
///
/// Blank lines are skipped.
pub fn read_json_lines<R: BufRead>(input: R) -> Result<Vec<MergeRecord>, EncodeError> {
    let mut records: Vec<MergeRecord> = Vec::new();
    for (i, line) in input.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: MergeRecord = serde_json::from_str(&line)
            .map_err(|source| EncodeError::Json { line: i + 1, source })?;

        let expected = records.last().map_or(1, |r| r.sequence + 1);
        if record.sequence != expected {
            return Err(EncodeError::OutOfOrder {
                expected,
                found: record.sequence,
            });
        }
        records.push(record);
    }
    Ok(records)
}
