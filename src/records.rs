//! Record types handed between pipeline stages, plus their JSONL persistence.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::catalog::ColumnDescriptor;

/// Paraphrase paired with the statement it describes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedRecord {
    /// Natural-language paraphrase.
    pub input: String,
    /// Original, trimmed SQL statement.
    pub query: String,
}

/// Annotated record plus the embedding of its paraphrase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedDocument {
    /// Natural-language paraphrase.
    pub input: String,
    /// Original SQL statement.
    pub query: String,
    /// Embedding of `input`.
    pub input_v: Vec<f32>,
}

/// Table descriptor enriched with a model-written summary and its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSummaryRecord {
    /// Catalog table name; also the document identifier.
    pub table_name: String,
    /// Catalog table description.
    pub table_desc: String,
    /// Catalog columns.
    pub cols: Vec<ColumnDescriptor>,
    /// Model-written summary with use cases.
    pub table_summary: String,
    /// Embedding of `table_summary`.
    pub table_summary_v: Vec<f32>,
}

/// Writes one JSON object per line and returns how many were written.
pub fn write_jsonl<W: Write, T: Serialize>(writer: &mut W, records: &[T]) -> Result<usize> {
    for record in records {
        write_jsonl_line(writer, record)?;
    }
    Ok(records.len())
}

/// Writes a single JSON object followed by a newline.
pub fn write_jsonl_line<W: Write, T: Serialize>(writer: &mut W, record: &T) -> Result<()> {
    serde_json::to_writer(&mut *writer, record)?;
    writer.write_all(b"\n")?;
    Ok(())
}

/// Reads annotated records, failing on the first invalid line.
///
/// Blank lines are skipped. Positions in the returned vector become document identifiers,
/// so a bad line must stop the run rather than shift every later identifier.
pub fn read_annotations<R: BufRead>(reader: R) -> Result<Vec<AnnotatedRecord>> {
    let mut records = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("failed to read line {}", line_no + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        let record: AnnotatedRecord = serde_json::from_str(&line)
            .with_context(|| format!("invalid annotated record at line {}", line_no + 1))?;
        records.push(record);
    }
    Ok(records)
}

/// Reads annotated records, skipping invalid lines with a warning.
pub fn read_annotations_lenient<R: BufRead>(reader: R) -> Result<Vec<AnnotatedRecord>> {
    let mut records = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("failed to read line {}", line_no + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<AnnotatedRecord>(&line) {
            Ok(record) => records.push(record),
            Err(err) => warn!(line_no = line_no + 1, %err, "skipping invalid annotated record: {line}"),
        }
    }
    Ok(records)
}

/// Opens `path` and reads it with [`read_annotations`].
pub fn load_annotations(path: &Path) -> Result<Vec<AnnotatedRecord>> {
    let file = File::open(path).with_context(|| format!("failed to open {:?}", path))?;
    read_annotations(BufReader::new(file)).with_context(|| format!("failed to read {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn jsonl_round_trip_preserves_order_and_unicode() {
        let records = vec![
            AnnotatedRecord {
                input: "5월 22일 처리 건수".to_string(),
                query: "SELECT count(*) FROM t".to_string(),
            },
            AnnotatedRecord {
                input: "second".to_string(),
                query: "SELECT 2".to_string(),
            },
        ];
        let mut buf = Vec::new();
        assert_eq!(write_jsonl(&mut buf, &records).unwrap(), 2);
        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.contains("5월 22일"));
        assert_eq!(text.lines().count(), 2);

        assert_eq!(read_annotations(Cursor::new(buf)).unwrap(), records);
    }

    #[test]
    fn strict_reader_rejects_bad_lines() {
        let input = "{\"input\":\"a\",\"query\":\"q\"}\nnot json\n";
        let err = read_annotations(Cursor::new(input)).expect_err("strict");
        assert!(format!("{err:#}").contains("line 2"));
    }

    #[test]
    fn lenient_reader_skips_bad_lines() {
        let input = "{\"input\":\"a\",\"query\":\"q\"}\nnot json\n\n{\"input\":\"b\",\"query\":\"r\"}\n";
        let records = read_annotations_lenient(Cursor::new(input)).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].input, "b");
    }

    #[test]
    fn load_annotations_reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{{\"input\":\"a\",\"query\":\"SELECT 1\"}}").unwrap();
        let records = load_annotations(file.path()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].query, "SELECT 1");

        let missing = file.path().with_extension("absent");
        let err = load_annotations(&missing).expect_err("missing file");
        assert!(format!("{err:#}").contains("failed to open"));
    }
}
