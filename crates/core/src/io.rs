//! Streaming readers and writers for the benchmark file formats.
//!
//! All formats are UTF-8 with `\n` newlines:
//! - corpus/queries/chunk embeddings: JSON Lines
//! - qrels: TSV with a `query-id\tcorpus-id\tscore` header
//! - runs: TREC format, `query_id Q0 doc_id rank score run_id` per line
//!
//! Readers are forward-only and consumed once. Malformed lines are skipped
//! with a count (surfaced as a warning), never fatal unless no valid line
//! remains; a missing file is a fatal input error.

use crate::error::{Error, Result};
use crate::types::{Qrels, ScoredDoc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Open a file for buffered reading, mapping a missing file to a fatal
/// input error naming the path.
fn open_input(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path)
        .map_err(|e| Error::input(format!("cannot open {}: {e}", path.display())))?;
    Ok(BufReader::new(file))
}

/// Count lines in a file (used for progress bar totals).
pub fn count_lines(path: &Path) -> Result<usize> {
    let reader = open_input(path)?;
    Ok(reader.lines().count())
}

/// Streaming JSON Lines reader.
///
/// Yields one deserialized record per call to [`next_record`]; malformed
/// lines are skipped and counted. I/O failures are fatal.
///
/// [`next_record`]: JsonlReader::next_record
pub struct JsonlReader<T> {
    reader: BufReader<File>,
    path: PathBuf,
    line_no: usize,
    valid: usize,
    skipped: usize,
    _marker: PhantomData<T>,
}

impl<T: DeserializeOwned> JsonlReader<T> {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            reader: open_input(path)?,
            path: path.to_path_buf(),
            line_no: 0,
            valid: 0,
            skipped: 0,
            _marker: PhantomData,
        })
    }

    /// Next valid record, or `None` at end of file.
    pub fn next_record(&mut self) -> Result<Option<T>> {
        let mut line = String::new();
        loop {
            line.clear();
            let read = self.reader.read_line(&mut line)?;
            if read == 0 {
                return Ok(None);
            }
            self.line_no += 1;

            let trimmed = line.trim_end_matches('\n');
            if trimmed.is_empty() {
                continue;
            }

            match serde_json::from_str::<T>(trimmed) {
                Ok(record) => {
                    self.valid += 1;
                    return Ok(Some(record));
                }
                Err(e) => {
                    self.skipped += 1;
                    warn!(
                        file = %self.path.display(),
                        line = self.line_no,
                        "skipping malformed JSONL line: {e}"
                    );
                }
            }
        }
    }

    /// Number of malformed lines skipped so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Number of valid records read so far.
    pub fn valid(&self) -> usize {
        self.valid
    }

    /// Read every record into memory.
    ///
    /// Fails if the file contained lines but none of them parsed.
    pub fn read_all(path: &Path) -> Result<Vec<T>> {
        let mut reader = Self::open(path)?;
        let mut records = Vec::new();
        while let Some(record) = reader.next_record()? {
            records.push(record);
        }
        if records.is_empty() && reader.skipped > 0 {
            return Err(Error::parse(
                path.display().to_string(),
                reader.line_no,
                format!("no valid records ({} lines skipped)", reader.skipped),
            ));
        }
        Ok(records)
    }
}

/// Write records as JSON Lines.
pub fn write_jsonl<'a, T, I>(path: &Path, records: I) -> Result<()>
where
    T: Serialize + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut writer = BufWriter::new(File::create(path)?);
    for record in records {
        serde_json::to_writer(&mut writer, record)
            .map_err(|e| Error::input(format!("cannot serialize record: {e}")))?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Read qrels from a TSV file with a `query-id\tcorpus-id\tscore` header.
///
/// Malformed lines (wrong column count, unparseable score) are skipped with
/// a count; the read only fails when no valid judgment remains.
pub fn read_qrels(path: &Path) -> Result<Qrels> {
    let reader = open_input(path)?;
    let mut qrels = Qrels::new();
    let mut line_no = 0usize;

    for line in reader.lines() {
        let line = line?;
        line_no += 1;
        if line_no == 1 {
            // Header line.
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }

        let mut parts = line.split('\t');
        let parsed = match (parts.next(), parts.next(), parts.next()) {
            (Some(query_id), Some(doc_id), Some(score)) => score
                .trim()
                .parse::<f64>()
                .ok()
                .map(|score| (query_id.to_string(), doc_id.to_string(), score)),
            _ => None,
        };

        match parsed {
            Some((query_id, doc_id, score)) => qrels.insert(query_id, doc_id, score),
            None => {
                qrels.record_skipped();
                warn!(
                    file = %path.display(),
                    line = line_no,
                    "skipping malformed qrels line"
                );
            }
        }
    }

    if qrels.is_empty() && qrels.skipped_lines() > 0 {
        return Err(Error::parse(
            path.display().to_string(),
            line_no,
            format!(
                "no valid judgments ({} lines skipped)",
                qrels.skipped_lines()
            ),
        ));
    }
    Ok(qrels)
}

/// Write qrels as TSV with the standard header.
///
/// Rows must be pre-sorted by the caller when deterministic output is
/// required.
pub fn write_qrels<'a, I>(path: &Path, rows: I) -> Result<()>
where
    I: IntoIterator<Item = (&'a str, &'a str, f64)>,
{
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "query-id\tcorpus-id\tscore")?;
    for (query_id, doc_id, score) in rows {
        writeln!(writer, "{query_id}\t{doc_id}\t{score}")?;
    }
    writer.flush()?;
    Ok(())
}

/// Write a ranked result set in TREC run format.
///
/// Ranks start at 1 and increase with descending score within a query;
/// the input lists are assumed already score-sorted.
pub fn write_trec_run(
    path: &Path,
    run_id: &str,
    results: &[(String, Vec<ScoredDoc>)],
) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for (query_id, hits) in results {
        for (rank, hit) in hits.iter().enumerate() {
            writeln!(
                writer,
                "{query_id} Q0 {doc_id} {rank} {score} {run_id}",
                doc_id = hit.doc_id,
                rank = rank + 1,
                score = hit.score,
            )?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Read a TREC run file into per-query ranked lists.
///
/// Lists are ordered by the rank column. Malformed lines are skipped with a
/// count; the read fails only when no valid line remains.
pub fn read_trec_run(path: &Path) -> Result<HashMap<String, Vec<ScoredDoc>>> {
    let reader = open_input(path)?;
    let mut by_query: HashMap<String, Vec<(usize, ScoredDoc)>> = HashMap::new();
    let mut line_no = 0usize;
    let mut valid = 0usize;
    let mut skipped = 0usize;

    for line in reader.lines() {
        let line = line?;
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        let parsed = if fields.len() == 6 {
            match (fields[3].parse::<usize>(), fields[4].parse::<f64>()) {
                (Ok(rank), Ok(score)) => Some((
                    fields[0].to_string(),
                    rank,
                    ScoredDoc::new(fields[2], score),
                )),
                _ => None,
            }
        } else {
            None
        };

        match parsed {
            Some((query_id, rank, hit)) => {
                valid += 1;
                by_query.entry(query_id).or_default().push((rank, hit));
            }
            None => {
                skipped += 1;
                warn!(
                    file = %path.display(),
                    line = line_no,
                    "skipping malformed TREC run line"
                );
            }
        }
    }

    if valid == 0 && skipped > 0 {
        return Err(Error::parse(
            path.display().to_string(),
            line_no,
            format!("no valid run lines ({skipped} lines skipped)"),
        ));
    }

    Ok(by_query
        .into_iter()
        .map(|(query_id, mut hits)| {
            hits.sort_by_key(|(rank, _)| *rank);
            (query_id, hits.into_iter().map(|(_, hit)| hit).collect())
        })
        .collect())
}
