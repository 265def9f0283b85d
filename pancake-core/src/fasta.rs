//! FASTA/FASTQ ingestion into a SeqDB, via needletail.

use std::path::Path;

use needletail::parse_fastx_file;

use crate::seqdb::{SeqDbError, SeqDbWriter};

/// Result type for sequence ingestion
pub type FastaResult<T> = Result<T, FastaError>;

#[derive(Debug, thiserror::Error)]
pub enum FastaError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("SeqDB error: {0}")]
    Db(#[from] SeqDbError),
}

/// Stream every record of a FASTA/FASTQ file (optionally gzipped) into the
/// writer. Headers are truncated at the first whitespace so they survive the
/// whitespace-separated text index. Returns the number of records ingested.
pub fn import_fastx<P: AsRef<Path>>(path: P, writer: &mut SeqDbWriter) -> FastaResult<usize> {
    let mut reader =
        parse_fastx_file(path.as_ref()).map_err(|e| FastaError::Parse(e.to_string()))?;

    let mut count = 0usize;
    while let Some(record) = reader.next() {
        let record = record.map_err(|e| FastaError::Parse(e.to_string()))?;
        let id = String::from_utf8_lossy(record.id()).into_owned();
        let header = id.split_whitespace().next().unwrap_or("").to_string();
        if header.is_empty() {
            return Err(FastaError::Parse(format!(
                "record {count} has an empty header"
            )));
        }
        writer.add_sequence(&header, &record.seq())?;
        count += 1;
    }
    Ok(count)
}
