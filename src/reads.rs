//! FASTQ-like read file loader for the CLI (spec.md §6 "Required inputs:
//! ... FASTQ path"). Accepts both 4-line-per-record FASTQ and 2-line-per-
//! record FASTA, detected from the first non-empty line's leading byte.
//!
//! Grounded on the teacher's `utils/common.rs` file-handling idiom (plain
//! `std::fs`/`BufRead` line loop, no external FASTA/FASTQ crate) rather than
//! pulling in a dedicated parsing dependency for a format this crate only
//! reads sequentially once per run.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path as FsPath;

use crate::error::{PangrepsError, Result};

/// Load every read sequence from `path`, uppercasing bases as they are read
/// (the rest of the crate assumes uppercase `A`/`C`/`G`/`T`/ambiguity codes,
/// per `alphabet`'s conventions).
pub fn load_reads(path: impl AsRef<FsPath>) -> Result<Vec<Vec<u8>>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| PangrepsError::io(path, e))?;
    let mut lines = BufReader::new(file).lines();

    let mut reads = Vec::new();
    let Some(first) = lines.next() else {
        return Ok(reads);
    };
    let first = first.map_err(|e| PangrepsError::io(path, e))?;
    if first.is_empty() {
        return Ok(reads);
    }

    match first.as_bytes()[0] {
        b'@' => {
            // FASTQ: header, sequence, '+' separator, quality — four lines
            // per record.
            let mut pending = Some(Ok(first));
            loop {
                let header = match pending.take().or_else(|| lines.next()) {
                    Some(h) => h.map_err(|e| PangrepsError::io(path, e))?,
                    None => break,
                };
                if !header.starts_with('@') {
                    return Err(PangrepsError::corruption(path, format!("expected FASTQ header, found: {header}")));
                }
                let seq = lines
                    .next()
                    .ok_or_else(|| PangrepsError::corruption(path, "truncated FASTQ record: missing sequence line"))?
                    .map_err(|e| PangrepsError::io(path, e))?;
                let plus = lines
                    .next()
                    .ok_or_else(|| PangrepsError::corruption(path, "truncated FASTQ record: missing '+' line"))?
                    .map_err(|e| PangrepsError::io(path, e))?;
                if !plus.starts_with('+') {
                    return Err(PangrepsError::corruption(path, format!("expected '+' separator, found: {plus}")));
                }
                let _quality = lines
                    .next()
                    .ok_or_else(|| PangrepsError::corruption(path, "truncated FASTQ record: missing quality line"))?
                    .map_err(|e| PangrepsError::io(path, e))?;
                reads.push(seq.to_ascii_uppercase().into_bytes());
            }
        }
        b'>' => {
            // FASTA: header followed by one or more sequence lines, folded
            // until the next header.
            let mut current = Vec::new();
            let mut started = false;
            for line in std::iter::once(Ok(first)).chain(lines) {
                let line = line.map_err(|e| PangrepsError::io(path, e))?;
                if line.starts_with('>') {
                    if started {
                        reads.push(std::mem::take(&mut current));
                    }
                    started = true;
                    continue;
                }
                current.extend(line.trim_end().to_ascii_uppercase().into_bytes());
            }
            if started {
                reads.push(current);
            }
        }
        _ => {
            return Err(PangrepsError::corruption(path, "read file is neither FASTQ ('@') nor FASTA ('>')"));
        }
    }

    Ok(reads)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_fastq_records() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("reads.fastq");
        std::fs::write(&p, "@r1\nACGT\n+\nIIII\n@r2\nTTTT\n+\nIIII\n").unwrap();
        let reads = load_reads(&p).unwrap();
        assert_eq!(reads, vec![b"ACGT".to_vec(), b"TTTT".to_vec()]);
    }

    #[test]
    fn loads_fasta_records_with_folded_sequence_lines() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("reads.fasta");
        std::fs::write(&p, ">r1\nACGT\nACGT\n>r2\nTTTT\n").unwrap();
        let reads = load_reads(&p).unwrap();
        assert_eq!(reads, vec![b"ACGTACGT".to_vec(), b"TTTT".to_vec()]);
    }

    #[test]
    fn rejects_unknown_format() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("reads.txt");
        std::fs::write(&p, "ACGTACGT\n").unwrap();
        assert!(load_reads(&p).is_err());
    }
}
