use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::{HeaderStore, StoreError};
use crate::header::HeaderRecord;

/// Column header written as the first line of every cache file.
pub const COLUMNS: &str = "height,nTx,bits,difficulty,time,mediantime,hash,nextblockhash";

/// CSV-backed header cache.
///
/// `hash` and `nextblockhash` are double-quoted so that empty successors
/// round-trip as empty strings; the other columns are plain numbers.
/// `difficulty` is written with Rust's shortest round-trip `f64` formatting,
/// so a reload recovers the exact value.
pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        CsvStore {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl HeaderStore for CsvStore {
    /// Reads the whole cache. A missing file is a first run and loads as
    /// an empty collection; a malformed line fails the load.
    fn load(&self) -> Result<Vec<HeaderRecord>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        let mut lines = BufReader::new(file).lines();

        // First line is the column header.
        if lines.next().transpose()?.is_none() {
            return Ok(Vec::new());
        }

        let mut headers = Vec::new();
        for line in lines {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            headers.push(parse_row(&line)?);
        }
        Ok(headers)
    }

    /// Rewrites the cache file with the given records, in the given order.
    ///
    /// The write goes to a sibling temp file and is renamed over the target,
    /// so a crash mid-save leaves the previous cache intact.
    fn save(&self, headers: &[HeaderRecord]) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
            && !dir.exists()
        {
            fs::create_dir_all(dir)?;
        }

        let tmp = self.path.with_extension("tmp");
        let mut file = File::create(&tmp)?;
        writeln!(file, "{COLUMNS}")?;
        for h in headers {
            writeln!(
                file,
                "{},{},{},{},{},{},\"{}\",\"{}\"",
                h.height, h.n_tx, h.bits, h.difficulty, h.time, h.mediantime, h.hash, h.nextblockhash
            )?;
        }
        file.sync_all()?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Splits one CSV line on commas, honoring double-quoted fields. Quotes are
/// stripped from the returned fields.
fn split_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut field)),
            _ => field.push(ch),
        }
    }
    fields.push(field);
    fields
}

fn parse_field<T>(raw: &str, name: &str, line: &str) -> Result<T, StoreError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|e| StoreError::MalformedRow {
        line: line.to_string(),
        reason: format!("{name}: {e}"),
    })
}

fn parse_row(line: &str) -> Result<HeaderRecord, StoreError> {
    let fields = split_row(line);
    if fields.len() != 8 {
        return Err(StoreError::MalformedRow {
            line: line.to_string(),
            reason: format!("expected 8 fields, found {}", fields.len()),
        });
    }

    Ok(HeaderRecord {
        height: parse_field(&fields[0], "height", line)?,
        n_tx: parse_field(&fields[1], "nTx", line)?,
        bits: parse_field(&fields[2], "bits", line)?,
        difficulty: parse_field(&fields[3], "difficulty", line)?,
        time: parse_field(&fields[4], "time", line)?,
        mediantime: parse_field(&fields[5], "mediantime", line)?,
        hash: fields[6].clone(),
        nextblockhash: fields[7].clone(),
    })
}
