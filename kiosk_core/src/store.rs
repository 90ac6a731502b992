// The vote store: a flat comma-separated file, one `<voter_id>,<candidate>` row per vote.

use log::{debug, info, warn};
use snafu::{prelude::*, Snafu};

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::config::VoteRecord;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum StoreError {
    #[snafu(display("Error opening vote file {}", path.display()))]
    ReadingFile { source: io::Error, path: PathBuf },
    #[snafu(display("Error parsing line {lineno} of vote file {}", path.display()))]
    ParsingRow {
        source: csv::Error,
        path: PathBuf,
        lineno: usize,
    },
    #[snafu(display("Line {lineno} of vote file {} has fewer than 2 fields", path.display()))]
    MalformedRow { path: PathBuf, lineno: usize },
    #[snafu(display("Error writing to vote file {}", path.display()))]
    WritingFile { source: io::Error, path: PathBuf },
    #[snafu(display("Error encoding a vote for file {}", path.display()))]
    WritingRow { source: csv::Error, path: PathBuf },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Reads all the votes recorded in the given file, in file order.
///
/// A missing file is an empty store. Fields after the second one are ignored.
pub fn load(path: &Path) -> StoreResult<Vec<VoteRecord>> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!("No vote file at {:?}, starting with an empty store", path);
            return Ok(Vec::new());
        }
        Err(e) => return Err(e).context(ReadingFileSnafu { path }),
    };
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    let mut res: Vec<VoteRecord> = Vec::new();
    for (idx, line_r) in rdr.into_records().enumerate() {
        let line = line_r.context(ParsingRowSnafu {
            path,
            lineno: idx + 1,
        })?;
        // Blank lines are skipped by the reader, so the position is the reliable line number.
        let lineno = line
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(idx + 1);
        match (line.get(0), line.get(1)) {
            (Some(voter_id), Some(candidate)) => {
                res.push(VoteRecord::new(voter_id, candidate));
            }
            _ => {
                return MalformedRowSnafu { path, lineno }.fail();
            }
        }
    }
    debug!("load: read {} votes from {:?}", res.len(), path);
    Ok(res)
}

fn terminate_last_line(file: &mut File) -> io::Result<()> {
    if file.metadata()?.len() == 0 {
        return Ok(());
    }
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    if last[0] != b'\n' {
        debug!("terminate_last_line: adding the missing line terminator");
        // Writes go to the end of the file in append mode, whatever the read position.
        file.write_all(b"\n")?;
    }
    Ok(())
}

/// The history of votes, backed by a file.
///
/// Every mutation is written to the file before the in-memory sequence changes.
/// The store does not check that voter IDs are unique: this is the job of the session.
#[derive(Debug)]
pub struct VoteStore {
    path: PathBuf,
    records: Vec<VoteRecord>,
}

impl VoteStore {
    /// Opens the store at the given path, reading the existing votes.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<VoteStore> {
        let path = path.into();
        let records = load(&path)?;
        info!("Opened vote store {:?} with {} votes", path, records.len());
        Ok(VoteStore { path, records })
    }

    /// Opens the store, starting from an empty history if the file cannot be read.
    ///
    /// The file itself is left untouched: the next vote is appended to it.
    pub fn open_or_empty(path: impl Into<PathBuf>) -> VoteStore {
        let path = path.into();
        let records = match load(&path) {
            Ok(records) => records,
            Err(e) => {
                warn!("Ignoring unreadable vote file {:?}: {}", path, e);
                Vec::new()
            }
        };
        VoteStore { path, records }
    }

    /// Re-reads the backing file, replacing the in-memory history.
    pub fn reload(&mut self) -> StoreResult<&[VoteRecord]> {
        self.records = load(&self.path)?;
        Ok(&self.records)
    }

    /// Writes one vote at the end of the file, then adds it to the history.
    ///
    /// A file whose last line has no line terminator gets one first, so that the new row
    /// does not merge into the previous one.
    pub fn append(&mut self, record: VoteRecord) -> StoreResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .context(WritingFileSnafu { path: &self.path })?;
        terminate_last_line(&mut file).context(WritingFileSnafu { path: &self.path })?;
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        wtr.write_record([record.voter_id(), record.candidate()])
            .context(WritingRowSnafu { path: &self.path })?;
        wtr.flush().context(WritingFileSnafu { path: &self.path })?;
        debug!(
            "append: voter {} -> {} in {:?}",
            record.voter_id(),
            record.candidate(),
            self.path
        );
        self.records.push(record);
        Ok(())
    }

    /// Truncates the backing file and forgets all the votes.
    pub fn clear(&mut self) -> StoreResult<()> {
        File::create(&self.path).context(WritingFileSnafu { path: &self.path })?;
        info!(
            "Cleared vote store {:?} ({} votes removed)",
            self.path,
            self.records.len()
        );
        self.records.clear();
        Ok(())
    }

    pub fn records(&self) -> &[VoteRecord] {
        &self.records
    }

    pub fn contains_voter(&self, voter_id: &str) -> bool {
        self.records.iter().any(|r| r.voter_id() == voter_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
