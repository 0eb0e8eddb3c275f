//! Append-only JSON-lines contribution log.
//!
//! Each line of the file is one serialized [`Contribution`]:
//!
//! ```text
//! {"id":1,"war_id":1,"user_id":7,"side":"attacker","damage":1043,"round":1,"recorded_at":...}
//! {"id":2,"war_id":1,"user_id":9,"side":"defender","damage":987,"round":1,"recorded_at":...}
//! ```

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use war_core::{Contribution, WarId};

use super::{ContributionRepository, RepositoryError, Result};

/// File-backed contribution log. Appends are serialized through a mutex and
/// flushed per entry, so a crash loses at most the entry being written.
pub struct FileContributionLog {
    path: PathBuf,
    writer: Mutex<LogWriter>,
}

struct LogWriter {
    inner: BufWriter<File>,
    entries: usize,
}

impl FileContributionLog {
    /// Opens `path` for appending, creating it (and its parent directory)
    /// if needed. Existing entries are counted and kept.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let entries = if path.exists() {
            count_lines(&path)?
        } else {
            0
        };

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        tracing::debug!(path = %path.display(), entries, "opened contribution log");

        Ok(Self {
            path,
            writer: Mutex::new(LogWriter {
                inner: BufWriter::new(file),
                entries,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every entry back from disk.
    pub fn read_all(&self) -> Result<Vec<Contribution>> {
        self.flush()?;
        let reader = BufReader::new(File::open(&self.path)?);
        let mut entries = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let entry = serde_json::from_str(&line).map_err(|err| {
                RepositoryError::CorruptedData {
                    line: index + 1,
                    reason: err.to_string(),
                }
            })?;
            entries.push(entry);
        }
        Ok(entries)
    }
}

impl ContributionRepository for FileContributionLog {
    fn append(&self, contribution: &Contribution) -> Result<()> {
        let line = serde_json::to_string(contribution)?;
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        writeln!(writer.inner, "{line}")?;
        writer.inner.flush()?;
        writer.entries += 1;
        Ok(())
    }

    fn load_war(&self, war: WarId) -> Result<Vec<Contribution>> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|entry| entry.war_id == war)
            .collect())
    }

    fn len(&self) -> Result<usize> {
        let writer = self
            .writer
            .lock()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(writer.entries)
    }

    fn flush(&self) -> Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        writer.inner.flush()?;
        Ok(())
    }
}

fn count_lines(path: &Path) -> Result<usize> {
    let reader = BufReader::new(File::open(path)?);
    let mut count = 0;
    for line in reader.lines() {
        if !line?.trim().is_empty() {
            count += 1;
        }
    }
    Ok(count)
}
