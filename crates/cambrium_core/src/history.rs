//! Append-only persistence of mutation events.
//!
//! Each line of the log is one JSON object: the event plus the wall-clock
//! time it was written. The digest covers the events only, so it is stable
//! across re-recordings of the same history.

use anyhow::Result;
use cambrium_data::MutationEvent;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LoggedMutation {
    #[serde(flatten)]
    pub event: MutationEvent,
    pub recorded_at: String,
}

pub struct MutationLog {
    path: PathBuf,
}

impl MutationLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, events: &[MutationEvent]) -> Result<()> {
        if events.is_empty() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = BufWriter::new(file);
        let recorded_at = chrono::Utc::now().to_rfc3339();
        for event in events {
            let entry = LoggedMutation {
                event: event.clone(),
                recorded_at: recorded_at.clone(),
            };
            writeln!(writer, "{}", serde_json::to_string(&entry)?)?;
        }
        writer.flush()?;
        tracing::debug!(path = %self.path.display(), count = events.len(), "Appended mutations");
        Ok(())
    }

    /// Reads every entry; a missing file is an empty history. Lines that do
    /// not parse are skipped with a warning.
    pub fn load(&self) -> Result<Vec<LoggedMutation>> {
        Ok(self.read_entries()?.0)
    }

    fn read_entries(&self) -> Result<(Vec<LoggedMutation>, usize)> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok((vec![], 0)),
            Err(e) => return Err(e.into()),
        };
        let reader = BufReader::new(file);
        let mut entries = Vec::new();
        let mut skipped = 0;
        for (number, line) in reader.lines().enumerate() {
            let line = line?;
            match serde_json::from_str::<LoggedMutation>(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    skipped += 1;
                    tracing::warn!(
                        path = %self.path.display(),
                        line = number + 1,
                        error = %e,
                        "Skipping unreadable mutation log line"
                    );
                }
            }
        }
        Ok((entries, skipped))
    }

    pub fn events(&self) -> Result<Vec<MutationEvent>> {
        Ok(self.load()?.into_iter().map(|e| e.event).collect())
    }

    pub fn digest(&self) -> Result<String> {
        compute_digest(&self.events()?)
    }

    /// A log with unreadable lines never verifies, whatever its digest.
    pub fn verify(&self, expected: &str) -> Result<bool> {
        let (entries, skipped) = self.read_entries()?;
        if skipped > 0 {
            return Ok(false);
        }
        let events: Vec<MutationEvent> = entries.into_iter().map(|e| e.event).collect();
        Ok(compute_digest(&events)?.eq_ignore_ascii_case(expected.trim()))
    }
}

/// SHA-256 over the JSON encoding of `events`, hex encoded.
pub fn compute_digest(events: &[MutationEvent]) -> Result<String> {
    let json = serde_json::to_string(events)?;
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}
