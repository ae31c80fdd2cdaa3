//! Live data file writer.
//!
//! Every generated message is appended as one JSON line. The file is opened
//! in append mode for each write, so a consumer tailing it only ever sees
//! whole lines plus, at worst, one trailing partial line.

use std::fs::{create_dir_all, remove_file, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::Result;
use crate::models::RawMessage;

/// Appends messages to the live data file
#[derive(Debug, Clone)]
pub struct LogWriter {
    path: PathBuf,
}

impl LogWriter {
    /// Create parent directories and, when `reset` is set, delete an existing file
    ///
    /// # Errors
    ///
    /// Returns an error if the directories cannot be created or the old file
    /// cannot be removed.
    pub fn prepare(path: impl Into<PathBuf>, reset: bool) -> Result<Self> {
        let path = path.into();

        if reset && path.exists() {
            remove_file(&path)?;
            info!(path = %path.display(), "Deleted existing live data file");
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            create_dir_all(parent)?;
        }

        Ok(Self { path })
    }

    /// Append one already-serialized line
    pub fn append_line(&self, line: &str) -> Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    /// Serialize and append one message
    pub fn append(&self, message: &RawMessage) -> Result<()> {
        self.append_line(&message.to_json_line()?)
    }

    /// File being appended to
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;

    #[test]
    fn test_prepare_resets_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("live.jsonl");

        let writer = LogWriter::prepare(&path, false).unwrap();
        writer.append(&RawMessage::new("Bob", Category::Sledding, "fun")).unwrap();
        assert!(path.exists());

        let writer = LogWriter::prepare(&path, true).unwrap();
        assert!(!path.exists());
        writer.append_line("{}").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}\n");
    }
}
