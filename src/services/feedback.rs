//! Append-only CSV log of user feedback.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use crate::error::FeedbackError;
use crate::models::FeedbackRecord;

#[derive(Debug, Clone)]
pub struct FeedbackLog {
    path: PathBuf,
}

impl FeedbackLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record; the header row is written only into a new or empty file.
    pub fn append(&self, record: &FeedbackRecord) -> Result<(), FeedbackError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let needs_header = std::fs::metadata(&self.path).map_or(true, |m| m.len() == 0);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(record)?;
        writer.flush()?;

        tracing::info!("Feedback recorded in {}", self.path.display());
        Ok(())
    }
}
