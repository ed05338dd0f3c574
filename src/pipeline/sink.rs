use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::render::AssembledDocuments;
use crate::types::Result;

pub const WORKSHEET_FILE: &str = "worksheet.html";
pub const ANSWER_KEY_FILE: &str = "answer_key.html";
pub const LESSON_PLAN_FILE: &str = "lesson_plan.html";

/// Destination for rendered documents
pub trait ArtifactSink: Send + Sync {
    fn save(&self, name: &str, html: &str) -> Result<PathBuf>;

    /// Save every non-empty document; returns the written paths
    fn save_documents(&self, documents: &AssembledDocuments) -> Result<Vec<PathBuf>> {
        [
            (WORKSHEET_FILE, &documents.worksheet_html),
            (ANSWER_KEY_FILE, &documents.answer_key_html),
            (LESSON_PLAN_FILE, &documents.lesson_plan_html),
        ]
        .into_iter()
        .filter(|(_, html)| !html.is_empty())
        .map(|(name, html)| self.save(name, html))
        .collect()
    }
}

/// Writes documents as files under one directory
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ArtifactSink for DirectorySink {
    fn save(&self, name: &str, html: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(name);
        fs::write(&path, html)?;
        debug!("Wrote {} ({} bytes)", path.display(), html.len());
        Ok(path)
    }
}
