//! Backend commands queued from UI to backend worker.

use std::path::PathBuf;

pub enum BackendCommand {
    SelectFile { path: PathBuf },
    Regenerate,
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SelectFile { .. } => "select_file",
            Self::Regenerate => "regenerate",
        }
    }
}
