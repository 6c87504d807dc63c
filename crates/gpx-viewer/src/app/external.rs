//! Launching external GPS editors on the current trace

use std::path::Path;
use std::process::{Command, ExitStatus};
use std::thread::JoinHandle;

/// An editor offered in the "Open With" menu
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExternalEditor {
    pub label: &'static str,
    pub program: &'static str,
}

pub const EXTERNAL_EDITORS: &[ExternalEditor] = &[
    ExternalEditor {
        label: "JOSM Editor",
        program: "josm",
    },
    ExternalEditor {
        label: "Merkaartor",
        program: "merkaartor",
    },
];

impl ExternalEditor {
    /// Start the editor on `path` without waiting for it
    ///
    /// The child is reaped on a detached thread, whose handle yields the
    /// exit status.
    pub fn spawn(&self, path: &Path) -> std::io::Result<JoinHandle<Option<ExitStatus>>> {
        let mut child = Command::new(self.program).arg(path).spawn()?;
        let program = self.program;
        Ok(std::thread::spawn(move || match child.wait() {
            Ok(status) => {
                tracing::debug!("{} exited with {}", program, status);
                Some(status)
            }
            Err(e) => {
                tracing::warn!("Could not wait for {}: {}", program, e);
                None
            }
        }))
    }

    /// Like [`ExternalEditor::spawn`], but failures are only logged
    pub fn open(&self, path: &Path) {
        match self.spawn(path) {
            Ok(_) => tracing::info!("Opened {} with {}", path.display(), self.program),
            Err(e) => tracing::warn!("Could not launch {}: {}", self.program, e),
        }
    }
}
