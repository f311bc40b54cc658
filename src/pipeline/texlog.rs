//! Engine log inspection.

use crate::config::LogSignatures;
use std::path::Path;

/// Log name TeX uses when it never learned the job name.
pub const FALLBACK_LOG: &str = "texput.log";

/// Text of an engine log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TexLog {
    text: String,
}

impl TexLog {
    /// Wrap log text.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Read `<stem>.log` from `dir`, falling back to `texput.log`.
    ///
    /// A missing log yields an empty one. Logs are not always UTF-8, so
    /// invalid sequences are replaced.
    pub fn read(dir: &Path, stem: &str) -> Self {
        for name in [format!("{}.log", stem), FALLBACK_LOG.to_string()] {
            match std::fs::read(dir.join(&name)) {
                Ok(bytes) => return Self::new(String::from_utf8_lossy(&bytes).into_owned()),
                Err(e) => log::debug!("no log {}: {}", name, e),
            }
        }
        log::warn!("engine wrote no log in {}", dir.display());
        Self::default()
    }

    /// Raw log text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Check whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Whether the log asks for another pass.
    pub fn needs_rerun(&self, signatures: &LogSignatures) -> bool {
        signatures.needs_rerun(&self.text)
    }

    /// Whether the log shows the standalone/LuaTeX compatibility failure.
    pub fn is_compat_failure(&self, signatures: &LogSignatures) -> bool {
        signatures.is_compat_failure(&self.text)
    }

    /// The first error block: from the first line starting with `!` up to
    /// the next blank line or `?` prompt.
    pub fn error_block(&self) -> Option<String> {
        let mut lines = self.text.lines().skip_while(|line| !line.starts_with('!'));
        let first = lines.next()?;

        let mut block = vec![first];
        block.extend(
            lines.take_while(|line| !line.trim().is_empty() && !line.starts_with('?')),
        );
        Some(block.join("\n"))
    }

    /// Error block, or a generic message naming the log's tail.
    pub fn failure_message(&self) -> String {
        if let Some(block) = self.error_block() {
            return block;
        }
        if self.is_empty() {
            return "no log was written".to_string();
        }
        let tail: Vec<&str> = self.text.lines().rev().take(5).collect();
        let tail: Vec<&str> = tail.into_iter().rev().collect();
        format!("no error marker in log; last lines:\n{}", tail.join("\n"))
    }
}
