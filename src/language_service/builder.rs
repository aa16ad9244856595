//! Index builder contract
//!
//! An [`IndexBuilder`] turns a file's source text into a [`SymbolSummary`].
//! The service seals the summary into an immutable entry and publishes it.

use thiserror::Error;

use crate::symbol_index::{FileId, SymbolSummary};

/// Why a build did not produce a clean summary
#[derive(Debug, Error)]
pub enum BuildError {
    /// The source has syntax errors. `partial` holds whatever names could be
    /// recovered around them.
    #[error("syntax error in {file}: {message}")]
    Syntax {
        file: FileId,
        message: String,
        partial: SymbolSummary,
    },
    #[error("no index builder for {0}")]
    Unsupported(FileId),
    #[error("parser failure: {0}")]
    Parser(String),
}

impl BuildError {
    /// Best-effort summary recovered before the failure, if any
    pub fn partial(&self) -> Option<&SymbolSummary> {
        match self {
            BuildError::Syntax { partial, .. } => Some(partial),
            BuildError::Unsupported(_) | BuildError::Parser(_) => None,
        }
    }
}

/// Derives a file's symbol summary from its text.
///
/// Implementations may be slow (they parse); they are always called outside
/// any index lock and may run on several threads at once.
pub trait IndexBuilder: Send + Sync {
    fn build(&self, file: &FileId, source: &str) -> Result<SymbolSummary, BuildError>;

    /// Whether this builder understands `file`
    fn supports(&self, file: &FileId) -> bool {
        let _ = file;
        true
    }
}

impl<F> IndexBuilder for F
where
    F: Fn(&FileId, &str) -> Result<SymbolSummary, BuildError> + Send + Sync,
{
    fn build(&self, file: &FileId, source: &str) -> Result<SymbolSummary, BuildError> {
        self(file, source)
    }
}
