//! Core library for gitbatch's commit and stash diff views.
//!
//! The crate is layered around the diff pipeline:
//! - repository access and history loading
//! - locating a commit and walking to its predecessor
//! - tree comparison and patch rendering
//! - backend selection and stash diffs for UI collaborators

#![warn(
    clippy::all,
    clippy::cargo,
    clippy::nursery,
    clippy::pedantic,
    missing_docs
)]
#![cfg_attr(
    not(test),
    deny(
        clippy::dbg_macro,
        clippy::expect_used,
        clippy::panic,
        clippy::print_stderr,
        clippy::print_stdout,
        clippy::todo,
        clippy::unwrap_used
    )
)]

/// Cancellation and superseding of in-flight diff requests.
pub mod cancel;
/// Diff configuration loaded from TOML.
pub mod config;
/// Commit lookup over loaded history.
pub mod index;
/// Tracing subscriber setup for binaries.
pub mod logging;
/// Patch rendering with best-effort truncation.
pub mod patch;
/// Git repository access and history loading.
pub mod repository;
/// Stash diffs and the stash browser model.
pub mod stash;
/// Diff backends and strategy dispatch.
pub mod strategy;
/// Tree-to-tree comparison.
pub mod tree_diff;
/// Committer-time history walk from the repository state.
pub mod walker;

pub use gitbatch_api as api;
pub use gitbatch_api::{
    ChangeKind, ChangeRecord, CommitSummary, Completeness, RepositoryState, Signature,
    StashEntry,
};

pub use cancel::{CancellationToken, DiffRequests, DiffTicket};
pub use config::DiffConfig;
pub use patch::FormattedDiff;
pub use repository::Repository;
pub use strategy::{DiffEngine, DiffOutcome, DiffStrategy, NO_DIFF};

/// Common result type for the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Diff a commit against its predecessor using the default configuration.
///
/// # Errors
///
/// See [`DiffEngine::diff`].
pub fn diff(repository: &Repository, hash: &str) -> Result<DiffOutcome> {
    DiffEngine::default().diff(repository, hash)
}

/// Broad classification of [`Error`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unknown or unsupported diff strategy, or an unreadable configuration.
    Configuration,
    /// The selected backend has no implementation.
    NotImplemented,
    /// The repository, a commit, or a stash could not be located.
    Repository,
    /// Walking or re-deriving the current/previous commit failed.
    HistoryResolution,
    /// A commit's tree could not be materialized.
    TreeResolution,
    /// The tree-to-tree comparison failed.
    DiffComputation,
    /// The request was cancelled by the caller.
    Cancelled,
    /// Filesystem interaction failed.
    Io,
}

/// Errors surfaced by the core library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Backend exists but does not perform any work yet.
    #[error("operation not yet implemented: {0}")]
    Unimplemented(&'static str),
    /// Diff strategy or configuration value is not handled.
    #[error("unhandled diff operation: {message}")]
    Configuration {
        /// Description of the rejected value.
        message: String,
    },
    /// Configuration file could not be parsed.
    #[error("invalid configuration in {path}: {source}")]
    ConfigFile {
        /// Path of the configuration file.
        path: String,
        /// Parse error reported by the TOML decoder.
        #[source]
        source: toml::de::Error,
    },
    /// Underlying git operation failed.
    #[error("git error: {source}")]
    Git {
        /// Original libgit2 error bubbled up by the core library.
        #[from]
        source: git2::Error,
    },
    /// Provided path does not correspond to a git repository.
    #[error("path does not reference a git repository: {path}")]
    NotARepository {
        /// Path that failed to resolve to a repository.
        path: String,
    },
    /// Bare repositories are currently unsupported.
    #[error("repository at {path} is bare and unsupported")]
    BareRepository {
        /// Path of the repository lacking a working tree.
        path: String,
    },
    /// Repository has no commit to walk from.
    #[error("repository has no head revision to diff")]
    MissingHeadRevision,
    /// Requested commit is not part of the loaded history.
    #[error("commit {oid} is not part of the loaded history")]
    CommitNotFound {
        /// Identifier that was looked up.
        oid: String,
    },
    /// Requested stash does not exist.
    #[error("stash@{{{id}}} does not exist")]
    StashNotFound {
        /// Stash position that was looked up.
        id: usize,
    },
    /// History walk ended before the required commits were produced.
    #[error("history starting at {from} ended before a previous commit was found")]
    HistoryExhausted {
        /// Commit the walk started from.
        from: String,
    },
    /// History walk failed inside libgit2.
    #[error("failed to walk history from {from}: {source}")]
    HistoryResolution {
        /// Commit the walk started from.
        from: String,
        /// Original libgit2 error.
        #[source]
        source: git2::Error,
    },
    /// A commit's tree could not be materialized.
    #[error("failed to resolve tree of commit {oid}: {source}")]
    TreeResolution {
        /// Commit whose tree was requested.
        oid: String,
        /// Original libgit2 error.
        #[source]
        source: git2::Error,
    },
    /// Comparing two trees failed.
    #[error("failed to compare trees: {source}")]
    DiffComputation {
        /// Original libgit2 error.
        #[source]
        source: git2::Error,
    },
    /// Caller cancelled the request.
    #[error("diff request was cancelled")]
    Cancelled,
    /// Filesystem interaction failed.
    #[error("failed to access {path}: {source}")]
    Io {
        /// Filesystem path involved in the failed operation.
        path: String,
        /// Source I/O error returned by the standard library.
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Classify the error for callers that branch on failure type.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration { .. } | Self::ConfigFile { .. } => ErrorKind::Configuration,
            Self::Unimplemented(_) => ErrorKind::NotImplemented,
            Self::Git { .. }
            | Self::NotARepository { .. }
            | Self::BareRepository { .. }
            | Self::MissingHeadRevision
            | Self::CommitNotFound { .. }
            | Self::StashNotFound { .. } => ErrorKind::Repository,
            Self::HistoryExhausted { .. } | Self::HistoryResolution { .. } => {
                ErrorKind::HistoryResolution
            }
            Self::TreeResolution { .. } => ErrorKind::TreeResolution,
            Self::DiffComputation { .. } => ErrorKind::DiffComputation,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Io { .. } => ErrorKind::Io,
        }
    }

    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}
