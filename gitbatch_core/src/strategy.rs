//! Diff backends and the engine that dispatches to them.
//!
//! The native backend computes patches with libgit2. The legacy backend would
//! delegate to an external `git` process and is reserved but not implemented.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;

use crate::{
    index::{self, Boundary},
    patch::{format_patches, FormattedDiff},
    stash,
    tree_diff::TreeDiffer,
    walker::HistoryWalker,
    CancellationToken, Completeness, DiffConfig, Error, Repository, Result,
};

/// Text returned when the target commit has no predecessor.
pub const NO_DIFF: &str = "there is no diff";

/// Backend selected to produce patches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum DiffStrategy {
    /// Delegate to the `git` executable.
    Legacy,
    /// Compute patches in-process with libgit2.
    #[default]
    Native,
}

impl DiffStrategy {
    /// Canonical configuration name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Legacy => "legacy",
            Self::Native => "native",
        }
    }
}

impl fmt::Display for DiffStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiffStrategy {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "legacy" | "git" | "shell" => Ok(Self::Legacy),
            "native" | "go-git" | "libgit2" => Ok(Self::Native),
            other => Err(Error::configuration(format!("unknown strategy '{other}'"))),
        }
    }
}

impl TryFrom<String> for DiffStrategy {
    type Error = Error;

    fn try_from(name: String) -> Result<Self> {
        name.parse()
    }
}

/// Result of a diff request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffOutcome {
    /// The target is the oldest commit; rendered as [`NO_DIFF`].
    NoPredecessor,
    /// Patch text for the change records between the two commits.
    Patch(FormattedDiff),
}

impl DiffOutcome {
    /// Text to show in the diff view.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::NoPredecessor => NO_DIFF,
            Self::Patch(formatted) => &formatted.text,
        }
    }

    /// Completeness of the rendered patch.
    #[must_use]
    pub fn completeness(&self) -> Completeness {
        match self {
            Self::NoPredecessor => Completeness::Complete,
            Self::Patch(formatted) => formatted.completeness.clone(),
        }
    }

    /// Returns `true` when patch rendering stopped early.
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        matches!(self, Self::Patch(formatted) if formatted.is_truncated())
    }
}

impl fmt::Display for DiffOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// A way of producing commit and stash patches.
pub trait DiffBackend: Send + Sync {
    /// Strategy this backend implements.
    fn strategy(&self) -> DiffStrategy;

    /// Human-friendly label for logs and UI surfaces.
    fn label(&self) -> &'static str;

    /// Diff the commit `hash` against its predecessor.
    ///
    /// # Errors
    ///
    /// Backend-specific; see the implementations.
    fn commit_diff(
        &self,
        repository: &Repository,
        hash: &str,
        cancel: &CancellationToken,
    ) -> Result<DiffOutcome>;

    /// Diff the stash `id` against the commit it was taken on.
    ///
    /// # Errors
    ///
    /// Backend-specific; see the implementations.
    fn stash_diff(
        &self,
        repository: &Repository,
        id: usize,
        cancel: &CancellationToken,
    ) -> Result<DiffOutcome>;
}

/// libgit2-backed diffs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeBackend {
    differ: TreeDiffer,
}

impl NativeBackend {
    /// Build a backend from configuration.
    #[must_use]
    pub const fn new(config: &DiffConfig) -> Self {
        Self {
            differ: TreeDiffer::new(config),
        }
    }
}

impl DiffBackend for NativeBackend {
    fn strategy(&self) -> DiffStrategy {
        DiffStrategy::Native
    }

    fn label(&self) -> &'static str {
        "libgit2"
    }

    /// Locates `hash` in the loaded history, then walks two commits from the
    /// repository state and diffs them.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CommitNotFound`] for an unknown hash, history and tree
    /// errors from the walk and comparison, and [`Error::Cancelled`] when
    /// `cancel` fires. Rendering failures truncate the text instead.
    #[tracing::instrument(skip(self, repository, cancel))]
    fn commit_diff(
        &self,
        repository: &Repository,
        hash: &str,
        cancel: &CancellationToken,
    ) -> Result<DiffOutcome> {
        if index::locate(repository.commits(), hash)? == Boundary::Oldest {
            return Ok(DiffOutcome::NoPredecessor);
        }

        let mut walker = HistoryWalker::from_state(repository, cancel.clone())?;
        let current = walker.next_commit()?;
        let previous = walker.next_commit()?;
        tracing::debug!(current = %current.id(), previous = %previous.id(), "paired commits");

        cancel.check()?;
        let changes = self
            .differ
            .diff_commits(repository.git(), &previous, &current)?;
        Ok(DiffOutcome::Patch(format_patches(changes.changes())))
    }

    #[tracing::instrument(skip(self, repository, cancel))]
    fn stash_diff(
        &self,
        repository: &Repository,
        id: usize,
        cancel: &CancellationToken,
    ) -> Result<DiffOutcome> {
        stash::stash_diff(repository, id, &self.differ, cancel).map(DiffOutcome::Patch)
    }
}

/// Shell-delegated diffs. Reserved; every call fails with [`Error::Unimplemented`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellBackend;

impl DiffBackend for ShellBackend {
    fn strategy(&self) -> DiffStrategy {
        DiffStrategy::Legacy
    }

    fn label(&self) -> &'static str {
        "git executable"
    }

    fn commit_diff(
        &self,
        _repository: &Repository,
        _hash: &str,
        _cancel: &CancellationToken,
    ) -> Result<DiffOutcome> {
        Err(Error::Unimplemented("shell diff backend"))
    }

    fn stash_diff(
        &self,
        _repository: &Repository,
        _id: usize,
        _cancel: &CancellationToken,
    ) -> Result<DiffOutcome> {
        Err(Error::Unimplemented("shell diff backend"))
    }
}

/// In-memory registry of diff backends keyed by strategy.
#[derive(Default)]
pub struct BackendRegistry {
    backends: HashMap<DiffStrategy, Box<dyn DiffBackend>>,
}

impl BackendRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a backend keyed by [`DiffBackend::strategy`], replacing any
    /// previous backend for that strategy.
    pub fn register<B>(&mut self, backend: B)
    where
        B: DiffBackend + 'static,
    {
        self.backends.insert(backend.strategy(), Box::new(backend));
    }

    /// Retrieve the backend for `strategy`.
    #[must_use]
    pub fn get(&self, strategy: DiffStrategy) -> Option<&dyn DiffBackend> {
        self.backends.get(&strategy).map(|backend| backend.as_ref())
    }
}

impl fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<_> = self
            .backends
            .values()
            .map(|backend| (backend.strategy(), backend.label()))
            .collect();
        f.debug_struct("BackendRegistry")
            .field("backends", &labels)
            .finish()
    }
}

/// Registry holding the native and shell backends.
#[must_use]
pub fn default_registry(config: &DiffConfig) -> BackendRegistry {
    let mut registry = BackendRegistry::new();
    registry.register(NativeBackend::new(config));
    registry.register(ShellBackend);
    registry
}

/// Entry point used by the commit and stash diff views.
#[derive(Debug, Clone)]
pub struct DiffEngine {
    config: DiffConfig,
    registry: Arc<BackendRegistry>,
}

impl Default for DiffEngine {
    fn default() -> Self {
        Self::new(DiffConfig::default())
    }
}

impl DiffEngine {
    /// Engine with the default backends for `config`.
    #[must_use]
    pub fn new(config: DiffConfig) -> Self {
        let registry = default_registry(&config);
        Self::with_registry(config, registry)
    }

    /// Engine dispatching through a custom registry.
    #[must_use]
    pub fn with_registry(config: DiffConfig, registry: BackendRegistry) -> Self {
        Self {
            config,
            registry: Arc::new(registry),
        }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &DiffConfig {
        &self.config
    }

    /// Diff commit `hash` against its predecessor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when no backend handles the configured
    /// strategy, otherwise whatever the backend reports.
    pub fn diff(&self, repository: &Repository, hash: &str) -> Result<DiffOutcome> {
        self.diff_with_cancel(repository, hash, &CancellationToken::new())
    }

    /// Like [`DiffEngine::diff`], aborting once `cancel` fires.
    ///
    /// # Errors
    ///
    /// See [`DiffEngine::diff`].
    pub fn diff_with_cancel(
        &self,
        repository: &Repository,
        hash: &str,
        cancel: &CancellationToken,
    ) -> Result<DiffOutcome> {
        self.backend()?.commit_diff(repository, hash, cancel)
    }

    /// Diff stash `id` against the commit it was taken on.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when no backend handles the configured
    /// strategy, otherwise whatever the backend reports.
    pub fn stash_diff(
        &self,
        repository: &Repository,
        id: usize,
        cancel: &CancellationToken,
    ) -> Result<DiffOutcome> {
        self.backend()?.stash_diff(repository, id, cancel)
    }

    fn backend(&self) -> Result<&dyn DiffBackend> {
        let strategy = self.config.strategy;
        self.registry.get(strategy).ok_or_else(|| {
            Error::configuration(format!("no backend registered for strategy '{strategy}'"))
        })
    }
}
