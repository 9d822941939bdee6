//! Committer-time history walk starting from the repository state.
//!
//! The walk reads the store fresh instead of slicing the loaded commit list,
//! so the commits it yields are adjacent in the store's own ordering even if
//! the loaded history is stale.

use git2::{Oid, Repository as GitRepository, Revwalk, Sort};

use crate::{CancellationToken, Error, Repository, Result};

/// Lazy, restartable walk over commits in descending committer time.
pub struct HistoryWalker<'repo> {
    repo: &'repo GitRepository,
    origin: Oid,
    walk: Revwalk<'repo>,
    cancel: CancellationToken,
}

impl<'repo> HistoryWalker<'repo> {
    /// Walk from the commit the repository state points at.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingHeadRevision`] when the repository has no state
    /// and [`Error::HistoryResolution`] when the walk cannot be set up.
    pub fn from_state(repository: &'repo Repository, cancel: CancellationToken) -> Result<Self> {
        let state = repository.state().ok_or(Error::MissingHeadRevision)?;
        let origin = Oid::from_str(&state.commit.oid).map_err(|source| {
            Error::HistoryResolution {
                from: state.commit.oid.clone(),
                source,
            }
        })?;
        Self::new(repository.git(), origin, cancel)
    }

    /// Walk from an explicit commit.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HistoryResolution`] when the walk cannot be set up.
    pub fn new(repo: &'repo GitRepository, origin: Oid, cancel: CancellationToken) -> Result<Self> {
        let walk = start_walk(repo, origin)?;
        Ok(Self {
            repo,
            origin,
            walk,
            cancel,
        })
    }

    /// Commit the walk starts from.
    #[must_use]
    pub const fn origin(&self) -> Oid {
        self.origin
    }

    /// Rewind to the origin, re-reading the store.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HistoryResolution`] when the walk cannot be set up.
    pub fn restart(&mut self) -> Result<()> {
        self.walk = start_walk(self.repo, self.origin)?;
        Ok(())
    }

    /// Pull the next commit, treating the end of history as an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HistoryExhausted`] at the end of the walk, or any
    /// error yielded by the iterator.
    pub fn next_commit(&mut self) -> Result<git2::Commit<'repo>> {
        self.next().unwrap_or_else(|| {
            Err(Error::HistoryExhausted {
                from: self.origin.to_string(),
            })
        })
    }

    fn resolution_error(&self, source: git2::Error) -> Error {
        Error::HistoryResolution {
            from: self.origin.to_string(),
            source,
        }
    }
}

impl<'repo> Iterator for HistoryWalker<'repo> {
    type Item = Result<git2::Commit<'repo>>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Err(err) = self.cancel.check() {
            return Some(Err(err));
        }

        let oid = match self.walk.next()? {
            Ok(oid) => oid,
            Err(source) => return Some(Err(self.resolution_error(source))),
        };

        let commit = self
            .repo
            .find_commit(oid)
            .map_err(|source| self.resolution_error(source));
        if let Ok(commit) = &commit {
            tracing::trace!(oid = %commit.id(), "walked commit");
        }
        Some(commit)
    }
}

fn start_walk(repo: &GitRepository, origin: Oid) -> Result<Revwalk<'_>> {
    configure_walk(repo, origin).map_err(|source| Error::HistoryResolution {
        from: origin.to_string(),
        source,
    })
}

fn configure_walk(
    repo: &GitRepository,
    origin: Oid,
) -> std::result::Result<Revwalk<'_>, git2::Error> {
    let mut walk = repo.revwalk()?;
    walk.set_sorting(Sort::TIME)?;
    walk.push(origin)?;
    Ok(walk)
}

impl std::fmt::Debug for HistoryWalker<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryWalker")
            .field("origin", &self.origin)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}
