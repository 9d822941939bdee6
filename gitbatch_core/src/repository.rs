//! Repository access and history loading built on top of libgit2.

use std::fmt;
use std::path::{Path, PathBuf};

use git2::{ErrorClass, ErrorCode, Oid, Repository as GitRepository, Sort};

use crate::{
    index::index_of, CommitSummary, Error, RepositoryState, Result, Signature, StashEntry,
};

/// Handle to a repository together with the history gitbatch has loaded.
///
/// The loaded commits, state and stashes are replaced wholesale by
/// [`Repository::refresh`]; the diff pipeline only ever borrows them.
pub struct Repository {
    inner: GitRepository,
    root: PathBuf,
    commits: Vec<CommitSummary>,
    state: Option<RepositoryState>,
    stashes: Vec<StashEntry>,
}

impl Repository {
    /// Open a repository from the given filesystem path and load its history.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be canonicalized, does not resolve
    /// to a git repository, is a bare repository, or if loading history fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let original = path.as_ref();
        let canonical = std::fs::canonicalize(original).map_err(|source| Error::Io {
            path: display_path(original),
            source,
        })?;

        let repo = match GitRepository::discover(&canonical) {
            Ok(repo) => repo,
            Err(err)
                if err.class() == ErrorClass::Repository && err.code() == ErrorCode::NotFound =>
            {
                return Err(Error::NotARepository {
                    path: display_path(&canonical),
                })
            }
            Err(err) => return Err(Error::from(err)),
        };

        let root = repo
            .workdir()
            .map(Path::to_path_buf)
            .ok_or_else(|| Error::BareRepository {
                path: display_path(&canonical),
            })?;

        let mut repository = Self {
            inner: repo,
            root,
            commits: Vec::new(),
            state: None,
            stashes: Vec::new(),
        };
        repository.refresh()?;
        Ok(repository)
    }

    /// Reload commits, state and stashes from the store.
    ///
    /// # Errors
    ///
    /// Propagates libgit2 failures while walking history or listing stashes.
    #[tracing::instrument(skip(self), fields(root = %self.root.display()))]
    pub fn refresh(&mut self) -> Result<()> {
        let head = self.head_commit()?;
        let commits = match &head {
            Some((_, oid)) => self.load_history(*oid)?,
            None => Vec::new(),
        };

        let state = match head {
            Some((branch, oid)) => {
                let commit = self.inner.find_commit(oid)?;
                Some(RepositoryState {
                    branch,
                    commit: commit_summary(&commit),
                })
            }
            None => None,
        };

        let stashes = self.load_stashes()?;
        tracing::debug!(
            commits = commits.len(),
            stashes = stashes.len(),
            "repository refreshed"
        );

        self.commits = commits;
        self.state = state;
        self.stashes = stashes;
        Ok(())
    }

    /// Point the repository state at another loaded commit.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CommitNotFound`] if `oid` is not in the loaded history.
    pub fn select_commit(&mut self, oid: &str) -> Result<()> {
        let position = index_of(&self.commits, oid)?;
        let commit = self.commits[position].clone();
        let branch = self.state.as_ref().and_then(|state| state.branch.clone());
        self.state = Some(RepositoryState { branch, commit });
        Ok(())
    }

    /// Returns the absolute path to the repository root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Loaded history, most recent first.
    #[must_use]
    pub fn commits(&self) -> &[CommitSummary] {
        &self.commits
    }

    /// Commit the repository currently points at, if any.
    #[must_use]
    pub const fn state(&self) -> Option<&RepositoryState> {
        self.state.as_ref()
    }

    /// Loaded stash entries, most recent first.
    #[must_use]
    pub fn stashes(&self) -> &[StashEntry] {
        &self.stashes
    }

    pub(crate) const fn git(&self) -> &GitRepository {
        &self.inner
    }

    fn load_history(&self, from: Oid) -> Result<Vec<CommitSummary>> {
        let mut walk = self.inner.revwalk()?;
        walk.set_sorting(Sort::TIME)?;
        walk.push(from)?;

        walk.map(|oid| -> Result<CommitSummary> {
            let commit = self.inner.find_commit(oid?)?;
            Ok(commit_summary(&commit))
        })
        .collect()
    }

    fn load_stashes(&mut self) -> Result<Vec<StashEntry>> {
        let mut stashes = Vec::new();
        let result = self.inner.stash_foreach(|index, message, oid| {
            stashes.push(StashEntry::from_message(index, message, oid.to_string()));
            true
        });

        match result {
            Ok(()) => Ok(stashes),
            Err(err) if err.code() == ErrorCode::NotFound => Ok(Vec::new()),
            Err(err) => Err(Error::from(err)),
        }
    }

    fn head_commit(&self) -> Result<Option<(Option<String>, Oid)>> {
        let head = match self.inner.head() {
            Ok(head) => head,
            Err(err)
                if matches!(
                    (err.class(), err.code()),
                    (
                        ErrorClass::Reference,
                        ErrorCode::NotFound | ErrorCode::UnbornBranch
                    )
                ) =>
            {
                return Ok(None)
            }
            Err(err) => return Err(Error::from(err)),
        };

        let branch = if head.is_branch() {
            head.shorthand().map(str::to_owned)
        } else {
            None
        };

        let commit = head.resolve()?.peel_to_commit()?;
        Ok(Some((branch, commit.id())))
    }
}

pub(crate) fn commit_summary(commit: &git2::Commit<'_>) -> CommitSummary {
    CommitSummary {
        oid: commit.id().to_string(),
        summary: commit.summary().map(str::to_owned),
        author: convert_signature(&commit.author()),
        committer: convert_signature(&commit.committer()),
        committer_time: commit.committer().when().seconds(),
    }
}

fn convert_signature(signature: &git2::Signature<'_>) -> Option<Signature> {
    signature.name().map(|name| Signature {
        name: name.to_owned(),
        email: signature.email().map(str::to_owned),
    })
}

fn display_path(path: &Path) -> String {
    path.to_path_buf()
        .into_os_string()
        .to_string_lossy()
        .into_owned()
}

impl fmt::Debug for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("root", &self.root)
            .field("commits", &self.commits.len())
            .field("stashes", &self.stashes.len())
            .finish_non_exhaustive()
    }
}
