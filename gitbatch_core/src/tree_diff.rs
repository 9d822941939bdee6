//! Tree-to-tree comparison producing ordered change records.
//!
//! Records come out in libgit2's tree-walk order: entries sorted byte-wise by
//! name, with a directory's contents visited at the position of the directory
//! entry. The formatter preserves that order.

use git2::{Delta, DiffDelta, DiffFindOptions, DiffOptions, Repository as GitRepository};

use crate::{
    patch::{PatchError, RenderPatch},
    ChangeKind, ChangeRecord, DiffConfig, Error, Result,
};

/// Compares two trees with the configured context and rename settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeDiffer {
    context_lines: u32,
    detect_renames: bool,
}

impl Default for TreeDiffer {
    fn default() -> Self {
        Self::new(&DiffConfig::default())
    }
}

impl TreeDiffer {
    /// Build a differ from configuration.
    #[must_use]
    pub const fn new(config: &DiffConfig) -> Self {
        Self {
            context_lines: config.context_lines,
            detect_renames: config.detect_renames,
        }
    }

    /// Diff the trees of two commits, oriented `previous` -> `current`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TreeResolution`] if either tree cannot be read and
    /// [`Error::DiffComputation`] if the comparison fails.
    pub fn diff_commits<'repo>(
        &self,
        repo: &'repo GitRepository,
        previous: &git2::Commit<'_>,
        current: &git2::Commit<'_>,
    ) -> Result<ChangeSet<'repo>> {
        let previous_tree = commit_tree(previous)?;
        let current_tree = commit_tree(current)?;
        self.diff(repo, &previous_tree, &current_tree)
    }

    /// Diff two trees, oriented `previous` -> `current`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DiffComputation`] if libgit2 fails to compare the trees.
    pub fn diff<'repo>(
        &self,
        repo: &'repo GitRepository,
        previous: &git2::Tree<'_>,
        current: &git2::Tree<'_>,
    ) -> Result<ChangeSet<'repo>> {
        let mut opts = DiffOptions::new();
        opts.context_lines(self.context_lines);

        let mut diff = repo
            .diff_tree_to_tree(Some(previous), Some(current), Some(&mut opts))
            .map_err(|source| Error::DiffComputation { source })?;

        if self.detect_renames {
            let mut find = DiffFindOptions::new();
            find.renames(true).copies(true);
            diff.find_similar(Some(&mut find))
                .map_err(|source| Error::DiffComputation { source })?;
        }

        let records: Vec<_> = diff
            .deltas()
            .enumerate()
            .filter_map(|(index, delta)| change_record(&delta).map(|record| (index, record)))
            .collect();
        tracing::debug!(
            previous = %previous.id(),
            current = %current.id(),
            records = records.len(),
            "compared trees"
        );

        Ok(ChangeSet { diff, records })
    }
}

/// Ordered change records backed by the libgit2 diff they came from.
pub struct ChangeSet<'repo> {
    diff: git2::Diff<'repo>,
    records: Vec<(usize, ChangeRecord)>,
}

impl<'repo> ChangeSet<'repo> {
    /// Change records in differ order.
    pub fn records(&self) -> impl Iterator<Item = &ChangeRecord> + '_ {
        self.records.iter().map(|(_, record)| record)
    }

    /// Number of change records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` when the trees are identical.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Renderable changes in differ order.
    pub fn changes(&self) -> impl Iterator<Item = GitChange<'_, 'repo>> + '_ {
        self.records.iter().map(|(index, record)| GitChange {
            diff: &self.diff,
            index: *index,
            record,
        })
    }
}

impl std::fmt::Debug for ChangeSet<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeSet")
            .field("records", &self.records)
            .finish_non_exhaustive()
    }
}

/// One change record paired with the diff able to render it.
pub struct GitChange<'a, 'repo> {
    diff: &'a git2::Diff<'repo>,
    index: usize,
    record: &'a ChangeRecord,
}

impl RenderPatch for GitChange<'_, '_> {
    fn path(&self) -> Option<&str> {
        Some(self.record.path.as_str())
    }

    fn render(&self) -> std::result::Result<String, PatchError> {
        // libgit2 documents `None` for binary deltas; 1.7 builds a
        // "Binary files ... differ" patch itself, so the stub covers older
        // and differently configured builds.
        let Some(mut patch) = git2::Patch::from_diff(self.diff, self.index)? else {
            return Ok(binary_stub(self.record));
        };
        let buf = patch.to_buf()?;
        buf.as_str().map(str::to_owned).ok_or(PatchError::NotUtf8)
    }
}

fn binary_stub(record: &ChangeRecord) -> String {
    let old_path = record.old_path.as_deref().unwrap_or(&record.path);
    let (old_side, new_side) = match record.kind {
        ChangeKind::Added => ("/dev/null".to_owned(), format!("b/{}", record.path)),
        ChangeKind::Deleted => (format!("a/{old_path}"), "/dev/null".to_owned()),
        _ => (format!("a/{old_path}"), format!("b/{}", record.path)),
    };
    format!(
        "diff --git a/{old_path} b/{}\nBinary files {old_side} and {new_side} differ\n",
        record.path
    )
}

fn commit_tree<'repo>(commit: &git2::Commit<'repo>) -> Result<git2::Tree<'repo>> {
    commit.tree().map_err(|source| Error::TreeResolution {
        oid: commit.id().to_string(),
        source,
    })
}

fn change_record(delta: &DiffDelta<'_>) -> Option<ChangeRecord> {
    let kind = match delta.status() {
        Delta::Added => ChangeKind::Added,
        Delta::Deleted => ChangeKind::Deleted,
        Delta::Modified => ChangeKind::Modified,
        Delta::Renamed => ChangeKind::Renamed,
        Delta::Copied => ChangeKind::Copied,
        Delta::Typechange => ChangeKind::TypeChange,
        Delta::Unmodified
        | Delta::Ignored
        | Delta::Untracked
        | Delta::Unreadable
        | Delta::Conflicted => return None,
    };

    let new_path = delta.new_file().path().map(path_string);
    let old_path = delta.old_file().path().map(path_string);
    let path = new_path.clone().or_else(|| old_path.clone())?;
    let old_path = match kind {
        ChangeKind::Renamed | ChangeKind::Copied => old_path,
        _ => None,
    };

    Some(ChangeRecord {
        path,
        old_path,
        kind,
        binary: delta.flags().is_binary(),
    })
}

fn path_string(path: &std::path::Path) -> String {
    path.to_string_lossy().into_owned()
}
