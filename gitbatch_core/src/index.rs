//! Lookup of a commit inside the history loaded by [`crate::Repository::refresh`].

use crate::{CommitSummary, Error, Result};

/// Outcome of the boundary check performed before walking history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// The target has at least one older commit after it.
    HasPredecessor {
        /// Position of the target in the loaded history.
        position: usize,
    },
    /// The target is the oldest loaded commit.
    Oldest,
}

/// Position of `oid` in `commits`.
///
/// The scan covers the whole sequence; if the id occurs more than once the
/// last occurrence is returned.
///
/// # Errors
///
/// Returns [`Error::CommitNotFound`] when `oid` does not occur at all.
pub fn index_of(commits: &[CommitSummary], oid: &str) -> Result<usize> {
    commits
        .iter()
        .rposition(|commit| commit.oid == oid)
        .ok_or_else(|| Error::CommitNotFound {
            oid: oid.to_owned(),
        })
}

/// Locate `oid` and decide whether an older commit exists to diff against.
///
/// `commits` is ordered most recent first, so fewer than two commits from
/// the target onwards means it is the oldest one.
///
/// # Errors
///
/// Propagates [`index_of`] failures.
pub fn locate(commits: &[CommitSummary], oid: &str) -> Result<Boundary> {
    let position = index_of(commits, oid)?;
    let remaining = commits.len() - position;
    tracing::debug!(oid, position, remaining, "located commit in history");

    if remaining <= 1 {
        Ok(Boundary::Oldest)
    } else {
        Ok(Boundary::HasPredecessor { position })
    }
}
