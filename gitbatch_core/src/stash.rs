//! Stash diffs, and the state behind the stash list and its diff panel.

use std::sync::Arc;

use git2::Oid;

use crate::{
    patch::{format_patches, FormattedDiff},
    tree_diff::TreeDiffer,
    CancellationToken, DiffEngine, DiffRequests, Error, Repository, Result,
};

/// Title of the diff panel while it shows a stash.
pub const STASH_DIFF_TITLE: &str = "stash diff";

/// Diff stash `id` against the commit it was taken on.
///
/// # Errors
///
/// Returns [`Error::StashNotFound`] for an unknown id, history and tree errors
/// while resolving the two commits, and [`Error::Cancelled`] when `cancel`
/// fires before the trees are compared.
pub fn stash_diff(
    repository: &Repository,
    id: usize,
    differ: &TreeDiffer,
    cancel: &CancellationToken,
) -> Result<FormattedDiff> {
    let entry = repository
        .stashes()
        .iter()
        .find(|entry| entry.id == id)
        .ok_or(Error::StashNotFound { id })?;

    let repo = repository.git();
    let stash = repo.find_commit(Oid::from_str(&entry.oid)?)?;
    let base = stash.parent(0).map_err(|source| Error::HistoryResolution {
        from: entry.oid.clone(),
        source,
    })?;

    cancel.check()?;
    let changes = differ.diff_commits(repo, &base, &stash)?;
    Ok(format_patches(changes.changes()))
}

/// Cursor, title and diff text of the stash view, without any terminal code.
///
/// Each render starts a new request and cancels the previous one, so a slow
/// diff for an old cursor position never replaces a newer one.
#[derive(Debug)]
pub struct StashBrowser {
    engine: DiffEngine,
    requests: Arc<DiffRequests>,
    cursor: usize,
    title: String,
    content: String,
}

impl StashBrowser {
    /// Create a browser rendering diffs with `engine`.
    #[must_use]
    pub fn new(engine: DiffEngine) -> Self {
        Self::with_requests(engine, Arc::new(DiffRequests::new()))
    }

    /// Create a browser whose requests are tracked by a shared `requests`.
    #[must_use]
    pub fn with_requests(engine: DiffEngine, requests: Arc<DiffRequests>) -> Self {
        Self {
            engine,
            requests,
            cursor: 0,
            title: String::new(),
            content: String::new(),
        }
    }

    /// Lines of the stash list.
    #[must_use]
    pub fn lines(repository: &Repository) -> Vec<String> {
        repository
            .stashes()
            .iter()
            .map(crate::StashEntry::display_line)
            .collect()
    }

    /// Selected position in the stash list.
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Title of the diff panel.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Text of the diff panel.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Request tracker, shared so another thread can cancel the current diff.
    #[must_use]
    pub fn requests(&self) -> Arc<DiffRequests> {
        Arc::clone(&self.requests)
    }

    /// Move down one entry and render it. Stays put on the last entry.
    ///
    /// # Errors
    ///
    /// Propagates [`StashBrowser::render_selected`] failures.
    pub fn cursor_down(&mut self, repository: &Repository) -> Result<()> {
        let len = repository.stashes().len();
        if len == 0 || self.cursor + 1 >= len {
            return Ok(());
        }
        self.cursor += 1;
        self.render_selected(repository)
    }

    /// Move up one entry and render it. Stays put on the first entry.
    ///
    /// # Errors
    ///
    /// Propagates [`StashBrowser::render_selected`] failures.
    pub fn cursor_up(&mut self, repository: &Repository) -> Result<()> {
        if repository.stashes().is_empty() || self.cursor == 0 {
            return Ok(());
        }
        self.cursor -= 1;
        self.render_selected(repository)
    }

    /// Replace the panel with the diff of the selected stash.
    ///
    /// The panel is left empty if the diff fails. A request superseded or
    /// cancelled through [`StashBrowser::requests`] is dropped without error,
    /// whether it stopped early or ran to completion.
    ///
    /// # Errors
    ///
    /// Returns any error from the diff engine other than the cancellation of
    /// a superseded request.
    pub fn render_selected(&mut self, repository: &Repository) -> Result<()> {
        let Some(entry) = repository.stashes().get(self.cursor) else {
            return Ok(());
        };

        self.title = STASH_DIFF_TITLE.to_owned();
        self.content.clear();

        let ticket = self.requests.begin();
        let result = self.engine.stash_diff(repository, entry.id, ticket.token());
        if !self.requests.is_current(&ticket) {
            match result {
                Ok(_) | Err(Error::Cancelled) => {
                    tracing::debug!(
                        generation = ticket.generation(),
                        "dropped superseded stash diff"
                    );
                    return Ok(());
                }
                Err(err) => return Err(err),
            }
        }

        result?.text().clone_into(&mut self.content);
        Ok(())
    }
}
