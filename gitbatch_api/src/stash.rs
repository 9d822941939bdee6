use serde::{Deserialize, Serialize};

/// A stashed change set as listed by the stash view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StashEntry {
    /// Position in the stash stack, `0` being the most recent.
    pub id: usize,
    /// Branch the stash was taken on. Empty when the message carries none.
    #[serde(default)]
    pub branch: String,
    /// Free-form description following the branch name.
    #[serde(default)]
    pub description: String,
    /// Object id of the stash commit.
    pub oid: String,
}

impl StashEntry {
    /// Build an entry from a stash reflog message such as
    /// `WIP on main: 1a2b3c4 message` or `On main: message`.
    #[must_use]
    pub fn from_message(id: usize, message: &str, oid: impl Into<String>) -> Self {
        let (branch, description) = split_stash_message(message);
        Self {
            id,
            branch,
            description,
            oid: oid.into(),
        }
    }

    /// Line shown for this entry in the stash list.
    #[must_use]
    pub fn display_line(&self) -> String {
        format!(" {} {}: {}", self.id, self.branch, self.description)
    }
}

fn split_stash_message(message: &str) -> (String, String) {
    let rest = message
        .strip_prefix("WIP on ")
        .or_else(|| message.strip_prefix("On "));

    match rest.and_then(|rest| rest.split_once(": ")) {
        Some((branch, description)) => (branch.to_owned(), description.to_owned()),
        None => (String::new(), message.to_owned()),
    }
}
