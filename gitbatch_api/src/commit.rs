use serde::{Deserialize, Serialize};

/// Identity of a commit loaded from repository history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSummary {
    /// Full object identifier (hex SHA).
    pub oid: String,
    /// First line of the commit message, if any.
    #[serde(default)]
    pub summary: Option<String>,
    /// Author information when available.
    #[serde(default)]
    pub author: Option<Signature>,
    /// Committer information when available.
    #[serde(default)]
    pub committer: Option<Signature>,
    /// Committer timestamp in unix seconds.
    pub committer_time: i64,
}

impl CommitSummary {
    /// Abbreviated identifier used for display.
    #[must_use]
    pub fn short_oid(&self) -> &str {
        self.oid.get(..7).unwrap_or(&self.oid)
    }
}

/// Structured author/committer identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// Display name for the individual.
    pub name: String,
    /// Optional email address.
    #[serde(default)]
    pub email: Option<String>,
}

/// Where the repository handle currently points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryState {
    /// Name of the checked-out branch, if HEAD is not detached.
    #[serde(default)]
    pub branch: Option<String>,
    /// Commit the diff pipeline walks from.
    pub commit: CommitSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_commit() -> CommitSummary {
        CommitSummary {
            oid: "0123456789abcdef0123456789abcdef01234567".into(),
            summary: Some("Add example module".into()),
            author: Some(Signature {
                name: "Example Author".into(),
                email: Some("author@example.com".into()),
            }),
            committer: None,
            committer_time: 1_690_000_000,
        }
    }

    #[test]
    fn commit_round_trip() {
        let commit = sample_commit();
        let json = serde_json::to_string(&commit).expect("serialize commit");
        let decoded: CommitSummary = serde_json::from_str(&json).expect("deserialize commit");
        assert_eq!(commit, decoded);
    }

    #[test]
    fn short_oid_truncates() {
        let mut commit = sample_commit();
        assert_eq!(commit.short_oid(), "0123456");

        commit.oid = "abc".into();
        assert_eq!(commit.short_oid(), "abc");
    }

    #[test]
    fn state_branch_defaults_to_none() {
        let json = r#"{
            "commit": {
                "oid": "fedcba9876543210fedcba9876543210fedcba98",
                "committer_time": 0
            }
        }"#;

        let state: RepositoryState = serde_json::from_str(json).expect("deserialize state");
        assert!(state.branch.is_none());
        assert!(state.commit.summary.is_none());
        assert_eq!(state.commit.oid, "fedcba9876543210fedcba9876543210fedcba98");
    }
}
