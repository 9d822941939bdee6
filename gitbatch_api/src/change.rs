use serde::{Deserialize, Serialize};

/// One path's delta between two trees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Path of the file relative to the repository root, on the newer side
    /// when it exists there.
    pub path: String,
    /// Previous path when the file was renamed or copied.
    #[serde(default)]
    pub old_path: Option<String>,
    /// What happened to the path.
    pub kind: ChangeKind,
    /// Indicates whether either side was detected as binary.
    #[serde(default)]
    pub binary: bool,
}

/// Kind of change recorded for a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// Path only exists in the newer tree.
    Added,
    /// Path only exists in the older tree.
    Deleted,
    /// Path exists on both sides with different content.
    Modified,
    /// Path moved between the trees.
    Renamed,
    /// Path content copied from another location.
    Copied,
    /// Entry type changed (e.g., file -> symlink).
    TypeChange,
}

/// Whether a rendered diff holds every change record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Completeness {
    /// All records were rendered.
    #[default]
    Complete,
    /// Rendering stopped at the first record that failed to format.
    Truncated {
        /// Number of records rendered before the failure.
        rendered: usize,
        /// Path of the record that failed, when known.
        #[serde(default)]
        failed_path: Option<String>,
        /// Human-readable failure description.
        reason: String,
    },
}

impl Completeness {
    /// Returns `true` when rendering stopped early.
    #[must_use]
    pub const fn is_truncated(&self) -> bool {
        matches!(self, Self::Truncated { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoded_uses_snake_case() {
        let json = serde_json::to_string(&ChangeKind::TypeChange).expect("serialize kind");
        assert_eq!(json, "\"type_change\"");
        let kind: ChangeKind = serde_json::from_str(&json).expect("deserialize kind");
        assert_eq!(kind, ChangeKind::TypeChange);
    }

    #[test]
    fn record_defaults_are_applied() {
        let json = r#"{ "path": "README.md", "kind": "added" }"#;
        let record: ChangeRecord = serde_json::from_str(json).expect("deserialize record");
        assert_eq!(record.kind, ChangeKind::Added);
        assert!(record.old_path.is_none());
        assert!(!record.binary);
    }

    #[test]
    fn truncated_is_tagged() {
        let truncated = Completeness::Truncated {
            rendered: 2,
            failed_path: Some("logo.png".into()),
            reason: "patch is not valid UTF-8".into(),
        };
        let json = serde_json::to_string(&truncated).expect("serialize completeness");
        assert!(json.contains("\"state\":\"truncated\""));
        assert!(truncated.is_truncated());
        assert!(!Completeness::default().is_truncated());
    }
}
