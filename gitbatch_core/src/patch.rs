//! Concatenation of per-record patches into a single diff blob.
//!
//! A record that fails to render stops the loop; the text accumulated so far
//! is still returned, tagged as [`Completeness::Truncated`].

use std::fmt;

use crate::Completeness;

/// Reasons a single change record could not be rendered.
#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    /// libgit2 failed to build or print the patch.
    #[error("failed to build patch: {source}")]
    Git {
        /// Original libgit2 error.
        #[from]
        source: git2::Error,
    },
    /// Patch text is not valid UTF-8.
    #[error("patch is not valid UTF-8")]
    NotUtf8,
}

/// Something that renders to one patch body.
pub trait RenderPatch {
    /// Path used when reporting a render failure.
    fn path(&self) -> Option<&str> {
        None
    }

    /// Render the patch body.
    ///
    /// # Errors
    ///
    /// Returns a [`PatchError`] when the patch cannot be produced.
    fn render(&self) -> Result<String, PatchError>;
}

/// Rendered diff text together with how much of it was produced.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormattedDiff {
    /// Concatenated patch bodies, each followed by a newline.
    pub text: String,
    /// Whether every record made it into `text`.
    pub completeness: Completeness,
}

impl FormattedDiff {
    /// Returns `true` when rendering stopped early.
    #[must_use]
    pub const fn is_truncated(&self) -> bool {
        self.completeness.is_truncated()
    }
}

impl fmt::Display for FormattedDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Render `changes` in order and concatenate the results.
///
/// No changes yields empty text.
pub fn format_patches<I>(changes: I) -> FormattedDiff
where
    I: IntoIterator,
    I::Item: RenderPatch,
{
    let mut text = String::new();
    let mut rendered = 0;

    for change in changes {
        match change.render() {
            Ok(body) => {
                text.push_str(&body);
                text.push('\n');
                rendered += 1;
            }
            Err(err) => {
                let failed_path = change.path().map(str::to_owned);
                tracing::warn!(
                    rendered,
                    path = failed_path.as_deref().unwrap_or("<unknown>"),
                    error = %err,
                    "stopped rendering diff at unformattable change"
                );
                return FormattedDiff {
                    text,
                    completeness: Completeness::Truncated {
                        rendered,
                        failed_path,
                        reason: err.to_string(),
                    },
                };
            }
        }
    }

    FormattedDiff {
        text,
        completeness: Completeness::Complete,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fake {
        path: &'static str,
        body: Option<&'static str>,
    }

    impl RenderPatch for Fake {
        fn path(&self) -> Option<&str> {
            Some(self.path)
        }

        fn render(&self) -> Result<String, PatchError> {
            self.body.map(str::to_owned).ok_or(PatchError::NotUtf8)
        }
    }

    fn ok(path: &'static str, body: &'static str) -> Fake {
        Fake {
            path,
            body: Some(body),
        }
    }

    fn broken(path: &'static str) -> Fake {
        Fake { path, body: None }
    }

    #[test]
    fn empty_input_yields_empty_text() {
        let formatted = format_patches(Vec::<Fake>::new());
        assert_eq!(formatted.text, "");
        assert_eq!(formatted.completeness, Completeness::Complete);
    }

    #[test]
    fn bodies_are_newline_terminated_in_order() {
        let formatted = format_patches(vec![ok("b", "patch b"), ok("a", "patch a")]);
        assert_eq!(formatted.text, "patch b\npatch a\n");
        assert!(!formatted.is_truncated());
        assert_eq!(formatted.to_string(), formatted.text);
    }

    #[test]
    fn failure_keeps_preceding_records_only() {
        let formatted = format_patches(vec![
            ok("one", "first"),
            ok("two", "second"),
            broken("three"),
            ok("four", "fourth"),
        ]);

        assert_eq!(formatted.text, "first\nsecond\n");
        assert_eq!(
            formatted.completeness,
            Completeness::Truncated {
                rendered: 2,
                failed_path: Some("three".into()),
                reason: "patch is not valid UTF-8".into(),
            }
        );
    }

    #[test]
    fn failure_on_first_record_yields_empty_truncated_text() {
        let formatted = format_patches(vec![broken("only"), ok("later", "later")]);
        assert_eq!(formatted.text, "");
        assert!(formatted.is_truncated());
    }
}
