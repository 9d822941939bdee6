mod common;

use common::{linear_history, Fixture};
use gitbatch_core::{
    CancellationToken, Completeness, DiffConfig, DiffEngine, DiffOutcome, DiffStrategy, Error,
    ErrorKind, Repository, Result, NO_DIFF,
};

#[test]
fn head_diff_contains_only_the_newest_file() -> Result<()> {
    let mut fixture = Fixture::new()?;
    let commits = linear_history(&mut fixture)?;

    let repository = Repository::open(fixture.path())?;
    let outcome = gitbatch_core::diff(&repository, &commits[3].to_string())?;
    let text = outcome.text();

    assert!(text.contains("diff --git a/file3.txt b/file3.txt"));
    assert!(text.contains("+content 3"));
    for older in ["file0.txt", "file1.txt", "file2.txt"] {
        assert!(!text.contains(older), "unexpected {older} in diff");
    }
    assert_eq!(outcome.completeness(), Completeness::Complete);

    Ok(())
}

#[test]
fn oldest_commit_has_no_diff() -> Result<()> {
    let mut fixture = Fixture::new()?;
    let commits = linear_history(&mut fixture)?;

    let repository = Repository::open(fixture.path())?;
    let outcome = gitbatch_core::diff(&repository, &commits[0].to_string())?;

    assert_eq!(outcome, DiffOutcome::NoPredecessor);
    assert_eq!(outcome.text(), "there is no diff");

    Ok(())
}

#[test]
fn single_commit_repository_has_no_diff() -> Result<()> {
    let mut fixture = Fixture::new()?;
    fixture.write("README.md", "hello\n");
    let only = fixture.commit("Initial commit")?;

    let repository = Repository::open(fixture.path())?;
    let outcome = gitbatch_core::diff(&repository, &only.to_string())?;
    assert_eq!(outcome.text(), NO_DIFF);

    Ok(())
}

#[test]
fn identical_trees_yield_empty_text() -> Result<()> {
    let mut fixture = Fixture::new()?;
    fixture.write("README.md", "hello\n");
    fixture.commit("Initial commit")?;
    let empty = fixture.commit("Nothing changed")?;

    let repository = Repository::open(fixture.path())?;
    let outcome = gitbatch_core::diff(&repository, &empty.to_string())?;

    assert!(matches!(outcome, DiffOutcome::Patch(_)));
    assert_eq!(outcome.text(), "");
    assert_ne!(outcome.text(), NO_DIFF);

    Ok(())
}

#[test]
fn repeated_diffs_are_byte_identical() -> Result<()> {
    let mut fixture = Fixture::new()?;
    fixture.write("a.txt", "one\n");
    fixture.commit("base")?;
    fixture.write("a.txt", "one\ntwo\n");
    fixture.write("b.txt", "new\n");
    let head = fixture.commit("change")?;

    let repository = Repository::open(fixture.path())?;
    let engine = DiffEngine::default();
    let first = engine.diff(&repository, &head.to_string())?;
    let second = engine.diff(&repository, &head.to_string())?;

    assert!(!first.text().is_empty());
    assert_eq!(first.text().as_bytes(), second.text().as_bytes());

    Ok(())
}

#[test]
fn patches_follow_path_order() -> Result<()> {
    let mut fixture = Fixture::new()?;
    fixture.write("keep.txt", "keep\n");
    fixture.commit("base")?;
    fixture.write("z.txt", "z\n");
    fixture.write("b.txt", "b\n");
    fixture.write("dir/c.txt", "c\n");
    fixture.write("a.txt", "a\n");
    let head = fixture.commit("add files")?;

    let repository = Repository::open(fixture.path())?;
    let text = gitbatch_core::diff(&repository, &head.to_string())?.to_string();

    let positions: Vec<usize> = ["a.txt", "b.txt", "dir/c.txt", "z.txt"]
        .iter()
        .map(|path| text.find(&format!("+++ b/{path}")).expect("patch present"))
        .collect();
    let mut sorted = positions.clone();
    sorted.sort_unstable();
    assert_eq!(positions, sorted);

    Ok(())
}

#[test]
fn unformattable_change_truncates_output() -> Result<()> {
    let mut fixture = Fixture::new()?;
    fixture.write("base.txt", "base\n");
    fixture.commit("base")?;
    fixture.write("a_good.txt", "fine\n");
    fixture.write("b_latin1.txt", b"caf\xe9\n");
    fixture.write("c_good.txt", "also fine\n");
    let head = fixture.commit("mixed encodings")?;

    let repository = Repository::open(fixture.path())?;
    let outcome = gitbatch_core::diff(&repository, &head.to_string())?;

    assert!(outcome.text().contains("+++ b/a_good.txt"));
    assert!(!outcome.text().contains("c_good.txt"));
    assert!(outcome.text().ends_with('\n'));
    match outcome.completeness() {
        Completeness::Truncated {
            rendered,
            failed_path,
            ..
        } => {
            assert_eq!(rendered, 1);
            assert_eq!(failed_path.as_deref(), Some("b_latin1.txt"));
        }
        Completeness::Complete => panic!("expected truncated output"),
    }

    Ok(())
}

#[test]
fn unknown_commit_is_rejected() -> Result<()> {
    let mut fixture = Fixture::new()?;
    linear_history(&mut fixture)?;

    let repository = Repository::open(fixture.path())?;
    let err = gitbatch_core::diff(&repository, "0000000000000000000000000000000000000000")
        .expect_err("unknown commit");
    assert!(matches!(err, Error::CommitNotFound { .. }));
    assert_eq!(err.kind(), ErrorKind::Repository);

    Ok(())
}

#[test]
fn empty_repository_has_no_commits_to_diff() -> Result<()> {
    let fixture = Fixture::new()?;
    let repository = Repository::open(fixture.path())?;

    let err = gitbatch_core::diff(&repository, "HEAD").expect_err("empty repository");
    assert!(matches!(err, Error::CommitNotFound { .. }));

    Ok(())
}

#[test]
fn legacy_strategy_is_not_implemented() -> Result<()> {
    let mut fixture = Fixture::new()?;
    let commits = linear_history(&mut fixture)?;

    let repository = Repository::open(fixture.path())?;
    let config = DiffConfig {
        strategy: DiffStrategy::Legacy,
        ..DiffConfig::default()
    };
    let err = DiffEngine::new(config)
        .diff(&repository, &commits[3].to_string())
        .expect_err("legacy backend");

    assert!(matches!(err, Error::Unimplemented(_)));
    assert_eq!(err.kind(), ErrorKind::NotImplemented);

    Ok(())
}

#[test]
fn cancelled_request_aborts() -> Result<()> {
    let mut fixture = Fixture::new()?;
    let commits = linear_history(&mut fixture)?;

    let repository = Repository::open(fixture.path())?;
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = DiffEngine::default()
        .diff_with_cancel(&repository, &commits[3].to_string(), &cancel)
        .expect_err("cancelled");
    assert_eq!(err.kind(), ErrorKind::Cancelled);

    Ok(())
}

#[test]
fn walk_starts_from_selected_commit() -> Result<()> {
    let mut fixture = Fixture::new()?;
    let commits = linear_history(&mut fixture)?;
    let target = commits[2].to_string();

    let mut repository = Repository::open(fixture.path())?;
    repository.select_commit(&target)?;
    let text = gitbatch_core::diff(&repository, &target)?.to_string();

    assert!(text.contains("+++ b/file2.txt"));
    assert!(!text.contains("file3.txt"));

    Ok(())
}

#[test]
fn context_lines_follow_configuration() -> Result<()> {
    let mut fixture = Fixture::new()?;
    fixture.write("lines.txt", "1\n2\n3\n4\n5\n6\n7\n");
    fixture.commit("base")?;
    fixture.write("lines.txt", "1\n2\n3\nfour\n5\n6\n7\n");
    let head = fixture.commit("edit middle")?;

    let repository = Repository::open(fixture.path())?;
    let config = DiffConfig {
        context_lines: 0,
        ..DiffConfig::default()
    };
    let text = DiffEngine::new(config)
        .diff(&repository, &head.to_string())?
        .to_string();

    assert!(text.contains("-4\n+four\n"));
    assert!(!text.contains(" 3\n"));

    Ok(())
}
