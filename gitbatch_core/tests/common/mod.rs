#![allow(dead_code)]

use std::path::Path;

use git2::{ErrorClass, ErrorCode, IndexAddOption, Oid, Repository as GitRepository, Time};
use gitbatch_core::{Error, Result};
use tempfile::TempDir;

const EPOCH: i64 = 1_700_000_000;

/// Temporary repository whose commits get strictly increasing committer times.
pub struct Fixture {
    pub temp: TempDir,
    pub git: GitRepository,
    clock: i64,
}

impl Fixture {
    pub fn new() -> Result<Self> {
        let temp = TempDir::new().expect("tempdir");
        let git = GitRepository::init(temp.path())?;
        Ok(Self {
            temp,
            git,
            clock: EPOCH,
        })
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    pub fn write(&self, relative: &str, contents: impl AsRef<[u8]>) {
        let path = self.temp.path().join(relative);
        std::fs::create_dir_all(path.parent().expect("parent directory")).expect("create dirs");
        std::fs::write(path, contents).expect("write file");
    }

    pub fn commit(&mut self, message: &str) -> Result<Oid> {
        self.clock += 60;
        let mut index = self.git.index()?;
        index.add_all(["*"], IndexAddOption::DEFAULT, None)?;
        index.update_all(["*"], None)?;
        index.write()?;
        let tree_id = index.write_tree()?;
        let tree = self.git.find_tree(tree_id)?;
        let signature = self.signature()?;

        let parents = match self.git.head() {
            Ok(head) => vec![head.peel_to_commit()?],
            Err(err)
                if matches!(
                    (err.class(), err.code()),
                    (
                        ErrorClass::Reference,
                        ErrorCode::NotFound | ErrorCode::UnbornBranch
                    )
                ) =>
            {
                Vec::new()
            }
            Err(err) => return Err(Error::from(err)),
        };

        let parent_refs: Vec<&git2::Commit> = parents.iter().collect();
        Ok(self.git.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &parent_refs,
        )?)
    }

    pub fn stash(&mut self, message: &str) -> Result<Oid> {
        self.clock += 60;
        let signature = self.signature()?;
        Ok(self.git.stash_save(&signature, message, None)?)
    }

    fn signature(&self) -> Result<git2::Signature<'static>> {
        Ok(git2::Signature::new(
            "Test User",
            "test@example.com",
            &Time::new(self.clock, 0),
        )?)
    }
}

/// Commits C0..C3, each adding `file{n}.txt`. Returns their ids oldest first.
pub fn linear_history(fixture: &mut Fixture) -> Result<Vec<Oid>> {
    (0..4)
        .map(|n| {
            fixture.write(&format!("file{n}.txt"), format!("content {n}\n"));
            fixture.commit(&format!("C{n}"))
        })
        .collect()
}
