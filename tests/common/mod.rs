//! Shared test utilities for integration tests.
//!
//! Not all functions are used by every test file, but they're shared across tests.
#![allow(dead_code)]

use std::fs;
use std::path::Path;

use git2::{Oid, Repository, Signature};

use aicm::commit::{
    FileListing, OversizeAction, RepositoryDiffState, ResolveNotice, ResolvePrompter,
    StagingAction,
};
use aicm::git::SystemGit;

/// A throwaway git repository for integration tests.
pub struct TestRepo {
    pub dir: tempfile::TempDir,
    pub repo: Repository,
}

impl TestRepo {
    /// Create a new repository with a committer identity so `git commit`
    /// works from the command line.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let repo = Repository::init(dir.path()).expect("Failed to init git repo");
        {
            let mut config = repo.config().expect("Failed to open repo config");
            config.set_str("user.name", "Test User").unwrap();
            config.set_str("user.email", "test@example.com").unwrap();
            config.set_bool("commit.gpgsign", false).unwrap();
        }
        Self { dir, repo }
    }

    /// Create a repository with one commit containing `files`.
    pub fn with_initial_commit(files: &[(&str, &str)]) -> Self {
        let test_repo = Self::new();
        for (path, content) in files {
            test_repo.write(path, content);
            test_repo.stage(path);
        }
        test_repo.commit("Initial commit");
        test_repo
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// A `SystemGit` rooted at this repository.
    pub fn git(&self) -> SystemGit {
        SystemGit::discover(self.path()).expect("Failed to discover test repo")
    }

    /// Write a file in the working tree, creating parent directories.
    pub fn write(&self, path: &str, content: &str) {
        let full = self.path().join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        fs::write(full, content).expect("Failed to write file");
    }

    /// Add a path to the index.
    pub fn stage(&self, path: &str) {
        let mut index = self.repo.index().expect("Failed to get index");
        index.add_path(Path::new(path)).expect("Failed to add file");
        index.write().expect("Failed to write index");
    }

    /// Commit the current index. Returns the commit OID.
    pub fn commit(&self, message: &str) -> Oid {
        let sig = Signature::now("Test User", "test@example.com").expect("Failed to create signature");
        let mut index = self.repo.index().expect("Failed to get index");
        let tree_id = index.write_tree().expect("Failed to write tree");
        let tree = self.repo.find_tree(tree_id).expect("Failed to find tree");

        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .expect("Failed to create commit")
    }

    /// Paths currently recorded as changed in the index relative to HEAD.
    pub fn staged_paths(&self) -> Vec<String> {
        let head = self.repo.head().unwrap().peel_to_tree().unwrap();
        let diff = self
            .repo
            .diff_tree_to_index(Some(&head), None, None)
            .unwrap();
        diff.deltas()
            .filter_map(|d| d.new_file().path().map(|p| p.to_string_lossy().into_owned()))
            .collect()
    }

    /// Message of the HEAD commit.
    pub fn head_message(&self) -> String {
        let commit = self.repo.head().unwrap().peel_to_commit().unwrap();
        commit.message().unwrap_or_default().to_string()
    }
}

/// Prompter with fixed answers that records what it was shown.
#[derive(Default)]
pub struct ScriptedPrompter {
    pub staging_answer: Option<StagingAction>,
    pub oversize_answer: Option<OversizeAction>,
    pub offered_staging: Vec<(RepositoryDiffState, Vec<StagingAction>)>,
    pub listings: Vec<FileListing>,
    pub offered_oversize: Vec<(usize, usize)>,
    pub notices: Vec<ResolveNotice>,
}

impl ScriptedPrompter {
    pub fn answering(staging: Option<StagingAction>, oversize: Option<OversizeAction>) -> Self {
        Self {
            staging_answer: staging,
            oversize_answer: oversize,
            ..Self::default()
        }
    }
}

impl ResolvePrompter for ScriptedPrompter {
    fn choose_staging(
        &mut self,
        state: RepositoryDiffState,
        listing: Option<&FileListing>,
        actions: &[StagingAction],
    ) -> Option<StagingAction> {
        self.offered_staging.push((state, actions.to_vec()));
        if let Some(listing) = listing {
            self.listings.push(listing.clone());
        }
        self.staging_answer
    }

    fn choose_oversize(
        &mut self,
        length: usize,
        limit: usize,
        _actions: &[OversizeAction],
    ) -> Option<OversizeAction> {
        self.offered_oversize.push((length, limit));
        self.oversize_answer
    }

    fn notify(&mut self, notice: ResolveNotice) {
        self.notices.push(notice);
    }
}
