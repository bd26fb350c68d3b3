//! In-memory git host.
//!
//! Models repositories, branches, files and head revisions closely enough to
//! exercise the idempotency of every operation. Calls are recorded, and the
//! host can be told to fail, so tests can assert both what was attempted and
//! how the worker reacts.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::foundation::ClaimId;
use crate::domain::outbox::GitRef;
use crate::ports::{CommitAuthor, FileChange, GitHost, GitHostError};

/// A recorded call against the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitHostCall {
    CreateRepo(ClaimId),
    CommitFiles { claim_id: ClaimId, branch: String },
    SetupBranchProtection(ClaimId),
    SetupWebhook(ClaimId),
    CreateBranch { claim_id: ClaimId, name: String },
    RenameBranch { claim_id: ClaimId, old: String, new: String },
}

#[derive(Debug, Clone, Default)]
struct Branch {
    head: String,
    files: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
struct Repo {
    external_id: String,
    branches: HashMap<String, Branch>,
    protected: bool,
    webhooks: usize,
}

#[derive(Debug)]
enum FailureMode {
    Always(GitHostError),
    Next(u32, GitHostError),
}

#[derive(Debug, Default)]
struct HostState {
    repos: HashMap<ClaimId, Repo>,
    calls: Vec<GitHostCall>,
    failure: Option<FailureMode>,
    next_repo_id: u64,
    commits: u64,
}

impl HostState {
    fn record(&mut self, call: GitHostCall) -> Result<(), GitHostError> {
        self.calls.push(call);
        match self.failure.take() {
            None => Ok(()),
            Some(FailureMode::Always(err)) => {
                self.failure = Some(FailureMode::Always(err.clone()));
                Err(err)
            }
            Some(FailureMode::Next(remaining, err)) => {
                if remaining > 1 {
                    self.failure = Some(FailureMode::Next(remaining - 1, err.clone()));
                }
                Err(err)
            }
        }
    }

    fn repo_mut(&mut self, claim_id: ClaimId) -> Result<&mut Repo, GitHostError> {
        self.repos
            .get_mut(&claim_id)
            .ok_or_else(|| GitHostError::NotFound(format!("repository {}", claim_id)))
    }

    fn next_revision(&mut self, claim_id: ClaimId, message: &str) -> String {
        self.commits += 1;
        let digest = Sha256::digest(format!("{}:{}:{}", claim_id, self.commits, message));
        let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
        hex[..40].to_string()
    }
}

/// In-memory implementation of the GitHost port.
#[derive(Debug, Clone)]
pub struct InMemoryGitHost {
    state: Arc<Mutex<HostState>>,
    default_branch: String,
}

impl Default for InMemoryGitHost {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryGitHost {
    pub fn new() -> Self {
        Self::with_default_branch("main")
    }

    pub fn with_default_branch(branch: impl Into<String>) -> Self {
        Self {
            state: Arc::new(Mutex::new(HostState::default())),
            default_branch: branch.into(),
        }
    }

    /// Every subsequent call fails with `err` until [`recover`](Self::recover).
    pub async fn fail_always(&self, err: GitHostError) {
        self.state.lock().await.failure = Some(FailureMode::Always(err));
    }

    /// The next `count` calls fail with `err`.
    pub async fn fail_next(&self, count: u32, err: GitHostError) {
        if count > 0 {
            self.state.lock().await.failure = Some(FailureMode::Next(count, err));
        }
    }

    pub async fn recover(&self) {
        self.state.lock().await.failure = None;
    }

    pub async fn calls(&self) -> Vec<GitHostCall> {
        self.state.lock().await.calls.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.state.lock().await.calls.len()
    }

    pub async fn repo_count(&self) -> usize {
        self.state.lock().await.repos.len()
    }

    pub async fn has_repo(&self, claim_id: ClaimId) -> bool {
        self.state.lock().await.repos.contains_key(&claim_id)
    }

    pub async fn branch_head(&self, claim_id: ClaimId, branch: &str) -> Option<String> {
        let state = self.state.lock().await;
        state
            .repos
            .get(&claim_id)
            .and_then(|r| r.branches.get(branch))
            .map(|b| b.head.clone())
    }

    pub async fn file(&self, claim_id: ClaimId, branch: &str, path: &str) -> Option<String> {
        let state = self.state.lock().await;
        state
            .repos
            .get(&claim_id)
            .and_then(|r| r.branches.get(branch))
            .and_then(|b| b.files.get(path).cloned())
    }

    pub async fn is_protected(&self, claim_id: ClaimId) -> bool {
        let state = self.state.lock().await;
        state.repos.get(&claim_id).map_or(false, |r| r.protected)
    }

    pub async fn webhook_count(&self, claim_id: ClaimId) -> usize {
        let state = self.state.lock().await;
        state.repos.get(&claim_id).map_or(0, |r| r.webhooks)
    }

    /// Simulates a push made directly on the host, bypassing the outbox.
    /// Returns the new head revision. Not recorded as a call.
    pub async fn push(
        &self,
        claim_id: ClaimId,
        branch: &str,
        files: &[FileChange],
        message: &str,
    ) -> Result<String, GitHostError> {
        let mut state = self.state.lock().await;
        let revision = state.next_revision(claim_id, message);
        let repo = state.repo_mut(claim_id)?;
        let target = repo.branches.entry(branch.to_string()).or_default();
        for file in files {
            target.files.insert(file.path.clone(), file.content.clone());
        }
        target.head = revision.clone();
        Ok(revision)
    }
}

#[async_trait]
impl GitHost for InMemoryGitHost {
    async fn create_repo(&self, claim_id: ClaimId) -> Result<String, GitHostError> {
        let mut state = self.state.lock().await;
        state.record(GitHostCall::CreateRepo(claim_id))?;

        if let Some(repo) = state.repos.get(&claim_id) {
            return Ok(repo.external_id.clone());
        }
        state.next_repo_id += 1;
        let external_id = state.next_repo_id.to_string();
        state.repos.insert(
            claim_id,
            Repo {
                external_id: external_id.clone(),
                branches: HashMap::new(),
                protected: false,
                webhooks: 0,
            },
        );
        Ok(external_id)
    }

    async fn commit_files(
        &self,
        claim_id: ClaimId,
        files: &[FileChange],
        _author: &CommitAuthor,
        message: &str,
        branch: &GitRef,
    ) -> Result<String, GitHostError> {
        let mut state = self.state.lock().await;
        state.record(GitHostCall::CommitFiles {
            claim_id,
            branch: branch.to_string(),
        })?;

        let revision = state.next_revision(claim_id, message);
        let default_branch = self.default_branch.clone();
        let repo = state.repo_mut(claim_id)?;
        // The first commit creates the default branch of an empty repository.
        if repo.branches.is_empty() && branch.as_str() == default_branch {
            repo.branches.insert(default_branch, Branch::default());
        }
        let target = repo
            .branches
            .get_mut(branch.as_str())
            .ok_or_else(|| GitHostError::NotFound(format!("branch {}", branch)))?;
        for file in files {
            target.files.insert(file.path.clone(), file.content.clone());
        }
        target.head = revision.clone();
        Ok(revision)
    }

    async fn setup_branch_protection(&self, claim_id: ClaimId) -> Result<(), GitHostError> {
        let mut state = self.state.lock().await;
        state.record(GitHostCall::SetupBranchProtection(claim_id))?;
        state.repo_mut(claim_id)?.protected = true;
        Ok(())
    }

    async fn setup_webhook(&self, claim_id: ClaimId) -> Result<(), GitHostError> {
        let mut state = self.state.lock().await;
        state.record(GitHostCall::SetupWebhook(claim_id))?;
        let repo = state.repo_mut(claim_id)?;
        if repo.webhooks == 0 {
            repo.webhooks = 1;
        }
        Ok(())
    }

    async fn create_branch(
        &self,
        claim_id: ClaimId,
        name: &GitRef,
        from: &GitRef,
    ) -> Result<(), GitHostError> {
        let mut state = self.state.lock().await;
        state.record(GitHostCall::CreateBranch {
            claim_id,
            name: name.to_string(),
        })?;

        let repo = state.repo_mut(claim_id)?;
        if repo.branches.contains_key(name.as_str()) {
            return Ok(());
        }
        let source = repo
            .branches
            .get(from.as_str())
            .cloned()
            .ok_or_else(|| GitHostError::NotFound(format!("branch {}", from)))?;
        repo.branches.insert(name.to_string(), source);
        Ok(())
    }

    async fn rename_branch(
        &self,
        claim_id: ClaimId,
        old: &GitRef,
        new: &GitRef,
    ) -> Result<(), GitHostError> {
        let mut state = self.state.lock().await;
        state.record(GitHostCall::RenameBranch {
            claim_id,
            old: old.to_string(),
            new: new.to_string(),
        })?;

        let repo = state.repo_mut(claim_id)?;
        let has_old = repo.branches.contains_key(old.as_str());
        let has_new = repo.branches.contains_key(new.as_str());
        match (has_old, has_new) {
            (true, false) => {
                if let Some(branch) = repo.branches.remove(old.as_str()) {
                    repo.branches.insert(new.to_string(), branch);
                }
                Ok(())
            }
            // Already renamed by an earlier attempt.
            (false, true) => Ok(()),
            (true, true) => Err(GitHostError::Conflict {
                message: format!("branch {} already exists", new),
                paths: Vec::new(),
            }),
            (false, false) => Err(GitHostError::NotFound(format!("branch {}", old))),
        }
    }
}
