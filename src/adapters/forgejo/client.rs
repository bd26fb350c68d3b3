//! Forgejo implementation of the GitHost port.
//!
//! Each claim owns one repository named by the claim UUID under a configured
//! organization. Every call checks for already-applied state before writing,
//! so the worker can repeat any operation after a partial failure.
//!
//! # Configuration
//!
//! ```ignore
//! let config = ForgejoConfig::new("http://forgejo:3000", "claims", token)
//!     .with_webhook("http://api:8000/webhooks/forgejo", webhook_secret)
//!     .with_request_timeout(Duration::from_secs(30));
//!
//! let host = ForgejoGitHost::new(config)?;
//! ```

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::{redirect, Client, Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::foundation::ClaimId;
use crate::domain::outbox::{truncate_chars, GitRef};
use crate::ports::{CommitAuthor, FileChange, GitHost, GitHostError};

/// Longest response body kept in an API error message.
const MAX_ERROR_BODY_CHARS: usize = 500;

/// Configuration for the Forgejo adapter.
#[derive(Debug, Clone)]
pub struct ForgejoConfig {
    /// Instance root, e.g. `http://forgejo:3000`.
    pub base_url: String,
    pub organization: String,
    api_token: SecretString,
    /// URL the push webhook delivers to.
    pub webhook_callback_url: String,
    webhook_secret: Option<SecretString>,
    pub default_branch: GitRef,
    /// Committer recorded on every commit; the author comes from the payload.
    pub committer: CommitAuthor,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl ForgejoConfig {
    pub fn new(
        base_url: impl Into<String>,
        organization: impl Into<String>,
        api_token: SecretString,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            organization: organization.into(),
            api_token,
            webhook_callback_url: String::new(),
            webhook_secret: None,
            default_branch: GitRef::main(),
            committer: CommitAuthor {
                name: "claim-mirror".to_string(),
                email: "service@claims.local".to_string(),
            },
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Sets the push webhook target and its shared secret.
    pub fn with_webhook(
        mut self,
        callback_url: impl Into<String>,
        secret: Option<SecretString>,
    ) -> Self {
        self.webhook_callback_url = callback_url.into();
        self.webhook_secret = secret;
        self
    }

    pub fn with_default_branch(mut self, branch: GitRef) -> Self {
        self.default_branch = branch;
        self
    }

    pub fn with_committer(mut self, committer: CommitAuthor) -> Self {
        self.committer = committer;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// GitHost backed by the Forgejo REST API (`/api/v1`).
pub struct ForgejoGitHost {
    config: ForgejoConfig,
    client: Client,
}

impl ForgejoGitHost {
    pub fn new(config: ForgejoConfig) -> Result<Self, GitHostError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|e| GitHostError::Unavailable(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn repo_path(&self, claim_id: ClaimId) -> String {
        format!("repos/{}/{}", self.config.organization, claim_id)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/api/v1/{}", self.config.base_url, path))
            .header(
                "Authorization",
                format!("token {}", self.config.api_token.expose_secret()),
            )
            .header("Accept", "application/json")
    }

    /// Sends `request` and maps failures onto `GitHostError`.
    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response, GitHostError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                GitHostError::Unavailable(format!("{} timed out", what))
            } else if e.is_connect() {
                GitHostError::Unavailable(format!(
                    "cannot connect to {}: {}",
                    self.config.base_url, e
                ))
            } else {
                GitHostError::Unavailable(format!("{} failed: {}", what, e))
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(map_status(status, what, &body))
    }

    /// Like `send`, but a 404 becomes `None`.
    async fn send_optional(
        &self,
        request: RequestBuilder,
        what: &str,
    ) -> Result<Option<Response>, GitHostError> {
        match self.send(request, what).await {
            Ok(response) => Ok(Some(response)),
            Err(GitHostError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn branch_exists(&self, claim_id: ClaimId, branch: &GitRef) -> Result<bool, GitHostError> {
        let path = format!("{}/branches/{}", self.repo_path(claim_id), branch);
        let found = self
            .send_optional(self.request(Method::GET, &path), "get branch")
            .await?;
        Ok(found.is_some())
    }

    async fn existing_file_sha(
        &self,
        claim_id: ClaimId,
        path: &str,
        branch: &GitRef,
    ) -> Result<Option<String>, GitHostError> {
        let url = format!("{}/contents/{}", self.repo_path(claim_id), path);
        let request = self
            .request(Method::GET, &url)
            .query(&[("ref", branch.as_str())]);
        match self.send_optional(request, "get file").await? {
            Some(response) => {
                let file: ContentsEntry = decode(response, "get file").await?;
                Ok(Some(file.sha))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl GitHost for ForgejoGitHost {
    async fn create_repo(&self, claim_id: ClaimId) -> Result<String, GitHostError> {
        let existing = self
            .send_optional(
                self.request(Method::GET, &self.repo_path(claim_id)),
                "get repository",
            )
            .await?;
        if let Some(response) = existing {
            let repo: RepositoryResponse = decode(response, "get repository").await?;
            tracing::info!(claim_id = %claim_id, repo_id = repo.id, "Repository already exists");
            return Ok(repo.id.to_string());
        }

        let body = CreateRepositoryRequest {
            name: claim_id.to_string(),
            description: format!("Claim {}", claim_id),
            private: true,
            auto_init: false,
            default_branch: self.config.default_branch.as_str(),
        };
        let path = format!("orgs/{}/repos", self.config.organization);
        let response = self
            .send(self.request(Method::POST, &path).json(&body), "create repository")
            .await?;
        let repo: RepositoryResponse = decode(response, "create repository").await?;

        tracing::info!(claim_id = %claim_id, repo_id = repo.id, "Created repository");
        Ok(repo.id.to_string())
    }

    async fn commit_files(
        &self,
        claim_id: ClaimId,
        files: &[FileChange],
        author: &CommitAuthor,
        message: &str,
        branch: &GitRef,
    ) -> Result<String, GitHostError> {
        // The contents API writes one file per commit; the last commit is the head.
        let mut head = String::new();

        for file in files {
            let sha = self.existing_file_sha(claim_id, &file.path, branch).await?;
            let method = if sha.is_some() { Method::PUT } else { Method::POST };
            let body = FileWriteRequest {
                message,
                content: BASE64.encode(file.content.as_bytes()),
                branch: branch.as_str(),
                sha,
                author: Identity::from(author),
                committer: Identity::from(&self.config.committer),
            };

            let url = format!("{}/contents/{}", self.repo_path(claim_id), file.path);
            let response = self
                .send(self.request(method, &url).json(&body), "write file")
                .await?;
            let written: FileWriteResponse = decode(response, "write file").await?;
            head = written.commit.sha;
        }

        tracing::info!(
            claim_id = %claim_id,
            branch = %branch,
            files = files.len(),
            head = %head,
            "Committed files"
        );
        Ok(head)
    }

    async fn setup_branch_protection(&self, claim_id: ClaimId) -> Result<(), GitHostError> {
        let branch = &self.config.default_branch;
        let path = format!("{}/branch_protections", self.repo_path(claim_id));

        let existing = self
            .send_optional(
                self.request(Method::GET, &format!("{}/{}", path, branch)),
                "get branch protection",
            )
            .await?;
        if existing.is_some() {
            tracing::debug!(claim_id = %claim_id, branch = %branch, "Branch protection already present");
            return Ok(());
        }

        let body = BranchProtectionRequest {
            branch_name: branch.as_str(),
            rule_name: branch.as_str(),
            enable_push: true,
            enable_push_whitelist: false,
            enable_force_push: false,
            enable_merge_whitelist: false,
            enable_status_check: false,
            enable_approvals_whitelist: false,
            require_signed_commits: false,
        };
        self.send(
            self.request(Method::POST, &path).json(&body),
            "create branch protection",
        )
        .await?;

        tracing::info!(claim_id = %claim_id, branch = %branch, "Branch protection configured");
        Ok(())
    }

    async fn setup_webhook(&self, claim_id: ClaimId) -> Result<(), GitHostError> {
        let path = format!("{}/hooks", self.repo_path(claim_id));
        let callback_url = &self.config.webhook_callback_url;

        let response = self
            .send(self.request(Method::GET, &path), "list hooks")
            .await?;
        let hooks: Vec<HookResponse> = decode(response, "list hooks").await?;
        if hooks.iter().any(|h| &h.config.url == callback_url) {
            tracing::debug!(claim_id = %claim_id, "Webhook already registered");
            return Ok(());
        }

        let body = CreateHookRequest {
            hook_type: "forgejo",
            active: true,
            config: CreateHookConfig {
                url: callback_url,
                content_type: "json",
                secret: self
                    .config
                    .webhook_secret
                    .as_ref()
                    .map(|s| s.expose_secret().as_str())
                    .unwrap_or_default(),
            },
            events: vec!["push"],
        };
        self.send(self.request(Method::POST, &path).json(&body), "create hook")
            .await?;

        tracing::info!(claim_id = %claim_id, "Webhook registered");
        Ok(())
    }

    async fn create_branch(
        &self,
        claim_id: ClaimId,
        name: &GitRef,
        from: &GitRef,
    ) -> Result<(), GitHostError> {
        if self.branch_exists(claim_id, name).await? {
            tracing::debug!(claim_id = %claim_id, branch = %name, "Branch already exists");
            return Ok(());
        }

        let body = CreateBranchRequest {
            new_branch_name: name.as_str(),
            old_branch_name: from.as_str(),
        };
        let path = format!("{}/branches", self.repo_path(claim_id));
        self.send(self.request(Method::POST, &path).json(&body), "create branch")
            .await?;

        tracing::info!(claim_id = %claim_id, branch = %name, from = %from, "Created branch");
        Ok(())
    }

    async fn rename_branch(
        &self,
        claim_id: ClaimId,
        old: &GitRef,
        new: &GitRef,
    ) -> Result<(), GitHostError> {
        let old_exists = self.branch_exists(claim_id, old).await?;
        let new_exists = self.branch_exists(claim_id, new).await?;

        match (old_exists, new_exists) {
            (false, true) => {
                tracing::debug!(claim_id = %claim_id, old = %old, new = %new, "Rename already applied");
                return Ok(());
            }
            (false, false) => {
                return Err(GitHostError::NotFound(format!("branch {}", old)));
            }
            (true, true) => {
                return Err(GitHostError::Conflict {
                    message: format!("branch {} already exists", new),
                    paths: Vec::new(),
                });
            }
            (true, false) => {}
        }

        let path = format!("{}/branches/{}", self.repo_path(claim_id), old);
        self.send(
            self.request(Method::PATCH, &path)
                .json(&RenameBranchRequest { name: new.as_str() }),
            "rename branch",
        )
        .await?;

        tracing::info!(claim_id = %claim_id, old = %old, new = %new, "Renamed branch");
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Wire types
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Serialize)]
struct CreateRepositoryRequest<'a> {
    name: String,
    description: String,
    private: bool,
    auto_init: bool,
    default_branch: &'a str,
}

#[derive(Debug, Deserialize)]
struct RepositoryResponse {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct ContentsEntry {
    sha: String,
}

#[derive(Debug, Serialize)]
struct Identity<'a> {
    name: &'a str,
    email: &'a str,
}

impl<'a> From<&'a CommitAuthor> for Identity<'a> {
    fn from(author: &'a CommitAuthor) -> Self {
        Self {
            name: &author.name,
            email: &author.email,
        }
    }
}

#[derive(Debug, Serialize)]
struct FileWriteRequest<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<String>,
    author: Identity<'a>,
    committer: Identity<'a>,
}

#[derive(Debug, Deserialize)]
struct FileWriteResponse {
    commit: CommitRef,
}

#[derive(Debug, Deserialize)]
struct CommitRef {
    sha: String,
}

#[derive(Debug, Serialize)]
struct BranchProtectionRequest<'a> {
    branch_name: &'a str,
    rule_name: &'a str,
    enable_push: bool,
    enable_push_whitelist: bool,
    enable_force_push: bool,
    enable_merge_whitelist: bool,
    enable_status_check: bool,
    enable_approvals_whitelist: bool,
    require_signed_commits: bool,
}

#[derive(Debug, Deserialize)]
struct HookResponse {
    config: HookConfigResponse,
}

#[derive(Debug, Deserialize)]
struct HookConfigResponse {
    #[serde(default)]
    url: String,
}

#[derive(Debug, Serialize)]
struct CreateHookRequest<'a> {
    #[serde(rename = "type")]
    hook_type: &'a str,
    active: bool,
    config: CreateHookConfig<'a>,
    events: Vec<&'a str>,
}

#[derive(Debug, Serialize)]
struct CreateHookConfig<'a> {
    url: &'a str,
    content_type: &'a str,
    secret: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateBranchRequest<'a> {
    new_branch_name: &'a str,
    old_branch_name: &'a str,
}

#[derive(Debug, Serialize)]
struct RenameBranchRequest<'a> {
    name: &'a str,
}

#[derive(Debug, Deserialize)]
struct ConflictBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    conflicting_files: Vec<String>,
}

// ════════════════════════════════════════════════════════════════════════════
// Helper functions
// ════════════════════════════════════════════════════════════════════════════

async fn decode<T: for<'de> Deserialize<'de>>(
    response: Response,
    what: &str,
) -> Result<T, GitHostError> {
    let status = response.status();
    response.json::<T>().await.map_err(|e| GitHostError::Api {
        status: status.as_u16(),
        message: format!("unexpected {} response: {}", what, e),
    })
}

fn map_status(status: StatusCode, what: &str, body: &str) -> GitHostError {
    match status {
        StatusCode::NOT_FOUND => GitHostError::NotFound(what.to_string()),
        StatusCode::CONFLICT => {
            let parsed: Option<ConflictBody> = serde_json::from_str(body).ok();
            let (message, paths) = match parsed {
                Some(c) => (
                    c.message.unwrap_or_else(|| "conflict".to_string()),
                    c.conflicting_files,
                ),
                None => ("conflict".to_string(), Vec::new()),
            };
            GitHostError::Conflict { message, paths }
        }
        StatusCode::SERVICE_UNAVAILABLE => {
            GitHostError::Unavailable(format!("{} returned 503", what))
        }
        _ => {
            let detail = if body.is_empty() {
                status.as_u16().to_string()
            } else {
                truncate_chars(body, MAX_ERROR_BODY_CHARS)
            };
            GitHostError::Api {
                status: status.as_u16(),
                message: format!("{}: {}", what, detail),
            }
        }
    }
}
