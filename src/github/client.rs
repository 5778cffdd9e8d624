//! Thin GitHub REST client.
//!
//! Every call carries the caller's token as a bearer header; nothing is
//! cached. Status mapping:
//! - 401 → `AppError::Unauthorized` (UI redirects to sign-in)
//! - 404 → `AppError::NotFound`
//! - anything else non-2xx → `AppError::Upstream`

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{ACCEPT, AUTHORIZATION, LINK};
use reqwest::{Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::RepoId;
use crate::error::{AppError, Result};
use crate::export::{ContentSource, EntryKind, TreeEntry};
use crate::models::{
    format_relative_time, BranchSummary, CommitSummary, FileContent, GitHubUser, Page, RepoSummary,
    TreeListing,
};

const USER_AGENT: &str = concat!("devshelf/", env!("CARGO_PKG_VERSION"));
const MAX_PER_PAGE: u32 = 100;

#[derive(Debug, Deserialize)]
struct ApiMessage {
    message: String,
}

#[derive(Debug, Deserialize)]
struct GitTreeItem {
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct GitTreeResponse {
    tree: Vec<GitTreeItem>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    content: Option<String>,
    encoding: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommitAuthor {
    name: Option<String>,
    email: Option<String>,
    date: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Deserialize)]
struct CommitBody {
    message: String,
    author: Option<CommitAuthor>,
}

#[derive(Debug, Deserialize)]
struct CommitItem {
    sha: String,
    html_url: Option<String>,
    commit: CommitBody,
}

impl From<CommitItem> for CommitSummary {
    fn from(item: CommitItem) -> Self {
        let author = item.commit.author;
        let date = author.as_ref().and_then(|a| a.date);
        CommitSummary {
            sha: item.sha,
            message: item.commit.message.trim().to_string(),
            author_name: author
                .as_ref()
                .and_then(|a| a.name.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
            author_email: author.as_ref().and_then(|a| a.email.clone()).unwrap_or_default(),
            date,
            relative_time: date.map(|d| format_relative_time(d.timestamp())),
            html_url: item.html_url,
        }
    }
}

#[derive(Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_base: Url,
}

impl GitHubClient {
    pub fn new(api_base: &str) -> Result<Self> {
        let api_base = Url::parse(api_base)
            .map_err(|e| AppError::BadRequest(format!("invalid GitHub API URL {}: {}", api_base, e)))?;
        if api_base.cannot_be_a_base() {
            return Err(AppError::BadRequest(format!("invalid GitHub API URL {}", api_base)));
        }
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { http, api_base })
    }

    /// Builds an API URL from path segments; each segment is percent-encoded.
    pub fn url<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Result<Url> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::Internal("GitHub API URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, token: &str, url: Url) -> Result<Response> {
        tracing::debug!("GET {}", url);
        let response = self
            .http
            .get(url)
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .header(ACCEPT, "application/vnd.github+json")
            .send()
            .await?;
        check_status(response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, token: &str, url: Url) -> Result<T> {
        Ok(self.send(token, url).await?.json().await?)
    }

    async fn get_page<T: DeserializeOwned>(
        &self,
        token: &str,
        mut url: Url,
        page: u32,
        per_page: u32,
    ) -> Result<Page<T>> {
        let page = page.max(1);
        let per_page = per_page.clamp(1, MAX_PER_PAGE);
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("per_page", &per_page.to_string());

        let response = self.send(token, url).await?;
        let has_more = response
            .headers()
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .is_some_and(has_next_link);
        let items = response.json().await?;

        Ok(Page { items, page, per_page, has_more })
    }

    pub async fn current_user(&self, token: &str) -> Result<GitHubUser> {
        self.get_json(token, self.url(["user"])?).await
    }

    pub async fn list_repos(
        &self,
        token: &str,
        page: u32,
        per_page: u32,
        sort: Option<&str>,
    ) -> Result<Page<RepoSummary>> {
        let mut url = self.url(["user", "repos"])?;
        url.query_pairs_mut().append_pair("sort", sort.unwrap_or("updated"));
        self.get_page(token, url, page, per_page).await
    }

    pub async fn get_repo(&self, token: &str, repo: &RepoId) -> Result<RepoSummary> {
        self.get_json(token, self.url(["repos", repo.owner.as_str(), repo.name.as_str()])?).await
    }

    pub async fn list_branches(&self, token: &str, repo: &RepoId) -> Result<Vec<BranchSummary>> {
        let mut url = self.url(["repos", repo.owner.as_str(), repo.name.as_str(), "branches"])?;
        url.query_pairs_mut().append_pair("per_page", &MAX_PER_PAGE.to_string());
        self.get_json(token, url).await
    }

    pub async fn list_commits(
        &self,
        token: &str,
        repo: &RepoId,
        git_ref: Option<&str>,
        path: Option<&str>,
        page: u32,
        per_page: u32,
    ) -> Result<Page<CommitSummary>> {
        let mut url = self.url(["repos", repo.owner.as_str(), repo.name.as_str(), "commits"])?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(r) = git_ref.filter(|r| !r.is_empty()) {
                query.append_pair("sha", r);
            }
            if let Some(p) = path.filter(|p| !p.is_empty()) {
                query.append_pair("path", p);
            }
        }
        let raw: Page<CommitItem> = self.get_page(token, url, page, per_page).await?;
        Ok(Page {
            items: raw.items.into_iter().map(CommitSummary::from).collect(),
            page: raw.page,
            per_page: raw.per_page,
            has_more: raw.has_more,
        })
    }

    /// Full recursive listing; `git_ref` defaults to the repository's
    /// default branch. Submodule entries are dropped.
    pub async fn get_tree(&self, token: &str, repo: &RepoId, git_ref: Option<&str>) -> Result<TreeListing> {
        let git_ref = match git_ref.filter(|r| !r.is_empty()) {
            Some(r) => r.to_string(),
            None => self
                .get_repo(token, repo)
                .await?
                .default_branch
                .unwrap_or_else(|| "main".to_string()),
        };

        let mut url = self.url(["repos", repo.owner.as_str(), repo.name.as_str(), "git", "trees", git_ref.as_str()])?;
        url.query_pairs_mut().append_pair("recursive", "1");
        let response: GitTreeResponse = self.get_json(token, url).await?;

        if response.truncated {
            tracing::warn!("Tree listing for {}@{} was truncated by GitHub", repo, git_ref);
        }

        Ok(TreeListing {
            repo: repo.to_string(),
            git_ref,
            entries: tree_entries(response.tree),
            truncated: response.truncated,
        })
    }

    pub async fn get_file(
        &self,
        token: &str,
        repo: &RepoId,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<FileContent> {
        let path = path.trim_matches('/');
        if path.is_empty() {
            return Err(AppError::BadRequest("path is required".to_string()));
        }

        let mut url = self.url(
            ["repos", repo.owner.as_str(), repo.name.as_str(), "contents"]
                .into_iter()
                .chain(path.split('/')),
        )?;
        if let Some(r) = git_ref.filter(|r| !r.is_empty()) {
            url.query_pairs_mut().append_pair("ref", r);
        }

        let response: ContentResponse = self.get_json(token, url).await?;
        let content = decode_content(&response, path)?;
        Ok(FileContent { path: path.to_string(), content })
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .json::<ApiMessage>()
        .await
        .map(|m| m.message)
        .unwrap_or_else(|_| status.to_string());
    tracing::warn!("GitHub responded {}: {}", status, message);

    Err(match status {
        StatusCode::UNAUTHORIZED => AppError::Unauthorized(message),
        StatusCode::NOT_FOUND => AppError::NotFound(message),
        _ => AppError::Upstream { status: status.as_u16(), message },
    })
}

fn has_next_link(link: &str) -> bool {
    link.split(',').any(|part| part.contains("rel=\"next\""))
}

fn tree_entries(items: Vec<GitTreeItem>) -> Vec<TreeEntry> {
    items
        .into_iter()
        .filter_map(|item| {
            let kind = match item.kind.as_str() {
                "tree" => EntryKind::Tree,
                "blob" => EntryKind::Blob,
                _ => return None,
            };
            Some(TreeEntry { path: item.path, kind })
        })
        .collect()
}

fn decode_content(response: &ContentResponse, path: &str) -> Result<String> {
    let Some(encoded) = response.content.as_deref() else {
        return Err(AppError::BadRequest(format!("{} is not a file", path)));
    };
    if let Some(encoding) = response.encoding.as_deref() {
        if encoding != "base64" {
            return Err(AppError::Decode(format!("{}: unsupported encoding {}", path, encoding)));
        }
    }

    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact)
        .map_err(|e| AppError::Decode(format!("{}: {}", path, e)))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// A client bound to one token and ref, used as the export's content source.
#[derive(Clone)]
pub struct GitHubSource {
    client: GitHubClient,
    token: String,
    git_ref: Option<String>,
}

impl GitHubSource {
    pub fn new(client: GitHubClient, token: String, git_ref: Option<String>) -> Self {
        Self { client, token, git_ref }
    }
}

impl ContentSource for GitHubSource {
    async fn fetch_text(&self, repo: &RepoId, path: &str) -> Result<String> {
        let file = self
            .client
            .get_file(&self.token, repo, path, self.git_ref.as_deref())
            .await?;
        Ok(file.content)
    }
}
