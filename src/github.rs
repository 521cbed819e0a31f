use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{Result, TriageError};
use crate::source::IssueSource;
use crate::types::{Comment, Issue, IssueState, Page, PageInfo};

const GRAPHQL_URL: &str = "https://api.github.com/graphql";

const ISSUE_FIELDS: &str = r#"
    id
    number
    title
    bodyText
    state
    createdAt
    updatedAt
    url
    author { login }
    comments { totalCount }
"#;

fn search_issues_document() -> String {
    format!(
        r#"query SearchIssues($query: String!, $first: Int!, $after: String) {{
            search(query: $query, type: ISSUE, first: $first, after: $after) {{
                issueCount
                pageInfo {{ hasNextPage endCursor }}
                nodes {{ ... on Issue {{ {fields} }} }}
            }}
        }}"#,
        fields = ISSUE_FIELDS
    )
}

fn get_issue_document() -> String {
    format!(
        r#"query GetIssue($owner: String!, $name: String!, $number: Int!) {{
            repository(owner: $owner, name: $name) {{
                issue(number: $number) {{ {fields} }}
            }}
        }}"#,
        fields = ISSUE_FIELDS
    )
}

const GET_COMMENTS_DOCUMENT: &str = r#"query GetIssueComments($owner: String!, $name: String!, $number: Int!, $first: Int!, $after: String) {
    repository(owner: $owner, name: $name) {
        issue(number: $number) {
            comments(first: $first, after: $after) {
                totalCount
                pageInfo { hasNextPage endCursor }
                nodes {
                    id
                    author { login }
                    bodyText
                    createdAt
                    url
                }
            }
        }
    }
}"#;

/// GitHub GraphQL v4 client, scoped to one repository.
pub struct GitHubClient {
    http: reqwest::Client,
    token: String,
    owner: String,
    repo: String,
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .finish_non_exhaustive()
    }
}

impl GitHubClient {
    pub fn new(token: String, owner: String, repo: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| TriageError::Network(e.to_string()))?;

        Ok(Self {
            http,
            token,
            owner,
            repo,
        })
    }

    async fn post<T: DeserializeOwned>(
        &self,
        document: &str,
        variables: serde_json::Value,
    ) -> Result<T> {
        let response = self
            .http
            .post(GRAPHQL_URL)
            .bearer_auth(&self.token)
            .header("User-Agent", "triage")
            .json(&serde_json::json!({ "query": document, "variables": variables }))
            .send()
            .await
            .map_err(|e| TriageError::Network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(TriageError::Auth(format!("GitHub rejected the token ({})", status)));
        }
        if !status.is_success() {
            return Err(TriageError::Api(format!("GitHub returned {}", status)));
        }

        let envelope: GraphQlResponse<T> = response
            .json()
            .await
            .map_err(|e| TriageError::Api(format!("malformed response: {}", e)))?;

        envelope.into_data()
    }
}

#[async_trait]
impl IssueSource for GitHubClient {
    fn name(&self) -> &str {
        "GitHub"
    }

    async fn search_issues(
        &self,
        query: &str,
        first: u32,
        after: Option<&str>,
    ) -> Result<Page<Issue>> {
        tracing::debug!(query, first, ?after, "searching issues");
        let data: SearchData = self
            .post(
                &search_issues_document(),
                serde_json::json!({ "query": query, "first": first, "after": after }),
            )
            .await?;

        Ok(data.search.into_page())
    }

    async fn get_issue(&self, number: u64) -> Result<Issue> {
        let data: RepositoryData<IssueHolder> = self
            .post(
                &get_issue_document(),
                serde_json::json!({
                    "owner": self.owner,
                    "name": self.repo,
                    "number": number,
                }),
            )
            .await?;

        data.repository
            .and_then(|r| r.issue)
            .map(Issue::from)
            .ok_or(TriageError::NotFound(number))
    }

    async fn list_comments(
        &self,
        number: u64,
        first: u32,
        after: Option<&str>,
    ) -> Result<Page<Comment>> {
        tracing::debug!(number, first, ?after, "fetching comments");
        let data: RepositoryData<CommentsHolder> = self
            .post(
                GET_COMMENTS_DOCUMENT,
                serde_json::json!({
                    "owner": self.owner,
                    "name": self.repo,
                    "number": number,
                    "first": first,
                    "after": after,
                }),
            )
            .await?;

        let comments = data
            .repository
            .and_then(|r| r.issue)
            .map(|i| i.comments)
            .ok_or(TriageError::NotFound(number))?;

        Ok(comments.into_page())
    }
}

// Wire shapes. GraphQL responses arrive camelCased; everything below is
// private to this module and converted to domain types at the boundary.

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

impl<T> GraphQlResponse<T> {
    fn into_data(self) -> Result<T> {
        if let Some(errors) = self.errors.filter(|e| !e.is_empty()) {
            let joined = errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(TriageError::Api(joined));
        }
        self.data
            .ok_or_else(|| TriageError::Api("response contained no data".to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct SearchData {
    search: SearchConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchConnection {
    issue_count: u64,
    page_info: WirePageInfo,
    nodes: Vec<SearchNode>,
}

/// `search(type: ISSUE)` also matches pull requests; those fall outside
/// the `... on Issue` fragment and arrive as empty objects. Decode them
/// without failing the page and drop them on conversion.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SearchNode {
    Issue(Box<WireIssue>),
    Other(serde::de::IgnoredAny),
}

impl SearchConnection {
    fn into_page(self) -> Page<Issue> {
        Page {
            items: self
                .nodes
                .into_iter()
                .filter_map(|node| match node {
                    SearchNode::Issue(issue) => Some(Issue::from(*issue)),
                    SearchNode::Other(_) => None,
                })
                .collect(),
            total_count: self.issue_count,
            page_info: self.page_info.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RepositoryData<T> {
    repository: Option<T>,
}

#[derive(Debug, Deserialize)]
struct IssueHolder {
    issue: Option<WireIssue>,
}

#[derive(Debug, Deserialize)]
struct CommentsHolder {
    issue: Option<IssueComments>,
}

#[derive(Debug, Deserialize)]
struct IssueComments {
    comments: CommentConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentConnection {
    total_count: u64,
    page_info: WirePageInfo,
    nodes: Vec<WireComment>,
}

impl CommentConnection {
    fn into_page(self) -> Page<Comment> {
        Page {
            items: self.nodes.into_iter().map(Comment::from).collect(),
            total_count: self.total_count,
            page_info: self.page_info.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

impl From<WirePageInfo> for PageInfo {
    fn from(info: WirePageInfo) -> Self {
        PageInfo {
            end_cursor: info.end_cursor,
            has_next_page: info.has_next_page,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireActor {
    login: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireCommentCount {
    total_count: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireIssue {
    id: String,
    number: u64,
    title: String,
    #[serde(default)]
    body_text: String,
    state: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    url: String,
    author: Option<WireActor>,
    comments: WireCommentCount,
}

impl From<WireIssue> for Issue {
    fn from(issue: WireIssue) -> Self {
        Issue {
            id: issue.id,
            number: issue.number,
            title: issue.title,
            body: issue.body_text,
            state: match issue.state.as_str() {
                "CLOSED" => IssueState::Closed,
                _ => IssueState::Open,
            },
            author: issue
                .author
                .map(|a| a.login)
                .unwrap_or_else(|| "ghost".to_string()),
            comment_count: issue.comments.total_count,
            created_at: issue.created_at,
            updated_at: issue.updated_at,
            url: issue.url,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireComment {
    id: String,
    author: Option<WireActor>,
    #[serde(default)]
    body_text: String,
    created_at: DateTime<Utc>,
    url: String,
}

impl From<WireComment> for Comment {
    fn from(comment: WireComment) -> Self {
        Comment {
            id: comment.id,
            author: comment
                .author
                .map(|a| a.login)
                .unwrap_or_else(|| "ghost".to_string()),
            body: comment.body_text,
            created_at: comment.created_at,
            url: comment.url,
        }
    }
}
