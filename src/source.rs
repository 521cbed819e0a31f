use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Comment, Issue, Page};

/// Where issues come from. The stores never talk to this directly: the
/// app drives a fetch against it and feeds the resulting `Page` (or error
/// message) into the owning store.
#[async_trait]
pub trait IssueSource: Send + Sync + std::fmt::Debug {
    /// Human-readable name of the backing service.
    fn name(&self) -> &str;

    /// Search issues with GitHub search syntax, one page at a time.
    async fn search_issues(
        &self,
        query: &str,
        first: u32,
        after: Option<&str>,
    ) -> Result<Page<Issue>>;

    /// Look up a single issue by number.
    async fn get_issue(&self, number: u64) -> Result<Issue>;

    /// One page of an issue's comments.
    async fn list_comments(
        &self,
        number: u64,
        first: u32,
        after: Option<&str>,
    ) -> Result<Page<Comment>>;
}
