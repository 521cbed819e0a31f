use chrono::{DateTime, Utc};
use std::fmt;

/// An item that can live in a paged collection. The id is the opaque
/// GraphQL node id; it is globally unique and the dedup key on merge.
pub trait PagedItem {
    fn id(&self) -> &str;
}

/// GitHub issue as returned by the search and lookup queries.
#[derive(Debug, Clone, PartialEq)]
pub struct Issue {
    pub id: String,
    pub number: u64,
    pub title: String,
    pub body: String,
    pub state: IssueState,
    pub author: String,
    pub comment_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub url: String,
}

impl PagedItem for Issue {
    fn id(&self) -> &str {
        &self.id
    }
}

/// A single comment on an issue.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub id: String,
    pub author: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub url: String,
}

impl PagedItem for Comment {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueState {
    Open,
    Closed,
}

impl fmt::Display for IssueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueState::Open => write!(f, "Open"),
            IssueState::Closed => write!(f, "Closed"),
        }
    }
}

/// State filter for the issue search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StateFilter {
    #[default]
    Open,
    Closed,
    All,
}

impl StateFilter {
    pub fn cycle(self) -> Self {
        match self {
            StateFilter::Open => StateFilter::Closed,
            StateFilter::Closed => StateFilter::All,
            StateFilter::All => StateFilter::Open,
        }
    }

    /// Search-syntax value, None when the filter places no constraint.
    pub fn as_qualifier(self) -> Option<&'static str> {
        match self {
            StateFilter::Open => Some("OPEN"),
            StateFilter::Closed => Some("CLOSED"),
            StateFilter::All => None,
        }
    }
}

impl fmt::Display for StateFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateFilter::Open => write!(f, "Open"),
            StateFilter::Closed => write!(f, "Closed"),
            StateFilter::All => write!(f, "All"),
        }
    }
}

/// Where the free-text term is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchScope {
    Title,
    Body,
    #[default]
    Both,
}

impl SearchScope {
    pub fn cycle(self) -> Self {
        match self {
            SearchScope::Title => SearchScope::Body,
            SearchScope::Body => SearchScope::Both,
            SearchScope::Both => SearchScope::Title,
        }
    }

    pub fn as_qualifier(self) -> &'static str {
        match self {
            SearchScope::Title => "title",
            SearchScope::Body => "body",
            SearchScope::Both => "title,body",
        }
    }
}

impl fmt::Display for SearchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchScope::Title => write!(f, "title"),
            SearchScope::Body => write!(f, "body"),
            SearchScope::Both => write!(f, "title+body"),
        }
    }
}

/// Cursor-pagination metadata for one fetched page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageInfo {
    pub end_cursor: Option<String>,
    pub has_next_page: bool,
}

/// One fetched page of a cursor-paginated collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub page_info: PageInfo,
}
