use crate::types::{Comment, Issue, Page};

/// Everything the app can be told to do, by a keypress or by a completed
/// fetch. Fetch completions carry the generation token handed out when the
/// fetch began; the stores drop completions whose token is stale.
#[derive(Debug, Clone)]
pub enum Action {
    Quit,
    Back,

    // List navigation
    ScrollUp,
    ScrollDown,
    PageUp,
    PageDown,
    GoToTop,
    GoToBottom,
    Select,

    // Search editing
    EnterSearchMode,
    ExitSearchMode,
    SearchInput(char),
    SearchBackspace,
    SearchConfirm,
    CycleStateFilter,
    CycleSearchScope,

    // Issue list fetches
    LoadIssues {
        first_page: bool,
    },
    IssuesLoaded {
        page: Page<Issue>,
        first_page: bool,
        token: u64,
    },
    IssuesFailed {
        message: String,
        token: u64,
    },

    // Single-issue lookup (deep link via --issue)
    LoadIssue(u64),
    IssueLoaded {
        issue: Box<Issue>,
        token: u64,
    },
    IssueFailed {
        message: String,
        token: u64,
    },

    // Comment fetches for the open issue
    LoadComments {
        first_page: bool,
    },
    CommentsLoaded {
        page: Page<Comment>,
        first_page: bool,
        token: u64,
    },
    CommentsFailed {
        message: String,
        token: u64,
    },

    Retry,
    Refresh,
    OpenInBrowser,

    None,
}
