use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc;

use crate::action::Action;
use crate::config::Repository;
use crate::event::Event;
use crate::query::{build_search_query, SearchParams};
use crate::source::IssueSource;
use crate::store::{PagedStore, Phase};
use crate::types::{Comment, Issue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    IssueList,
    IssueDetail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    Search,
}

pub struct App {
    pub screen: Screen,
    pub input_mode: InputMode,

    /// Parameters of the last confirmed search.
    pub search: SearchParams,
    /// Search text being edited (committed on Enter).
    pub search_input: String,

    pub issues: PagedStore<Issue>,
    pub comments: PagedStore<Comment>,
    pub issue_index: usize,
    pub comment_index: usize,

    // Detail view
    pub selected_issue: Option<Issue>,
    pub detail_loading: bool,
    pub detail_error: Option<String>,
    detail_number: Option<u64>,
    issue_load_gen: u64,

    // Whether the last dispatched fetch per collection was a first page,
    // so a retry can repeat exactly what failed.
    issues_last_first: bool,
    comments_last_first: bool,

    pub repo: Repository,
    pub page_size: u32,
    pub should_quit: bool,
    initial_issue: Option<u64>,

    source: Arc<dyn IssueSource>,
    action_tx: mpsc::UnboundedSender<Action>,
}

impl App {
    pub fn new(
        source: Arc<dyn IssueSource>,
        repo: Repository,
        page_size: u32,
        initial_issue: Option<u64>,
        action_tx: mpsc::UnboundedSender<Action>,
    ) -> Self {
        Self {
            screen: Screen::IssueList,
            input_mode: InputMode::default(),
            search: SearchParams::default(),
            search_input: String::new(),
            issues: PagedStore::new(),
            comments: PagedStore::new(),
            issue_index: 0,
            comment_index: 0,
            selected_issue: None,
            detail_loading: false,
            detail_error: None,
            detail_number: None,
            issue_load_gen: 0,
            issues_last_first: true,
            comments_last_first: true,
            repo,
            page_size,
            should_quit: false,
            initial_issue,
            source,
            action_tx,
        }
    }

    pub fn handle_event(&self, event: Event) -> Action {
        match event {
            Event::Init => match self.initial_issue {
                Some(number) => Action::LoadIssue(number),
                None => Action::LoadIssues { first_page: true },
            },
            Event::Key(key) => self.handle_key(key),
            Event::Render => Action::None,
        }
    }

    fn handle_key(&self, key: KeyEvent) -> Action {
        if self.input_mode == InputMode::Search {
            return match key.code {
                KeyCode::Esc => Action::ExitSearchMode,
                KeyCode::Enter => Action::SearchConfirm,
                KeyCode::Backspace => Action::SearchBackspace,
                KeyCode::Char(c) => Action::SearchInput(c),
                _ => Action::None,
            };
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                if self.screen == Screen::IssueList {
                    Action::Quit
                } else {
                    Action::Back
                }
            }
            KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => Action::PageDown,
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => Action::PageUp,
            KeyCode::Char('j') | KeyCode::Down => Action::ScrollDown,
            KeyCode::Char('k') | KeyCode::Up => Action::ScrollUp,
            KeyCode::Char('g') => Action::GoToTop,
            KeyCode::Char('G') => Action::GoToBottom,
            KeyCode::Enter => Action::Select,
            KeyCode::Char('/') => {
                if self.screen == Screen::IssueList {
                    Action::EnterSearchMode
                } else {
                    Action::None
                }
            }
            KeyCode::Char('s') => {
                if self.screen == Screen::IssueList {
                    Action::CycleStateFilter
                } else {
                    Action::None
                }
            }
            KeyCode::Char('i') => {
                if self.screen == Screen::IssueList {
                    Action::CycleSearchScope
                } else {
                    Action::None
                }
            }
            KeyCode::Char('r') => Action::Retry,
            KeyCode::Char('R') => Action::Refresh,
            KeyCode::Char('o') => Action::OpenInBrowser,
            _ => Action::None,
        }
    }

    pub fn update(&mut self, action: Action) {
        match action {
            Action::Quit => {
                self.should_quit = true;
            }
            Action::Back => {
                if self.screen == Screen::IssueDetail {
                    self.screen = Screen::IssueList;
                    self.selected_issue = None;
                    self.detail_loading = false;
                    self.detail_error = None;
                    self.detail_number = None;
                    self.comment_index = 0;
                    // Tear down the comments collection; a late completion
                    // for it is invalidated by the reset.
                    self.comments.reset();
                    self.issue_load_gen += 1;
                    // A deep-linked start skipped the list fetch entirely;
                    // do it now instead of landing on an idle screen.
                    if self.issues.phase() == Phase::Idle {
                        self.load_issues(true);
                    }
                }
            }

            Action::ScrollUp => self.scroll_by(-1),
            Action::ScrollDown => self.scroll_by(1),
            Action::PageUp => self.scroll_by(-10),
            Action::PageDown => self.scroll_by(10),
            Action::GoToTop => match self.screen {
                Screen::IssueList => self.issue_index = 0,
                Screen::IssueDetail => self.comment_index = 0,
            },
            Action::GoToBottom => match self.screen {
                Screen::IssueList => {
                    self.issue_index = self.issues.len().saturating_sub(1);
                }
                Screen::IssueDetail => {
                    self.comment_index = self.comments.len().saturating_sub(1);
                }
            },

            Action::Select => {
                if self.screen == Screen::IssueList {
                    if let Some(issue) = self.issues.items().get(self.issue_index) {
                        self.open_issue(issue.clone());
                    }
                }
            }

            Action::EnterSearchMode => {
                self.input_mode = InputMode::Search;
                self.search_input = self.search.term.clone();
            }
            Action::ExitSearchMode => {
                self.input_mode = InputMode::Normal;
                self.search_input = self.search.term.clone();
            }
            Action::SearchInput(c) => {
                self.search_input.push(c);
            }
            Action::SearchBackspace => {
                self.search_input.pop();
            }
            Action::SearchConfirm => {
                self.input_mode = InputMode::Normal;
                self.search.term = self.search_input.clone();
                self.restart_search();
            }
            Action::CycleStateFilter => {
                self.search.state = self.search.state.cycle();
                self.restart_search();
            }
            Action::CycleSearchScope => {
                self.search.scope = self.search.scope.cycle();
                self.restart_search();
            }

            Action::LoadIssues { first_page } => self.load_issues(first_page),
            Action::IssuesLoaded {
                page,
                first_page,
                token,
            } => {
                self.issues.merge_page(page, first_page, token);
                self.issue_index = self.issue_index.min(self.issues.len().saturating_sub(1));
            }
            Action::IssuesFailed { message, token } => {
                self.issues.fail_fetch(message, token);
            }

            Action::LoadIssue(number) => self.load_issue(number),
            Action::IssueLoaded { issue, token } => {
                if token == self.issue_load_gen {
                    self.detail_loading = false;
                    self.open_issue(*issue);
                }
            }
            Action::IssueFailed { message, token } => {
                if token == self.issue_load_gen {
                    self.detail_loading = false;
                    self.detail_error = Some(message);
                    self.screen = Screen::IssueDetail;
                }
            }

            Action::LoadComments { first_page } => self.load_comments(first_page),
            Action::CommentsLoaded {
                page,
                first_page,
                token,
            } => {
                self.comments.merge_page(page, first_page, token);
                self.comment_index = self.comment_index.min(self.comments.len().saturating_sub(1));
            }
            Action::CommentsFailed { message, token } => {
                self.comments.fail_fetch(message, token);
            }

            Action::Retry => self.retry(),
            Action::Refresh => match self.screen {
                Screen::IssueList => self.load_issues(true),
                Screen::IssueDetail => self.load_comments(true),
            },
            Action::OpenInBrowser => {
                let url = match self.screen {
                    Screen::IssueList => self
                        .issues
                        .items()
                        .get(self.issue_index)
                        .map(|i| i.url.clone()),
                    Screen::IssueDetail => self.selected_issue.as_ref().map(|i| i.url.clone()),
                };
                if let Some(url) = url {
                    if let Err(e) = open::that(url) {
                        tracing::warn!("could not open browser: {}", e);
                    }
                }
            }

            Action::None => {}
        }
    }

    /// Move the active selection, requesting the next page when the user
    /// runs past the end of what is loaded.
    fn scroll_by(&mut self, delta: i64) {
        match self.screen {
            Screen::IssueList => {
                let len = self.issues.len();
                let at_end = len == 0 || self.issue_index + 1 >= len;
                if delta > 0 && at_end {
                    if self.issues.can_load_more() {
                        self.load_issues(false);
                    }
                } else {
                    self.issue_index = step(self.issue_index, delta, len);
                }
            }
            Screen::IssueDetail => {
                let len = self.comments.len();
                let at_end = len == 0 || self.comment_index + 1 >= len;
                if delta > 0 && at_end {
                    if self.comments.can_load_more() {
                        self.load_comments(false);
                    }
                } else {
                    self.comment_index = step(self.comment_index, delta, len);
                }
            }
        }
    }

    fn restart_search(&mut self) {
        self.issue_index = 0;
        self.issues.reset();
        self.load_issues(true);
    }

    fn open_issue(&mut self, issue: Issue) {
        self.selected_issue = Some(issue);
        self.detail_error = None;
        self.screen = Screen::IssueDetail;
        self.comment_index = 0;
        self.comments.reset();
        self.load_comments(true);
    }

    fn load_issues(&mut self, first_page: bool) {
        if !first_page && !self.issues.can_load_more() {
            return;
        }
        self.issues_last_first = first_page;

        let token = self.issues.begin_fetch(first_page);
        let query = build_search_query(&self.repo.owner, &self.repo.name, &self.search);
        let after = if first_page {
            None
        } else {
            self.issues.cursor().map(str::to_string)
        };
        let first = self.page_size;

        let tx = self.action_tx.clone();
        let source = Arc::clone(&self.source);
        tokio::spawn(async move {
            match source.search_issues(&query, first, after.as_deref()).await {
                Ok(page) => {
                    tx.send(Action::IssuesLoaded {
                        page,
                        first_page,
                        token,
                    })
                    .ok();
                }
                Err(e) => {
                    tx.send(Action::IssuesFailed {
                        message: e.to_string(),
                        token,
                    })
                    .ok();
                }
            }
        });
    }

    fn load_issue(&mut self, number: u64) {
        self.detail_loading = true;
        self.detail_error = None;
        self.detail_number = Some(number);
        self.screen = Screen::IssueDetail;
        self.issue_load_gen += 1;
        let token = self.issue_load_gen;

        let tx = self.action_tx.clone();
        let source = Arc::clone(&self.source);
        tokio::spawn(async move {
            match source.get_issue(number).await {
                Ok(issue) => {
                    tx.send(Action::IssueLoaded {
                        issue: Box::new(issue),
                        token,
                    })
                    .ok();
                }
                Err(e) => {
                    tx.send(Action::IssueFailed {
                        message: e.to_string(),
                        token,
                    })
                    .ok();
                }
            }
        });
    }

    fn load_comments(&mut self, first_page: bool) {
        let Some(number) = self.selected_issue.as_ref().map(|i| i.number) else {
            return;
        };
        if !first_page && !self.comments.can_load_more() {
            return;
        }
        self.comments_last_first = first_page;

        let token = self.comments.begin_fetch(first_page);
        let after = if first_page {
            None
        } else {
            self.comments.cursor().map(str::to_string)
        };
        let first = self.page_size;

        let tx = self.action_tx.clone();
        let source = Arc::clone(&self.source);
        tokio::spawn(async move {
            match source.list_comments(number, first, after.as_deref()).await {
                Ok(page) => {
                    tx.send(Action::CommentsLoaded {
                        page,
                        first_page,
                        token,
                    })
                    .ok();
                }
                Err(e) => {
                    tx.send(Action::CommentsFailed {
                        message: e.to_string(),
                        token,
                    })
                    .ok();
                }
            }
        });
    }

    /// Re-issue exactly the fetch that failed: a first page restarts from
    /// scratch, a load-more retries without discarding accumulated items.
    fn retry(&mut self) {
        match self.screen {
            Screen::IssueList => {
                if self.issues.phase() == Phase::Error {
                    self.load_issues(self.issues_last_first);
                }
            }
            Screen::IssueDetail => {
                if self.detail_error.is_some() {
                    if let Some(number) = self.detail_number {
                        self.load_issue(number);
                    }
                } else if self.comments.phase() == Phase::Error {
                    self.load_comments(self.comments_last_first);
                }
            }
        }
    }
}

fn step(index: usize, delta: i64, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let max = len - 1;
    let next = index as i64 + delta;
    next.clamp(0, max as i64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result, TriageError};
    use crate::types::{IssueState, Page, PageInfo};
    use async_trait::async_trait;
    use chrono::Utc;

    #[derive(Debug)]
    struct CannedSource {
        issue_page: Page<Issue>,
        comment_page: Page<Comment>,
        fail: bool,
    }

    #[async_trait]
    impl IssueSource for CannedSource {
        fn name(&self) -> &str {
            "canned"
        }

        async fn search_issues(
            &self,
            _query: &str,
            _first: u32,
            _after: Option<&str>,
        ) -> Result<Page<Issue>> {
            if self.fail {
                Err(TriageError::Api("search failed".to_string()))
            } else {
                Ok(self.issue_page.clone())
            }
        }

        async fn get_issue(&self, number: u64) -> Result<Issue> {
            if self.fail {
                Err(TriageError::NotFound(number))
            } else {
                Ok(self.issue_page.items[0].clone())
            }
        }

        async fn list_comments(
            &self,
            _number: u64,
            _first: u32,
            _after: Option<&str>,
        ) -> Result<Page<Comment>> {
            if self.fail {
                Err(TriageError::Api("comments failed".to_string()))
            } else {
                Ok(self.comment_page.clone())
            }
        }
    }

    fn issue(id: &str, number: u64) -> Issue {
        Issue {
            id: id.to_string(),
            number,
            title: format!("issue {}", number),
            body: String::new(),
            state: IssueState::Open,
            author: "octocat".to_string(),
            comment_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            url: format!("https://example.com/issues/{}", number),
        }
    }

    fn issue_page(has_next: bool) -> Page<Issue> {
        Page {
            items: vec![issue("I_1", 1), issue("I_2", 2)],
            total_count: 2,
            page_info: PageInfo {
                end_cursor: Some("c1".to_string()),
                has_next_page: has_next,
            },
        }
    }

    fn comment_page() -> Page<Comment> {
        Page {
            items: vec![Comment {
                id: "IC_1".to_string(),
                author: "alice".to_string(),
                body: "hi".to_string(),
                created_at: Utc::now(),
                url: String::new(),
            }],
            total_count: 1,
            page_info: PageInfo::default(),
        }
    }

    fn app_with(
        fail: bool,
        has_next: bool,
    ) -> (App, mpsc::UnboundedReceiver<Action>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let source = Arc::new(CannedSource {
            issue_page: issue_page(has_next),
            comment_page: comment_page(),
            fail,
        });
        let app = App::new(source, Repository::default(), 10, None, tx);
        (app, rx)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[tokio::test]
    async fn initial_load_populates_issue_store() {
        let (mut app, mut rx) = app_with(false, true);

        app.update(Action::LoadIssues { first_page: true });
        assert_eq!(app.issues.phase(), Phase::Loading);

        let loaded = rx.recv().await.unwrap();
        app.update(loaded);

        assert_eq!(app.issues.phase(), Phase::Ready);
        assert_eq!(app.issues.len(), 2);
        assert_eq!(app.issues.total_count(), 2);
        assert!(app.issues.can_load_more());
    }

    #[tokio::test]
    async fn failed_search_surfaces_error_and_keeps_nothing_stale() {
        let (mut app, mut rx) = app_with(true, false);

        app.update(Action::LoadIssues { first_page: true });
        let failed = rx.recv().await.unwrap();
        app.update(failed);

        assert_eq!(app.issues.phase(), Phase::Error);
        assert_eq!(app.issues.error(), Some("API error: search failed"));
        assert!(app.issues.is_empty());
    }

    #[tokio::test]
    async fn selecting_an_issue_opens_detail_and_loads_comments() {
        let (mut app, mut rx) = app_with(false, false);

        app.update(Action::LoadIssues { first_page: true });
        let loaded = rx.recv().await.unwrap();
        app.update(loaded);

        app.update(Action::Select);
        assert_eq!(app.screen, Screen::IssueDetail);
        assert_eq!(app.selected_issue.as_ref().map(|i| i.number), Some(1));
        assert_eq!(app.comments.phase(), Phase::Loading);

        let comments = rx.recv().await.unwrap();
        app.update(comments);
        assert_eq!(app.comments.phase(), Phase::Ready);
        assert_eq!(app.comments.len(), 1);
    }

    #[tokio::test]
    async fn back_resets_comments_collection() {
        let (mut app, mut rx) = app_with(false, false);

        app.update(Action::LoadIssues { first_page: true });
        let loaded = rx.recv().await.unwrap();
        app.update(loaded);
        app.update(Action::Select);

        app.update(Action::Back);
        assert_eq!(app.screen, Screen::IssueList);
        assert!(app.selected_issue.is_none());
        assert_eq!(app.comments.phase(), Phase::Idle);

        // The in-flight comment fetch completes after the teardown and
        // must be dropped by the reset's generation bump.
        let late = rx.recv().await.unwrap();
        app.update(late);
        assert_eq!(app.comments.phase(), Phase::Idle);
        assert!(app.comments.is_empty());
    }

    #[tokio::test]
    async fn back_from_deep_linked_issue_loads_the_list() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let source = Arc::new(CannedSource {
            issue_page: issue_page(false),
            comment_page: comment_page(),
            fail: false,
        });
        let mut app = App::new(source, Repository::default(), 10, Some(1), tx);

        // Started with --issue: Init jumps straight to the detail view.
        let init = app.handle_event(Event::Init);
        app.update(init);
        assert_eq!(app.screen, Screen::IssueDetail);

        let issue = rx.recv().await.unwrap();
        app.update(issue);
        let comments = rx.recv().await.unwrap();
        app.update(comments);

        // The list was never fetched, so Back must fetch it instead of
        // leaving an idle, empty screen.
        app.update(Action::Back);
        assert_eq!(app.screen, Screen::IssueList);
        assert_eq!(app.issues.phase(), Phase::Loading);

        let loaded = rx.recv().await.unwrap();
        app.update(loaded);
        assert_eq!(app.issues.phase(), Phase::Ready);
        assert_eq!(app.issues.len(), 2);
    }

    #[tokio::test]
    async fn load_more_is_refused_without_next_page() {
        let (mut app, mut rx) = app_with(false, false);

        app.update(Action::LoadIssues { first_page: true });
        let loaded = rx.recv().await.unwrap();
        app.update(loaded);

        assert!(!app.issues.can_load_more());
        app.update(Action::LoadIssues { first_page: false });
        assert_eq!(app.issues.phase(), Phase::Ready); // no fetch started
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn confirming_a_search_resets_and_reloads() {
        let (mut app, mut rx) = app_with(false, false);

        app.update(Action::LoadIssues { first_page: true });
        let loaded = rx.recv().await.unwrap();
        app.update(loaded);
        assert_eq!(app.issues.len(), 2);

        app.update(Action::EnterSearchMode);
        for c in "crash".chars() {
            app.update(Action::SearchInput(c));
        }
        app.update(Action::SearchConfirm);

        assert_eq!(app.search.term, "crash");
        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.issues.phase(), Phase::Loading);
        assert!(app.issues.is_empty());
    }

    #[test]
    fn search_mode_captures_text_keys() {
        let (mut app, _rx) = app_with(false, false);
        app.update(Action::EnterSearchMode);

        assert!(matches!(
            app.handle_key(key(KeyCode::Char('q'))),
            Action::SearchInput('q')
        ));
        assert!(matches!(
            app.handle_key(key(KeyCode::Enter)),
            Action::SearchConfirm
        ));
        assert!(matches!(
            app.handle_key(key(KeyCode::Esc)),
            Action::ExitSearchMode
        ));
    }

    #[test]
    fn normal_mode_key_bindings() {
        let (app, _rx) = app_with(false, false);
        assert!(matches!(app.handle_key(key(KeyCode::Char('q'))), Action::Quit));
        assert!(matches!(
            app.handle_key(key(KeyCode::Char('/'))),
            Action::EnterSearchMode
        ));
        assert!(matches!(
            app.handle_key(key(KeyCode::Char('s'))),
            Action::CycleStateFilter
        ));
        assert!(matches!(
            app.handle_key(key(KeyCode::Char('j'))),
            Action::ScrollDown
        ));
        assert!(matches!(app.handle_key(key(KeyCode::Enter)), Action::Select));
    }

    #[test]
    fn step_clamps_to_bounds() {
        assert_eq!(step(0, -1, 5), 0);
        assert_eq!(step(4, 1, 5), 4);
        assert_eq!(step(2, 10, 5), 4);
        assert_eq!(step(2, -10, 5), 0);
        assert_eq!(step(0, 1, 0), 0);
    }
}
