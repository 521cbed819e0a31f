use crate::types::{Page, PagedItem};

/// Fetch lifecycle of a paged collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    LoadingMore,
    Ready,
    Error,
}

/// Accumulated state of one cursor-paginated collection (the issue list,
/// or one issue's comments). The store performs no I/O: the driver calls
/// `begin_fetch`, runs the fetch itself, and feeds the outcome back through
/// `merge_page` or `fail_fetch`.
///
/// Each fetch is tagged with the generation returned by `begin_fetch`.
/// `reset` and first-page fetches bump the generation, so a completion for
/// an abandoned search is dropped instead of overwriting newer state.
#[derive(Debug)]
pub struct PagedStore<T> {
    items: Vec<T>,
    total_count: u64,
    cursor: Option<String>,
    has_next_page: bool,
    phase: Phase,
    error: Option<String>,
    generation: u64,
}

impl<T> Default for PagedStore<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total_count: 0,
            cursor: None,
            has_next_page: false,
            phase: Phase::Idle,
            error: None,
            generation: 0,
        }
    }
}

impl<T: PagedItem> PagedStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    pub fn has_next_page(&self) -> bool {
        self.has_next_page
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, Phase::Loading | Phase::LoadingMore)
    }

    /// Whether a "load more" request is warranted right now. This is the
    /// gate against duplicate in-flight requests: callers must check it
    /// before spawning a next-page fetch.
    pub fn can_load_more(&self) -> bool {
        self.has_next_page && !self.is_loading()
    }

    /// Discard everything and return to `Idle`. Invalidates in-flight
    /// fetches. Idempotent apart from the generation bump.
    pub fn reset(&mut self) {
        self.items.clear();
        self.total_count = 0;
        self.cursor = None;
        self.has_next_page = false;
        self.phase = Phase::Idle;
        self.error = None;
        self.generation += 1;
    }

    /// Mark a fetch as started and return the token its completion must
    /// present. A first-page fetch supersedes anything in flight.
    pub fn begin_fetch(&mut self, first_page: bool) -> u64 {
        if first_page {
            self.generation += 1;
            self.phase = Phase::Loading;
        } else {
            self.phase = Phase::LoadingMore;
        }
        self.generation
    }

    /// Merge a successfully fetched page. A first page replaces the
    /// collection outright (new search replaces list); later pages append,
    /// skipping ids already present. GitHub occasionally re-delivers the
    /// boundary item across a page break, so the id guard is load-bearing.
    pub fn merge_page(&mut self, page: Page<T>, first_page: bool, token: u64) {
        if token != self.generation {
            tracing::debug!(token, current = self.generation, "dropping stale page");
            return;
        }

        if first_page {
            self.items = page.items;
        } else {
            for item in page.items {
                if !self.items.iter().any(|existing| existing.id() == item.id()) {
                    self.items.push(item);
                }
            }
        }

        // The server recomputes the true total on every query.
        self.total_count = page.total_count;
        self.cursor = page.page_info.end_cursor;
        self.has_next_page = page.page_info.has_next_page;
        self.phase = Phase::Ready;
        self.error = None;
    }

    /// Record a failed fetch. Items already loaded stay visible; only the
    /// trailing attempt is marked failed, and the user may retry.
    pub fn fail_fetch(&mut self, message: impl Into<String>, token: u64) {
        if token != self.generation {
            tracing::debug!(token, current = self.generation, "dropping stale error");
            return;
        }
        self.phase = Phase::Error;
        self.error = Some(message.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PageInfo;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: String,
    }

    impl PagedItem for Row {
        fn id(&self) -> &str {
            &self.id
        }
    }

    fn row(id: &str) -> Row {
        Row { id: id.to_string() }
    }

    fn page(ids: &[&str], total: u64, cursor: &str, has_next: bool) -> Page<Row> {
        Page {
            items: ids.iter().map(|id| row(id)).collect(),
            total_count: total,
            page_info: PageInfo {
                end_cursor: Some(cursor.to_string()),
                has_next_page: has_next,
            },
        }
    }

    fn ids(store: &PagedStore<Row>) -> Vec<&str> {
        store.items().iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn starts_idle_and_empty() {
        let store: PagedStore<Row> = PagedStore::new();
        assert_eq!(store.phase(), Phase::Idle);
        assert!(store.is_empty());
        assert_eq!(store.total_count(), 0);
        assert_eq!(store.cursor(), None);
        assert!(!store.has_next_page());
        assert_eq!(store.error(), None);
    }

    #[test]
    fn first_page_merge_reaches_ready() {
        let mut store = PagedStore::new();
        let token = store.begin_fetch(true);
        assert_eq!(store.phase(), Phase::Loading);

        store.merge_page(page(&["a", "b"], 5, "c1", true), true, token);
        assert_eq!(store.phase(), Phase::Ready);
        assert_eq!(ids(&store), vec!["a", "b"]);
        assert_eq!(store.total_count(), 5);
        assert_eq!(store.cursor(), Some("c1"));
        assert!(store.has_next_page());
    }

    #[test]
    fn later_pages_dedup_by_id() {
        let mut store = PagedStore::new();
        let token = store.begin_fetch(true);
        store.merge_page(page(&["a", "b"], 4, "c1", true), true, token);

        // Boundary item "b" re-delivered by the second page.
        let token = store.begin_fetch(false);
        store.merge_page(page(&["b", "c", "d"], 4, "c2", false), false, token);

        assert_eq!(ids(&store), vec!["a", "b", "c", "d"]);
        assert_eq!(store.cursor(), Some("c2"));
        assert!(!store.has_next_page());
    }

    #[test]
    fn merging_same_page_twice_is_idempotent() {
        let mut store = PagedStore::new();
        let token = store.begin_fetch(true);
        store.merge_page(page(&["a"], 3, "c1", true), true, token);

        let token = store.begin_fetch(false);
        let next = page(&["b", "c"], 3, "c2", false);
        store.merge_page(next.clone(), false, token);
        store.merge_page(next, false, token);

        assert_eq!(ids(&store), vec!["a", "b", "c"]);
        assert_eq!(store.total_count(), 3);
        assert_eq!(store.cursor(), Some("c2"));
    }

    #[test]
    fn first_page_replaces_accumulated_items() {
        let mut store = PagedStore::new();
        let token = store.begin_fetch(true);
        store.merge_page(page(&["a", "b", "c"], 3, "c1", false), true, token);

        // New search: old items fully discarded, not appended to.
        let token = store.begin_fetch(true);
        store.merge_page(page(&["x"], 1, "c9", false), true, token);

        assert_eq!(ids(&store), vec!["x"]);
        assert_eq!(store.total_count(), 1);
        assert_eq!(store.cursor(), Some("c9"));
    }

    #[test]
    fn failed_load_more_retains_items() {
        let mut store = PagedStore::new();
        let token = store.begin_fetch(true);
        store.merge_page(page(&["a", "b"], 10, "c1", true), true, token);

        let token = store.begin_fetch(false);
        assert_eq!(store.phase(), Phase::LoadingMore);
        store.fail_fetch("boom", token);

        assert_eq!(store.phase(), Phase::Error);
        assert_eq!(store.error(), Some("boom"));
        assert_eq!(ids(&store), vec!["a", "b"]);
    }

    #[test]
    fn retry_load_more_after_error_keeps_items() {
        let mut store = PagedStore::new();
        let token = store.begin_fetch(true);
        store.merge_page(page(&["a"], 2, "c1", true), true, token);

        let token = store.begin_fetch(false);
        store.fail_fetch("timeout", token);

        // Error -> LoadingMore without discarding what is already loaded.
        let token = store.begin_fetch(false);
        assert_eq!(store.phase(), Phase::LoadingMore);
        assert_eq!(ids(&store), vec!["a"]);

        store.merge_page(page(&["b"], 2, "c2", false), false, token);
        assert_eq!(store.phase(), Phase::Ready);
        assert_eq!(store.error(), None);
        assert_eq!(ids(&store), vec!["a", "b"]);
    }

    #[test]
    fn can_load_more_gating() {
        let mut store: PagedStore<Row> = PagedStore::new();
        assert!(!store.can_load_more()); // no next page known yet

        let token = store.begin_fetch(true);
        assert!(!store.can_load_more()); // Loading

        store.merge_page(page(&["a"], 2, "c1", true), true, token);
        assert!(store.can_load_more());

        store.begin_fetch(false);
        assert!(!store.can_load_more()); // LoadingMore

        let token = store.begin_fetch(true);
        store.merge_page(page(&["a", "b"], 2, "c2", false), true, token);
        assert!(!store.can_load_more()); // hasNextPage = false
    }

    #[test]
    fn reset_is_idempotent() {
        let mut store = PagedStore::new();
        let token = store.begin_fetch(true);
        store.merge_page(page(&["a", "b"], 7, "c1", true), true, token);

        store.reset();
        store.reset();

        assert_eq!(store.phase(), Phase::Idle);
        assert!(store.is_empty());
        assert_eq!(store.total_count(), 0);
        assert_eq!(store.cursor(), None);
        assert!(!store.has_next_page());
        assert_eq!(store.error(), None);
    }

    #[test]
    fn stale_page_after_reset_is_dropped() {
        let mut store = PagedStore::new();
        let stale = store.begin_fetch(true);
        store.reset();

        store.merge_page(page(&["old"], 1, "c1", true), true, stale);
        assert!(store.is_empty());
        assert_eq!(store.phase(), Phase::Idle);
    }

    #[test]
    fn stale_page_after_new_search_is_dropped() {
        let mut store = PagedStore::new();
        let slow = store.begin_fetch(true);

        // User types a new search before the first response arrives.
        let fresh = store.begin_fetch(true);
        store.merge_page(page(&["new"], 1, "c2", false), true, fresh);

        // The abandoned search completes late.
        store.merge_page(page(&["old"], 1, "c1", false), true, slow);

        assert_eq!(ids(&store), vec!["new"]);
        assert_eq!(store.cursor(), Some("c2"));
    }

    #[test]
    fn stale_error_is_dropped() {
        let mut store = PagedStore::new();
        let stale = store.begin_fetch(true);
        let fresh = store.begin_fetch(true);
        store.merge_page(page(&["a"], 1, "c1", false), true, fresh);

        store.fail_fetch("slow request failed", stale);
        assert_eq!(store.phase(), Phase::Ready);
        assert_eq!(store.error(), None);
    }

    #[test]
    fn end_to_end_two_page_scenario() {
        let mut store = PagedStore::new();
        assert_eq!(store.phase(), Phase::Idle);

        let token = store.begin_fetch(true);
        assert_eq!(store.phase(), Phase::Loading);
        store.merge_page(page(&["1"], 1, "c1", true), true, token);
        assert_eq!(ids(&store), vec!["1"]);
        assert_eq!(store.total_count(), 1);
        assert_eq!(store.cursor(), Some("c1"));
        assert!(store.has_next_page());
        assert_eq!(store.phase(), Phase::Ready);

        let token = store.begin_fetch(false);
        assert_eq!(store.phase(), Phase::LoadingMore);
        store.merge_page(page(&["1", "2"], 2, "c2", false), false, token);
        assert_eq!(ids(&store), vec!["1", "2"]);
        assert_eq!(store.total_count(), 2);
        assert_eq!(store.cursor(), Some("c2"));
        assert!(!store.has_next_page());
        assert_eq!(store.phase(), Phase::Ready);
    }
}
