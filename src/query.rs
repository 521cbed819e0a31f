use crate::types::{SearchScope, StateFilter};

/// User-controlled search parameters for the issue list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParams {
    pub term: String,
    pub state: StateFilter,
    pub scope: SearchScope,
}

/// Build the GitHub search-syntax string for an issue search. The
/// repository and `is:issue` qualifiers are always present (`type: ISSUE`
/// search alone still matches pull requests); the state qualifier is
/// omitted for `All`; the term and its `in:` scope are omitted when the
/// term is blank.
pub fn build_search_query(owner: &str, name: &str, params: &SearchParams) -> String {
    let mut query = format!("repo:{}/{} is:issue", owner, name);

    if let Some(state) = params.state.as_qualifier() {
        query.push_str(&format!(" state:{}", state));
    }

    let term = params.term.trim();
    if !term.is_empty() {
        query.push_str(&format!(" {} in:{}", term, params.scope.as_qualifier()));
    }

    query
}
