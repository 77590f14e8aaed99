//! Views the client can show and the history of which one is current.
//!
//! [`Navigator`] is the routing surface the controllers write to. `push` adds
//! a history entry; `replace` swaps the current one so the history never
//! returns to it (used after login and for every forced redirect).

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use store::ContactId;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    /// Landing view for an authenticated user.
    Home,
    Login,
    Register,
    Contacts,
    Create,
    Edit { id: ContactId },
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::Login => "/login".to_string(),
            Route::Register => "/register".to_string(),
            Route::Contacts => "/mycontacts".to_string(),
            Route::Create => "/create".to_string(),
            Route::Edit { id } => format!("/edit/{id}"),
        }
    }

    /// Parse a path. Returns `None` for an empty path and for paths that name
    /// no view.
    pub fn parse(path: &str) -> Option<Route> {
        let path = path.trim();
        if path.is_empty() {
            return None;
        }
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "" => Some(Route::Home),
            "/login" => Some(Route::Login),
            "/register" => Some(Route::Register),
            "/mycontacts" => Some(Route::Contacts),
            "/create" => Some(Route::Create),
            _ => trimmed
                .strip_prefix("/edit/")
                .filter(|id| !id.is_empty() && !id.contains('/'))
                .map(|id| Route::Edit { id: ContactId::new(id) }),
        }
    }

    /// Views reachable without a session.
    pub fn is_public(&self) -> bool {
        matches!(self, Route::Login | Route::Register)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

#[derive(Clone, Debug, Default)]
pub struct Navigator {
    history: Arc<Mutex<Vec<Route>>>,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, route: Route) {
        tracing::debug!(%route, "navigate");
        self.history.lock().push(route);
    }

    pub fn replace(&self, route: Route) {
        tracing::debug!(%route, "navigate (replace)");
        let mut history = self.history.lock();
        match history.last_mut() {
            Some(current) => *current = route,
            None => history.push(route),
        }
    }

    pub fn current(&self) -> Option<Route> {
        self.history.lock().last().cloned()
    }

    pub fn history(&self) -> Vec<Route> {
        self.history.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips_paths() {
        for route in [
            Route::Home,
            Route::Login,
            Route::Register,
            Route::Contacts,
            Route::Create,
            Route::Edit { id: ContactId::new("42") },
        ] {
            assert_eq!(Route::parse(&route.path()), Some(route));
        }
        assert_eq!(Route::parse("/login/"), Some(Route::Login));
        assert_eq!(Route::parse(""), None);
        assert_eq!(Route::parse("/nowhere"), None);
        assert_eq!(Route::parse("/edit/"), None);
    }

    #[test]
    fn test_replace_hides_previous_entry() {
        let nav = Navigator::new();
        nav.push(Route::Contacts);
        nav.push(Route::Login);
        nav.replace(Route::Home);

        assert_eq!(nav.history(), vec![Route::Contacts, Route::Home]);
        assert_eq!(nav.current(), Some(Route::Home));
    }

    #[test]
    fn test_replace_on_empty_history() {
        let nav = Navigator::new();
        nav.replace(Route::Login);
        assert_eq!(nav.current(), Some(Route::Login));
    }
}
