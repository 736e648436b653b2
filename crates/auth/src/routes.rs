//! Navigation targets and the static route access table.

use std::borrow::Cow;

use crate::Role;

pub const LOGIN_PATH: &str = "/login";
pub const UNAUTHORIZED_PATH: &str = "/unauthorized";

/// A navigation target produced by guards and session handling.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Unauthorized,
    Dashboard(Role),
    Page(String),
}

impl Route {
    pub fn path(&self) -> Cow<'_, str> {
        match self {
            Route::Login => Cow::Borrowed(LOGIN_PATH),
            Route::Unauthorized => Cow::Borrowed(UNAUTHORIZED_PATH),
            Route::Dashboard(role) => Cow::Borrowed(role.dashboard_path()),
            Route::Page(path) => Cow::Borrowed(path.as_str()),
        }
    }

    /// Map a path back to the most specific variant.
    pub fn from_path(path: &str) -> Route {
        let path = normalize(path);
        if path == LOGIN_PATH {
            return Route::Login;
        }
        if path == UNAUTHORIZED_PATH {
            return Route::Unauthorized;
        }
        Role::ALL
            .into_iter()
            .find(|role| role.dashboard_path() == path)
            .map(Route::Dashboard)
            .unwrap_or_else(|| Route::Page(path.to_string()))
    }
}

impl core::fmt::Display for Route {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.path())
    }
}

/// Access requirement declared by a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteAccess {
    /// No token needed.
    Public,
    /// A token is needed; `required_role` restricts it further when set.
    Protected { required_role: Option<String> },
}

impl RouteAccess {
    pub fn required_role(&self) -> Option<&str> {
        match self {
            RouteAccess::Public => None,
            RouteAccess::Protected { required_role } => required_role.as_deref(),
        }
    }
}

/// Static path → access table.
///
/// Lookups match whole path segments and prefer the longest registered
/// prefix, so `/dashboard/teacher/grades` inherits `/dashboard/teacher`.
/// Paths with no registered prefix are unknown; callers send those to login.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    entries: Vec<(String, RouteAccess)>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn public(mut self, path: &str) -> Self {
        self.insert(path, RouteAccess::Public);
        self
    }

    pub fn protected(mut self, path: &str, required_role: Option<&str>) -> Self {
        self.insert(
            path,
            RouteAccess::Protected {
                required_role: required_role.map(str::to_string),
            },
        );
        self
    }

    fn insert(&mut self, path: &str, access: RouteAccess) {
        let path = normalize(path).to_string();
        self.entries.retain(|(existing, _)| *existing != path);
        self.entries.push((path, access));
    }

    pub fn lookup(&self, path: &str) -> Option<&RouteAccess> {
        let path = normalize(path);
        self.entries
            .iter()
            .filter(|(prefix, _)| covers(prefix, path))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, access)| access)
    }

    /// The dashboard layout used by the school front-end.
    pub fn school_default() -> Self {
        Self::new()
            .public(LOGIN_PATH)
            .public(UNAUTHORIZED_PATH)
            .protected("/dashboard", None)
            .protected(Role::Student.dashboard_path(), Some(Role::Student.as_str()))
            .protected(Role::Teacher.dashboard_path(), Some(Role::Teacher.as_str()))
            .protected(Role::Admin.dashboard_path(), Some(Role::Admin.as_str()))
    }
}

fn normalize(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}

fn covers(prefix: &str, path: &str) -> bool {
    if prefix == "/" {
        return true;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
