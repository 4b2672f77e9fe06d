//! Which pages need a session, and where to send callers who lack one.
//!
//! The table is fixed at construction. Decisions depend only on the path and
//! whether the caller holds a session, so they are pure and cheap to test.

use std::collections::BTreeSet;

/// Paths reachable without a session.
pub const DEFAULT_PUBLIC_PATHS: [&str; 3] = ["/", "/login", "/register"];
/// Where anonymous callers are sent.
pub const DEFAULT_LOGIN_PATH: &str = "/login";
/// Where signed-in callers land when they open the login page.
pub const DEFAULT_HOME_PATH: &str = "/";

/// Outcome of evaluating one request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(String),
}

/// Public paths plus the two redirect targets.
///
/// # Examples
/// ```
/// use threads_web::domain::{GuardDecision, RouteTable};
///
/// let table = RouteTable::default();
/// assert_eq!(table.decide("/profile", false), GuardDecision::Redirect("/login".into()));
/// assert_eq!(table.decide("/login", true), GuardDecision::Redirect("/".into()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    public: BTreeSet<String>,
    login_path: String,
    home_path: String,
}

impl RouteTable {
    pub fn new<I, S>(public: I, login_path: impl Into<String>, home_path: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            public: public.into_iter().map(Into::into).collect(),
            login_path: login_path.into(),
            home_path: home_path.into(),
        }
    }

    /// True when `path` is reachable without a session.
    pub fn is_public(&self, path: &str) -> bool {
        self.public.contains(path)
    }

    /// Decide whether the request may proceed; first matching rule wins.
    pub fn decide(&self, path: &str, authenticated: bool) -> GuardDecision {
        let public = self.is_public(path);
        if public && authenticated && path == self.login_path {
            return GuardDecision::Redirect(self.home_path.clone());
        }
        if public || authenticated {
            return GuardDecision::Allow;
        }
        GuardDecision::Redirect(self.login_path.clone())
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new(DEFAULT_PUBLIC_PATHS, DEFAULT_LOGIN_PATH, DEFAULT_HOME_PATH)
    }
}

/// Prefixes the guard never evaluates.
pub const DEFAULT_EXCLUDED_PREFIXES: [&str; 9] = [
    "/actions",
    "/health",
    "/ws",
    "/static",
    "/docs",
    "/api-docs",
    "/favicon.ico",
    "/sw.js",
    "/manifest.json",
];

/// Decides which paths the guard runs on at all.
///
/// Form actions, probes, sockets and static assets answer for themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathFilter {
    excluded_prefixes: Vec<String>,
}

impl PathFilter {
    pub fn new<I, S>(excluded_prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            excluded_prefixes: excluded_prefixes.into_iter().map(Into::into).collect(),
        }
    }

    /// True when the guard must evaluate `path`.
    ///
    /// A prefix excludes the exact path and anything below it, so `/ws`
    /// excludes `/ws/otp` but not `/wsx`.
    pub fn applies_to(&self, path: &str) -> bool {
        !self.excluded_prefixes.iter().any(|prefix| {
            path.strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
    }
}

impl Default for PathFilter {
    fn default() -> Self {
        Self::new(DEFAULT_EXCLUDED_PREFIXES)
    }
}
