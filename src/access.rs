use std::collections::HashSet;
use std::sync::LazyLock;

/// Where unauthenticated browser navigations are sent.
pub const LOGIN_PATH: &str = "/login";
/// Landing page for authenticated users (and for under-privileged admin requests).
pub const DASHBOARD_PATH: &str = "/dashboard";
/// Name of the query parameter carrying the originally requested path.
pub const RETURN_TO_PARAM: &str = "then";

/// Routes usable only while logged out.
const AUTH_ROUTES: &[&str] = &[
    "/login",
    "/signup",
    "/reset-password",
    "/update-password",
    "/auth/callback",
    "/auth/redirect",
];

/// Dashboard pages requiring an authenticated session.
const PROTECTED_ROUTES: &[&str] = &[
    "/dashboard",
    "/annotate",
    "/moderation",
    "/analytics",
    "/dataset",
    "/videos",
    "/settings",
];

/// Pages additionally requiring the `admin` role.
const ADMIN_ROUTES: &[&str] = &["/analytics", "/settings"];

/// JSON endpoints. Failures here are signalled with a status code, never a redirect.
const API_PREFIX: &str = "/api/";

/// Prefixes that are never evaluated: assets, API docs, health checks and
/// the authentication bootstrap endpoints themselves.
const EXCLUDED_PREFIXES: &[&str] = &[
    "/_next",
    "/static",
    "/favicon",
    "/api/auth",
    "/swagger-ui",
    "/api-docs",
    "/health",
];

static DEFAULT_TABLE: LazyLock<RouteTable> = LazyLock::new(RouteTable::default);

/// RouteClass
///
/// The single category a normalized path resolves to. `Excluded` and `Root` together
/// form the "public" class; `Unlisted` is the default-secure fallback for paths that
/// appear in no table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    Excluded,
    Auth,
    Root,
    ApiProtected,
    Protected,
    AdminOnly,
    Unlisted,
}

/// Session
///
/// A snapshot of the caller's authentication state for one evaluation.
/// Built by the caller from whatever the session store returned; any failure to
/// obtain it must already have been folded into `Session::anonymous()`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub authenticated: bool,
    /// Only meaningful when `authenticated` is true.
    pub role: Option<String>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(role: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            role: Some(role.into()),
        }
    }

    fn is_admin(&self) -> bool {
        self.authenticated && self.role.as_deref() == Some("admin")
    }
}

/// AccessDecision
///
/// Output of one evaluation. Carries no reference to the request it was computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    RedirectTo {
        path: &'static str,
        /// When set, the original path is appended as `then=<path>` so login can
        /// forward the user back afterwards.
        preserve_return_to: bool,
    },
    RejectUnauthorized,
}

impl AccessDecision {
    fn redirect(path: &'static str) -> Self {
        AccessDecision::RedirectTo {
            path,
            preserve_return_to: false,
        }
    }

    fn login_then_return() -> Self {
        AccessDecision::RedirectTo {
            path: LOGIN_PATH,
            preserve_return_to: true,
        }
    }
}

/// RouteTable
///
/// The route classification tables the evaluator consumes. Literal configuration data;
/// admin-only paths are always folded into the protected set so the subset relation
/// holds no matter how the table was assembled.
#[derive(Debug, Clone)]
pub struct RouteTable {
    auth: HashSet<String>,
    protected: HashSet<String>,
    admin_only: HashSet<String>,
    api_prefix: String,
    excluded_prefixes: Vec<String>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new(
            AUTH_ROUTES,
            PROTECTED_ROUTES,
            ADMIN_ROUTES,
            API_PREFIX,
            EXCLUDED_PREFIXES,
        )
    }
}

impl RouteTable {
    pub fn new(
        auth: &[&str],
        protected: &[&str],
        admin_only: &[&str],
        api_prefix: &str,
        excluded_prefixes: &[&str],
    ) -> Self {
        let admin_only: HashSet<String> = admin_only.iter().map(|p| p.to_string()).collect();
        let protected = protected
            .iter()
            .map(|p| p.to_string())
            .chain(admin_only.iter().cloned())
            .collect();

        Self {
            auth: auth.iter().map(|p| p.to_string()).collect(),
            protected,
            admin_only,
            api_prefix: api_prefix.to_string(),
            excluded_prefixes: excluded_prefixes.iter().map(|p| p.to_string()).collect(),
        }
    }

    /// is_excluded
    ///
    /// Assets (anything with a file extension) and the designated prefixes bypass
    /// evaluation entirely, so they never bounce through the login redirect.
    pub fn is_excluded(&self, path: &str) -> bool {
        path.contains('.')
            || self
                .excluded_prefixes
                .iter()
                .any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// classify
    ///
    /// Resolves a normalized path to exactly one class. Order matters and mirrors
    /// the precedence of the decision rules: exclusion, auth pages, root, API,
    /// protected (admin-only refines protected), then the unlisted fallback.
    pub fn classify(&self, path: &str) -> RouteClass {
        if self.is_excluded(path) {
            RouteClass::Excluded
        } else if self.auth.contains(path) {
            RouteClass::Auth
        } else if path == "/" {
            RouteClass::Root
        } else if path.starts_with(self.api_prefix.as_str()) {
            RouteClass::ApiProtected
        } else if self.admin_only.contains(path) {
            RouteClass::AdminOnly
        } else if self.protected.contains(path) {
            RouteClass::Protected
        } else {
            RouteClass::Unlisted
        }
    }

    pub fn evaluate(&self, path: &str, session: &Session) -> AccessDecision {
        decide(self.classify(path), session)
    }
}

/// decide
///
/// The decision table, keyed by route class. Authentication is always checked
/// before role, and only the "log in first" redirects preserve the return path.
pub fn decide(class: RouteClass, session: &Session) -> AccessDecision {
    match class {
        RouteClass::Excluded => AccessDecision::Allow,
        RouteClass::Auth if session.authenticated => AccessDecision::redirect(DASHBOARD_PATH),
        RouteClass::Auth => AccessDecision::Allow,
        RouteClass::Root if session.authenticated => AccessDecision::redirect(DASHBOARD_PATH),
        RouteClass::Root => AccessDecision::redirect(LOGIN_PATH),
        RouteClass::ApiProtected if session.authenticated => AccessDecision::Allow,
        RouteClass::ApiProtected => AccessDecision::RejectUnauthorized,
        RouteClass::Protected | RouteClass::AdminOnly | RouteClass::Unlisted
            if !session.authenticated =>
        {
            AccessDecision::login_then_return()
        }
        RouteClass::AdminOnly if !session.is_admin() => AccessDecision::redirect(DASHBOARD_PATH),
        RouteClass::Protected | RouteClass::AdminOnly | RouteClass::Unlisted => {
            AccessDecision::Allow
        }
    }
}

/// evaluate
///
/// Convenience entry point over the built-in route table.
pub fn evaluate(path: &str, session: &Session) -> AccessDecision {
    DEFAULT_TABLE.evaluate(path, session)
}

/// redirect_location
///
/// Builds the `Location` value for a redirect decision. When the return path is
/// preserved it is percent-encoded into the `then` query parameter.
pub fn redirect_location(target: &str, preserve_return_to: bool, original_path: &str) -> String {
    if preserve_return_to {
        format!(
            "{}?{}={}",
            target,
            RETURN_TO_PARAM,
            urlencoding::encode(original_path)
        )
    } else {
        target.to_string()
    }
}

/// normalize_path
///
/// Strips any query string and trailing slashes so `/dashboard/` and `/dashboard`
/// classify identically. An empty path becomes the root.
pub fn normalize_path(raw: &str) -> String {
    let path = raw.split('?').next().unwrap_or_default();
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}
