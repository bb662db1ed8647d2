//! Route table: the application's navigable destinations and what they
//! require.

use serde::{Deserialize, Serialize};

// Destination names the guard redirects to
pub const HOME: &str = "Home";
pub const LOGIN: &str = "Login";
pub const REGISTER: &str = "Register";
pub const USER_DASHBOARD: &str = "UserDashboard";
pub const ADMIN_DASHBOARD: &str = "AdminDashboard";

/// Authorization metadata of a destination.
///
/// Privilege without authentication is meaningless and is dropped on
/// construction, so `requires_privilege()` implies `requires_auth()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "RawRequirement")]
pub struct RouteRequirement {
    requires_auth: bool,
    requires_privilege: bool,
}

#[derive(Deserialize)]
struct RawRequirement {
    #[serde(default)]
    requires_auth: bool,
    #[serde(default)]
    requires_privilege: bool,
}

impl From<RawRequirement> for RouteRequirement {
    fn from(raw: RawRequirement) -> Self {
        RouteRequirement::new(raw.requires_auth, raw.requires_privilege)
    }
}

impl RouteRequirement {
    pub const PUBLIC: Self = Self {
        requires_auth: false,
        requires_privilege: false,
    };
    pub const AUTHENTICATED: Self = Self {
        requires_auth: true,
        requires_privilege: false,
    };
    pub const PRIVILEGED: Self = Self {
        requires_auth: true,
        requires_privilege: true,
    };

    pub const fn new(requires_auth: bool, requires_privilege: bool) -> Self {
        Self {
            requires_auth,
            requires_privilege: requires_auth && requires_privilege,
        }
    }

    pub fn requires_auth(&self) -> bool {
        self.requires_auth
    }

    pub fn requires_privilege(&self) -> bool {
        self.requires_privilege
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Static(String),
    Param { name: String, optional: bool },
}

impl Segment {
    fn parse(raw: &str) -> Self {
        match raw.strip_prefix(':') {
            Some(param) => match param.strip_suffix('?') {
                Some(name) => Segment::Param {
                    name: name.to_string(),
                    optional: true,
                },
                None => Segment::Param {
                    name: param.to_string(),
                    optional: false,
                },
            },
            None => Segment::Static(raw.to_string()),
        }
    }

    fn is_optional(&self) -> bool {
        matches!(self, Segment::Param { optional: true, .. })
    }
}

/// Non-empty path segments, ignoring query string and fragment.
fn split_path(path: &str) -> Vec<&str> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// A navigable destination.
#[derive(Debug, Clone)]
pub struct Route {
    pub path: String,
    pub name: String,
    pub requirement: RouteRequirement,
    segments: Vec<Segment>,
}

impl Route {
    /// `path` may contain `:param` (required) and `:param?` (optional) segments.
    pub fn new(path: &str, name: &str, requirement: RouteRequirement) -> Self {
        Self {
            path: path.to_string(),
            name: name.to_string(),
            requirement,
            segments: split_path(path).into_iter().map(Segment::parse).collect(),
        }
    }

    /// Parameters captured from `path`, or `None` if it does not match.
    fn match_path(&self, path: &str) -> Option<Vec<(String, String)>> {
        let parts = split_path(path);
        if parts.len() > self.segments.len() {
            return None;
        }

        let mut params = Vec::new();
        for (i, segment) in self.segments.iter().enumerate() {
            match (segment, parts.get(i)) {
                (Segment::Static(expected), Some(actual)) if expected == actual => {}
                (Segment::Param { name, .. }, Some(actual)) => {
                    params.push((name.clone(), (*actual).to_string()));
                }
                (segment, None) if segment.is_optional() => {}
                _ => return None,
            }
        }
        Some(params)
    }
}

/// A resolved navigation target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    pub name: &'a str,
    pub requirement: RouteRequirement,
    pub params: Vec<(String, String)>,
}

impl RouteMatch<'_> {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }
}

/// Ordered, immutable list of routes. The first match wins.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    /// Routes of the quiz application
    pub fn default_routes() -> Self {
        use RouteRequirement as R;
        Self::new(vec![
            Route::new("/", HOME, R::PUBLIC),
            Route::new("/login", LOGIN, R::PUBLIC),
            Route::new("/register", REGISTER, R::PUBLIC),
            Route::new("/admin", ADMIN_DASHBOARD, R::PRIVILEGED),
            Route::new("/admin/subjects", "AdminSubjects", R::PRIVILEGED),
            Route::new("/admin/chapters/:subjectId?", "AdminChapters", R::PRIVILEGED),
            Route::new("/admin/quizzes/:chapterId?", "AdminQuizzes", R::PRIVILEGED),
            Route::new("/admin/questions/:quizId?", "AdminQuestions", R::PRIVILEGED),
            Route::new("/admin/users", "AdminUsers", R::PRIVILEGED),
            Route::new("/admin/statistics", "AdminStatistics", R::PRIVILEGED),
            Route::new("/user/dashboard", USER_DASHBOARD, R::AUTHENTICATED),
            Route::new("/user/profile", "UserProfile", R::AUTHENTICATED),
            Route::new("/user/subjects", "UserSubjects", R::AUTHENTICATED),
            Route::new("/user/chapters/:subjectId", "UserChapters", R::AUTHENTICATED),
            Route::new("/user/quizzes/:chapterId", "UserQuizzes", R::AUTHENTICATED),
            Route::new("/user/take-quiz/:quizId", "TakeQuiz", R::AUTHENTICATED),
            Route::new("/user/results/:quizId", "QuizResults", R::AUTHENTICATED),
            Route::new("/user/scores", "UserScores", R::AUTHENTICATED),
        ])
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn by_name(&self, name: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.name == name)
    }

    pub fn resolve(&self, path: &str) -> Option<RouteMatch<'_>> {
        self.routes.iter().find_map(|route| {
            route.match_path(path).map(|params| RouteMatch {
                name: &route.name,
                requirement: route.requirement,
                params,
            })
        })
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::default_routes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_privilege_without_auth_is_dropped() {
        let req = RouteRequirement::new(false, true);
        assert!(!req.requires_auth());
        assert!(!req.requires_privilege());
        assert_eq!(req, RouteRequirement::PUBLIC);
    }

    #[test]
    fn test_requirement_deserialize_normalizes() {
        let req: RouteRequirement = serde_json::from_str(r#"{"requires_privilege": true}"#).unwrap();
        assert_eq!(req, RouteRequirement::PUBLIC);

        let req: RouteRequirement =
            serde_json::from_str(r#"{"requires_auth": true, "requires_privilege": true}"#).unwrap();
        assert_eq!(req, RouteRequirement::PRIVILEGED);
    }

    #[test]
    fn test_resolve_static_routes() {
        let table = RouteTable::default_routes();
        assert_eq!(table.resolve("/").unwrap().name, HOME);
        assert_eq!(table.resolve("/login").unwrap().name, LOGIN);
        assert_eq!(table.resolve("/admin").unwrap().name, ADMIN_DASHBOARD);
        assert_eq!(table.resolve("/admin/users/").unwrap().name, "AdminUsers");
        assert_eq!(table.resolve("/user/scores?page=2").unwrap().name, "UserScores");
    }

    #[test]
    fn test_resolve_required_param() {
        let table = RouteTable::default_routes();
        let m = table.resolve("/user/take-quiz/30012").unwrap();
        assert_eq!(m.name, "TakeQuiz");
        assert_eq!(m.param("quizId"), Some("30012"));
        assert_eq!(m.requirement, RouteRequirement::AUTHENTICATED);

        // Required parameter missing
        assert!(table.resolve("/user/take-quiz").is_none());
    }

    #[test]
    fn test_resolve_optional_param() {
        let table = RouteTable::default_routes();
        let m = table.resolve("/admin/chapters").unwrap();
        assert_eq!(m.name, "AdminChapters");
        assert_eq!(m.param("subjectId"), None);

        let m = table.resolve("/admin/chapters/10004").unwrap();
        assert_eq!(m.param("subjectId"), Some("10004"));
        assert_eq!(m.requirement, RouteRequirement::PRIVILEGED);
    }

    #[test]
    fn test_resolve_unknown_path() {
        let table = RouteTable::default_routes();
        assert!(table.resolve("/nowhere").is_none());
        assert!(table.resolve("/user/scores/extra").is_none());
    }

    #[test]
    fn test_by_name() {
        let table = RouteTable::default_routes();
        assert_eq!(table.by_name(USER_DASHBOARD).unwrap().path, "/user/dashboard");
        assert!(table.by_name("Missing").is_none());
    }
}
