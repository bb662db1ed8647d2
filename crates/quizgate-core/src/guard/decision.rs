use tracing::debug;

use crate::auth::{CredentialStore, Session};

use super::routes::{RouteRequirement, RouteTable, ADMIN_DASHBOARD, HOME, LOGIN, REGISTER, USER_DASHBOARD};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationDecision {
    Allow,
    /// Navigate to the named destination instead.
    RedirectTo(String),
}

impl NavigationDecision {
    fn redirect(destination: &str) -> Self {
        NavigationDecision::RedirectTo(destination.to_string())
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, NavigationDecision::Allow)
    }
}

/// Where the guard sends people.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardConfig {
    pub login: String,
    /// Landing page for authenticated users
    pub user_landing: String,
    /// Landing page for privileged users
    pub admin_landing: String,
    /// Destinations an authenticated user is bounced away from
    pub pre_auth_only: Vec<String>,
    /// Target for paths that match no route
    pub fallback: String,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            login: LOGIN.to_string(),
            user_landing: USER_DASHBOARD.to_string(),
            admin_landing: ADMIN_DASHBOARD.to_string(),
            pre_auth_only: vec![LOGIN.to_string(), REGISTER.to_string(), HOME.to_string()],
            fallback: HOME.to_string(),
        }
    }
}

/// Decide a navigation to `destination` given its requirement and the
/// current session. Pure: the same inputs always give the same answer.
pub fn decide(
    destination: &str,
    requirement: RouteRequirement,
    session: Option<&Session>,
    config: &GuardConfig,
) -> NavigationDecision {
    if requirement.requires_auth() {
        return match session {
            None => NavigationDecision::redirect(&config.login),
            // Valid user, just not allowed here
            Some(s) if requirement.requires_privilege() && !s.is_privileged() => {
                NavigationDecision::redirect(&config.user_landing)
            }
            Some(_) => NavigationDecision::Allow,
        };
    }

    match session {
        Some(s) if config.pre_auth_only.iter().any(|d| d == destination) => {
            if s.is_privileged() {
                NavigationDecision::redirect(&config.admin_landing)
            } else {
                NavigationDecision::redirect(&config.user_landing)
            }
        }
        _ => NavigationDecision::Allow,
    }
}

/// Gates navigation on the stored session.
///
/// The store is read on every check so an invalidation that happened in
/// between (a 401 seen by the HTTP client, a logout) is always honoured.
#[derive(Clone)]
pub struct SessionGuard {
    store: CredentialStore,
    routes: RouteTable,
    config: GuardConfig,
}

impl SessionGuard {
    pub fn new(store: CredentialStore, routes: RouteTable) -> Self {
        Self::with_config(store, routes, GuardConfig::default())
    }

    pub fn with_config(store: CredentialStore, routes: RouteTable, config: GuardConfig) -> Self {
        Self { store, routes, config }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Check a navigation to a path such as `/user/take-quiz/30012`.
    /// Unknown paths are sent to the fallback destination.
    pub fn navigate(&self, path: &str) -> NavigationDecision {
        match self.routes.resolve(path) {
            Some(target) => self.evaluate(target.name, target.requirement),
            None => {
                debug!(path, "No route matches, redirecting to fallback");
                NavigationDecision::redirect(&self.config.fallback)
            }
        }
    }

    /// Check a navigation to a destination by name.
    pub fn check(&self, destination: &str) -> NavigationDecision {
        match self.routes.by_name(destination) {
            Some(route) => self.evaluate(&route.name, route.requirement),
            None => {
                debug!(destination, "Unknown destination, redirecting to fallback");
                NavigationDecision::redirect(&self.config.fallback)
            }
        }
    }

    fn evaluate(&self, destination: &str, requirement: RouteRequirement) -> NavigationDecision {
        let session = self.store.load();
        let decision = decide(destination, requirement, session.as_ref(), &self.config);
        debug!(
            destination,
            authenticated = session.is_some(),
            ?decision,
            "Navigation checked"
        );
        decision
    }
}
