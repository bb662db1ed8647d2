//! Navigation guard.
//!
//! Every navigation attempt is checked against the destination's
//! `RouteRequirement` and the session currently in the `CredentialStore`
//! before any view renders.

pub mod decision;
pub mod routes;

pub use decision::{decide, GuardConfig, NavigationDecision, SessionGuard};
pub use routes::{Route, RouteMatch, RouteRequirement, RouteTable};
