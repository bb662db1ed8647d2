//! Core library for quizgate.
//!
//! This crate holds the client-side session layer of the quiz application:
//!
//! - [`auth`]: the persisted `Session` (token + user) and the `CredentialStore`
//!   that reads and writes it, plus the login/logout exchange
//! - [`api`]: the `HttpClient` that attaches credentials to outbound requests
//!   and clears the session when the server rejects them
//! - [`guard`]: the `SessionGuard` that decides whether a navigation is allowed
//! - [`events`]: the notification bus used to broadcast session changes
//! - [`config`]: application configuration

pub mod api;
pub mod auth;
pub mod config;
pub mod events;
pub mod guard;

pub use api::{HttpClient, RequestDescriptor, RequestError};
pub use auth::{AuthService, CredentialStore, Session, User};
pub use config::Config;
pub use events::{EventBus, SessionEvent};
pub use guard::{NavigationDecision, RouteRequirement, RouteTable, SessionGuard};
