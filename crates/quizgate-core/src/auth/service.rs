//! Login, logout and registration against the quiz API.

use reqwest::Method;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};

use crate::api::error::remote_message;
use crate::api::{endpoints, HttpClient, HttpResponse, RequestDescriptor, RequestError};
use crate::events::{self, SessionEvent};

use super::session::{LoginResponse, Session};
use super::storage::StorageError;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Username and password required")]
    MissingCredentials,

    /// The server refused the exchange; carries its message.
    #[error("{0}")]
    Rejected(String),

    #[error(transparent)]
    Request(#[from] RequestError),

    #[error("Failed to store session: {0}")]
    Storage(#[from] StorageError),
}

/// Fields accepted by the registration endpoint.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qualification: Option<String>,
    /// `YYYY-MM-DD`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
}

/// Session lifecycle operations. Shares the client's store and event bus.
#[derive(Clone)]
pub struct AuthService {
    client: HttpClient,
}

impl AuthService {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    /// Exchange credentials for a session and persist it.
    ///
    /// A rejected login leaves any existing session untouched.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, AuthError> {
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let descriptor = RequestDescriptor::new(Method::POST, endpoints::LOGIN)
            .json(json!({ "username": username, "password": password }));
        let response = self.client.exchange(&descriptor).await?;
        let response = Self::check_response(response, "Login failed")?;

        let login: LoginResponse = serde_json::from_str(&response.body)
            .map_err(|e| RequestError::Malformed(format!("Failed to parse login response: {}", e)))?;
        if login.access_token.is_empty() {
            return Err(RequestError::Malformed("Login response has an empty access token".to_string()).into());
        }
        let session = Session::from(login);

        self.client.store().save(&session)?;
        events::publish(self.client.events(), SessionEvent::LoggedIn);
        info!(user_id = session.user.id, admin = session.user.is_admin, "Logged in");
        Ok(session)
    }

    /// Clear the stored session. The next guarded navigation goes to login.
    pub fn logout(&self) -> Result<(), AuthError> {
        self.client.store().clear()?;
        events::publish(self.client.events(), SessionEvent::LoggedOut);
        info!("Logged out");
        Ok(())
    }

    /// Create an account. Returns the server's confirmation message.
    pub async fn register(&self, form: &RegisterForm) -> Result<String, AuthError> {
        if form.username.is_empty() || form.password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let body = serde_json::to_value(form)
            .map_err(|e| RequestError::Malformed(format!("Failed to serialize registration: {}", e)))?;
        let descriptor = RequestDescriptor::new(Method::POST, endpoints::REGISTER).json(body);
        let response = self.client.exchange(&descriptor).await?;
        let response = Self::check_response(response, "Registration failed")?;

        Ok(remote_message(&response.body).unwrap_or_else(|| "User registered successfully".to_string()))
    }

    fn check_response(response: HttpResponse, fallback: &str) -> Result<HttpResponse, AuthError> {
        if response.is_success() {
            return Ok(response);
        }
        let message = remote_message(&response.body).unwrap_or_else(|| fallback.to_string());
        warn!(status = response.status, message = %message, "Authentication exchange rejected");
        Err(AuthError::Rejected(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::FakeTransport;
    use crate::api::TransportError;
    use crate::auth::{CredentialStore, User};
    use crate::events::EventBus;
    use serde_json::Value;

    const BASE: &str = "http://localhost:5000/api";

    fn service(transport: &std::sync::Arc<FakeTransport>, store: CredentialStore) -> AuthService {
        AuthService::new(HttpClient::new(BASE, transport.clone(), store))
    }

    #[tokio::test]
    async fn test_login_persists_session() {
        let transport = FakeTransport::responding(
            200,
            r#"{"access_token": "abc", "user": {"id": 1, "username": "alice", "is_admin": false}}"#,
        );
        let store = CredentialStore::in_memory();
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let service = AuthService::new(HttpClient::new(BASE, transport.clone(), store.clone()).with_events(bus));

        let session = service.login("alice", "secret").await.unwrap();
        assert_eq!(session.token, "abc");
        assert_eq!(store.load(), Some(session));
        assert_eq!(rx.try_recv().unwrap(), SessionEvent::LoggedIn);

        let request = transport.last_request().unwrap();
        assert_eq!(request.url, "http://localhost:5000/api/login");
        assert_eq!(request.header("authorization"), None);
        let body: Value = serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["username"], "alice");
        assert_eq!(body["password"], "secret");
    }

    #[tokio::test]
    async fn test_login_rejected_keeps_existing_session() {
        let transport = FakeTransport::responding(401, r#"{"msg": "Invalid username or password"}"#);
        let store = CredentialStore::in_memory();
        let existing = Session::new("old", User::new(9, false));
        store.save(&existing).unwrap();

        let err = service(&transport, store.clone()).login("alice", "wrong").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid username or password");
        assert_eq!(store.load(), Some(existing));
    }

    #[tokio::test]
    async fn test_login_rejected_without_message() {
        let transport = FakeTransport::responding(500, "");
        let err = service(&transport, CredentialStore::in_memory())
            .login("alice", "secret")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Rejected(ref m) if m == "Login failed"));
    }

    #[tokio::test]
    async fn test_login_requires_both_fields() {
        let transport = FakeTransport::responding(200, "{}");
        let service = service(&transport, CredentialStore::in_memory());

        assert!(matches!(service.login("", "secret").await, Err(AuthError::MissingCredentials)));
        assert!(matches!(service.login("alice", "").await, Err(AuthError::MissingCredentials)));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_login_malformed_response() {
        let transport = FakeTransport::responding(200, r#"{"access_token": "abc"}"#);
        let store = CredentialStore::in_memory();
        let err = service(&transport, store.clone()).login("alice", "secret").await.unwrap_err();
        assert!(matches!(err, AuthError::Request(RequestError::Malformed(_))));
        assert!(!store.is_authenticated());
    }

    #[tokio::test]
    async fn test_login_empty_token_is_not_a_session() {
        let transport = FakeTransport::responding(
            200,
            r#"{"access_token": "", "user": {"id": 1, "is_admin": false}}"#,
        );
        let store = CredentialStore::in_memory();
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let service = AuthService::new(HttpClient::new(BASE, transport, store.clone()).with_events(bus));

        let err = service.login("alice", "secret").await.unwrap_err();
        assert!(matches!(err, AuthError::Request(RequestError::Malformed(_))));
        assert!(!store.is_authenticated());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_login_network_failure() {
        let transport = FakeTransport::failing(TransportError::Connection("dns error".to_string()));
        let err = service(&transport, CredentialStore::in_memory())
            .login("alice", "secret")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Request(RequestError::TransportFailure(_))));
    }

    #[tokio::test]
    async fn test_logout_clears_and_publishes() {
        let transport = FakeTransport::responding(200, "{}");
        let store = CredentialStore::in_memory();
        store.save(&Session::new("abc", User::new(1, true))).unwrap();
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let service = AuthService::new(HttpClient::new(BASE, transport, store.clone()).with_events(bus));

        service.logout().unwrap();
        assert!(!store.is_authenticated());
        assert_eq!(rx.try_recv().unwrap(), SessionEvent::LoggedOut);
        // Logging out twice is harmless
        service.logout().unwrap();
    }

    #[tokio::test]
    async fn test_register_returns_server_message() {
        let transport = FakeTransport::responding(201, r#"{"msg": "User registered successfully"}"#);
        let form = RegisterForm {
            username: "carol".to_string(),
            password: "pw".to_string(),
            full_name: "Carol King".to_string(),
            email: "carol@example.com".to_string(),
            qualification: None,
            date_of_birth: Some("2001-04-09".to_string()),
        };

        let message = service(&transport, CredentialStore::in_memory()).register(&form).await.unwrap();
        assert_eq!(message, "User registered successfully");

        let body: Value = serde_json::from_str(transport.last_request().unwrap().body.as_deref().unwrap()).unwrap();
        assert_eq!(body["date_of_birth"], "2001-04-09");
        assert!(body.get("qualification").is_none());
    }

    #[tokio::test]
    async fn test_register_duplicate_username() {
        let transport = FakeTransport::responding(400, r#"{"msg": "Username already exists"}"#);
        let form = RegisterForm {
            username: "carol".to_string(),
            password: "pw".to_string(),
            ..Default::default()
        };
        let err = service(&transport, CredentialStore::in_memory()).register(&form).await.unwrap_err();
        assert_eq!(err.to_string(), "Username already exists");
    }
}
